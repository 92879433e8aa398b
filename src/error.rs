use crate::services::storage::StoreError;
use crate::utils::validation::{Rejection, ValidationPolicy};
use thiserror::Error;

pub const NO_FILE_SELECTED_MESSAGE: &str = "No file selected.";
/// Policy message for the default policy. Other policies get theirs from
/// [`ValidationPolicy::violation_message`].
pub const POLICY_VIOLATION_MESSAGE: &str = "Only PNG/JPG/PDF under 5 MB allowed.";
pub const STAGING_FAILURE_MESSAGE: &str = "Something went wrong while preparing the file.";
pub const UPLOAD_FAILURE_MESSAGE: &str = "Upload failed";
pub const LIST_FAILURE_MESSAGE: &str = "Could not load uploaded files";

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("No file selected")]
    NoFileSelected,

    #[error("Policy violation: {0}")]
    PolicyViolation(Rejection),

    #[error("Staging failed: {0}")]
    StagingFailure(String),

    #[error("Upload failed: {0}")]
    UploadFailure(#[source] StoreError),

    #[error("Listing failed: {0}")]
    ListFailure(#[source] StoreError),
}

impl UploadError {
    /// The text shown to the user. Detail stays in the logs.
    pub fn user_message(&self, policy: &ValidationPolicy) -> String {
        match self {
            UploadError::NoFileSelected => NO_FILE_SELECTED_MESSAGE.to_string(),
            UploadError::PolicyViolation(_) => policy.violation_message(),
            UploadError::StagingFailure(_) => STAGING_FAILURE_MESSAGE.to_string(),
            UploadError::UploadFailure(_) => UPLOAD_FAILURE_MESSAGE.to_string(),
            UploadError::ListFailure(_) => LIST_FAILURE_MESSAGE.to_string(),
        }
    }
}
