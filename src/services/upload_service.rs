use crate::error::UploadError;
use crate::models::{PickedFile, UploadResult};
use crate::services::keys::KeyGenerator;
use crate::services::staging::StagingEncoder;
use crate::services::storage::{ObjectStore, UploadOptions};
use crate::utils::validation::{ValidationPolicy, validate};
use std::sync::Arc;

/// Runs one pick through validation, staging, transmission and URL resolution.
///
/// Every step is terminal on failure and nothing is retried; the caller starts over
/// with a fresh pick.
pub struct UploadService {
    store: Arc<dyn ObjectStore>,
    staging: StagingEncoder,
    policy: ValidationPolicy,
    keys: KeyGenerator,
}

impl UploadService {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        staging: StagingEncoder,
        policy: ValidationPolicy,
        keys: KeyGenerator,
    ) -> Self {
        Self {
            store,
            staging,
            policy,
            keys,
        }
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    /// `None` means the user dismissed the picker.
    pub async fn upload(&self, picked: Option<PickedFile>) -> Result<UploadResult, UploadError> {
        let file = validate(picked.as_ref(), &self.policy).inspect_err(|e| {
            if let UploadError::PolicyViolation(rejection) = e {
                tracing::warn!("🚫 Rejected pick: {}", rejection);
            }
        })?;

        let payload = self.staging.stage(file).await.inspect_err(|e| {
            tracing::error!("❌ Staging failed for {}: {}", file.name, e);
        })?;

        let key = self.keys.generate(&file.name, file.mime_type.as_deref());
        let options = UploadOptions {
            content_type: payload.content_type.clone(),
            upsert: false,
        };

        tracing::info!(
            "☁️  Uploading {} ({} bytes, {}) as {}",
            file.name,
            payload.bytes.len(),
            options.content_type,
            key
        );

        let sent = self.store.upload(&key, payload.bytes.clone(), &options).await;
        self.staging.discard(&payload).await;

        sent.map_err(|e| {
            tracing::error!("❌ Upload of {} as {} failed: {}", file.name, key, e);
            UploadError::UploadFailure(e)
        })?;

        let public_url = self.store.public_url(&key);
        tracing::info!("✅ Uploaded {} -> {}", key, public_url);

        Ok(UploadResult {
            path: key,
            public_url,
            file_name: file.name.clone(),
            size: file.size.unwrap_or(payload.bytes.len() as u64),
        })
    }
}
