use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A file chosen by the user. Only lives until staging finishes or validation fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickedFile {
    /// Display name, including the extension
    pub name: String,
    /// Local handle: a plain path or a `file://` URL
    pub uri: String,
    pub mime_type: Option<String>,
    pub size: Option<u64>,
}

impl PickedFile {
    pub fn new(name: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uri: uri.into(),
            mime_type: None,
            size: None,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }
}

/// Bytes ready for transmission, plus the content type they go out with.
#[derive(Debug, Clone)]
pub struct EncodedPayload {
    pub bytes: Bytes,
    pub content_type: String,
    pub source_path: PathBuf,
    pub staged_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    /// Remote key, `<millis>.<ext>`
    pub path: String,
    pub public_url: String,
    pub file_name: String,
    pub size: u64,
}

impl UploadResult {
    /// Confirmation text shown once an upload lands.
    pub fn notice(&self) -> String {
        format!(
            "File is valid!\nName: {}\nSize: {:.2} MB",
            self.file_name,
            self.size as f64 / 1024.0 / 1024.0
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    #[serde(default)]
    pub mimetype: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

/// One row of the bucket listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteObjectEntry {
    pub name: String,
    /// Folder placeholders come back without an id
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub metadata: Option<ObjectMetadata>,
}

impl RemoteObjectEntry {
    pub fn mimetype(&self) -> Option<&str> {
        self.metadata.as_ref()?.mimetype.as_deref()
    }

    /// Images render as thumbnails, everything else as a document tile.
    pub fn is_image(&self) -> bool {
        self.mimetype().is_some_and(|m| m.starts_with("image"))
    }
}
