use crate::error::UploadError;
use crate::models::PickedFile;
use std::path::Path;
use thiserror::Error;

/// Maximum file size: 5 MB
pub const MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

/// Allowed MIME types: PNG, JPEG and PDF
pub const ALLOWED_MIME_TYPES: &[&str] = &["image/png", "image/jpeg", "application/pdf"];

/// Extension used for keys when the picked name has none and the type is unknown
pub const FALLBACK_EXTENSION: &str = "bin";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationPolicy {
    pub allowed_mime_types: Vec<String>,
    pub max_size_bytes: u64,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            allowed_mime_types: ALLOWED_MIME_TYPES.iter().map(|m| m.to_string()).collect(),
            max_size_bytes: MAX_FILE_SIZE,
        }
    }
}

impl ValidationPolicy {
    pub fn allows(&self, mime_type: &str) -> bool {
        let normalized = normalize_mime(mime_type);
        self.allowed_mime_types
            .iter()
            .any(|allowed| normalize_mime(allowed) == normalized)
    }

    /// The one message shown for every rejected pick, e.g.
    /// "Only PNG/JPG/PDF under 5 MB allowed."
    pub fn violation_message(&self) -> String {
        let types: Vec<String> = self.allowed_mime_types.iter().map(|m| type_label(m)).collect();
        format!(
            "Only {} under {} allowed.",
            types.join("/"),
            size_label(self.max_size_bytes)
        )
    }
}

fn type_label(mime_type: &str) -> String {
    if let Some(ext) = canonical_extension(mime_type) {
        return ext.to_uppercase();
    }
    let normalized = normalize_mime(mime_type);
    normalized
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_uppercase()
}

fn size_label(bytes: u64) -> String {
    const MB: u64 = 1024 * 1024;
    const KB: u64 = 1024;
    if bytes >= MB && bytes % MB == 0 {
        format!("{} MB", bytes / MB)
    } else if bytes >= KB && bytes % KB == 0 {
        format!("{} KB", bytes / KB)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Why a picked file was turned away.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct Rejection {
    pub code: &'static str,
    pub message: String,
}

impl Rejection {
    pub fn missing_mime_type() -> Self {
        Self {
            code: "MISSING_MIME_TYPE",
            message: "File has no declared MIME type".to_string(),
        }
    }

    pub fn invalid_mime_type(mime_type: &str) -> Self {
        Self {
            code: "INVALID_MIME_TYPE",
            message: format!("MIME type '{}' is not allowed", mime_type),
        }
    }

    pub fn missing_size() -> Self {
        Self {
            code: "MISSING_SIZE",
            message: "File size is unknown".to_string(),
        }
    }

    pub fn too_large(size: u64, max_size: u64) -> Self {
        Self {
            code: "FILE_TOO_LARGE",
            message: format!(
                "File size {} bytes exceeds maximum allowed {} bytes ({} MB)",
                size,
                max_size,
                max_size / 1024 / 1024
            ),
        }
    }

    pub fn invalid_filename(name: &str) -> Self {
        Self {
            code: "INVALID_FILENAME",
            message: format!("Filename '{}' has no usable component", name),
        }
    }
}

fn normalize_mime(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase()
}

/// Validates file size against the policy limit
pub fn validate_file_size(size: Option<u64>, max_size: u64) -> Result<u64, Rejection> {
    match size {
        None => Err(Rejection::missing_size()),
        Some(size) if size > max_size => Err(Rejection::too_large(size, max_size)),
        Some(size) => Ok(size),
    }
}

/// Validates the declared MIME type against the allow-list
pub fn validate_mime_type(mime_type: Option<&str>, policy: &ValidationPolicy) -> Result<(), Rejection> {
    let mime_type = mime_type.ok_or_else(Rejection::missing_mime_type)?;
    if policy.allows(mime_type) {
        Ok(())
    } else {
        Err(Rejection::invalid_mime_type(mime_type))
    }
}

/// Accepts a pick iff its type is allow-listed and its size is known and within the limit.
///
/// A cancelled pick (`None`) is reported as [`UploadError::NoFileSelected`]; every
/// metadata problem collapses into [`UploadError::PolicyViolation`].
pub fn validate<'a>(
    file: Option<&'a PickedFile>,
    policy: &ValidationPolicy,
) -> Result<&'a PickedFile, UploadError> {
    let file = file.ok_or(UploadError::NoFileSelected)?;

    validate_mime_type(file.mime_type.as_deref(), policy).map_err(UploadError::PolicyViolation)?;
    validate_file_size(file.size, policy.max_size_bytes).map_err(UploadError::PolicyViolation)?;

    Ok(file)
}

/// Strips path components and reserved characters so the name is safe to join onto
/// the staging directory.
pub fn sanitize_filename(filename: &str) -> Result<String, Rejection> {
    let normalized = filename.replace('\\', "/");
    let name = Path::new(&normalized)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    if name.is_empty() || name == "." || name == ".." {
        return Err(Rejection::invalid_filename(filename));
    }

    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        tracing::warn!("Path components stripped from picked file name: {}", filename);
    }

    let mut sanitized: String = name
        .chars()
        .map(|c| match c {
            c if c.is_control() => '_',
            ':' | '*' | '?' | '"' | '<' | '>' | '|' | ';' => '_',
            c => c,
        })
        .collect();

    if sanitized.starts_with('.') {
        sanitized.replace_range(..1, "_");
    }

    // Limit length safely for UTF-8
    if sanitized.len() > 255 {
        let mut end = 255;
        while !sanitized.is_char_boundary(end) {
            end -= 1;
        }
        sanitized.truncate(end);
    }

    Ok(sanitized)
}

/// Canonical extension for the allow-listed types.
fn canonical_extension(mime_type: &str) -> Option<&'static str> {
    let normalized = normalize_mime(mime_type);
    if normalized == mime::IMAGE_PNG.essence_str() {
        Some("png")
    } else if normalized == mime::IMAGE_JPEG.essence_str() {
        Some("jpg")
    } else if normalized == mime::APPLICATION_PDF.essence_str() {
        Some("pdf")
    } else {
        None
    }
}

/// Extension used in the remote key: text after the last dot of the picked name when it
/// is plain ASCII alphanumerics, otherwise the canonical extension of the declared type.
///
/// Anything else (`/`, `?`, `#`, spaces) would leak into the object key.
pub fn file_extension(name: &str, mime_type: Option<&str>) -> String {
    if let Some((_, ext)) = name.rsplit_once('.')
        && !ext.is_empty()
        && ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return ext.to_string();
    }

    mime_type
        .and_then(canonical_extension)
        .unwrap_or(FALLBACK_EXTENSION)
        .to_string()
}
