use crate::models::PickedFile;
use std::path::Path;

/// Describes a local file the way a document picker reports its selection: display
/// name, handle, sniffed content type and size.
///
/// Unreadable files are still described; the gaps surface later as a policy
/// violation (no size or type) or a staging failure (no source).
pub async fn describe(path: &Path) -> PickedFile {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let size = match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Some(meta.len()),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!("Could not stat {}: {}", path.display(), e);
            None
        }
    };

    let mime_type = match infer::get_from_path(path) {
        Ok(Some(kind)) => Some(kind.mime_type().to_string()),
        Ok(None) => None,
        Err(e) => {
            tracing::debug!("Could not sniff {}: {}", path.display(), e);
            None
        }
    };

    PickedFile {
        name,
        uri: path.display().to_string(),
        mime_type,
        size,
    }
}

/// One line of picker input: blank means the picker was dismissed.
pub async fn pick_from_line(line: &str) -> Option<PickedFile> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(describe(Path::new(trimmed)).await)
}
