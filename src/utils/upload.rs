use std::path::PathBuf;

use axum::body::Bytes;
use tokio::fs;
use uuid::Uuid;

use crate::error::ApiError;

const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "pdf"];

pub struct AttachmentData {
    pub filename: Option<String>,
    pub data: Bytes,
}

/// Persists an uploaded attachment under `static/uploads/<subdir>/` and
/// returns its public URL. Files with an extension outside the allow-list
/// are dropped and the record is saved without an attachment.
pub async fn save_attachment(
    attachment: Option<AttachmentData>,
    subdir: &str,
) -> Result<Option<String>, ApiError> {
    let Some(attachment) = attachment else {
        return Ok(None);
    };
    let Some(fname) = attachment.filename else {
        return Ok(None);
    };

    let extension = PathBuf::from(&fname)
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Ok(None);
    }

    let dir = PathBuf::from("static/uploads").join(subdir);
    if !dir.exists() {
        fs::create_dir_all(&dir)
            .await
            .map_err(|err| {
                log::error!("failed to create upload dir {}: {}", dir.display(), err);
                ApiError::Internal
            })?;
    }

    let new_file_name = format!("{}.{}", Uuid::new_v4(), extension);
    let file_path = dir.join(&new_file_name);
    fs::write(&file_path, &attachment.data)
        .await
        .map_err(|err| {
            log::error!("failed to write attachment {}: {}", file_path.display(), err);
            ApiError::Internal
        })?;

    Ok(Some(format!("/static/uploads/{}/{}", subdir, new_file_name)))
}

/// Best-effort removal of a stored attachment, for when the database write
/// that would reference it fails and the file would otherwise be orphaned.
pub async fn remove_attachment(url: &str) {
    let path = PathBuf::from(url.trim_start_matches('/'));
    if let Err(err) = fs::remove_file(&path).await {
        log::warn!("failed to remove orphaned attachment {}: {}", path.display(), err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stored_attachment_is_removed_when_the_write_is_rolled_back() {
        let attachment = AttachmentData {
            filename: Some("receipt.png".into()),
            data: Bytes::from_static(b"not really a png"),
        };
        let url = save_attachment(Some(attachment), "orphan-check")
            .await
            .unwrap()
            .expect("allowed extension should be stored");

        let path = PathBuf::from(url.trim_start_matches('/'));
        assert!(path.exists());

        remove_attachment(&url).await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn disallowed_extension_is_dropped() {
        let attachment = AttachmentData {
            filename: Some("payload.exe".into()),
            data: Bytes::from_static(b"mz"),
        };
        let url = save_attachment(Some(attachment), "orphan-check").await.unwrap();
        assert!(url.is_none());
    }
}
