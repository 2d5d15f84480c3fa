// src/utils/upload.rs

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::error::AppError;

const MAX_NAME_LEN: usize = 100;
const FALLBACK_NAME: &str = "submission";

/// Local-directory blob store for submission files.
///
/// Keys are opaque to the rest of the application: they are stored in
/// `submissions.file_key` and never interpreted outside this module.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Builds the key a file will be stored under, without touching disk.
    /// Lets the caller validate the submission before anything is written.
    pub fn reserve_key(&self, student_id: i64, file_name: Option<&str>, now: DateTime<Utc>) -> String {
        format!(
            "{}_{}_{}",
            now.format("%Y%m%d%H%M%S%6f"),
            student_id,
            sanitize_file_name(file_name)
        )
    }

    pub async fn write(&self, key: &str, bytes: &[u8]) -> Result<(), AppError> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            tracing::error!("Failed to create upload dir {:?}: {:?}", self.root, e);
            AppError::InternalServerError(e.to_string())
        })?;

        let path = self.root.join(key);
        tokio::fs::write(&path, bytes).await.map_err(|e| {
            tracing::error!("Failed to store upload {:?}: {:?}", path, e);
            AppError::InternalServerError(e.to_string())
        })?;

        tracing::debug!(key, size = bytes.len(), "Stored submission file");
        Ok(())
    }

    /// Deletes a stored file. A key that is already gone is not an error;
    /// other failures are logged and leave the file behind.
    pub async fn remove(&self, key: &str) {
        let path = self.root.join(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => tracing::debug!(key, "Removed submission file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove upload {:?}: {:?}", path, e),
        }
    }
}

/// Keeps only the last path component and a conservative character set.
fn sanitize_file_name(file_name: Option<&str>) -> String {
    let base = file_name
        .and_then(|name| name.rsplit(['/', '\\']).next())
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_NAME_LEN)
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name(Some("report.pdf")), "report.pdf");
        assert_eq!(sanitize_file_name(Some("../../etc/passwd")), "passwd");
        assert_eq!(sanitize_file_name(Some("C:\\docs\\my essay.docx")), "my_essay.docx");
        assert_eq!(sanitize_file_name(Some("..")), FALLBACK_NAME);
        assert_eq!(sanitize_file_name(None), FALLBACK_NAME);
    }

    #[test]
    fn test_reserve_key_format() {
        let store = BlobStore::new("uploads");
        let now = Utc.with_ymd_and_hms(2024, 1, 20, 23, 0, 0).unwrap();

        assert_eq!(
            store.reserve_key(7, Some("a.txt"), now),
            "20240120230000000000_7_a.txt"
        );
    }

    #[tokio::test]
    async fn test_write_creates_dir() {
        let root = std::env::temp_dir().join(format!("gradebook-upload-{}", std::process::id()));
        let store = BlobStore::new(&root);

        store.write("k.txt", b"hello").await.unwrap();

        let stored = tokio::fs::read(root.join("k.txt")).await.unwrap();
        assert_eq!(stored, b"hello");
        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn test_remove_deletes_file_and_ignores_missing() {
        let root = std::env::temp_dir().join(format!("gradebook-remove-{}", std::process::id()));
        let store = BlobStore::new(&root);
        store.write("old.txt", b"old").await.unwrap();

        store.remove("old.txt").await;
        store.remove("old.txt").await;

        assert!(!root.join("old.txt").exists());
        let _ = tokio::fs::remove_dir_all(&root).await;
    }
}
