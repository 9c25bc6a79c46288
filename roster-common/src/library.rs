//! Image library
//!
//! Object storage behind the image picker: list, upload, public URL and
//! delete. Uploads are size-limited and restricted to common raster formats
//! by content sniffing, not by the file name the browser sent.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{Error, Result};

/// Default upload limit (5 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Accepted MIME types and the extension stored for each
const ALLOWED_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredImage {
    pub key: String,
    pub url: String,
    pub size_bytes: u64,
    pub uploaded_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stored images, newest first
    async fn list(&self) -> Result<Vec<StoredImage>>;

    async fn upload(&self, file_name: &str, bytes: &[u8]) -> Result<StoredImage>;

    fn public_url(&self, key: &str) -> String;

    async fn delete(&self, key: &str) -> Result<()>;
}

/// Check size and sniffed type; returns the extension to store under
pub fn validate_upload(bytes: &[u8], max_bytes: usize) -> Result<&'static str> {
    if bytes.is_empty() {
        return Err(Error::Validation("Upload is empty".to_string()));
    }
    if bytes.len() > max_bytes {
        return Err(Error::Validation(format!(
            "Upload is {} bytes, limit is {} bytes",
            bytes.len(),
            max_bytes
        )));
    }
    let mime = infer::get(bytes)
        .map(|kind| kind.mime_type())
        .unwrap_or("application/octet-stream");
    ALLOWED_TYPES
        .iter()
        .find(|(allowed, _)| *allowed == mime)
        .map(|(_, ext)| *ext)
        .ok_or_else(|| Error::Validation(format!("Unsupported image type: {}", mime)))
}

/// Lowercase stem of `file_name` restricted to `[a-z0-9-]`
fn sanitize_stem(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("");
    let mut out = String::with_capacity(stem.len());
    for c in stem.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    let out = out.trim_matches('-');
    if out.is_empty() {
        "image".to_string()
    } else {
        out.to_string()
    }
}

fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.');
    if valid {
        Ok(())
    } else {
        Err(Error::Validation(format!("Invalid image key: {}", key)))
    }
}

fn has_allowed_extension(key: &str) -> bool {
    Path::new(key)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| ALLOWED_TYPES.iter().any(|(_, ext)| *ext == e))
        .unwrap_or(false)
}

/// Filesystem-backed image library
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    dir: PathBuf,
    base_url: String,
    max_bytes: usize,
}

impl LocalObjectStore {
    pub fn new(dir: impl Into<PathBuf>, base_url: impl Into<String>, max_bytes: usize) -> Self {
        Self {
            dir: dir.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_bytes,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn list(&self) -> Result<Vec<StoredImage>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut images = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let key = entry.file_name().to_string_lossy().into_owned();
            if !has_allowed_extension(&key) {
                continue;
            }
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            images.push(StoredImage {
                url: self.public_url(&key),
                key,
                size_bytes: metadata.len(),
                uploaded_at: metadata.modified().ok().map(DateTime::<Utc>::from),
            });
        }
        images.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at).then(a.key.cmp(&b.key)));
        Ok(images)
    }

    async fn upload(&self, file_name: &str, bytes: &[u8]) -> Result<StoredImage> {
        let ext = validate_upload(bytes, self.max_bytes)?;
        let suffix = Uuid::new_v4().simple().to_string();
        let key = format!("{}-{}.{}", sanitize_stem(file_name), &suffix[..8], ext);

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(&key), bytes).await?;
        info!("Stored image {} ({} bytes)", key, bytes.len());

        Ok(StoredImage {
            url: self.public_url(&key),
            key,
            size_bytes: bytes.len() as u64,
            uploaded_at: Some(Utc::now()),
        })
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        let path = self.dir.join(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Deleted image {}", key);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound(format!("image {}", key)))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];
    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10, b'J', b'F', b'I', b'F'];

    fn store(dir: &Path) -> LocalObjectStore {
        LocalObjectStore::new(dir, "/images/", DEFAULT_MAX_UPLOAD_BYTES)
    }

    #[test]
    fn test_validate_upload_rules() {
        assert_eq!(validate_upload(PNG, 1024).unwrap(), "png");
        assert_eq!(validate_upload(JPEG, 1024).unwrap(), "jpg");
        assert!(validate_upload(b"", 1024).is_err());
        assert!(validate_upload(b"just some text", 1024).is_err());
        assert!(validate_upload(PNG, 4).is_err());
    }

    #[test]
    fn test_sanitize_stem() {
        assert_eq!(sanitize_stem("Jane Smith (2).PNG"), "jane-smith-2");
        assert_eq!(sanitize_stem("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_stem("???.jpg"), "image");
    }

    #[tokio::test]
    async fn test_upload_list_delete() {
        let dir = tempfile::tempdir().unwrap();
        let library = store(dir.path());

        let stored = library.upload("Jane Smith.jpeg", PNG).await.unwrap();
        assert!(stored.key.starts_with("jane-smith-"));
        assert!(stored.key.ends_with(".png"));
        assert_eq!(stored.url, format!("/images/{}", stored.key));

        let listed = library.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].key, stored.key);
        assert_eq!(listed[0].size_bytes, PNG.len() as u64);

        library.delete(&stored.key).await.unwrap();
        assert!(library.list().await.unwrap().is_empty());
        assert!(matches!(
            library.delete(&stored.key).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let library = store(dir.path());
        assert!(matches!(
            library.delete("../secret.png").await,
            Err(Error::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_list_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let library = store(&dir.path().join("not-yet"));
        assert!(library.list().await.unwrap().is_empty());
    }
}
