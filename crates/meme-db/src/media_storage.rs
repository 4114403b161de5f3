//! Media storage backends.
//!
//! - [`LocalMediaStorage`]: media files on the local filesystem, served back
//!   by the API under `/media/{mediaID}`
//! - [`RemoteMediaStorage`]: a separate storage server speaking the
//!   `upload` / `media` / `thumbnail` protocol

use std::path::PathBuf;

use async_trait::async_trait;
use meme_core::{normalize_file_ext, Error, MediaStorage, Result, UploadedMedia};
use serde::Deserialize;
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use crate::document::write_atomic;

/// Filesystem media backend.
///
/// Media ids have the form `{uuidv7}.{ext}`.
/// Path format: `{base_path}/blobs/{first-2-hex}/{next-2-hex}/{media_id}`
pub struct LocalMediaStorage {
    base_path: PathBuf,
    public_url: String,
}

impl LocalMediaStorage {
    /// Create a backend storing under `base_path`, building delivery URLs
    /// from `public_url` (the API's externally visible base URL).
    pub fn new(base_path: impl Into<PathBuf>, public_url: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Delivery URL for a media id.
    pub fn media_url(&self, media_id: &str) -> String {
        format!("{}/media/{}", self.public_url, media_id)
    }

    /// Resolve a media id to its file path, rejecting ids this backend
    /// could not have produced.
    pub fn media_path(&self, media_id: &str) -> Result<PathBuf> {
        let (stem, ext) = media_id
            .split_once('.')
            .ok_or_else(|| Error::InvalidInput(format!("Malformed media id '{}'", media_id)))?;
        let uuid = Uuid::parse_str(stem)
            .map_err(|_| Error::InvalidInput(format!("Malformed media id '{}'", media_id)))?;
        if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::InvalidInput(format!(
                "Malformed media id '{}'",
                media_id
            )));
        }
        Ok(self.base_path.join(storage_path(&uuid, ext)))
    }

    /// Validate that the storage backend can write, read, and delete files.
    ///
    /// Performs a full round-trip test at startup to catch filesystem issues
    /// (permission errors, missing directories) early.
    pub async fn validate(&self) -> std::result::Result<(), String> {
        let test_dir = self.base_path.join("blobs/.health-check");
        let test_file = test_dir.join("test.bin");

        fs::create_dir_all(&test_dir)
            .await
            .map_err(|e| format!("create_dir_all({:?}): {}", test_dir, e))?;

        let data = b"storage-health-check";
        fs::write(&test_file, data)
            .await
            .map_err(|e| format!("write({:?}): {}", test_file, e))?;

        let read_data = fs::read(&test_file)
            .await
            .map_err(|e| format!("read({:?}): {}", test_file, e))?;
        if read_data != data {
            return Err("read-back mismatch".to_string());
        }

        fs::remove_file(&test_file)
            .await
            .map_err(|e| format!("remove_file({:?}): {}", test_file, e))?;
        let _ = fs::remove_dir(&test_dir).await;

        Ok(())
    }
}

/// Relative storage path for a media file.
///
/// Example: `blobs/01/94/01948f7e-8b2a-7c3d-9e4f-5a6b7c8d9e0f.png`
pub fn storage_path(uuid: &Uuid, ext: &str) -> String {
    let hex = uuid.simple().to_string();
    format!(
        "blobs/{}/{}/{}.{}",
        &hex[0..2],
        &hex[2..4],
        uuid.as_hyphenated(),
        ext
    )
}

#[async_trait]
impl MediaStorage for LocalMediaStorage {
    async fn upload(&self, data: &[u8], file_ext: &str) -> Result<UploadedMedia> {
        let ext = normalize_file_ext(file_ext);
        if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::InvalidInput(format!(
                "Invalid file extension '{}'",
                file_ext
            )));
        }

        let uuid = Uuid::now_v7();
        let media_id = format!("{}.{}", uuid.as_hyphenated(), ext);
        let full_path = self.base_path.join(storage_path(&uuid, &ext));
        debug!(media_id = %media_id, full_path = %full_path.display(), size = data.len(), "local_media: write");

        write_atomic(&full_path, data).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&full_path, std::fs::Permissions::from_mode(0o644)).await?;
        }

        let media_url = self.media_url(&media_id);
        info!(media_id = %media_id, size_bytes = data.len(), "local_media: stored");
        Ok(UploadedMedia {
            media_id,
            media_url,
        })
    }

    async fn get_media(&self, media_id: &str) -> Result<Vec<u8>> {
        let full_path = self.media_path(media_id)?;
        if !fs::try_exists(&full_path).await? {
            return Err(Error::NotFound(format!("Media {} not found", media_id)));
        }
        Ok(fs::read(full_path).await?)
    }

    async fn video_to_thumbnail(&self, media_id: &str) -> Result<Vec<u8>> {
        Err(Error::Storage(format!(
            "Local media storage cannot extract video frames ({})",
            media_id
        )))
    }

    fn backend_name(&self) -> &'static str {
        "local"
    }
}

/// Envelope returned by the remote storage server.
#[derive(Debug, Deserialize)]
struct StorageEnvelope<T> {
    #[serde(default)]
    success: bool,
    payload: Option<T>,
    #[serde(default)]
    error_message: Option<String>,
}

/// Media backend talking to a remote storage server.
pub struct RemoteMediaStorage {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteMediaStorage {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, route: &str) -> String {
        format!("{}/{}", self.base_url, route)
    }

    async fn get_bytes(&self, route: &str) -> Result<Vec<u8>> {
        let resp = self.client.get(self.url(route)).send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("Remote media '{}' not found", route)));
        }
        if !resp.status().is_success() {
            return Err(Error::Storage(format!(
                "Storage server returned {} for {}",
                resp.status(),
                route
            )));
        }
        Ok(resp.bytes().await?.to_vec())
    }
}

#[async_trait]
impl MediaStorage for RemoteMediaStorage {
    async fn upload(&self, data: &[u8], file_ext: &str) -> Result<UploadedMedia> {
        let ext = normalize_file_ext(file_ext);
        let resp = self
            .client
            .post(self.url("upload"))
            .query(&[("fileExt", ext.as_str())])
            .body(data.to_vec())
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Error::Storage(format!(
                "Storage server upload failed with status {}",
                resp.status()
            )));
        }

        let envelope: StorageEnvelope<UploadedMedia> = resp.json().await?;
        match envelope.payload {
            Some(media) if envelope.success => {
                info!(media_id = %media.media_id, size_bytes = data.len(), "remote_media: stored");
                Ok(media)
            }
            _ => Err(Error::Storage(format!(
                "Storage server rejected upload: {}",
                envelope.error_message.unwrap_or_else(|| "no payload".to_string())
            ))),
        }
    }

    async fn get_media(&self, media_id: &str) -> Result<Vec<u8>> {
        self.get_bytes(&format!("media/{}", media_id)).await
    }

    async fn video_to_thumbnail(&self, media_id: &str) -> Result<Vec<u8>> {
        self.get_bytes(&format!("thumbnail/{}", media_id)).await
    }

    fn backend_name(&self) -> &'static str {
        "remote"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_storage_path_format() {
        let uuid = Uuid::parse_str("01948f7e-8b2a-7c3d-9e4f-5a6b7c8d9e0f").unwrap();
        assert_eq!(
            storage_path(&uuid, "png"),
            "blobs/01/94/01948f7e-8b2a-7c3d-9e4f-5a6b7c8d9e0f.png"
        );
    }

    #[tokio::test]
    async fn test_local_upload_and_read_back() {
        let dir = TempDir::new().unwrap();
        let storage = LocalMediaStorage::new(dir.path(), "http://localhost:5000/");

        let media = storage.upload(b"gif-bytes", ".GIF").await.unwrap();
        assert!(media.media_id.ends_with(".gif"));
        assert_eq!(
            media.media_url,
            format!("http://localhost:5000/media/{}", media.media_id)
        );

        let data = storage.get_media(&media.media_id).await.unwrap();
        assert_eq!(data, b"gif-bytes");
    }

    #[tokio::test]
    async fn test_local_rejects_traversal_ids() {
        let dir = TempDir::new().unwrap();
        let storage = LocalMediaStorage::new(dir.path(), "http://localhost");

        assert!(storage.get_media("../../etc/passwd").await.is_err());
        assert!(storage.get_media("no-extension").await.is_err());
        let err = storage
            .get_media("01948f7e-8b2a-7c3d-9e4f-5a6b7c8d9e0f.png/..")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_local_missing_media_is_not_found() {
        let dir = TempDir::new().unwrap();
        let storage = LocalMediaStorage::new(dir.path(), "http://localhost");
        let err = storage
            .get_media("01948f7e-8b2a-7c3d-9e4f-5a6b7c8d9e0f.png")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_local_video_thumbnail_unsupported() {
        let dir = TempDir::new().unwrap();
        let storage = LocalMediaStorage::new(dir.path(), "http://localhost");
        let err = storage.video_to_thumbnail("x.mp4").await.unwrap_err();
        assert!(err.is_storage());
    }

    #[tokio::test]
    async fn test_local_validate() {
        let dir = TempDir::new().unwrap();
        let storage = LocalMediaStorage::new(dir.path(), "http://localhost");
        assert!(storage.validate().await.is_ok());
    }
}
