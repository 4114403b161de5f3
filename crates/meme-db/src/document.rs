//! Backends holding the serialized record store document.
//!
//! - [`LocalJsonFile`]: a JSON file on the local filesystem, written atomically
//! - [`RemoteJsonDocument`]: a JSON document on a remote file server, fetched
//!   with `GET` and replaced with `PUT`

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use meme_core::{DocumentStorage, Error, Result};
use reqwest::StatusCode;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Write a file atomically: temp file, fsync, rename.
pub(crate) async fn write_atomic(full_path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = full_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await.map_err(|e| {
                warn!(parent = %parent.display(), error = %e, "storage: create_dir_all failed");
                e
            })?;
        }
    }

    let temp_path = full_path.with_extension("tmp");
    let mut file = fs::File::create(&temp_path).await.map_err(|e| {
        warn!(temp_path = %temp_path.display(), error = %e, "storage: File::create failed");
        e
    })?;
    file.write_all(data).await?;
    file.sync_all().await?;
    drop(file);

    fs::rename(&temp_path, full_path).await.map_err(|e| {
        warn!(from = %temp_path.display(), to = %full_path.display(), error = %e, "storage: rename failed");
        e
    })?;

    Ok(())
}

/// Record store document kept in a local JSON file.
#[derive(Debug, Clone)]
pub struct LocalJsonFile {
    path: PathBuf,
}

impl LocalJsonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DocumentStorage for LocalJsonFile {
    async fn read(&self) -> Result<Option<Vec<u8>>> {
        if !fs::try_exists(&self.path).await? {
            return Ok(None);
        }
        Ok(Some(fs::read(&self.path).await?))
    }

    async fn write(&self, data: &[u8]) -> Result<()> {
        debug!(path = %self.path.display(), size = data.len(), "document: write");
        write_atomic(&self.path, data).await
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Record store document kept on a remote file server.
pub struct RemoteJsonDocument {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl RemoteJsonDocument {
    pub fn new(url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            token,
        }
    }

    fn request(&self, method: reqwest::Method) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, &self.url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

#[async_trait]
impl DocumentStorage for RemoteJsonDocument {
    async fn read(&self) -> Result<Option<Vec<u8>>> {
        let resp = self.request(reqwest::Method::GET).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(Error::Storage(format!(
                "Remote document read failed with status {}",
                resp.status()
            )));
        }
        Ok(Some(resp.bytes().await?.to_vec()))
    }

    async fn write(&self, data: &[u8]) -> Result<()> {
        debug!(url = %self.url, size = data.len(), "document: remote write");
        let resp = self
            .request(reqwest::Method::PUT)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(data.to_vec())
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Error::Storage(format!(
                "Remote document write failed with status {}",
                resp.status()
            )));
        }
        Ok(())
    }

    fn location(&self) -> String {
        self.url.clone()
    }
}
