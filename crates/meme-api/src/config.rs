//! Server configuration from `RMSVR_*` environment variables.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use axum::http::HeaderValue;
use meme_core::defaults;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid backend: {0}")]
    InvalidBackend(String),

    #[error("Missing configuration: {0}")]
    Missing(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Where the record store document lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordStoreBackend {
    #[default]
    Local,
    Remote,
}

impl FromStr for RecordStoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "remote" => Ok(Self::Remote),
            _ => Err(ConfigError::InvalidBackend(s.to_string())),
        }
    }
}

impl fmt::Display for RecordStoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

/// Where meme media is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaBackend {
    #[default]
    Local,
    Remote,
}

impl FromStr for MediaBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "remote" => Ok(Self::Remote),
            _ => Err(ConfigError::InvalidBackend(s.to_string())),
        }
    }
}

impl fmt::Display for MediaBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

/// Full server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Externally visible base URL, used for local media URLs.
    pub public_url: String,
    pub record_store: RecordStoreBackend,
    pub db_path: PathBuf,
    pub db_remote_url: Option<String>,
    pub db_remote_token: Option<String>,
    pub media_storage: MediaBackend,
    pub media_dir: PathBuf,
    pub media_remote_url: Option<String>,
    pub thumbnails: bool,
    pub max_upload_bytes: usize,
    /// CORS origins. Empty allows any origin.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: defaults::SERVER_HOST.to_string(),
            port: defaults::SERVER_PORT,
            public_url: format!("http://127.0.0.1:{}", defaults::SERVER_PORT),
            record_store: RecordStoreBackend::Local,
            db_path: PathBuf::from(defaults::DB_PATH),
            db_remote_url: None,
            db_remote_token: None,
            media_storage: MediaBackend::Local,
            media_dir: PathBuf::from(defaults::MEDIA_DIR),
            media_remote_url: None,
            thumbnails: true,
            max_upload_bytes: defaults::MAX_UPLOAD_BYTES,
            allowed_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(host) = var("RMSVR_HOST") {
            config.host = host;
        }
        if let Some(port) = var("RMSVR_PORT") {
            config.port = parse_value("RMSVR_PORT", &port)?;
        }
        config.public_url = var("RMSVR_PUBLIC_URL")
            .unwrap_or_else(|| format!("http://127.0.0.1:{}", config.port))
            .trim_end_matches('/')
            .to_string();

        if let Some(backend) = var("RMSVR_RECORD_STORE") {
            config.record_store = backend.parse()?;
        }
        if let Some(path) = var("RMSVR_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }
        config.db_remote_url = var("RMSVR_DB_REMOTE_URL");
        config.db_remote_token = var("RMSVR_DB_REMOTE_TOKEN");
        if config.record_store == RecordStoreBackend::Remote && config.db_remote_url.is_none() {
            return Err(ConfigError::Missing("RMSVR_DB_REMOTE_URL".to_string()));
        }

        if let Some(backend) = var("RMSVR_MEDIA_STORAGE") {
            config.media_storage = backend.parse()?;
        }
        if let Some(dir) = var("RMSVR_MEDIA_DIR") {
            config.media_dir = PathBuf::from(dir);
        }
        config.media_remote_url = var("RMSVR_MEDIA_REMOTE_URL");
        if config.media_storage == MediaBackend::Remote && config.media_remote_url.is_none() {
            return Err(ConfigError::Missing("RMSVR_MEDIA_REMOTE_URL".to_string()));
        }

        if let Some(flag) = var("RMSVR_THUMBNAILS") {
            config.thumbnails = parse_bool("RMSVR_THUMBNAILS", &flag)?;
        }
        if let Some(limit) = var("RMSVR_MAX_UPLOAD_BYTES") {
            config.max_upload_bytes = parse_value("RMSVR_MAX_UPLOAD_BYTES", &limit)?;
        }
        if let Some(origins) = var("RMSVR_ALLOWED_ORIGINS") {
            config.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }

        Ok(config)
    }

    /// Socket address string to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// CORS origins as header values. Invalid entries are logged and skipped.
    pub fn cors_origins(&self) -> Vec<HeaderValue> {
        self.allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("Invalid CORS origin '{}': {}", origin, e);
                    None
                }
            })
            .collect()
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> ConfigResult<T> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
