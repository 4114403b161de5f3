//! Tracing subscriber setup for the server binary.
//!
//! Controlled by:
//! - `LOG_FORMAT`: `json` or `text` (default `text`)
//! - `LOG_FILE`: write to a daily-rotated file instead of stdout
//! - `LOG_ANSI`: force ANSI colors on or off
//! - `RUST_LOG`: env filter, default [`DEFAULT_FILTER`]

use std::env;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "meme_api=debug,meme_db=info,meme_search=info,tower_http=debug";

const DEFAULT_LOG_FILE_NAME: &str = "meme-api.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LogSettings {
    pub format: LogFormat,
    pub file: Option<PathBuf>,
    /// `None` keeps the default: auto-detected on stdout, off in files.
    pub ansi: Option<bool>,
}

impl LogSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let format = match lookup("LOG_FORMAT").as_deref().map(str::trim) {
            Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };
        let file = lookup("LOG_FILE")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);
        let ansi = lookup("LOG_ANSI").map(|v| matches!(v.trim(), "true" | "1"));
        Self { format, file, ansi }
    }

    /// Directory and file name for the rolling appender.
    fn file_parts(path: &Path) -> (PathBuf, String) {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let name = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or(DEFAULT_LOG_FILE_NAME)
            .to_string();
        (dir, name)
    }

    /// Install the global subscriber. Keep the returned guard alive for the
    /// life of the process so buffered file output is flushed.
    pub fn init(&self) -> Option<WorkerGuard> {
        let Some(path) = &self.file else {
            self.install(std::io::stdout, self.ansi);
            return None;
        };

        let (dir, name) = Self::file_parts(path);
        let (writer, guard) =
            tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, name));
        self.install(writer, Some(self.ansi.unwrap_or(false)));
        Some(guard)
    }

    fn install<W>(&self, writer: W, ansi: Option<bool>)
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
        let registry = tracing_subscriber::registry().with(filter);

        match self.format {
            LogFormat::Json => registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
                .init(),
            LogFormat::Text => {
                let mut layer = tracing_subscriber::fmt::layer().with_writer(writer);
                if let Some(ansi) = ansi {
                    layer = layer.with_ansi(ansi);
                }
                registry.with(layer).init()
            }
        }
    }
}
