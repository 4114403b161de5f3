//! Reaction meme server.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use meme_api::telemetry::LogSettings;
use meme_api::{router, AppState, Library, MediaBackend, RecordStoreBackend, ServerConfig};
use meme_core::{DocumentStorage, MediaStorage, RecordStore};
use meme_db::{
    ImageThumbnailer, JsonRecordStore, LocalJsonFile, LocalMediaStorage, RemoteJsonDocument,
    RemoteMediaStorage,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let log_settings = LogSettings::from_env();
    let _log_guard = log_settings.init();
    info!(
        log_format = ?log_settings.format,
        log_file = %log_settings
            .file
            .as_deref()
            .map_or_else(|| "(stdout)".into(), |p| p.display().to_string()),
        "Logging initialized"
    );

    let config = ServerConfig::from_env().context("Invalid server configuration")?;
    info!(
        record_store = %config.record_store,
        media_storage = %config.media_storage,
        public_url = %config.public_url,
        thumbnails = config.thumbnails,
        "Configuration loaded"
    );

    // Record store
    let document: Arc<dyn DocumentStorage> = match config.record_store {
        RecordStoreBackend::Local => Arc::new(LocalJsonFile::new(&config.db_path)),
        RecordStoreBackend::Remote => Arc::new(RemoteJsonDocument::new(
            config.db_remote_url.clone().unwrap_or_default(),
            config.db_remote_token.clone(),
        )),
    };
    let store: Arc<dyn RecordStore> = Arc::new(JsonRecordStore::new(document));

    // Media storage
    let media: Arc<dyn MediaStorage> = match config.media_storage {
        MediaBackend::Local => {
            let local = LocalMediaStorage::new(&config.media_dir, &config.public_url);
            if let Err(e) = local.validate().await {
                anyhow::bail!(
                    "Media directory {} is not usable: {}",
                    config.media_dir.display(),
                    e
                );
            }
            Arc::new(local)
        }
        MediaBackend::Remote => Arc::new(RemoteMediaStorage::new(
            config.media_remote_url.clone().unwrap_or_default(),
        )),
    };

    let mut library = Library::new(store, media);
    if config.thumbnails {
        library = library.with_thumbnails(Arc::new(ImageThumbnailer::default()));
    }
    let library = Arc::new(library);

    // Load and index before serving
    library
        .try_load_library()
        .await
        .context("Failed to load the meme library")?;
    let stats = library
        .index_library()
        .await
        .context("Failed to index the meme library")?;
    if stats.documents == 0 {
        warn!("Meme library is empty");
    }

    let app = router(AppState::new(library), &config);

    let addr: SocketAddr = config.bind_addr().parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
