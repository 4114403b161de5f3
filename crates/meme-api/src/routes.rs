//! Router construction.

use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::config::{MediaBackend, ServerConfig};
use crate::handlers::{media, memes, system};
use crate::state::AppState;

/// CORS layer for the configured origins. No configured origins allows any.
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins = config.cors_origins();
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(3600));

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

/// Build the API router.
///
/// `/media/:media_id` is only routed with the local media backend; remote
/// media is delivered by the storage server itself.
pub fn router(state: AppState, config: &ServerConfig) -> Router {
    let mut app = Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health_check))
        .route("/info/:id", get(memes::get_meme_info))
        .route("/download/:id", get(memes::download_meme))
        .route("/edit/:id", post(memes::edit_meme))
        .route("/browse", get(memes::browse_memes))
        .route("/search", get(memes::search_memes))
        .route("/add", post(memes::add_meme))
        .route("/upload", post(memes::upload_media));

    if config.media_storage == MediaBackend::Local {
        app = app.route("/media/:media_id", get(media::serve_media));
    }

    app.layer(TraceLayer::new_for_http())
        .layer(cors_layer(config))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_upload_bytes))
        .with_state(state)
}
