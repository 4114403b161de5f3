//! Root and health endpoints.

use axum::extract::State;
use axum::response::IntoResponse;
use serde_json::json;

use crate::error::ApiError;
use crate::response::Success;
use crate::state::AppState;

pub async fn root() -> impl IntoResponse {
    Success(json!({
        "message": "Welcome to the reaction meme server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Liveness plus library counts. `indexed` is the number of indexed memes,
/// or `null` before the first index build.
pub async fn health_check(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let memes = state.library.meme_count().await?;
    let indexed = state.library.index_stats().map(|s| s.documents);
    Ok(Success(json!({
        "status": "healthy",
        "memes": memes,
        "indexed": indexed,
        "mediaBackend": state.library.media_backend(),
    })))
}
