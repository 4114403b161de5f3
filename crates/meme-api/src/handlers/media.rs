//! Media delivery for the local media backend.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;

use meme_core::normalize_file_ext;

use crate::error::ApiError;
use crate::state::AppState;

/// Content type for a media file extension.
fn content_type(ext: &str) -> &'static str {
    match normalize_file_ext(ext).as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "ico" => "image/x-icon",
        "svg" => "image/svg+xml",
        "tif" | "tiff" => "image/tiff",
        "heic" => "image/heic",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "avi" => "video/x-msvideo",
        "mpeg" => "video/mpeg",
        "3gp" => "video/3gpp",
        "3g2" => "video/3gpp2",
        "ts" => "video/mp2t",
        "ogv" => "video/ogg",
        _ => "application/octet-stream",
    }
}

/// Serve stored media bytes by media id.
pub async fn serve_media(
    State(state): State<AppState>,
    Path(media_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let data = state.library.get_media(&media_id).await?;
    let ext = media_id.rsplit_once('.').map(|(_, e)| e).unwrap_or("");
    Ok(([(header::CONTENT_TYPE, content_type(ext))], data))
}
