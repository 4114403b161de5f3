//! Success envelope and payload shapes.

use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use meme_core::{MediaType, MemeId, MemeRecord, Page};

/// Successful response: `{"success": true, "payload": ...}`.
pub struct Success<T>(pub T);

impl<T: Serialize> IntoResponse for Success<T> {
    fn into_response(self) -> Response {
        Json(json!({
            "success": true,
            "payload": self.0,
        }))
        .into_response()
    }
}

/// A meme as returned to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemeView {
    pub id: MemeId,
    pub name: String,
    pub media_type: MediaType,
    pub file_ext: String,
    pub tags: Vec<String>,
    pub url: String,
    pub thumbnail: Option<String>,
}

impl From<MemeRecord> for MemeView {
    fn from(meme: MemeRecord) -> Self {
        Self {
            id: meme.id,
            name: meme.name,
            media_type: meme.media_type,
            file_ext: meme.file_ext,
            tags: meme.tags,
            url: meme.media_url,
            thumbnail: meme.thumbnail,
        }
    }
}

/// One page of memes from browse or search.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemePage {
    pub results: Vec<MemeView>,
    pub items_per_page: usize,
    pub page: usize,
}

impl MemePage {
    pub fn new(memes: Vec<MemeRecord>, page: Page) -> Self {
        Self {
            results: memes.into_iter().map(MemeView::from).collect(),
            items_per_page: page.per_page,
            page: page.page,
        }
    }
}
