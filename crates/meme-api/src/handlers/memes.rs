//! Meme endpoints: info, download, edit, browse, search, add, upload.

use axum::body::Bytes;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::{debug, info};

use meme_core::{defaults, MediaType, MemeId, MemeUpdate, NewMeme, Page};

use crate::error::ApiError;
use crate::response::{MemePage, MemeView, Success};
use crate::services::SearchOptions;
use crate::state::AppState;

const INVALID_PAGE: &str = "Invalid values for \"page\" and/or \"per_page\" parameters";

fn parse_id(raw: &str) -> Result<MemeId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid meme id '{}'", raw)))
}

/// Build a page window from optional raw query values.
fn parse_page(per_page: Option<&str>, page: Option<&str>) -> Result<Page, ApiError> {
    let parse = |raw: Option<&str>, default: usize| -> Result<usize, ApiError> {
        match raw.map(str::trim).filter(|v| !v.is_empty()) {
            None => Ok(default),
            Some(v) => v
                .parse::<i64>()
                .ok()
                .filter(|n| *n > 0)
                .map(|n| n as usize)
                .ok_or_else(|| ApiError::bad_request(INVALID_PAGE)),
        }
    };
    let per_page = parse(per_page, defaults::PER_PAGE)?;
    let page = parse(page, defaults::PAGE)?;
    Page::new(per_page, page).map_err(ApiError::from)
}

/// Parse an optional JSON body; an empty body is `T::default()`.
fn parse_json_body<T>(body: &Bytes) -> Result<T, ApiError>
where
    T: for<'de> Deserialize<'de> + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {}", e)))
}

// =============================================================================
// READ ENDPOINTS
// =============================================================================

pub async fn get_meme_info(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let meme = state.library.get_meme(parse_id(&id)?).await?;
    Ok(Success(MemeView::from(meme)))
}

/// Redirect to the meme's media URL.
pub async fn download_meme(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let meme = state.library.get_meme(parse_id(&id)?).await?;
    if meme.media_url.is_empty() {
        return Err(ApiError::NotFound(format!(
            "Meme {} has no uploaded media",
            meme.id
        )));
    }
    Ok((StatusCode::FOUND, [(header::LOCATION, meme.media_url)]).into_response())
}

#[derive(Debug, Deserialize)]
pub struct BrowseParams {
    pub per_page: Option<String>,
    pub page: Option<String>,
}

pub async fn browse_memes(
    State(state): State<AppState>,
    Query(params): Query<BrowseParams>,
) -> Result<impl IntoResponse, ApiError> {
    let page = parse_page(params.per_page.as_deref(), params.page.as_deref())?;
    let memes = state.library.browse_memes(page).await?;
    debug!(page = page.page, per_page = page.per_page, result_count = memes.len(), "Browse");
    Ok(Success(MemePage::new(memes, page)))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
    pub per_page: Option<String>,
    pub page: Option<String>,
    pub media_type: Option<String>,
}

/// Parse the `media_type` search parameter: `all`, `image` or `video`.
fn parse_media_type(raw: Option<&str>) -> Result<Option<MediaType>, ApiError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match raw.trim().to_lowercase().as_str() {
        "all" => Ok(None),
        "image" => Ok(Some(MediaType::Image)),
        "video" => Ok(Some(MediaType::Video)),
        other => Err(ApiError::bad_request(format!(
            "Invalid media type: \"{}\". Accepted types are: [\"all\", \"image\", \"video\"]",
            other
        ))),
    }
}

pub async fn search_memes(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = params
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| {
            ApiError::bad_request("No query found, use \"query\" for the URL parameter")
        })?;
    let page = parse_page(params.per_page.as_deref(), params.page.as_deref())?;

    let mut options = SearchOptions::new(page);
    if let Some(media_type) = parse_media_type(params.media_type.as_deref())? {
        options = options.only(media_type);
    }

    let memes = state.library.search(query, options).await?;
    Ok(Success(MemePage::new(memes, page)))
}

// =============================================================================
// WRITE ENDPOINTS
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct EditRequest {
    pub name: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Edit a meme's name and/or tags. The edit is saved and searchable when
/// the response is sent.
pub async fn edit_meme(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let req: EditRequest = parse_json_body(&body)?;
    let update = MemeUpdate {
        name: req.name,
        tags: req.tags,
    };

    let meme = state.library.commit_edit(id, &update).await?;
    Ok(Success(MemeView::from(meme)))
}

#[derive(Debug, Default, Deserialize)]
pub struct AddRequest {
    pub name: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(rename = "fileExt")]
    pub file_ext: Option<String>,
    #[serde(rename = "mediaID", default)]
    pub media_id: String,
    #[serde(rename = "mediaURL", default)]
    pub media_url: String,
}

/// Add a meme record for already-uploaded media.
pub async fn add_meme(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let req: AddRequest = parse_json_body(&body)?;
    let name = req
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing \"name\""))?;
    let file_ext = req
        .file_ext
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing \"fileExt\""))?;

    let mut new = NewMeme::new(name, file_ext).with_tags(req.tags);
    new.media_id = req.media_id;
    new.media_url = req.media_url;

    let meme = state.library.commit_new_meme(new).await?;
    info!(meme_id = meme.id, "Meme added via API");
    Ok(Success(MemeView::from(meme)))
}

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    #[serde(rename = "fileExt")]
    pub file_ext: Option<String>,
}

/// Upload media. Multipart field `file` holds the bytes; the extension comes
/// from the `fileExt` field, the `fileExt` query parameter, or the file name.
pub async fn upload_media(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut file: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut file_ext = params.file_ext;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {}", e)))?
    {
        match field.name() {
            Some("file") => {
                file_name = field.file_name().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read file data: {}", e)))?;
                file = Some(data.to_vec());
            }
            Some("fileExt") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read fileExt: {}", e)))?;
                file_ext = Some(text);
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| ApiError::bad_request("No selected file"))?;
    if file.is_empty() {
        return Err(ApiError::bad_request("File is empty or does not exist"));
    }

    let file_ext = file_ext
        .filter(|e| !e.trim().is_empty())
        .or_else(|| {
            file_name
                .as_deref()
                .and_then(|n| n.rsplit_once('.'))
                .map(|(_, ext)| ext.to_string())
        })
        .ok_or_else(|| ApiError::bad_request("Missing \"fileExt\""))?;

    let media = state.library.upload_media(&file, &file_ext).await?;
    Ok(Success(media))
}
