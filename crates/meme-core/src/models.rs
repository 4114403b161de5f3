//! Core data models for the meme library.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// Identifier of a meme record, assigned by the record store.
pub type MemeId = u64;

/// File extensions treated as video media.
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mov", "mp4", "webm", "avi", "3g2", "mpeg", "3gp", "ts", "ogv",
];

/// File extensions treated as image media.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "heic", "tiff", "webp", "ico", "tif", "svg", "bmp",
];

/// Normalize a file extension: lowercase with every dot removed.
///
/// `".PNG"` becomes `"png"`.
pub fn normalize_file_ext(ext: &str) -> String {
    ext.trim().to_lowercase().replace('.', "")
}

// =============================================================================
// MEDIA TYPE
// =============================================================================

/// Kind of media a meme holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
    #[default]
    Unknown,
}

impl MediaType {
    /// Derive the media type from a file extension (case and dots ignored).
    pub fn from_ext(ext: &str) -> Self {
        let ext = normalize_file_ext(ext);
        if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            MediaType::Video
        } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            MediaType::Image
        } else {
            MediaType::Unknown
        }
    }

    /// Whether media with this extension may be uploaded.
    pub fn is_accepted_upload(ext: &str) -> bool {
        MediaType::from_ext(ext) != MediaType::Unknown
    }

    /// Numeric code stored in the search index.
    pub fn code(self) -> u8 {
        match self {
            MediaType::Image => 0,
            MediaType::Video => 1,
            MediaType::Unknown => 2,
        }
    }

    /// Inverse of [`MediaType::code`].
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(MediaType::Image),
            1 => Some(MediaType::Video),
            2 => Some(MediaType::Unknown),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
            MediaType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "image" => Ok(MediaType::Image),
            "video" => Ok(MediaType::Video),
            "unknown" => Ok(MediaType::Unknown),
            other => Err(Error::InvalidInput(format!(
                "Unknown media type '{}'",
                other
            ))),
        }
    }
}

// =============================================================================
// MEME RECORD
// =============================================================================

/// A meme in the library, as persisted by the record store.
///
/// Field names follow the persisted JSON layout (`mediaType`, `fileExt`,
/// `mediaID`, `mediaURL`). An absent thumbnail is stored as `""`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemeRecord {
    pub id: MemeId,
    pub name: String,
    #[serde(rename = "mediaType")]
    pub media_type: MediaType,
    #[serde(rename = "fileExt")]
    pub file_ext: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(rename = "mediaID", default)]
    pub media_id: String,
    #[serde(rename = "mediaURL", default)]
    pub media_url: String,
    #[serde(default, with = "empty_string_as_none")]
    pub thumbnail: Option<String>,
}

impl MemeRecord {
    /// Build a record from creation input. The media type is derived from
    /// the (normalized) file extension.
    pub fn from_new(id: MemeId, new: NewMeme, thumbnail: Option<String>) -> Self {
        let file_ext = normalize_file_ext(&new.file_ext);
        Self {
            id,
            name: new.name,
            media_type: MediaType::from_ext(&file_ext),
            file_ext,
            tags: new.tags,
            media_id: new.media_id,
            media_url: new.media_url,
            thumbnail,
        }
    }

    /// Apply a partial update. Only fields present in the update change.
    pub fn apply(&mut self, update: &MemeUpdate) {
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(tags) = &update.tags {
            self.tags = tags.clone();
        }
    }

    /// Tags joined with commas, the keyword form used by the search index.
    pub fn joined_tags(&self) -> String {
        self.tags.join(",")
    }
}

/// Input for creating a meme record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewMeme {
    pub name: String,
    #[serde(rename = "fileExt")]
    pub file_ext: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(rename = "mediaID", default)]
    pub media_id: String,
    #[serde(rename = "mediaURL", default)]
    pub media_url: String,
}

impl NewMeme {
    pub fn new(name: impl Into<String>, file_ext: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file_ext: file_ext.into(),
            ..Default::default()
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_media(mut self, media: UploadedMedia) -> Self {
        self.media_id = media.media_id;
        self.media_url = media.media_url;
        self
    }
}

/// Partial update of a meme's editable fields.
///
/// `None` means "leave unchanged"; `Some(vec![])` clears the tags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemeUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl MemeUpdate {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            tags: None,
        }
    }

    pub fn tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: None,
            tags: Some(tags.into_iter().map(Into::into).collect()),
        }
    }

    /// True when the update carries no field.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.tags.is_none()
    }
}

/// Location of uploaded media as reported by the media storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedMedia {
    #[serde(rename = "mediaID")]
    pub media_id: String,
    #[serde(rename = "mediaURL")]
    pub media_url: String,
}

/// Pagination window shared by browse and search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub per_page: usize,
    pub page: usize,
}

impl Page {
    /// Validate and build a page window. Both values must be positive.
    pub fn new(per_page: usize, page: usize) -> Result<Self> {
        if per_page == 0 || page == 0 {
            return Err(Error::InvalidInput(
                "Invalid values for \"page\" and/or \"per_page\" parameters".to_string(),
            ));
        }
        Ok(Self { per_page, page })
    }

    /// Index of the first item on this page.
    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.per_page)
    }

    /// Half-open range `[offset, min(total, offset + per_page))`, or `None`
    /// when the page starts past the end.
    pub fn range(&self, total: usize) -> Option<std::ops::Range<usize>> {
        let start = self.offset();
        if start >= total {
            return None;
        }
        Some(start..start.saturating_add(self.per_page).min(total))
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            per_page: crate::defaults::PER_PAGE,
            page: 1,
        }
    }
}

mod empty_string_as_none {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<String>, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(value.as_deref().unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<String>, D::Error> {
        let value: Option<String> = Option::deserialize(d)?;
        Ok(value.filter(|s| !s.is_empty()))
    }
}
