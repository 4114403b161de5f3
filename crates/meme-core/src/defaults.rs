//! Centralized default constants for the meme library.
//!
//! All crates reference these constants instead of defining their own magic
//! numbers.

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for browse and search.
pub const PER_PAGE: usize = 10;

/// Default page number (pages are 1-based).
pub const PAGE: usize = 1;

// =============================================================================
// THUMBNAILS
// =============================================================================

/// Thumbnails are shrunk to fit inside this many pixels on each side.
pub const THUMBNAIL_SIZE: u32 = 100;

/// JPEG quality used when encoding thumbnails.
pub const THUMBNAIL_JPEG_QUALITY: u8 = 80;

// =============================================================================
// SEARCH
// =============================================================================

/// BM25 term-frequency saturation.
pub const BM25_K1: f32 = 1.2;

/// BM25 length normalization.
pub const BM25_B: f32 = 0.75;

/// Relative weight of matches in the meme name.
pub const NAME_FIELD_WEIGHT: f32 = 1.0;

/// Relative weight of matches in the meme tags.
pub const TAGS_FIELD_WEIGHT: f32 = 1.0;

/// Tokens shorter than this are dropped by the analyzer. One-letter tags
/// such as `x` stay searchable.
pub const MIN_TOKEN_LEN: usize = 1;

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP bind host.
pub const SERVER_HOST: &str = "0.0.0.0";

/// Default HTTP port.
pub const SERVER_PORT: u16 = 5000;

/// Default local JSON database path.
pub const DB_PATH: &str = "data/db.json";

/// Default local media directory.
pub const MEDIA_DIR: &str = "data/media";

/// Default request body limit for uploads (50 MiB).
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;
