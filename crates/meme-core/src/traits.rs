//! Core traits for the meme library's collaborators.
//!
//! These traits define the seams the library orchestrator depends on,
//! enabling pluggable record persistence and media backends and testability.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// RECORD STORE TRAITS
// =============================================================================

/// Durable, keyed table of meme records.
///
/// Implementations keep the canonical record state in memory and persist it
/// explicitly through [`RecordStore::write_db`]. Every accessor fails with a
/// storage error until the store has been loaded or initialized.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Reset to an empty, loaded store.
    async fn init_db(&self) -> Result<()>;

    /// Load the store contents from its persistence backend.
    async fn load_db(&self) -> Result<()>;

    /// Persist the current contents to the backend.
    async fn write_db(&self) -> Result<()>;

    /// Whether the store has been loaded or initialized.
    async fn is_loaded(&self) -> bool;

    /// Check if a record exists.
    async fn has_item(&self, id: MemeId) -> Result<bool>;

    /// Fetch a record by id. Fails with `MemeNotFound` if absent.
    async fn get_item(&self, id: MemeId) -> Result<MemeRecord>;

    /// Insert a new record, assigning the next id.
    async fn add_item(&self, new: NewMeme, thumbnail: Option<String>) -> Result<MemeRecord>;

    /// Apply a partial name/tags update and return the updated record.
    async fn update_item(&self, id: MemeId, update: &MemeUpdate) -> Result<MemeRecord>;

    /// Set the media locators (and thumbnail, when one was produced) once the
    /// record's media upload has completed.
    async fn complete_upload(
        &self,
        id: MemeId,
        media: &UploadedMedia,
        thumbnail: Option<String>,
    ) -> Result<MemeRecord>;

    /// Drop a record that was never persisted, returning it.
    ///
    /// Used to undo an add whose save failed. Ids are not handed out again.
    async fn remove_item(&self, id: MemeId) -> Result<MemeRecord>;

    /// Overwrite an existing record wholesale. Used to undo an edit whose
    /// save failed.
    async fn replace_item(&self, record: MemeRecord) -> Result<()>;

    /// Records on one page, in insertion order.
    async fn page(&self, page: Page) -> Result<Vec<MemeRecord>>;

    /// Every record, in insertion order.
    async fn all_items(&self) -> Result<Vec<MemeRecord>>;

    /// Number of records.
    async fn count(&self) -> Result<usize>;
}

/// Backend holding the serialized record store document.
#[async_trait]
pub trait DocumentStorage: Send + Sync {
    /// Read the document. `None` when it does not exist yet.
    async fn read(&self) -> Result<Option<Vec<u8>>>;

    /// Replace the document.
    async fn write(&self, data: &[u8]) -> Result<()>;

    /// Human-readable location, used in logs.
    fn location(&self) -> String;
}

// =============================================================================
// MEDIA TRAITS
// =============================================================================

/// Service that stores the actual meme media and produces delivery URLs.
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Store media bytes, returning the storage id and delivery URL.
    async fn upload(&self, data: &[u8], file_ext: &str) -> Result<UploadedMedia>;

    /// Fetch the media bytes for a storage id.
    async fn get_media(&self, media_id: &str) -> Result<Vec<u8>>;

    /// Image bytes of a frame from the video at `media_id`.
    ///
    /// The bytes are not yet thumbnail-sized; they go through a
    /// [`ThumbnailMaker`] afterwards.
    async fn video_to_thumbnail(&self, media_id: &str) -> Result<Vec<u8>>;

    /// Backend name, used in logs.
    fn backend_name(&self) -> &'static str;
}

/// Turns image bytes into a small base64-encoded thumbnail.
pub trait ThumbnailMaker: Send + Sync {
    fn make_base64(&self, image: &[u8]) -> Result<String>;
}
