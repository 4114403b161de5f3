//! Meme library: coordinates the record store, the search index and media
//! storage.
//!
//! The library is the only writer of both the store and the index. Every
//! mutation holds the library's write guard from the store change through the
//! index upsert; searches hold the read guard. A search therefore never sees a
//! record that is in the store but missing from (or stale in) the index.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};

use meme_core::logging::{component, subsystem};
use meme_core::{
    normalize_file_ext, Error, MediaStorage, MediaType, MemeId, MemeRecord, MemeUpdate, NewMeme,
    Page, RecordStore, Result, ThumbnailMaker, UploadedMedia,
};
use meme_search::{IndexStats, MediaFilter, SearchIndex};

/// Search options beyond the query text.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchOptions {
    pub page: Page,
    pub filter: MediaFilter,
}

impl SearchOptions {
    pub fn new(page: Page) -> Self {
        Self {
            page,
            filter: MediaFilter::default(),
        }
    }

    pub fn only(mut self, media_type: MediaType) -> Self {
        self.filter.only = Some(media_type);
        self
    }

    pub fn exclude(mut self, media_type: MediaType) -> Self {
        self.filter.exclude = Some(media_type);
        self
    }
}

/// The meme library.
pub struct Library {
    store: Arc<dyn RecordStore>,
    media: Arc<dyn MediaStorage>,
    thumbnails: Option<Arc<dyn ThumbnailMaker>>,
    index: SearchIndex,
    mutation: RwLock<()>,
}

impl Library {
    pub fn new(store: Arc<dyn RecordStore>, media: Arc<dyn MediaStorage>) -> Self {
        Self {
            store,
            media,
            thumbnails: None,
            index: SearchIndex::new(),
            mutation: RwLock::new(()),
        }
    }

    /// Generate thumbnails for new memes with `maker`.
    pub fn with_thumbnails(mut self, maker: Arc<dyn ThumbnailMaker>) -> Self {
        self.thumbnails = Some(maker);
        self
    }

    pub fn media_backend(&self) -> &'static str {
        self.media.backend_name()
    }

    // =========================================================================
    // READS
    // =========================================================================

    pub async fn has_meme(&self, id: MemeId) -> Result<bool> {
        self.store.has_item(id).await
    }

    /// Fetch a meme. Fails with [`Error::MemeNotFound`] if absent.
    pub async fn get_meme(&self, id: MemeId) -> Result<MemeRecord> {
        self.store.get_item(id).await
    }

    pub async fn meme_count(&self) -> Result<usize> {
        self.store.count().await
    }

    pub fn has_index(&self) -> bool {
        self.index.has_index()
    }

    pub fn index_stats(&self) -> Option<IndexStats> {
        self.index.stats()
    }

    /// Memes in insertion order, straight from the store.
    pub async fn browse_memes(&self, page: Page) -> Result<Vec<MemeRecord>> {
        self.store.page(page).await
    }

    /// Ranked memes matching `query`, resolved to full records.
    #[instrument(skip(self, options), fields(
        subsystem = subsystem::LIBRARY,
        component = component::LIBRARY,
        op = "search",
        query = %query,
    ))]
    pub async fn search(&self, query: &str, options: SearchOptions) -> Result<Vec<MemeRecord>> {
        let start = Instant::now();
        let _guard = self.mutation.read().await;

        let hits = self.index.search(query, options.page, options.filter)?;
        let mut memes = Vec::with_capacity(hits.len());
        for hit in hits {
            match self.store.get_item(hit.meme_id).await {
                Ok(meme) => memes.push(meme),
                Err(Error::MemeNotFound(id)) => {
                    warn!(meme_id = id, "Indexed meme missing from store, skipping");
                }
                Err(e) => return Err(e),
            }
        }

        debug!(
            result_count = memes.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Library search completed"
        );
        Ok(memes)
    }

    /// Raw media bytes for a storage id.
    pub async fn get_media(&self, media_id: &str) -> Result<Vec<u8>> {
        self.media.get_media(media_id).await
    }

    // =========================================================================
    // INDEX
    // =========================================================================

    /// Rebuild the search index from the store's current contents.
    #[instrument(skip(self), fields(subsystem = subsystem::LIBRARY, component = component::LIBRARY, op = "index_library"))]
    pub async fn index_library(&self) -> Result<IndexStats> {
        let _guard = self.mutation.write().await;
        self.rebuild_index().await
    }

    async fn rebuild_index(&self) -> Result<IndexStats> {
        let records = self.store.all_items().await?;
        Ok(self.index.build_from_records(&records))
    }

    /// Upsert one record, building the whole index if none exists yet.
    ///
    /// Callers hold the write guard.
    async fn index_meme(&self, record: &MemeRecord) -> Result<()> {
        match self.index.index_one(record) {
            Err(Error::IndexNotReady) => {
                debug!(meme_id = record.id, "No index yet, building from store");
                self.rebuild_index().await.map(|_| ())
            }
            other => other,
        }
    }

    /// Index a mutated record, then persist the store.
    ///
    /// Callers hold the write guard.
    async fn index_and_save(&self, record: &MemeRecord) -> Result<()> {
        self.index_meme(record).await?;
        self.store.write_db().await
    }

    /// Undo an add that was never persisted.
    async fn discard_unsaved(&self, id: MemeId) {
        if let Err(e) = self.store.remove_item(id).await {
            error!(meme_id = id, error = %e, "Failed to drop unsaved meme");
        }
        self.index.remove(id);
        warn!(meme_id = id, "Unsaved meme rolled back");
    }

    /// Undo an edit that was never persisted.
    async fn restore_unsaved(&self, previous: MemeRecord) {
        let id = previous.id;
        match self.index.index_one(&previous) {
            Ok(()) | Err(Error::IndexNotReady) => {}
            Err(e) => error!(meme_id = id, error = %e, "Failed to restore index entry"),
        }
        if let Err(e) = self.store.replace_item(previous).await {
            error!(meme_id = id, error = %e, "Failed to restore unsaved meme");
        }
        warn!(meme_id = id, "Unsaved edit rolled back");
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Add a meme record.
    ///
    /// The media type comes from the file extension. A thumbnail is produced
    /// when a thumbnail maker is configured and the media is reachable;
    /// thumbnail failures leave it empty. With `add_to_index` the record is
    /// searchable when this returns. Nothing is persisted; see
    /// [`Library::commit_new_meme`].
    #[instrument(skip(self, new), fields(subsystem = subsystem::LIBRARY, component = component::LIBRARY, op = "add_meme"))]
    pub async fn add_meme_to_library(&self, new: NewMeme, add_to_index: bool) -> Result<MemeRecord> {
        let thumbnail = self.make_thumbnail(&new).await;

        let _guard = self.mutation.write().await;
        let record = self.store.add_item(new, thumbnail).await?;
        if add_to_index {
            self.index_meme(&record).await?;
        }

        info!(
            meme_id = record.id,
            media_type = %record.media_type,
            indexed = add_to_index,
            "Meme added"
        );
        Ok(record)
    }

    /// Add a meme, index it, and persist the store, as one step.
    ///
    /// If indexing or the save fails the meme is dropped again, so a failed
    /// call leaves neither a stored nor a searchable record behind.
    #[instrument(skip(self, new), fields(subsystem = subsystem::LIBRARY, component = component::LIBRARY, op = "commit_new_meme"))]
    pub async fn commit_new_meme(&self, new: NewMeme) -> Result<MemeRecord> {
        let thumbnail = self.make_thumbnail(&new).await;

        let _guard = self.mutation.write().await;
        let record = self.store.add_item(new, thumbnail).await?;
        if let Err(e) = self.index_and_save(&record).await {
            self.discard_unsaved(record.id).await;
            return Err(e);
        }

        info!(meme_id = record.id, media_type = %record.media_type, "Meme committed");
        Ok(record)
    }

    /// Apply a partial name/tags update without saving or reindexing.
    ///
    /// The edit is not guaranteed to be searchable until
    /// [`Library::index_library`] runs; use [`Library::commit_edit`] for a
    /// single-meme edit.
    pub async fn edit_meme(&self, id: MemeId, update: &MemeUpdate) -> Result<MemeRecord> {
        let _guard = self.mutation.write().await;
        let record = self.store.update_item(id, update).await?;
        debug!(meme_id = id, "Meme edited");
        Ok(record)
    }

    /// Edit a meme, reindex it, and persist the store, as one step.
    ///
    /// An empty update returns the record unchanged and touches nothing. If
    /// indexing or the save fails the previous record is restored in both the
    /// store and the index.
    #[instrument(skip(self, update), fields(subsystem = subsystem::LIBRARY, component = component::LIBRARY, op = "commit_edit", meme_id = id))]
    pub async fn commit_edit(&self, id: MemeId, update: &MemeUpdate) -> Result<MemeRecord> {
        if update.is_empty() {
            return self.get_meme(id).await;
        }

        let _guard = self.mutation.write().await;
        let previous = self.store.get_item(id).await?;
        let record = self.store.update_item(id, update).await?;
        if let Err(e) = self.index_and_save(&record).await {
            self.restore_unsaved(previous).await;
            return Err(e);
        }

        info!(meme_id = id, "Meme edit committed");
        Ok(record)
    }

    /// Store media bytes with the media backend.
    ///
    /// Only image and video extensions are accepted.
    pub async fn upload_media(&self, data: &[u8], file_ext: &str) -> Result<UploadedMedia> {
        let ext = normalize_file_ext(file_ext);
        if !MediaType::is_accepted_upload(&ext) {
            return Err(Error::InvalidInput(format!(
                ".{} is not an accepted file type",
                ext
            )));
        }

        let media = self.media.upload(data, &ext).await?;
        info!(
            media_id = %media.media_id,
            size_bytes = data.len(),
            backend = self.media.backend_name(),
            "Media uploaded"
        );
        Ok(media)
    }

    /// Upload media for an existing meme and point the record at it.
    #[instrument(skip(self, data), fields(subsystem = subsystem::LIBRARY, component = component::LIBRARY, op = "attach_media", meme_id = id))]
    pub async fn attach_media(&self, id: MemeId, data: &[u8]) -> Result<MemeRecord> {
        let existing = self.get_meme(id).await?;
        let media = self.upload_media(data, &existing.file_ext).await?;
        let thumbnail = self
            .thumbnail_for(existing.media_type, &media.media_id)
            .await;

        let _guard = self.mutation.write().await;
        let previous = self.store.get_item(id).await?;
        let record = self.store.complete_upload(id, &media, thumbnail).await?;
        if let Err(e) = self.index_and_save(&record).await {
            self.restore_unsaved(previous).await;
            return Err(e);
        }
        Ok(record)
    }

    /// Upload media and commit a new meme pointing at it.
    pub async fn add_and_upload_meme(
        &self,
        data: &[u8],
        name: &str,
        file_ext: &str,
        tags: Vec<String>,
    ) -> Result<MemeRecord> {
        let media = self.upload_media(data, file_ext).await?;
        let new = NewMeme::new(name, file_ext)
            .with_tags(tags)
            .with_media(media);
        self.commit_new_meme(new).await
    }

    // =========================================================================
    // PERSISTENCE
    // =========================================================================

    /// Persist the store. Returns whether it succeeded; failures are logged.
    pub async fn save_library(&self) -> bool {
        match self.try_save_library().await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "Failed to save meme library");
                false
            }
        }
    }

    pub async fn try_save_library(&self) -> Result<()> {
        let _guard = self.mutation.write().await;
        self.store.write_db().await
    }

    /// Reload the store from its backend. Returns whether it succeeded;
    /// failures are logged. An existing index is rebuilt from the reloaded
    /// records; without one, search keeps failing until [`Library::index_library`].
    pub async fn load_library(&self) -> bool {
        match self.try_load_library().await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "Failed to load meme library");
                false
            }
        }
    }

    pub async fn try_load_library(&self) -> Result<()> {
        let _guard = self.mutation.write().await;
        self.store.load_db().await?;
        if self.index.has_index() {
            self.rebuild_index().await?;
        }
        Ok(())
    }

    // =========================================================================
    // THUMBNAILS
    // =========================================================================

    async fn make_thumbnail(&self, new: &NewMeme) -> Option<String> {
        if new.media_id.is_empty() {
            return None;
        }
        self.thumbnail_for(MediaType::from_ext(&new.file_ext), &new.media_id)
            .await
    }

    /// Best-effort thumbnail for stored media. `None` on any failure.
    async fn thumbnail_for(&self, media_type: MediaType, media_id: &str) -> Option<String> {
        let maker = self.thumbnails.clone()?;

        let source = match media_type {
            MediaType::Image => self.media.get_media(media_id).await,
            MediaType::Video => self.media.video_to_thumbnail(media_id).await,
            MediaType::Unknown => return None,
        };
        let bytes = match source {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(media_id = %media_id, error = %e, "Thumbnail source unavailable");
                return None;
            }
        };

        match tokio::task::spawn_blocking(move || maker.make_base64(&bytes)).await {
            Ok(Ok(thumbnail)) => Some(thumbnail),
            Ok(Err(e)) => {
                warn!(media_id = %media_id, error = %e, "Thumbnail generation failed");
                None
            }
            Err(e) => {
                warn!(media_id = %media_id, error = %e, "Thumbnail task failed");
                None
            }
        }
    }
}
