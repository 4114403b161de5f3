//! JSON-document record store.
//!
//! Keeps the whole meme table in memory and persists it as one JSON document:
//!
//! ```json
//! { "nextID": 2, "items": { "0": { "id": 0, "name": "...", ... }, "1": { ... } } }
//! ```
//!
//! Ids are assigned from `nextID` and never reused. Items are kept ordered by
//! id, which is also insertion order.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use meme_core::{
    DocumentStorage, Error, MemeId, MemeRecord, MemeUpdate, NewMeme, Page, RecordStore, Result,
    UploadedMedia,
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Serialized layout of the record store document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(rename = "nextID", default)]
    next_id: MemeId,
    #[serde(default)]
    items: BTreeMap<MemeId, MemeRecord>,
}

impl StoreDocument {
    /// Repair a freshly loaded document so ids stay unique.
    fn normalize(&mut self) {
        for (key, item) in self.items.iter_mut() {
            if item.id != *key {
                warn!(key = *key, item_id = item.id, "json_store: item id does not match its key, using key");
                item.id = *key;
            }
        }
        if let Some((&max_id, _)) = self.items.last_key_value() {
            if self.next_id <= max_id {
                warn!(
                    next_id = self.next_id,
                    max_id, "json_store: nextID behind existing ids, advancing"
                );
                self.next_id = max_id + 1;
            }
        }
    }

    fn get_mut(&mut self, id: MemeId) -> Result<&mut MemeRecord> {
        self.items.get_mut(&id).ok_or(Error::MemeNotFound(id))
    }
}

/// Record store persisted as a single JSON document.
pub struct JsonRecordStore {
    storage: Arc<dyn DocumentStorage>,
    state: RwLock<Option<StoreDocument>>,
}

impl JsonRecordStore {
    pub fn new(storage: Arc<dyn DocumentStorage>) -> Self {
        Self {
            storage,
            state: RwLock::new(None),
        }
    }

    fn not_loaded() -> Error {
        Error::Storage("Record store has not been loaded".to_string())
    }
}

#[async_trait]
impl RecordStore for JsonRecordStore {
    async fn init_db(&self) -> Result<()> {
        *self.state.write().await = Some(StoreDocument::default());
        info!(location = %self.storage.location(), "json_store: initialized empty store");
        Ok(())
    }

    async fn load_db(&self) -> Result<()> {
        let document = match self.storage.read().await? {
            Some(data) => {
                let mut doc: StoreDocument = serde_json::from_slice(&data)?;
                doc.normalize();
                doc
            }
            None => {
                info!(location = %self.storage.location(), "json_store: no document found, starting empty");
                StoreDocument::default()
            }
        };

        info!(
            location = %self.storage.location(),
            items = document.items.len(),
            next_id = document.next_id,
            "json_store: loaded"
        );
        *self.state.write().await = Some(document);
        Ok(())
    }

    async fn write_db(&self) -> Result<()> {
        let data = {
            let state = self.state.read().await;
            let doc = state.as_ref().ok_or_else(Self::not_loaded)?;
            serde_json::to_vec_pretty(doc)?
        };
        self.storage.write(&data).await?;
        debug!(location = %self.storage.location(), size = data.len(), "json_store: written");
        Ok(())
    }

    async fn is_loaded(&self) -> bool {
        self.state.read().await.is_some()
    }

    async fn has_item(&self, id: MemeId) -> Result<bool> {
        let state = self.state.read().await;
        let doc = state.as_ref().ok_or_else(Self::not_loaded)?;
        Ok(doc.items.contains_key(&id))
    }

    async fn get_item(&self, id: MemeId) -> Result<MemeRecord> {
        let state = self.state.read().await;
        let doc = state.as_ref().ok_or_else(Self::not_loaded)?;
        doc.items.get(&id).cloned().ok_or(Error::MemeNotFound(id))
    }

    async fn add_item(&self, new: NewMeme, thumbnail: Option<String>) -> Result<MemeRecord> {
        let mut state = self.state.write().await;
        let doc = state.as_mut().ok_or_else(Self::not_loaded)?;

        let id = doc.next_id;
        let record = MemeRecord::from_new(id, new, thumbnail);
        doc.items.insert(id, record.clone());
        doc.next_id += 1;

        debug!(meme_id = id, "json_store: item added");
        Ok(record)
    }

    async fn update_item(&self, id: MemeId, update: &MemeUpdate) -> Result<MemeRecord> {
        let mut state = self.state.write().await;
        let doc = state.as_mut().ok_or_else(Self::not_loaded)?;
        let item = doc.get_mut(id)?;
        item.apply(update);
        Ok(item.clone())
    }

    async fn complete_upload(
        &self,
        id: MemeId,
        media: &UploadedMedia,
        thumbnail: Option<String>,
    ) -> Result<MemeRecord> {
        let mut state = self.state.write().await;
        let doc = state.as_mut().ok_or_else(Self::not_loaded)?;
        let item = doc.get_mut(id)?;
        item.media_id = media.media_id.clone();
        item.media_url = media.media_url.clone();
        if thumbnail.is_some() {
            item.thumbnail = thumbnail;
        }
        Ok(item.clone())
    }

    async fn remove_item(&self, id: MemeId) -> Result<MemeRecord> {
        let mut state = self.state.write().await;
        let doc = state.as_mut().ok_or_else(Self::not_loaded)?;
        let record = doc.items.remove(&id).ok_or(Error::MemeNotFound(id))?;
        debug!(meme_id = id, "json_store: item removed");
        Ok(record)
    }

    async fn replace_item(&self, record: MemeRecord) -> Result<()> {
        let mut state = self.state.write().await;
        let doc = state.as_mut().ok_or_else(Self::not_loaded)?;
        let item = doc.get_mut(record.id)?;
        *item = record;
        Ok(())
    }

    async fn page(&self, page: Page) -> Result<Vec<MemeRecord>> {
        let state = self.state.read().await;
        let doc = state.as_ref().ok_or_else(Self::not_loaded)?;
        let Some(range) = page.range(doc.items.len()) else {
            return Ok(Vec::new());
        };
        Ok(doc
            .items
            .values()
            .skip(range.start)
            .take(range.len())
            .cloned()
            .collect())
    }

    async fn all_items(&self) -> Result<Vec<MemeRecord>> {
        let state = self.state.read().await;
        let doc = state.as_ref().ok_or_else(Self::not_loaded)?;
        Ok(doc.items.values().cloned().collect())
    }

    async fn count(&self) -> Result<usize> {
        let state = self.state.read().await;
        let doc = state.as_ref().ok_or_else(Self::not_loaded)?;
        Ok(doc.items.len())
    }
}
