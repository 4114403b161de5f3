//! Shared, lock-guarded search index.

use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use meme_core::logging::{component, subsystem};
use meme_core::{Error, MemeId, MemeRecord, Page, Result};

use crate::index::{IndexHit, IndexStats, MediaFilter, MemeIndex};

/// Search index shared across request handlers.
///
/// Holds no index until [`SearchIndex::build_from_records`] runs. Every
/// operation takes the same lock: builds, upserts and searches run one at a
/// time, so a search never observes a half-applied upsert.
#[derive(Default)]
pub struct SearchIndex {
    inner: Mutex<Option<MemeIndex>>,
}

impl SearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<MemeIndex>> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            warn!(
                subsystem = subsystem::SEARCH,
                component = component::SEARCH_INDEX,
                "Search index lock was poisoned, recovering"
            );
            poisoned.into_inner()
        })
    }

    /// Discard any existing index and build a new one from `records`.
    #[instrument(skip(self, records), fields(
        subsystem = subsystem::SEARCH,
        component = component::SEARCH_INDEX,
        op = "build_from_records",
    ))]
    pub fn build_from_records(&self, records: &[MemeRecord]) -> IndexStats {
        let start = Instant::now();
        let index = MemeIndex::from_records(records);
        let stats = index.stats();
        *self.lock() = Some(index);

        info!(
            doc_count = stats.documents,
            name_terms = stats.name_terms,
            tag_terms = stats.tag_terms,
            duration_ms = start.elapsed().as_millis() as u64,
            "Search index built"
        );
        stats
    }

    /// Add or replace one record in the existing index.
    ///
    /// Fails with [`Error::IndexNotReady`] when no index has been built;
    /// the caller decides whether to build one instead.
    pub fn index_one(&self, record: &MemeRecord) -> Result<()> {
        let mut guard = self.lock();
        let index = guard.as_mut().ok_or(Error::IndexNotReady)?;
        index.upsert(record);
        debug!(meme_id = record.id, doc_count = index.len(), "Indexed meme");
        Ok(())
    }

    /// Drop one record from the existing index. Returns whether it was
    /// indexed; without an index there is nothing to drop.
    pub fn remove(&self, id: MemeId) -> bool {
        let mut guard = self.lock();
        let removed = guard.as_mut().map_or(false, |index| index.remove(id));
        debug!(meme_id = id, removed, "Removed meme from index");
        removed
    }

    /// One page of hits for `query`, best first.
    #[instrument(skip(self), fields(
        subsystem = subsystem::SEARCH,
        component = component::SEARCH_INDEX,
        op = "search",
        query = %query,
    ))]
    pub fn search(&self, query: &str, page: Page, filter: MediaFilter) -> Result<Vec<IndexHit>> {
        let start = Instant::now();
        let guard = self.lock();
        let index = guard.as_ref().ok_or(Error::IndexNotReady)?;
        let hits = index.search(query, page, filter);

        debug!(
            page = page.page,
            per_page = page.per_page,
            result_count = hits.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Search completed"
        );
        Ok(hits)
    }

    pub fn has_index(&self) -> bool {
        self.lock().is_some()
    }

    /// Statistics of the current index, if one exists.
    pub fn stats(&self) -> Option<IndexStats> {
        self.lock().as_ref().map(MemeIndex::stats)
    }
}
