//! Inverted index over meme names and tags.
//!
//! [`MemeIndex`] is the unsynchronized structure; callers share it through
//! [`crate::SearchIndex`], which serializes every operation.
//!
//! Queries use OR semantics: a meme matches when any query term appears in
//! its name or in its tags. Each (term, field) match contributes a BM25
//! score scaled by the field weight.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;
use tracing::trace;

use meme_core::defaults::{BM25_B, BM25_K1, NAME_FIELD_WEIGHT, TAGS_FIELD_WEIGHT};
use meme_core::{MediaType, MemeId, MemeRecord, Page};

use crate::analyzer::Analyzer;

/// Denormalized copy of a record held by the index, enough to materialize
/// a hit without a store round-trip.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub id: MemeId,
    pub name: String,
    /// Tags joined with commas.
    pub tags: String,
    pub media_type_code: u8,
    pub url: String,
}

impl IndexEntry {
    pub fn from_record(record: &MemeRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            tags: record.joined_tags(),
            media_type_code: record.media_type.code(),
            url: record.media_url.clone(),
        }
    }

    pub fn media_type(&self) -> MediaType {
        MediaType::from_code(self.media_type_code).unwrap_or_default()
    }
}

/// A matching meme, ranked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexHit {
    pub meme_id: MemeId,
    pub name: String,
    pub media_type: MediaType,
    pub media_url: String,
    pub score: f32,
}

/// Media type restrictions applied to search results.
///
/// Both may be set; the index applies both and leaves it to callers to keep
/// them consistent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MediaFilter {
    /// Keep only this media type.
    pub only: Option<MediaType>,
    /// Drop this media type.
    pub exclude: Option<MediaType>,
}

impl MediaFilter {
    pub fn only(media_type: MediaType) -> Self {
        Self {
            only: Some(media_type),
            exclude: None,
        }
    }

    pub fn exclude(media_type: MediaType) -> Self {
        Self {
            only: None,
            exclude: Some(media_type),
        }
    }

    fn allows(&self, code: u8) -> bool {
        self.only.map_or(true, |t| t.code() == code)
            && self.exclude.map_or(true, |t| t.code() != code)
    }
}

/// Postings and length statistics for one field.
#[derive(Debug, Default)]
struct FieldIndex {
    /// term -> (meme id -> term frequency)
    postings: HashMap<String, HashMap<MemeId, u32>>,
    /// meme id -> number of terms in the field
    lengths: HashMap<MemeId, u32>,
    total_len: u64,
}

impl FieldIndex {
    fn insert(&mut self, id: MemeId, terms: &[String]) {
        for term in terms {
            *self
                .postings
                .entry(term.clone())
                .or_default()
                .entry(id)
                .or_insert(0) += 1;
        }
        self.lengths.insert(id, terms.len() as u32);
        self.total_len += terms.len() as u64;
    }

    fn remove(&mut self, id: MemeId, terms: &[String]) {
        for term in terms {
            if let Some(docs) = self.postings.get_mut(term) {
                docs.remove(&id);
                if docs.is_empty() {
                    self.postings.remove(term);
                }
            }
        }
        if let Some(len) = self.lengths.remove(&id) {
            self.total_len -= u64::from(len);
        }
    }

    fn avg_len(&self) -> f32 {
        if self.lengths.is_empty() {
            0.0
        } else {
            self.total_len as f32 / self.lengths.len() as f32
        }
    }

    /// Add this field's BM25 contribution for `term` to `scores`.
    fn score_term(&self, term: &str, doc_count: usize, weight: f32, scores: &mut HashMap<MemeId, f32>) {
        let Some(docs) = self.postings.get(term) else {
            return;
        };
        let df = docs.len() as f32;
        let n = doc_count as f32;
        let idf = (1.0 + (n - df + 0.5) / (df + 0.5)).ln();
        let avg_len = self.avg_len().max(1.0);

        for (&id, &tf) in docs {
            let tf = tf as f32;
            let len = self.lengths.get(&id).copied().unwrap_or(0) as f32;
            let norm = 1.0 - BM25_B + BM25_B * len / avg_len;
            let score = weight * idf * (tf * (BM25_K1 + 1.0)) / (tf + BM25_K1 * norm);
            *scores.entry(id).or_insert(0.0) += score;
        }
    }
}

/// Index statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub documents: usize,
    pub name_terms: usize,
    pub tag_terms: usize,
}

/// In-memory full-text index over meme name, tags and media type.
#[derive(Default)]
pub struct MemeIndex {
    analyzer: Analyzer,
    entries: BTreeMap<MemeId, IndexEntry>,
    name: FieldIndex,
    tags: FieldIndex,
}

impl MemeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fresh index from a full record list.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a MemeRecord>,
    {
        let mut index = Self::new();
        for record in records {
            index.upsert(record);
        }
        index
    }

    /// Add a record, replacing its previous entry if present.
    pub fn upsert(&mut self, record: &MemeRecord) {
        self.remove(record.id);

        let entry = IndexEntry::from_record(record);
        let name_terms = self.analyzer.analyze(&entry.name);
        let tag_terms = self.analyzer.analyze_keywords(&entry.tags);
        self.name.insert(entry.id, &name_terms);
        self.tags.insert(entry.id, &tag_terms);
        self.entries.insert(entry.id, entry);
    }

    /// Drop a record's entry. Returns whether it was present.
    pub fn remove(&mut self, id: MemeId) -> bool {
        let Some(old) = self.entries.remove(&id) else {
            return false;
        };
        let name_terms = self.analyzer.analyze(&old.name);
        let tag_terms = self.analyzer.analyze_keywords(&old.tags);
        self.name.remove(id, &name_terms);
        self.tags.remove(id, &tag_terms);
        true
    }

    pub fn contains(&self, id: MemeId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn entry(&self, id: MemeId) -> Option<&IndexEntry> {
        self.entries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            documents: self.entries.len(),
            name_terms: self.name.postings.len(),
            tag_terms: self.tags.postings.len(),
        }
    }

    /// Every hit for `query` passing `filter`, best first.
    ///
    /// Ties are broken by ascending meme id so the ranking is a total order
    /// and pages never overlap or skip.
    pub fn ranked(&self, query: &str, filter: MediaFilter) -> Vec<IndexHit> {
        let mut seen = HashSet::new();
        let terms: Vec<String> = self
            .analyzer
            .analyze(query)
            .into_iter()
            .filter(|t| seen.insert(t.clone()))
            .collect();
        if terms.is_empty() {
            return Vec::new();
        }

        let doc_count = self.entries.len();
        let mut scores: HashMap<MemeId, f32> = HashMap::new();
        for term in &terms {
            self.name
                .score_term(term, doc_count, NAME_FIELD_WEIGHT, &mut scores);
            self.tags
                .score_term(term, doc_count, TAGS_FIELD_WEIGHT, &mut scores);
        }

        let mut hits: Vec<IndexHit> = scores
            .into_iter()
            .filter_map(|(id, score)| {
                let entry = self.entries.get(&id)?;
                if !filter.allows(entry.media_type_code) {
                    return None;
                }
                trace!(meme_id = id, score, "search: candidate");
                Some(IndexHit {
                    meme_id: id,
                    name: entry.name.clone(),
                    media_type: entry.media_type(),
                    media_url: entry.url.clone(),
                    score,
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.meme_id.cmp(&b.meme_id))
        });
        hits
    }

    /// One page of ranked hits. Pages past the end are empty.
    pub fn search(&self, query: &str, page: Page, filter: MediaFilter) -> Vec<IndexHit> {
        let hits = self.ranked(query, filter);
        match page.range(hits.len()) {
            Some(range) => hits[range].to_vec(),
            None => Vec::new(),
        }
    }
}
