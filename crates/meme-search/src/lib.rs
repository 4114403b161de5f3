//! # meme-search
//!
//! In-memory full-text search over the meme library.
//!
//! This crate provides:
//! - An analyzer (word tokens, lowercase, stop words, English stemming)
//! - A BM25 inverted index over meme names and tags
//! - Media type filters applied to search results
//! - A lock-guarded [`SearchIndex`] shared by request handlers
//!
//! ## Example
//!
//! ```ignore
//! use meme_search::{MediaFilter, Page, SearchIndex};
//!
//! let index = SearchIndex::new();
//! index.build_from_records(&store.all_items().await?);
//!
//! let hits = index.search("dancing cat", Page::new(10, 1)?, MediaFilter::default())?;
//! ```

pub mod analyzer;
pub mod engine;
pub mod index;

// Re-export core types
pub use meme_core::*;

pub use analyzer::{Analyzer, STOP_WORDS};
pub use engine::SearchIndex;
pub use index::{IndexEntry, IndexHit, IndexStats, MediaFilter, MemeIndex};
