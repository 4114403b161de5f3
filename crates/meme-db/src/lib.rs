//! # meme-db
//!
//! Persistence and media collaborators for the reaction meme library.
//!
//! This crate provides:
//! - [`JsonRecordStore`]: the record store, persisted as one JSON document
//! - Document backends for that JSON ([`LocalJsonFile`], [`RemoteJsonDocument`])
//! - Media backends ([`LocalMediaStorage`], [`RemoteMediaStorage`])
//! - [`ImageThumbnailer`]: base64 JPEG thumbnails
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use meme_db::{JsonRecordStore, LocalJsonFile};
//!
//! let store = JsonRecordStore::new(Arc::new(LocalJsonFile::new("data/db.json")));
//! store.load_db().await?;
//! let meme = store.add_item(NewMeme::new("doge meme", "jpg"), None).await?;
//! store.write_db().await?;
//! ```

pub mod document;
pub mod json_store;
pub mod media_storage;
pub mod thumbnail;

// Re-export core types
pub use meme_core::*;

pub use document::{LocalJsonFile, RemoteJsonDocument};
pub use json_store::JsonRecordStore;
pub use media_storage::{LocalMediaStorage, RemoteMediaStorage};
pub use thumbnail::ImageThumbnailer;
