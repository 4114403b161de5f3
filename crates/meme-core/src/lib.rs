//! # meme-core
//!
//! Core types, traits, and abstractions for the reaction meme library.
//!
//! This crate provides the data model shared by the record store, the search
//! index and the HTTP layer, plus the collaborator traits the library
//! orchestrator depends on.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
