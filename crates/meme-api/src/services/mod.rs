//! Service layer for business logic.

pub mod library;

pub use library::{Library, SearchOptions};
