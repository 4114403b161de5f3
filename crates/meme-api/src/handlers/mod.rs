//! HTTP handlers, grouped by resource.

pub mod media;
pub mod memes;
pub mod system;
