//! Shared handler state.

use std::sync::Arc;

use crate::services::Library;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub library: Arc<Library>,
}

impl AppState {
    pub fn new(library: Arc<Library>) -> Self {
        Self { library }
    }
}
