//! # meme-api
//!
//! HTTP API for the reaction meme library.
//!
//! The binary wires the configured record store and media backends into a
//! [`services::Library`] and serves it through [`routes::router`].

pub mod config;
pub mod error;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
pub mod telemetry;

pub use config::{ConfigError, MediaBackend, RecordStoreBackend, ServerConfig};
pub use error::ApiError;
pub use routes::router;
pub use services::{Library, SearchOptions};
pub use state::AppState;
