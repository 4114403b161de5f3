//! Structured logging conventions for the meme library.
//!
//! Events and spans use these field names where they apply:
//!
//! | Field          | Meaning                                         |
//! |----------------|-------------------------------------------------|
//! | `subsystem`    | originating subsystem, see [`subsystem`]        |
//! | `component`    | component within the subsystem, see [`component`] |
//! | `op`           | logical operation (`search`, `commit_edit`, ...) |
//! | `meme_id`      | meme record id                                  |
//! | `media_id`     | media storage id                                |
//! | `query`        | search query text                               |
//! | `duration_ms`  | wall-clock duration in milliseconds             |
//! | `result_count` | results returned by a search or browse          |
//! | `doc_count`    | records held by the index                       |
//! | `size_bytes`   | byte length of uploaded media                   |
//! | `error`        | error message when an operation fails           |
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), completed mutations |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration (search hits, postings) |

/// Values of the `subsystem` field.
pub mod subsystem {
    pub const LIBRARY: &str = "library";
    pub const SEARCH: &str = "search";
}

/// Values of the `component` field.
pub mod component {
    pub const LIBRARY: &str = "library";
    pub const SEARCH_INDEX: &str = "search_index";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_values_are_snake_case() {
        for value in [
            subsystem::LIBRARY,
            subsystem::SEARCH,
            component::LIBRARY,
            component::SEARCH_INDEX,
        ] {
            assert!(!value.is_empty());
            assert!(value
                .chars()
                .all(|c| c.is_ascii_lowercase() || c == '_'));
        }
    }
}
