//! Per-key query state exposed to callers.

use std::sync::Arc;

use crate::tmdb::SearchResult;

/// Failure of a search fetch.
///
/// Network errors, non-2xx responses and malformed bodies all collapse into
/// this one kind. Cloneable so every waiter on a shared fetch receives it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("fetch failed: {message}")]
pub struct FetchError {
    message: String,
}

impl FetchError {
    /// Returns the underlying error description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<anyhow::Error> for FetchError {
    fn from(err: anyhow::Error) -> Self {
        Self {
            message: format!("{err:#}"),
        }
    }
}

/// Snapshot of one cache key.
#[derive(Debug, Clone, Default)]
#[allow(clippy::module_name_repetitions)]
pub struct QueryState {
    /// Last successfully fetched result, if any.
    pub data: Option<Arc<SearchResult>>,
    /// Whether a fetch for this key is in flight.
    pub is_loading: bool,
    /// Error of the last completed fetch, cleared when a new fetch starts.
    pub error: Option<FetchError>,
}

impl QueryState {
    /// State of the empty query: resolved, empty, never loading.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            data: Some(Arc::new(SearchResult::empty())),
            is_loading: false,
            error: None,
        }
    }
}
