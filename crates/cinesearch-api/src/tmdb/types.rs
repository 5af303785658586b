//! TMDB API response types and search parameters.

use std::sync::Arc;

use serde::{Deserialize, Deserializer};

// --- Search Movie ---

/// Response from `search/movie` endpoint.
///
/// Only the first page is ever requested; the paging fields are kept for
/// logging.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct SearchResult {
    /// Current page number.
    #[serde(default)]
    pub page: u32,
    /// Search results in API response order.
    pub results: Vec<Arc<Movie>>,
    /// Total number of pages.
    #[serde(default)]
    pub total_pages: u32,
    /// Total number of results.
    #[serde(default)]
    pub total_results: u32,
}

impl SearchResult {
    /// Returns an empty result (used for the empty query).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of movies in this result.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether the result holds no movies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// A single movie search result.
///
/// Nullable string fields are read as empty strings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Movie {
    /// TMDB movie ID.
    pub id: u64,
    /// Localized title.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    /// Poster image path (e.g. `/abc.jpg`), empty when absent.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub poster_path: String,
    /// Release date (`YYYY-MM-DD`), empty when unknown.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub release_date: String,
    /// Overview text, empty when unavailable.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub overview: String,
    /// Vote average (0-10).
    #[serde(default)]
    pub vote_average: f64,
}

/// Reads `null` as an empty string.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// --- Error Response ---

/// TMDB API error response body.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbErrorResponse {
    /// TMDB error code.
    pub status_code: u32,
    /// Error message.
    pub status_message: String,
    /// Success flag (always false for errors).
    #[serde(default)]
    pub success: bool,
}

// --- Search Parameters ---

/// Parameters for `search/movie` endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMovieParams {
    /// Search query (required).
    pub query: String,
    /// Response language; the API default is used when unset.
    pub language: Option<String>,
    /// Include adult content.
    pub include_adult: bool,
}

impl SearchMovieParams {
    /// Creates new search params with the given query.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            language: None,
            include_adult: false,
        }
    }

    /// Sets the response language.
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Sets the adult content flag.
    #[must_use]
    pub const fn include_adult(mut self, include: bool) -> Self {
        self.include_adult = include;
        self
    }
}
