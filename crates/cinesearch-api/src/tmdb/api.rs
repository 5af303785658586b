//! `TmdbApi` trait definition.
#![allow(clippy::future_not_send)]

use anyhow::Result;

use super::types::{SearchMovieParams, SearchResult};

/// TMDB API trait.
///
/// Abstracts API operations for mock substitution in tests.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(TmdbApi: Send)]
pub trait LocalTmdbApi {
    /// Searches for movies by title.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails, the API answers with a
    /// non-2xx status, or the JSON body cannot be parsed.
    async fn search_movie(&self, params: &SearchMovieParams) -> Result<SearchResult>;
}
