//! TMDB API client module.
//!
//! Handles HTTP requests to the TMDB API v3 `search/movie` endpoint.

mod api;
mod client;
mod types;

#[allow(clippy::module_name_repetitions)]
pub use api::{LocalTmdbApi, TmdbApi};
#[allow(clippy::module_name_repetitions)]
pub use client::{Credential, TmdbClient, TmdbClientBuilder};
pub use types::{Movie, SearchMovieParams, SearchResult, TmdbErrorResponse};
