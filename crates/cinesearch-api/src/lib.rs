//! API client library for cinesearch.
//!
//! Provides the TMDB movie search client and the query cache that sits
//! between it and the terminal UI.

/// Query-keyed result cache.
pub mod query;

/// TMDB API client.
pub mod tmdb;
