//! Query-keyed result cache.
//!
//! Sits between the TMDB client and the UI. Results are cached by the
//! literal query string and reused while fresh; at most one network call
//! per key is in flight at any time.

mod client;
mod state;

#[allow(clippy::module_name_repetitions)]
pub use client::{DEFAULT_GC_TIME, DEFAULT_STALE_TIME, QueryClient, QueryClientBuilder};
#[allow(clippy::module_name_repetitions)]
pub use state::{FetchError, QueryState};
