//! `QueryClient` - cache of search results keyed by query string.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::instrument;

use super::state::{FetchError, QueryState};
use crate::tmdb::{SearchMovieParams, SearchResult, TmdbApi};

/// Default freshness window of a resolved result (5 minutes).
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(5 * 60);

/// Default time an unused entry is kept before it is dropped (5 minutes).
pub const DEFAULT_GC_TIME: Duration = Duration::from_secs(5 * 60);

/// Outcome shared by every waiter on one fetch.
type FetchResult = Result<Arc<SearchResult>, FetchError>;

/// A fetch in flight, joinable by any number of callers.
type InFlight = Shared<BoxFuture<'static, FetchResult>>;

/// Cache entry for one query string.
#[derive(Default)]
struct CacheEntry {
    /// Last successful result.
    data: Option<Arc<SearchResult>>,
    /// Completion time of the last successful fetch. `None` once invalidated.
    updated_at: Option<Instant>,
    /// Error of the last completed fetch.
    error: Option<FetchError>,
    /// Fetch currently running for this key.
    in_flight: Option<InFlight>,
    /// Last lookup or fetch completion for this key.
    last_used: Option<Instant>,
}

impl CacheEntry {
    /// Returns the cached result if it is still within the freshness window.
    fn fresh_data(&self, now: Instant, stale_time: Duration) -> Option<Arc<SearchResult>> {
        let updated_at = self.updated_at?;
        if now.saturating_duration_since(updated_at) < stale_time {
            self.data.clone()
        } else {
            None
        }
    }

    /// Whether the entry is idle and unused for at least `gc_time`.
    fn is_expired(&self, now: Instant, gc_time: Duration) -> bool {
        self.in_flight.is_none()
            && self
                .last_used
                .is_none_or(|used| now.saturating_duration_since(used) >= gc_time)
    }

    fn snapshot(&self) -> QueryState {
        QueryState {
            data: self.data.clone(),
            is_loading: self.in_flight.is_some(),
            error: self.error.clone(),
        }
    }
}

/// Result of looking a key up.
enum Lookup {
    /// Fresh cached value.
    Fresh(Arc<SearchResult>),
    /// A fetch is running (started now or earlier).
    Pending(InFlight),
}

/// State shared between the client and its fetch tasks.
struct Inner<A> {
    api: A,
    stale_time: Duration,
    gc_time: Duration,
    language: Option<String>,
    include_adult: bool,
    entries: Mutex<HashMap<String, CacheEntry>>,
    changes: watch::Sender<u64>,
}

impl<A> Inner<A> {
    /// Bumps the change counter so subscribers redraw.
    fn notify(&self) {
        self.changes.send_modify(|generation| {
            *generation = generation.wrapping_add(1);
        });
    }

    fn params_for(&self, query: &str) -> SearchMovieParams {
        let mut params = SearchMovieParams::new(query).include_adult(self.include_adult);
        if let Some(ref language) = self.language {
            params = params.language(language.clone());
        }
        params
    }
}

impl<A: TmdbApi + Sync + 'static> Inner<A> {
    /// Runs one network call and writes the outcome back into the cache.
    #[instrument(skip_all, fields(query = %query))]
    async fn run_fetch(self: Arc<Self>, query: String) -> FetchResult {
        let params = self.params_for(&query);
        let result = self
            .api
            .search_movie(&params)
            .await
            .map(Arc::new)
            .map_err(FetchError::from);

        {
            let mut entries = self.entries.lock();
            let entry = entries.entry(query).or_default();
            entry.in_flight = None;
            entry.last_used = Some(Instant::now());
            match result {
                Ok(ref data) => {
                    tracing::debug!(results = data.len(), "fetch completed");
                    entry.data = Some(Arc::clone(data));
                    entry.updated_at = Some(Instant::now());
                    entry.error = None;
                }
                Err(ref err) => {
                    tracing::warn!(error = %err, "fetch failed");
                    entry.error = Some(err.clone());
                }
            }
        }

        self.notify();
        result
    }
}

/// Search result cache keyed by the literal query string.
///
/// - Empty queries resolve to an empty result with no network access.
/// - A result stays fresh for `stale_time` after it completed.
/// - At most one fetch per key is in flight; later callers join it.
/// - Fetches are never cancelled. A response for a query the UI has moved
///   away from is still cached under its own key.
#[allow(clippy::module_name_repetitions)]
pub struct QueryClient<A> {
    inner: Arc<Inner<A>>,
}

impl<A> Clone for QueryClient<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A> std::fmt::Debug for QueryClient<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryClient")
            .field("stale_time", &self.inner.stale_time)
            .field("keys", &self.inner.entries.lock().len())
            .finish_non_exhaustive()
    }
}

/// Builder for `QueryClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct QueryClientBuilder<A> {
    api: A,
    stale_time: Duration,
    gc_time: Duration,
    language: Option<String>,
    include_adult: bool,
}

impl<A> QueryClientBuilder<A> {
    /// Sets the freshness window (default: 5 minutes).
    #[must_use]
    pub const fn stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    /// Sets how long an unused entry is kept (default: 5 minutes).
    ///
    /// Expired entries are dropped on the next lookup of another key.
    /// Entries with a fetch in flight are never dropped.
    #[must_use]
    pub const fn gc_time(mut self, gc_time: Duration) -> Self {
        self.gc_time = gc_time;
        self
    }

    /// Sets the response language passed with every search.
    #[must_use]
    pub fn language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }

    /// Sets the adult content flag passed with every search.
    #[must_use]
    pub const fn include_adult(mut self, include: bool) -> Self {
        self.include_adult = include;
        self
    }

    /// Builds the client.
    #[must_use]
    pub fn build(self) -> QueryClient<A> {
        let (changes, _) = watch::channel(0);
        QueryClient {
            inner: Arc::new(Inner {
                api: self.api,
                stale_time: self.stale_time,
                gc_time: self.gc_time,
                language: self.language,
                include_adult: self.include_adult,
                entries: Mutex::new(HashMap::new()),
                changes,
            }),
        }
    }
}

impl<A> QueryClient<A> {
    /// Creates a builder wrapping `api`.
    pub const fn builder(api: A) -> QueryClientBuilder<A> {
        QueryClientBuilder {
            api,
            stale_time: DEFAULT_STALE_TIME,
            gc_time: DEFAULT_GC_TIME,
            language: None,
            include_adult: false,
        }
    }

    /// Creates a client with default settings.
    pub fn new(api: A) -> Self {
        Self::builder(api).build()
    }

    /// Returns the wrapped API.
    #[cfg(test)]
    fn api(&self) -> &A {
        &self.inner.api
    }

    /// Number of cached keys.
    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.entries.lock().len()
    }

    /// Returns the freshness window.
    #[must_use]
    pub fn stale_time(&self) -> Duration {
        self.inner.stale_time
    }

    /// Returns the current state of `query` without triggering a fetch.
    #[must_use]
    pub fn snapshot(&self, query: &str) -> QueryState {
        if query.is_empty() {
            return QueryState::empty();
        }
        self.inner
            .entries
            .lock()
            .get(query)
            .map_or_else(QueryState::default, CacheEntry::snapshot)
    }

    /// Marks `query` stale so the next request refetches it.
    ///
    /// Cached data stays visible until the refetch completes.
    pub fn invalidate(&self, query: &str) {
        if let Some(entry) = self.inner.entries.lock().get_mut(query) {
            entry.updated_at = None;
        }
        tracing::debug!(query, "query invalidated");
    }

    /// Subscribes to cache changes. The value is a generation counter.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.changes.subscribe()
    }
}

impl<A: TmdbApi + Sync + 'static> QueryClient<A> {
    /// Resolves `query` to a search result.
    ///
    /// Returns the cached value while fresh, joins a fetch already in flight,
    /// or starts a new one. Must be called within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` if the network call fails.
    pub async fn fetch(&self, query: &str) -> Result<Arc<SearchResult>, FetchError> {
        if query.is_empty() {
            return Ok(Arc::new(SearchResult::empty()));
        }
        match self.lookup(query) {
            Lookup::Fresh(data) => Ok(data),
            Lookup::Pending(in_flight) => in_flight.await,
        }
    }

    /// Starts a fetch for `query` if needed and returns immediately.
    ///
    /// Progress is observable through `snapshot` and `subscribe`.
    /// Must be called within a tokio runtime.
    pub fn request(&self, query: &str) {
        if query.is_empty() {
            return;
        }
        // The fetch runs on its own task; the handle is not needed here.
        drop(self.lookup(query));
    }

    /// Finds a fresh value or an in-flight fetch, starting one if neither exists.
    fn lookup(&self, query: &str) -> Lookup {
        let now = Instant::now();
        let mut entries = self.inner.entries.lock();

        let before = entries.len();
        entries.retain(|key, entry| key == query || !entry.is_expired(now, self.inner.gc_time));
        let dropped = before.saturating_sub(entries.len());
        if dropped > 0 {
            tracing::debug!(dropped, "dropped unused cache entries");
        }

        let entry = entries.entry(query.to_owned()).or_default();
        entry.last_used = Some(now);

        if let Some(data) = entry.fresh_data(now, self.inner.stale_time) {
            tracing::debug!(query, "cache hit");
            return Lookup::Fresh(data);
        }
        if let Some(ref in_flight) = entry.in_flight {
            tracing::debug!(query, "joining in-flight fetch");
            return Lookup::Pending(in_flight.clone());
        }

        tracing::debug!(query, "starting fetch");
        let in_flight = Arc::clone(&self.inner)
            .run_fetch(query.to_owned())
            .boxed()
            .shared();
        entry.in_flight = Some(in_flight.clone());
        entry.error = None;
        drop(entries);

        // Driven on its own task so it completes even if every caller goes away.
        tokio::spawn(in_flight.clone());
        self.inner.notify();
        Lookup::Pending(in_flight)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use tokio::sync::Semaphore;
    use tracing::subscriber::with_default;
    use tracing_mock::{expect, subscriber};

    use super::*;
    use crate::tmdb::Movie;

    /// Counts calls and answers with one movie named after the query.
    #[derive(Default)]
    struct MockApi {
        calls: AtomicUsize,
        fail: AtomicBool,
        gate: Option<Arc<Semaphore>>,
        last_params: Mutex<Option<SearchMovieParams>>,
    }

    impl MockApi {
        fn gated(gate: &Arc<Semaphore>) -> Self {
            Self {
                gate: Some(Arc::clone(gate)),
                ..Self::default()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl TmdbApi for MockApi {
        async fn search_movie(&self, params: &SearchMovieParams) -> anyhow::Result<SearchResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_params.lock() = Some(params.clone());
            if let Some(ref gate) = self.gate {
                gate.acquire().await?.forget();
            }
            if self.fail.load(Ordering::SeqCst) {
                anyhow::bail!("connection refused");
            }
            Ok(SearchResult {
                page: 1,
                results: vec![Arc::new(Movie {
                    id: 603,
                    title: params.query.clone(),
                    poster_path: String::new(),
                    release_date: String::from("1999-03-30"),
                    overview: String::new(),
                    vote_average: 8.2,
                })],
                total_pages: 1,
                total_results: 1,
            })
        }
    }

    #[tokio::test]
    async fn test_empty_query_makes_no_network_call() {
        // Arrange
        let client = QueryClient::new(MockApi::default());

        // Act
        let result = client.fetch("").await.unwrap();
        client.request("");

        // Assert
        assert!(result.is_empty());
        assert_eq!(client.api().calls(), 0);
        assert!(client.snapshot("").data.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_query_after_other_queries() {
        // Arrange
        let client = QueryClient::new(MockApi::default());
        client.fetch("matrix").await.unwrap();

        // Act
        let result = client.fetch("").await.unwrap();

        // Assert
        assert!(result.is_empty());
        assert_eq!(client.api().calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_result_is_reused() {
        // Arrange
        let client = QueryClient::new(MockApi::default());

        // Act
        let first = client.fetch("matrix").await.unwrap();
        tokio::time::advance(Duration::from_secs(299)).await;
        let second = client.fetch("matrix").await.unwrap();

        // Assert
        assert_eq!(client.api().calls(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_result_is_refetched() {
        // Arrange
        let client = QueryClient::new(MockApi::default());
        client.fetch("matrix").await.unwrap();

        // Act
        tokio::time::advance(DEFAULT_STALE_TIME).await;
        client.fetch("matrix").await.unwrap();

        // Assert
        assert_eq!(client.api().calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_stale_time() {
        // Arrange
        let client = QueryClient::builder(MockApi::default())
            .stale_time(Duration::from_secs(10))
            .build();
        client.fetch("matrix").await.unwrap();

        // Act
        tokio::time::advance(Duration::from_secs(11)).await;
        client.fetch("matrix").await.unwrap();

        // Assert
        assert_eq!(client.stale_time(), Duration::from_secs(10));
        assert_eq!(client.api().calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unused_keys_are_dropped_after_gc_time() {
        // Arrange
        let client = QueryClient::new(MockApi::default());
        for query in ["m", "ma", "mat", "matr", "matri", "matrix"] {
            client.fetch(query).await.unwrap();
        }

        // Act
        tokio::time::advance(Duration::from_secs(60 * 60)).await;
        client.fetch("alien").await.unwrap();

        // Assert
        assert_eq!(client.len(), 1);
        assert!(client.snapshot("matrix").data.is_none());
        assert!(client.snapshot("alien").data.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_recent_keys_survive_gc() {
        // Arrange
        let client = QueryClient::builder(MockApi::default())
            .gc_time(Duration::from_secs(60))
            .build();
        client.fetch("old").await.unwrap();
        tokio::time::advance(Duration::from_secs(45)).await;
        client.fetch("recent").await.unwrap();

        // Act
        tokio::time::advance(Duration::from_secs(30)).await;
        client.fetch("new").await.unwrap();

        // Assert: "old" idle 75s is dropped, "recent" idle 30s is kept
        assert_eq!(client.len(), 2);
        assert!(client.snapshot("old").data.is_none());
        assert!(client.snapshot("recent").data.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_key_is_never_dropped() {
        // Arrange
        let gate = Arc::new(Semaphore::new(0));
        let client = QueryClient::builder(MockApi::gated(&gate))
            .gc_time(Duration::from_secs(1))
            .build();
        client.request("slow");
        tokio::task::yield_now().await;

        // Act
        tokio::time::advance(Duration::from_secs(10)).await;
        client.request("other");

        // Assert
        assert_eq!(client.len(), 2);
        assert!(client.snapshot("slow").is_loading);
        gate.add_permits(2);
    }

    #[tokio::test]
    async fn test_keys_are_cached_separately() {
        // Arrange
        let client = QueryClient::new(MockApi::default());

        // Act
        let a = client.fetch("matrix").await.unwrap();
        let b = client.fetch("Matrix").await.unwrap();

        // Assert
        assert_eq!(client.api().calls(), 2);
        assert_eq!(a.results[0].title, "matrix");
        assert_eq!(b.results[0].title, "Matrix");
    }

    #[tokio::test]
    async fn test_concurrent_fetches_share_one_call() {
        // Arrange
        let gate = Arc::new(Semaphore::new(0));
        let client = QueryClient::new(MockApi::gated(&gate));

        // Act
        let (a, b, ()) = tokio::join!(client.fetch("matrix"), client.fetch("matrix"), async {
            tokio::task::yield_now().await;
            gate.add_permits(1);
        });

        // Assert
        assert_eq!(client.api().calls(), 1);
        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
    }

    #[tokio::test]
    async fn test_snapshot_while_loading() {
        // Arrange
        let gate = Arc::new(Semaphore::new(0));
        let client = QueryClient::new(MockApi::gated(&gate));

        // Act
        client.request("matrix");
        tokio::task::yield_now().await;
        let loading = client.snapshot("matrix");
        gate.add_permits(1);
        client.fetch("matrix").await.unwrap();
        let done = client.snapshot("matrix");

        // Assert
        assert!(loading.is_loading);
        assert!(loading.data.is_none());
        assert!(loading.error.is_none());
        assert!(!done.is_loading);
        assert_eq!(done.data.unwrap().len(), 1);
        assert_eq!(client.api().calls(), 1);
    }

    #[tokio::test]
    async fn test_request_for_loading_key_is_not_duplicated() {
        // Arrange
        let gate = Arc::new(Semaphore::new(0));
        let client = QueryClient::new(MockApi::gated(&gate));

        // Act
        client.request("matrix");
        client.request("matrix");
        client.request("matrix");
        gate.add_permits(1);
        client.fetch("matrix").await.unwrap();

        // Assert
        assert_eq!(client.api().calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_sets_error() {
        // Arrange
        let client = QueryClient::new(MockApi::default());
        client.api().fail.store(true, Ordering::SeqCst);

        // Act
        let result = client.fetch("xyz").await;
        let state = client.snapshot("xyz");

        // Assert
        let err = result.unwrap_err();
        assert!(err.message().contains("connection refused"));
        assert_eq!(state.error, Some(err));
        assert!(state.data.is_none());
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn test_failed_refetch_keeps_last_known_data() {
        // Arrange
        let client = QueryClient::new(MockApi::default());
        client.fetch("matrix").await.unwrap();
        client.invalidate("matrix");
        client.api().fail.store(true, Ordering::SeqCst);

        // Act
        let result = client.fetch("matrix").await;
        let state = client.snapshot("matrix");

        // Assert
        assert!(result.is_err());
        assert!(state.error.is_some());
        assert_eq!(state.data.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_key_is_refetched_on_next_request() {
        // Arrange
        let client = QueryClient::new(MockApi::default());
        client.api().fail.store(true, Ordering::SeqCst);
        client.fetch("xyz").await.unwrap_err();
        client.api().fail.store(false, Ordering::SeqCst);

        // Act
        let result = client.fetch("xyz").await;
        let state = client.snapshot("xyz");

        // Assert
        assert!(result.is_ok());
        assert!(state.error.is_none());
        assert_eq!(client.api().calls(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        // Arrange
        let client = QueryClient::new(MockApi::default());
        client.fetch("matrix").await.unwrap();

        // Act
        client.invalidate("matrix");
        let state = client.snapshot("matrix");
        client.fetch("matrix").await.unwrap();

        // Assert
        assert!(state.data.is_some());
        assert_eq!(client.api().calls(), 2);
    }

    #[tokio::test]
    async fn test_abandoned_query_is_still_cached() {
        // Arrange
        let gate = Arc::new(Semaphore::new(0));
        let client = QueryClient::new(MockApi::gated(&gate));

        // Act: the user types past "mat" before its response arrives
        client.request("mat");
        client.request("matrix");
        gate.add_permits(2);
        client.fetch("matrix").await.unwrap();
        client.fetch("mat").await.unwrap();

        // Assert
        assert_eq!(client.snapshot("mat").data.unwrap().results[0].title, "mat");
        assert_eq!(client.api().calls(), 2);
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        // Arrange
        let client = QueryClient::new(MockApi::default());
        let mut changes = client.subscribe();
        changes.borrow_and_update();

        // Act
        client.fetch("matrix").await.unwrap();

        // Assert
        assert!(changes.has_changed().unwrap());
        assert!(*changes.borrow_and_update() >= 2);
    }

    #[tokio::test]
    async fn test_search_params_are_forwarded() {
        // Arrange
        let client = QueryClient::builder(MockApi::default())
            .language(Some(String::from("ar-SA")))
            .include_adult(true)
            .build();

        // Act
        client.fetch("matrix").await.unwrap();

        // Assert
        let params = client.api().last_params.lock().clone().unwrap();
        assert_eq!(params.query, "matrix");
        assert_eq!(params.language.as_deref(), Some("ar-SA"));
        assert!(params.include_adult);
    }

    #[test]
    fn test_snapshot_of_unknown_key() {
        // Arrange
        let client = QueryClient::new(MockApi::default());

        // Act
        let state = client.snapshot("never requested");

        // Assert
        assert!(state.data.is_none());
        assert!(!state.is_loading);
        assert!(state.error.is_none());
    }

    #[test]
    fn test_invalidate_logs_debug_event() {
        // Arrange
        let client = QueryClient::new(MockApi::default());
        let (subscriber, handle) = subscriber::mock()
            .event(expect::event().at_level(tracing::Level::DEBUG))
            .run_with_handle();

        // Act
        with_default(subscriber, || client.invalidate("matrix"));

        // Assert
        handle.assert_finished();
    }
}
