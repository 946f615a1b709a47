//! Async query abstraction for data fetching with caching support.
//!
//! Provides a `Query<T>` type that encapsulates async data fetching,
//! loading/error states, bounded retries with exponential backoff, and
//! stale-while-revalidate refreshing, all driven by the event-loop
//! tick.
//!
//! # Example
//!
//! ```ignore
//! let client = cached_client.clone();
//! let mut query = Query::new(move || {
//!     let client = client.clone();
//!     async move { client.fetch_users().await }
//! });
//!
//! // Start fetching
//! query.fetch();
//!
//! // In event loop tick
//! if query.poll() {
//!     // State changed, trigger re-render
//! }
//! query.revalidate_if_stale();
//!
//! // In render
//! match query.state() {
//!     QueryState::Loading => render_spinner(),
//!     QueryState::Success(data) => render_data(data),
//!     QueryState::Error(e) => render_error(e),
//!     QueryState::Idle => {}
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// The state of a query
#[derive(Debug, Clone)]
pub enum QueryState<T> {
  /// Query has not been started
  Idle,
  /// Query is fetching and has no previous data to show
  Loading,
  /// Query completed successfully
  Success(T),
  /// Query failed with an error
  Error(String),
}

impl<T> QueryState<T> {
  pub fn is_loading(&self) -> bool {
    matches!(self, QueryState::Loading)
  }

  pub fn is_success(&self) -> bool {
    matches!(self, QueryState::Success(_))
  }

  pub fn is_error(&self) -> bool {
    matches!(self, QueryState::Error(_))
  }

  pub fn data(&self) -> Option<&T> {
    match self {
      QueryState::Success(data) => Some(data),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&str> {
    match self {
      QueryState::Error(e) => Some(e),
      _ => None,
    }
  }
}

/// Retry schedule for failed fetches: up to `attempts` retries with
/// exponentially increasing delay, capped at `max_delay`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
  pub attempts: u32,
  pub base_delay: Duration,
  pub max_delay: Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      attempts: 2,
      base_delay: Duration::from_secs(1),
      max_delay: Duration::from_secs(30),
    }
  }
}

impl RetryPolicy {
  /// No retries; failures surface immediately.
  #[allow(dead_code)]
  pub fn none() -> Self {
    Self {
      attempts: 0,
      ..Self::default()
    }
  }

  /// Delay before retry number `attempt` (0-based): min(base * 2^attempt, max)
  pub fn delay(&self, attempt: u32) -> Duration {
    let exp = self
      .base_delay
      .saturating_mul(2u32.saturating_pow(attempt));
    exp.min(self.max_delay)
  }
}

/// A boxed future that returns a Result<T, String>
type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<T, String>> + Send>>;

/// A factory function that creates futures for fetching data
type FetcherFn<T> = dyn Fn() -> BoxFuture<T> + Send + Sync;

/// Async query for data fetching with state management.
///
/// Query<T> encapsulates:
/// - The fetching logic (via a closure)
/// - Loading/success/error states
/// - Async result handling via channels
/// - Stale time tracking and background revalidation
/// - Bounded retry with exponential backoff
pub struct Query<T> {
  state: QueryState<T>,
  fetcher: Arc<FetcherFn<T>>,
  receiver: Option<mpsc::UnboundedReceiver<Result<T, String>>>,
  fetched_at: Option<Instant>,
  stale_time: Duration,
  retry: RetryPolicy,
  /// Message from the most recent failed background refresh
  last_error: Option<String>,
}

impl<T: Send + 'static> Query<T> {
  /// Create a new query with the given fetcher function.
  ///
  /// The fetcher is a closure that returns a future. It is called for
  /// each fetch attempt, including retries.
  pub fn new<F, Fut>(fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    Self {
      state: QueryState::Idle,
      fetcher: Arc::new(move || Box::pin(fetcher())),
      receiver: None,
      fetched_at: None,
      stale_time: Duration::from_secs(300),
      retry: RetryPolicy::default(),
      last_error: None,
    }
  }

  /// Set the stale time for this query.
  pub fn with_stale_time(mut self, duration: Duration) -> Self {
    self.stale_time = duration;
    self
  }

  /// Set the retry policy for this query.
  pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
    self.retry = retry;
    self
  }

  /// Get the current state of the query.
  pub fn state(&self) -> &QueryState<T> {
    &self.state
  }

  /// Get the data if the query succeeded.
  pub fn data(&self) -> Option<&T> {
    self.state.data()
  }

  /// Check if the query is loading with nothing to show yet.
  pub fn is_loading(&self) -> bool {
    self.state.is_loading()
  }

  /// Check if the query failed.
  pub fn is_error(&self) -> bool {
    self.state.is_error()
  }

  /// Get the error message if the query failed.
  pub fn error(&self) -> Option<&str> {
    self.state.error()
  }

  /// Check if any fetch (initial or background) is in flight.
  pub fn is_fetching(&self) -> bool {
    self.receiver.is_some()
  }

  /// Message from the most recent failed background refresh, if any.
  pub fn last_error(&self) -> Option<&str> {
    self.last_error.as_deref()
  }

  /// Check if the data is stale (older than stale_time).
  pub fn is_stale(&self) -> bool {
    match &self.state {
      QueryState::Success(_) => self
        .fetched_at
        .map(|t| t.elapsed() > self.stale_time)
        .unwrap_or(true),
      _ => false,
    }
  }

  /// Start fetching data if no fetch is in flight.
  ///
  /// This is a no-op while a request is pending, so concurrent callers
  /// share the in-flight fetch.
  pub fn fetch(&mut self) {
    if self.receiver.is_some() {
      return;
    }
    self.start_fetch();
  }

  /// Force a refetch, superseding any in-flight fetch.
  ///
  /// The pending receiver is dropped, so a response from the old fetch
  /// can never overwrite the new one.
  pub fn refetch(&mut self) {
    self.receiver = None;
    self.start_fetch();
  }

  /// Start a background revalidation when the data has gone stale.
  ///
  /// The current data stays visible while the fetch runs; call this
  /// from the event-loop tick.
  pub fn revalidate_if_stale(&mut self) {
    if self.is_stale() && self.receiver.is_none() {
      tracing::debug!("cached data went stale, revalidating");
      self.start_fetch();
    }
  }

  /// Poll for results from a pending fetch.
  ///
  /// Returns `true` if the state changed (data arrived or error
  /// occurred). Call this in your event loop tick handler.
  pub fn poll(&mut self) -> bool {
    let receiver = match &mut self.receiver {
      Some(rx) => rx,
      None => return false,
    };

    // Try to receive without blocking
    match receiver.try_recv() {
      Ok(Ok(data)) => {
        self.state = QueryState::Success(data);
        self.fetched_at = Some(Instant::now());
        self.last_error = None;
        self.receiver = None;
        true
      }
      Ok(Err(error)) => {
        if self.state.is_success() {
          // Keep showing the data we have; defer the next revalidation
          // by one staleness window.
          tracing::warn!(%error, "background refresh failed, keeping cached data");
          self.fetched_at = Some(Instant::now());
          self.last_error = Some(error);
        } else {
          self.state = QueryState::Error(error);
        }
        self.receiver = None;
        true
      }
      Err(mpsc::error::TryRecvError::Empty) => false,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        // Sender dropped without sending - treat as error
        if !self.state.is_success() {
          self.state = QueryState::Error("Query was cancelled".to_string());
        }
        self.receiver = None;
        true
      }
    }
  }

  /// Internal: start the fetch operation
  fn start_fetch(&mut self) {
    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);
    if !self.state.is_success() {
      self.state = QueryState::Loading;
    }

    let fetcher = Arc::clone(&self.fetcher);
    let retry = self.retry;
    tokio::spawn(async move {
      let result = fetch_with_retry(fetcher, retry).await;
      // Ignore send errors - receiver may have been dropped
      let _ = tx.send(result);
    });
  }
}

/// Run the fetcher, retrying failures per the policy.
async fn fetch_with_retry<T>(fetcher: Arc<FetcherFn<T>>, retry: RetryPolicy) -> Result<T, String> {
  let mut attempt = 0u32;
  loop {
    match (fetcher)().await {
      Ok(data) => return Ok(data),
      Err(error) => {
        if attempt >= retry.attempts {
          tracing::warn!(%error, attempts = attempt + 1, "fetch failed, retries exhausted");
          return Err(error);
        }
        let delay = retry.delay(attempt);
        tracing::warn!(%error, attempt, ?delay, "fetch failed, retrying");
        tokio::time::sleep(delay).await;
        attempt += 1;
      }
    }
  }
}

// Query is not Clone because the receiver is owned.
// If you need to share a query, wrap it in Arc<Mutex<Query<T>>>.

impl<T: std::fmt::Debug> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("state", &self.state)
      .field("fetched_at", &self.fetched_at)
      .field("stale_time", &self.stale_time)
      .finish_non_exhaustive()
  }
}
