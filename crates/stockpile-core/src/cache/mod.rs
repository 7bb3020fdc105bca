// ── Keyed query cache ──
//
// Single-flight reads with invalidate-on-write. Each key owns one slot
// holding the last settled value and, while a fetch runs, a shared
// future every concurrent reader of that key awaits. The fetch settles
// the slot itself, so the result lands exactly once no matter how many
// readers joined or dropped out.
//
// Invalidation bumps the slot's generation: a fetch started before the
// bump still answers its waiters but never writes its result back.

mod key;

use std::any::Any;
use std::future::Future;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tokio::sync::{broadcast, watch};
use tokio::time::Instant;
use tracing::{debug, trace, warn};

pub use key::QueryKey;

use crate::config::{MAX_RETRY_DELAY, QueryDefaults};
use crate::error::CoreError;

const EVENT_CHANNEL_SIZE: usize = 64;

type AnyValue = Arc<dyn Any + Send + Sync>;
type SharedFetch = Shared<BoxFuture<'static, Result<AnyValue, CoreError>>>;
type SlotRef = Arc<Mutex<Slot>>;

// ── Options & state ──────────────────────────────────────────────────

/// Per-read cache behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    pub stale_time: Duration,
    pub retry: u32,
    pub retry_delay: Duration,
}

impl QueryOptions {
    /// Same options, but a failure is final.
    pub fn no_retry(mut self) -> Self {
        self.retry = 0;
        self
    }

    /// Delay before retry number `attempt + 1`: `retry_delay * 2^attempt`,
    /// capped at [`MAX_RETRY_DELAY`].
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1_u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.retry_delay.saturating_mul(factor).min(MAX_RETRY_DELAY)
    }
}

impl From<QueryDefaults> for QueryOptions {
    fn from(defaults: QueryDefaults) -> Self {
        Self {
            stale_time: defaults.stale_time,
            retry: defaults.retry,
            retry_delay: defaults.retry_delay,
        }
    }
}

impl Default for QueryOptions {
    fn default() -> Self {
        QueryDefaults::default().into()
    }
}

/// Published on every invalidate/clear so observers can refetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// Every key starting with this prefix was marked stale.
    Invalidated(QueryKey),
    /// The whole cache was emptied.
    Cleared,
}

impl CacheEvent {
    pub fn affects(&self, key: &QueryKey) -> bool {
        match self {
            Self::Invalidated(prefix) => key.starts_with(prefix),
            Self::Cleared => true,
        }
    }
}

/// Snapshot of one key, as a view renders it.
#[derive(Debug, Clone)]
pub struct QueryState<T> {
    pub data: Option<Arc<T>>,
    pub is_loading: bool,
    /// The next read will go to the network.
    pub is_stale: bool,
    /// Error from the most recent settled fetch, if it failed.
    pub error: Option<CoreError>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            data: None,
            is_loading: false,
            is_stale: true,
            error: None,
            updated_at: None,
        }
    }
}

// ── Slots ────────────────────────────────────────────────────────────

#[derive(Default)]
struct Slot {
    value: Option<AnyValue>,
    fetched_at: Option<Instant>,
    updated_at: Option<DateTime<Utc>>,
    stale_time: Duration,
    invalidated: bool,
    error: Option<CoreError>,
    generation: u64,
    in_flight: Option<SharedFetch>,
}

impl Slot {
    fn is_stale(&self) -> bool {
        if self.invalidated || self.value.is_none() {
            return true;
        }
        self.fetched_at
            .is_none_or(|at| at.elapsed() >= self.stale_time)
    }

    fn fresh_value(&self) -> Option<AnyValue> {
        if self.is_stale() {
            return None;
        }
        self.value.clone()
    }

    /// Record a finished fetch. Returns `false` if the slot was
    /// invalidated after the fetch started.
    fn settle(&mut self, generation: u64, result: &Result<AnyValue, CoreError>) -> bool {
        if self.generation != generation {
            return false;
        }
        self.in_flight = None;
        match result {
            Ok(value) => {
                self.value = Some(Arc::clone(value));
                self.fetched_at = Some(Instant::now());
                self.updated_at = Some(Utc::now());
                self.invalidated = false;
                self.error = None;
            }
            Err(e) => self.error = Some(e.clone()),
        }
        true
    }

    fn invalidate(&mut self) {
        self.generation += 1;
        self.invalidated = true;
        self.in_flight = None;
    }
}

// ── QueryCache ───────────────────────────────────────────────────────

/// Process-wide cache of read results, keyed by [`QueryKey`].
///
/// Constructed once per client and dropped with it. Mutated only by
/// fetch settlement, [`invalidate`](Self::invalidate) and
/// [`clear`](Self::clear); there is no direct write.
pub struct QueryCache {
    entries: DashMap<QueryKey, SlotRef>,
    /// Bumped whenever any slot changes (fetch started, settled,
    /// invalidated, cleared).
    version: Arc<watch::Sender<u64>>,
    events: broadcast::Sender<CacheEvent>,
    defaults: QueryDefaults,
}

impl QueryCache {
    pub fn new(defaults: QueryDefaults) -> Self {
        let (version, _) = watch::channel(0_u64);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        Self {
            entries: DashMap::new(),
            version: Arc::new(version),
            events,
            defaults,
        }
    }

    /// Options for an ordinary read.
    pub fn options(&self) -> QueryOptions {
        self.defaults.into()
    }

    /// Read `key`, going to the network through `fetcher` only when needed.
    ///
    /// - A fetch already running for `key` is joined, never duplicated.
    /// - A settled value younger than `stale_time` (and not invalidated)
    ///   is returned without calling `fetcher`.
    /// - Otherwise `fetcher` runs, retried on transient failures per
    ///   `options`.
    pub async fn fetch<T, F, Fut>(
        &self,
        key: QueryKey,
        options: QueryOptions,
        fetcher: F,
    ) -> Result<Arc<T>, CoreError>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, CoreError>> + Send + 'static,
    {
        let slot = self.slot(&key);
        let mut started = false;

        let pending = {
            let mut guard = slot.lock().expect("query slot lock poisoned");
            if let Some(in_flight) = &guard.in_flight {
                trace!(%key, "joining in-flight fetch");
                in_flight.clone()
            } else if let Some(value) = guard.fresh_value() {
                trace!(%key, "cache hit");
                return downcast(&key, value);
            } else {
                debug!(%key, "fetching");
                let fetch = shared_fetch(
                    Arc::downgrade(&slot),
                    guard.generation,
                    key.clone(),
                    options,
                    Arc::clone(&self.version),
                    fetcher,
                );
                guard.stale_time = options.stale_time;
                guard.in_flight = Some(fetch.clone());
                started = true;
                fetch
            }
        };

        if started {
            self.bump();
        }

        let value = pending.await?;
        downcast(&key, value)
    }

    /// Current state of `key` without triggering a fetch.
    pub fn state<T: Send + Sync + 'static>(&self, key: &QueryKey) -> QueryState<T> {
        let Some(slot) = self.entries.get(key).map(|e| Arc::clone(e.value())) else {
            return QueryState::default();
        };
        let guard = slot.lock().expect("query slot lock poisoned");

        let (data, error) = match guard.value.clone().map(|v| downcast::<T>(key, v)) {
            Some(Ok(data)) => (Some(data), guard.error.clone()),
            Some(Err(e)) => (None, Some(e)),
            None => (None, guard.error.clone()),
        };

        QueryState {
            data,
            is_loading: guard.in_flight.is_some(),
            is_stale: guard.is_stale(),
            error,
            updated_at: guard.updated_at,
        }
    }

    /// Mark every key in the `prefix` family stale. Returns how many
    /// cached keys were marked.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut marked = 0;
        for entry in &self.entries {
            if entry.key().starts_with(prefix) {
                entry
                    .value()
                    .lock()
                    .expect("query slot lock poisoned")
                    .invalidate();
                marked += 1;
            }
        }
        debug!(%prefix, marked, "invalidated");

        // No receivers is fine.
        let _ = self.events.send(CacheEvent::Invalidated(prefix.clone()));
        self.bump();
        marked
    }

    /// Drop every entry. In-flight fetches still answer their waiters
    /// but their results are discarded.
    pub fn clear(&self) {
        for entry in &self.entries {
            entry
                .value()
                .lock()
                .expect("query slot lock poisoned")
                .invalidate();
        }
        self.entries.clear();
        debug!("cache cleared");

        let _ = self.events.send(CacheEvent::Cleared);
        self.bump();
    }

    /// Version counter bumped on every change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    /// Invalidate/clear notifications.
    pub fn invalidations(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn slot(&self, key: &QueryKey) -> SlotRef {
        Arc::clone(&*self.entries.entry(key.clone()).or_default())
    }

    fn bump(&self) {
        self.version.send_modify(|v| *v = v.wrapping_add(1));
    }
}

/// Build the shared fetch future for one slot generation.
///
/// Holds only a weak reference to the slot so a cleared cache never
/// keeps an abandoned fetch alive.
fn shared_fetch<T, F, Fut>(
    slot: Weak<Mutex<Slot>>,
    generation: u64,
    key: QueryKey,
    options: QueryOptions,
    version: Arc<watch::Sender<u64>>,
    fetcher: F,
) -> SharedFetch
where
    T: Send + Sync + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, CoreError>> + Send + 'static,
{
    async move {
        let result = with_retry(&key, options, &fetcher)
            .await
            .map(|value| Arc::new(value) as AnyValue);

        if let Some(slot) = slot.upgrade() {
            let settled = slot
                .lock()
                .expect("query slot lock poisoned")
                .settle(generation, &result);
            if settled {
                version.send_modify(|v| *v = v.wrapping_add(1));
            } else {
                trace!(%key, "discarding result of invalidated fetch");
            }
        }

        result
    }
    .boxed()
    .shared()
}

async fn with_retry<T, F, Fut>(
    key: &QueryKey,
    options: QueryOptions,
    fetcher: &F,
) -> Result<T, CoreError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, CoreError>>,
{
    let mut attempt = 0;
    loop {
        match fetcher().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < options.retry && e.is_transient() => {
                let delay = options.delay_for(attempt);
                attempt += 1;
                warn!(%key, attempt, ?delay, error = %e, "query failed, retrying");
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

fn downcast<T: Send + Sync + 'static>(key: &QueryKey, value: AnyValue) -> Result<Arc<T>, CoreError> {
    value
        .downcast::<T>()
        .map_err(|_| CoreError::Internal(format!("cached value for {key} has an unexpected type")))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use stockpile_api::ApiError;

    use super::*;

    fn cache(stale_time: Duration) -> Arc<QueryCache> {
        Arc::new(QueryCache::new(QueryDefaults {
            stale_time,
            retry: 3,
            retry_delay: Duration::from_millis(100),
        }))
    }

    fn connection_error() -> CoreError {
        CoreError::ConnectionFailed {
            url: "http://localhost:8080".into(),
            reason: "refused".into(),
        }
    }

    /// A fetcher that counts its calls and answers `value` after `delay`.
    fn counting(
        calls: &Arc<AtomicUsize>,
        value: u32,
        delay: Duration,
    ) -> impl Fn() -> BoxFuture<'static, Result<u32, CoreError>> + Send + Sync + 'static {
        let calls = Arc::clone(calls);
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                tokio::time::sleep(delay).await;
                Ok(value)
            }
            .boxed()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_reads_share_one_fetch() {
        let cache = cache(Duration::ZERO);
        let calls = Arc::new(AtomicUsize::new(0));
        let opts = cache.options();

        let (a, b) = tokio::join!(
            cache.fetch(QueryKey::products(), opts, counting(&calls, 7, Duration::from_millis(50))),
            cache.fetch(QueryKey::products(), opts, counting(&calls, 8, Duration::from_millis(50))),
        );

        let (a, b) = (a.expect("first read"), b.expect("second read"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(*a, 7);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test(start_paused = true)]
    async fn distinct_keys_fetch_independently() {
        let cache = cache(Duration::ZERO);
        let calls = Arc::new(AtomicUsize::new(0));
        let opts = cache.options();

        let (a, b) = tokio::join!(
            cache.fetch(QueryKey::product("a"), opts, counting(&calls, 1, Duration::from_millis(10))),
            cache.fetch(QueryKey::product("b"), opts, counting(&calls, 2, Duration::from_millis(10))),
        );

        assert_eq!(*a.expect("a"), 1);
        assert_eq!(*b.expect("b"), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_values_are_served_from_cache() {
        let cache = cache(Duration::from_secs(60));
        let calls = Arc::new(AtomicUsize::new(0));
        let opts = cache.options();

        cache
            .fetch(QueryKey::auth_me(), opts, counting(&calls, 1, Duration::ZERO))
            .await
            .expect("first");
        cache
            .fetch(QueryKey::auth_me(), opts, counting(&calls, 1, Duration::ZERO))
            .await
            .expect("second");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(cache.state::<u32>(&QueryKey::auth_me()).is_stale);
        cache
            .fetch(QueryKey::auth_me(), opts, counting(&calls, 1, Duration::ZERO))
            .await
            .expect("third");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_stale_time_refetches_after_settle() {
        let cache = cache(Duration::ZERO);
        let calls = Arc::new(AtomicUsize::new(0));
        let opts = cache.options();

        for _ in 0..2 {
            cache
                .fetch(QueryKey::products(), opts, counting(&calls, 1, Duration::ZERO))
                .await
                .expect("read");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_marks_family_stale_only() {
        let cache = cache(Duration::from_secs(60));
        let calls = Arc::new(AtomicUsize::new(0));
        let opts = cache.options();

        for key in [
            QueryKey::products(),
            QueryKey::product("p-1"),
            QueryKey::auth_me(),
        ] {
            cache
                .fetch(key, opts, counting(&calls, 1, Duration::ZERO))
                .await
                .expect("read");
        }

        assert_eq!(cache.invalidate(&QueryKey::products()), 2);

        assert!(cache.state::<u32>(&QueryKey::products()).is_stale);
        assert!(cache.state::<u32>(&QueryKey::product("p-1")).is_stale);
        assert!(!cache.state::<u32>(&QueryKey::auth_me()).is_stale);

        // Stale entries still show their last value until refetched.
        assert_eq!(
            cache.state::<u32>(&QueryKey::products()).data.as_deref(),
            Some(&1)
        );

        let before = calls.load(Ordering::SeqCst);
        cache
            .fetch(QueryKey::products(), opts, counting(&calls, 2, Duration::ZERO))
            .await
            .expect("refetch");
        assert_eq!(calls.load(Ordering::SeqCst), before + 1);
        assert!(!cache.state::<u32>(&QueryKey::products()).is_stale);
    }

    #[tokio::test(start_paused = true)]
    async fn clear_drops_everything() {
        let cache = cache(Duration::from_secs(60));
        let calls = Arc::new(AtomicUsize::new(0));
        let opts = cache.options();

        for key in [QueryKey::products(), QueryKey::auth_me()] {
            cache
                .fetch(key, opts, counting(&calls, 1, Duration::ZERO))
                .await
                .expect("read");
        }
        assert_eq!(cache.len(), 2);

        cache.clear();

        assert!(cache.is_empty());
        let state = cache.state::<u32>(&QueryKey::auth_me());
        assert!(state.data.is_none());
        assert!(state.is_stale);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidated_fetch_does_not_write_back() {
        let cache = cache(Duration::from_secs(60));
        let calls = Arc::new(AtomicUsize::new(0));
        let opts = cache.options();

        let reader = {
            let cache = Arc::clone(&cache);
            let fetcher = counting(&calls, 1, Duration::from_millis(100));
            tokio::spawn(async move { cache.fetch(QueryKey::products(), opts, fetcher).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(cache.state::<u32>(&QueryKey::products()).is_loading);

        cache.invalidate(&QueryKey::products());
        let value = reader.await.expect("join").expect("read");

        assert_eq!(*value, 1);
        let state = cache.state::<u32>(&QueryKey::products());
        assert!(state.data.is_none());
        assert!(state.is_stale);
        assert!(!state.is_loading);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_are_retried_with_backoff() {
        let cache = cache(Duration::ZERO);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let started = Instant::now();

        let value = cache
            .fetch(QueryKey::products(), cache.options(), move || {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(connection_error())
                    } else {
                        Ok(5_u32)
                    }
                }
            })
            .await
            .expect("third attempt succeeds");

        assert_eq!(*value, 5);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 100ms + 200ms of backoff.
        assert!(started.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn no_retry_fails_after_one_call() {
        let cache = cache(Duration::ZERO);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let err = cache
            .fetch(QueryKey::auth_me(), cache.options().no_retry(), move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err::<u32, _>(connection_error()) }
            })
            .await
            .expect_err("fails");

        assert!(matches!(err, CoreError::ConnectionFailed { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let state = cache.state::<u32>(&QueryKey::auth_me());
        assert!(state.error.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn client_errors_are_not_retried() {
        let cache = cache(Duration::ZERO);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let err = cache
            .fetch(QueryKey::product("gone"), cache.options(), move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async {
                    Err::<u32, _>(CoreError::Api {
                        status: 404,
                        error: ApiError::new("product not found"),
                    })
                }
            })
            .await
            .expect_err("fails");

        assert_eq!(err.message(), "product not found");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn type_mismatch_is_internal_error() {
        let cache = cache(Duration::from_secs(60));
        let calls = Arc::new(AtomicUsize::new(0));

        cache
            .fetch(QueryKey::products(), cache.options(), counting(&calls, 1, Duration::ZERO))
            .await
            .expect("read");

        let err = cache
            .fetch(QueryKey::products(), cache.options(), || async {
                Ok(String::from("wrong"))
            })
            .await
            .expect_err("mismatch");
        assert!(matches!(err, CoreError::Internal(_)));
    }

    #[tokio::test]
    async fn events_announce_invalidation_and_clear() {
        let cache = cache(Duration::ZERO);
        let mut events = cache.invalidations();
        let mut version = cache.subscribe();

        cache.invalidate(&QueryKey::products());
        let event = events.recv().await.expect("event");
        assert_eq!(event, CacheEvent::Invalidated(QueryKey::products()));
        assert!(event.affects(&QueryKey::product("p-1")));
        assert!(!event.affects(&QueryKey::auth_me()));
        assert!(version.has_changed().expect("sender alive"));
        version.mark_unchanged();

        cache.clear();
        assert_eq!(events.recv().await.expect("event"), CacheEvent::Cleared);
        assert!(version.has_changed().expect("sender alive"));
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let opts = QueryOptions {
            stale_time: Duration::ZERO,
            retry: 10,
            retry_delay: Duration::from_secs(1),
        };
        assert_eq!(opts.delay_for(0), Duration::from_secs(1));
        assert_eq!(opts.delay_for(2), Duration::from_secs(4));
        assert_eq!(opts.delay_for(5), MAX_RETRY_DELAY);
        assert_eq!(opts.delay_for(40), MAX_RETRY_DELAY);
    }
}
