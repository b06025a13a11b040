use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::{FutureExt, Shared};
use tracing::{debug, info, warn};

use super::request::Execute;
use super::{FetchError, Payload, PayloadFuture, QueryRequest};
use crate::cache::{CacheKey, TtlCache};

/// Where a fetched payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSource {
    /// Served from the TTL cache, no network call.
    Cache,
    /// This caller started the network call.
    Network,
    /// Another caller's network call for the same key was already running.
    Joined,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fetched {
    pub payload: Payload,
    pub source: FetchSource,
}

type SharedExecution = Shared<PayloadFuture>;
type InFlight = Arc<Mutex<HashMap<CacheKey, SharedExecution>>>;

/// Produces payloads for [`QueryRequest`]s with as few network calls as
/// possible.
///
/// 1. A valid cache entry is returned as is.
/// 2. If the key is already being fetched, the caller awaits that execution.
/// 3. Otherwise `execute` runs; a success is cached with the request's TTL,
///    a failure is not cached and goes to every waiter.
///
/// The cache is re-checked under the in-flight lock, and an execution writes
/// the cache before it leaves the in-flight table, so no caller can slip
/// between a miss and the matching `set`.
pub struct FetchOrchestrator {
    cache: Arc<TtlCache>,
    in_flight: InFlight,
}

impl FetchOrchestrator {
    pub fn new(cache: Arc<TtlCache>) -> Self {
        Self {
            cache,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn cache(&self) -> &Arc<TtlCache> {
        &self.cache
    }

    /// Number of keys with a network call currently running.
    pub fn in_flight_count(&self) -> usize {
        lock(&self.in_flight).len()
    }

    pub async fn fetch(&self, request: QueryRequest) -> Result<Fetched, FetchError> {
        let (key, ttl, execute) = request.into_parts();

        if let Some(payload) = self.cache.get(&key) {
            debug!(key = %key, "Cache hit");
            return Ok(Fetched {
                payload,
                source: FetchSource::Cache,
            });
        }

        let (execution, source) = {
            let mut in_flight = lock(&self.in_flight);
            if let Some(running) = in_flight.get(&key) {
                debug!(key = %key, "Joining in-flight request");
                (running.clone(), FetchSource::Joined)
            } else if let Some(payload) = self.cache.peek(&key) {
                // An execution finished between the first lookup and the lock.
                return Ok(Fetched {
                    payload,
                    source: FetchSource::Cache,
                });
            } else {
                let execution = self.start_execution(key.clone(), ttl, execute);
                in_flight.insert(key.clone(), execution.clone());
                (execution, FetchSource::Network)
            }
        };

        let payload = execution.await?;
        Ok(Fetched { payload, source })
    }

    fn start_execution(
        &self,
        key: CacheKey,
        ttl: Duration,
        execute: Execute,
    ) -> SharedExecution {
        let cache = Arc::clone(&self.cache);
        let in_flight = Arc::clone(&self.in_flight);

        async move {
            info!(key = %key, "Fetching from network");
            let result = execute().await;

            match &result {
                Ok(payload) => {
                    if let Err(e) = cache.set(&key, payload.clone(), ttl) {
                        warn!(key = %key, error = %e, "Failed to cache response");
                    }
                }
                Err(e) => e.log(key.as_str()),
            }

            lock(&in_flight).remove(&key);
            result
        }
        .boxed()
        .shared()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl std::fmt::Debug for FetchOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchOrchestrator")
            .field("cache", &self.cache)
            .field("in_flight", &self.in_flight_count())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{ManualClock, MemoryStore};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    const ONE_DAY: Duration = Duration::from_millis(86_400_000);

    fn orchestrator() -> (Arc<FetchOrchestrator>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::at_epoch());
        let cache = Arc::new(TtlCache::new(MemoryStore::new(), clock.clone()));
        (Arc::new(FetchOrchestrator::new(cache)), clock)
    }

    fn counted(key: &str, calls: &Arc<AtomicUsize>, payload: Payload) -> QueryRequest {
        let calls = Arc::clone(calls);
        QueryRequest::new(CacheKey::raw(key), ONE_DAY, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(payload)
        })
    }

    #[tokio::test]
    async fn test_ttl_scenario() {
        let (orch, clock) = orchestrator();
        let calls = Arc::new(AtomicUsize::new(0));
        let league = json!({"id": 39});

        let first = orch.fetch(counted("leagues/39/2023", &calls, league.clone())).await.unwrap();
        assert_eq!(first.source, FetchSource::Network);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        clock.advance_ms(1000);
        let second = orch.fetch(counted("leagues/39/2023", &calls, league.clone())).await.unwrap();
        assert_eq!(second.source, FetchSource::Cache);
        assert_eq!(second.payload, league);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        clock.set(chrono::DateTime::<chrono::Utc>::UNIX_EPOCH + chrono::Duration::milliseconds(86_400_001));
        let third = orch.fetch(counted("leagues/39/2023", &calls, league)).await.unwrap();
        assert_eq!(third.source, FetchSource::Network);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_network_fetch_counts_one_miss() {
        let (orch, _) = orchestrator();
        let calls = Arc::new(AtomicUsize::new(0));
        orch.fetch(counted("standings?league=39", &calls, json!([]))).await.unwrap();
        orch.fetch(counted("standings?league=39", &calls, json!([]))).await.unwrap();

        let stats = orch.cache().stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let (orch, _) = orchestrator();
        let failing = QueryRequest::new(CacheKey::raw("teams?id=1"), ONE_DAY, || async {
            Err(FetchError::Transport("connection reset".to_string()))
        });
        let err = orch.fetch(failing).await.unwrap_err();
        assert_eq!(err, FetchError::Transport("connection reset".to_string()));
        assert!(orch.cache().get(&CacheKey::raw("teams?id=1")).is_none());
        assert_eq!(orch.in_flight_count(), 0);

        let calls = Arc::new(AtomicUsize::new(0));
        let retried = orch.fetch(counted("teams?id=1", &calls, json!([1]))).await.unwrap();
        assert_eq!(retried.source, FetchSource::Network);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_fetches_share_one_execution() {
        let (orch, _) = orchestrator();
        let calls = Arc::new(AtomicUsize::new(0));
        let (release_tx, release_rx) = oneshot::channel::<()>();

        let first = {
            let calls = Arc::clone(&calls);
            QueryRequest::new(CacheKey::raw("teams?id=33"), ONE_DAY, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                let _ = release_rx.await;
                Ok(json!({"team": "Manchester United"}))
            })
        };

        let a = tokio::spawn({
            let orch = Arc::clone(&orch);
            async move { orch.fetch(first).await }
        });

        // Wait until the first execution is registered.
        while orch.in_flight_count() == 0 {
            tokio::task::yield_now().await;
        }

        let b = tokio::spawn({
            let orch = Arc::clone(&orch);
            let second = counted("teams?id=33", &calls, json!({"team": "other"}));
            async move { orch.fetch(second).await }
        });
        tokio::task::yield_now().await;

        release_tx.send(()).unwrap();
        let a = a.await.unwrap().unwrap();
        let b = b.await.unwrap().unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.payload, b.payload);
        assert_eq!(a.source, FetchSource::Network);
        assert!(matches!(b.source, FetchSource::Joined | FetchSource::Cache));
        assert_eq!(orch.in_flight_count(), 0);
    }

    #[tokio::test]
    async fn test_shared_failure_reaches_every_waiter() {
        let (orch, _) = orchestrator();
        let calls = Arc::new(AtomicUsize::new(0));

        let make = |calls: Arc<AtomicUsize>| {
            QueryRequest::new(CacheKey::raw("fixtures?league=45"), ONE_DAY, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                Err(FetchError::Transport("HTTP 500".to_string()))
            })
        };

        let (a, b) = tokio::join!(
            orch.fetch(make(Arc::clone(&calls))),
            orch.fetch(make(Arc::clone(&calls)))
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.unwrap_err(), FetchError::Transport("HTTP 500".to_string()));
        assert_eq!(b.unwrap_err(), FetchError::Transport("HTTP 500".to_string()));
    }

    #[tokio::test]
    async fn test_different_keys_are_not_deduplicated() {
        let (orch, _) = orchestrator();
        let calls = Arc::new(AtomicUsize::new(0));
        let (a, b) = tokio::join!(
            orch.fetch(counted("teams?id=1", &calls, json!(1))),
            orch.fetch(counted("teams?id=2", &calls, json!(2)))
        );
        assert_eq!(a.unwrap().payload, json!(1));
        assert_eq!(b.unwrap().payload, json!(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
