use std::sync::Arc;

use tracing::debug;

use super::{FetchError, FetchOrchestrator, FetchSource, Fetched, Payload, QueryRequest};

type StageBuilder = Box<dyn FnOnce(&Payload) -> Result<QueryRequest, FetchError> + Send>;

/// Ordered fetches where each stage after the first is built from the
/// payload of the stage before it.
///
/// A chain is built for one set of parameters, resolved once, and dropped.
pub struct DependentChain {
    label: String,
    first: QueryRequest,
    rest: Vec<(String, StageBuilder)>,
}

impl DependentChain {
    pub fn new(label: impl Into<String>, first: QueryRequest) -> Self {
        Self {
            label: label.into(),
            first,
            rest: Vec::new(),
        }
    }

    /// Append a stage. `build` receives the previous stage's payload and may
    /// itself fail with `NotFound` when that payload lacks what it needs.
    pub fn then<F>(mut self, stage: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&Payload) -> Result<QueryRequest, FetchError> + Send + 'static,
    {
        self.rest.push((stage.into(), Box::new(build)));
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn len(&self) -> usize {
        1 + self.rest.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl std::fmt::Debug for DependentChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependentChain")
            .field("label", &self.label)
            .field("first", &self.first)
            .field("stages", &self.rest.iter().map(|(name, _)| name).collect::<Vec<_>>())
            .finish()
    }
}

/// Payloads of a fully resolved chain, in stage order.
#[derive(Debug, Clone)]
pub struct Resolution {
    earlier: Vec<Fetched>,
    last: Fetched,
}

impl Resolution {
    pub fn final_payload(&self) -> &Payload {
        &self.last.payload
    }

    pub fn stage(&self, index: usize) -> Option<&Payload> {
        self.stages().nth(index).map(|f| &f.payload)
    }

    pub fn stages(&self) -> impl Iterator<Item = &Fetched> {
        self.earlier.iter().chain(std::iter::once(&self.last))
    }

    /// How many stages started their own network call.
    pub fn network_calls(&self) -> usize {
        self.stages()
            .filter(|f| f.source == FetchSource::Network)
            .count()
    }

    pub fn into_payloads(self) -> Vec<Payload> {
        self.earlier
            .into_iter()
            .chain(std::iter::once(self.last))
            .map(|f| f.payload)
            .collect()
    }
}

/// Runs [`DependentChain`]s through a shared [`FetchOrchestrator`].
#[derive(Debug, Clone)]
pub struct QueryResolver {
    orchestrator: Arc<FetchOrchestrator>,
}

impl QueryResolver {
    pub fn new(orchestrator: Arc<FetchOrchestrator>) -> Self {
        Self { orchestrator }
    }

    pub fn orchestrator(&self) -> &Arc<FetchOrchestrator> {
        &self.orchestrator
    }

    /// Resolve every stage in order, stopping at the first error.
    pub async fn resolve(&self, chain: DependentChain) -> Result<Resolution, FetchError> {
        let DependentChain { label, first, rest } = chain;
        debug!(chain = %label, stages = 1 + rest.len(), "Resolving chain");

        let mut earlier = Vec::with_capacity(rest.len());
        let mut last = self.run_stage(first).await?;

        for (stage, build) in rest {
            let request = build(&last.payload).map_err(|e| {
                debug!(chain = %label, stage = %stage, error = %e, "Stage could not be built");
                e
            })?;
            debug!(chain = %label, stage = %stage, key = %request.key(), "Next stage");
            let next = self.run_stage(request).await?;
            earlier.push(std::mem::replace(&mut last, next));
        }

        Ok(Resolution { earlier, last })
    }

    /// Single request with the same presence handling as a chain stage.
    pub async fn fetch_one(&self, request: QueryRequest) -> Result<Payload, FetchError> {
        Ok(self.run_stage(request).await?.payload)
    }

    async fn run_stage(&self, request: QueryRequest) -> Result<Fetched, FetchError> {
        let presence = request.presence().cloned();
        let fetched = self.orchestrator.fetch(request).await?;
        if let Some(presence) = presence {
            presence.verify(&fetched.payload)?;
        }
        Ok(fetched)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheKey, TtlCache};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn resolver() -> QueryResolver {
        let cache = Arc::new(TtlCache::in_memory());
        QueryResolver::new(Arc::new(FetchOrchestrator::new(cache)))
    }

    fn has_results(payload: &Payload) -> bool {
        payload["response"].as_array().is_some_and(|r| !r.is_empty())
    }

    fn request(key: &str, calls: &Arc<AtomicUsize>, payload: Payload) -> QueryRequest {
        let calls = Arc::clone(calls);
        QueryRequest::new(CacheKey::raw(key), Duration::from_secs(60), move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(payload)
        })
    }

    #[tokio::test]
    async fn test_stages_feed_forward() {
        let resolver = resolver();
        let calls = Arc::new(AtomicUsize::new(0));
        let leagues_calls = Arc::clone(&calls);

        let chain = DependentChain::new(
            "league 39",
            request(
                "standings?league=39",
                &calls,
                json!({"response": [{"league": {"country": "England"}}]}),
            ),
        )
        .then("country leagues", move |league| {
            let country = league["response"][0]["league"]["country"]
                .as_str()
                .ok_or_else(|| FetchError::NotFound("country".to_string()))?
                .to_string();
            Ok(request(
                &format!("leagues?country={}", country),
                &leagues_calls,
                json!({"response": [{"league": {"id": 39}}], "country": country}),
            ))
        });
        assert_eq!(chain.len(), 2);

        let resolution = resolver.resolve(chain).await.unwrap();
        assert_eq!(resolution.final_payload()["country"], "England");
        assert_eq!(resolution.stage(0).unwrap()["response"][0]["league"]["country"], "England");
        assert!(resolution.stage(2).is_none());
        assert_eq!(resolution.network_calls(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_not_found_short_circuits() {
        let resolver = resolver();
        let calls = Arc::new(AtomicUsize::new(0));
        let second_built = Arc::new(AtomicUsize::new(0));
        let built = Arc::clone(&second_built);

        let chain = DependentChain::new(
            "league 9999",
            request("standings?league=9999", &calls, json!({"response": []}))
                .expect_entity("league 9999", has_results),
        )
        .then("country leagues", move |_| {
            built.fetch_add(1, Ordering::SeqCst);
            Err(FetchError::Transport("should not run".to_string()))
        });

        let err = resolver.resolve(chain).await.unwrap_err();
        assert_eq!(err, FetchError::NotFound("league 9999".to_string()));
        assert_eq!(second_built.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_intermediate_stage_is_reused_across_chains() {
        let resolver = resolver();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let calls_inner = Arc::clone(&calls);
            let chain = DependentChain::new(
                "cup 45",
                request("fixtures/rounds?league=45", &calls, json!({"response": ["Final"]})),
            )
            .then("resolve country", move |_| {
                Ok(request("leagues?id=45", &calls_inner, json!({"response": [{"country": {"name": "England"}}]})))
            });
            resolver.resolve(chain).await.unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let resolver = resolver();
        let failing = QueryRequest::new(CacheKey::raw("teams?id=1"), Duration::from_secs(1), || async {
            Err(FetchError::Transport("timeout".to_string()))
        });
        let err = resolver.resolve(DependentChain::new("team 1", failing)).await.unwrap_err();
        assert!(!err.is_not_found());
    }

    #[tokio::test]
    async fn test_fetch_one_checks_presence() {
        let resolver = resolver();
        let calls = Arc::new(AtomicUsize::new(0));
        let err = resolver
            .fetch_one(request("teams?id=0", &calls, json!({"response": []})).expect_entity("team 0", has_results))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
