use std::fmt;
use std::future::Future;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};

use super::FetchError;
use crate::cache::CacheKey;

/// Opaque JSON response body.
pub type Payload = serde_json::Value;

pub type PayloadFuture = BoxFuture<'static, Result<Payload, FetchError>>;

pub(crate) type Execute = Box<dyn FnOnce() -> PayloadFuture + Send>;

/// Says what a request looks up and how to tell an empty answer apart.
#[derive(Clone)]
pub struct Presence {
    entity: String,
    check: fn(&Payload) -> bool,
}

impl Presence {
    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn verify(&self, payload: &Payload) -> Result<(), FetchError> {
        if (self.check)(payload) {
            Ok(())
        } else {
            Err(FetchError::NotFound(self.entity.clone()))
        }
    }
}

impl fmt::Debug for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Presence").field("entity", &self.entity).finish()
    }
}

/// One unit of fetchable work.
///
/// `execute` performs the network call and nothing else; it runs at most
/// once per request and never if the key is served from cache or joined to
/// an identical in-flight request.
pub struct QueryRequest {
    key: CacheKey,
    ttl: Duration,
    execute: Execute,
    presence: Option<Presence>,
}

impl QueryRequest {
    pub fn new<F, Fut>(key: CacheKey, ttl: Duration, execute: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Payload, FetchError>> + Send + 'static,
    {
        Self {
            key,
            ttl,
            execute: Box::new(move || execute().boxed()),
            presence: None,
        }
    }

    /// Mark the request as a lookup of `entity`. When `check` rejects the
    /// payload, the resolver stops the chain with `FetchError::NotFound`.
    pub fn expect_entity(mut self, entity: impl Into<String>, check: fn(&Payload) -> bool) -> Self {
        self.presence = Some(Presence {
            entity: entity.into(),
            check,
        });
        self
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn presence(&self) -> Option<&Presence> {
        self.presence.as_ref()
    }

    pub(crate) fn into_parts(self) -> (CacheKey, Duration, Execute) {
        (self.key, self.ttl, self.execute)
    }
}

impl fmt::Debug for QueryRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryRequest")
            .field("key", &self.key)
            .field("ttl", &self.ttl)
            .field("presence", &self.presence)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn non_empty(payload: &Payload) -> bool {
        payload.as_array().is_some_and(|a| !a.is_empty())
    }

    #[test]
    fn test_presence_verify() {
        let request = QueryRequest::new(CacheKey::raw("teams?id=1"), Duration::from_secs(1), || async {
            Ok(json!([]))
        })
        .expect_entity("team 1", non_empty);

        let presence = request.presence().unwrap();
        assert_eq!(presence.entity(), "team 1");
        assert!(presence.verify(&json!([{"id": 1}])).is_ok());
        assert_eq!(
            presence.verify(&json!([])),
            Err(FetchError::NotFound("team 1".to_string()))
        );
    }

    #[tokio::test]
    async fn test_execute_runs_closure() {
        let request = QueryRequest::new(CacheKey::raw("k"), Duration::from_secs(1), || async {
            Ok(json!({"ok": true}))
        });
        assert_eq!(request.key().as_str(), "k");
        let (_, _, execute) = request.into_parts();
        assert_eq!(execute().await, Ok(json!({"ok": true})));
    }
}
