//! Fetch orchestration on top of the TTL cache.
//!
//! - [`QueryRequest`]: one unit of fetchable work (key, TTL, execute closure)
//! - [`FetchOrchestrator`]: cache lookup, in-flight dedup, cache population
//! - [`QueryResolver`]: runs a [`DependentChain`] stage by stage
//!
//! Nothing here retries. A failed fetch stays failed until the caller asks
//! again.

pub mod error;
pub mod orchestrator;
pub mod request;
pub mod resolver;

pub use error::FetchError;
pub use orchestrator::{FetchOrchestrator, FetchSource, Fetched};
pub use request::{Payload, PayloadFuture, Presence, QueryRequest};
pub use resolver::{DependentChain, QueryResolver, Resolution};
