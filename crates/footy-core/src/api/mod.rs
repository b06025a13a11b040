//! Client for the external football data API.
//!
//! `FootballClient` does not fetch anything itself: each endpoint method
//! returns a [`QueryRequest`](crate::fetch::QueryRequest) whose cache key is
//! derived from the same endpoint and parameters as the URL, so the
//! orchestrator decides whether the network is touched at all.

pub mod client;
pub mod error;

pub use client::{FootballClient, ONE_DAY, ONE_MONTH, ONE_WEEK};
pub use error::ApiError;
