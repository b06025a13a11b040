//! footy-core - data layer for the footy football browser.
//!
//! The heart of the crate is a small fetch pipeline shared by every screen:
//!
//! - [`cache`]: keyed TTL cache with injectable storage and clock
//! - [`fetch`]: request orchestration (cache lookup, in-flight dedup) and
//!   dependent multi-stage resolution
//! - [`view`]: per-screen load state machine with generation tokens
//!
//! On top of it sit the football-specific pieces: the external API client,
//! typed models, the competition / cup / team screens, and the backend
//! client for accounts and favorites.

pub mod api;
pub mod auth;
pub mod backend;
pub mod cache;
pub mod config;
pub mod fetch;
pub mod models;
pub mod screens;
pub mod view;

pub use cache::{CacheKey, TtlCache};
pub use fetch::{DependentChain, FetchError, FetchOrchestrator, Payload, QueryRequest, QueryResolver};
pub use view::{QueryStatus, ViewMachine, ViewRunner};
