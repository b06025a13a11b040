//! Keyed TTL cache for API responses.
//!
//! Entries expire `ttl` after they were stored and are dropped lazily on the
//! next lookup; there is no background sweep and no size bound. The cache
//! itself is storage-agnostic:
//!
//! - `MemoryStore`: process-lifetime map, used by tests and `--memory-cache`
//! - `FileStore`: one JSON file per key, survives restarts
//!
//! Time is read through a [`Clock`] so expiry can be simulated in tests.

pub mod clock;
pub mod key;
pub mod store;
pub mod ttl;

pub use clock::{Clock, ManualClock, SystemClock};
pub use key::CacheKey;
pub use store::{CacheEntry, CacheStore, FileStore, MemoryStore};
pub use ttl::{CacheError, CacheStats, TtlCache};
