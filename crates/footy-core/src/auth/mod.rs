//! Persisted login ("remember me").
//!
//! The backend issues a bearer token on login or signup. It is stored in
//! the cache directory until the user logs out.

pub mod session;

pub use session::{Session, SessionData};
