//! Per-screen load state.
//!
//! [`ViewMachine`] is the plain state machine; [`ViewRunner`] adds the
//! background loading and result channel around it.

pub mod machine;
pub mod runner;

pub use machine::{Completion, CycleToken, QueryStatus, ViewMachine, ViewSnapshot};
pub use runner::{ViewLoader, ViewRunner};
