//! Client for the footy backend: accounts, favorites, and the list of
//! countries that have leagues.
//!
//! Backend responses are never cached; they change with user actions.

pub mod client;

pub use client::{BackendClient, CountryFlag, FavoriteKind, Favorites, SignupData, User};
