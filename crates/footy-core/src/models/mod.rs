//! Typed views over football API payloads.
//!
//! Responses are cached as raw JSON. Screens parse them into these types on
//! the way out, so a shape change in the API surfaces as
//! `FetchError::MalformedPayload` rather than a cached failure.
//!
//! - `CompetitionInfo`, `CompetitionRef`, `StandingRow`: leagues and cups
//! - `FixtureSummary`: one match of a cup round
//! - `TeamProfile`, `Venue`: team pages

pub mod competition;
pub mod fixture;
pub mod team;

pub use competition::{
    CompetitionInfo, CompetitionKind, CompetitionRef, CountryCompetitions, LeagueChoice, StandingRow,
};
pub use fixture::{FixtureSide, FixtureSummary};
pub use team::{TeamProfile, Venue};

use serde::de::DeserializeOwned;
use tracing::error;

use crate::fetch::{FetchError, Payload};

/// Whether the API envelope carries at least one result.
pub fn has_results(payload: &Payload) -> bool {
    payload
        .get("response")
        .and_then(|r| r.as_array())
        .is_some_and(|r| !r.is_empty())
}

/// Deserialize the `response` array of an API envelope.
pub fn parse_response<T: DeserializeOwned>(payload: &Payload, what: &str) -> Result<Vec<T>, FetchError> {
    let response = payload
        .get("response")
        .cloned()
        .ok_or_else(|| malformed(what, "missing `response` field"))?;
    serde_json::from_value(response).map_err(|e| malformed(what, &e.to_string()))
}

fn malformed(what: &str, detail: &str) -> FetchError {
    error!(what, detail, "Unexpected football API payload");
    FetchError::MalformedPayload(format!("{}: {}", what, detail))
}
