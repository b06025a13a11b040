use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::fetch::{FetchError, Payload};

use super::parse_response;

/// Status code of a match that has not kicked off.
const NOT_STARTED: &str = "NS";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FixtureSide {
    pub id: i64,
    pub name: String,
    pub logo: Option<String>,
    pub winner: Option<bool>,
    pub goals: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FixtureSummary {
    pub id: i64,
    /// Kick-off in the timezone the fixtures were requested for.
    pub kickoff: DateTime<FixedOffset>,
    pub status: String,
    pub home: FixtureSide,
    pub away: FixtureSide,
}

impl FixtureSummary {
    pub fn has_started(&self) -> bool {
        self.status != NOT_STARTED
    }

    /// "2 - 1" once started, " - " before kick-off. Unknown goals stay blank.
    pub fn score_display(&self) -> String {
        if !self.has_started() {
            return " - ".to_string();
        }
        let goals = |g: Option<i32>| g.map(|g| g.to_string()).unwrap_or_default();
        format!("{} - {}", goals(self.home.goals), goals(self.away.goals))
    }

    /// e.g. "Jan 07 16:30"
    pub fn kickoff_display(&self) -> String {
        self.kickoff.format("%b %d %H:%M").to_string()
    }
}

#[derive(Debug, Deserialize)]
struct ApiFixtureEntry {
    fixture: ApiFixture,
    teams: ApiTeams,
    #[serde(default)]
    goals: ApiScore,
}

#[derive(Debug, Deserialize)]
struct ApiFixture {
    id: i64,
    date: DateTime<FixedOffset>,
    status: ApiStatus,
}

#[derive(Debug, Deserialize)]
struct ApiStatus {
    short: String,
}

#[derive(Debug, Deserialize)]
struct ApiTeams {
    home: ApiSide,
    away: ApiSide,
}

#[derive(Debug, Deserialize)]
struct ApiSide {
    id: i64,
    name: String,
    #[serde(default)]
    logo: Option<String>,
    #[serde(default)]
    winner: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiScore {
    #[serde(default)]
    home: Option<i32>,
    #[serde(default)]
    away: Option<i32>,
}

impl ApiSide {
    fn to_side(&self, goals: Option<i32>) -> FixtureSide {
        FixtureSide {
            id: self.id,
            name: self.name.clone(),
            logo: self.logo.clone(),
            winner: self.winner,
            goals,
        }
    }
}

impl ApiFixtureEntry {
    fn to_summary(&self) -> FixtureSummary {
        FixtureSummary {
            id: self.fixture.id,
            kickoff: self.fixture.date,
            status: self.fixture.status.short.clone(),
            home: self.teams.home.to_side(self.goals.home),
            away: self.teams.away.to_side(self.goals.away),
        }
    }
}

/// Fixtures of a `fixtures?league&season&round` payload, earliest first.
pub fn parse_fixtures(payload: &Payload) -> Result<Vec<FixtureSummary>, FetchError> {
    let entries: Vec<ApiFixtureEntry> = parse_response(payload, "fixtures")?;
    let mut fixtures: Vec<FixtureSummary> = entries.iter().map(ApiFixtureEntry::to_summary).collect();
    fixtures.sort_by_key(|f| f.kickoff);
    Ok(fixtures)
}
