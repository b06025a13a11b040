use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::fetch::{FetchError, Payload};

use super::parse_response;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompetitionKind {
    League,
    Cup,
}

impl CompetitionKind {
    /// The API's `league.type` value ("League" / "Cup").
    pub fn from_api_type(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "league" => Some(CompetitionKind::League),
            "cup" => Some(CompetitionKind::Cup),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompetitionKind::League => "league",
            CompetitionKind::Cup => "cup",
        }
    }
}

impl fmt::Display for CompetitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompetitionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_api_type(s).ok_or_else(|| format!("unknown competition kind '{}' (expected league or cup)", s))
    }
}

/// Header of a league or cup page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompetitionInfo {
    pub id: i64,
    pub name: String,
    pub kind: CompetitionKind,
    pub season: i32,
    pub country: String,
    pub logo: Option<String>,
    pub flag: Option<String>,
}

/// Entry of a country's competition list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompetitionRef {
    pub id: i64,
    pub name: String,
    pub kind: CompetitionKind,
    pub logo: Option<String>,
}

/// Choices offered by the team screen's league selector.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LeagueChoice {
    /// National teams of the country rather than a league.
    Nationals { country: String },
    League(CompetitionRef),
}

impl LeagueChoice {
    pub fn name(&self) -> &str {
        match self {
            LeagueChoice::Nationals { .. } => "Nationals",
            LeagueChoice::League(league) => &league.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandingRow {
    pub rank: i32,
    pub team_id: i64,
    pub team_name: String,
    pub team_logo: Option<String>,
    pub points: i32,
    pub goals_diff: i32,
    pub played: i32,
    pub win: i32,
    pub draw: i32,
    pub lose: i32,
    pub goals_for: i32,
    pub goals_against: i32,
    pub form: Option<String>,
    pub group: Option<String>,
}

/// A country's leagues and cups, split by type.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CountryCompetitions {
    pub country: String,
    pub flag: Option<String>,
    pub leagues: Vec<CompetitionRef>,
    pub cups: Vec<CompetitionRef>,
}

// ============================================================================
// API response shapes
// ============================================================================

#[derive(Debug, Deserialize)]
struct ApiLeague {
    id: i64,
    name: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    logo: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiCountry {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    flag: Option<String>,
}

/// Element of `leagues?id=` / `leagues?country=`.
#[derive(Debug, Deserialize)]
struct ApiLeagueEntry {
    league: ApiLeague,
    #[serde(default)]
    country: ApiCountry,
}

/// Element of `standings?league=&season=`.
#[derive(Debug, Deserialize)]
struct ApiStandingsEntry {
    league: ApiStandingsLeague,
}

#[derive(Debug, Deserialize)]
struct ApiStandingsLeague {
    id: i64,
    name: String,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    logo: Option<String>,
    #[serde(default)]
    flag: Option<String>,
    season: i32,
    #[serde(default)]
    standings: Vec<Vec<ApiStanding>>,
}

#[derive(Debug, Deserialize)]
struct ApiStanding {
    rank: i32,
    team: ApiStandingTeam,
    #[serde(default)]
    points: i32,
    #[serde(rename = "goalsDiff", default)]
    goals_diff: i32,
    #[serde(default)]
    group: Option<String>,
    #[serde(default)]
    form: Option<String>,
    #[serde(default)]
    all: ApiRecord,
}

#[derive(Debug, Deserialize)]
struct ApiStandingTeam {
    id: i64,
    name: String,
    #[serde(default)]
    logo: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiRecord {
    #[serde(default)]
    played: Option<i32>,
    #[serde(default)]
    win: Option<i32>,
    #[serde(default)]
    draw: Option<i32>,
    #[serde(default)]
    lose: Option<i32>,
    #[serde(default)]
    goals: ApiGoals,
}

#[derive(Debug, Default, Deserialize)]
struct ApiGoals {
    #[serde(rename = "for", default)]
    scored: Option<i32>,
    #[serde(default)]
    against: Option<i32>,
}

impl ApiStanding {
    fn to_row(&self) -> StandingRow {
        StandingRow {
            rank: self.rank,
            team_id: self.team.id,
            team_name: self.team.name.clone(),
            team_logo: self.team.logo.clone(),
            points: self.points,
            goals_diff: self.goals_diff,
            played: self.all.played.unwrap_or(0),
            win: self.all.win.unwrap_or(0),
            draw: self.all.draw.unwrap_or(0),
            lose: self.all.lose.unwrap_or(0),
            goals_for: self.all.goals.scored.unwrap_or(0),
            goals_against: self.all.goals.against.unwrap_or(0),
            form: self.form.clone(),
            group: self.group.clone(),
        }
    }
}

impl ApiLeagueEntry {
    fn to_ref(&self) -> Option<CompetitionRef> {
        let kind = self.league.kind.as_deref().and_then(CompetitionKind::from_api_type)?;
        Some(CompetitionRef {
            id: self.league.id,
            name: self.league.name.clone(),
            kind,
            logo: self.league.logo.clone(),
        })
    }
}

// ============================================================================
// Payload accessors
// ============================================================================

/// Country named by a `standings` payload (`response[0].league.country`).
pub fn standings_country(payload: &Payload) -> Option<String> {
    payload
        .pointer("/response/0/league/country")
        .and_then(|c| c.as_str())
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}

/// Country named by a `leagues?id=` payload (`response[0].country.name`).
pub fn competition_country(payload: &Payload) -> Option<String> {
    payload
        .pointer("/response/0/country/name")
        .and_then(|c| c.as_str())
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}

/// League header and table groups from a `standings` payload.
pub fn parse_standings(payload: &Payload) -> Result<(CompetitionInfo, Vec<Vec<StandingRow>>), FetchError> {
    let entries: Vec<ApiStandingsEntry> = parse_response(payload, "standings")?;
    let entry = entries
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::MalformedPayload("standings: empty response".to_string()))?;
    let league = entry.league;

    let info = CompetitionInfo {
        id: league.id,
        name: league.name,
        kind: CompetitionKind::League,
        season: league.season,
        country: league.country.unwrap_or_default(),
        logo: league.logo,
        flag: league.flag,
    };
    let table = league
        .standings
        .iter()
        .map(|group| group.iter().map(ApiStanding::to_row).collect())
        .collect();
    Ok((info, table))
}

/// Cup header from a `leagues?id=` payload.
pub fn parse_competition(payload: &Payload, season: i32) -> Result<CompetitionInfo, FetchError> {
    let entries: Vec<ApiLeagueEntry> = parse_response(payload, "competition")?;
    let entry = entries
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::MalformedPayload("competition: empty response".to_string()))?;
    let kind = entry
        .league
        .kind
        .as_deref()
        .and_then(CompetitionKind::from_api_type)
        .unwrap_or(CompetitionKind::Cup);

    Ok(CompetitionInfo {
        id: entry.league.id,
        name: entry.league.name,
        kind,
        season,
        country: entry.country.name.unwrap_or_default(),
        logo: entry.league.logo,
        flag: entry.country.flag,
    })
}

/// Split a `leagues?country=` payload into leagues and cups.
pub fn parse_country_competitions(payload: &Payload, country: &str) -> Result<CountryCompetitions, FetchError> {
    let entries: Vec<ApiLeagueEntry> = parse_response(payload, "country competitions")?;
    let flag = entries.iter().find_map(|e| e.country.flag.clone());

    let mut competitions = CountryCompetitions {
        country: country.to_string(),
        flag,
        ..Default::default()
    };
    for competition in entries.iter().filter_map(ApiLeagueEntry::to_ref) {
        match competition.kind {
            CompetitionKind::League => competitions.leagues.push(competition),
            CompetitionKind::Cup => competitions.cups.push(competition),
        }
    }
    Ok(competitions)
}

/// Round names from a `fixtures/rounds` payload.
pub fn parse_rounds(payload: &Payload) -> Result<Vec<String>, FetchError> {
    parse_response(payload, "rounds")
}

/// Season years from a `leagues/seasons` payload.
pub fn parse_seasons(payload: &Payload) -> Result<Vec<i32>, FetchError> {
    parse_response(payload, "seasons")
}
