use serde::{Deserialize, Serialize};

use crate::fetch::{FetchError, Payload};

use super::parse_response;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Venue {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub city: Option<String>,
    pub capacity: Option<i64>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamProfile {
    pub id: i64,
    pub name: String,
    pub code: Option<String>,
    pub country: Option<String>,
    pub founded: Option<i32>,
    pub national: bool,
    pub logo: Option<String>,
    pub venue: Venue,
}

impl TeamProfile {
    pub fn display_name(&self) -> String {
        if self.national {
            format!("{} National Team", self.name)
        } else {
            self.name.clone()
        }
    }

    /// Country used to look up the team's leagues. National teams may come
    /// without one, their name is the country.
    pub fn country_name(&self) -> &str {
        self.country.as_deref().filter(|c| !c.is_empty()).unwrap_or(&self.name)
    }

    pub fn founded_display(&self) -> String {
        self.founded.map(|y| y.to_string()).unwrap_or_else(|| "-".to_string())
    }
}

#[derive(Debug, Deserialize)]
struct ApiTeamEntry {
    team: ApiTeam,
    #[serde(default)]
    venue: ApiVenue,
}

#[derive(Debug, Deserialize)]
struct ApiTeam {
    id: i64,
    name: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    founded: Option<i32>,
    #[serde(default)]
    national: bool,
    #[serde(default)]
    logo: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiVenue {
    #[serde(default)]
    id: Option<i64>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    capacity: Option<i64>,
    #[serde(default)]
    image: Option<String>,
}

impl ApiTeamEntry {
    fn to_profile(&self) -> TeamProfile {
        TeamProfile {
            id: self.team.id,
            name: self.team.name.clone(),
            code: self.team.code.clone(),
            country: self.team.country.clone(),
            founded: self.team.founded,
            national: self.team.national,
            logo: self.team.logo.clone(),
            venue: Venue {
                id: self.venue.id,
                name: self.venue.name.clone(),
                city: self.venue.city.clone(),
                capacity: self.venue.capacity,
                image: self.venue.image.clone(),
            },
        }
    }
}

/// Every team of a `teams?...` payload.
pub fn parse_teams(payload: &Payload) -> Result<Vec<TeamProfile>, FetchError> {
    let entries: Vec<ApiTeamEntry> = parse_response(payload, "teams")?;
    Ok(entries.iter().map(ApiTeamEntry::to_profile).collect())
}

/// First team of a `teams?id=` payload.
pub fn parse_team(payload: &Payload) -> Result<TeamProfile, FetchError> {
    parse_teams(payload)?
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::MalformedPayload("teams: empty response".to_string()))
}

/// Country named by a `teams?id=` payload.
pub fn team_country(payload: &Payload) -> Option<String> {
    let team = payload.pointer("/response/0/team")?;
    team.get("country")
        .and_then(|c| c.as_str())
        .filter(|c| !c.is_empty())
        .or_else(|| team.get("name").and_then(|n| n.as_str()))
        .map(str::to_string)
}

/// Case-insensitive sort by name.
pub fn sort_by_name(teams: &mut [TeamProfile]) {
    teams.sort_by_key(|t| t.name.to_lowercase());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn team_payload() -> Payload {
        json!({"response": [{
            "team": {"id": 33, "name": "Manchester United", "code": "MUN", "country": "England", "founded": 1878, "national": false, "logo": "mu.png"},
            "venue": {"id": 556, "name": "Old Trafford", "city": "Manchester", "capacity": 76212, "image": "ot.png"}
        }]})
    }

    #[test]
    fn test_parse_team() {
        let team = parse_team(&team_payload()).unwrap();
        assert_eq!(team.display_name(), "Manchester United");
        assert_eq!(team.venue.name.as_deref(), Some("Old Trafford"));
        assert_eq!(team.venue.capacity, Some(76212));
        assert_eq!(team.founded_display(), "1878");
        assert_eq!(team_country(&team_payload()).as_deref(), Some("England"));
    }

    #[test]
    fn test_national_team_falls_back_to_name() {
        let payload = json!({"response": [{"team": {"id": 6, "name": "Brazil", "national": true}}]});
        let team = parse_team(&payload).unwrap();
        assert_eq!(team.display_name(), "Brazil National Team");
        assert_eq!(team.country_name(), "Brazil");
        assert_eq!(team.founded_display(), "-");
        assert_eq!(team.venue, Venue::default());
        assert_eq!(team_country(&payload).as_deref(), Some("Brazil"));
    }

    #[test]
    fn test_sort_by_name_ignores_case() {
        let payload = json!({"response": [
            {"team": {"id": 1, "name": "wolves"}},
            {"team": {"id": 2, "name": "Arsenal"}},
            {"team": {"id": 3, "name": "brentford"}}
        ]});
        let mut teams = parse_teams(&payload).unwrap();
        sort_by_name(&mut teams);
        let names: Vec<_> = teams.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Arsenal", "brentford", "wolves"]);
    }
}
