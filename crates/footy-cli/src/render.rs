//! Plain-text and JSON output.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use footy_core::backend::Favorites;
use footy_core::cache::CacheEntry;
use footy_core::models::{CompetitionRef, StandingRow, TeamProfile};
use footy_core::screens::{CompetitionBody, CompetitionPage, CupRoundPage, TeamPage};

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn competition(page: &CompetitionPage) -> String {
    let mut out = String::new();
    let info = &page.info;
    out.push_str(&format!(
        "{} ({}, {} {})\n",
        info.name,
        info.country,
        info.kind,
        season_label(info.season)
    ));

    match &page.body {
        CompetitionBody::Table(groups) => {
            for group in groups {
                if groups.len() > 1 {
                    if let Some(name) = group.first().and_then(|row| row.group.as_deref()) {
                        out.push_str(&format!("\n{}\n", name));
                    }
                }
                out.push_str(&standings_table(group));
            }
        }
        CompetitionBody::Rounds(rounds) => {
            out.push_str("\nRounds:\n");
            for round in rounds {
                out.push_str(&format!("  {}\n", round));
            }
        }
    }

    out.push_str(&competition_list("Leagues", &page.country.leagues));
    out.push_str(&competition_list("Cups", &page.country.cups));
    out
}

fn standings_table(rows: &[StandingRow]) -> String {
    let mut out = format!(
        "\n{:>3}  {:<28} {:>3} {:>3} {:>3} {:>3} {:>7} {:>4} {:>4}\n",
        "#", "Team", "P", "W", "D", "L", "Goals", "GD", "Pts"
    );
    for row in rows {
        out.push_str(&format!(
            "{:>3}  {:<28} {:>3} {:>3} {:>3} {:>3} {:>7} {:>4} {:>4}\n",
            row.rank,
            truncate(&row.team_name, 28),
            row.played,
            row.win,
            row.draw,
            row.lose,
            format!("{}:{}", row.goals_for, row.goals_against),
            row.goals_diff,
            row.points
        ));
    }
    out
}

fn competition_list(title: &str, competitions: &[CompetitionRef]) -> String {
    if competitions.is_empty() {
        return String::new();
    }
    let mut out = format!("\n{}:\n", title);
    for c in competitions {
        out.push_str(&format!("  {:>5}  {}\n", c.id, c.name));
    }
    out
}

pub fn cup_round(page: &CupRoundPage) -> String {
    let mut out = format!("{}\n\n", page.round);
    for fixture in &page.fixtures {
        out.push_str(&format!(
            "  {}  {:>24} {:^7} {}\n",
            fixture.kickoff_display(),
            truncate(&fixture.home.name, 24),
            fixture.score_display(),
            fixture.away.name
        ));
    }
    if page.fixtures.is_empty() {
        out.push_str("  No fixtures in this round.\n");
    }
    out
}

pub fn team(page: &TeamPage) -> String {
    let team = &page.team;
    let mut out = format!("{} ({})\n", team.display_name(), team.country_name().to_uppercase());
    out.push_str(&format!("  Founded:  {}\n", team.founded_display()));
    if let Some(venue) = &team.venue.name {
        out.push_str(&format!("  Venue:    {}", venue));
        if let Some(city) = &team.venue.city {
            out.push_str(&format!(", {}", city));
        }
        if let Some(capacity) = team.venue.capacity {
            out.push_str(&format!(" ({} seats)", capacity));
        }
        out.push('\n');
    }
    out.push_str(&format!("\nLeagues in {}:\n", page.country));
    for choice in &page.leagues {
        out.push_str(&format!("  {}\n", choice.name()));
    }
    out
}

pub fn team_list(teams: &[TeamProfile]) -> String {
    let mut out = String::new();
    for team in teams {
        out.push_str(&format!("  {:>6}  {}\n", team.id, team.display_name()));
    }
    out
}

pub fn seasons(seasons: &[i32]) -> String {
    seasons
        .iter()
        .map(|s| season_label(*s))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn favorites(favorites: &Favorites) -> String {
    let ids = |ids: &[i64]| {
        if ids.is_empty() {
            "-".to_string()
        } else {
            ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(", ")
        }
    };
    format!(
        "Leagues: {}\nCups:    {}\nTeams:   {}",
        ids(&favorites.leagues),
        ids(&favorites.cups),
        ids(&favorites.teams)
    )
}

/// One line per entry: age, then key; expired entries are marked.
pub fn cache_entries(entries: &[CacheEntry], now: DateTime<Utc>) -> String {
    let mut out = String::new();
    for entry in entries {
        let marker = if entry.is_valid_at(now) { "" } else { "  (expired)" };
        out.push_str(&format!("  {:>9}  {}{}
", entry.age_display(now), entry.key, marker));
    }
    out
}

/// "2023-24" for a season starting in 2023.
fn season_label(season: i32) -> String {
    format!("{}-{:02}", season, (season + 1).rem_euclid(100))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut t: String = s.chars().take(max.saturating_sub(1)).collect();
        t.push('…');
        t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_season_label() {
        assert_eq!(season_label(2023), "2023-24");
        assert_eq!(season_label(1999), "1999-00");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Arsenal", 28), "Arsenal");
        assert_eq!(truncate("Wolverhampton Wanderers", 10).chars().count(), 10);
    }

    #[test]
    fn test_cache_entries_show_age_and_expiry() {
        let stored = DateTime::<Utc>::UNIX_EPOCH;
        let entries = vec![
            CacheEntry::new("leagues/seasons", serde_json::json!([]), stored, 86_400_000),
            CacheEntry::new("standings?league=39&season=2023", serde_json::json!([]), stored, 60_000),
        ];
        let text = cache_entries(&entries, stored + chrono::Duration::hours(3));
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0].trim(), "3h ago  leagues/seasons");
        assert!(lines[1].ends_with("standings?league=39&season=2023  (expired)"));
    }

    #[test]
    fn test_favorites() {
        let favs = Favorites {
            leagues: vec![39, 140],
            cups: vec![],
            teams: vec![33],
        };
        let text = favorites(&favs);
        assert!(text.contains("Leagues: 39, 140"));
        assert!(text.contains("Cups:    -"));
    }
}
