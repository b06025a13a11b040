//! Command-line interface parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use footy_core::backend::FavoriteKind;

/// footy - football leagues, cups and teams in the terminal
#[derive(Parser, Debug)]
#[command(name = "footy")]
#[command(about = "Football leagues, cups and teams from the command line")]
#[command(version)]
pub struct Cli {
    /// Print JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Keep API responses in memory only, ignoring the on-disk cache
    #[arg(long, global = true)]
    pub memory_cache: bool,

    /// Also write logs to this file (RUST_LOG controls the level)
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// League table and the other competitions of its country
    League(CompetitionArgs),

    /// Cup rounds, and the fixtures of one round
    Cup {
        #[command(flatten)]
        competition: CompetitionArgs,

        /// Round to show (defaults to the latest)
        #[arg(long)]
        round: Option<String>,
    },

    /// Team profile and the leagues of its country
    Team {
        /// Team ID (defaults to the configured team)
        id: Option<i64>,

        /// Also list the teams of this league (or "nationals")
        #[arg(long, value_name = "LEAGUE", value_parser = parse_teams_filter)]
        teams: Option<TeamsFilter>,
    },

    /// Seasons covered by the football API
    Seasons,

    /// Log in to the footy backend and remember the session
    Login {
        /// Username (defaults to the last one used)
        username: Option<String>,
    },

    /// Create a backend account and log in with it
    Signup {
        /// Username for the new account
        username: String,

        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(long)]
        email: String,
    },

    /// Forget the saved session
    Logout,

    /// Show or change favorites of the logged-in user
    Favorites {
        #[command(subcommand)]
        action: Option<FavoriteAction>,
    },

    /// Inspect or clear the response cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Args, Debug, Clone, Copy)]
pub struct CompetitionArgs {
    /// League or cup ID (defaults to the configured league)
    pub id: Option<i64>,

    /// Season year (defaults to the configured season)
    pub season: Option<i32>,
}

#[derive(Subcommand, Debug)]
pub enum FavoriteAction {
    Add {
        #[arg(value_parser = parse_favorite_kind)]
        kind: FavoriteKind,
        id: i64,
    },
    Remove {
        #[arg(value_parser = parse_favorite_kind)]
        kind: FavoriteKind,
        id: i64,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheAction {
    /// Delete every cached response
    Clear,
    /// Cached responses with their age, and where they live
    Stats,
}

/// Team list selector of `footy team --teams`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeamsFilter {
    Nationals,
    League(i64),
}

pub fn parse_favorite_kind(s: &str) -> Result<FavoriteKind, String> {
    s.parse()
}

pub fn parse_teams_filter(s: &str) -> Result<TeamsFilter, String> {
    if s.eq_ignore_ascii_case("nationals") {
        return Ok(TeamsFilter::Nationals);
    }
    s.parse::<i64>()
        .map(TeamsFilter::League)
        .map_err(|_| format!("Invalid league: '{}'. Use a league ID or \"nationals\"", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_league_defaults() {
        let cli = Cli::parse_from(["footy", "league"]);
        assert!(!cli.json);
        match cli.command {
            Command::League(args) => {
                assert!(args.id.is_none());
                assert!(args.season.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_cup_with_round_and_global_flags() {
        let cli = Cli::parse_from(["footy", "cup", "45", "2023", "--round", "Final", "--json", "--memory-cache"]);
        assert!(cli.json);
        assert!(cli.memory_cache);
        match cli.command {
            Command::Cup { competition, round } => {
                assert_eq!(competition.id, Some(45));
                assert_eq!(competition.season, Some(2023));
                assert_eq!(round.as_deref(), Some("Final"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_favorites_add() {
        let cli = Cli::parse_from(["footy", "favorites", "add", "team", "33"]);
        match cli.command {
            Command::Favorites {
                action: Some(FavoriteAction::Add { kind, id }),
            } => {
                assert_eq!(kind, FavoriteKind::Team);
                assert_eq!(id, 33);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_signup_requires_profile() {
        assert!(Cli::try_parse_from(["footy", "signup", "gunner"]).is_err());
        let cli = Cli::parse_from([
            "footy", "signup", "gunner", "--first-name", "Bukayo", "--last-name", "Saka", "--email", "b@example.com",
        ]);
        match cli.command {
            Command::Signup { username, email, .. } => {
                assert_eq!(username, "gunner");
                assert_eq!(email, "b@example.com");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_bad_favorite_kind_rejected() {
        assert!(Cli::try_parse_from(["footy", "favorites", "add", "player", "1"]).is_err());
    }

    #[test]
    fn test_team_with_nationals() {
        let cli = Cli::parse_from(["footy", "team", "6", "--teams", "nationals"]);
        match cli.command {
            Command::Team { id, teams } => {
                assert_eq!(id, Some(6));
                assert_eq!(teams, Some(TeamsFilter::Nationals));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_teams_filter() {
        assert_eq!(parse_teams_filter("Nationals").unwrap(), TeamsFilter::Nationals);
        assert_eq!(parse_teams_filter("39").unwrap(), TeamsFilter::League(39));
        assert!(parse_teams_filter("premier").is_err());
    }
}
