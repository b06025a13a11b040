use futures::future::{BoxFuture, FutureExt};
use serde::Serialize;

use super::ScreenContext;
use crate::fetch::{DependentChain, FetchError};
use crate::models::competition::parse_country_competitions;
use crate::models::team::{parse_team, parse_teams, sort_by_name, team_country};
use crate::models::{LeagueChoice, TeamProfile};
use crate::view::ViewLoader;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TeamsParams {
    pub team_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamPage {
    pub team: TeamProfile,
    pub country: String,
    /// "Nationals" first, then the country's leagues.
    pub leagues: Vec<LeagueChoice>,
}

/// Team page plus the country / league / team selectors.
#[derive(Debug, Clone)]
pub struct TeamsScreen {
    ctx: ScreenContext,
}

impl TeamsScreen {
    pub fn new(ctx: ScreenContext) -> Self {
        Self { ctx }
    }

    /// team → leagues of the team's country
    pub fn chain(&self, team_id: i64) -> DependentChain {
        let client = self.ctx.client.clone();
        DependentChain::new(format!("team {}", team_id), self.ctx.client.team_by_id(team_id)).then(
            "country competitions",
            move |team| {
                let country = team_country(team)
                    .ok_or_else(|| FetchError::NotFound(format!("country of team {}", team_id)))?;
                Ok(client.country_competitions(&country))
            },
        )
    }

    pub async fn load_page(&self, params: TeamsParams) -> Result<TeamPage, FetchError> {
        let resolution = self.ctx.resolver.resolve(self.chain(params.team_id)).await?;
        let team_payload = resolution
            .stage(0)
            .ok_or_else(|| FetchError::MalformedPayload("team chain came back short".to_string()))?;
        let team = parse_team(team_payload)?;
        let country = team.country_name().to_string();
        let competitions = parse_country_competitions(resolution.final_payload(), &country)?;

        let mut leagues = Vec::with_capacity(competitions.leagues.len() + 1);
        leagues.push(LeagueChoice::Nationals {
            country: country.clone(),
        });
        leagues.extend(competitions.leagues.into_iter().map(LeagueChoice::League));

        Ok(TeamPage { team, country, leagues })
    }

    /// Teams of a league in the default season, sorted by name.
    pub async fn league_teams(&self, league_id: i64) -> Result<Vec<TeamProfile>, FetchError> {
        let request = self.ctx.client.league_teams(league_id, self.ctx.default_season);
        let payload = self.ctx.resolver.fetch_one(request).await?;
        let mut teams = parse_teams(&payload)?;
        sort_by_name(&mut teams);
        Ok(teams)
    }

    pub async fn national_teams(&self, country: &str) -> Result<Vec<TeamProfile>, FetchError> {
        let payload = self.ctx.resolver.fetch_one(self.ctx.client.country_teams(country)).await?;
        Ok(parse_teams(&payload)?.into_iter().filter(|t| t.national).collect())
    }

    /// Teams behind one entry of the league selector.
    pub async fn teams_for(&self, choice: &LeagueChoice) -> Result<Vec<TeamProfile>, FetchError> {
        match choice {
            LeagueChoice::Nationals { country } => self.national_teams(country).await,
            LeagueChoice::League(league) => self.league_teams(league.id).await,
        }
    }
}

impl ViewLoader for TeamsScreen {
    type Params = TeamsParams;
    type Output = TeamPage;

    fn load(&self, params: TeamsParams) -> BoxFuture<'static, Result<TeamPage, FetchError>> {
        let screen = self.clone();
        async move { screen.load_page(params).await }.boxed()
    }
}
