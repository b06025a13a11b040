use futures::future::{BoxFuture, FutureExt};
use serde::Serialize;

use super::ScreenContext;
use crate::fetch::{DependentChain, FetchError};
use crate::models::competition::{
    competition_country, parse_competition, parse_country_competitions, parse_rounds, parse_seasons,
    parse_standings, standings_country,
};
use crate::models::{CompetitionInfo, CompetitionKind, CountryCompetitions, StandingRow};
use crate::view::ViewLoader;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CompetitionParams {
    pub kind: CompetitionKind,
    pub id: i64,
    pub season: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum CompetitionBody {
    /// League table, one list per group.
    Table(Vec<Vec<StandingRow>>),
    /// Cup round names in competition order.
    Rounds(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompetitionPage {
    pub info: CompetitionInfo,
    pub body: CompetitionBody,
    /// Other leagues and cups of the same country.
    pub country: CountryCompetitions,
}

/// League and cup pages.
#[derive(Debug, Clone)]
pub struct CompetitionScreen {
    ctx: ScreenContext,
}

impl CompetitionScreen {
    pub fn new(ctx: ScreenContext) -> Self {
        Self { ctx }
    }

    /// standings → leagues of the standings' country
    pub fn league_chain(&self, id: i64, season: i32) -> DependentChain {
        let client = self.ctx.client.clone();
        DependentChain::new(
            format!("league {} {}", id, season),
            self.ctx.client.standings(id, season),
        )
        .then("country competitions", move |standings| {
            let country = standings_country(standings)
                .ok_or_else(|| FetchError::NotFound(format!("country of league {}", id)))?;
            Ok(client.country_competitions(&country))
        })
    }

    /// rounds → the cup itself (for its country) → leagues of that country
    pub fn cup_chain(&self, id: i64, season: i32) -> DependentChain {
        let cup_client = self.ctx.client.clone();
        let country_client = self.ctx.client.clone();
        DependentChain::new(
            format!("cup {} {}", id, season),
            self.ctx.client.cup_rounds(id, season),
        )
        .then("cup", move |_rounds| Ok(cup_client.competition_by_id(id)))
        .then("country competitions", move |cup| {
            let country = competition_country(cup)
                .ok_or_else(|| FetchError::NotFound(format!("country of cup {}", id)))?;
            Ok(country_client.country_competitions(&country))
        })
    }

    pub async fn load_page(&self, params: CompetitionParams) -> Result<CompetitionPage, FetchError> {
        match params.kind {
            CompetitionKind::League => {
                let resolution = self.ctx.resolver.resolve(self.league_chain(params.id, params.season)).await?;
                let mut payloads = resolution.into_payloads().into_iter();
                let (standings, competitions) = match (payloads.next(), payloads.next()) {
                    (Some(s), Some(c)) => (s, c),
                    _ => return Err(FetchError::MalformedPayload("league chain came back short".to_string())),
                };

                let (info, table) = parse_standings(&standings)?;
                let country = parse_country_competitions(&competitions, &info.country)?;
                Ok(CompetitionPage {
                    info,
                    body: CompetitionBody::Table(table),
                    country,
                })
            }
            CompetitionKind::Cup => {
                let resolution = self.ctx.resolver.resolve(self.cup_chain(params.id, params.season)).await?;
                let mut payloads = resolution.into_payloads().into_iter();
                let (rounds, cup, competitions) = match (payloads.next(), payloads.next(), payloads.next()) {
                    (Some(r), Some(c), Some(l)) => (r, c, l),
                    _ => return Err(FetchError::MalformedPayload("cup chain came back short".to_string())),
                };

                let info = parse_competition(&cup, params.season)?;
                let country = parse_country_competitions(&competitions, &info.country)?;
                Ok(CompetitionPage {
                    info,
                    body: CompetitionBody::Rounds(parse_rounds(&rounds)?),
                    country,
                })
            }
        }
    }

    /// Every season the API covers, newest first.
    pub async fn seasons(&self) -> Result<Vec<i32>, FetchError> {
        let payload = self.ctx.resolver.fetch_one(self.ctx.client.seasons()).await?;
        let mut seasons = parse_seasons(&payload)?;
        seasons.sort_unstable_by(|a, b| b.cmp(a));
        Ok(seasons)
    }
}

impl ViewLoader for CompetitionScreen {
    type Params = CompetitionParams;
    type Output = CompetitionPage;

    fn load(&self, params: CompetitionParams) -> BoxFuture<'static, Result<CompetitionPage, FetchError>> {
        let screen = self.clone();
        async move { screen.load_page(params).await }.boxed()
    }
}

/// The season selector, loaded on its own.
#[derive(Debug, Clone)]
pub struct SeasonsScreen {
    inner: CompetitionScreen,
}

impl SeasonsScreen {
    pub fn new(ctx: ScreenContext) -> Self {
        Self {
            inner: CompetitionScreen::new(ctx),
        }
    }
}

impl ViewLoader for SeasonsScreen {
    type Params = ();
    type Output = Vec<i32>;

    fn load(&self, _: ()) -> BoxFuture<'static, Result<Vec<i32>, FetchError>> {
        let screen = self.inner.clone();
        async move { screen.seasons().await }.boxed()
    }
}
