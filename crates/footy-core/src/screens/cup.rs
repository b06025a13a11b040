use futures::future::{BoxFuture, FutureExt};
use serde::Serialize;

use super::ScreenContext;
use crate::fetch::{DependentChain, FetchError};
use crate::models::competition::parse_rounds;
use crate::models::fixture::parse_fixtures;
use crate::models::FixtureSummary;
use crate::view::ViewLoader;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CupRoundParams {
    pub id: i64,
    pub season: i32,
    /// `None` selects the latest round.
    pub round: Option<String>,
    pub timezone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CupRoundPage {
    pub round: String,
    pub rounds: Vec<String>,
    pub fixtures: Vec<FixtureSummary>,
}

/// Fixtures of one cup round.
#[derive(Debug, Clone)]
pub struct CupRoundScreen {
    ctx: ScreenContext,
}

impl CupRoundScreen {
    pub fn new(ctx: ScreenContext) -> Self {
        Self { ctx }
    }

    pub fn params(&self, id: i64, season: i32, round: Option<String>) -> CupRoundParams {
        CupRoundParams {
            id,
            season,
            round,
            timezone: self.ctx.timezone.clone(),
        }
    }

    /// rounds → fixtures of the chosen round
    pub fn chain(&self, params: &CupRoundParams) -> DependentChain {
        let client = self.ctx.client.clone();
        let CupRoundParams {
            id,
            season,
            round,
            timezone,
        } = params.clone();

        DependentChain::new(
            format!("cup {} {} round", id, season),
            self.ctx.client.cup_rounds(id, season),
        )
        .then("fixtures", move |rounds| {
            let round = pick_round(&parse_rounds(rounds)?, round.as_deref())?;
            Ok(client.round_fixtures(id, season, &round, &timezone))
        })
    }

    pub async fn load_page(&self, params: CupRoundParams) -> Result<CupRoundPage, FetchError> {
        let resolution = self.ctx.resolver.resolve(self.chain(&params)).await?;
        let rounds = resolution
            .stage(0)
            .ok_or_else(|| FetchError::MalformedPayload("cup round chain came back short".to_string()))?;
        let rounds = parse_rounds(rounds)?;
        let round = pick_round(&rounds, params.round.as_deref())?;
        let fixtures = parse_fixtures(resolution.final_payload())?;
        Ok(CupRoundPage { round, rounds, fixtures })
    }
}

/// The requested round, or the last one when none was asked for.
fn pick_round(rounds: &[String], requested: Option<&str>) -> Result<String, FetchError> {
    match requested {
        Some(round) if rounds.iter().any(|r| r == round) => Ok(round.to_string()),
        Some(round) => Err(FetchError::NotFound(format!("round '{}'", round))),
        None => rounds
            .last()
            .cloned()
            .ok_or_else(|| FetchError::NotFound("fixtures for this season yet".to_string())),
    }
}

impl ViewLoader for CupRoundScreen {
    type Params = CupRoundParams;
    type Output = CupRoundPage;

    fn load(&self, params: CupRoundParams) -> BoxFuture<'static, Result<CupRoundPage, FetchError>> {
        let screen = self.clone();
        async move { screen.load_page(params).await }.boxed()
    }
}
