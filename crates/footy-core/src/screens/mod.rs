//! Screen loaders: the dependent fetch chains behind each page.
//!
//! Every screen implements [`ViewLoader`](crate::view::ViewLoader), so it
//! can be driven by a [`ViewRunner`](crate::view::ViewRunner). All screens
//! share one [`ScreenContext`] and therefore one cache and one in-flight
//! table: the country list fetched for a league page is reused by the team
//! page of a club from the same country.

pub mod competition;
pub mod cup;
pub mod teams;

pub use competition::{CompetitionBody, CompetitionPage, CompetitionParams, CompetitionScreen, SeasonsScreen};
pub use cup::{CupRoundPage, CupRoundParams, CupRoundScreen};
pub use teams::{TeamPage, TeamsParams, TeamsScreen};

use std::sync::Arc;

use crate::api::FootballClient;
use crate::config::Config;
use crate::fetch::{FetchOrchestrator, QueryResolver};

/// What every screen needs to build and run its requests.
#[derive(Debug, Clone)]
pub struct ScreenContext {
    pub client: FootballClient,
    pub resolver: QueryResolver,
    pub timezone: String,
    pub default_season: i32,
}

impl ScreenContext {
    pub fn new(client: FootballClient, orchestrator: Arc<FetchOrchestrator>, config: &Config) -> Self {
        Self {
            client,
            resolver: QueryResolver::new(orchestrator),
            timezone: config.timezone().to_string(),
            default_season: config.season(),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use crate::api::{FootballClient, ONE_DAY};
    use crate::cache::{CacheKey, TtlCache};
    use crate::config::{ApiSettings, Config};
    use crate::fetch::{FetchOrchestrator, Payload};

    use super::ScreenContext;

    /// Context whose network calls all fail: nothing listens on port 9.
    /// Tests seed the cache with the payloads a screen should see.
    pub fn offline_context() -> ScreenContext {
        let client = FootballClient::new(&ApiSettings::with_base_url("http://127.0.0.1:9/v3/")).unwrap();
        let orchestrator = Arc::new(FetchOrchestrator::new(Arc::new(TtlCache::in_memory())));
        ScreenContext::new(client, orchestrator, &Config::default())
    }

    pub fn seed(ctx: &ScreenContext, key: &str, payload: Payload) {
        ctx.resolver
            .orchestrator()
            .cache()
            .set(&CacheKey::raw(key), payload, ONE_DAY)
            .unwrap();
    }
}
