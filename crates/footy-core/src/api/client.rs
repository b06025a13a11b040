use std::time::Duration;

use anyhow::Result;
use reqwest::{header, Client, Url};
use serde_json::Value;
use tracing::debug;

use super::ApiError;
use crate::cache::CacheKey;
use crate::config::ApiSettings;
use crate::fetch::{FetchError, Payload, QueryRequest};
use crate::models::has_results;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

const HEADER_API_KEY: &str = "x-rapidapi-key";
const HEADER_API_HOST: &str = "x-rapidapi-host";

pub const ONE_DAY: Duration = Duration::from_secs(24 * 60 * 60);
pub const ONE_WEEK: Duration = Duration::from_secs(7 * 24 * 60 * 60);
pub const ONE_MONTH: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Football API client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct FootballClient {
    client: Client,
    base_url: Url,
    headers: header::HeaderMap,
}

impl FootballClient {
    pub fn new(settings: &ApiSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        // Url::join drops the last path segment unless the base ends in '/'
        let mut base = settings.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| anyhow::anyhow!("Invalid API base URL '{}': {}", settings.base_url, e))?;

        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        if let Some(key) = &settings.api_key {
            headers.insert(HEADER_API_KEY, header::HeaderValue::from_str(key)?);
        }
        headers.insert(HEADER_API_HOST, header::HeaderValue::from_str(&settings.api_host)?);

        Ok(Self {
            client,
            base_url,
            headers,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the request for `endpoint` with query `params`.
    pub fn request(&self, endpoint: &str, params: &[(&str, String)], ttl: Duration) -> QueryRequest {
        let key = CacheKey::from_query(endpoint, params);
        let url = self.url_for(endpoint, params);
        let client = self.client.clone();
        let headers = self.headers.clone();

        QueryRequest::new(key, ttl, move || async move {
            let url = url?;
            get_json(&client, headers, url).await
        })
    }

    fn url_for(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Url, FetchError> {
        let mut url = self
            .base_url
            .join(endpoint.trim_matches('/'))
            .map_err(|e| FetchError::Transport(format!("Invalid endpoint '{}': {}", endpoint, e)))?;
        if !params.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    // ========================================================================
    // Endpoints
    // ========================================================================

    /// Every season the API has data for.
    pub fn seasons(&self) -> QueryRequest {
        self.request("leagues/seasons", &[], ONE_WEEK)
    }

    pub fn standings(&self, league_id: i64, season: i32) -> QueryRequest {
        self.request(
            "standings",
            &[("league", league_id.to_string()), ("season", season.to_string())],
            ONE_DAY,
        )
        .expect_entity(format!("league {} season {}", league_id, season), has_results)
    }

    pub fn cup_rounds(&self, cup_id: i64, season: i32) -> QueryRequest {
        self.request(
            "fixtures/rounds",
            &[("league", cup_id.to_string()), ("season", season.to_string())],
            ONE_DAY,
        )
        .expect_entity(format!("cup {} season {}", cup_id, season), has_results)
    }

    pub fn round_fixtures(&self, cup_id: i64, season: i32, round: &str, timezone: &str) -> QueryRequest {
        self.request(
            "fixtures",
            &[
                ("league", cup_id.to_string()),
                ("season", season.to_string()),
                ("round", round.to_string()),
                ("timezone", timezone.to_string()),
            ],
            ONE_DAY,
        )
    }

    pub fn competition_by_id(&self, competition_id: i64) -> QueryRequest {
        self.request("leagues", &[("id", competition_id.to_string())], ONE_WEEK)
            .expect_entity(format!("cup {}", competition_id), has_results)
    }

    /// Leagues and cups of a country. An empty list is a valid answer.
    pub fn country_competitions(&self, country: &str) -> QueryRequest {
        self.request("leagues", &[("country", country.to_string())], ONE_WEEK)
    }

    pub fn team_by_id(&self, team_id: i64) -> QueryRequest {
        self.request("teams", &[("id", team_id.to_string())], ONE_MONTH)
            .expect_entity(format!("team {}", team_id), has_results)
    }

    pub fn league_teams(&self, league_id: i64, season: i32) -> QueryRequest {
        self.request(
            "teams",
            &[("league", league_id.to_string()), ("season", season.to_string())],
            ONE_MONTH,
        )
    }

    pub fn country_teams(&self, country: &str) -> QueryRequest {
        self.request("teams", &[("country", country.to_string())], ONE_MONTH)
    }
}

impl std::fmt::Debug for FootballClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // headers hold the API key
        f.debug_struct("FootballClient")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

async fn get_json(client: &Client, headers: header::HeaderMap, url: Url) -> Result<Payload, FetchError> {
    debug!(url = %url, "GET");
    let response = client
        .get(url.clone())
        .headers(headers)
        .send()
        .await
        .map_err(ApiError::from)?;

    let status = response.status();
    let body = response.text().await.map_err(ApiError::from)?;
    if !status.is_success() {
        return Err(ApiError::from_status(status, &body).into());
    }

    let payload: Payload = serde_json::from_str(&body)
        .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", url.path(), e)))?;
    check_envelope(&payload)?;
    Ok(payload)
}

/// The API answers 200 with a non-empty `errors` field for bad keys, quota
/// exhaustion and invalid parameters.
fn check_envelope(payload: &Payload) -> Result<(), ApiError> {
    let reported = match payload.get("errors") {
        Some(Value::Array(errors)) if !errors.is_empty() => Some(Value::Array(errors.clone())),
        Some(Value::Object(errors)) if !errors.is_empty() => Some(Value::Object(errors.clone())),
        Some(Value::String(error)) if !error.is_empty() => Some(Value::String(error.clone())),
        _ => None,
    };
    match reported {
        Some(errors) => Err(ApiError::Reported(errors.to_string())),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> FootballClient {
        FootballClient::new(&ApiSettings::with_base_url("https://football.test/v3")).unwrap()
    }

    #[test]
    fn test_url_and_key_share_params() {
        let client = client();
        let params = [("league", "39".to_string()), ("season", "2023".to_string())];
        let url = client.url_for("standings", &params).unwrap();
        assert_eq!(url.as_str(), "https://football.test/v3/standings?league=39&season=2023");

        let request = client.standings(39, 2023);
        assert_eq!(request.key().as_str(), "standings?league=39&season=2023");
        assert_eq!(request.ttl(), ONE_DAY);
        assert_eq!(request.presence().unwrap().entity(), "league 39 season 2023");
    }

    #[test]
    fn test_round_names_are_encoded() {
        let client = client();
        let url = client
            .url_for("fixtures", &[("round", "Round of 16".to_string())])
            .unwrap();
        assert_eq!(url.query(), Some("round=Round+of+16"));
    }

    #[test]
    fn test_endpoint_ttls() {
        let client = client();
        assert_eq!(client.seasons().ttl(), ONE_WEEK);
        assert_eq!(client.country_competitions("England").ttl(), ONE_WEEK);
        assert_eq!(client.competition_by_id(45).ttl(), ONE_WEEK);
        assert_eq!(client.cup_rounds(45, 2023).ttl(), ONE_DAY);
        assert_eq!(client.team_by_id(33).ttl(), ONE_MONTH);
        assert_eq!(client.country_teams("Brazil").ttl(), ONE_MONTH);
        assert!(client.country_competitions("England").presence().is_none());
        assert_eq!(client.seasons().key().as_str(), "leagues/seasons");
    }

    #[test]
    fn test_check_envelope() {
        assert!(check_envelope(&json!({"errors": [], "response": []})).is_ok());
        assert!(check_envelope(&json!({"response": []})).is_ok());
        assert!(matches!(
            check_envelope(&json!({"errors": {"token": "Error/Missing application key"}})),
            Err(ApiError::Reported(msg)) if msg.contains("application key")
        ));
        assert!(check_envelope(&json!({"errors": ["bad season"]})).is_err());
    }

    #[test]
    fn test_debug_hides_key() {
        let mut settings = ApiSettings::with_base_url("https://football.test/v3/");
        settings.api_key = Some("secret-key".to_string());
        let client = FootballClient::new(&settings).unwrap();
        assert!(!format!("{:?}", client).contains("secret-key"));
    }
}
