use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::{Client, Method, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::api::ApiError;

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FavoriteKind {
    League,
    Cup,
    Team,
}

impl FavoriteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FavoriteKind::League => "league",
            FavoriteKind::Cup => "cup",
            FavoriteKind::Team => "team",
        }
    }
}

impl fmt::Display for FavoriteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FavoriteKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "league" => Ok(FavoriteKind::League),
            "cup" => Ok(FavoriteKind::Cup),
            "team" => Ok(FavoriteKind::Team),
            _ => Err(format!("unknown favorite kind '{}' (expected league, cup or team)", s)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Favorites {
    pub leagues: Vec<i64>,
    pub cups: Vec<i64>,
    pub teams: Vec<i64>,
}

impl Favorites {
    pub fn of(&self, kind: FavoriteKind) -> &[i64] {
        match kind {
            FavoriteKind::League => &self.leagues,
            FavoriteKind::Cup => &self.cups,
            FavoriteKind::Team => &self.teams,
        }
    }

    pub fn contains(&self, kind: FavoriteKind, id: i64) -> bool {
        self.of(kind).contains(&id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupData {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryFlag {
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub flag_url: Option<String>,
}

// ============================================================================
// Response shapes
// ============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    user: User,
}

#[derive(Debug, Deserialize)]
struct FavoritesResponse {
    favorites: Vec<FavoriteGroup>,
}

#[derive(Debug, Deserialize)]
struct FavoriteGroup {
    #[serde(rename = "type")]
    kind: FavoriteKind,
    #[serde(default)]
    favorites: Vec<i64>,
}

#[derive(Debug, Deserialize)]
struct CountriesResponse {
    countries: Vec<CountryFlag>,
}

impl FavoritesResponse {
    fn to_favorites(&self) -> Favorites {
        let mut favorites = Favorites::default();
        for group in &self.favorites {
            let ids = group.favorites.iter().copied();
            match group.kind {
                FavoriteKind::League => favorites.leagues.extend(ids),
                FavoriteKind::Cup => favorites.cups.extend(ids),
                FavoriteKind::Team => favorites.teams.extend(ids),
            }
        }
        favorites
    }
}

/// Backend API client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).with_context(|| format!("Invalid backend URL '{}'", base_url))?;

        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    /// Same connection pool, different token.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("Invalid backend path '{}'", path))
    }

    /// `users/{username}/{rest...}` with every segment percent-encoded.
    fn user_url(&self, username: &str, rest: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("Backend URL '{}' cannot take a path", self.base_url))?
            .pop_if_empty()
            .push("users")
            .push(username)
            .extend(rest);
        Ok(url)
    }

    async fn send<T: DeserializeOwned, B: Serialize>(&self, method: Method, url: Url, body: Option<&B>) -> Result<T> {
        debug!(method = %method, url = %url, "Backend request");

        let mut request = self.client.request(method, url.clone());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body).into());
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        self.send::<T, ()>(Method::GET, url, None).await
    }

    /// Authenticate and return a token.
    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        #[derive(Serialize)]
        struct Login<'a> {
            username: &'a str,
            password: &'a str,
        }

        let res: TokenResponse = self
            .send(Method::POST, self.url("auth/token")?, Some(&Login { username, password }))
            .await
            .context("Login failed")?;
        Ok(res.token)
    }

    /// Register and return a token; a new account is logged in at once.
    pub async fn signup(&self, data: &SignupData) -> Result<String> {
        let res: TokenResponse = self
            .send(Method::POST, self.url("auth/register")?, Some(data))
            .await
            .context("Signup failed")?;
        Ok(res.token)
    }

    pub async fn current_user(&self, username: &str) -> Result<User> {
        let res: UserResponse = self.get(self.user_url(username, &[])?).await?;
        Ok(res.user)
    }

    pub async fn favorites(&self, username: &str) -> Result<Favorites> {
        let res: FavoritesResponse = self.get(self.user_url(username, &["favorites"])?).await?;
        Ok(res.to_favorites())
    }

    fn favorite_url(&self, username: &str, kind: FavoriteKind, id: i64) -> Result<Url> {
        self.user_url(username, &["favorites", kind.as_str(), &id.to_string()])
    }

    pub async fn add_favorite(&self, username: &str, kind: FavoriteKind, id: i64) -> Result<()> {
        let url = self.favorite_url(username, kind, id)?;
        let _: serde_json::Value = self.send::<_, ()>(Method::POST, url, None).await?;
        Ok(())
    }

    pub async fn remove_favorite(&self, username: &str, kind: FavoriteKind, id: i64) -> Result<()> {
        let url = self.favorite_url(username, kind, id)?;
        let _: serde_json::Value = self.send::<_, ()>(Method::DELETE, url, None).await?;
        Ok(())
    }

    /// Countries that have at least one league, with their flags.
    pub async fn league_countries(&self) -> Result<Vec<CountryFlag>> {
        let res: CountriesResponse = self.get(self.url("leagues/countries")?).await?;
        Ok(res.countries)
    }
}

impl fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendClient")
            .field("base_url", &self.base_url.as_str())
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}
