//! Application configuration management.
//!
//! Persistent preferences (default competition, season, timezone, last
//! username, service URLs) live in `~/.config/footy/config.json`. Secrets
//! never go there: the football API key and host come from the environment
//! (`FOOTY_API_KEY`, `FOOTY_API_HOST`), which the binary may populate from a
//! `.env` file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "footy";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_API_BASE_URL: &str = "https://api-football-v1.p.rapidapi.com/v3/";
pub const DEFAULT_API_HOST: &str = "api-football-v1.p.rapidapi.com";
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3001";

pub const DEFAULT_COUNTRY: &str = "England";
pub const DEFAULT_SEASON: i32 = 2023;
pub const DEFAULT_LEAGUE_ID: i64 = 39;
pub const DEFAULT_TEAM_ID: i64 = 33;
pub const DEFAULT_TIMEZONE: &str = "Europe/London";

pub const ENV_API_KEY: &str = "FOOTY_API_KEY";
pub const ENV_API_HOST: &str = "FOOTY_API_HOST";
pub const ENV_API_BASE_URL: &str = "FOOTY_API_BASE_URL";
pub const ENV_BACKEND_URL: &str = "FOOTY_BACKEND_URL";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub backend_url: Option<String>,
    pub default_country: Option<String>,
    pub default_season: Option<i32>,
    pub default_league_id: Option<i64>,
    pub default_team_id: Option<i64>,
    pub timezone: Option<String>,
    pub last_username: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn country(&self) -> &str {
        self.default_country.as_deref().unwrap_or(DEFAULT_COUNTRY)
    }

    pub fn season(&self) -> i32 {
        self.default_season.unwrap_or(DEFAULT_SEASON)
    }

    pub fn league_id(&self) -> i64 {
        self.default_league_id.unwrap_or(DEFAULT_LEAGUE_ID)
    }

    pub fn team_id(&self) -> i64 {
        self.default_team_id.unwrap_or(DEFAULT_TEAM_ID)
    }

    pub fn timezone(&self) -> &str {
        self.timezone.as_deref().unwrap_or(DEFAULT_TIMEZONE)
    }

    pub fn backend_url(&self) -> String {
        std::env::var(ENV_BACKEND_URL)
            .ok()
            .or_else(|| self.backend_url.clone())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string())
    }
}

/// Connection settings for the external football API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub api_host: String,
}

impl ApiSettings {
    /// Environment first, then the config file, then built-in defaults.
    pub fn resolve(config: &Config) -> Self {
        Self {
            base_url: std::env::var(ENV_API_BASE_URL)
                .ok()
                .or_else(|| config.api_base_url.clone())
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            api_key: std::env::var(ENV_API_KEY).ok().filter(|k| !k.is_empty()),
            api_host: std::env::var(ENV_API_HOST)
                .ok()
                .unwrap_or_else(|| DEFAULT_API_HOST.to_string()),
        }
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            api_host: DEFAULT_API_HOST.to_string(),
        }
    }
}
