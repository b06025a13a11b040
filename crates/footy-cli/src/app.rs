//! Wiring between the command line and footy-core.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{debug, info, warn};

use footy_core::api::FootballClient;
use footy_core::auth::{Session, SessionData};
use footy_core::backend::{BackendClient, SignupData};
use footy_core::cache::{Clock, FileStore, SystemClock, TtlCache};
use footy_core::config::{ApiSettings, Config, ENV_API_KEY};
use footy_core::fetch::FetchOrchestrator;
use footy_core::models::CompetitionKind;
use footy_core::screens::{
    CompetitionParams, CompetitionScreen, CupRoundScreen, ScreenContext, SeasonsScreen, TeamsParams, TeamsScreen,
};
use footy_core::view::{QueryStatus, ViewLoader, ViewRunner};

use crate::cli::{CacheAction, Cli, Command, CompetitionArgs, FavoriteAction, TeamsFilter};
use crate::render;

/// Cached API responses live below the cache directory, next to the session.
const RESPONSES_DIR: &str = "responses";

pub struct App {
    config: Config,
    cache_dir: PathBuf,
    cache: Arc<TtlCache>,
    ctx: ScreenContext,
    json: bool,
}

impl App {
    pub fn new(cli: &Cli) -> Result<Self> {
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };

        let cache_dir = config.cache_dir().unwrap_or_else(|_| PathBuf::from("./cache"));
        debug!(?cache_dir, "Cache directory configured");

        let cache = if cli.memory_cache {
            TtlCache::in_memory()
        } else {
            let store = FileStore::new(cache_dir.join(RESPONSES_DIR))?;
            TtlCache::new(store, Arc::new(SystemClock))
        };
        let cache = Arc::new(cache);

        let settings = ApiSettings::resolve(&config);
        if settings.api_key.is_none() {
            warn!("{} is not set, the football API will reject requests", ENV_API_KEY);
        }
        let client = FootballClient::new(&settings)?;
        let orchestrator = Arc::new(FetchOrchestrator::new(Arc::clone(&cache)));
        let ctx = ScreenContext::new(client, orchestrator, &config);

        Ok(Self {
            config,
            cache_dir,
            cache,
            ctx,
            json: cli.json,
        })
    }

    pub async fn run(&mut self, command: Command) -> Result<()> {
        match command {
            Command::League(args) => self.competition(CompetitionKind::League, args).await,
            Command::Cup { competition, round } => self.cup(competition, round).await,
            Command::Team { id, teams } => self.team(id.unwrap_or(self.config.team_id()), teams).await,
            Command::Seasons => self.seasons().await,
            Command::Login { username } => self.login(username).await,
            Command::Signup {
                username,
                first_name,
                last_name,
                email,
            } => {
                let data = SignupData {
                    username,
                    password: String::new(),
                    first_name,
                    last_name,
                    email,
                    timezone: self.config.timezone.clone(),
                };
                self.signup(data).await
            }
            Command::Logout => self.logout(),
            Command::Favorites { action } => self.favorites(action).await,
            Command::Cache { action } => self.cache_command(action),
        }
    }

    fn competition_params(&self, kind: CompetitionKind, args: CompetitionArgs) -> CompetitionParams {
        CompetitionParams {
            kind,
            id: args.id.unwrap_or(self.config.league_id()),
            season: args.season.unwrap_or(self.config.season()),
        }
    }

    async fn competition(&self, kind: CompetitionKind, args: CompetitionArgs) -> Result<()> {
        let params = self.competition_params(kind, args);
        let page = load(CompetitionScreen::new(self.ctx.clone()), params).await?;
        if self.json {
            render::print_json(&page)
        } else {
            print!("{}", render::competition(&page));
            Ok(())
        }
    }

    /// Cup page (rounds and the country's competitions) followed by the
    /// fixtures of one round.
    async fn cup(&self, args: CompetitionArgs, round: Option<String>) -> Result<()> {
        let params = self.competition_params(CompetitionKind::Cup, args);
        let page = load(CompetitionScreen::new(self.ctx.clone()), params).await?;

        let screen = CupRoundScreen::new(self.ctx.clone());
        let round_params = screen.params(params.id, params.season, round);
        let round_page = load(screen, round_params).await?;

        if self.json {
            return render::print_json(&serde_json::json!({ "competition": page, "round": round_page }));
        }
        print!("{}", render::competition(&page));
        println!();
        print!("{}", render::cup_round(&round_page));
        Ok(())
    }

    async fn team(&self, team_id: i64, teams: Option<TeamsFilter>) -> Result<()> {
        let screen = TeamsScreen::new(self.ctx.clone());
        let page = load(screen.clone(), TeamsParams { team_id }).await?;

        let listed = match teams {
            Some(TeamsFilter::Nationals) => Some(screen.national_teams(&page.country).await),
            Some(TeamsFilter::League(league_id)) => Some(screen.league_teams(league_id).await),
            None => None,
        };
        let listed = listed
            .transpose()
            .map_err(|e| anyhow::anyhow!(e.user_message()))?;

        if self.json {
            return render::print_json(&serde_json::json!({ "page": page, "teams": listed }));
        }
        print!("{}", render::team(&page));
        if let Some(teams) = listed {
            println!("\nTeams:");
            print!("{}", render::team_list(&teams));
        }
        Ok(())
    }

    async fn seasons(&self) -> Result<()> {
        let seasons = load(SeasonsScreen::new(self.ctx.clone()), ()).await?;
        if self.json {
            render::print_json(&seasons)
        } else {
            println!("{}", render::seasons(&seasons));
            Ok(())
        }
    }

    // ========================================================================
    // Backend
    // ========================================================================

    fn backend(&self) -> Result<BackendClient> {
        BackendClient::new(&self.config.backend_url())
    }

    fn session(&self) -> Session {
        let mut session = Session::new(self.cache_dir.clone());
        if let Err(e) = session.load() {
            warn!(error = %e, "Failed to load session");
        }
        session
    }

    async fn login(&mut self, username: Option<String>) -> Result<()> {
        let username = match username.or_else(|| self.config.last_username.clone()) {
            Some(u) => u,
            None => prompt("Username: ")?,
        };
        if username.is_empty() {
            bail!("A username is required");
        }
        let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;

        let token = self.backend()?.login(&username, &password).await?;
        self.start_session(token, username)
    }

    async fn signup(&mut self, mut data: SignupData) -> Result<()> {
        if data.username.is_empty() {
            bail!("A username is required");
        }
        data.password = rpassword::prompt_password("Password: ").context("Failed to read password")?;
        if data.password.is_empty() {
            bail!("A password is required");
        }

        let token = self.backend()?.signup(&data).await?;
        info!(username = %data.username, "Account created");
        self.start_session(token, data.username)
    }

    fn start_session(&mut self, token: String, username: String) -> Result<()> {
        let mut session = Session::new(self.cache_dir.clone());
        session.update(SessionData::new(token, username.clone()));
        session.save().context("Failed to save session")?;

        self.config.last_username = Some(username.clone());
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }
        info!(username = %username, "Logged in");
        println!("Logged in as {}", username);
        Ok(())
    }

    fn logout(&self) -> Result<()> {
        let mut session = self.session();
        let username = session.username().map(str::to_string);
        session.clear()?;
        match username {
            Some(u) => println!("Logged out {}", u),
            None => println!("Not logged in"),
        }
        Ok(())
    }

    async fn favorites(&self, action: Option<FavoriteAction>) -> Result<()> {
        let session = self.session();
        let (Some(token), Some(username)) = (session.token(), session.username()) else {
            bail!("Not logged in. Run `footy login` first");
        };
        let backend = self.backend()?.with_token(token.to_string());

        match action {
            Some(FavoriteAction::Add { kind, id }) => {
                backend.add_favorite(username, kind, id).await?;
                println!("Added {} {} to favorites", kind, id);
            }
            Some(FavoriteAction::Remove { kind, id }) => {
                backend.remove_favorite(username, kind, id).await?;
                println!("Removed {} {} from favorites", kind, id);
            }
            None => {
                let favorites = backend.favorites(username).await?;
                if self.json {
                    render::print_json(&favorites)?;
                } else {
                    println!("{}", render::favorites(&favorites));
                }
            }
        }
        Ok(())
    }

    // ========================================================================
    // Cache
    // ========================================================================

    fn cache_command(&self, action: CacheAction) -> Result<()> {
        match action {
            CacheAction::Clear => {
                let count = self.cache.len()?;
                self.cache.clear()?;
                println!("Removed {} cached responses", count);
            }
            CacheAction::Stats => {
                let entries = self.cache.entries()?;
                let now = self.cache.clock().now();
                let directory = self.cache_dir.join(RESPONSES_DIR);
                if self.json {
                    let listed: Vec<_> = entries
                        .iter()
                        .map(|e| {
                            serde_json::json!({
                                "key": e.key,
                                "stored_at": e.stored_at,
                                "age": e.age_display(now),
                                "expired": !e.is_valid_at(now),
                            })
                        })
                        .collect();
                    render::print_json(&serde_json::json!({
                        "count": entries.len(),
                        "directory": directory,
                        "entries": listed,
                    }))?;
                } else {
                    println!("{} cached responses in {}", entries.len(), directory.display());
                    print!("{}", render::cache_entries(&entries, now));
                }
            }
        }
        Ok(())
    }
}

/// Run one view cycle to completion and hand back its data.
async fn load<L: ViewLoader>(loader: L, params: L::Params) -> Result<L::Output> {
    let mut runner = ViewRunner::new(loader);
    runner.navigate(params);
    let snapshot = runner.settle().await;
    match (snapshot.status, &snapshot.data, &snapshot.error) {
        (QueryStatus::Fetched, Some(data), _) => Ok(data.clone()),
        (_, _, Some(e)) => bail!(e.user_message()),
        (status, _, _) => bail!("View ended in unexpected state {:?}", status),
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
