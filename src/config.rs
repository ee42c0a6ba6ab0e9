use anyhow::Context;
use clap::Parser;
use directories::ProjectDirs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::CachePolicy;
use crate::providers::{NbaSettings, SoccerSettings};

/// Start page backend serving cached NBA and Premier League game data
#[derive(Parser, Debug, Clone)]
#[command(name = "startpage-api", version, about)]
pub struct Config {
    /// HTTP listen address
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    pub listen_addr: String,

    /// Directory for cached endpoint responses [default: <config dir>/startpage/cache]
    #[arg(long, env = "CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Directory holding the pre-built front-end [default: <config dir>/startpage]
    #[arg(long, env = "STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    /// NBA full-season schedule feed
    #[arg(
        long,
        env = "NBA_SCHEDULE_URL",
        default_value = "https://cdn.nba.com/static/json/staticData/scheduleLeagueV2_1.json"
    )]
    pub nba_schedule_url: String,

    /// NBA live boxscore feed; `{game_id}` is replaced per game
    #[arg(
        long,
        env = "NBA_BOXSCORE_URL",
        default_value = "https://cdn.nba.com/static/json/liveData/boxscore/boxscore_{game_id}.json"
    )]
    pub nba_boxscore_url: String,

    /// ESPN soccer teams endpoint; the team id is appended
    #[arg(
        long,
        env = "ESPN_TEAMS_URL",
        default_value = "https://site.api.espn.com/apis/site/v2/sports/soccer/eng.1/teams"
    )]
    pub espn_teams_url: String,

    /// NBA team to track (default: Houston Rockets)
    #[arg(long, env = "NBA_TEAM_ID", default_value = "1610612745")]
    pub nba_team_id: i64,

    #[arg(long, env = "NBA_TEAM_ABBR", default_value = "HOU")]
    pub nba_team_abbr: String,

    /// ESPN id of the soccer club to track (default: Arsenal)
    #[arg(long, env = "SOCCER_TEAM_ID", default_value = "359")]
    pub soccer_team_id: String,

    /// Upstream request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "10")]
    pub request_timeout_secs: u64,

    /// Cache lifetime when no game is live
    #[arg(long, env = "IDLE_CACHE_SECS", default_value = "3600")]
    pub idle_cache_secs: u64,

    /// Cache lifetime while an NBA game is live
    #[arg(long, env = "NBA_LIVE_CACHE_SECS", default_value = "120")]
    pub nba_live_cache_secs: u64,

    /// Cache lifetime while a soccer match is live
    #[arg(long, env = "SOCCER_LIVE_CACHE_SECS", default_value = "30")]
    pub soccer_live_cache_secs: u64,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        self.listen_addr
            .parse::<SocketAddr>()
            .with_context(|| format!("invalid listen address '{}'", self.listen_addr))?;

        if !self.nba_boxscore_url.contains("{game_id}") {
            anyhow::bail!("NBA_BOXSCORE_URL must contain a {{game_id}} placeholder");
        }
        for (name, value) in [
            ("NBA_SCHEDULE_URL", self.nba_schedule_url.as_str()),
            ("NBA_BOXSCORE_URL", self.nba_boxscore_url.as_str()),
            ("ESPN_TEAMS_URL", self.espn_teams_url.as_str()),
        ] {
            let parsed = url::Url::parse(value)
                .with_context(|| format!("{} is not a valid URL: {}", name, value))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                anyhow::bail!("{} must be an http(s) URL", name);
            }
        }

        if self.soccer_team_id.trim().is_empty() {
            anyhow::bail!("soccer_team_id must not be empty");
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be positive");
        }
        if self.idle_cache_secs == 0 || self.nba_live_cache_secs == 0 || self.soccer_live_cache_secs == 0 {
            anyhow::bail!("cache durations must be positive");
        }
        if self.nba_live_cache_secs > self.idle_cache_secs
            || self.soccer_live_cache_secs > self.idle_cache_secs
        {
            anyhow::bail!("live cache durations must not exceed idle_cache_secs");
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listen_addr.parse()?)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cache_dir(&self) -> anyhow::Result<PathBuf> {
        match &self.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(default_config_dir()?.join("cache")),
        }
    }

    pub fn static_dir(&self) -> anyhow::Result<PathBuf> {
        match &self.static_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_config_dir(),
        }
    }

    pub fn nba_settings(&self) -> NbaSettings {
        NbaSettings {
            schedule_url: self.nba_schedule_url.clone(),
            boxscore_url: self.nba_boxscore_url.clone(),
            team_id: self.nba_team_id,
            team_abbr: self.nba_team_abbr.clone(),
            policy: CachePolicy {
                live: Duration::from_secs(self.nba_live_cache_secs),
                idle: Duration::from_secs(self.idle_cache_secs),
            },
        }
    }

    pub fn soccer_settings(&self) -> SoccerSettings {
        SoccerSettings {
            teams_url: self.espn_teams_url.clone(),
            team_id: self.soccer_team_id.clone(),
            policy: CachePolicy {
                live: Duration::from_secs(self.soccer_live_cache_secs),
                idle: Duration::from_secs(self.idle_cache_secs),
            },
        }
    }
}

fn default_config_dir() -> anyhow::Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "startpage")
        .context("cannot determine a home directory; set CACHE_DIR and STATIC_DIR")?;
    Ok(dirs.config_dir().to_path_buf())
}
