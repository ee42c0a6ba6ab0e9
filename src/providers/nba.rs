use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use futures_util::future::join_all;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use super::{as_u32, text};
use crate::cache::{CachePolicy, RefreshResult};
use crate::error::FetchError;
use crate::games::{
    classify, logo_key, pick, select_window, DatedGame, GameStatus, GameSummary, League,
    LeagueDetails, Score,
};
use crate::upstream::JsonSource;

#[derive(Debug, Clone)]
pub struct NbaSettings {
    pub schedule_url: String,
    /// Boxscore URL with a `{game_id}` placeholder.
    pub boxscore_url: String,
    pub team_id: i64,
    pub team_abbr: String,
    pub policy: CachePolicy,
}

/// Current state of an in-progress game from the live boxscore feed.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveDetails {
    pub status: Option<GameStatus>,
    pub status_text: String,
    pub home_score: u32,
    pub away_score: u32,
    pub period: u32,
    pub clock: String,
}

/// Games for one NBA team from the league schedule and boxscore feeds.
#[derive(Clone)]
pub struct NbaProvider {
    source: Arc<dyn JsonSource>,
    settings: NbaSettings,
}

impl NbaProvider {
    pub fn new(source: Arc<dyn JsonSource>, settings: NbaSettings) -> Self {
        NbaProvider { source, settings }
    }

    pub fn settings(&self) -> &NbaSettings {
        &self.settings
    }

    /// Build the endpoint result: the live game(s), or the single most
    /// relevant game around `now`.
    pub async fn team_games(&self, now: NaiveDateTime) -> Result<RefreshResult, FetchError> {
        info!("Fetching NBA schedule data");
        let schedule = self.source.get_json(&self.settings.schedule_url).await?;
        let season = parse_schedule(&schedule, self.settings.team_id, &self.settings.team_abbr)?;

        let window = select_window(&season, now.date());
        let mut classified = classify(window, now);

        let enriched = join_all(classified.live.iter().map(|g| self.live_details(&g.summary.game_id))).await;
        for (game, details) in classified.live.iter_mut().zip(enriched) {
            if let Some(details) = details {
                apply_live_details(&mut game.summary, details);
            }
        }

        let live = !classified.live.is_empty();
        if live {
            info!("Found {} live {} games", classified.live.len(), self.settings.team_abbr);
        }
        // Past tip-off but the feed has not flipped to live yet.
        let awaiting_tipoff = classified.completed.iter().any(|g| {
            g.summary.game_status == GameStatus::Scheduled && g.start.date() == now.date()
        });
        let until_next = classified
            .upcoming
            .first()
            .and_then(|g| (g.start - now).to_std().ok());

        let games: Vec<GameSummary> = pick(classified, now)
            .into_games()
            .into_iter()
            .map(|g| g.summary)
            .collect();
        info!("Returning {} games", games.len());

        let mut result = RefreshResult::new(now, games);
        let duration = self.settings.policy.duration_for(live || awaiting_tipoff, until_next);
        result.cache_duration = Some(duration.as_secs());
        Ok(result)
    }

    /// Fetch live score/period/clock. Failures are logged and yield `None`.
    pub async fn live_details(&self, game_id: &str) -> Option<LiveDetails> {
        let url = self.settings.boxscore_url.replace("{game_id}", game_id);
        info!("Fetching live game data for {}", game_id);
        match self.source.get_json(&url).await {
            Ok(raw) => match parse_boxscore(&raw) {
                Some(details) => Some(details),
                None => {
                    warn!("Boxscore for {} has no game block", game_id);
                    None
                }
            },
            Err(e) => {
                warn!("Error fetching live game details for {}: {}", game_id, e);
                None
            }
        }
    }
}

/// Every game of the season involving `team_id`, sorted by start time.
pub fn parse_schedule(
    raw: &Value,
    team_id: i64,
    team_abbr: &str,
) -> Result<Vec<DatedGame>, FetchError> {
    let game_dates = raw["leagueSchedule"]["gameDates"]
        .as_array()
        .ok_or_else(|| FetchError::parse("NBA schedule", "missing leagueSchedule.gameDates"))?;

    let mut games: Vec<DatedGame> = game_dates
        .iter()
        .filter_map(|d| d["games"].as_array())
        .flatten()
        .filter(|g| {
            g["homeTeam"]["teamId"].as_i64() == Some(team_id)
                || g["awayTeam"]["teamId"].as_i64() == Some(team_id)
        })
        .filter_map(|g| match parse_game_start(g) {
            Some(start) => Some(DatedGame {
                start,
                summary: normalize_game(g, start, team_id, team_abbr),
            }),
            None => {
                warn!(
                    "Could not parse game date: {:?} (game {})",
                    g["gameDateEst"],
                    text(&g["gameId"])
                );
                None
            }
        })
        .collect();

    games.sort_by_key(|g| g.start);
    Ok(games)
}

/// Start time from `gameDateTimeEst`, else `gameDateEst` (+ `gameTimeEst`).
pub fn parse_game_start(game: &Value) -> Option<NaiveDateTime> {
    if let Some(dt) = game["gameDateTimeEst"].as_str().and_then(parse_iso) {
        return Some(dt);
    }

    let date = game["gameDateEst"].as_str()?;
    if date.contains('T') {
        return parse_iso(date);
    }

    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let time = match game["gameTimeEst"].as_str().filter(|t| !t.is_empty()) {
        Some(t) if t.contains('T') => parse_iso(t)?.time(),
        Some(t) => NaiveTime::parse_from_str(t, "%H:%M:%S").ok()?,
        None => NaiveTime::from_hms_opt(0, 0, 0)?,
    };
    Some(day.and_time(time))
}

fn parse_iso(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim_end_matches('Z');
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .ok()
}

/// Flatten one schedule game into a summary from the tracked team's side.
pub fn normalize_game(
    game: &Value,
    start: NaiveDateTime,
    team_id: i64,
    team_abbr: &str,
) -> GameSummary {
    let home = &game["homeTeam"];
    let away = &game["awayTeam"];
    let is_home = home["teamId"].as_i64() == Some(team_id);

    let status = game["gameStatus"]
        .as_i64()
        .and_then(GameStatus::from_nba_code)
        .unwrap_or(GameStatus::Scheduled);

    let (default_home, default_away) = if is_home {
        (team_abbr, "OPP")
    } else {
        ("OPP", team_abbr)
    };
    let home_abbr = home["teamTricode"].as_str().unwrap_or(default_home).to_string();
    let away_abbr = away["teamTricode"].as_str().unwrap_or(default_away).to_string();

    let (opponent_abbr, opponent) = if is_home {
        (away_abbr.clone(), away)
    } else {
        (home_abbr.clone(), home)
    };

    GameSummary {
        game_id: text(&game["gameId"]),
        game_date: start.format("%Y-%m-%dT%H:%M:%S").to_string(),
        game_status: status,
        home_logo_key: logo_key(&home_abbr, League::Nba),
        away_logo_key: logo_key(&away_abbr, League::Nba),
        home_team_abbr: home_abbr,
        away_team_abbr: away_abbr,
        home_team_id: text(&home["teamId"]),
        away_team_id: text(&away["teamId"]),
        home_score: Score::for_status(status, as_u32(&home["score"]).unwrap_or(0)),
        away_score: Score::for_status(status, as_u32(&away["score"]).unwrap_or(0)),
        period: as_u32(&game["period"]).unwrap_or(0),
        clock: game["gameClock"].as_str().unwrap_or_default().to_string(),
        opponent_abbr,
        opponent_id: text(&opponent["teamId"]),
        is_home_team: is_home,
        details: LeagueDetails::Basketball {
            game_status_text: game["gameStatusText"].as_str().unwrap_or_default().to_string(),
        },
    }
}

pub fn parse_boxscore(raw: &Value) -> Option<LiveDetails> {
    let game = raw.get("game")?;
    Some(LiveDetails {
        status: game["gameStatus"].as_i64().and_then(GameStatus::from_nba_code),
        status_text: game["gameStatusText"].as_str().unwrap_or_default().to_string(),
        home_score: as_u32(&game["homeTeam"]["score"]).unwrap_or(0),
        away_score: as_u32(&game["awayTeam"]["score"]).unwrap_or(0),
        period: as_u32(&game["period"]).unwrap_or(0),
        clock: game["gameClock"].as_str().unwrap_or_default().to_string(),
    })
}

fn apply_live_details(summary: &mut GameSummary, live: LiveDetails) {
    if let Some(status) = live.status {
        summary.game_status = status;
    }
    summary.home_score = Score::for_status(summary.game_status, live.home_score);
    summary.away_score = Score::for_status(summary.game_status, live.away_score);
    summary.period = live.period;
    summary.clock = live.clock;
    summary.details = LeagueDetails::Basketball {
        game_status_text: live.status_text,
    };
}
