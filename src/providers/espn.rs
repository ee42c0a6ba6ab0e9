use chrono::{Local, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use super::{as_u32, text};
use crate::cache::{CachePolicy, RefreshResult};
use crate::error::FetchError;
use crate::games::{logo_key, GameStatus, GameSummary, League, LeagueDetails, Score};
use crate::upstream::JsonSource;

/// Index of the rank entry in ESPN's season stats array, used only when the
/// entries carry no names.
const RANK_STAT_INDEX: usize = 23;

#[derive(Debug, Clone)]
pub struct SoccerSettings {
    /// Base teams URL; the team id is appended as a path segment.
    pub teams_url: String,
    pub team_id: String,
    pub policy: CachePolicy,
}

/// Next relevant match for one club from ESPN's soccer team feed.
#[derive(Clone)]
pub struct SoccerProvider {
    source: Arc<dyn JsonSource>,
    settings: SoccerSettings,
}

impl SoccerProvider {
    pub fn new(source: Arc<dyn JsonSource>, settings: SoccerSettings) -> Self {
        SoccerProvider { source, settings }
    }

    pub fn settings(&self) -> &SoccerSettings {
        &self.settings
    }

    fn team_url(&self, team_id: &str) -> String {
        format!("{}/{}", self.settings.teams_url.trim_end_matches('/'), team_id)
    }

    pub async fn team_games(&self, now: NaiveDateTime) -> Result<RefreshResult, FetchError> {
        info!("Fetching club data from ESPN for team {}", self.settings.team_id);
        let data = self.source.get_json(&self.team_url(&self.settings.team_id)).await?;
        let team = data
            .get("team")
            .ok_or_else(|| FetchError::parse("ESPN team feed", "missing team block"))?;

        let Some(event) = team["nextEvent"].as_array().and_then(|e| e.first()) else {
            let club = team["displayName"].as_str().unwrap_or("club");
            warn!("ESPN feed for {} has no next event", club);
            let mut result = RefreshResult::new(now, Vec::new());
            result.error = Some(true);
            result.message = Some(format!("Unable to fetch {} game data", club));
            result.cache_duration = Some(self.settings.policy.live.as_secs());
            return Ok(result);
        };

        let mut game = normalize_event(event, &self.settings.team_id)?;
        let kickoff = event["date"].as_str().and_then(parse_event_date);

        let own_rank = league_rank(&data);
        let opponent_rank = match game.opponent_id.as_str() {
            "" => None,
            id => self.fetch_rank(id).await,
        };
        if let LeagueDetails::Soccer {
            home_rank,
            away_rank,
            ..
        } = &mut game.details
        {
            if game.is_home_team {
                (*home_rank, *away_rank) = (own_rank, opponent_rank);
            } else {
                (*home_rank, *away_rank) = (opponent_rank, own_rank);
            }
        }

        // A "pre" match past its kick-off time is about to go live.
        let overdue = game.game_status == GameStatus::Scheduled && kickoff.is_some_and(|k| k <= now);
        let live = game.game_status == GameStatus::Live || overdue;
        let until_kickoff = match game.game_status {
            GameStatus::Scheduled => kickoff.and_then(|k| (k - now).to_std().ok()),
            _ => None,
        };

        let mut result = RefreshResult::new(now, vec![game]);
        result.cache_duration = Some(self.settings.policy.duration_for(live, until_kickoff).as_secs());
        Ok(result)
    }

    /// League position of another club. Failures degrade to `None`.
    pub async fn fetch_rank(&self, team_id: &str) -> Option<u32> {
        info!("Fetching rank for team {}", team_id);
        match self.source.get_json(&self.team_url(team_id)).await {
            Ok(data) => league_rank(&data),
            Err(e) => {
                warn!("Error fetching team rank for {}: {}", team_id, e);
                None
            }
        }
    }
}

/// Rank from `team.record.items[0].stats`, located by name.
pub fn league_rank(data: &Value) -> Option<u32> {
    let stats = data["team"]["record"]["items"].get(0)?["stats"].as_array()?;

    if let Some(stat) = stats.iter().find(|s| s["name"].as_str() == Some("rank")) {
        return as_u32(&stat["value"]);
    }
    if stats.iter().all(|s| s.get("name").is_none()) {
        return stats.get(RANK_STAT_INDEX).and_then(|s| as_u32(&s["value"]));
    }
    None
}

/// Summary of one ESPN event, ranks left empty.
pub fn normalize_event(event: &Value, team_id: &str) -> Result<GameSummary, FetchError> {
    let competition = event["competitions"]
        .get(0)
        .ok_or_else(|| FetchError::parse("ESPN team feed", "event has no competitions"))?;
    let competitors = competition["competitors"]
        .as_array()
        .filter(|c| c.len() >= 2)
        .ok_or_else(|| FetchError::parse("ESPN team feed", "event needs two competitors"))?;

    let home = competitor_on(competitors, "home").unwrap_or(&competitors[0]);
    let away = competitor_on(competitors, "away").unwrap_or(&competitors[1]);

    let status = &competition["status"];
    let state = status["type"]["state"].as_str().unwrap_or("pre").to_string();
    let game_status = GameStatus::from_espn_state(&state);

    let is_home = text(&home["team"]["id"]) == team_id;
    let (home_team, away_team) = (&home["team"], &away["team"]);
    let home_abbr = text(&home_team["abbreviation"]);
    let away_abbr = text(&away_team["abbreviation"]);
    let opponent = if is_home { away_team } else { home_team };

    Ok(GameSummary {
        game_id: text(&event["id"]),
        game_date: event_date_local(&event["date"]),
        game_status,
        home_logo_key: logo_key(&home_abbr, League::PremierLeague),
        away_logo_key: logo_key(&away_abbr, League::PremierLeague),
        home_team_id: text(&home_team["id"]),
        away_team_id: text(&away_team["id"]),
        home_score: Score::for_status(game_status, competitor_score(home)),
        away_score: Score::for_status(game_status, competitor_score(away)),
        period: as_u32(&status["period"]).unwrap_or(0),
        clock: text(&status["displayClock"]),
        opponent_abbr: text(&opponent["abbreviation"]),
        opponent_id: text(&opponent["id"]),
        is_home_team: is_home,
        home_team_abbr: home_abbr,
        away_team_abbr: away_abbr,
        details: LeagueDetails::Soccer {
            home_rank: None,
            away_rank: None,
            status_description: text(&status["type"]["description"]),
            status_state: state,
            home_team_name: text(&home_team["displayName"]),
            away_team_name: text(&away_team["displayName"]),
        },
    })
}

fn competitor_on<'a>(competitors: &'a [Value], side: &str) -> Option<&'a Value> {
    competitors
        .iter()
        .find(|c| c["homeAway"].as_str() == Some(side))
}

/// `score` is either `{"value": 2.0, ...}` or a bare value.
fn competitor_score(competitor: &Value) -> u32 {
    let score = &competitor["score"];
    as_u32(&score["value"]).or_else(|| as_u32(score)).unwrap_or(0)
}

/// Event date as local ISO-8601, or the raw value if it does not parse.
fn event_date_local(date: &Value) -> String {
    let raw = text(date);
    match parse_event_date(&raw) {
        Some(local) => local.format("%Y-%m-%dT%H:%M:%S").to_string(),
        None => raw,
    }
}

/// ESPN event dates are UTC ("2025-01-18T17:30Z"); convert to local time.
fn parse_event_date(s: &str) -> Option<NaiveDateTime> {
    let trimmed = s.trim_end_matches('Z');
    let utc = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()?;
    Some(Utc.from_utc_datetime(&utc).with_timezone(&Local).naive_local())
}
