use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};

/// Shown in place of a score before a game starts.
pub const SCORE_PLACEHOLDER: &str = "—";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Scheduled,
    Live,
    Completed,
}

impl GameStatus {
    /// NBA feeds use 1 = scheduled, 2 = in progress, 3 = final.
    pub fn from_nba_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(GameStatus::Scheduled),
            2 => Some(GameStatus::Live),
            3 => Some(GameStatus::Completed),
            _ => None,
        }
    }

    /// ESPN status state: "pre" | "in" | "post".
    pub fn from_espn_state(state: &str) -> Self {
        match state {
            "in" => GameStatus::Live,
            "post" => GameStatus::Completed,
            _ => GameStatus::Scheduled,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Pending,
    Points(u32),
}

impl Score {
    /// Scheduled games never show a number, even if the feed sends 0.
    pub fn for_status(status: GameStatus, points: u32) -> Self {
        match status {
            GameStatus::Scheduled => Score::Pending,
            _ => Score::Points(points),
        }
    }
}

impl Serialize for Score {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Score::Pending => serializer.serialize_str(SCORE_PLACEHOLDER),
            Score::Points(p) => serializer.serialize_u32(*p),
        }
    }
}

/// Provider-agnostic summary of one game, from the tracked team's side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameSummary {
    pub game_id: String,
    /// ISO-8601 start time.
    pub game_date: String,
    pub game_status: GameStatus,
    pub home_team_abbr: String,
    pub away_team_abbr: String,
    pub home_team_id: String,
    pub away_team_id: String,
    pub home_score: Score,
    pub away_score: Score,
    pub period: u32,
    pub clock: String,
    pub opponent_abbr: String,
    pub opponent_id: String,
    pub is_home_team: bool,
    pub home_logo_key: String,
    pub away_logo_key: String,
    #[serde(flatten)]
    pub details: LeagueDetails,
}

/// Fields only one of the providers supplies.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LeagueDetails {
    Basketball {
        game_status_text: String,
    },
    Soccer {
        home_rank: Option<u32>,
        away_rank: Option<u32>,
        status_description: String,
        /// Raw ESPN state ("pre" | "in" | "post").
        status_state: String,
        home_team_name: String,
        away_team_name: String,
    },
}

/// A summary paired with its parsed start time, for window selection and
/// picking.
#[derive(Debug, Clone, PartialEq)]
pub struct DatedGame {
    pub start: NaiveDateTime,
    pub summary: GameSummary,
}
