//! Upstream feed normalizers.
//!
//! Each provider turns one upstream's JSON into [`GameSummary`] values and a
//! [`RefreshResult`] ready to be cached.
//!
//! [`GameSummary`]: crate::games::GameSummary
//! [`RefreshResult`]: crate::cache::RefreshResult

pub mod espn;
pub mod nba;

pub use espn::{SoccerProvider, SoccerSettings};
pub use nba::{NbaProvider, NbaSettings};

use serde_json::Value;

/// Read a non-negative integer that may arrive as an integer, a float or a
/// numeric string.
pub(crate) fn as_u32(v: &Value) -> Option<u32> {
    match v {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
            .and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<f64>().ok().and_then(|f| as_u32(&Value::from(f))),
        _ => None,
    }
}

/// String field, or a number rendered as a string, or empty.
pub(crate) fn text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}
