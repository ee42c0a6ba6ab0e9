use chrono::NaiveDateTime;

use super::models::{DatedGame, GameStatus};

/// Games of a window split by state relative to `now`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Classified {
    pub live: Vec<DatedGame>,
    pub upcoming: Vec<DatedGame>,
    pub completed: Vec<DatedGame>,
}

/// Sort window games into live / upcoming / completed, keeping order.
///
/// A scheduled game whose start time has passed is presumed completed.
pub fn classify(window: &[DatedGame], now: NaiveDateTime) -> Classified {
    let mut out = Classified::default();
    for game in window {
        match game.summary.game_status {
            GameStatus::Live => out.live.push(game.clone()),
            GameStatus::Scheduled if game.start > now => out.upcoming.push(game.clone()),
            GameStatus::Scheduled | GameStatus::Completed => out.completed.push(game.clone()),
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
pub enum Pick {
    /// Every game currently in progress.
    Live(Vec<DatedGame>),
    Single(DatedGame),
    Nothing,
}

impl Pick {
    pub fn into_games(self) -> Vec<DatedGame> {
        match self {
            Pick::Live(games) => games,
            Pick::Single(game) => vec![game],
            Pick::Nothing => Vec::new(),
        }
    }
}

/// Choose what to show: live games, else a game today, else whichever of
/// the next and last game is closer to `now`.
///
/// On an exact tie between the next and the last game the next game wins.
pub fn pick(classified: Classified, now: NaiveDateTime) -> Pick {
    let Classified {
        live,
        mut upcoming,
        mut completed,
    } = classified;

    if !live.is_empty() {
        return Pick::Live(live);
    }

    let today = now.date();
    if let Some(game) = upcoming
        .iter()
        .chain(completed.iter())
        .find(|g| g.start.date() == today)
    {
        return Pick::Single(game.clone());
    }

    match (upcoming.is_empty(), completed.pop()) {
        (false, Some(last)) => {
            let next = upcoming.swap_remove(0);
            let to_next = (next.start - now).num_seconds().abs();
            let since_last = (now - last.start).num_seconds().abs();
            if since_last < to_next {
                Pick::Single(last)
            } else {
                Pick::Single(next)
            }
        }
        (false, None) => Pick::Single(upcoming.swap_remove(0)),
        (true, Some(last)) => Pick::Single(last),
        (true, None) => Pick::Nothing,
    }
}
