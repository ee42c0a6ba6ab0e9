use chrono::NaiveDate;

use super::models::DatedGame;

/// Games kept on each side of today.
pub const GAMES_BEFORE: usize = 5;
pub const GAMES_AFTER: usize = 5;

/// Pick the slice of a date-sorted season schedule around `today`.
///
/// With `i` the index of the first game on or after `today`, the window is
/// `[i - 5, i + 5)` clamped to the schedule. When every game is in the past
/// the last ten games are returned instead.
pub fn select_window(games: &[DatedGame], today: NaiveDate) -> &[DatedGame] {
    let first_current = games.partition_point(|g| g.start.date() < today);

    if first_current == games.len() {
        let keep = GAMES_BEFORE + GAMES_AFTER;
        return &games[games.len().saturating_sub(keep)..];
    }

    let start = first_current.saturating_sub(GAMES_BEFORE);
    let end = (first_current + GAMES_AFTER).min(games.len());
    &games[start..end]
}
