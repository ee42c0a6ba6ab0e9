pub mod logos;
pub mod models;
pub mod picker;
pub mod window;

pub use logos::{logo_key, League};
pub use models::{DatedGame, GameStatus, GameSummary, LeagueDetails, Score};
pub use picker::{classify, pick};
pub use window::select_window;
