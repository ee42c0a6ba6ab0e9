use axum::{
    extract::State,
    http::{header, HeaderValue},
    routing::get,
    Json, Router,
};
use chrono::Local;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, set_header::SetResponseHeader};

use crate::cache::Refresher;
use crate::providers::{NbaProvider, SoccerProvider};

pub const ROCKETS_GAMES: &str = "rockets_games";
pub const ARSENAL_GAMES: &str = "arsenal_games";

#[derive(Clone)]
pub struct AppState {
    pub refresher: Refresher,
    pub nba: NbaProvider,
    pub soccer: SoccerProvider,
}

impl AppState {
    pub async fn rockets_games(&self) -> Value {
        let now = Local::now().naive_local();
        let default = self.nba.settings().policy.live;
        self.refresher
            .refresh(ROCKETS_GAMES, default, || self.nba.team_games(now))
            .await
    }

    pub async fn arsenal_games(&self) -> Value {
        let now = Local::now().naive_local();
        let default = self.soccer.settings().policy.live;
        self.refresher
            .refresh(ARSENAL_GAMES, default, || self.soccer.team_games(now))
            .await
    }
}

/// Build the Axum router: JSON API plus the static front-end as fallback.
pub fn router(state: AppState, static_dir: &Path) -> Router {
    let static_files = SetResponseHeader::if_not_present(
        ServeDir::new(static_dir),
        header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=86400"),
    );

    Router::new()
        .route("/api/rockets/games", get(rockets_games_handler))
        .route("/api/rockets/games/refresh", get(refresh_rockets_games_handler))
        .route("/api/arsenal/games", get(arsenal_games_handler))
        .route("/api/arsenal/games/refresh", get(refresh_arsenal_games_handler))
        .route("/api/health", get(health_handler))
        .fallback_service(static_files)
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// GET /api/rockets/games
async fn rockets_games_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(state.rockets_games().await)
}

/// GET /api/rockets/games/refresh
async fn refresh_rockets_games_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    state.refresher.invalidate(ROCKETS_GAMES).await;
    Json(state.rockets_games().await)
}

/// GET /api/arsenal/games
async fn arsenal_games_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(state.arsenal_games().await)
}

/// GET /api/arsenal/games/refresh
async fn refresh_arsenal_games_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    state.refresher.invalidate(ARSENAL_GAMES).await;
    Json(state.arsenal_games().await)
}

/// GET /api/health
async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Local::now().naive_local(),
    }))
}
