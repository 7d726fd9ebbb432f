// Library crate for the GamingZone portal backend
// This file exposes the public API for integration tests

pub mod games;
pub mod player;
pub mod session;
pub mod shared;
pub mod stats;

use axum::{
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};

// Re-export commonly used types for easier access in tests
pub use games::{Difficulty, GameId, GameInfo};
pub use player::{InMemoryPlayerRepository, PlayerModel, PlayerRepository, PlayerService};
pub use session::GameSession;
pub use shared::{AppError, AppState};
pub use stats::{
    InMemoryScoreRepository, LeaderboardEntry, LeaderboardService, Leveling, PlayerStats,
    ScoreEvent, ScoreRepository, StatsError, StatsService,
};

/// GET /api/health
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// GET /api/games
pub async fn list_games() -> Json<Vec<GameInfo>> {
    Json(GameId::catalog())
}

/// Builds the REST surface the front end consumes.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/games", get(list_games))
        .route("/api/players", post(player::create_player))
        .route(
            "/api/players/:id",
            get(player::get_player).delete(player::delete_player),
        )
        .route("/api/players/:id/stats", get(stats::handlers::get_player_stats))
        .route("/api/scores", post(stats::handlers::save_score))
        .route("/api/leaderboard", get(stats::handlers::get_leaderboard))
        .with_state(state)
}
