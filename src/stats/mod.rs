pub mod handlers;
pub mod leaderboard;
pub mod models;
pub mod repository;
pub mod service;

mod errors;

pub use errors::StatsError;
pub use leaderboard::{LeaderboardService, DEFAULT_LEADERBOARD_LIMIT};
pub use models::{HighScoreModel, LeaderboardEntry, PlayerStats, ScoreEvent};
pub use repository::{InMemoryScoreRepository, PostgresScoreRepository, ScoreRepository};
pub use service::{Leveling, StatsService};
