use std::sync::Arc;
use tracing::{debug, instrument, warn};

use super::errors::StatsError;
use super::models::LeaderboardEntry;
use super::repository::ScoreRepository;
use crate::games::GameId;
use crate::player::repository::PlayerRepository;

pub const DEFAULT_LEADERBOARD_LIMIT: i64 = 10;

/// Ranks (player, game) high scores, best first.
///
/// Without a game filter the ranking is over every (player, game) pair,
/// so a player can appear once per game they hold a high score in.
pub struct LeaderboardService {
    players: Arc<dyn PlayerRepository + Send + Sync>,
    scores: Arc<dyn ScoreRepository + Send + Sync>,
}

impl LeaderboardService {
    pub fn new(
        players: Arc<dyn PlayerRepository + Send + Sync>,
        scores: Arc<dyn ScoreRepository + Send + Sync>,
    ) -> Self {
        Self { players, scores }
    }

    /// Top `limit` high scores, optionally scoped to one game.
    ///
    /// Ordering: `high_score` descending, ties broken by earliest
    /// `achieved_at`, then insertion order. A row whose player no longer
    /// resolves is skipped so a stale reference can never break the read.
    #[instrument(skip(self))]
    pub async fn get_leaderboard(
        &self,
        game_id: Option<GameId>,
        limit: i64,
    ) -> Result<Vec<LeaderboardEntry>, StatsError> {
        if limit <= 0 {
            return Err(StatsError::InvalidArgument(format!(
                "Leaderboard limit must be positive, got {}",
                limit
            )));
        }

        let rows = self.scores.game_high_scores(game_id).await?;
        debug!(candidate_rows = rows.len(), "Ranking high scores");

        let mut entries = Vec::new();
        for row in rows {
            if entries.len() as i64 == limit {
                break;
            }

            match self.players.get_player(&row.player_id).await? {
                Some(player) => entries.push(LeaderboardEntry {
                    player,
                    game_id: row.game_id,
                    high_score: row.high_score,
                    achieved_at: row.achieved_at,
                }),
                None => {
                    warn!(
                        player_id = %row.player_id,
                        game_id = %row.game_id,
                        "Skipping high score for missing player"
                    );
                }
            }
        }

        Ok(entries)
    }
}
