use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::games::GameId;
use crate::player::models::PlayerModel;
use crate::stats::models::ScoreEvent;
use crate::stats::service::StatsService;
use crate::stats::StatsError;

/// Pairs the currently active (player, game) with the stats service so a
/// finished game only has to hand over its score.
///
/// The portal runs one game at a time: the picker starts a session, the
/// game calls `complete` exactly once when it ends. `complete` consumes
/// the session, so a session can never record twice. Elapsed wall time
/// since `begin` is recorded as the event's play time.
pub struct GameSession {
    player_id: String,
    game_id: GameId,
    started_at: DateTime<Utc>,
    stats: Arc<StatsService>,
}

impl GameSession {
    pub fn begin(player_id: impl Into<String>, game_id: GameId, stats: Arc<StatsService>) -> Self {
        let session = Self {
            player_id: player_id.into(),
            game_id,
            started_at: Utc::now(),
            stats,
        };
        info!(player_id = %session.player_id, game_id = %session.game_id, "Game session started");
        session
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    pub fn game_id(&self) -> GameId {
        self.game_id
    }

    /// The single completion handoff: one integer score per session.
    #[instrument(skip(self), fields(player_id = %self.player_id, game_id = %self.game_id))]
    pub async fn complete(self, score: i64) -> Result<(ScoreEvent, PlayerModel), StatsError> {
        let time_played = (Utc::now() - self.started_at).num_seconds().max(0);

        self.stats
            .record_score(&self.player_id, self.game_id, score, time_played)
            .await
    }
}
