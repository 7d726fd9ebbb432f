use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use super::errors::StatsError;
use super::models::{HighScoreModel, ScoreEvent};
use crate::games::GameId;

/// Persistence contract for score events and cached high scores
///
/// Events are append-only. High scores are a keyed projection, one row
/// per (player, game); the strict-greater replacement rule lives in the
/// stats service, the repository just writes what it is given.
#[async_trait]
pub trait ScoreRepository {
    async fn append_event(&self, event: &ScoreEvent) -> Result<(), StatsError>;

    /// Full event history for a player, newest first, optionally scoped
    /// to one game.
    async fn events_for_player(
        &self,
        player_id: &str,
        game_id: Option<GameId>,
    ) -> Result<Vec<ScoreEvent>, StatsError>;

    async fn recent_events(
        &self,
        player_id: &str,
        limit: usize,
    ) -> Result<Vec<ScoreEvent>, StatsError>;

    async fn high_score(
        &self,
        player_id: &str,
        game_id: GameId,
    ) -> Result<Option<HighScoreModel>, StatsError>;

    async fn upsert_high_score(&self, high_score: &HighScoreModel) -> Result<(), StatsError>;

    async fn player_high_scores(&self, player_id: &str)
        -> Result<Vec<HighScoreModel>, StatsError>;

    /// High scores for the leaderboard, best first. Ties are ordered by
    /// earliest `achieved_at`, then by insertion order.
    async fn game_high_scores(
        &self,
        game_id: Option<GameId>,
    ) -> Result<Vec<HighScoreModel>, StatsError>;

    /// Removes all of a player's events and high scores. Part of the
    /// cascading delete; succeeds even when the player has no data.
    async fn delete_player_data(&self, player_id: &str) -> Result<(), StatsError>;
}

/// In-memory implementation of ScoreRepository for development and testing
#[derive(Debug, Default)]
pub struct InMemoryScoreRepository {
    events: Arc<RwLock<Vec<ScoreEvent>>>,
    high_scores: Arc<RwLock<Vec<HighScoreModel>>>,
}

impl InMemoryScoreRepository {
    pub fn new() -> Self {
        Self {
            events: Arc::new(RwLock::new(Vec::new())),
            high_scores: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

#[async_trait]
impl ScoreRepository for InMemoryScoreRepository {
    #[instrument(skip(self, event))]
    async fn append_event(&self, event: &ScoreEvent) -> Result<(), StatsError> {
        debug!(event_id = %event.id, player_id = %event.player_id, "Appending score event in memory");

        let mut events = self.events.write().await;
        events.push(event.clone());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn events_for_player(
        &self,
        player_id: &str,
        game_id: Option<GameId>,
    ) -> Result<Vec<ScoreEvent>, StatsError> {
        let events = self.events.read().await;
        // Reverse before the stable sort so events sharing a timestamp
        // still come out newest first.
        let mut history: Vec<ScoreEvent> = events
            .iter()
            .rev()
            .filter(|e| e.player_id == player_id)
            .filter(|e| game_id.map_or(true, |g| e.game_id == g))
            .cloned()
            .collect();
        history.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(history)
    }

    #[instrument(skip(self))]
    async fn recent_events(
        &self,
        player_id: &str,
        limit: usize,
    ) -> Result<Vec<ScoreEvent>, StatsError> {
        let mut history = self.events_for_player(player_id, None).await?;
        history.truncate(limit);
        Ok(history)
    }

    #[instrument(skip(self))]
    async fn high_score(
        &self,
        player_id: &str,
        game_id: GameId,
    ) -> Result<Option<HighScoreModel>, StatsError> {
        let high_scores = self.high_scores.read().await;
        Ok(high_scores
            .iter()
            .find(|hs| hs.player_id == player_id && hs.game_id == game_id)
            .cloned())
    }

    #[instrument(skip(self, high_score))]
    async fn upsert_high_score(&self, high_score: &HighScoreModel) -> Result<(), StatsError> {
        debug!(
            player_id = %high_score.player_id,
            game_id = %high_score.game_id,
            value = high_score.high_score,
            "Upserting high score in memory"
        );

        let mut high_scores = self.high_scores.write().await;
        match high_scores
            .iter_mut()
            .find(|hs| hs.player_id == high_score.player_id && hs.game_id == high_score.game_id)
        {
            Some(existing) => *existing = high_score.clone(),
            None => high_scores.push(high_score.clone()),
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn player_high_scores(
        &self,
        player_id: &str,
    ) -> Result<Vec<HighScoreModel>, StatsError> {
        let high_scores = self.high_scores.read().await;
        Ok(high_scores
            .iter()
            .filter(|hs| hs.player_id == player_id)
            .cloned()
            .collect())
    }

    #[instrument(skip(self))]
    async fn game_high_scores(
        &self,
        game_id: Option<GameId>,
    ) -> Result<Vec<HighScoreModel>, StatsError> {
        let high_scores = self.high_scores.read().await;
        let mut rows: Vec<HighScoreModel> = high_scores
            .iter()
            .filter(|hs| game_id.map_or(true, |g| hs.game_id == g))
            .cloned()
            .collect();
        // Stable sort keeps insertion order for full ties.
        rows.sort_by(|a, b| {
            b.high_score
                .cmp(&a.high_score)
                .then(a.achieved_at.cmp(&b.achieved_at))
        });
        Ok(rows)
    }

    #[instrument(skip(self))]
    async fn delete_player_data(&self, player_id: &str) -> Result<(), StatsError> {
        debug!(player_id = %player_id, "Deleting player score data from memory");

        let mut events = self.events.write().await;
        events.retain(|e| e.player_id != player_id);

        let mut high_scores = self.high_scores.write().await;
        high_scores.retain(|hs| hs.player_id != player_id);

        Ok(())
    }
}

/// PostgreSQL implementation of score repository
pub struct PostgresScoreRepository {
    pool: PgPool,
}

impl PostgresScoreRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn parse_game_id(raw: String) -> Result<GameId, StatsError> {
    GameId::try_from(raw.as_str())
        .map_err(|bad| StatsError::Persistence(format!("Unknown game id in database: {}", bad)))
}

fn event_from_row(row: &sqlx::postgres::PgRow) -> Result<ScoreEvent, StatsError> {
    Ok(ScoreEvent {
        id: row.get("id"),
        player_id: row.get("player_id"),
        game_id: parse_game_id(row.get("game_id"))?,
        score: row.get("score"),
        time_played: row.get("time_played"),
        created_at: row.get("created_at"),
    })
}

fn high_score_from_row(row: &sqlx::postgres::PgRow) -> Result<HighScoreModel, StatsError> {
    Ok(HighScoreModel {
        id: row.get("id"),
        player_id: row.get("player_id"),
        game_id: parse_game_id(row.get("game_id"))?,
        high_score: row.get("high_score"),
        achieved_at: row.get("achieved_at"),
    })
}

#[async_trait]
impl ScoreRepository for PostgresScoreRepository {
    #[instrument(skip(self, event))]
    async fn append_event(&self, event: &ScoreEvent) -> Result<(), StatsError> {
        debug!(event_id = %event.id, player_id = %event.player_id, "Appending score event in database");

        sqlx::query(
            "INSERT INTO game_scores (id, player_id, game_id, score, time_played, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&event.id)
        .bind(&event.player_id)
        .bind(event.game_id.to_string())
        .bind(event.score)
        .bind(event.time_played)
        .bind(event.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to append score event");
            StatsError::Persistence(e.to_string())
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn events_for_player(
        &self,
        player_id: &str,
        game_id: Option<GameId>,
    ) -> Result<Vec<ScoreEvent>, StatsError> {
        let rows = match game_id {
            Some(game) => {
                sqlx::query(
                    "SELECT id, player_id, game_id, score, time_played, created_at \
                     FROM game_scores WHERE player_id = $1 AND game_id = $2 \
                     ORDER BY created_at DESC",
                )
                .bind(player_id)
                .bind(game.to_string())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    "SELECT id, player_id, game_id, score, time_played, created_at \
                     FROM game_scores WHERE player_id = $1 \
                     ORDER BY created_at DESC",
                )
                .bind(player_id)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| {
            warn!(error = %e, player_id = %player_id, "Failed to fetch score events");
            StatsError::Persistence(e.to_string())
        })?;

        rows.iter().map(event_from_row).collect()
    }

    #[instrument(skip(self))]
    async fn recent_events(
        &self,
        player_id: &str,
        limit: usize,
    ) -> Result<Vec<ScoreEvent>, StatsError> {
        let rows = sqlx::query(
            "SELECT id, player_id, game_id, score, time_played, created_at \
             FROM game_scores WHERE player_id = $1 \
             ORDER BY created_at DESC LIMIT $2",
        )
        .bind(player_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, player_id = %player_id, "Failed to fetch recent score events");
            StatsError::Persistence(e.to_string())
        })?;

        rows.iter().map(event_from_row).collect()
    }

    #[instrument(skip(self))]
    async fn high_score(
        &self,
        player_id: &str,
        game_id: GameId,
    ) -> Result<Option<HighScoreModel>, StatsError> {
        let row = sqlx::query(
            "SELECT id, player_id, game_id, high_score, achieved_at \
             FROM high_scores WHERE player_id = $1 AND game_id = $2",
        )
        .bind(player_id)
        .bind(game_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, player_id = %player_id, "Failed to fetch high score");
            StatsError::Persistence(e.to_string())
        })?;

        row.as_ref().map(high_score_from_row).transpose()
    }

    #[instrument(skip(self, high_score))]
    async fn upsert_high_score(&self, high_score: &HighScoreModel) -> Result<(), StatsError> {
        debug!(
            player_id = %high_score.player_id,
            game_id = %high_score.game_id,
            value = high_score.high_score,
            "Upserting high score in database"
        );

        sqlx::query(
            "INSERT INTO high_scores (id, player_id, game_id, high_score, achieved_at) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (player_id, game_id) \
             DO UPDATE SET high_score = EXCLUDED.high_score, achieved_at = EXCLUDED.achieved_at",
        )
        .bind(&high_score.id)
        .bind(&high_score.player_id)
        .bind(high_score.game_id.to_string())
        .bind(high_score.high_score)
        .bind(high_score.achieved_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to upsert high score");
            StatsError::Persistence(e.to_string())
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn player_high_scores(
        &self,
        player_id: &str,
    ) -> Result<Vec<HighScoreModel>, StatsError> {
        let rows = sqlx::query(
            "SELECT id, player_id, game_id, high_score, achieved_at \
             FROM high_scores WHERE player_id = $1",
        )
        .bind(player_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, player_id = %player_id, "Failed to fetch player high scores");
            StatsError::Persistence(e.to_string())
        })?;

        rows.iter().map(high_score_from_row).collect()
    }

    #[instrument(skip(self))]
    async fn game_high_scores(
        &self,
        game_id: Option<GameId>,
    ) -> Result<Vec<HighScoreModel>, StatsError> {
        let rows = match game_id {
            Some(game) => {
                sqlx::query(
                    "SELECT id, player_id, game_id, high_score, achieved_at \
                     FROM high_scores WHERE game_id = $1 \
                     ORDER BY high_score DESC, achieved_at ASC",
                )
                .bind(game.to_string())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    "SELECT id, player_id, game_id, high_score, achieved_at \
                     FROM high_scores \
                     ORDER BY high_score DESC, achieved_at ASC",
                )
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| {
            warn!(error = %e, "Failed to fetch leaderboard high scores");
            StatsError::Persistence(e.to_string())
        })?;

        rows.iter().map(high_score_from_row).collect()
    }

    #[instrument(skip(self))]
    async fn delete_player_data(&self, player_id: &str) -> Result<(), StatsError> {
        debug!(player_id = %player_id, "Deleting player score data from database");

        sqlx::query("DELETE FROM game_scores WHERE player_id = $1")
            .bind(player_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, player_id = %player_id, "Failed to delete score events");
                StatsError::Persistence(e.to_string())
            })?;

        sqlx::query("DELETE FROM high_scores WHERE player_id = $1")
            .bind(player_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, player_id = %player_id, "Failed to delete high scores");
                StatsError::Persistence(e.to_string())
            })?;

        Ok(())
    }
}
