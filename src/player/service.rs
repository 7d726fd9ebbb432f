use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::models::PlayerModel;
use super::repository::PlayerRepository;
use crate::shared::AppError;
use crate::stats::repository::ScoreRepository;

/// Service for player lifecycle: registration, lookup and the
/// administrative cascading delete.
pub struct PlayerService {
    players: Arc<dyn PlayerRepository + Send + Sync>,
    scores: Arc<dyn ScoreRepository + Send + Sync>,
}

impl PlayerService {
    pub fn new(
        players: Arc<dyn PlayerRepository + Send + Sync>,
        scores: Arc<dyn ScoreRepository + Send + Sync>,
    ) -> Self {
        Self { players, scores }
    }

    /// Registers a new player. Names need not be unique; two
    /// registrations with the same name are distinct players.
    #[instrument(skip(self))]
    pub async fn register_player(&self, name: &str) -> Result<PlayerModel, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("Name is required".to_string()));
        }

        let player = PlayerModel::new(name.to_string());
        debug!(player_id = %player.id, "Generated player ID");

        self.players.create_player(&player).await?;

        info!(player_id = %player.id, name = %player.name, "Player registered");
        Ok(player)
    }

    #[instrument(skip(self))]
    pub async fn get_player(&self, player_id: &str) -> Result<PlayerModel, AppError> {
        self.players
            .get_player(player_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Player not found".to_string()))
    }

    /// Deletes a player and everything hanging off them: score events
    /// first, then high scores, then the player row.
    #[instrument(skip(self))]
    pub async fn delete_player(&self, player_id: &str) -> Result<(), AppError> {
        // Resolve first so an unknown id fails before any cascade work.
        self.get_player(player_id).await?;

        self.scores
            .delete_player_data(player_id)
            .await
            .map_err(AppError::from)?;
        self.players.delete_player(player_id).await?;

        info!(player_id = %player_id, "Player deleted with cascading score data");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::GameId;
    use crate::player::repository::InMemoryPlayerRepository;
    use crate::stats::models::{HighScoreModel, ScoreEvent};
    use crate::stats::repository::InMemoryScoreRepository;
    use chrono::Utc;

    fn service() -> (
        Arc<InMemoryPlayerRepository>,
        Arc<InMemoryScoreRepository>,
        PlayerService,
    ) {
        let players = Arc::new(InMemoryPlayerRepository::new());
        let scores = Arc::new(InMemoryScoreRepository::new());
        let service = PlayerService::new(players.clone(), scores.clone());
        (players, scores, service)
    }

    #[tokio::test]
    async fn test_register_player() {
        let (players, _, service) = service();

        let player = service.register_player("Ana").await.unwrap();
        assert_eq!(player.name, "Ana");
        assert_eq!(player.avatar, "A");
        assert_eq!(player.level, 1);

        let stored = players.get_player(&player.id).await.unwrap();
        assert!(stored.is_some());
    }

    #[tokio::test]
    async fn test_register_trims_whitespace() {
        let (_, _, service) = service();

        let player = service.register_player("  Ana  ").await.unwrap();
        assert_eq!(player.name, "Ana");
    }

    #[tokio::test]
    async fn test_register_rejects_blank_names() {
        let (_, _, service) = service();

        for name in ["", "   "] {
            let result = service.register_player(name).await;
            assert!(matches!(result, Err(AppError::BadRequest(_))));
        }
    }

    #[tokio::test]
    async fn test_get_unknown_player_is_not_found() {
        let (_, _, service) = service();

        let result = service.get_player("nonexistent-id").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_cascades_to_score_data() {
        let (_, scores, service) = service();

        let player = service.register_player("Ana").await.unwrap();
        scores
            .append_event(&ScoreEvent::new(
                player.id.clone(),
                GameId::TicTacToe,
                10,
                0,
            ))
            .await
            .unwrap();
        scores
            .upsert_high_score(&HighScoreModel::new(
                player.id.clone(),
                GameId::TicTacToe,
                10,
                Utc::now(),
            ))
            .await
            .unwrap();

        service.delete_player(&player.id).await.unwrap();

        assert!(matches!(
            service.get_player(&player.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(scores
            .events_for_player(&player.id, None)
            .await
            .unwrap()
            .is_empty());
        assert!(scores.player_high_scores(&player.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_unknown_player_is_not_found() {
        let (_, _, service) = service();

        let result = service.delete_player("nonexistent-id").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
