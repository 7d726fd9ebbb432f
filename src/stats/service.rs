use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex as AsyncMutex, RwLock};
use tracing::{debug, info, instrument};

use super::errors::StatsError;
use super::models::{HighScoreModel, PlayerStats, ScoreEvent};
use super::repository::ScoreRepository;
use crate::games::GameId;
use crate::player::models::PlayerModel;
use crate::player::repository::PlayerRepository;

/// Policy for deriving a player's level from their cumulative totals.
///
/// The portal shipped with two formulas over its lifetime; both are kept
/// selectable. Whichever is active, the stored level never goes down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Leveling {
    /// One level per five minutes of recorded play time.
    PlayTime,
    /// One level per hundred points of cumulative score.
    #[default]
    TotalScore,
}

impl Leveling {
    pub fn level_for(&self, total_play_time: i64, total_score: i64) -> i64 {
        match self {
            Leveling::PlayTime => total_play_time / 300 + 1,
            Leveling::TotalScore => total_score / 100 + 1,
        }
    }
}

/// Turns the append-only score event log into derived player state.
///
/// Only this service writes the derived Player fields and the high score
/// projection, and only for the player a call was invoked with. Writes
/// for one player are serialized behind a per-player lock so the derived
/// fields never observe a partially applied event.
pub struct StatsService {
    players: Arc<dyn PlayerRepository + Send + Sync>,
    scores: Arc<dyn ScoreRepository + Send + Sync>,
    leveling: Leveling,
    player_mutexes: Arc<RwLock<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl StatsService {
    pub fn new(
        players: Arc<dyn PlayerRepository + Send + Sync>,
        scores: Arc<dyn ScoreRepository + Send + Sync>,
        leveling: Leveling,
    ) -> Self {
        Self {
            players,
            scores,
            leveling,
            player_mutexes: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Records one completed game session and recomputes the player's
    /// derived state.
    ///
    /// Fails closed: an unresolvable player or invalid input leaves every
    /// store untouched, and if the event write fails the derived fields
    /// are not recomputed.
    #[instrument(skip(self))]
    pub async fn record_score(
        &self,
        player_id: &str,
        game_id: GameId,
        score: i64,
        time_played: i64,
    ) -> Result<(ScoreEvent, PlayerModel), StatsError> {
        if score < 0 {
            return Err(StatsError::InvalidScore(format!(
                "Score must be a non-negative integer, got {}",
                score
            )));
        }
        if time_played < 0 {
            return Err(StatsError::InvalidArgument(format!(
                "Time played must be non-negative, got {}",
                time_played
            )));
        }

        let player_lock = self.player_lock(player_id).await;
        let _guard = player_lock.lock().await;

        let player = self
            .players
            .get_player(player_id)
            .await?
            .ok_or_else(|| StatsError::PlayerNotFound(player_id.to_string()))?;

        let event = ScoreEvent::new(player_id.to_string(), game_id, score, time_played);
        self.scores.append_event(&event).await?;

        self.apply_high_score(&event).await?;
        let updated = self.recompute_player(player).await?;

        info!(
            player_id = %player_id,
            game_id = %game_id,
            score,
            games_played = updated.games_played,
            level = updated.level,
            "Score recorded"
        );

        Ok((event, updated))
    }

    /// Read-only stats projection for one player
    ///
    /// The totals are recomputed from the raw event history; the stored
    /// Player row must always agree with them.
    #[instrument(skip(self))]
    pub async fn get_player_stats(
        &self,
        player_id: &str,
        recent_limit: usize,
    ) -> Result<PlayerStats, StatsError> {
        let player = self
            .players
            .get_player(player_id)
            .await?
            .ok_or_else(|| StatsError::PlayerNotFound(player_id.to_string()))?;

        let history = self.scores.events_for_player(player_id, None).await?;
        let total_games = history.len() as i64;
        let total_score: i64 = history.iter().map(|e| e.score).sum();
        let average_score = average(total_score, total_games);

        let high_scores: HashMap<GameId, i64> = self
            .scores
            .player_high_scores(player_id)
            .await?
            .into_iter()
            .map(|hs| (hs.game_id, hs.high_score))
            .collect();

        let recent_scores = self.scores.recent_events(player_id, recent_limit).await?;

        Ok(PlayerStats {
            player,
            total_games,
            total_score,
            average_score,
            high_scores,
            recent_scores,
        })
    }

    /// Creates or raises the (player, game) high score. Strict
    /// greater-than: an equal score keeps the original `achieved_at`.
    async fn apply_high_score(&self, event: &ScoreEvent) -> Result<(), StatsError> {
        let existing = self
            .scores
            .high_score(&event.player_id, event.game_id)
            .await?;

        match existing {
            None => {
                let fresh = HighScoreModel::new(
                    event.player_id.clone(),
                    event.game_id,
                    event.score,
                    event.created_at,
                );
                self.scores.upsert_high_score(&fresh).await
            }
            Some(current) if event.score > current.high_score => {
                debug!(
                    player_id = %event.player_id,
                    game_id = %event.game_id,
                    old = current.high_score,
                    new = event.score,
                    "New high score"
                );
                let raised = HighScoreModel {
                    high_score: event.score,
                    achieved_at: event.created_at,
                    ..current
                };
                self.scores.upsert_high_score(&raised).await
            }
            Some(_) => Ok(()),
        }
    }

    /// Rebuilds the derived Player fields from the full event history and
    /// persists them.
    async fn recompute_player(&self, mut player: PlayerModel) -> Result<PlayerModel, StatsError> {
        let history = self
            .scores
            .events_for_player(&player.id, None)
            .await?;

        player.games_played = history.len() as i64;
        player.total_score = history.iter().map(|e| e.score).sum();
        player.total_play_time = history.iter().map(|e| e.time_played).sum();
        player.average_score = average(player.total_score, player.games_played);

        player.high_score = self
            .scores
            .player_high_scores(&player.id)
            .await?
            .iter()
            .map(|hs| hs.high_score)
            .max()
            .unwrap_or(0);

        // Levels only ever go up.
        player.level = player
            .level
            .max(self.leveling.level_for(player.total_play_time, player.total_score));

        self.players.update_player(&player).await?;
        Ok(player)
    }

    async fn player_lock(&self, player_id: &str) -> Arc<AsyncMutex<()>> {
        {
            let guard = self.player_mutexes.read().await;
            if let Some(lock) = guard.get(player_id) {
                return lock.clone();
            }
        }

        let mut guard = self.player_mutexes.write().await;
        guard
            .entry(player_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}

fn average(total_score: i64, games_played: i64) -> i64 {
    if games_played == 0 {
        0
    } else {
        (total_score as f64 / games_played as f64).round() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::repository::InMemoryPlayerRepository;
    use crate::stats::repository::InMemoryScoreRepository;
    use rstest::rstest;

    struct Fixture {
        players: Arc<InMemoryPlayerRepository>,
        scores: Arc<InMemoryScoreRepository>,
        service: StatsService,
    }

    fn fixture(leveling: Leveling) -> Fixture {
        let players = Arc::new(InMemoryPlayerRepository::new());
        let scores = Arc::new(InMemoryScoreRepository::new());
        let service = StatsService::new(players.clone(), scores.clone(), leveling);
        Fixture {
            players,
            scores,
            service,
        }
    }

    async fn register(fixture: &Fixture, name: &str) -> PlayerModel {
        let player = PlayerModel::new(name.to_string());
        fixture.players.create_player(&player).await.unwrap();
        player
    }

    #[tokio::test]
    async fn test_two_scores_aggregate_into_player_stats() {
        let fx = fixture(Leveling::default());
        let ana = register(&fx, "Ana").await;

        fx.service
            .record_score(&ana.id, GameId::TicTacToe, 10, 0)
            .await
            .unwrap();
        fx.service
            .record_score(&ana.id, GameId::TicTacToe, 7, 0)
            .await
            .unwrap();

        let stats = fx.service.get_player_stats(&ana.id, 10).await.unwrap();
        assert_eq!(stats.total_games, 2);
        assert_eq!(stats.total_score, 17);
        assert_eq!(stats.average_score, 9); // round(8.5)
        assert_eq!(stats.high_scores.get(&GameId::TicTacToe), Some(&10));
        assert_eq!(stats.recent_scores.len(), 2);
        assert_eq!(stats.recent_scores[0].score, 7); // Newest first
    }

    #[tokio::test]
    async fn test_cached_fields_match_recomputed_projection() {
        let fx = fixture(Leveling::default());
        let player = register(&fx, "Ana").await;

        for (game, score, time) in [
            (GameId::QuickMath, 120, 30),
            (GameId::TicTacToe, 0, 45),
            (GameId::QuickMath, 95, 10),
            (GameId::SimonSays, 310, 200),
        ] {
            fx.service
                .record_score(&player.id, game, score, time)
                .await
                .unwrap();
        }

        let stats = fx.service.get_player_stats(&player.id, 10).await.unwrap();
        let cached = fx.players.get_player(&player.id).await.unwrap().unwrap();

        assert_eq!(cached.games_played, stats.total_games);
        assert_eq!(cached.total_score, stats.total_score);
        assert_eq!(cached.average_score, stats.average_score);
        assert_eq!(
            cached.high_score,
            stats.high_scores.values().copied().max().unwrap()
        );
    }

    #[tokio::test]
    async fn test_player_high_score_is_max_across_games() {
        let fx = fixture(Leveling::default());
        let player = register(&fx, "Ana").await;

        fx.service
            .record_score(&player.id, GameId::TicTacToe, 40, 0)
            .await
            .unwrap();
        let (_, updated) = fx
            .service
            .record_score(&player.id, GameId::QuickMath, 90, 0)
            .await
            .unwrap();

        assert_eq!(updated.high_score, 90);
    }

    #[tokio::test]
    async fn test_unknown_player_fails_closed() {
        let fx = fixture(Leveling::default());

        let result = fx
            .service
            .record_score("nonexistent-id", GameId::TicTacToe, 10, 0)
            .await;
        assert!(matches!(result, Err(StatsError::PlayerNotFound(_))));

        // Nothing was written anywhere.
        assert!(fx
            .scores
            .events_for_player("nonexistent-id", None)
            .await
            .unwrap()
            .is_empty());
        assert!(fx
            .scores
            .player_high_scores("nonexistent-id")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_negative_score_is_rejected_before_any_write() {
        let fx = fixture(Leveling::default());
        let player = register(&fx, "Ana").await;

        let result = fx
            .service
            .record_score(&player.id, GameId::TicTacToe, -1, 0)
            .await;
        assert!(matches!(result, Err(StatsError::InvalidScore(_))));

        let result = fx
            .service
            .record_score(&player.id, GameId::TicTacToe, 5, -3)
            .await;
        assert!(matches!(result, Err(StatsError::InvalidArgument(_))));

        assert!(fx
            .scores
            .events_for_player(&player.id, None)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_zero_is_a_valid_score() {
        let fx = fixture(Leveling::default());
        let player = register(&fx, "Ana").await;

        let (event, updated) = fx
            .service
            .record_score(&player.id, GameId::ReactionTime, 0, 5)
            .await
            .unwrap();

        assert_eq!(event.score, 0);
        assert_eq!(updated.games_played, 1);
        assert_eq!(updated.average_score, 0);
    }

    #[tokio::test]
    async fn test_tied_score_keeps_original_achieved_at() {
        let fx = fixture(Leveling::default());
        let player = register(&fx, "Ana").await;

        fx.service
            .record_score(&player.id, GameId::WordScramble, 5, 0)
            .await
            .unwrap();
        let original = fx
            .scores
            .high_score(&player.id, GameId::WordScramble)
            .await
            .unwrap()
            .unwrap();

        fx.service
            .record_score(&player.id, GameId::WordScramble, 5, 0)
            .await
            .unwrap();
        let after_tie = fx
            .scores
            .high_score(&player.id, GameId::WordScramble)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(after_tie.high_score, 5);
        assert_eq!(after_tie.achieved_at, original.achieved_at);

        // A strictly greater score does move it.
        let (event, _) = fx
            .service
            .record_score(&player.id, GameId::WordScramble, 6, 0)
            .await
            .unwrap();
        let raised = fx
            .scores
            .high_score(&player.id, GameId::WordScramble)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(raised.high_score, 6);
        assert_eq!(raised.achieved_at, event.created_at);
    }

    #[rstest]
    #[case(Leveling::TotalScore, 0, 99, 1)]
    #[case(Leveling::TotalScore, 0, 100, 2)]
    #[case(Leveling::TotalScore, 0, 250, 3)]
    #[case(Leveling::PlayTime, 299, 0, 1)]
    #[case(Leveling::PlayTime, 300, 0, 2)]
    #[case(Leveling::PlayTime, 1500, 0, 6)]
    fn test_leveling_thresholds(
        #[case] leveling: Leveling,
        #[case] total_play_time: i64,
        #[case] total_score: i64,
        #[case] expected: i64,
    ) {
        assert_eq!(leveling.level_for(total_play_time, total_score), expected);
    }

    #[tokio::test]
    async fn test_derived_fields_never_decrease() {
        let fx = fixture(Leveling::TotalScore);
        let player = register(&fx, "Ana").await;

        let mut last_games = 0;
        let mut last_total = 0;
        let mut last_level = 0;
        for score in [250, 0, 10, 0] {
            let (_, updated) = fx
                .service
                .record_score(&player.id, GameId::QuickMath, score, 0)
                .await
                .unwrap();
            assert!(updated.games_played > last_games);
            assert!(updated.total_score >= last_total);
            assert!(updated.level >= last_level);
            last_games = updated.games_played;
            last_total = updated.total_score;
            last_level = updated.level;
        }

        assert_eq!(last_level, 3); // 260 total -> floor(260 / 100) + 1
    }

    #[tokio::test]
    async fn test_stats_for_fresh_player_are_zeroed() {
        let fx = fixture(Leveling::default());
        let player = register(&fx, "Ana").await;

        let stats = fx.service.get_player_stats(&player.id, 5).await.unwrap();
        assert_eq!(stats.total_games, 0);
        assert_eq!(stats.total_score, 0);
        assert_eq!(stats.average_score, 0);
        assert!(stats.high_scores.is_empty());
        assert!(stats.recent_scores.is_empty());
    }

    #[tokio::test]
    async fn test_recent_limit_is_caller_supplied() {
        let fx = fixture(Leveling::default());
        let player = register(&fx, "Ana").await;

        for score in 0..8 {
            fx.service
                .record_score(&player.id, GameId::TypingSpeed, score, 0)
                .await
                .unwrap();
        }

        let stats = fx.service.get_player_stats(&player.id, 5).await.unwrap();
        assert_eq!(stats.recent_scores.len(), 5);
        assert_eq!(stats.total_games, 8);
    }

    #[tokio::test]
    async fn test_concurrent_records_for_one_player_all_land() {
        let fx = fixture(Leveling::default());
        let player = register(&fx, "Ana").await;

        let service = Arc::new(fx.service);
        let handles = (0..10)
            .map(|i| {
                let service = Arc::clone(&service);
                let player_id = player.id.clone();
                tokio::spawn(async move {
                    service
                        .record_score(&player_id, GameId::QuickMath, i * 10, 1)
                        .await
                })
            })
            .collect::<Vec<_>>();

        let results = futures::future::join_all(handles).await;
        assert!(results.into_iter().all(|r| r.unwrap().is_ok()));

        let updated = fx.players.get_player(&player.id).await.unwrap().unwrap();
        assert_eq!(updated.games_played, 10);
        assert_eq!(updated.total_score, 450); // 0 + 10 + ... + 90
        assert_eq!(updated.high_score, 90);
        assert_eq!(updated.total_play_time, 10);
    }
}
