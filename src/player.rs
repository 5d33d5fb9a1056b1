use std::{
    sync::Arc,
    time::Instant,
};

use dashmap::DashMap;

use crate::{
    app::{ServiceError, ServiceResult},
    game::GameId,
};

pub type PlayerUsername = String;

/// Lifecycle status of a player. `current_game` is `Some` exactly when the
/// status is not `Idle`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerStatus {
    Idle,
    InMatch,
    AwaitingRestart,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub username: PlayerUsername,
    pub status: PlayerStatus,
    pub current_game: Option<GameId>,
    pub victories: u32,
    pub defeats: u32,
    pub draws: u32,
    pub last_request_time: Instant,
    pub last_move_time: Instant,
}

impl Player {
    fn new(username: PlayerUsername) -> Self {
        let now = Instant::now();
        Self {
            username,
            status: PlayerStatus::Idle,
            current_game: None,
            victories: 0,
            defeats: 0,
            draws: 0,
            last_request_time: now,
            last_move_time: now,
        }
    }
}

pub type ArcPlayerService = Arc<Box<dyn PlayerService + Send + Sync + 'static>>;

/// Process-wide registry of every known player identity. Players are created
/// lazily on first reference and persist across games to accumulate stats.
pub trait PlayerService {
    /// Claims the player for `game_id`, creating it if unknown. Fails with
    /// `PlayerBusy` unless the player is idle. The per-entry lock makes
    /// concurrent claims resolve to exactly one winner.
    fn try_enter_game(&self, username: &PlayerUsername, game_id: GameId) -> ServiceResult<()>;
    fn get_player(&self, username: &PlayerUsername) -> Option<Player>;
    fn get_players(&self) -> Vec<Player>;
    /// Refreshes `last_request_time` only.
    fn touch_request(&self, username: &PlayerUsername);
    /// Refreshes both activity timestamps; a move counts as a request too.
    fn touch_move(&self, username: &PlayerUsername);
    fn set_status(&self, username: &PlayerUsername, status: PlayerStatus);
    /// Resets the player to `Idle` with no current game.
    fn release(&self, username: &PlayerUsername);
    fn record_victory(&self, username: &PlayerUsername);
    fn record_defeat(&self, username: &PlayerUsername);
    fn record_draw(&self, username: &PlayerUsername);
}

pub struct PlayerDirectoryImpl {
    players: Arc<DashMap<PlayerUsername, Player>>,
}

impl PlayerDirectoryImpl {
    pub fn new() -> Self {
        Self {
            players: Arc::new(DashMap::new()),
        }
    }
}

impl PlayerService for PlayerDirectoryImpl {
    fn try_enter_game(&self, username: &PlayerUsername, game_id: GameId) -> ServiceResult<()> {
        let mut entry = self
            .players
            .entry(username.clone())
            .or_insert_with(|| Player::new(username.clone()));
        if entry.status != PlayerStatus::Idle {
            return Err(ServiceError::PlayerBusy);
        }
        entry.status = PlayerStatus::InMatch;
        entry.current_game = Some(game_id);
        entry.last_request_time = Instant::now();
        Ok(())
    }

    fn get_player(&self, username: &PlayerUsername) -> Option<Player> {
        self.players.get(username).map(|entry| entry.clone())
    }

    fn get_players(&self) -> Vec<Player> {
        self.players
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    fn touch_request(&self, username: &PlayerUsername) {
        if let Some(mut entry) = self.players.get_mut(username) {
            entry.last_request_time = Instant::now();
        }
    }

    fn touch_move(&self, username: &PlayerUsername) {
        if let Some(mut entry) = self.players.get_mut(username) {
            let now = Instant::now();
            entry.last_request_time = now;
            entry.last_move_time = now;
        }
    }

    fn set_status(&self, username: &PlayerUsername, status: PlayerStatus) {
        if let Some(mut entry) = self.players.get_mut(username) {
            entry.status = status;
        }
    }

    fn release(&self, username: &PlayerUsername) {
        if let Some(mut entry) = self.players.get_mut(username) {
            entry.status = PlayerStatus::Idle;
            entry.current_game = None;
        }
    }

    fn record_victory(&self, username: &PlayerUsername) {
        if let Some(mut entry) = self.players.get_mut(username) {
            entry.victories += 1;
        }
    }

    fn record_defeat(&self, username: &PlayerUsername) {
        if let Some(mut entry) = self.players.get_mut(username) {
            entry.defeats += 1;
        }
    }

    fn record_draw(&self, username: &PlayerUsername) {
        if let Some(mut entry) = self.players.get_mut(username) {
            entry.draws += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_game_creates_player_lazily() {
        let directory = PlayerDirectoryImpl::new();
        let username = "alice".to_string();
        assert!(directory.get_player(&username).is_none());

        let game_id = GameId::new_v4();
        directory
            .try_enter_game(&username, game_id)
            .expect("Failed to enter game");

        let player = directory.get_player(&username).expect("Player not found");
        assert_eq!(player.status, PlayerStatus::InMatch);
        assert_eq!(player.current_game, Some(game_id));
    }

    #[test]
    fn test_enter_game_rejects_busy_player() {
        let directory = PlayerDirectoryImpl::new();
        let username = "alice".to_string();

        directory
            .try_enter_game(&username, GameId::new_v4())
            .expect("Failed to enter game");
        assert_eq!(
            directory.try_enter_game(&username, GameId::new_v4()),
            Err(ServiceError::PlayerBusy)
        );
    }

    #[test]
    fn test_release_resets_to_idle() {
        let directory = PlayerDirectoryImpl::new();
        let username = "alice".to_string();

        directory
            .try_enter_game(&username, GameId::new_v4())
            .expect("Failed to enter game");
        directory.release(&username);

        let player = directory.get_player(&username).expect("Player not found");
        assert_eq!(player.status, PlayerStatus::Idle);
        assert_eq!(player.current_game, None);

        // A released player can enter a new game again.
        assert!(directory.try_enter_game(&username, GameId::new_v4()).is_ok());
    }

    #[test]
    fn test_stats_accumulate_across_games() {
        let directory = PlayerDirectoryImpl::new();
        let username = "alice".to_string();

        directory
            .try_enter_game(&username, GameId::new_v4())
            .expect("Failed to enter game");
        directory.record_victory(&username);
        directory.record_victory(&username);
        directory.record_defeat(&username);
        directory.record_draw(&username);

        let player = directory.get_player(&username).expect("Player not found");
        assert_eq!(player.victories, 2);
        assert_eq!(player.defeats, 1);
        assert_eq!(player.draws, 1);
    }
}
