use std::sync::Arc;

use dashmap::DashMap;
use ttt_core::{TttBoard, TttGameState, TttOutcome, TttPos, TttSide};
use uuid::Uuid;

use crate::{
    app::{ServiceError, ServiceResult},
    player::{ArcPlayerService, PlayerService, PlayerStatus, PlayerUsername},
};

pub type GameId = Uuid;

/// Lifecycle of a game. The outcome exists exactly as long as the game is
/// concluded; a completed rematch handshake drops it together with the
/// transition back to `InProgress`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameStatus {
    AwaitingOpponent,
    InProgress,
    Concluded(TttOutcome),
}

/// Per-side win counts plus draws, cumulative across rematch rounds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScoreTally {
    pub x_wins: u32,
    pub o_wins: u32,
    pub draws: u32,
}

#[derive(Clone, Debug)]
pub struct Game {
    pub id: GameId,
    pub board: TttBoard,
    pub x_player: Option<PlayerUsername>,
    pub o_player: Option<PlayerUsername>,
    /// Side to move. X opens every round.
    pub turn: TttSide,
    pub status: GameStatus,
    pub tally: ScoreTally,
    /// Participants that have consented to a rematch of the current
    /// concluded round. Cleared when the next round starts.
    rematch_acks: Vec<PlayerUsername>,
}

impl Game {
    fn new(id: GameId, creator: PlayerUsername, side: TttSide) -> Self {
        let (x_player, o_player) = match side {
            TttSide::X => (Some(creator), None),
            TttSide::O => (None, Some(creator)),
        };
        Self {
            id,
            board: TttBoard::new(),
            x_player,
            o_player,
            turn: TttSide::X,
            status: GameStatus::AwaitingOpponent,
            tally: ScoreTally::default(),
            rematch_acks: Vec::new(),
        }
    }

    pub fn seat_of(&self, username: &PlayerUsername) -> Option<TttSide> {
        if self.x_player.as_ref() == Some(username) {
            Some(TttSide::X)
        } else if self.o_player.as_ref() == Some(username) {
            Some(TttSide::O)
        } else {
            None
        }
    }

    pub fn player_of(&self, side: TttSide) -> Option<&PlayerUsername> {
        match side {
            TttSide::X => self.x_player.as_ref(),
            TttSide::O => self.o_player.as_ref(),
        }
    }

    pub fn participants(&self) -> Vec<PlayerUsername> {
        self.x_player
            .iter()
            .chain(self.o_player.iter())
            .cloned()
            .collect()
    }

    pub fn num_players(&self) -> usize {
        self.x_player.iter().chain(self.o_player.iter()).count()
    }
}

/// Read-only projection of a game for one participant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameView {
    /// Row-major cells, index `3 * x + y`.
    pub cells: [Option<TttSide>; 9],
    pub turn: TttSide,
    pub side: TttSide,
    pub tally: ScoreTally,
    pub num_players: usize,
}

pub type ArcGameService = Arc<Box<dyn GameService + Send + Sync + 'static>>;

pub trait GameService {
    fn create_game(&self, username: &PlayerUsername) -> ServiceResult<(GameId, TttSide)>;
    fn join_game(&self, username: &PlayerUsername, game_id: &GameId) -> ServiceResult<TttSide>;
    fn make_move(
        &self,
        username: &PlayerUsername,
        game_id: &GameId,
        pos: TttPos,
    ) -> ServiceResult<GameStatus>;
    fn get_view(&self, username: &PlayerUsername, game_id: &GameId) -> ServiceResult<GameView>;
    fn request_rematch(
        &self,
        username: &PlayerUsername,
        game_id: &GameId,
    ) -> ServiceResult<TttSide>;
    fn get_game(&self, game_id: &GameId) -> Option<Game>;
    /// Removes the game and resets every participant to idle. Used by the
    /// reaper; acquires the same per-game entry lock as the foreground
    /// operations, so an in-flight move completes before eviction.
    fn evict_game(&self, game_id: &GameId) -> bool;
}

#[derive(Clone)]
pub struct GameServiceImpl {
    player_service: ArcPlayerService,
    games: Arc<DashMap<GameId, Game>>,
}

impl GameServiceImpl {
    pub fn new(player_service: ArcPlayerService) -> Self {
        Self {
            player_service,
            games: Arc::new(DashMap::new()),
        }
    }

    fn random_side() -> TttSide {
        if rand::random() {
            TttSide::X
        } else {
            TttSide::O
        }
    }

    fn record_conclusion(&self, game: &Game, outcome: TttOutcome) {
        match outcome {
            TttOutcome::Win(winner_side) => {
                if let Some(winner) = game.player_of(winner_side) {
                    self.player_service.record_victory(winner);
                }
                if let Some(loser) = game.player_of(winner_side.opponent()) {
                    self.player_service.record_defeat(loser);
                }
            }
            TttOutcome::Draw => {
                for participant in game.participants() {
                    self.player_service.record_draw(&participant);
                }
            }
        }
        for participant in game.participants() {
            self.player_service
                .set_status(&participant, PlayerStatus::AwaitingRestart);
        }
    }
}

impl GameService for GameServiceImpl {
    fn create_game(&self, username: &PlayerUsername) -> ServiceResult<(GameId, TttSide)> {
        let id = GameId::new_v4();
        self.player_service.try_enter_game(username, id)?;

        let side = Self::random_side();
        self.games.insert(id, Game::new(id, username.clone(), side));

        log::info!("Game {} created by {} as {}", id, username, side);
        Ok((id, side))
    }

    fn join_game(&self, username: &PlayerUsername, game_id: &GameId) -> ServiceResult<TttSide> {
        let Some(mut game_ref) = self.games.get_mut(game_id) else {
            return Err(ServiceError::GameNotFound);
        };
        if game_ref.num_players() == 2 {
            return Err(ServiceError::GameFull);
        }
        if game_ref.seat_of(username).is_some() {
            return Err(ServiceError::AlreadyJoined);
        }
        self.player_service.try_enter_game(username, *game_id)?;

        // X is preferred if both seats were somehow empty.
        let side = if game_ref.x_player.is_none() {
            TttSide::X
        } else {
            TttSide::O
        };
        match side {
            TttSide::X => game_ref.x_player = Some(username.clone()),
            TttSide::O => game_ref.o_player = Some(username.clone()),
        }
        game_ref.status = GameStatus::InProgress;
        game_ref.turn = TttSide::X;
        let participants = game_ref.participants();
        drop(game_ref);

        for participant in &participants {
            self.player_service.touch_move(participant);
        }

        log::info!("Player {} joined game {} as {}", username, game_id, side);
        Ok(side)
    }

    fn make_move(
        &self,
        username: &PlayerUsername,
        game_id: &GameId,
        pos: TttPos,
    ) -> ServiceResult<GameStatus> {
        let Some(mut game_ref) = self.games.get_mut(game_id) else {
            return Err(ServiceError::GameNotFound);
        };
        if let GameStatus::Concluded(_) = game_ref.status {
            return Err(ServiceError::GameConcluded);
        }
        let Some(side) = game_ref.seat_of(username) else {
            return Err(ServiceError::NotParticipant);
        };
        if game_ref.status == GameStatus::AwaitingOpponent {
            return Err(ServiceError::AwaitingOpponent);
        }
        if !pos.is_valid() {
            return Err(ServiceError::BadRequest(
                "cell position out of bounds".to_string(),
            ));
        }
        if game_ref.board.get(&pos).is_some() {
            return Err(ServiceError::CellOccupied);
        }
        if game_ref.turn != side {
            return Err(ServiceError::NotYourTurn);
        }

        game_ref.board.set(&pos, side);
        game_ref.turn = side.opponent();

        let status = match game_ref.board.evaluate() {
            TttGameState::Ongoing => GameStatus::InProgress,
            TttGameState::Over(outcome) => {
                match outcome {
                    TttOutcome::Win(TttSide::X) => game_ref.tally.x_wins += 1,
                    TttOutcome::Win(TttSide::O) => game_ref.tally.o_wins += 1,
                    TttOutcome::Draw => game_ref.tally.draws += 1,
                }
                GameStatus::Concluded(outcome)
            }
        };
        game_ref.status = status;
        // Participant statuses flip under the game guard; a rematch
        // acknowledgement takes the same guard first.
        if let GameStatus::Concluded(outcome) = status {
            log::info!("Game {} is over: {:?}", game_id, outcome);
            self.record_conclusion(&game_ref, outcome);
        }
        drop(game_ref);

        self.player_service.touch_move(username);
        Ok(status)
    }

    fn get_view(&self, username: &PlayerUsername, game_id: &GameId) -> ServiceResult<GameView> {
        let Some(game_ref) = self.games.get(game_id) else {
            return Err(ServiceError::GameNotFound);
        };
        let Some(side) = game_ref.seat_of(username) else {
            return Err(ServiceError::NotParticipant);
        };
        let view = GameView {
            cells: game_ref.board.cells(),
            turn: game_ref.turn,
            side,
            tally: game_ref.tally,
            num_players: game_ref.num_players(),
        };
        drop(game_ref);

        self.player_service.touch_request(username);
        Ok(view)
    }

    fn request_rematch(
        &self,
        username: &PlayerUsername,
        game_id: &GameId,
    ) -> ServiceResult<TttSide> {
        let Some(mut game_ref) = self.games.get_mut(game_id) else {
            return Err(ServiceError::GameNotFound);
        };
        let Some(current_side) = game_ref.seat_of(username) else {
            return Err(ServiceError::NotParticipant);
        };
        let GameStatus::Concluded(_) = game_ref.status else {
            return Err(ServiceError::GameNotConcluded);
        };
        if game_ref.rematch_acks.contains(username) {
            return Err(ServiceError::AlreadyAcknowledged);
        }

        game_ref.rematch_acks.push(username.clone());
        game_ref.board.clear();

        let side = if game_ref.rematch_acks.len() == 2 {
            // Unanimous consent: re-randomize sides and start the next round.
            if rand::random() {
                let game = game_ref.value_mut();
                std::mem::swap(&mut game.x_player, &mut game.o_player);
            }
            game_ref.rematch_acks.clear();
            game_ref.status = GameStatus::InProgress;
            game_ref.turn = TttSide::X;
            log::info!("Game {} rematch started", game_id);
            game_ref.seat_of(username).unwrap_or(current_side)
        } else {
            // The opponent has not consented yet; the game stays concluded
            // so no move can be accepted in the meantime.
            current_side
        };
        drop(game_ref);

        self.player_service.set_status(username, PlayerStatus::InMatch);
        self.player_service.touch_request(username);
        Ok(side)
    }

    fn get_game(&self, game_id: &GameId) -> Option<Game> {
        self.games.get(game_id).map(|entry| entry.clone())
    }

    fn evict_game(&self, game_id: &GameId) -> bool {
        let Some((_, game)) = self.games.remove(game_id) else {
            return false;
        };
        for participant in game.participants() {
            self.player_service.release(&participant);
        }
        log::info!("Game {} evicted", game_id);
        true
    }
}
