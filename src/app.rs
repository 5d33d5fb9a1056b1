use std::sync::Arc;

use axum::response::IntoResponse;
use thiserror::Error;

use crate::{
    game::{ArcGameService, GameServiceImpl},
    player::{ArcPlayerService, PlayerDirectoryImpl},
};

#[derive(Clone)]
pub struct AppState {
    pub player_service: ArcPlayerService,
    pub game_service: ArcGameService,
}

/// Every failure a coordinator operation can surface. All of these are
/// expected, recoverable, caller-facing conditions; none is process-fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("player is already in a game")]
    PlayerBusy,

    #[error("game not found")]
    GameNotFound,

    #[error("game already has two players")]
    GameFull,

    #[error("player has already joined this game")]
    AlreadyJoined,

    #[error("game is already over")]
    GameConcluded,

    #[error("player is not part of this game")]
    NotParticipant,

    #[error("waiting for a second player")]
    AwaitingOpponent,

    #[error("cell is already occupied")]
    CellOccupied,

    #[error("it is another player's turn")]
    NotYourTurn,

    #[error("game is not over yet")]
    GameNotConcluded,

    #[error("rematch already acknowledged")]
    AlreadyAcknowledged,

    #[error("bad request: {0}")]
    BadRequest(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::http::Response<axum::body::Body> {
        let status = match &self {
            ServiceError::GameNotFound => axum::http::StatusCode::NOT_FOUND,
            _ => axum::http::StatusCode::BAD_REQUEST,
        };
        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

pub fn construct_app() -> AppState {
    let player_service: ArcPlayerService = Arc::new(Box::new(PlayerDirectoryImpl::new()));

    let game_service: ArcGameService =
        Arc::new(Box::new(GameServiceImpl::new(player_service.clone())));

    AppState {
        player_service,
        game_service,
    }
}
