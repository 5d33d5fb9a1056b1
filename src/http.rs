use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use ttt_core::{TttOutcome, TttPos, TttSide};

use crate::{
    app::{AppState, ServiceError, ServiceResult},
    game::{GameId, GameService, GameStatus},
};

#[derive(Deserialize)]
struct CreateParams {
    username: String,
}

#[derive(Deserialize)]
struct JoinParams {
    game_id: String,
    username: String,
}

#[derive(Deserialize)]
struct MoveParams {
    game_id: String,
    username: String,
    x: u8,
    y: u8,
}

#[derive(Deserialize)]
struct RestartParams {
    game_id: String,
    username: String,
}

#[derive(Serialize)]
struct CreateResponse {
    game_id: String,
    side: String,
}

#[derive(Serialize)]
struct SideResponse {
    side: String,
}

#[derive(Serialize)]
struct MoveResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    winner: Option<String>,
}

impl From<GameStatus> for MoveResponse {
    fn from(status: GameStatus) -> Self {
        match status {
            GameStatus::AwaitingOpponent => MoveResponse {
                status: "awaiting_opponent",
                outcome: None,
                winner: None,
            },
            GameStatus::InProgress => MoveResponse {
                status: "in_progress",
                outcome: None,
                winner: None,
            },
            GameStatus::Concluded(TttOutcome::Win(side)) => MoveResponse {
                status: "concluded",
                outcome: Some("win"),
                winner: Some(side.to_string()),
            },
            GameStatus::Concluded(TttOutcome::Draw) => MoveResponse {
                status: "concluded",
                outcome: Some("draw"),
                winner: None,
            },
        }
    }
}

fn parse_game_id(raw: &str) -> ServiceResult<GameId> {
    raw.parse()
        .map_err(|_| ServiceError::BadRequest("invalid game id".to_string()))
}

async fn create_game(
    State(app): State<AppState>,
    Query(params): Query<CreateParams>,
) -> ServiceResult<Json<CreateResponse>> {
    let (game_id, side) = app.game_service.create_game(&params.username)?;
    Ok(Json(CreateResponse {
        game_id: game_id.to_string(),
        side: side.to_string(),
    }))
}

async fn join_game(
    State(app): State<AppState>,
    Query(params): Query<JoinParams>,
) -> ServiceResult<Json<SideResponse>> {
    let game_id = parse_game_id(&params.game_id)?;
    let side = app.game_service.join_game(&params.username, &game_id)?;
    Ok(Json(SideResponse {
        side: side.to_string(),
    }))
}

async fn make_move(
    State(app): State<AppState>,
    Query(params): Query<MoveParams>,
) -> ServiceResult<Json<MoveResponse>> {
    let game_id = parse_game_id(&params.game_id)?;
    let pos = TttPos::new(params.x, params.y);
    if !pos.is_valid() {
        return Err(ServiceError::BadRequest(
            "cell position out of bounds".to_string(),
        ));
    }
    let status = app.game_service.make_move(&params.username, &game_id, pos)?;
    Ok(Json(status.into()))
}

/// Flat board projection: cell keys "0".."8" (row-major) plus the derived
/// fields, mirroring the shape clients already consume.
async fn get_board(
    State(app): State<AppState>,
    Path((game_id, username)): Path<(String, String)>,
) -> ServiceResult<Json<serde_json::Value>> {
    let game_id = parse_game_id(&game_id)?;
    let view = app.game_service.get_view(&username, &game_id)?;

    let mut body = serde_json::Map::new();
    for (i, cell) in view.cells.iter().enumerate() {
        let mark = cell.map(|side: TttSide| side.to_string()).unwrap_or_default();
        body.insert(i.to_string(), mark.into());
    }
    body.insert("turn".to_string(), view.turn.to_string().into());
    body.insert("side".to_string(), view.side.to_string().into());
    body.insert("victories.X".to_string(), view.tally.x_wins.into());
    body.insert("victories.O".to_string(), view.tally.o_wins.into());
    body.insert("draws".to_string(), view.tally.draws.into());
    body.insert("num_players".to_string(), (view.num_players as u32).into());
    Ok(Json(serde_json::Value::Object(body)))
}

async fn restart_game(
    State(app): State<AppState>,
    Query(params): Query<RestartParams>,
) -> ServiceResult<Json<SideResponse>> {
    let game_id = parse_game_id(&params.game_id)?;
    let side = app
        .game_service
        .request_rematch(&params.username, &game_id)?;
    Ok(Json(SideResponse {
        side: side.to_string(),
    }))
}

pub fn build_router() -> Router<AppState> {
    Router::new()
        .route("/games/create", post(create_game))
        .route("/games/join", post(join_game))
        .route("/games/move", post(make_move))
        .route("/games/{game_id}/{username}/board", get(get_board))
        .route("/games/restart", post(restart_game))
}

pub async fn run(
    app: AppState,
    port: u16,
    shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
) {
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .expect("Failed to bind HTTP listener");

    log::info!("HTTP server listening on port {}", port);
    axum::serve(listener, build_router().with_state(app))
        .with_graceful_shutdown(shutdown_signal)
        .await
        .expect("HTTP server failed");
}
