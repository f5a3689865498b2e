use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::board::{ConfigError, Owner};
use crate::engine::{SearchConfig, SearchEngine};
use crate::game::{Game, GameError, GameStatus};
use crate::ruleset::Preset;

/// Deepest search a web client may ask for.
pub const MAX_WEB_DEPTH: u8 = 4;

#[derive(Clone)]
pub struct AppState {
    game: Arc<Mutex<WebGame>>,
}

struct WebGame {
    game: Game,
    preset: Preset,
    depth: u8,
    engine: SearchEngine,
}

#[derive(Serialize, Deserialize)]
pub struct NewGameRequest {
    #[serde(default = "default_preset")]
    pub preset: Preset,
    #[serde(default)]
    pub depth: Option<u8>,
}

fn default_preset() -> Preset {
    Preset::P2
}

#[derive(Serialize, Deserialize)]
pub struct MoveRequest {
    #[serde(rename = "move")]
    pub notation: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct GameResponse {
    pub preset: Preset,
    pub depth: u8,
    pub snapshot: String,
    pub pretty: String,
    pub turn: Owner,
    pub status: GameStatus,
    pub winner: Option<Owner>,
    pub defeated: Vec<Owner>,
    pub legal_moves: Vec<String>,
    pub message: String,
}

impl AppState {
    /// Starts on the default two-player preset.
    pub fn new(config: &SearchConfig) -> Result<Self, ConfigError> {
        let preset = Preset::P2;
        let web_game = WebGame {
            game: preset.ruleset().create_game()?,
            preset,
            depth: config.depth.min(MAX_WEB_DEPTH),
            engine: SearchEngine::new(config),
        };
        Ok(AppState {
            game: Arc::new(Mutex::new(web_game)),
        })
    }

    fn lock(&self) -> MutexGuard<'_, WebGame> {
        self.game.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(serde_json::json!({
            "error": message.into()
        })),
    )
        .into_response()
}

fn game_error(e: GameError) -> Response {
    let status = match e {
        GameError::Snapshot(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    };
    error_response(status, e.to_string())
}

fn describe(web: &WebGame, message: String) -> GameResponse {
    let game = &web.game;
    let board = game.board();
    let legal_moves = if game.is_over() {
        Vec::new()
    } else {
        game.legal_moves()
            .into_iter()
            .map(|mv| board.format_move(mv))
            .collect()
    };
    GameResponse {
        preset: web.preset,
        depth: web.depth,
        snapshot: board.snapshot(),
        pretty: board.pretty(),
        turn: game.turn(),
        status: game.status(),
        winner: game.winner(),
        defeated: board.defeated().into_iter().collect(),
        legal_moves,
        message,
    }
}

fn outcome_message(game: &Game, winner: Option<Owner>, default: String) -> String {
    match winner {
        Some(owner) => format!("Player {owner} wins!"),
        None if game.status() == GameStatus::Abandoned => "Every player is out.".to_string(),
        None => default,
    }
}

#[axum::debug_handler]
async fn new_game(State(app_state): State<AppState>, Json(req): Json<NewGameRequest>) -> Response {
    let game = match req.preset.ruleset().create_game() {
        Ok(game) => game,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };
    let mut web = app_state.lock();
    web.game = game;
    web.preset = req.preset;
    if let Some(depth) = req.depth {
        web.depth = depth.min(MAX_WEB_DEPTH);
    }
    info!(preset = %req.preset, depth = web.depth, "new web game");
    let message = format!("Player {}'s turn", web.game.turn());
    Json(describe(&web, message)).into_response()
}

#[axum::debug_handler]
async fn make_move(State(app_state): State<AppState>, Json(req): Json<MoveRequest>) -> Response {
    let mut web = app_state.lock();
    match web.game.play_str(&req.notation) {
        Ok(winner) => {
            let message = outcome_message(&web.game, winner, format!("Player {}'s turn", web.game.turn()));
            Json(describe(&web, message)).into_response()
        }
        Err(e) => game_error(e),
    }
}

#[axum::debug_handler]
async fn bot_move(State(app_state): State<AppState>) -> Response {
    // The search is CPU bound, so it runs off the async workers.
    match tokio::task::spawn_blocking(move || play_bot_move(&app_state)).await {
        Ok(response) => response,
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

fn play_bot_move(app_state: &AppState) -> Response {
    let mut guard = app_state.lock();
    let web = &mut *guard;
    if web.game.is_over() {
        return game_error(GameError::GameOver);
    }

    let owner = web.game.turn();
    let choice = web.engine.choose_move(web.game.board(), owner, owner, web.depth);
    let result = match choice {
        Some(mv) => {
            let notation = web.game.board().format_move(mv);
            web.game
                .play(mv)
                .map(|winner| outcome_message(&web.game, winner, format!("Bot played {notation}")))
        }
        None => web
            .game
            .pass_turn()
            .map(|_| format!("Player {owner} has no moves and passes")),
    };
    match result {
        Ok(message) => Json(describe(web, message)).into_response(),
        Err(e) => game_error(e),
    }
}

async fn undo(State(app_state): State<AppState>) -> Response {
    let mut web = app_state.lock();
    match web.game.undo() {
        Ok(()) => Json(describe(&web, "Move undone".to_string())).into_response(),
        Err(e) => game_error(e),
    }
}

async fn redo(State(app_state): State<AppState>) -> Response {
    let mut web = app_state.lock();
    match web.game.redo() {
        Ok(()) => Json(describe(&web, "Move redone".to_string())).into_response(),
        Err(e) => game_error(e),
    }
}

async fn forfeit(State(app_state): State<AppState>) -> Response {
    let mut web = app_state.lock();
    let owner = web.game.turn();
    match web.game.forfeit() {
        Ok(winner) => {
            let message = outcome_message(&web.game, winner, format!("Player {owner} forfeits"));
            Json(describe(&web, message)).into_response()
        }
        Err(e) => game_error(e),
    }
}

async fn get_game_state(State(app_state): State<AppState>) -> Json<GameResponse> {
    let web = app_state.lock();
    Json(describe(&web, String::new()))
}

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/new-game", post(new_game))
        .route("/api/move", post(make_move))
        .route("/api/bot-move", post(bot_move))
        .route("/api/undo", post(undo))
        .route("/api/redo", post(redo))
        .route("/api/forfeit", post(forfeit))
        .route("/api/game-state", get(get_game_state))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

pub async fn run_server(addr: &str, config: &SearchConfig) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(AppState::new(config)?);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("web server running at http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
