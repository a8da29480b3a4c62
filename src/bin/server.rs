use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};
use torusverse_pacman::callbacks::RecordingCallback;
use torusverse_pacman::engine::GameEngine;
use torusverse_pacman::log::emit_log;
use torusverse_pacman::settings::GameSettings;
use torusverse_pacman::tiles::{RawTileGrid, TileCatalog};
use torusverse_pacman::types::Direction;
use torusverse_pacman::validator::MapValidator;
use torusverse_pacman::world::GameMap;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

const SERVER_RUN_ID: &str = "server";

type SharedState = Arc<Mutex<ServerState>>;

#[derive(Clone)]
struct ClientContext {
    tx: mpsc::Sender<String>,
}

struct ServerState {
    clients: HashMap<String, ClientContext>,
    settings: GameSettings,
    map: GameMap,
    level_name: String,
    game: GameEngine,
    game_log: RecordingCallback,
    games_played: u64,
}

impl ServerState {
    fn new(settings: GameSettings, map: GameMap, level_name: String) -> Self {
        let game_log = RecordingCallback::new();
        let game =
            GameEngine::new(map.clone(), &settings).with_callback(Box::new(game_log.clone()));
        Self {
            clients: HashMap::new(),
            settings,
            map,
            level_name,
            game,
            game_log,
            games_played: 0,
        }
    }

    /// Starts the next round on the same map with a fresh seed.
    fn restart(&mut self) {
        self.games_played += 1;
        self.settings.seed = rand::random::<u32>();
        self.game_log.drain();
        self.game = GameEngine::new(self.map.clone(), &self.settings)
            .with_callback(Box::new(self.game_log.clone()));
        emit_log(
            "info",
            "game_started",
            SERVER_RUN_ID,
            Some(&self.level_name),
            None,
            json!({ "seed": self.settings.seed, "gamesPlayed": self.games_played }),
        );
    }
}

#[derive(Debug, PartialEq, Eq)]
enum ParsedClientMessage {
    Input { dir: Direction },
    Restart,
}

#[tokio::main]
async fn main() {
    let port = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let settings = match std::env::var("SETTINGS_PATH") {
        Ok(raw) => match GameSettings::load(&PathBuf::from(&raw)) {
            Ok(settings) => settings,
            Err(error) => {
                emit_log(
                    "error",
                    "settings_invalid",
                    SERVER_RUN_ID,
                    None,
                    None,
                    json!({ "path": raw, "error": error.to_string() }),
                );
                std::process::exit(2);
            }
        },
        Err(_) => GameSettings::default(),
    };

    let (map, level_name) = match std::env::var("MAP_PATH") {
        Ok(raw) => {
            let path = PathBuf::from(&raw);
            let level_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| raw.clone());
            let grid = match RawTileGrid::load(&path, &TileCatalog::standard()) {
                Ok(grid) => grid,
                Err(error) => {
                    emit_log(
                        "error",
                        "map_load_failed",
                        SERVER_RUN_ID,
                        Some(&level_name),
                        None,
                        json!({ "error": error.to_string() }),
                    );
                    std::process::exit(2);
                }
            };
            match MapValidator::new(level_name.clone()).validate(&grid) {
                Ok(map) => (map, level_name),
                Err(report) => {
                    emit_log(
                        "error",
                        "level_invalid",
                        SERVER_RUN_ID,
                        Some(&level_name),
                        None,
                        json!({ "problems": report.lines() }),
                    );
                    std::process::exit(1);
                }
            }
        }
        Err(_) => (GameMap::fixed_maze(&settings), "fixed-maze".to_string()),
    };

    let tick_ms = settings.tick_ms;
    let state = Arc::new(Mutex::new(ServerState::new(settings, map, level_name)));
    start_tick_loop(state.clone(), tick_ms);

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/validate", post(validate_handler))
        .route("/ws", get(ws_handler))
        .with_state(state);

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("failed to bind server socket");

    emit_log(
        "info",
        "server_listening",
        SERVER_RUN_ID,
        None,
        None,
        json!({ "port": port }),
    );
    axum::serve(listener, app)
        .await
        .expect("server runtime failed");
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn validate_handler(body: String) -> impl IntoResponse {
    Json(validate_map_text(&body))
}

/// Validation result for a text map posted by an editor.
fn validate_map_text(text: &str) -> Value {
    let grid = match RawTileGrid::from_text(text, &TileCatalog::standard()) {
        Ok(grid) => grid,
        Err(error) => return json!({ "ok": false, "diagnostics": [error.to_string()] }),
    };
    match MapValidator::new("upload").validate(&grid) {
        Ok(_) => json!({ "ok": true, "diagnostics": [] }),
        Err(report) => json!({ "ok": false, "diagnostics": report.lines() }),
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: SharedState, socket: WebSocket) {
    let client_id = make_id("client");
    let (tx, mut rx) = mpsc::channel::<String>(256);

    {
        let mut guard = state.lock().await;
        guard
            .clients
            .insert(client_id.clone(), ClientContext { tx: tx.clone() });
        let snapshot = guard.game.build_snapshot(false);
        let welcome = json!({
            "type": "welcome",
            "clientId": client_id,
            "level": guard.level_name,
            "width": guard.map.width(),
            "height": guard.map.height(),
            "snapshot": snapshot,
        });
        let _ = tx.try_send(welcome.to_string());
    }

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if ws_sender.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(received) = ws_receiver.next().await {
        let Ok(message) = received else {
            break;
        };
        match message {
            Message::Text(raw) => {
                handle_client_message(&state, raw.as_str()).await;
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    state.lock().await.clients.remove(&client_id);
    drop(tx);
    let _ = writer.await;
}

async fn handle_client_message(state: &SharedState, raw: &str) {
    let Some(message) = parse_client_message(raw) else {
        return;
    };
    let mut guard = state.lock().await;
    match message {
        ParsedClientMessage::Input { dir } => guard.game.set_player_input(dir),
        ParsedClientMessage::Restart => guard.restart(),
    }
}

fn parse_client_message(raw: &str) -> Option<ParsedClientMessage> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    match object.get("type")?.as_str()? {
        "input" => {
            let dir = Direction::parse(object.get("dir")?.as_str()?)?;
            Some(ParsedClientMessage::Input { dir })
        }
        "restart" => Some(ParsedClientMessage::Restart),
        _ => None,
    }
}

fn start_tick_loop(state: SharedState, tick_ms: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(tick_ms));
        loop {
            interval.tick().await;
            let mut guard = state.lock().await;
            tick_game(&mut guard, tick_ms);
        }
    });
}

fn tick_game(state: &mut ServerState, tick_ms: u64) {
    state.game.step(tick_ms);
    let snapshot = state.game.build_snapshot(true);
    let log = state.game_log.drain();
    broadcast(
        state,
        &json!({
            "type": "state",
            "snapshot": snapshot,
            "log": log,
        }),
    );

    if state.game.is_ended() {
        let summary = state.game.build_summary();
        emit_log(
            "info",
            "game_over",
            SERVER_RUN_ID,
            Some(&state.level_name),
            Some(summary.ticks),
            json!({ "outcome": summary.outcome, "score": summary.score }),
        );
        broadcast(
            state,
            &json!({
                "type": "game_over",
                "summary": summary,
            }),
        );
        state.restart();
    }
}

fn broadcast(state: &mut ServerState, message: &Value) {
    let payload = message.to_string();
    state
        .clients
        .retain(|_, client| match client.tx.try_send(payload.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => true,
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
}

fn make_id(prefix: &str) -> String {
    let seq = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{seq}")
}
