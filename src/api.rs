use crate::session::SessionManager;
use crate::time::iso8601;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use serde_json::json;
use tokio::net::TcpListener;

pub fn make_router(manager: &'static SessionManager) -> Router {
    Router::new()
        .route("/sessions", get(get_sessions))
        .route("/pastgames", get(get_past_games))
        .with_state(manager)
}

pub async fn listen(port: u16) -> anyhow::Result<TcpListener> {
    let listener = TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    log::info!("API listening on {}", listener.local_addr()?);
    Ok(listener)
}

async fn get_sessions(State(manager): State<&SessionManager>) -> Result<Json<impl Serialize>, StatusCode> {
    Ok(Json(json!({
        "num_sessions": manager.num_games()
    })))
}

async fn get_past_games(State(manager): State<&SessionManager>) -> Result<Json<impl Serialize>, StatusCode> {
    let games: Vec<_> = manager
        .past_games()
        .into_iter()
        .map(|(id, stats)| {
            json!({
                "id": id,
                "game_id": stats.id,
                "room_code": stats.room_code,
                "players": stats.players,
                "started": iso8601(stats.started),
                "finished": iso8601(stats.finished),
                "winner": stats.winner,
                "outcome": stats.outcome.to_string(),
            })
        })
        .collect();

    Ok(Json(json!({
        "games": games
    })))
}
