use crate::{
    client::Client,
    error::GameError,
    game::{action::Action, GameOptions},
    session::{ActionResult, SessionManager},
};
use futures_util::{select, FutureExt, SinkExt, StreamExt, TryStreamExt};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;

#[derive(Error, Debug)]
enum WsError {
    #[error("violation of the application-layer protocol")]
    ProtocolError,
    #[error(transparent)]
    GameError(#[from] GameError),
}

pub async fn accept_connection(stream: TcpStream, manager: &SessionManager) {
    log::info!("Accepted new connection");

    let Ok(stream) = tokio_tungstenite::accept_async(stream).await else {
        log::error!("Error occured during websocket handshake");
        return;
    };
    let (mut write, read) = stream.split();
    let mut read = read.fuse();

    let mut client = Client::new(manager);

    loop {
        select! {
            msg = read.try_next() => {
                let Ok(Some(Message::Text(msg))) = msg else {
                    break;
                };
                let Ok(msg) = serde_json::from_str::<Value>(&msg) else {
                    log::error!("Invalid JSON received: {}", &msg);
                    break;
                };
                let reply = match parse_request(&msg) {
                    Ok(req) => process_request(req, &mut client).map_err(WsError::from),
                    Err(err) => {
                        log::error!("Invalid message received: {}", &msg);
                        Err(err)
                    }
                };
                let reply = match reply {
                    Ok(Some(reply)) => format_reply(reply),
                    Ok(None) => continue,
                    Err(err) => json!({
                        "type": "error",
                        "error": err.to_string()
                    }),
                };
                if write.send(Message::Text(reply.to_string())).await.is_err() {
                    log::error!("Could not send websockets message");
                    break;
                }
            },
            state = client.next_state().fuse() => {
                let reply = json!({
                    "type": "update",
                    "state": state
                });
                if write.send(Message::Text(reply.to_string())).await.is_err() {
                    log::error!("Could not send websockets message");
                    break;
                }
            }
        }
    }

    client.leave();
    log::info!("Connection closed");
}

/// A message sent by a game client to the server.
enum Request {
    CreateGame {
        room_code: String,
        options: GameOptions,
    },
    JoinAsBoard {
        room_code: String,
    },
    JoinAsPlayer {
        room_code: String,
        name: String,
        session_id: String,
        spectator: bool,
    },
    BoardAction(Action),
    PlayerAction(Action),
}

/// A message sent by the server to a game client.
enum Response {
    GameCreated {
        game_id: String,
    },
    GameJoined {
        game_id: String,
        player_id: Option<String>,
    },
    ActionResult(ActionResult),
}

fn string_field(req: &Value, key: &str) -> Result<String, WsError> {
    req[key]
        .as_str()
        .map(str::to_string)
        .ok_or(WsError::ProtocolError)
}

/// Parses a websockets message from the client.
fn parse_request(req: &Value) -> Result<Request, WsError> {
    match req["type"].as_str().unwrap_or("") {
        "create_game" => {
            let options = match req.get("options") {
                Some(options) => serde_json::from_value(options.clone()).map_err(|_| WsError::ProtocolError)?,
                None => GameOptions::default(),
            };
            Ok(Request::CreateGame {
                room_code: string_field(req, "roomCode")?,
                options,
            })
        }
        "board_join" => Ok(Request::JoinAsBoard {
            room_code: string_field(req, "roomCode")?,
        }),
        "join" => Ok(Request::JoinAsPlayer {
            room_code: string_field(req, "roomCode")?,
            name: string_field(req, "name")?,
            session_id: string_field(req, "sessionId")?,
            spectator: req["spectator"].as_bool().unwrap_or(false),
        }),
        "board_action" | "action" => {
            let action: Action =
                serde_json::from_value(req["action"].clone()).map_err(|_| WsError::ProtocolError)?;
            if req["type"] == "board_action" {
                Ok(Request::BoardAction(action))
            } else {
                Ok(Request::PlayerAction(action))
            }
        }
        _ => Err(WsError::ProtocolError),
    }
}

/// Processes a request from the client.
fn process_request(req: Request, client: &mut Client) -> Result<Option<Response>, GameError> {
    match req {
        Request::CreateGame { room_code, options } => {
            let game_id = client.create_game(&room_code, options)?;
            Ok(Some(Response::GameCreated { game_id }))
        }
        Request::JoinAsBoard { room_code } => {
            let game_id = client.join_as_board(&room_code)?;
            Ok(Some(Response::GameJoined {
                game_id,
                player_id: None,
            }))
        }
        Request::JoinAsPlayer {
            room_code,
            name,
            session_id,
            spectator,
        } => {
            let (game_id, player_id) = client.join_as_player(&room_code, &name, &session_id, spectator)?;
            Ok(Some(Response::GameJoined {
                game_id,
                player_id: Some(player_id),
            }))
        }
        Request::BoardAction(action) => Ok(Some(Response::ActionResult(client.board_action(&action)?))),
        Request::PlayerAction(action) => Ok(Some(Response::ActionResult(client.player_action(&action)?))),
    }
}

/// Formats a reply to the client to be sent over websockets.
fn format_reply(res: Response) -> Value {
    match res {
        Response::GameCreated { game_id } => json!({
            "type": "game_created",
            "gameId": game_id
        }),
        Response::GameJoined { game_id, player_id } => json!({
            "type": "game_joined",
            "gameId": game_id,
            "playerId": player_id
        }),
        Response::ActionResult(result) => json!({
            "type": "action_result",
            "version": result.version,
            "events": result.events,
            "private": result.private
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::update::Event;

    #[test]
    fn parses_player_actions() {
        let req = json!({
            "type": "action",
            "action": { "type": "nominate_chancellor", "candidate": "abc" }
        });
        let Request::PlayerAction(Action::NominateChancellor { candidate }) = parse_request(&req).unwrap() else {
            panic!("wrong request");
        };
        assert_eq!(candidate, "abc");
    }

    #[test]
    fn rejects_malformed_requests() {
        assert!(parse_request(&json!({ "type": "join", "roomCode": "ABCD" })).is_err());
        assert!(parse_request(&json!({ "type": "board_action", "action": { "type": "dance" } })).is_err());
        assert!(parse_request(&json!({ "type": "unknown" })).is_err());
    }

    #[test]
    fn action_results_carry_the_committed_version() {
        let reply = format_reply(Response::ActionResult(ActionResult {
            version: 7,
            events: vec![Event::VotingComplete],
            private: None,
        }));
        assert_eq!(reply["type"], "action_result");
        assert_eq!(reply["version"], 7);
        assert_eq!(reply["events"][0]["type"], "voting_complete");
        assert!(reply["private"].is_null());
    }

    #[test]
    fn create_game_defaults_options() {
        let req = json!({ "type": "create_game", "roomCode": "ABCD" });
        let Request::CreateGame { room_code, options } = parse_request(&req).unwrap() else {
            panic!("wrong request");
        };
        assert_eq!(room_code, "ABCD");
        assert!(options.chaos_grants_powers);
    }
}
