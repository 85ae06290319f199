use crate::{
    error::GameError,
    game::{
        action::{Action, Actor},
        GameOptions,
    },
    session::{ActionResult, GameUpdate, SessionManager},
};
use serde_json::{json, Value};
use tokio::sync::watch;

/// A single game client, which could be a board or a player.
pub struct Client<'a> {
    manager: &'a SessionManager,
    game_id: Option<String>,
    player_id: Option<String>,
    updates: Option<watch::Receiver<GameUpdate>>,
    /// Set after joining, so the first state is pushed without waiting for a change.
    fresh: bool,
}

impl<'a> Client<'a> {
    /// Creates a new game client.
    pub fn new(manager: &'a SessionManager) -> Self {
        Self {
            manager,
            game_id: None,
            player_id: None,
            updates: None,
            fresh: false,
        }
    }

    /// Creates a new game, returning its ID.
    pub fn create_game(&mut self, room_code: &str, options: GameOptions) -> Result<String, GameError> {
        self.manager.create_game(room_code, options)
    }

    /// Joins a game as a board.
    pub fn join_as_board(&mut self, room_code: &str) -> Result<String, GameError> {
        let game_id = self.manager.find_game(room_code)?;
        self.leave();
        self.subscribe(&game_id)?;
        Ok(game_id)
    }

    /// Joins a game as a player or spectator.
    pub fn join_as_player(
        &mut self,
        room_code: &str,
        name: &str,
        session_id: &str,
        spectator: bool,
    ) -> Result<(String, String), GameError> {
        let game_id = self.manager.find_game(room_code)?;
        self.leave();
        let player_id = self.manager.join(&game_id, name, session_id, spectator)?;
        self.player_id = Some(player_id.clone());
        self.subscribe(&game_id)?;
        Ok((game_id, player_id))
    }

    fn subscribe(&mut self, game_id: &str) -> Result<(), GameError> {
        self.updates = Some(self.manager.subscribe(game_id)?);
        self.game_id = Some(game_id.to_string());
        self.fresh = true;
        Ok(())
    }

    /// Waits until there is an update to the game state, then returns the latest state.
    pub async fn next_state(&mut self) -> Value {
        let Some(updates) = &mut self.updates else {
            return std::future::pending().await;
        };

        if !self.fresh && updates.changed().await.is_err() {
            return std::future::pending().await;
        }
        self.fresh = false;
        let update = updates.borrow_and_update().clone();

        let Some(game_id) = &self.game_id else {
            return Value::Null;
        };
        let public = self.manager.public_view(game_id).ok();
        let player = self
            .player_id
            .as_ref()
            .and_then(|id| self.manager.player_view(game_id, id).ok());

        json!({
            "game_id": game_id,
            "version": update.version,
            "events": update.events,
            "public": public,
            "player": player
        })
    }

    /// Leaves the game, marking the player as disconnected.
    pub fn leave(&mut self) {
        if let (Some(game_id), Some(player_id)) = (&self.game_id, &self.player_id) {
            if let Err(err) = self.manager.set_connected(game_id, player_id, false) {
                log::warn!("Could not disconnect player {}: {}", player_id, err);
            }
        }
        self.player_id = None;
        self.game_id = None;
        self.updates = None;
        self.fresh = false;
    }

    /// Called when the board performs an action, such as resolving an election.
    pub fn board_action(&self, action: &Action) -> Result<ActionResult, GameError> {
        if self.player_id.is_some() {
            return Err(GameError::Unauthorized);
        }
        let game_id = self.game_id.as_ref().ok_or(GameError::GameNotFound)?;
        self.manager.perform(game_id, &Actor::System, action)
    }

    /// Called when a player performs an action.
    pub fn player_action(&self, action: &Action) -> Result<ActionResult, GameError> {
        let game_id = self.game_id.as_ref().ok_or(GameError::GameNotFound)?;
        let player_id = self.player_id.clone().ok_or(GameError::Unauthorized)?;
        self.manager.perform(game_id, &Actor::Player(player_id), action)
    }
}
