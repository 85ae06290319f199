use crate::game::Phase;
use thiserror::Error;

/// The result of attempting to perform an invalid operation on a [Game](crate::game::Game) or session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("invalid input: {0}")]
    Validation(&'static str),
    #[error("this player is not permitted to perform this action")]
    Unauthorized,
    #[error("this action cannot be performed during the {phase} phase")]
    IllegalPhaseTransition { phase: Phase },
    #[error("this player cannot be chosen for this action")]
    InvalidTarget,
    #[error("invalid player count: {0}")]
    InvalidPlayerCount(usize),
    #[error("no alive players remain")]
    NoAlivePlayers,
    #[error("not enough cards to draw {0}")]
    InsufficientCards(usize),
    #[error("game does not exist")]
    GameNotFound,
    #[error("no player exists with the given id")]
    PlayerNotFound,
    #[error("the game was modified concurrently")]
    Conflict,
    #[error("storage failure: {0}")]
    Storage(String),
}

impl GameError {
    /// Whether the error indicates a broken invariant rather than a bad request.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            GameError::InvalidPlayerCount(_) | GameError::NoAlivePlayers | GameError::InsufficientCards(_)
        )
    }
}

impl From<sled::Error> for GameError {
    fn from(err: sled::Error) -> Self {
        GameError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for GameError {
    fn from(err: serde_json::Error) -> Self {
        GameError::Storage(err.to_string())
    }
}
