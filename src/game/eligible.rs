use super::{player::Player, Game};
use crate::error::GameError;

/// The alive-player count at or below which only the previous chancellor is term-limited.
pub const SMALL_GOVERNMENT_THRESHOLD: usize = 5;

/// Finds the next presidential seat clockwise from `current`.
///
/// The rotation is recomputed from the live alive/spectator filter every time.
/// If `current` itself is no longer alive, the next alive seat after it is chosen.
pub fn next_president(current: usize, players: &[Player]) -> Result<usize, GameError> {
    let mut seats: Vec<usize> = players.iter().filter(|p| p.is_active()).filter_map(|p| p.seat).collect();
    seats.sort_unstable();
    let first = *seats.first().ok_or(GameError::NoAlivePlayers)?;
    Ok(seats.into_iter().find(|seat| *seat > current).unwrap_or(first))
}

/// Counts the players who are alive and seated.
pub fn num_alive(players: &[Player]) -> usize {
    players.iter().filter(|p| p.is_active()).count()
}

/// Determines whether a player may be nominated as chancellor.
pub fn is_eligible_chancellor(game: &Game, players: &[Player], candidate_id: &str) -> bool {
    let Some(candidate) = players.iter().find(|p| p.id == candidate_id) else {
        return false;
    };
    if !candidate.is_active() || candidate.seat == Some(game.president_index) {
        return false;
    }

    let previous_chancellor = game.previous_chancellor_id.as_deref() == Some(candidate_id);
    let previous_president = game.previous_president_id.as_deref() == Some(candidate_id);
    if num_alive(players) <= SMALL_GOVERNMENT_THRESHOLD {
        !previous_chancellor
    } else {
        !previous_chancellor && !previous_president
    }
}

/// Gets every player who may currently be nominated as chancellor.
pub fn eligible_chancellors<'a>(game: &Game, players: &'a [Player]) -> Vec<&'a Player> {
    players
        .iter()
        .filter(|p| is_eligible_chancellor(game, players, &p.id))
        .collect()
}
