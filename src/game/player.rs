use super::party::Party;
use super::shuffle::Shuffler;
use crate::error::GameError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::repeat;

pub type PlayerId = String;

pub const MIN_PLAYERS: usize = 5;
pub const MAX_PLAYERS: usize = 10;

/// A seated participant or spectator.
#[derive(Clone, Serialize, Deserialize, PartialEq, Debug)]
pub struct Player {
    pub id: PlayerId,
    pub game_id: String,
    pub name: String,
    /// The identity issued by the transport layer; stable across joins.
    pub session_id: String,
    /// Assigned once, when the game starts.
    pub role: Option<Role>,
    pub alive: bool,
    pub spectator: bool,
    /// Dense `0..N` among seated players; `None` for spectators.
    pub seat: Option<usize>,
    pub connected: bool,
    pub last_seen: DateTime<Utc>,
}

#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Debug)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Liberal,
    Fascist,
    Hitler,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Liberal => "liberal",
            Role::Fascist => "fascist",
            Role::Hitler => "hitler",
        })
    }
}

impl Role {
    pub fn party(&self) -> Party {
        match self {
            Role::Liberal => Party::Liberal,
            Role::Fascist => Party::Fascist,
            Role::Hitler => Party::Fascist,
        }
    }
}

impl Player {
    pub fn new(id: PlayerId, game_id: String, name: String, session_id: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            game_id,
            name,
            session_id,
            role: None,
            alive: true,
            spectator: false,
            seat: None,
            connected: true,
            last_seen: now,
        }
    }

    pub fn party(&self) -> Option<Party> {
        self.role.map(|role| role.party())
    }

    /// Whether the player currently takes part in elections.
    pub fn is_active(&self) -> bool {
        self.alive && !self.spectator && self.seat.is_some()
    }

    pub fn is_hitler(&self) -> bool {
        self.role == Some(Role::Hitler)
    }
}

/// The number of ordinary liberals and fascists for each supported player count.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PlayerDistribution {
    pub liberals: usize,
    pub fascists: usize,
}

impl PlayerDistribution {
    pub fn new(num_players: usize) -> Result<Self, GameError> {
        let (liberals, fascists) = match num_players {
            5 => (3, 1),
            6 => (4, 1),
            7 => (4, 2),
            8 => (5, 2),
            9 => (5, 3),
            10 => (6, 3),
            _ => return Err(GameError::InvalidPlayerCount(num_players)),
        };
        Ok(Self { liberals, fascists })
    }
}

/// Deals one role per seat: the table's liberals and fascists plus exactly one Hitler, shuffled.
///
/// The caller zips the result against the seated players ordered by seat index.
pub fn assign_roles(num_players: usize, shuffler: &mut Shuffler) -> Result<Vec<Role>, GameError> {
    let distribution = PlayerDistribution::new(num_players)?;
    let roles = repeat(Role::Liberal)
        .take(distribution.liberals)
        .chain(repeat(Role::Fascist).take(distribution.fascists))
        .chain(Some(Role::Hitler))
        .collect();
    Ok(shuffler.shuffled(roles))
}

/// Whether Hitler is told who the fascists are.
pub fn hitler_knows_fascists(num_players: usize) -> bool {
    num_players <= 6
}

/// Gets the players whose roles are revealed to `viewer` during the night.
///
/// Liberals see nobody. Fascists see every other fascist and Hitler.
/// Hitler sees the fascists only in games of six or fewer players.
pub fn visible_peers<'a>(players: &'a [Player], viewer: &Player, num_players: usize) -> Vec<&'a Player> {
    let can_see = |other: &Player| match (viewer.role, other.role) {
        (Some(Role::Fascist), Some(Role::Fascist | Role::Hitler)) => true,
        (Some(Role::Hitler), Some(Role::Fascist)) => hitler_knows_fascists(num_players),
        _ => false,
    };
    players
        .iter()
        .filter(|other| other.id != viewer.id && !other.spectator)
        .filter(|other| can_see(other))
        .collect()
}
