use super::{executive_power::ExecutiveAction, party::Party, WinCondition};
use serde::{Deserialize, Serialize};

pub const MAX_LIBERAL_CARDS: usize = 5;
pub const MAX_FASCIST_CARDS: usize = 6;
pub const VETO_THRESHOLD: usize = 5;
pub const HITLER_CHANCELLOR_THRESHOLD: usize = 3;

/// The fascist track layout, chosen by player count.
#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum BoardSize {
    /// Five or six players.
    Small,
    /// Seven or eight players.
    Medium,
    /// Nine or ten players.
    Large,
}

impl BoardSize {
    pub fn for_players(num_players: usize) -> Self {
        match num_players {
            0..=6 => BoardSize::Small,
            7..=8 => BoardSize::Medium,
            _ => BoardSize::Large,
        }
    }
}

/// The enacted policy tracks.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug)]
pub struct Board {
    pub num_players: usize,
    pub liberal_cards: usize,
    pub fascist_cards: usize,
}

/// What happened as a result of enacting a single policy.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Enactment {
    pub card: Party,
    /// Set when the enactment completed a policy track.
    pub victory: Option<WinCondition>,
    /// Set when this enactment brought the fascist track to the veto threshold or beyond.
    pub veto_unlocked: bool,
    /// The board power granted by a fascist enactment, if the game continues.
    pub power: Option<ExecutiveAction>,
}

impl Board {
    /// Creates an empty board.
    pub fn new(num_players: usize) -> Self {
        Board {
            num_players,
            liberal_cards: 0,
            fascist_cards: 0,
        }
    }

    pub fn size(&self) -> BoardSize {
        BoardSize::for_players(self.num_players)
    }

    /// Places a policy on its track and reports the consequences.
    pub fn enact(&mut self, card: Party) -> Enactment {
        match card {
            Party::Liberal => {
                self.liberal_cards += 1;
                Enactment {
                    card,
                    victory: (self.liberal_cards >= MAX_LIBERAL_CARDS).then_some(WinCondition::LiberalPolicyTrack),
                    veto_unlocked: false,
                    power: None,
                }
            }
            Party::Fascist => {
                self.fascist_cards += 1;
                let victory =
                    (self.fascist_cards >= MAX_FASCIST_CARDS).then_some(WinCondition::FascistPolicyTrack);
                Enactment {
                    card,
                    victory,
                    veto_unlocked: self.veto_unlocked(),
                    power: if victory.is_none() { self.executive_power() } else { None },
                }
            }
        }
    }

    /// Gets the executive action unlocked by the last played fascist card, if there is any.
    pub fn executive_power(&self) -> Option<ExecutiveAction> {
        use BoardSize::*;
        use ExecutiveAction::*;
        match (self.size(), self.fascist_cards) {
            (Large, 1) => Some(InvestigateLoyalty),
            (Medium | Large, 2) => Some(InvestigateLoyalty),
            (Small, 3) => Some(PolicyPeek),
            (Medium | Large, 3) => Some(SpecialElection),
            (_, 4) => Some(Execution),
            (_, 5) => Some(Execution),
            _ => None,
        }
    }

    /// Checks whether veto power is unlocked.
    pub fn veto_unlocked(&self) -> bool {
        self.fascist_cards >= VETO_THRESHOLD
    }

    /// Checks whether electing Hitler as chancellor now wins the game.
    pub fn hitler_chancellor_wins(&self) -> bool {
        self.fascist_cards >= HITLER_CHANCELLOR_THRESHOLD
    }
}
