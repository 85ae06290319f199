use super::player::PlayerId;
use serde::{Deserialize, Serialize};

/// Who is submitting an action.
///
/// Player identities arrive already verified by the transport layer.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Actor {
    Player(PlayerId),
    /// The board or an external timer, which may only resolve elections.
    System,
}

/// An inbound action against a game.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// The host deals the roles.
    StartGame,
    /// The host ends the night once everyone has seen their role.
    EndNight,
    NominateChancellor { candidate: PlayerId },
    CastVote { vote: bool },
    /// Counts the ballots once everyone has voted.
    ResolveElection,
    /// The president discards one of the three drawn policies.
    PresidentDiscard { index: usize },
    /// The chancellor enacts one of the two remaining policies.
    ChancellorEnact { index: usize },
    RequestVeto,
    RespondToVeto { accept: bool },
    InvestigateLoyalty { target: PlayerId },
    SpecialElection { target: PlayerId },
    PolicyPeek,
    Execute { target: PlayerId },
}
