use super::{
    eligible,
    executive_power::ExecutiveAction,
    party::Party,
    player::{visible_peers, PlayerId, Role},
    votes::{has_cast, Tally},
    Phase, Snapshot, WinCondition,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A publicly visible consequence of an action.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    GameStarted { num_players: usize },
    NominationStarted { president: usize, election_round: u32 },
    ChancellorNominated { president: PlayerId, chancellor: PlayerId },
    VoteCast { player: PlayerId },
    VotingComplete,
    ElectionResolved { tally: Tally },
    ElectionFailed { election_tracker: usize },
    /// Three governments failed in a row; the top policy is enacted and term limits are forgotten.
    Chaos { policy: Party },
    DeckReshuffled,
    LegislativeSessionStarted,
    PresidentDiscarded,
    PolicyEnacted { policy: Party, chaos: bool },
    VetoRequested,
    VetoAccepted,
    VetoRejected,
    ExecutivePowerGranted { action: ExecutiveAction },
    PlayerInvestigated { target: PlayerId },
    SpecialElectionCalled { president: usize },
    PolicyPeeked,
    PlayerExecuted { target: PlayerId },
    GameOver { winner: Party, condition: WinCondition },
}

/// Information revealed only to the acting player.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PrivateResult {
    Investigation { target: PlayerId, party: Party },
    PolicyPeek { cards: Vec<Party> },
}

/// Collects the results of a single action while it is being applied.
#[derive(Debug)]
pub struct Outcome {
    pub now: DateTime<Utc>,
    pub events: Vec<Event>,
    pub private: Option<PrivateResult>,
}

impl Outcome {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            events: vec![],
            private: None,
        }
    }

    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct PublicPlayer {
    pub id: PlayerId,
    pub name: String,
    pub seat: Option<usize>,
    pub alive: bool,
    pub spectator: bool,
    pub connected: bool,
    pub investigated: bool,
    /// Only revealed once the game is over.
    pub role: Option<Role>,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct PublicVote {
    pub player_id: PlayerId,
    /// Hidden while the ballot is still open.
    pub vote: Option<bool>,
}

/// The state of a game as shown to every viewer.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct PublicView {
    pub game_id: String,
    pub room_code: String,
    pub phase: Phase,
    pub liberal_policies: usize,
    pub fascist_policies: usize,
    pub election_tracker: usize,
    pub election_round: u32,
    pub draw_pile: usize,
    pub discard_pile: usize,
    pub president_index: Option<usize>,
    pub chancellor_id: Option<PlayerId>,
    pub previous_president_id: Option<PlayerId>,
    pub previous_chancellor_id: Option<PlayerId>,
    pub pending_executive_action: Option<ExecutiveAction>,
    pub veto_unlocked: bool,
    pub veto_requested: bool,
    pub winner: Option<Party>,
    pub win_condition: Option<WinCondition>,
    pub players: Vec<PublicPlayer>,
    pub votes: Vec<PublicVote>,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct Teammate {
    pub id: PlayerId,
    pub name: String,
    pub role: Role,
}

/// The state of a game as shown privately to one player.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub role: Option<Role>,
    pub party: Option<Party>,
    pub teammates: Vec<Teammate>,
    pub is_president: bool,
    pub is_chancellor: bool,
    pub has_voted: bool,
    /// The policies this player currently has to choose from.
    pub hand: Option<Vec<Party>>,
    pub can_veto: bool,
    /// Players who may be chosen as chancellor, when this player is nominating.
    pub eligible_chancellors: Vec<PlayerId>,
}

impl Snapshot {
    pub fn public_view(&self) -> PublicView {
        let game = &self.game;
        let reveal_roles = game.game_over();
        let ballot_open = game.phase == Phase::Voting;

        PublicView {
            game_id: game.id.clone(),
            room_code: game.room_code.clone(),
            phase: game.phase,
            liberal_policies: game.board.liberal_cards,
            fascist_policies: game.board.fascist_cards,
            election_tracker: game.election_tracker,
            election_round: game.election_round,
            draw_pile: game.deck.count(),
            discard_pile: game.deck.discard_count(),
            president_index: self.president().and_then(|p| p.seat),
            chancellor_id: game.chancellor_id.clone(),
            previous_president_id: game.previous_president_id.clone(),
            previous_chancellor_id: game.previous_chancellor_id.clone(),
            pending_executive_action: game.pending_executive_action,
            veto_unlocked: game.veto_unlocked,
            veto_requested: game.veto_requested,
            winner: game.winner,
            win_condition: game.win_condition,
            players: self
                .players
                .iter()
                .map(|p| PublicPlayer {
                    id: p.id.clone(),
                    name: p.name.clone(),
                    seat: p.seat,
                    alive: p.alive,
                    spectator: p.spectator,
                    connected: p.connected,
                    investigated: game.investigated_players.contains(&p.id),
                    role: if reveal_roles { p.role } else { None },
                })
                .collect(),
            votes: self
                .votes
                .iter()
                .filter(|v| v.election_round == game.election_round && v.vote.is_some())
                .map(|v| PublicVote {
                    player_id: v.player_id.clone(),
                    vote: if ballot_open { None } else { v.vote },
                })
                .collect(),
        }
    }

    /// Builds the private view for a player, or `None` if no such player exists.
    pub fn player_view(&self, player_id: &str) -> Option<PlayerView> {
        let player = self.player(player_id).ok()?;
        let game = &self.game;

        let is_president = self.president().map(|p| p.id == player.id).unwrap_or(false);
        let is_chancellor = game.chancellor_id.as_deref() == Some(player_id);

        let hand = match game.phase {
            Phase::LegislativePresident if is_president => game.drawn_policies.map(|cards| cards.to_vec()),
            Phase::LegislativeChancellor | Phase::VetoRequested if is_chancellor => {
                game.chancellor_policies.map(|cards| cards.to_vec())
            }
            _ => None,
        };

        let teammates = visible_peers(&self.players, player, game.board.num_players)
            .into_iter()
            .filter_map(|p| {
                Some(Teammate {
                    id: p.id.clone(),
                    name: p.name.clone(),
                    role: p.role?,
                })
            })
            .collect();

        let eligible_chancellors = if game.phase == Phase::Nomination && is_president {
            eligible::eligible_chancellors(game, &self.players)
                .into_iter()
                .map(|p| p.id.clone())
                .collect()
        } else {
            vec![]
        };

        Some(PlayerView {
            id: player.id.clone(),
            name: player.name.clone(),
            role: player.role,
            party: player.party(),
            teammates,
            is_president,
            is_chancellor,
            has_voted: has_cast(&self.votes, player_id, game.election_round),
            hand,
            can_veto: game.phase == Phase::LegislativeChancellor
                && is_chancellor
                && game.veto_unlocked
                && !game.veto_requested,
            eligible_chancellors,
        })
    }
}
