use self::action::{Action, Actor};
use self::board::Board;
use self::deck::Deck;
use self::executive_power::ExecutiveAction;
pub use self::options::GameOptions;
use self::party::Party;
use self::player::{assign_roles, Player, PlayerId, MAX_PLAYERS, MIN_PLAYERS};
use self::shuffle::Shuffler;
use self::update::{Event, Outcome, PrivateResult};
use self::votes::Vote;
use crate::error::GameError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod action;
pub mod board;
pub mod deck;
mod election;
pub mod eligible;
pub mod executive_power;
mod legislative;
pub mod options;
pub mod party;
pub mod player;
pub mod shuffle;
mod test;
pub mod update;
pub mod votes;

/// A game of Secret Hitler, as stored for one room.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct Game {
    pub id: String,
    pub room_code: String,
    pub options: GameOptions,
    pub phase: Phase,
    pub board: Board,
    pub deck: Deck,
    /// Consecutive failed governments since the last enactment (0–2).
    pub election_tracker: usize,
    /// Increases with every new nomination; ballots are keyed by it.
    pub election_round: u32,
    pub president_index: usize,
    pub chancellor_id: Option<PlayerId>,
    pub previous_president_id: Option<PlayerId>,
    pub previous_chancellor_id: Option<PlayerId>,
    /// The president's hand during `legislative_president`.
    pub drawn_policies: Option<[Party; 3]>,
    /// The chancellor's hand during `legislative_chancellor` and `veto_requested`.
    pub chancellor_policies: Option<[Party; 2]>,
    pub pending_executive_action: Option<ExecutiveAction>,
    pub investigated_players: Vec<PlayerId>,
    /// The seat that called a special election; the rotation resumes from it.
    pub special_election_return_index: Option<usize>,
    pub veto_unlocked: bool,
    pub veto_requested: bool,
    pub winner: Option<Party>,
    pub win_condition: Option<WinCondition>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    shuffler: Shuffler,
}

/// Represents the current phase in the game loop.
#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Debug)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Lobby,
    Night,
    Nomination,
    Voting,
    VotingResult,
    LegislativePresident,
    LegislativeChancellor,
    VetoRequested,
    ExecutiveAction,
    GameOver,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Lobby => "lobby",
            Phase::Night => "night",
            Phase::Nomination => "nomination",
            Phase::Voting => "voting",
            Phase::VotingResult => "voting_result",
            Phase::LegislativePresident => "legislative_president",
            Phase::LegislativeChancellor => "legislative_chancellor",
            Phase::VetoRequested => "veto_requested",
            Phase::ExecutiveAction => "executive_action",
            Phase::GameOver => "game_over",
        })
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Debug)]
pub enum WinCondition {
    /// The liberals completed their policy track.
    LiberalPolicyTrack,
    /// The fascists completed their policy track.
    FascistPolicyTrack,
    /// Hitler was elected chancellor
    HitlerChancellor,
    /// Hitler was executed
    HitlerExecuted,
}

impl WinCondition {
    pub fn winner(&self) -> Party {
        match self {
            WinCondition::LiberalPolicyTrack | WinCondition::HitlerExecuted => Party::Liberal,
            WinCondition::FascistPolicyTrack | WinCondition::HitlerChancellor => Party::Fascist,
        }
    }
}

impl fmt::Display for WinCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WinCondition::LiberalPolicyTrack => "LiberalPolicyTrack",
            WinCondition::FascistPolicyTrack => "FascistPolicyTrack",
            WinCondition::HitlerChancellor => "HitlerChancellor",
            WinCondition::HitlerExecuted => "HitlerExecuted",
        })
    }
}

/// Everything the engine needs to know about one game: the game row, its players and its ballots.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct Snapshot {
    pub game: Game,
    pub players: Vec<Player>,
    pub votes: Vec<Vote>,
}

/// The result of successfully applying an action to a snapshot.
#[derive(Clone, Debug)]
pub struct Transition {
    pub snapshot: Snapshot,
    /// What every viewer may learn about the transition.
    pub events: Vec<Event>,
    /// What only the acting player learns.
    pub private: Option<PrivateResult>,
}

/// Applies an action to a snapshot, producing the next snapshot.
///
/// The input is never modified; a rejected action leaves nothing behind.
pub fn apply(snapshot: &Snapshot, actor: &Actor, action: &Action, now: DateTime<Utc>) -> Result<Transition, GameError> {
    let mut next = snapshot.clone();
    let mut out = Outcome::new(now);
    next.dispatch(actor, action, &mut out)?;
    Ok(Transition {
        snapshot: next,
        events: out.events,
        private: out.private,
    })
}

impl Game {
    /// Creates a new game in the lobby.
    pub fn new(id: String, room_code: String, options: GameOptions, now: DateTime<Utc>) -> Self {
        Self::with_shuffler(id, room_code, options, Shuffler::new(options.seed), now)
    }

    /// Creates a new game in the lobby that deals with the given shuffler.
    pub fn with_shuffler(
        id: String,
        room_code: String,
        options: GameOptions,
        shuffler: Shuffler,
        now: DateTime<Utc>,
    ) -> Self {
        Game {
            id,
            room_code,
            options,
            phase: Phase::Lobby,
            board: Board::new(0),
            deck: Deck::default(),
            election_tracker: 0,
            election_round: 0,
            president_index: 0,
            chancellor_id: None,
            previous_president_id: None,
            previous_chancellor_id: None,
            drawn_policies: None,
            chancellor_policies: None,
            pending_executive_action: None,
            investigated_players: vec![],
            special_election_return_index: None,
            veto_unlocked: false,
            veto_requested: false,
            winner: None,
            win_condition: None,
            created_at: now,
            started_at: None,
            ended_at: None,
            shuffler,
        }
    }

    /// Returns true if the game is over.
    pub fn game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }
}

impl Snapshot {
    pub fn new(game: Game) -> Self {
        Self {
            game,
            players: vec![],
            votes: vec![],
        }
    }

    /// Finds a player with the given id.
    pub fn player(&self, id: &str) -> Result<&Player, GameError> {
        self.players.iter().find(|p| p.id == id).ok_or(GameError::PlayerNotFound)
    }

    fn player_mut(&mut self, id: &str) -> Result<&mut Player, GameError> {
        self.players.iter_mut().find(|p| p.id == id).ok_or(GameError::PlayerNotFound)
    }

    /// Gets the seated players, ordered by seat.
    pub fn seated_players(&self) -> Vec<&Player> {
        let mut seated: Vec<_> = self.players.iter().filter(|p| !p.spectator && p.seat.is_some()).collect();
        seated.sort_by_key(|p| p.seat);
        seated
    }

    /// Gets the number of seated players.
    pub fn num_players(&self) -> usize {
        self.players.iter().filter(|p| !p.spectator && p.seat.is_some()).count()
    }

    /// Gets the player holding the presidency.
    pub fn president(&self) -> Option<&Player> {
        if matches!(self.game.phase, Phase::Lobby | Phase::Night) {
            return None;
        }
        self.players.iter().find(|p| !p.spectator && p.seat == Some(self.game.president_index))
    }

    /// Gets the nominated or elected chancellor.
    pub fn chancellor(&self) -> Option<&Player> {
        let id = self.game.chancellor_id.as_deref()?;
        self.players.iter().find(|p| p.id == id)
    }

    /// Adds a participant to the game, or returns the existing player for a known session.
    pub fn join(
        &mut self,
        new_id: PlayerId,
        name: &str,
        session_id: &str,
        as_spectator: bool,
        now: DateTime<Utc>,
    ) -> Result<PlayerId, GameError> {
        if self.game.game_over() {
            return Err(self.illegal_phase());
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(GameError::Validation("player name must not be empty"));
        }

        if let Some(player) = self.players.iter_mut().find(|p| p.session_id == session_id) {
            player.name = name.to_string();
            player.connected = true;
            player.last_seen = now;
            return Ok(player.id.clone());
        }

        let mut player = Player::new(new_id, self.game.id.clone(), name.to_string(), session_id.to_string(), now);
        if as_spectator {
            player.spectator = true;
        } else {
            if self.game.phase != Phase::Lobby {
                return Err(self.illegal_phase());
            }
            if self.num_players() >= MAX_PLAYERS {
                return Err(GameError::Validation("the game is full"));
            }
            let seat = self.players.iter().filter_map(|p| p.seat).max().map_or(0, |s| s + 1);
            player.seat = Some(seat);
        }

        let id = player.id.clone();
        self.players.push(player);
        Ok(id)
    }

    /// Records whether a player's client is currently connected.
    pub fn set_connected(&mut self, player_id: &str, connected: bool, now: DateTime<Utc>) -> Result<(), GameError> {
        let player = self.player_mut(player_id)?;
        player.connected = connected;
        player.last_seen = now;
        Ok(())
    }

    fn dispatch(&mut self, actor: &Actor, action: &Action, out: &mut Outcome) -> Result<(), GameError> {
        match action {
            Action::StartGame => self.start_game(actor, out),
            Action::EndNight => self.end_night(actor, out),
            Action::NominateChancellor { candidate } => self.nominate_chancellor(actor, candidate, out),
            Action::CastVote { vote } => self.cast_vote(actor, *vote, out),
            Action::ResolveElection => self.resolve_election(actor, out),
            Action::PresidentDiscard { index } => self.president_discard(actor, *index, out),
            Action::ChancellorEnact { index } => self.chancellor_enact(actor, *index, out),
            Action::RequestVeto => self.request_veto(actor, out),
            Action::RespondToVeto { accept } => self.respond_to_veto(actor, *accept, out),
            Action::InvestigateLoyalty { target } => self.investigate_loyalty(actor, target, out),
            Action::SpecialElection { target } => self.special_election(actor, target, out),
            Action::PolicyPeek => self.policy_peek(actor, out),
            Action::Execute { target } => self.execute(actor, target, out),
        }
    }

    /// Deals the roles and the policy deck, and enters the night phase.
    fn start_game(&mut self, actor: &Actor, out: &mut Outcome) -> Result<(), GameError> {
        self.check_phase(Phase::Lobby)?;
        self.check_host(actor)?;

        let num_players = self.num_players();
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&num_players) {
            return Err(GameError::Validation("between 5 and 10 seated players are required"));
        }

        let roles = assign_roles(num_players, &mut self.game.shuffler)?;
        let seated: Vec<PlayerId> = self.seated_players().into_iter().map(|p| p.id.clone()).collect();
        for (id, role) in seated.iter().zip(roles) {
            self.player_mut(id)?.role = Some(role);
        }

        self.game.board = Board::new(num_players);
        self.game.deck = Deck::new(&mut self.game.shuffler);
        self.game.president_index = self.game.shuffler.pick(num_players);
        self.game.phase = Phase::Night;
        self.game.started_at = Some(out.now);
        out.push(Event::GameStarted { num_players });
        Ok(())
    }

    /// Ends the night once the host is satisfied that everyone has seen their role.
    fn end_night(&mut self, actor: &Actor, out: &mut Outcome) -> Result<(), GameError> {
        self.check_phase(Phase::Night)?;
        self.check_host(actor)?;
        self.game.election_round = 1;
        self.game.phase = Phase::Nomination;
        out.push(Event::NominationStarted {
            president: self.game.president_index,
            election_round: self.game.election_round,
        });
        Ok(())
    }

    /// Moves the presidency on and opens a fresh nomination round.
    ///
    /// A pending special-election return seat takes precedence over the current president.
    fn start_next_round(&mut self, out: &mut Outcome) -> Result<(), GameError> {
        let from = self
            .game
            .special_election_return_index
            .take()
            .unwrap_or(self.game.president_index);
        self.game.president_index = eligible::next_president(from, &self.players)?;
        self.open_nomination(out);
        Ok(())
    }

    /// Opens a nomination round for whoever currently holds the presidency.
    fn open_nomination(&mut self, out: &mut Outcome) {
        self.game.chancellor_id = None;
        self.game.pending_executive_action = None;
        self.game.election_round += 1;
        self.game.phase = Phase::Nomination;
        out.push(Event::NominationStarted {
            president: self.game.president_index,
            election_round: self.game.election_round,
        });
    }

    /// Places a policy on the board and decides where the game goes next.
    ///
    /// Shared by the chancellor's enactment and by chaos.
    fn enact_policy(&mut self, card: Party, chaos: bool, out: &mut Outcome) -> Result<(), GameError> {
        let enactment = self.game.board.enact(card);
        self.game.election_tracker = 0;
        self.game.veto_requested = false;
        self.game.drawn_policies = None;
        self.game.chancellor_policies = None;
        if enactment.veto_unlocked {
            self.game.veto_unlocked = true;
        }
        out.push(Event::PolicyEnacted { policy: card, chaos });

        if let Some(condition) = enactment.victory {
            self.end_game(condition, out);
            return Ok(());
        }

        let power = enactment.power.filter(|_| !chaos || self.game.options.chaos_grants_powers);
        match power {
            Some(action) => {
                self.game.pending_executive_action = Some(action);
                self.game.phase = Phase::ExecutiveAction;
                out.push(Event::ExecutivePowerGranted { action });
                Ok(())
            }
            None => self.start_next_round(out),
        }
    }

    fn end_game(&mut self, condition: WinCondition, out: &mut Outcome) {
        let winner = condition.winner();
        self.game.phase = Phase::GameOver;
        self.game.winner = Some(winner);
        self.game.win_condition = Some(condition);
        self.game.pending_executive_action = None;
        self.game.drawn_policies = None;
        self.game.chancellor_policies = None;
        self.game.ended_at = Some(out.now);
        out.push(Event::GameOver { winner, condition });
    }

    fn illegal_phase(&self) -> GameError {
        GameError::IllegalPhaseTransition { phase: self.game.phase }
    }

    fn check_phase(&self, phase: Phase) -> Result<(), GameError> {
        if self.game.phase == phase {
            Ok(())
        } else {
            Err(self.illegal_phase())
        }
    }

    /// Resolves the acting player, rejecting system triggers.
    fn acting_player(&self, actor: &Actor) -> Result<&Player, GameError> {
        match actor {
            Actor::Player(id) => self.player(id),
            Actor::System => Err(GameError::Unauthorized),
        }
    }

    fn check_host(&self, actor: &Actor) -> Result<(), GameError> {
        let player = self.acting_player(actor)?;
        if player.spectator || player.seat != Some(0) {
            return Err(GameError::Unauthorized);
        }
        Ok(())
    }

    fn check_president(&self, actor: &Actor) -> Result<PlayerId, GameError> {
        let player = self.acting_player(actor)?;
        if !player.is_active() || player.seat != Some(self.game.president_index) {
            return Err(GameError::Unauthorized);
        }
        Ok(player.id.clone())
    }

    fn check_chancellor(&self, actor: &Actor) -> Result<PlayerId, GameError> {
        let player = self.acting_player(actor)?;
        if !player.is_active() || self.game.chancellor_id.as_deref() != Some(player.id.as_str()) {
            return Err(GameError::Unauthorized);
        }
        Ok(player.id.clone())
    }

    /// Draws cards, reporting a reshuffle to viewers when one happened.
    fn draw(&mut self, n: usize, out: &mut Outcome) -> Result<Vec<Party>, GameError> {
        if self.game.deck.reshuffle_if_below(n, &mut self.game.shuffler) {
            out.push(Event::DeckReshuffled);
        }
        self.game.deck.draw(n, &mut self.game.shuffler)
    }

    fn reshuffle_if_below(&mut self, minimum: usize, out: &mut Outcome) {
        if self.game.deck.reshuffle_if_below(minimum, &mut self.game.shuffler) {
            out.push(Event::DeckReshuffled);
        }
    }
}
