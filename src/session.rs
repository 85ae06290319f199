use crate::error::GameError;
use crate::game::{
    self,
    action::{Action, Actor},
    update::{Event, PlayerView, PrivateResult, PublicView},
    Game, GameOptions, Snapshot,
};
use crate::store::{GameStats, GameStore, Versioned};
use chrono::Utc;
use dashmap::DashMap;
use rand::RngCore;
use serde::Serialize;
use tokio::sync::watch;

/// How many times a write is re-applied to a fresh snapshot before giving up.
pub const MAX_ATTEMPTS: usize = 5;

/// Manages all the games running on the server.
///
/// Every write loads the latest snapshot, applies the change to it and commits
/// with a compare-and-swap, so writes to one game are serialized while
/// different games proceed independently.
pub struct SessionManager {
    store: Box<dyn GameStore>,
    channels: DashMap<String, watch::Sender<GameUpdate>>,
}

/// Sent to subscribers whenever a game changes.
#[derive(Clone, Serialize, Debug)]
pub struct GameUpdate {
    pub version: u64,
    pub events: Vec<Event>,
}

/// The result of an action that was committed.
#[derive(Clone, Debug)]
pub struct ActionResult {
    pub version: u64,
    pub events: Vec<Event>,
    pub private: Option<PrivateResult>,
}

struct Change<R> {
    snapshot: Snapshot,
    events: Vec<Event>,
    result: R,
}

impl SessionManager {
    pub fn new(store: Box<dyn GameStore>) -> Self {
        Self {
            store,
            channels: DashMap::new(),
        }
    }

    /// Creates a new game in the lobby, returning its ID.
    pub fn create_game(&self, room_code: &str, options: GameOptions) -> Result<String, GameError> {
        if room_code.trim().is_empty() {
            return Err(GameError::Validation("room code must not be empty"));
        }
        let id = Self::random_id();
        let game = Game::new(id.clone(), room_code.trim().to_ascii_uppercase(), options, Utc::now());
        self.store.insert(&Snapshot::new(game))?;
        log::info!("Created game {} in room {}", id, room_code);
        Ok(id)
    }

    /// Looks up a game by its room code.
    pub fn find_game(&self, room_code: &str) -> Result<String, GameError> {
        self.store.find_room(room_code)
    }

    /// Adds a participant to a game, or reconnects the player already using `session_id`.
    pub fn join(&self, game_id: &str, name: &str, session_id: &str, spectator: bool) -> Result<String, GameError> {
        let (_, player_id) = self.transact(game_id, |snapshot| {
            let mut next = snapshot.clone();
            let player_id = next.join(Self::random_id(), name, session_id, spectator, Utc::now())?;
            Ok(Change {
                snapshot: next,
                events: vec![],
                result: player_id,
            })
        })?;
        log::info!("Player {} joined game {}", player_id, game_id);
        Ok(player_id)
    }

    pub fn set_connected(&self, game_id: &str, player_id: &str, connected: bool) -> Result<(), GameError> {
        self.transact(game_id, |snapshot| {
            let mut next = snapshot.clone();
            next.set_connected(player_id, connected, Utc::now())?;
            Ok(Change {
                snapshot: next,
                events: vec![],
                result: (),
            })
        })?;
        Ok(())
    }

    /// Applies an action to a game.
    ///
    /// A lost race re-validates the action against the snapshot that won, so an
    /// action that is no longer legal fails with the engine's error.
    pub fn perform(&self, game_id: &str, actor: &Actor, action: &Action) -> Result<ActionResult, GameError> {
        let result = self.transact(game_id, |snapshot| {
            let transition = game::apply(snapshot, actor, action, Utc::now())?;
            Ok(Change {
                snapshot: transition.snapshot,
                events: transition.events,
                result: transition.private,
            })
        });

        match result {
            Ok((update, private)) => {
                if update.events.iter().any(|e| matches!(e, Event::GameStarted { .. })) {
                    log::info!("Game {} started", game_id);
                }
                Ok(ActionResult {
                    version: update.version,
                    events: update.events,
                    private,
                })
            }
            Err(err) => {
                if err.is_fatal() {
                    log::error!("Game {} is in an impossible state: {}", game_id, err);
                } else {
                    log::debug!("Rejected action on game {}: {}", game_id, err);
                }
                Err(err)
            }
        }
    }

    #[cfg(test)]
    pub fn snapshot(&self, game_id: &str) -> Result<Versioned, GameError> {
        self.store.load(game_id)
    }

    pub fn public_view(&self, game_id: &str) -> Result<PublicView, GameError> {
        Ok(self.store.load(game_id)?.snapshot.public_view())
    }

    pub fn player_view(&self, game_id: &str, player_id: &str) -> Result<PlayerView, GameError> {
        self.store
            .load(game_id)?
            .snapshot
            .player_view(player_id)
            .ok_or(GameError::PlayerNotFound)
    }

    /// Returns a stream of updates for the given game.
    pub fn subscribe(&self, game_id: &str) -> Result<watch::Receiver<GameUpdate>, GameError> {
        let current = self.store.load(game_id)?;
        let initial = GameUpdate {
            version: current.version,
            events: vec![],
        };
        if current.snapshot.game.game_over() {
            // A finished game never changes, so there is nothing to keep a sender for.
            return Ok(watch::channel(initial).1);
        }
        let sender = self
            .channels
            .entry(game_id.to_string())
            .or_insert_with(|| watch::channel(initial).0);
        Ok(sender.subscribe())
    }

    pub fn num_games(&self) -> usize {
        self.store.num_games()
    }

    pub fn past_games(&self) -> Vec<(u64, GameStats)> {
        self.store.past_games()
    }

    /// Loads, changes and commits a game, retrying when another writer got there first.
    fn transact<R, F>(&self, game_id: &str, mut change: F) -> Result<(GameUpdate, R), GameError>
    where
        F: FnMut(&Snapshot) -> Result<Change<R>, GameError>,
    {
        for attempt in 1..=MAX_ATTEMPTS {
            let Versioned { version, snapshot } = self.store.load(game_id)?;
            let Change {
                snapshot: next,
                events,
                result,
            } = change(&snapshot)?;

            match self.store.commit(game_id, version, &next) {
                Ok(version) => {
                    log::debug!("Committed game {} at version {} ({})", game_id, version, next.game.phase);
                    let update = GameUpdate { version, events };
                    self.notify(game_id, update.clone());
                    if !snapshot.game.game_over() && next.game.game_over() {
                        self.archive(&next);
                        // Receivers keep the final update after the sender is gone.
                        self.channels.remove(game_id);
                    }
                    return Ok((update, result));
                }
                Err(GameError::Conflict) => {
                    log::warn!("Conflicting write to game {} (attempt {})", game_id, attempt);
                }
                Err(err) => return Err(err),
            }
        }
        Err(GameError::Conflict)
    }

    /// Notifies all connected clients of the new game state.
    ///
    /// Writers may finish out of order, so an update older than the one already
    /// published is dropped.
    fn notify(&self, game_id: &str, update: GameUpdate) {
        if let Some(sender) = self.channels.get(game_id) {
            sender.send_if_modified(|current| {
                if update.version > current.version {
                    *current = update;
                    true
                } else {
                    false
                }
            });
        }
    }

    fn archive(&self, snapshot: &Snapshot) {
        let Some(stats) = GameStats::from_snapshot(snapshot) else {
            return;
        };
        match self.store.archive(&stats) {
            Ok(()) => log::info!("Game {} is over: {}", stats.id, stats.outcome),
            Err(err) => log::error!("Could not archive game {}: {}", stats.id, err),
        }
    }

    fn random_id() -> String {
        format!("{:016x}", rand::thread_rng().next_u64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{eligible::eligible_chancellors, Phase};
    use crate::store::MemoryStore;
    use std::sync::Barrier;

    fn manager() -> SessionManager {
        SessionManager::new(Box::new(MemoryStore::new()))
    }

    fn options() -> GameOptions {
        GameOptions {
            seed: Some(7),
            ..GameOptions::default()
        }
    }

    /// Creates a started game waiting for a chancellor nomination.
    fn nominating_game(manager: &SessionManager, num_players: usize) -> (String, Vec<String>) {
        let game_id = manager.create_game("room", options()).unwrap();
        let players: Vec<_> = (0..num_players)
            .map(|i| manager.join(&game_id, &format!("Player {}", i), &format!("session-{}", i), false).unwrap())
            .collect();
        let host = Actor::Player(players[0].clone());
        manager.perform(&game_id, &host, &Action::StartGame).unwrap();
        manager.perform(&game_id, &host, &Action::EndNight).unwrap();
        (game_id, players)
    }

    fn nominate(manager: &SessionManager, game_id: &str) {
        let snapshot = manager.snapshot(game_id).unwrap().snapshot;
        let president = snapshot.president().unwrap().id.clone();
        let candidate = eligible_chancellors(&snapshot.game, &snapshot.players)[0].id.clone();
        manager
            .perform(game_id, &Actor::Player(president), &Action::NominateChancellor { candidate })
            .unwrap();
    }

    #[test]
    fn room_codes_are_unique() {
        let manager = manager();
        let id = manager.create_game("abcd", options()).unwrap();
        assert_eq!(manager.find_game("ABCD").unwrap(), id);
        assert!(manager.create_game("ABCD", options()).is_err());
        assert_eq!(manager.num_games(), 1);
    }

    #[test]
    fn rejoining_with_a_session_returns_the_same_player() {
        let manager = manager();
        let game_id = manager.create_game("abcd", options()).unwrap();
        let first = manager.join(&game_id, "Ann", "session", false).unwrap();
        manager.set_connected(&game_id, &first, false).unwrap();
        let second = manager.join(&game_id, "Ann", "session", false).unwrap();
        assert_eq!(first, second);

        let snapshot = manager.snapshot(&game_id).unwrap().snapshot;
        assert_eq!(snapshot.players.len(), 1);
        assert!(snapshot.players[0].connected);
    }

    #[test]
    fn rejected_action_does_not_bump_the_version() {
        let manager = manager();
        let (game_id, players) = nominating_game(&manager, 5);
        let version = manager.snapshot(&game_id).unwrap().version;

        let err = manager
            .perform(&game_id, &Actor::Player(players[1].clone()), &Action::StartGame)
            .unwrap_err();
        assert_eq!(err, GameError::IllegalPhaseTransition { phase: Phase::Nomination });
        assert_eq!(manager.snapshot(&game_id).unwrap().version, version);
    }

    #[test]
    fn subscribers_see_committed_events() {
        let manager = manager();
        let (game_id, _) = nominating_game(&manager, 5);
        let mut updates = manager.subscribe(&game_id).unwrap();

        nominate(&manager, &game_id);
        assert!(updates.has_changed().unwrap());
        let update = updates.borrow_and_update().clone();
        assert!(matches!(update.events[..], [Event::ChancellorNominated { .. }]));
        assert_eq!(update.version, manager.snapshot(&game_id).unwrap().version);
    }

    #[test]
    fn late_updates_do_not_replace_newer_ones() {
        let manager = manager();
        let (game_id, _) = nominating_game(&manager, 5);
        let mut updates = manager.subscribe(&game_id).unwrap();
        let version = updates.borrow_and_update().version;

        let newer = GameUpdate {
            version: version + 2,
            events: vec![Event::VotingComplete],
        };
        let older = GameUpdate {
            version: version + 1,
            events: vec![],
        };
        manager.notify(&game_id, newer);
        manager.notify(&game_id, older);

        let latest = updates.borrow_and_update().clone();
        assert_eq!(latest.version, version + 2);
        assert_eq!(latest.events, vec![Event::VotingComplete]);

        manager.notify(&game_id, GameUpdate { version: version + 2, events: vec![] });
        assert!(!updates.has_changed().unwrap());
    }

    #[test]
    fn concurrent_final_votes_close_the_ballot_once() {
        let manager = manager();
        let (game_id, players) = nominating_game(&manager, 5);
        nominate(&manager, &game_id);

        for player in &players[..3] {
            manager
                .perform(&game_id, &Actor::Player(player.clone()), &Action::CastVote { vote: true })
                .unwrap();
        }

        let barrier = Barrier::new(2);
        let results: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = players[3..]
                .iter()
                .map(|player| {
                    let (manager, barrier, game_id) = (&manager, &barrier, &game_id);
                    scope.spawn(move || {
                        barrier.wait();
                        manager.perform(game_id, &Actor::Player(player.clone()), &Action::CastVote { vote: false })
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let closed = results
            .iter()
            .map(|result| result.as_ref().unwrap())
            .filter(|result| result.events.contains(&Event::VotingComplete))
            .count();
        assert_eq!(closed, 1);

        let snapshot = manager.snapshot(&game_id).unwrap().snapshot;
        assert_eq!(snapshot.game.phase, Phase::VotingResult);
        let round = snapshot.game.election_round;
        assert_eq!(snapshot.votes.iter().filter(|v| v.election_round == round).count(), 5);
    }

    #[test]
    fn finished_games_are_archived_once() {
        let manager = manager();
        let (game_id, players) = nominating_game(&manager, 5);
        let Versioned { version, snapshot } = manager.snapshot(&game_id).unwrap();
        let hitler = snapshot.players.iter().find(|p| p.is_hitler()).unwrap().id.clone();
        let president = snapshot.players.iter().find(|p| !p.is_hitler()).unwrap();

        // Put Hitler up for chancellor with three fascist policies down.
        let mut rigged = snapshot.clone();
        rigged.game.board.fascist_cards = 3;
        rigged.game.president_index = president.seat.unwrap();
        let president = president.id.clone();
        manager.store.commit(&game_id, version, &rigged).unwrap();
        let updates = manager.subscribe(&game_id).unwrap();

        manager
            .perform(&game_id, &Actor::Player(president), &Action::NominateChancellor { candidate: hitler })
            .unwrap();
        for player in &players {
            manager
                .perform(&game_id, &Actor::Player(player.clone()), &Action::CastVote { vote: true })
                .unwrap();
        }
        let result = manager.perform(&game_id, &Actor::System, &Action::ResolveElection).unwrap();
        assert!(result.events.iter().any(|e| matches!(e, Event::GameOver { .. })));

        assert!(manager.perform(&game_id, &Actor::System, &Action::ResolveElection).is_err());
        let past = manager.past_games();
        assert_eq!(past.len(), 1);
        assert_eq!(past[0].1.id, game_id);

        // The channel is dropped, but subscribers still hold the final update.
        assert!(!manager.channels.contains_key(&game_id));
        assert_eq!(updates.borrow().version, result.version);
        assert!(updates.borrow().events.iter().any(|e| matches!(e, Event::GameOver { .. })));

        let late = manager.subscribe(&game_id).unwrap();
        assert_eq!(late.borrow().version, manager.snapshot(&game_id).unwrap().version);
        assert!(!manager.channels.contains_key(&game_id));
    }
}
