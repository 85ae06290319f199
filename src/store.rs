use crate::error::GameError;
use crate::game::{party::Party, Snapshot, WinCondition};
use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A snapshot together with the version it was committed at.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct Versioned {
    pub version: u64,
    pub snapshot: Snapshot,
}

#[derive(Serialize)]
struct VersionedRef<'a> {
    version: u64,
    snapshot: &'a Snapshot,
}

/// Summary of a finished game, kept for statistics.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameStats {
    pub id: String,
    pub room_code: String,
    pub players: Vec<String>,
    pub started: DateTime<Utc>,
    pub finished: DateTime<Utc>,
    pub winner: Party,
    pub outcome: WinCondition,
}

impl GameStats {
    /// Summarises a snapshot, or returns `None` if the game has not finished.
    pub fn from_snapshot(snapshot: &Snapshot) -> Option<Self> {
        let game = &snapshot.game;
        Some(Self {
            id: game.id.clone(),
            room_code: game.room_code.clone(),
            players: snapshot.seated_players().into_iter().map(|p| p.name.clone()).collect(),
            started: game.started_at?,
            finished: game.ended_at?,
            winner: game.winner?,
            outcome: game.win_condition?,
        })
    }
}

/// Durable storage for game snapshots.
///
/// `commit` is a compare-and-swap on the version: it fails with
/// [`GameError::Conflict`] unless the stored version still equals
/// `expected_version`, which makes each game a unit of mutual exclusion.
pub trait GameStore: Send + Sync {
    /// Stores a brand new game at version 0.
    fn insert(&self, snapshot: &Snapshot) -> Result<(), GameError>;
    fn load(&self, game_id: &str) -> Result<Versioned, GameError>;
    /// Looks up the id of the game using the given room code.
    fn find_room(&self, room_code: &str) -> Result<String, GameError>;
    /// Replaces the snapshot if it is still at `expected_version`, returning the new version.
    fn commit(&self, game_id: &str, expected_version: u64, snapshot: &Snapshot) -> Result<u64, GameError>;
    fn archive(&self, stats: &GameStats) -> Result<(), GameError>;
    fn past_games(&self) -> Vec<(u64, GameStats)>;
    fn num_games(&self) -> usize;
}

pub fn normalize_room_code(room_code: &str) -> String {
    room_code.trim().to_ascii_uppercase()
}

/// Keeps every game in memory.
#[derive(Default)]
pub struct MemoryStore {
    games: DashMap<String, Versioned>,
    rooms: DashMap<String, String>,
    archive: DashMap<u64, GameStats>,
    next_archive_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GameStore for MemoryStore {
    fn insert(&self, snapshot: &Snapshot) -> Result<(), GameError> {
        let game = &snapshot.game;
        match self.rooms.entry(normalize_room_code(&game.room_code)) {
            Entry::Occupied(_) => return Err(GameError::Validation("room code is already in use")),
            Entry::Vacant(entry) => {
                entry.insert(game.id.clone());
            }
        }
        self.games.insert(
            game.id.clone(),
            Versioned {
                version: 0,
                snapshot: snapshot.clone(),
            },
        );
        Ok(())
    }

    fn load(&self, game_id: &str) -> Result<Versioned, GameError> {
        self.games
            .get(game_id)
            .map(|entry| entry.clone())
            .ok_or(GameError::GameNotFound)
    }

    fn find_room(&self, room_code: &str) -> Result<String, GameError> {
        self.rooms
            .get(&normalize_room_code(room_code))
            .map(|id| id.clone())
            .ok_or(GameError::GameNotFound)
    }

    fn commit(&self, game_id: &str, expected_version: u64, snapshot: &Snapshot) -> Result<u64, GameError> {
        let mut entry = self.games.get_mut(game_id).ok_or(GameError::GameNotFound)?;
        if entry.version != expected_version {
            return Err(GameError::Conflict);
        }
        entry.version += 1;
        entry.snapshot = snapshot.clone();
        Ok(entry.version)
    }

    fn archive(&self, stats: &GameStats) -> Result<(), GameError> {
        let key = self.next_archive_id.fetch_add(1, Ordering::Relaxed);
        self.archive.insert(key, stats.clone());
        Ok(())
    }

    fn past_games(&self) -> Vec<(u64, GameStats)> {
        let mut games: Vec<_> = self.archive.iter().map(|e| (*e.key(), e.value().clone())).collect();
        games.sort_by_key(|(id, _)| *id);
        games
    }

    fn num_games(&self) -> usize {
        self.games.len()
    }
}

/// Persists games to disk, so they can be recovered upon server restart.
#[derive(Clone)]
pub struct SledStore {
    db: sled::Db,
    games: sled::Tree,
    rooms: sled::Tree,
    archive: sled::Tree,
}

impl SledStore {
    pub fn open(db: sled::Db) -> Result<Self, GameError> {
        Ok(Self {
            games: db.open_tree("games")?,
            rooms: db.open_tree("rooms")?,
            archive: db.open_tree("archive")?,
            db,
        })
    }
}

impl GameStore for SledStore {
    fn insert(&self, snapshot: &Snapshot) -> Result<(), GameError> {
        let game = &snapshot.game;
        let code = normalize_room_code(&game.room_code);
        let claimed = self
            .rooms
            .compare_and_swap(code.as_bytes(), None as Option<&[u8]>, Some(game.id.as_bytes()))?;
        if claimed.is_err() {
            return Err(GameError::Validation("room code is already in use"));
        }
        let data = serde_json::to_vec(&VersionedRef { version: 0, snapshot })?;
        self.games.insert(game.id.as_bytes(), data)?;
        Ok(())
    }

    fn load(&self, game_id: &str) -> Result<Versioned, GameError> {
        let data = self.games.get(game_id.as_bytes())?.ok_or(GameError::GameNotFound)?;
        Ok(serde_json::from_slice(&data)?)
    }

    fn find_room(&self, room_code: &str) -> Result<String, GameError> {
        let id = self
            .rooms
            .get(normalize_room_code(room_code).as_bytes())?
            .ok_or(GameError::GameNotFound)?;
        String::from_utf8(id.to_vec()).map_err(|err| GameError::Storage(err.to_string()))
    }

    fn commit(&self, game_id: &str, expected_version: u64, snapshot: &Snapshot) -> Result<u64, GameError> {
        let current = self.games.get(game_id.as_bytes())?.ok_or(GameError::GameNotFound)?;
        let stored: Versioned = serde_json::from_slice(&current)?;
        if stored.version != expected_version {
            return Err(GameError::Conflict);
        }

        let version = expected_version + 1;
        let data = serde_json::to_vec(&VersionedRef { version, snapshot })?;
        match self.games.compare_and_swap(game_id.as_bytes(), Some(current), Some(data))? {
            Ok(()) => Ok(version),
            Err(_) => Err(GameError::Conflict),
        }
    }

    fn archive(&self, stats: &GameStats) -> Result<(), GameError> {
        let key = self.db.generate_id()?.to_be_bytes();
        self.archive.insert(key, serde_json::to_vec(stats)?)?;
        Ok(())
    }

    fn past_games(&self) -> Vec<(u64, GameStats)> {
        self.archive
            .iter()
            .flat_map(|entry| {
                let (key, value) = entry.ok()?;
                let key = u64::from_be_bytes(key.as_ref().try_into().ok()?);
                Some((key, serde_json::from_slice(&value).ok()?))
            })
            .collect()
    }

    fn num_games(&self) -> usize {
        self.games.len()
    }
}
