use serde::{Deserialize, Serialize};

/// Options for customising a game of Secret Hitler.
#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[serde(default)]
pub struct GameOptions {
    /// Whether a fascist policy enacted through chaos grants the board power for its slot.
    pub chaos_grants_powers: bool,
    /// Seed for dealing roles and cards; drawn from the OS when absent.
    pub seed: Option<u64>,
}

impl Default for GameOptions {
    fn default() -> Self {
        Self {
            chaos_grants_powers: true,
            seed: None,
        }
    }
}
