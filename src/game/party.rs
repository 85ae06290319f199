use serde::{Deserialize, Serialize};
use std::fmt;

/// The two political parties of the game.
///
/// Doubles as the type of a policy card and as the winning team.
#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Debug)]
#[serde(rename_all = "snake_case")]
pub enum Party {
    Liberal,
    Fascist,
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Party::Liberal => "liberal",
            Party::Fascist => "fascist",
        })
    }
}
