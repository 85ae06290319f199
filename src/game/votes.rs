use super::player::PlayerId;
use serde::{Deserialize, Serialize};

/// A player's ballot for one election round.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug)]
pub struct Vote {
    pub player_id: PlayerId,
    pub election_round: u32,
    /// `Some(true)` is Ja, `Some(false)` is Nein, `None` has not been cast.
    pub vote: Option<bool>,
}

/// The counted outcome of an election round.
#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Debug)]
pub struct Tally {
    pub passed: bool,
    pub yes: usize,
    pub no: usize,
}

/// Counts the ballots of the given round. Uncast ballots count for neither side and ties fail.
pub fn tally<'a>(votes: impl IntoIterator<Item = &'a Vote>, round: u32) -> Tally {
    let (yes, no) = votes
        .into_iter()
        .filter(|v| v.election_round == round)
        .fold((0, 0), |(yes, no), v| match v.vote {
            Some(true) => (yes + 1, no),
            Some(false) => (yes, no + 1),
            None => (yes, no),
        });
    Tally { passed: yes > no, yes, no }
}

/// Records a ballot, replacing any earlier ballot by the same player in the same round.
pub fn upsert(votes: &mut Vec<Vote>, player_id: &str, round: u32, vote: bool) {
    match votes
        .iter_mut()
        .find(|v| v.player_id == player_id && v.election_round == round)
    {
        Some(existing) => existing.vote = Some(vote),
        None => votes.push(Vote {
            player_id: player_id.to_string(),
            election_round: round,
            vote: Some(vote),
        }),
    }
}

/// Returns whether the given player has cast a ballot in the given round.
pub fn has_cast(votes: &[Vote], player_id: &str, round: u32) -> bool {
    votes
        .iter()
        .any(|v| v.player_id == player_id && v.election_round == round && v.vote.is_some())
}
