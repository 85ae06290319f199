use super::{
    action::Actor,
    eligible::is_eligible_chancellor,
    player::PlayerId,
    update::{Event, Outcome},
    votes::{has_cast, tally, upsert},
    Phase, Snapshot, WinCondition,
};
use crate::error::GameError;

/// The number of consecutive failed governments that throws the country into chaos.
pub const CHAOS_THRESHOLD: usize = 3;

impl Snapshot {
    /// Called when the president nominates a chancellor.
    pub(super) fn nominate_chancellor(
        &mut self,
        actor: &Actor,
        candidate: &PlayerId,
        out: &mut Outcome,
    ) -> Result<(), GameError> {
        self.check_phase(Phase::Nomination)?;
        let president = self.check_president(actor)?;
        if !is_eligible_chancellor(&self.game, &self.players, candidate) {
            return Err(GameError::InvalidTarget);
        }
        self.game.chancellor_id = Some(candidate.clone());
        self.game.phase = Phase::Voting;
        out.push(Event::ChancellorNominated {
            president,
            chancellor: candidate.clone(),
        });
        Ok(())
    }

    /// Called when a player casts or changes their vote.
    ///
    /// The ballot closes as soon as every living seated player has voted.
    pub(super) fn cast_vote(&mut self, actor: &Actor, vote: bool, out: &mut Outcome) -> Result<(), GameError> {
        self.check_phase(Phase::Voting)?;
        let player = self.acting_player(actor)?;
        if !player.is_active() {
            return Err(GameError::Unauthorized);
        }
        let player_id = player.id.clone();
        let round = self.game.election_round;

        upsert(&mut self.votes, &player_id, round, vote);
        out.push(Event::VoteCast { player: player_id });

        let all_voted = self
            .players
            .iter()
            .filter(|p| p.is_active())
            .all(|p| has_cast(&self.votes, &p.id, round));
        if all_voted {
            self.game.phase = Phase::VotingResult;
            out.push(Event::VotingComplete);
        }
        Ok(())
    }

    /// Counts the ballots of the current round and forms or rejects the government.
    pub(super) fn resolve_election(&mut self, actor: &Actor, out: &mut Outcome) -> Result<(), GameError> {
        self.check_phase(Phase::VotingResult)?;
        if let Actor::Player(_) = actor {
            if !self.acting_player(actor)?.is_active() {
                return Err(GameError::Unauthorized);
            }
        }

        let result = tally(&self.votes, self.game.election_round);
        out.push(Event::ElectionResolved { tally: result });

        if !result.passed {
            return self.fail_government(out);
        }

        let chancellor = self.chancellor().ok_or(GameError::PlayerNotFound)?;
        let (chancellor_id, is_hitler) = (chancellor.id.clone(), chancellor.is_hitler());
        if is_hitler && self.game.board.hitler_chancellor_wins() {
            self.end_game(WinCondition::HitlerChancellor, out);
            return Ok(());
        }
        let president_id = self.president().map(|p| p.id.clone());

        self.game.previous_president_id = president_id;
        self.game.previous_chancellor_id = Some(chancellor_id);
        self.start_legislative_session(out)
    }

    /// Advances the election tracker after a rejected or vetoed government.
    pub(super) fn fail_government(&mut self, out: &mut Outcome) -> Result<(), GameError> {
        self.game.election_tracker += 1;
        out.push(Event::ElectionFailed {
            election_tracker: self.game.election_tracker,
        });
        if self.game.election_tracker >= CHAOS_THRESHOLD {
            self.chaos(out)
        } else {
            self.start_next_round(out)
        }
    }

    /// Enacts the top policy of the deck and forgets the term limits.
    fn chaos(&mut self, out: &mut Outcome) -> Result<(), GameError> {
        let card = self.draw(1, out)?[0];
        self.reshuffle_if_below(3, out);

        self.game.previous_president_id = None;
        self.game.previous_chancellor_id = None;
        self.game.chancellor_id = None;
        out.push(Event::Chaos { policy: card });
        self.enact_policy(card, true, out)
    }
}
