use super::{
    action::Actor,
    player::{Player, PlayerId},
    update::{Event, Outcome, PrivateResult},
    Phase, Snapshot, WinCondition,
};
use crate::error::GameError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Debug)]
#[serde(rename_all = "snake_case")]
pub enum ExecutiveAction {
    /// The president must investigate a player's loyalty.
    InvestigateLoyalty,
    /// The president must call a special election.
    SpecialElection,
    /// The president must peek at the top three cards on the deck.
    PolicyPeek,
    /// The president must execute a player.
    Execution,
}

impl fmt::Display for ExecutiveAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExecutiveAction::InvestigateLoyalty => "investigate_loyalty",
            ExecutiveAction::SpecialElection => "special_election",
            ExecutiveAction::PolicyPeek => "policy_peek",
            ExecutiveAction::Execution => "execution",
        })
    }
}

impl Snapshot {
    /// Gets the players the president may choose for the given power.
    pub fn executive_targets(&self, action: ExecutiveAction) -> Vec<&Player> {
        let president = self.game.president_index;
        self.players
            .iter()
            .filter(|p| p.is_active() && p.seat != Some(president))
            .filter(|p| match action {
                ExecutiveAction::InvestigateLoyalty => !self.game.investigated_players.contains(&p.id),
                ExecutiveAction::SpecialElection | ExecutiveAction::Execution => true,
                ExecutiveAction::PolicyPeek => false,
            })
            .collect()
    }

    /// Checks that `action` is the pending power and that `actor` holds the presidency.
    fn begin_executive_action(&self, actor: &Actor, action: ExecutiveAction) -> Result<PlayerId, GameError> {
        self.check_phase(Phase::ExecutiveAction)?;
        let president = self.check_president(actor)?;
        if self.game.pending_executive_action != Some(action) {
            return Err(self.illegal_phase());
        }
        Ok(president)
    }

    fn check_target(&self, action: ExecutiveAction, target: &str) -> Result<(), GameError> {
        if self.executive_targets(action).iter().any(|p| p.id == target) {
            Ok(())
        } else {
            Err(GameError::InvalidTarget)
        }
    }

    /// Reveals a player's party to the president.
    pub(super) fn investigate_loyalty(
        &mut self,
        actor: &Actor,
        target: &PlayerId,
        out: &mut Outcome,
    ) -> Result<(), GameError> {
        self.begin_executive_action(actor, ExecutiveAction::InvestigateLoyalty)?;
        self.check_target(ExecutiveAction::InvestigateLoyalty, target)?;

        let party = self
            .player(target)?
            .party()
            .ok_or(GameError::Validation("the target has not been dealt a role"))?;
        self.game.investigated_players.push(target.clone());
        out.private = Some(PrivateResult::Investigation {
            target: target.clone(),
            party,
        });
        out.push(Event::PlayerInvestigated { target: target.clone() });
        self.start_next_round(out)
    }

    /// Hands the next presidency to the chosen player.
    ///
    /// The calling president's seat is remembered so the rotation resumes after it.
    pub(super) fn special_election(
        &mut self,
        actor: &Actor,
        target: &PlayerId,
        out: &mut Outcome,
    ) -> Result<(), GameError> {
        self.begin_executive_action(actor, ExecutiveAction::SpecialElection)?;
        self.check_target(ExecutiveAction::SpecialElection, target)?;

        let seat = self.player(target)?.seat.ok_or(GameError::InvalidTarget)?;
        let president = self.game.president_index;
        self.game.special_election_return_index.get_or_insert(president);
        self.game.president_index = seat;
        out.push(Event::SpecialElectionCalled { president: seat });
        self.open_nomination(out);
        Ok(())
    }

    /// Shows the president the top three policies without removing them.
    pub(super) fn policy_peek(&mut self, actor: &Actor, out: &mut Outcome) -> Result<(), GameError> {
        self.begin_executive_action(actor, ExecutiveAction::PolicyPeek)?;

        self.reshuffle_if_below(3, out);
        out.private = Some(PrivateResult::PolicyPeek {
            cards: self.game.deck.peek(3).to_vec(),
        });
        out.push(Event::PolicyPeeked);
        self.start_next_round(out)
    }

    /// Kills the chosen player; executing Hitler wins the game for the liberals.
    pub(super) fn execute(&mut self, actor: &Actor, target: &PlayerId, out: &mut Outcome) -> Result<(), GameError> {
        self.begin_executive_action(actor, ExecutiveAction::Execution)?;
        self.check_target(ExecutiveAction::Execution, target)?;

        let player = self.player_mut(target)?;
        player.alive = false;
        let was_hitler = player.is_hitler();
        out.push(Event::PlayerExecuted { target: target.clone() });

        if was_hitler {
            self.end_game(WinCondition::HitlerExecuted, out);
            return Ok(());
        }
        self.start_next_round(out)
    }
}
