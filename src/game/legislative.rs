use super::{
    action::Actor,
    party::Party,
    update::{Event, Outcome},
    Phase, Snapshot,
};
use crate::error::GameError;

/// Removes the card at `index` from the president's hand, returning it and the two cards passed on.
pub fn president_discard(cards: [Party; 3], index: usize) -> Result<(Party, [Party; 2]), GameError> {
    let remaining = match index {
        0 => [cards[1], cards[2]],
        1 => [cards[0], cards[2]],
        2 => [cards[0], cards[1]],
        _ => return Err(GameError::Validation("discard index must be 0, 1 or 2")),
    };
    Ok((cards[index], remaining))
}

/// Picks the card at `index` from the chancellor's hand, returning it and the discarded card.
pub fn chancellor_enact(cards: [Party; 2], index: usize) -> Result<(Party, Party), GameError> {
    match index {
        0 => Ok((cards[0], cards[1])),
        1 => Ok((cards[1], cards[0])),
        _ => Err(GameError::Validation("enact index must be 0 or 1")),
    }
}

impl Snapshot {
    /// Draws the president's three policies.
    pub(super) fn start_legislative_session(&mut self, out: &mut Outcome) -> Result<(), GameError> {
        let cards = self.draw(3, out)?;
        self.game.drawn_policies = Some([cards[0], cards[1], cards[2]]);
        self.game.chancellor_policies = None;
        self.game.veto_requested = false;
        self.game.phase = Phase::LegislativePresident;
        out.push(Event::LegislativeSessionStarted);
        Ok(())
    }

    /// Called when the president discards a policy from their hand.
    pub(super) fn president_discard(&mut self, actor: &Actor, index: usize, out: &mut Outcome) -> Result<(), GameError> {
        self.check_phase(Phase::LegislativePresident)?;
        self.check_president(actor)?;
        let cards = self
            .game
            .drawn_policies
            .ok_or(GameError::Validation("the president holds no policies"))?;
        let (discarded, remaining) = president_discard(cards, index)?;

        self.game.deck.discard(discarded);
        self.game.drawn_policies = None;
        self.game.chancellor_policies = Some(remaining);
        self.game.phase = Phase::LegislativeChancellor;
        out.push(Event::PresidentDiscarded);
        Ok(())
    }

    /// Called when the chancellor enacts one of the two policies they were handed.
    pub(super) fn chancellor_enact(&mut self, actor: &Actor, index: usize, out: &mut Outcome) -> Result<(), GameError> {
        self.check_phase(Phase::LegislativeChancellor)?;
        self.check_chancellor(actor)?;
        let cards = self
            .game
            .chancellor_policies
            .ok_or(GameError::Validation("the chancellor holds no policies"))?;
        let (enacted, discarded) = chancellor_enact(cards, index)?;

        self.game.deck.discard(discarded);
        self.enact_policy(enacted, false, out)
    }

    /// Called when the chancellor proposes to discard both policies.
    pub(super) fn request_veto(&mut self, actor: &Actor, out: &mut Outcome) -> Result<(), GameError> {
        self.check_phase(Phase::LegislativeChancellor)?;
        self.check_chancellor(actor)?;
        if !self.game.veto_unlocked {
            return Err(GameError::Validation("veto power is not unlocked"));
        }
        if self.game.veto_requested {
            return Err(GameError::Validation("a veto was already requested this session"));
        }
        self.game.veto_requested = true;
        self.game.phase = Phase::VetoRequested;
        out.push(Event::VetoRequested);
        Ok(())
    }

    /// Called when the president accepts or rejects a proposed veto.
    ///
    /// A rejected veto leaves the request flag set, so the chancellor must now enact.
    pub(super) fn respond_to_veto(&mut self, actor: &Actor, accept: bool, out: &mut Outcome) -> Result<(), GameError> {
        self.check_phase(Phase::VetoRequested)?;
        self.check_president(actor)?;

        if !accept {
            self.game.phase = Phase::LegislativeChancellor;
            out.push(Event::VetoRejected);
            return Ok(());
        }

        let cards = self
            .game
            .chancellor_policies
            .take()
            .ok_or(GameError::Validation("the chancellor holds no policies"))?;
        for card in cards {
            self.game.deck.discard(card);
        }
        self.game.veto_requested = false;
        out.push(Event::VetoAccepted);
        self.fail_government(out)
    }
}
