use super::party::Party;
use super::shuffle::Shuffler;
use crate::error::GameError;
use serde::{Deserialize, Serialize};
use std::iter::repeat;

pub const LIBERAL_CARDS: usize = 6;
pub const FASCIST_CARDS: usize = 11;
#[cfg(test)]
pub const TOTAL_CARDS: usize = LIBERAL_CARDS + FASCIST_CARDS;

/// The policy draw pile and discard pile.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug, Default)]
pub struct Deck {
    /// The current draw pile; the first element is the top of the pile.
    draw_pile: Vec<Party>,
    /// Discarded cards; their order is irrelevant.
    discard_pile: Vec<Party>,
}

impl Deck {
    /// Creates the full shuffled deck of 6 liberal and 11 fascist policies.
    pub fn new(shuffler: &mut Shuffler) -> Self {
        let cards = repeat(Party::Liberal)
            .take(LIBERAL_CARDS)
            .chain(repeat(Party::Fascist).take(FASCIST_CARDS))
            .collect();
        Self {
            draw_pile: shuffler.shuffled(cards),
            discard_pile: vec![],
        }
    }

    /// Creates a deck from explicit piles, top of the draw pile first.
    #[cfg(test)]
    pub fn from_piles(draw_pile: Vec<Party>, discard_pile: Vec<Party>) -> Self {
        Self { draw_pile, discard_pile }
    }

    /// Shuffles the discard pile into the draw pile, if fewer than `minimum` cards remain.
    ///
    /// Returns whether a reshuffle happened.
    pub fn reshuffle_if_below(&mut self, minimum: usize, shuffler: &mut Shuffler) -> bool {
        if self.draw_pile.len() >= minimum {
            return false;
        }
        self.draw_pile.append(&mut self.discard_pile);
        shuffler.shuffle(&mut self.draw_pile);
        true
    }

    /// Draws the top `n` cards, reshuffling the discard pile in first if needed.
    pub fn draw(&mut self, n: usize, shuffler: &mut Shuffler) -> Result<Vec<Party>, GameError> {
        self.reshuffle_if_below(n, shuffler);
        if self.draw_pile.len() < n {
            return Err(GameError::InsufficientCards(n));
        }
        Ok(self.draw_pile.drain(..n).collect())
    }

    pub fn discard(&mut self, card: Party) {
        self.discard_pile.push(card);
    }

    /// Looks at up to `n` cards from the top of the draw pile without removing them.
    pub fn peek(&self, n: usize) -> &[Party] {
        &self.draw_pile[..n.min(self.draw_pile.len())]
    }

    /// The number of cards in the draw pile.
    pub fn count(&self) -> usize {
        self.draw_pile.len()
    }

    /// The number of cards in the discard pile.
    pub fn discard_count(&self) -> usize {
        self.discard_pile.len()
    }

    #[cfg(test)]
    pub fn draw_pile(&self) -> &[Party] {
        &self.draw_pile
    }
}
