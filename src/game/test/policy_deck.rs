//! Policy deck construction, drawing and reshuffling.

use super::super::deck::{Deck, FASCIST_CARDS, LIBERAL_CARDS, TOTAL_CARDS};
use super::super::party::Party::{self, *};
use super::super::shuffle::Shuffler;
use super::super::update::Event;
use super::super::Phase;
use super::test_utils::*;
use crate::error::GameError;

#[test]
fn test_new_deck_composition() {
    for seed in 0..10 {
        let deck = Deck::new(&mut Shuffler::new(Some(seed)));
        assert_eq!(deck.count(), TOTAL_CARDS);
        assert_eq!(deck.discard_count(), 0);
        assert_eq!(deck.draw_pile().iter().filter(|c| **c == Liberal).count(), LIBERAL_CARDS);
        assert_eq!(deck.draw_pile().iter().filter(|c| **c == Fascist).count(), FASCIST_CARDS);
    }
}

#[test]
fn test_draw_takes_from_the_top() {
    let mut deck = Deck::from_piles(vec![Liberal, Fascist, Fascist, Liberal], vec![]);
    let cards = deck.draw(3, &mut Shuffler::Fixed).unwrap();
    assert_eq!(cards, vec![Liberal, Fascist, Fascist]);
    assert_eq!(deck.draw_pile(), &[Liberal]);
}

#[test]
fn test_draw_reshuffles_discards_when_short() {
    let mut deck = Deck::from_piles(vec![Liberal], vec![Fascist, Fascist, Fascist]);
    let cards = deck.draw(3, &mut Shuffler::Fixed).unwrap();
    assert_eq!(cards, vec![Liberal, Fascist, Fascist]);
    assert_eq!(deck.count(), 1);
    assert_eq!(deck.discard_count(), 0);
}

#[test]
fn test_reshuffle_is_a_no_op_with_enough_cards() {
    let mut deck = Deck::from_piles(vec![Liberal, Liberal, Fascist], vec![Fascist; 5]);
    assert!(!deck.reshuffle_if_below(3, &mut Shuffler::new(Some(3))));
    assert_eq!(deck.draw_pile(), &[Liberal, Liberal, Fascist]);
    assert_eq!(deck.discard_count(), 5);

    deck.draw(3, &mut Shuffler::Fixed).unwrap();
    assert_eq!(deck.discard_count(), 5);
}

#[test]
fn test_draw_fails_when_every_card_is_out() {
    let mut deck = Deck::from_piles(vec![Liberal], vec![Fascist]);
    assert_eq!(deck.draw(3, &mut Shuffler::Fixed), Err(GameError::InsufficientCards(3)));
}

#[test]
fn test_peek_leaves_the_deck_alone() {
    let deck = Deck::from_piles(vec![Fascist, Liberal, Fascist, Liberal], vec![]);
    assert_eq!(deck.peek(3), &[Fascist, Liberal, Fascist]);
    assert_eq!(deck.count(), 4);
    assert_eq!(Deck::from_piles(vec![Liberal], vec![]).peek(3), &[Liberal]);
}

#[test]
fn test_cards_are_conserved_through_play() {
    let mut game = create_game(5);
    assert_eq!(card_count(&game), TOTAL_CARDS);

    for chancellor in [1, 2, 3] {
        run_election(&mut game, chancellor, true);
        assert_eq!(card_count(&game), TOTAL_CARDS);
        let president = president(&game);
        player_act(&mut game, president, super::super::action::Action::PresidentDiscard { index: 0 }).unwrap();
        assert_eq!(card_count(&game), TOTAL_CARDS);
        player_act(&mut game, chancellor, super::super::action::Action::ChancellorEnact { index: 0 }).unwrap();
        assert_eq!(card_count(&game), TOTAL_CARDS);
        if game.game.phase != Phase::Nomination {
            break;
        }
    }

    // Two liberal governments, then a fascist one that grants no power on a small board.
    assert_eq!(game.game.board.liberal_cards, 2);
    assert_eq!(game.game.board.fascist_cards, 1);
    assert_eq!(game.game.deck.count(), TOTAL_CARDS - 9);
    assert_eq!(game.game.deck.discard_count(), 6);
}

#[test]
fn test_legislative_session_reports_reshuffle() {
    let mut game = create_game(5);
    let discards: Vec<Party> = vec![Fascist; 10];
    game.game.deck = Deck::from_piles(vec![Liberal, Liberal], discards);

    let transition = run_election(&mut game, 1, true);
    assert!(transition.events.contains(&Event::DeckReshuffled));
    assert_eq!(game.game.drawn_policies, Some([Liberal, Liberal, Fascist]));
    assert_eq!(game.game.deck.count(), 9);
    assert_eq!(game.game.deck.discard_count(), 0);
}
