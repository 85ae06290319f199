//! Nominations, voting and the presidential rotation.

use super::super::action::{Action, Actor};
use super::super::eligible::{eligible_chancellors, next_president};
use super::super::update::Event;
use super::super::votes::{tally, upsert, Vote};
use super::super::Phase;
use super::test_utils::*;
use crate::error::GameError;
use chrono::Utc;

fn nominate(game: &mut super::super::Snapshot, chancellor: usize) -> Result<(), GameError> {
    let president = president(game);
    player_act(
        game,
        president,
        Action::NominateChancellor {
            candidate: player_id(chancellor),
        },
    )
    .map(|_| ())
}

fn eligible_seats(game: &super::super::Snapshot) -> Vec<usize> {
    eligible_chancellors(&game.game, &game.players)
        .into_iter()
        .filter_map(|p| p.seat)
        .collect()
}

#[test]
fn test_nomination_opens_the_ballot() {
    let mut game = create_game(5);
    let transition = player_act(
        &mut game,
        0,
        Action::NominateChancellor {
            candidate: player_id(2),
        },
    )
    .unwrap();

    assert_eq!(game.game.phase, Phase::Voting);
    assert_eq!(game.game.chancellor_id, Some(player_id(2)));
    assert_eq!(
        transition.events,
        vec![Event::ChancellorNominated {
            president: player_id(0),
            chancellor: player_id(2),
        }]
    );
}

#[test]
fn test_only_the_president_nominates() {
    let mut game = create_game(5);
    let before = fingerprint(&game);
    assert_eq!(
        player_act(
            &mut game,
            1,
            Action::NominateChancellor {
                candidate: player_id(2)
            }
        )
        .unwrap_err(),
        GameError::Unauthorized
    );
    assert_eq!(fingerprint(&game), before);
}

#[test]
fn test_president_cannot_nominate_themselves() {
    let mut game = create_game(5);
    assert_eq!(nominate(&mut game, 0), Err(GameError::InvalidTarget));
    assert_eq!(game.game.phase, Phase::Nomination);
}

#[test]
fn test_unknown_and_dead_candidates_are_rejected() {
    let mut game = create_game(6);
    kill(&mut game, 3);
    assert_eq!(nominate(&mut game, 3), Err(GameError::InvalidTarget));
    assert_eq!(nominate(&mut game, 9), Err(GameError::InvalidTarget));
}

#[test]
fn test_term_limits_with_more_than_five_alive() {
    let mut game = create_game(7);
    game.game.previous_president_id = Some(player_id(3));
    game.game.previous_chancellor_id = Some(player_id(4));

    assert_eq!(eligible_seats(&game), vec![1, 2, 5, 6]);
    assert_eq!(nominate(&mut game, 3), Err(GameError::InvalidTarget));
    assert_eq!(nominate(&mut game, 4), Err(GameError::InvalidTarget));
}

#[test]
fn test_term_limits_with_five_alive() {
    let mut game = create_game(5);
    game.game.previous_president_id = Some(player_id(3));
    game.game.previous_chancellor_id = Some(player_id(4));

    assert_eq!(eligible_seats(&game), vec![1, 2, 3]);
    assert!(nominate(&mut game, 3).is_ok());
}

#[test]
fn test_term_limits_count_only_living_players() {
    let mut game = create_game(6);
    kill(&mut game, 5);
    game.game.previous_president_id = Some(player_id(3));
    game.game.previous_chancellor_id = Some(player_id(4));

    assert_eq!(eligible_seats(&game), vec![1, 2, 3]);
}

#[test]
fn test_ballot_closes_when_everyone_has_voted() {
    let mut game = create_game(5);
    nominate(&mut game, 1).unwrap();

    for seat in 0..4 {
        let transition = player_act(&mut game, seat, Action::CastVote { vote: true }).unwrap();
        assert_eq!(transition.events, vec![Event::VoteCast { player: player_id(seat) }]);
        assert_eq!(game.game.phase, Phase::Voting);
    }
    let transition = player_act(&mut game, 4, Action::CastVote { vote: false }).unwrap();
    assert!(transition.events.contains(&Event::VotingComplete));
    assert_eq!(game.game.phase, Phase::VotingResult);
}

#[test]
fn test_votes_may_be_changed_while_the_ballot_is_open() {
    let mut game = create_game(5);
    nominate(&mut game, 1).unwrap();

    player_act(&mut game, 2, Action::CastVote { vote: true }).unwrap();
    player_act(&mut game, 2, Action::CastVote { vote: false }).unwrap();

    let round = game.game.election_round;
    let ballots: Vec<_> = game.votes.iter().filter(|v| v.election_round == round).collect();
    assert_eq!(ballots.len(), 1);
    assert_eq!(ballots[0].vote, Some(false));
}

#[test]
fn test_dead_players_and_spectators_cannot_vote() {
    let mut game = create_game(6);
    game.join("watcher".into(), "Watcher", "watcher-session", true, Utc::now())
        .unwrap();
    kill(&mut game, 5);
    nominate(&mut game, 1).unwrap();

    assert_eq!(
        player_act(&mut game, 5, Action::CastVote { vote: true }).unwrap_err(),
        GameError::Unauthorized
    );
    assert_eq!(
        act(&mut game, Actor::Player("watcher".into()), Action::CastVote { vote: true }).unwrap_err(),
        GameError::Unauthorized
    );

    // The ballot closes without them.
    cast_all(&mut game, true);
    assert_eq!(game.game.phase, Phase::VotingResult);
}

#[test]
fn test_election_cannot_be_resolved_early() {
    let mut game = create_game(5);
    nominate(&mut game, 1).unwrap();
    player_act(&mut game, 0, Action::CastVote { vote: true }).unwrap();

    assert_eq!(
        act(&mut game, Actor::System, Action::ResolveElection).unwrap_err(),
        GameError::IllegalPhaseTransition { phase: Phase::Voting }
    );
}

#[test]
fn test_any_seated_player_may_resolve() {
    let mut game = create_game(5);
    nominate(&mut game, 1).unwrap();
    cast_all(&mut game, true);

    player_act(&mut game, 3, Action::ResolveElection).unwrap();
    assert_eq!(game.game.phase, Phase::LegislativePresident);
}

#[test]
fn test_tally_counts_only_the_current_round() {
    let mut votes: Vec<Vote> = vec![];
    upsert(&mut votes, "a", 1, true);
    upsert(&mut votes, "b", 1, true);
    upsert(&mut votes, "a", 2, false);
    upsert(&mut votes, "b", 2, true);
    upsert(&mut votes, "c", 2, false);

    let result = tally(&votes, 2);
    assert_eq!((result.yes, result.no, result.passed), (1, 2, false));
    assert!(tally(&votes, 1).passed);
}

#[test]
fn test_ties_fail() {
    let mut game = create_game(6);
    nominate(&mut game, 1).unwrap();
    for seat in 0..6 {
        player_act(&mut game, seat, Action::CastVote { vote: seat % 2 == 0 }).unwrap();
    }
    let transition = act(&mut game, Actor::System, Action::ResolveElection).unwrap();

    assert!(transition.events.contains(&Event::ElectionFailed { election_tracker: 1 }));
    assert_eq!(game.game.election_tracker, 1);
    assert_eq!(game.game.phase, Phase::Nomination);
    assert_eq!(president(&game), 1);
    assert_eq!(game.game.chancellor_id, None);
}

#[test]
fn test_failed_election_keeps_term_limits() {
    let mut game = create_game(7);
    game.game.previous_president_id = Some(player_id(5));
    game.game.previous_chancellor_id = Some(player_id(6));
    run_election(&mut game, 1, false);

    assert_eq!(game.game.previous_president_id, Some(player_id(5)));
    assert_eq!(game.game.previous_chancellor_id, Some(player_id(6)));
}

#[test]
fn test_passed_election_starts_legislative_session() {
    let mut game = create_game(5);
    game.game.election_tracker = 1;
    run_election(&mut game, 2, true);

    assert_eq!(game.game.phase, Phase::LegislativePresident);
    assert_eq!(game.game.previous_president_id, Some(player_id(0)));
    assert_eq!(game.game.previous_chancellor_id, Some(player_id(2)));
    assert!(game.game.drawn_policies.is_some());
    assert_eq!(game.game.deck.count(), 14);
    // The tracker only resets once a policy is enacted.
    assert_eq!(game.game.election_tracker, 1);
}

#[test]
fn test_election_round_advances_with_each_nomination() {
    let mut game = create_game(5);
    assert_eq!(game.game.election_round, 1);
    run_election(&mut game, 1, false);
    assert_eq!(game.game.election_round, 2);
    run_election(&mut game, 2, false);
    assert_eq!(game.game.election_round, 3);
}

#[test]
fn test_rotation_skips_the_dead_and_wraps() {
    let mut game = create_game(5);
    kill(&mut game, 1);
    run_election(&mut game, 2, false);
    assert_eq!(president(&game), 2);

    game.game.president_index = 4;
    run_election(&mut game, 2, false);
    assert_eq!(president(&game), 0);
}

#[test]
fn test_next_president_after_a_dead_seat() {
    let mut game = create_game(7);
    kill(&mut game, 3);
    kill(&mut game, 4);
    assert_eq!(next_president(3, &game.players), Ok(5));
    assert_eq!(next_president(6, &game.players), Ok(0));

    for seat in 0..7 {
        kill(&mut game, seat);
    }
    assert_eq!(next_president(0, &game.players), Err(GameError::NoAlivePlayers));
}
