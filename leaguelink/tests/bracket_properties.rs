//! Property-based tests for match score progression.
//!
//! A match must be completed exactly when one team has reached
//! `ceil(best_of / 2)` wins, no matter the order in which games are recorded.

use leaguelink::bracket::{
    BestOf, Match, MatchDraft, MatchError, MatchStatus, Player, TeamSide, derive_status,
};
use proptest::prelude::*;

// Odd best-of values up to 15
fn best_of_strategy() -> impl Strategy<Value = BestOf> {
    (0u32..8).prop_map(|n| BestOf::new(2 * n + 1).unwrap())
}

fn side_strategy() -> impl Strategy<Value = TeamSide> {
    prop_oneof![Just(TeamSide::Team1), Just(TeamSide::Team2)]
}

fn pending_match(best_of: BestOf) -> Match {
    Match::new(MatchDraft {
        tournament_id: 1,
        round: 1,
        match_number: 1,
        position: 1,
        best_of,
        team1: vec![Player::new("Red")],
        team2: vec![Player::new("Blue")],
        next_match: None,
    })
    .unwrap()
}

proptest! {
    #[test]
    fn test_even_best_of_rejected(n in 0u32..50) {
        let result = BestOf::new(2 * n);
        prop_assert!(matches!(result, Err(MatchError::InvalidBestOf(_))));
    }

    #[test]
    fn test_status_follows_majority(best_of in best_of_strategy(), s1 in 0u32..10, s2 in 0u32..10) {
        let status = derive_status(best_of, s1, s2);
        let needed = best_of.wins_needed();

        prop_assert_eq!(status == MatchStatus::Completed, s1.max(s2) >= needed);
        if s1 == 0 && s2 == 0 {
            prop_assert_eq!(status, MatchStatus::Pending);
        }
    }

    #[test]
    fn test_recorded_games_complete_match_once(
        best_of in best_of_strategy(),
        winners in prop::collection::vec(side_strategy(), 1..20),
    ) {
        let mut game = pending_match(best_of);
        let needed = best_of.wins_needed();

        for (i, winner) in winners.iter().enumerate() {
            let game_number = i as u32 + 1;
            let was_completed = game.is_completed();
            let result = game.record_game(game_number, *winner);

            if was_completed {
                prop_assert!(matches!(result, Err(MatchError::AlreadyCompleted(_))));
                break;
            }
            prop_assert!(result.is_ok());
        }

        // At most one side can ever reach the majority
        prop_assert!(!(game.team1.score >= needed && game.team2.score >= needed));
        prop_assert!(game.team1.score.max(game.team2.score) <= needed);
        prop_assert_eq!(
            game.is_completed(),
            game.team1.score == needed || game.team2.score == needed
        );
        prop_assert_eq!(game.winner.is_some(), game.is_completed());
        prop_assert!(game.games.len() as u32 <= best_of.get());
    }
}
