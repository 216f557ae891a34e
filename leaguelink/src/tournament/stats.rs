//! Per-user win/loss aggregation across the tournaments of a channel.

use super::models::Tournament;
use crate::auth::UserId;
use serde::Serialize;
use std::collections::HashMap;

/// Aggregated record of one user inside a channel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserStats {
    pub user_id: UserId,
    pub username: String,
    pub total_tournaments: u32,
    pub wins: u32,
    pub losses: u32,
    pub win_rate: f64,
}

/// `wins / total`, or 0 when the user has not played
pub fn win_rate(wins: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        f64::from(wins) / f64::from(total)
    }
}

/// Aggregate stats for every registered (non-guest) participant.
///
/// A tournament counts as a win when its `winner` is the user; every other
/// tournament the user entered counts as a loss. Results are ordered by wins,
/// then tournaments played (both descending), then username.
pub fn compute_user_stats<'a, I>(tournaments: I) -> Vec<UserStats>
where
    I: IntoIterator<Item = &'a Tournament>,
{
    let mut by_user: HashMap<UserId, UserStats> = HashMap::new();

    for tournament in tournaments {
        for participant in &tournament.participants {
            let Some(user_id) = participant.user_id else {
                continue;
            };
            let entry = by_user.entry(user_id).or_insert_with(|| UserStats {
                user_id,
                username: participant.username.clone(),
                total_tournaments: 0,
                wins: 0,
                losses: 0,
                win_rate: 0.0,
            });
            entry.total_tournaments += 1;
            if tournament.winner == Some(user_id) {
                entry.wins += 1;
            }
        }
    }

    let mut stats: Vec<UserStats> = by_user
        .into_values()
        .map(|mut s| {
            s.losses = s.total_tournaments - s.wins;
            s.win_rate = win_rate(s.wins, s.total_tournaments);
            s
        })
        .collect();

    stats.sort_by(|a, b| {
        b.wins
            .cmp(&a.wins)
            .then(b.total_tournaments.cmp(&a.total_tournaments))
            .then_with(|| a.username.cmp(&b.username))
    });
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tournament::{
        CreateTournamentRequest, Participant, TournamentFormat, TournamentStatus,
    };
    use chrono::Utc;

    fn finished(players: &[(UserId, &str)], winner: Option<UserId>) -> Tournament {
        let mut t = Tournament::new(
            1,
            CreateTournamentRequest {
                channel_id: 1,
                name: "Cup".to_string(),
                description: String::new(),
                format: TournamentFormat::SingleElimination,
                start_date: Utc::now(),
                max_participants: 16,
            },
        )
        .unwrap();
        for (id, name) in players {
            t.add_participant(Participant::user(*id, name.to_string()))
                .unwrap();
        }
        t.add_participant(Participant::guest("Walk-in".to_string()))
            .unwrap();
        t.transition(TournamentStatus::Completed, winner).unwrap();
        t
    }

    #[test]
    fn test_win_rate_zero_denominator() {
        assert_eq!(win_rate(0, 0), 0.0);
        assert_eq!(win_rate(1, 4), 0.25);
    }

    #[test]
    fn test_aggregates_across_tournaments() {
        let tournaments = vec![
            finished(&[(1, "ana"), (2, "ben")], Some(1)),
            finished(&[(1, "ana"), (2, "ben"), (3, "cy")], Some(2)),
            finished(&[(1, "ana"), (3, "cy")], Some(1)),
            finished(&[(2, "ben")], None),
        ];

        let stats = compute_user_stats(&tournaments);
        assert_eq!(stats.len(), 3, "guests are not counted");

        assert_eq!(stats[0].username, "ana");
        assert_eq!(stats[0].total_tournaments, 3);
        assert_eq!(stats[0].wins, 2);
        assert_eq!(stats[0].losses, 1);
        assert!((stats[0].win_rate - 2.0 / 3.0).abs() < f64::EPSILON);

        assert_eq!(stats[1].username, "ben");
        assert_eq!(stats[1].wins, 1);
        assert_eq!(stats[1].losses, 2);

        assert_eq!(stats[2].username, "cy");
        assert_eq!(stats[2].wins, 0);
        assert_eq!(stats[2].win_rate, 0.0);
    }

    #[test]
    fn test_empty_channel() {
        assert!(compute_user_stats(&Vec::<Tournament>::new()).is_empty());
    }
}
