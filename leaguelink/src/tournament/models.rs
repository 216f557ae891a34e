//! Tournament data models.

use super::manager::{TournamentError, TournamentResult};
use crate::auth::UserId;
use crate::bracket::MatchId;
use crate::channel::ChannelId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tournament ID type
pub type TournamentId = i64;

/// Bracket format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentFormat {
    SingleElimination,
    DoubleElimination,
    RoundRobin,
    Swiss,
}

impl TournamentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            TournamentFormat::SingleElimination => "single_elimination",
            TournamentFormat::DoubleElimination => "double_elimination",
            TournamentFormat::RoundRobin => "round_robin",
            TournamentFormat::Swiss => "swiss",
        }
    }
}

impl FromStr for TournamentFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single_elimination" => Ok(TournamentFormat::SingleElimination),
            "double_elimination" => Ok(TournamentFormat::DoubleElimination),
            "round_robin" => Ok(TournamentFormat::RoundRobin),
            "swiss" => Ok(TournamentFormat::Swiss),
            other => Err(format!("unknown tournament format '{other}'")),
        }
    }
}

/// Tournament state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    /// Accepting participants
    Pending,
    /// Matches being played
    Active,
    /// Tournament finished
    Completed,
}

impl TournamentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TournamentStatus::Pending => "pending",
            TournamentStatus::Active => "active",
            TournamentStatus::Completed => "completed",
        }
    }

    /// Status only moves forward, one step or more
    pub fn can_transition_to(&self, next: TournamentStatus) -> bool {
        (*self as u8) < (next as u8)
    }
}

impl fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TournamentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TournamentStatus::Pending),
            "active" => Ok(TournamentStatus::Active),
            "completed" => Ok(TournamentStatus::Completed),
            other => Err(format!("unknown tournament status '{other}'")),
        }
    }
}

/// Participant state within a tournament
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    Registered,
    Active,
    Eliminated,
}

/// Tournament participant entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// `None` for guests without an account
    pub user_id: Option<UserId>,
    pub username: String,
    pub is_guest: bool,
    pub status: ParticipantStatus,
}

impl Participant {
    pub fn user(user_id: UserId, username: String) -> Self {
        Self {
            user_id: Some(user_id),
            username,
            is_guest: false,
            status: ParticipantStatus::Registered,
        }
    }

    pub fn guest(name: String) -> Self {
        Self {
            user_id: None,
            username: name,
            is_guest: true,
            status: ParticipantStatus::Registered,
        }
    }
}

/// Tournament document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub description: String,
    pub channel_id: ChannelId,
    pub organizer: UserId,
    pub format: TournamentFormat,
    pub start_date: DateTime<Utc>,
    pub max_participants: u32,
    pub participants: Vec<Participant>,
    pub matches: Vec<MatchId>,
    pub status: TournamentStatus,
    pub winner: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

/// Tournament creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTournamentRequest {
    pub channel_id: ChannelId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub format: TournamentFormat,
    pub start_date: DateTime<Utc>,
    pub max_participants: u32,
}

impl Tournament {
    /// Build an unsaved tournament organized by `organizer`
    pub fn new(organizer: UserId, request: CreateTournamentRequest) -> TournamentResult<Self> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(TournamentError::Invalid("name is required".to_string()));
        }
        if request.max_participants < 2 {
            return Err(TournamentError::Invalid(
                "max_participants must be at least 2".to_string(),
            ));
        }

        Ok(Self {
            id: 0,
            name: name.to_string(),
            description: request.description,
            channel_id: request.channel_id,
            organizer,
            format: request.format,
            start_date: request.start_date,
            max_participants: request.max_participants,
            participants: Vec::new(),
            matches: Vec::new(),
            status: TournamentStatus::Pending,
            winner: None,
            created_at: Utc::now(),
        })
    }

    pub fn is_full(&self) -> bool {
        self.participants.len() >= self.max_participants as usize
    }

    pub fn has_participant(&self, user_id: UserId) -> bool {
        self.participants
            .iter()
            .any(|p| p.user_id == Some(user_id))
    }

    /// Add a participant, enforcing the capacity and uniqueness rules
    pub fn add_participant(&mut self, participant: Participant) -> TournamentResult<()> {
        if self.status != TournamentStatus::Pending {
            return Err(TournamentError::AlreadyStarted);
        }
        if participant
            .user_id
            .is_some_and(|user_id| self.has_participant(user_id))
        {
            return Err(TournamentError::AlreadyRegistered);
        }
        if participant.is_guest
            && self
                .participants
                .iter()
                .any(|p| p.is_guest && p.username.eq_ignore_ascii_case(&participant.username))
        {
            return Err(TournamentError::AlreadyRegistered);
        }
        if self.is_full() {
            return Err(TournamentError::TournamentFull);
        }

        self.participants.push(participant);
        Ok(())
    }

    /// Move to `next`, recording the winner on completion
    pub fn transition(
        &mut self,
        next: TournamentStatus,
        winner: Option<UserId>,
    ) -> TournamentResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(TournamentError::InvalidState {
                expected: next,
                actual: self.status,
            });
        }
        if let Some(winner) = winner {
            if next != TournamentStatus::Completed {
                return Err(TournamentError::Invalid(
                    "a winner can only be set when completing".to_string(),
                ));
            }
            if !self.has_participant(winner) {
                return Err(TournamentError::NotParticipant(winner));
            }
        }

        match next {
            TournamentStatus::Active => {
                for participant in &mut self.participants {
                    participant.status = ParticipantStatus::Active;
                }
            }
            TournamentStatus::Completed => {
                for participant in &mut self.participants {
                    if winner.is_some() && participant.user_id != winner {
                        participant.status = ParticipantStatus::Eliminated;
                    }
                }
                self.winner = winner;
            }
            TournamentStatus::Pending => {}
        }

        self.status = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tournament(max_participants: u32) -> Tournament {
        Tournament::new(
            1,
            CreateTournamentRequest {
                channel_id: 1,
                name: "Autumn Open".to_string(),
                description: String::new(),
                format: TournamentFormat::RoundRobin,
                start_date: Utc::now(),
                max_participants,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_format_round_trips_through_str() {
        for format in [
            TournamentFormat::SingleElimination,
            TournamentFormat::DoubleElimination,
            TournamentFormat::RoundRobin,
            TournamentFormat::Swiss,
        ] {
            assert_eq!(format.as_str().parse::<TournamentFormat>(), Ok(format));
        }
        assert!("knockout".parse::<TournamentFormat>().is_err());
    }

    #[test]
    fn test_too_few_slots_rejected() {
        let err = Tournament::new(
            1,
            CreateTournamentRequest {
                channel_id: 1,
                name: "Solo".to_string(),
                description: String::new(),
                format: TournamentFormat::Swiss,
                start_date: Utc::now(),
                max_participants: 1,
            },
        )
        .unwrap_err();
        assert!(matches!(err, TournamentError::Invalid(_)));
    }

    #[test]
    fn test_capacity_enforced() {
        let mut t = tournament(2);
        t.add_participant(Participant::user(1, "a".into())).unwrap();
        t.add_participant(Participant::guest("Guest".into())).unwrap();
        let err = t
            .add_participant(Participant::user(3, "c".into()))
            .unwrap_err();
        assert!(matches!(err, TournamentError::TournamentFull));
        assert_eq!(t.participants.len(), 2);
    }

    #[test]
    fn test_duplicate_user_rejected() {
        let mut t = tournament(4);
        t.add_participant(Participant::user(1, "a".into())).unwrap();
        let err = t
            .add_participant(Participant::user(1, "a".into()))
            .unwrap_err();
        assert!(matches!(err, TournamentError::AlreadyRegistered));
    }

    #[test]
    fn test_status_only_moves_forward() {
        let mut t = tournament(4);
        t.add_participant(Participant::user(1, "a".into())).unwrap();
        t.add_participant(Participant::user(2, "b".into())).unwrap();
        t.transition(TournamentStatus::Active, None).unwrap();
        assert!(
            t.participants
                .iter()
                .all(|p| p.status == ParticipantStatus::Active)
        );
        assert!(t.transition(TournamentStatus::Pending, None).is_err());

        t.transition(TournamentStatus::Completed, Some(2)).unwrap();
        assert_eq!(t.winner, Some(2));
        assert_eq!(t.participants[0].status, ParticipantStatus::Eliminated);
        assert_eq!(t.participants[1].status, ParticipantStatus::Active);
    }

    #[test]
    fn test_winner_must_participate() {
        let mut t = tournament(4);
        let err = t
            .transition(TournamentStatus::Completed, Some(99))
            .unwrap_err();
        assert!(matches!(err, TournamentError::NotParticipant(99)));
        assert_eq!(t.status, TournamentStatus::Pending);
    }
}
