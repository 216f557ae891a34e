//! Match data models and score progression.
//!
//! A match moves `pending → in_progress → completed` purely from its scores:
//! it is completed as soon as either team reaches `ceil(best_of / 2)` game
//! wins, and at most one team can ever get there.

use super::errors::{MatchError, MatchResult};
use crate::auth::UserId;
use crate::tournament::TournamentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Match ID type
pub type MatchId = i64;

/// Match state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Pending,
    InProgress,
    Completed,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Pending => "pending",
            MatchStatus::InProgress => "in_progress",
            MatchStatus::Completed => "completed",
        }
    }
}

impl FromStr for MatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(MatchStatus::Pending),
            "in_progress" => Ok(MatchStatus::InProgress),
            "completed" => Ok(MatchStatus::Completed),
            other => Err(format!("unknown match status '{other}'")),
        }
    }
}

/// One of the two teams of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamSide {
    Team1,
    Team2,
}

impl TeamSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamSide::Team1 => "team1",
            TeamSide::Team2 => "team2",
        }
    }

    /// The bracket slot a winner from `position` fills in the next match:
    /// odd positions feed team1, even positions feed team2
    pub fn for_position(position: u32) -> Self {
        if position % 2 == 1 {
            TeamSide::Team1
        } else {
            TeamSide::Team2
        }
    }
}

impl fmt::Display for TeamSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TeamSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "team1" => Ok(TeamSide::Team1),
            "team2" => Ok(TeamSide::Team2),
            other => Err(format!("unknown team '{other}'")),
        }
    }
}

/// Odd number of games in a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct BestOf(u32);

impl BestOf {
    /// Fails unless `games` is odd (which also rules out 0)
    pub fn new(games: u32) -> MatchResult<Self> {
        if games % 2 == 0 {
            return Err(MatchError::InvalidBestOf(games));
        }
        Ok(Self(games))
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    /// Game wins needed to take the match: `ceil(best_of / 2)`
    pub fn wins_needed(&self) -> u32 {
        self.0.div_ceil(2)
    }
}

impl TryFrom<u32> for BestOf {
    type Error = MatchError;

    fn try_from(games: u32) -> Result<Self, Self::Error> {
        Self::new(games)
    }
}

impl From<BestOf> for u32 {
    fn from(best_of: BestOf) -> Self {
        best_of.0
    }
}

/// Name of the stand-in player in a bracket slot nobody has reached yet
pub const PLACEHOLDER_NAME: &str = "TBD";

/// A player listed on a team; `user_id` is empty for guests and placeholders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    #[serde(default)]
    pub user_id: Option<UserId>,
    pub name: String,
}

impl Player {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            user_id: None,
            name: name.into(),
        }
    }

    pub fn user(user_id: UserId, name: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id),
            name: name.into(),
        }
    }
}

/// Team lineup and game wins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub players: Vec<Player>,
    pub score: u32,
}

impl Team {
    pub fn new(players: Vec<Player>) -> Self {
        Self { players, score: 0 }
    }
}

/// Outcome of one game inside a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub game_number: u32,
    pub winner: TeamSide,
}

/// Status implied by a pair of scores
pub fn derive_status(best_of: BestOf, team1_score: u32, team2_score: u32) -> MatchStatus {
    if team1_score.max(team2_score) >= best_of.wins_needed() {
        MatchStatus::Completed
    } else if team1_score == 0 && team2_score == 0 {
        MatchStatus::Pending
    } else {
        MatchStatus::InProgress
    }
}

/// Fields needed to build a match
#[derive(Debug, Clone)]
pub struct MatchDraft {
    pub tournament_id: TournamentId,
    pub round: u32,
    pub match_number: u32,
    pub position: u32,
    pub best_of: BestOf,
    pub team1: Vec<Player>,
    pub team2: Vec<Player>,
    pub next_match: Option<MatchId>,
}

/// Match document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    pub round: u32,
    pub match_number: u32,
    /// Bracket slot within the round
    pub position: u32,
    pub status: MatchStatus,
    pub best_of: BestOf,
    pub team1: Team,
    pub team2: Team,
    pub games: Vec<GameResult>,
    pub winner: Option<TeamSide>,
    pub next_match: Option<MatchId>,
    pub stats: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Match {
    /// Build an unsaved, pending match
    pub fn new(draft: MatchDraft) -> MatchResult<Self> {
        if draft.round == 0 {
            return Err(MatchError::Invalid("round must be at least 1".to_string()));
        }
        if draft.match_number == 0 {
            return Err(MatchError::Invalid(
                "match_number must be at least 1".to_string(),
            ));
        }
        if draft.position == 0 {
            return Err(MatchError::Invalid("position must be at least 1".to_string()));
        }
        validate_lineup(TeamSide::Team1, &draft.team1)?;
        validate_lineup(TeamSide::Team2, &draft.team2)?;

        let now = Utc::now();
        Ok(Self {
            id: 0,
            tournament_id: draft.tournament_id,
            round: draft.round,
            match_number: draft.match_number,
            position: draft.position,
            status: MatchStatus::Pending,
            best_of: draft.best_of,
            team1: Team::new(draft.team1),
            team2: Team::new(draft.team2),
            games: Vec::new(),
            winner: None,
            next_match: draft.next_match,
            stats: Map::new(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn team(&self, side: TeamSide) -> &Team {
        match side {
            TeamSide::Team1 => &self.team1,
            TeamSide::Team2 => &self.team2,
        }
    }

    fn team_mut(&mut self, side: TeamSide) -> &mut Team {
        match side {
            TeamSide::Team1 => &mut self.team1,
            TeamSide::Team2 => &mut self.team2,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed
    }

    /// Players of the winning team, once there is one
    pub fn winning_players(&self) -> Option<&[Player]> {
        self.winner.map(|side| self.team(side).players.as_slice())
    }

    /// Record the winner of one game and re-derive the status
    pub fn record_game(&mut self, game_number: u32, winner: TeamSide) -> MatchResult<()> {
        if self.is_completed() {
            return Err(MatchError::AlreadyCompleted(self.id));
        }
        if game_number == 0 || game_number > self.best_of.get() {
            return Err(MatchError::Invalid(format!(
                "game_number must be between 1 and {}",
                self.best_of.get()
            )));
        }
        if self.games.iter().any(|g| g.game_number == game_number) {
            return Err(MatchError::DuplicateGame(game_number));
        }

        self.games.push(GameResult {
            game_number,
            winner,
        });
        self.team_mut(winner).score += 1;
        self.refresh();
        Ok(())
    }

    /// Overwrite both scores.
    ///
    /// Recorded games are discarded since they no longer explain the score.
    pub fn set_score(&mut self, team1_score: u32, team2_score: u32) -> MatchResult<()> {
        let needed = self.best_of.wins_needed();
        let impossible = team1_score > needed
            || team2_score > needed
            || (team1_score == needed && team2_score == needed);
        if impossible {
            return Err(MatchError::ScoreOutOfRange {
                team1: team1_score,
                team2: team2_score,
                best_of: self.best_of.get(),
            });
        }

        self.team1.score = team1_score;
        self.team2.score = team2_score;
        self.games.clear();
        self.refresh();
        Ok(())
    }

    /// Put the players advancing from the match at `from_position` into
    /// their bracket slot. Returns false, changing nothing, once this match
    /// has started.
    pub fn receive_winner(&mut self, from_position: u32, players: &[Player]) -> bool {
        if self.status != MatchStatus::Pending {
            return false;
        }
        let side = TeamSide::for_position(from_position);
        self.team_mut(side).players = players.to_vec();
        self.updated_at = Utc::now();
        true
    }

    /// Undo [`Match::receive_winner`] for `players` by putting a `TBD`
    /// placeholder back in their slot. Returns false, changing nothing, once
    /// this match has started or when the slot holds someone else.
    pub fn withdraw_winner(&mut self, from_position: u32, players: &[Player]) -> bool {
        if self.status != MatchStatus::Pending {
            return false;
        }
        let team = self.team_mut(TeamSide::for_position(from_position));
        if team.players != players {
            return false;
        }
        team.players = vec![Player::new(PLACEHOLDER_NAME)];
        self.updated_at = Utc::now();
        true
    }

    /// Merge `patch` into the stats object; keys in the patch win
    pub fn merge_stats(&mut self, patch: Map<String, Value>) {
        self.stats.extend(patch);
        self.updated_at = Utc::now();
    }

    fn refresh(&mut self) {
        self.status = derive_status(self.best_of, self.team1.score, self.team2.score);
        let needed = self.best_of.wins_needed();
        self.winner = if self.team1.score >= needed {
            Some(TeamSide::Team1)
        } else if self.team2.score >= needed {
            Some(TeamSide::Team2)
        } else {
            None
        };
        self.updated_at = Utc::now();
    }
}

fn validate_lineup(side: TeamSide, players: &[Player]) -> MatchResult<()> {
    if players.is_empty() {
        return Err(MatchError::EmptyTeam(side));
    }
    if players.iter().any(|p| p.name.trim().is_empty()) {
        return Err(MatchError::Invalid(format!("{side} has a player without a name")));
    }
    Ok(())
}
