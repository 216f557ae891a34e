//! Match lifecycle manager: creation, scoring, winner advancement, stats
//! and deletion with bracket relinking.

use super::errors::{MatchError, MatchResult};
use super::models::{BestOf, Match, MatchDraft, MatchId, Player, TeamSide};
use crate::auth::UserId;
use crate::db::{ChannelRepository, MatchRepository, Repositories, TournamentRepository};
use crate::policy::{self, Action, Resource};
use crate::tournament::{Tournament, TournamentId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Standalone match creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMatchRequest {
    pub tournament_id: TournamentId,
    pub round: u32,
    pub match_number: u32,
    /// Bracket slot; defaults to the match number
    #[serde(default)]
    pub position: Option<u32>,
    pub best_of: u32,
    pub team1: Vec<Player>,
    pub team2: Vec<Player>,
    #[serde(default)]
    pub next_match_id: Option<MatchId>,
}

/// One entry of a bulk bracket creation.
///
/// `temp_id` is a caller-chosen label; `next_match_id` refers to another
/// entry's `temp_id` in the same batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkMatchSpec {
    #[serde(default)]
    pub temp_id: Option<String>,
    #[serde(default)]
    pub round: Option<u32>,
    #[serde(default)]
    pub match_number: Option<u32>,
    #[serde(default)]
    pub position: Option<u32>,
    #[serde(default)]
    pub best_of: Option<u32>,
    #[serde(default)]
    pub team1: Vec<Player>,
    #[serde(default)]
    pub team2: Vec<Player>,
    #[serde(default)]
    pub next_match_id: Option<String>,
}

/// Match manager
#[derive(Clone)]
pub struct MatchManager {
    channels: Arc<dyn ChannelRepository>,
    tournaments: Arc<dyn TournamentRepository>,
    matches: Arc<dyn MatchRepository>,
}

impl MatchManager {
    /// Create a new match manager
    pub fn new(repos: &Repositories) -> Self {
        Self {
            channels: repos.channels.clone(),
            tournaments: repos.tournaments.clone(),
            matches: repos.matches.clone(),
        }
    }

    /// Create a single match and append it to its tournament
    pub async fn create_match(
        &self,
        actor: UserId,
        request: CreateMatchRequest,
    ) -> MatchResult<Match> {
        let tournament = self.authorize(actor, request.tournament_id).await?;
        let best_of = BestOf::new(request.best_of)?;

        if let Some(next_id) = request.next_match_id {
            match self.matches.find_match(next_id).await? {
                Some(next) if next.tournament_id == tournament.id => {}
                _ => return Err(MatchError::InvalidNextMatch(next_id)),
            }
        }

        let draft = MatchDraft {
            tournament_id: tournament.id,
            round: request.round,
            match_number: request.match_number,
            position: request.position.unwrap_or(request.match_number),
            best_of,
            team1: request.team1,
            team2: request.team2,
            next_match: request.next_match_id,
        };
        let created = self.matches.insert_match(Match::new(draft)?).await?;

        self.tournaments
            .append_tournament_matches(tournament.id, &[created.id])
            .await?;

        log::info!(
            "Created match {} (round {}, #{}) in tournament {}",
            created.id,
            created.round,
            created.match_number,
            tournament.id
        );
        Ok(created)
    }

    /// Create a whole bracket in two passes.
    ///
    /// Every spec is validated before anything is written; an invalid spec
    /// rejects the batch. Pass one inserts the matches and maps temporary ids
    /// to real ids, pass two stores the resolved `next_match` links. A store
    /// failure during pass two leaves the pass-one matches in place.
    pub async fn bulk_create_matches(
        &self,
        actor: UserId,
        tournament_id: TournamentId,
        specs: Vec<BulkMatchSpec>,
    ) -> MatchResult<Vec<Match>> {
        self.authorize(actor, tournament_id).await?;
        let planned = plan_bulk(tournament_id, &specs)?;

        // Pass 1: insert and map temporary ids
        let mut id_map: HashMap<String, MatchId> = HashMap::new();
        let mut created = Vec::with_capacity(planned.len());
        for (spec, game) in specs.iter().zip(planned) {
            let saved = self.matches.insert_match(game).await?;
            if let Some(temp_id) = &spec.temp_id {
                id_map.insert(temp_id.clone(), saved.id);
            }
            created.push(saved);
        }
        let ids: Vec<MatchId> = created.iter().map(|m| m.id).collect();
        self.tournaments
            .append_tournament_matches(tournament_id, &ids)
            .await?;

        // Pass 2: resolve links
        for (spec, game) in specs.iter().zip(created.iter_mut()) {
            let Some(next_temp) = &spec.next_match_id else {
                continue;
            };
            let next_id = id_map
                .get(next_temp)
                .copied()
                .ok_or_else(|| MatchError::UnknownTempId(next_temp.clone()))?;
            game.next_match = Some(next_id);
            if let Err(e) = self.matches.save_match(game).await {
                log::error!(
                    "Bulk creation for tournament {} failed while linking match {}: {}",
                    tournament_id,
                    game.id,
                    e
                );
                return Err(e.into());
            }
        }

        log::info!(
            "Bulk created {} matches in tournament {}",
            created.len(),
            tournament_id
        );
        Ok(created)
    }

    /// Get a match by id
    pub async fn get_match(&self, match_id: MatchId) -> MatchResult<Match> {
        self.load(match_id).await
    }

    /// List the matches of a tournament by round and match number
    pub async fn list_matches(&self, tournament_id: TournamentId) -> MatchResult<Vec<Match>> {
        if self
            .tournaments
            .find_tournament(tournament_id)
            .await?
            .is_none()
        {
            return Err(MatchError::TournamentNotFound(tournament_id));
        }
        Ok(self.matches.list_by_tournament(tournament_id).await?)
    }

    /// Record which team won a game; completes and advances the match once a
    /// team reaches `ceil(best_of / 2)` wins
    pub async fn record_game_result(
        &self,
        actor: UserId,
        match_id: MatchId,
        game_number: u32,
        winner: TeamSide,
    ) -> MatchResult<Match> {
        let mut game = self.load(match_id).await?;
        self.authorize(actor, game.tournament_id).await?;

        game.record_game(game_number, winner)?;
        self.matches.save_match(&game).await?;

        if game.is_completed() {
            self.advance_winner(&game).await?;
        }
        Ok(game)
    }

    /// Overwrite the score of a match and re-derive its status.
    ///
    /// Reopening a completed match takes its advanced lineup back out of the
    /// next match while that match is still pending.
    pub async fn set_score(
        &self,
        actor: UserId,
        match_id: MatchId,
        team1_score: u32,
        team2_score: u32,
    ) -> MatchResult<Match> {
        let mut game = self.load(match_id).await?;
        self.authorize(actor, game.tournament_id).await?;
        let advanced = game.winning_players().map(<[Player]>::to_vec);

        game.set_score(team1_score, team2_score)?;
        self.matches.save_match(&game).await?;

        if game.is_completed() {
            self.advance_winner(&game).await?;
        } else if let Some(players) = advanced {
            self.withdraw_winner(&game, &players).await?;
        }
        Ok(game)
    }

    /// Merge a JSON object into the free-form stats of a match
    pub async fn update_stats(
        &self,
        actor: UserId,
        match_id: MatchId,
        stats: Value,
    ) -> MatchResult<Match> {
        let Value::Object(patch) = stats else {
            return Err(MatchError::StatsNotObject);
        };
        let mut game = self.load(match_id).await?;
        self.authorize(actor, game.tournament_id).await?;

        game.merge_stats(patch);
        self.matches.save_match(&game).await?;
        Ok(game)
    }

    /// Delete a match, clearing every `next_match` link pointing at it and
    /// pulling it from its tournament's match list
    pub async fn delete_match(&self, actor: UserId, match_id: MatchId) -> MatchResult<()> {
        let game = self.load(match_id).await?;
        self.authorize(actor, game.tournament_id).await?;

        let unlinked = self.matches.clear_next_match(match_id).await?;
        self.tournaments
            .remove_tournament_match(game.tournament_id, match_id)
            .await?;

        self.matches.delete_match(match_id).await?;

        log::info!(
            "Deleted match {} from tournament {} ({} bracket links cleared)",
            match_id,
            game.tournament_id,
            unlinked
        );
        Ok(())
    }

    /// Push the winners of a completed match into its next match
    async fn advance_winner(&self, game: &Match) -> MatchResult<()> {
        let (Some(next_id), Some(players)) = (game.next_match, game.winning_players()) else {
            return Ok(());
        };

        let Some(mut next) = self.matches.find_match(next_id).await? else {
            log::warn!(
                "Match {} links to missing next match {}",
                game.id,
                next_id
            );
            return Ok(());
        };

        if next.receive_winner(game.position, players) {
            self.matches.save_match(&next).await?;
            log::debug!("Advanced winner of match {} into match {}", game.id, next_id);
        } else {
            log::warn!(
                "Next match {} already started; winner of match {} not advanced",
                next_id,
                game.id
            );
        }
        Ok(())
    }

    /// Take a previously advanced lineup back out of the next match
    async fn withdraw_winner(&self, game: &Match, players: &[Player]) -> MatchResult<()> {
        let Some(next_id) = game.next_match else {
            return Ok(());
        };
        let Some(mut next) = self.matches.find_match(next_id).await? else {
            return Ok(());
        };

        if next.withdraw_winner(game.position, players) {
            self.matches.save_match(&next).await?;
            log::debug!("Withdrew winner of match {} from match {}", game.id, next_id);
        } else {
            log::warn!(
                "Match {} reopened but match {} keeps its lineup",
                game.id,
                next_id
            );
        }
        Ok(())
    }

    async fn load(&self, match_id: MatchId) -> MatchResult<Match> {
        self.matches
            .find_match(match_id)
            .await?
            .ok_or(MatchError::NotFound(match_id))
    }

    /// Load the tournament and require the organizer or a channel admin
    async fn authorize(&self, actor: UserId, tournament_id: TournamentId) -> MatchResult<Tournament> {
        let tournament = self
            .tournaments
            .find_tournament(tournament_id)
            .await?
            .ok_or(MatchError::TournamentNotFound(tournament_id))?;
        let channel = self
            .channels
            .find_channel(tournament.channel_id)
            .await?
            .ok_or(MatchError::ChannelNotFound(tournament.channel_id))?;

        let resource = Resource::Tournament {
            tournament: &tournament,
            channel: &channel,
        };
        if !policy::is_permitted(actor, Action::ManageMatches, resource) {
            log::warn!(
                "User {} denied match management in tournament {}",
                actor,
                tournament_id
            );
            return Err(MatchError::Forbidden("manage matches in this tournament"));
        }
        Ok(tournament)
    }
}

/// Validate a bulk batch and build its unsaved matches
fn plan_bulk(tournament_id: TournamentId, specs: &[BulkMatchSpec]) -> MatchResult<Vec<Match>> {
    if specs.is_empty() {
        return Err(MatchError::Invalid("no matches to create".to_string()));
    }

    let mut temp_ids = HashSet::new();
    let mut planned = Vec::with_capacity(specs.len());

    for (index, spec) in specs.iter().enumerate() {
        let missing = |field| MatchError::MissingField { index, field };
        let round = spec.round.ok_or_else(|| missing("round"))?;
        let match_number = spec.match_number.ok_or_else(|| missing("match_number"))?;
        let position = spec.position.ok_or_else(|| missing("position"))?;
        let best_of = BestOf::new(spec.best_of.ok_or_else(|| missing("best_of"))?)?;

        if let Some(temp_id) = &spec.temp_id {
            if !temp_ids.insert(temp_id.as_str()) {
                return Err(MatchError::DuplicateTempId(temp_id.clone()));
            }
        }

        planned.push(Match::new(MatchDraft {
            tournament_id,
            round,
            match_number,
            position,
            best_of,
            team1: spec.team1.clone(),
            team2: spec.team2.clone(),
            next_match: None,
        })?);
    }

    if let Some(next) = specs
        .iter()
        .filter_map(|spec| spec.next_match_id.as_ref())
        .find(|next| !temp_ids.contains(next.as_str()))
    {
        return Err(MatchError::UnknownTempId(next.clone()));
    }

    Ok(planned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(temp_id: &str, next: Option<&str>) -> BulkMatchSpec {
        BulkMatchSpec {
            temp_id: Some(temp_id.to_string()),
            round: Some(1),
            match_number: Some(1),
            position: Some(1),
            best_of: Some(3),
            team1: vec![Player::new("A")],
            team2: vec![Player::new("B")],
            next_match_id: next.map(str::to_string),
        }
    }

    #[test]
    fn test_plan_rejects_missing_fields() {
        let mut bad = spec("a", None);
        bad.position = None;
        let err = plan_bulk(1, &[spec("x", None), bad]).unwrap_err();
        assert!(matches!(
            err,
            MatchError::MissingField {
                index: 1,
                field: "position"
            }
        ));
    }

    #[test]
    fn test_plan_rejects_even_best_of() {
        let mut bad = spec("a", None);
        bad.best_of = Some(2);
        assert!(matches!(
            plan_bulk(1, &[bad]),
            Err(MatchError::InvalidBestOf(2))
        ));
    }

    #[test]
    fn test_plan_rejects_bad_references() {
        assert!(matches!(
            plan_bulk(1, &[spec("a", Some("zzz"))]),
            Err(MatchError::UnknownTempId(_))
        ));
        assert!(matches!(
            plan_bulk(1, &[spec("a", None), spec("a", None)]),
            Err(MatchError::DuplicateTempId(_))
        ));
    }

    #[test]
    fn test_plan_accepts_forward_and_backward_links() {
        let planned = plan_bulk(
            1,
            &[spec("semi1", Some("final")), spec("final", None), spec("semi2", Some("final"))],
        )
        .unwrap();
        assert_eq!(planned.len(), 3);
        assert!(planned.iter().all(|m| m.next_match.is_none()));
    }
}
