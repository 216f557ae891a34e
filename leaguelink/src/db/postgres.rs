//! PostgreSQL repository implementation.
//!
//! Set-valued fields (admins, members, tournament and match id lists) are
//! stored as `BIGINT[]`; nested documents (participants, teams, games, stats)
//! as `JSONB`.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::types::Json;
use sqlx::Row;
use std::str::FromStr;

use super::errors::{StoreError, StoreResult};
use super::repository::{ChannelRepository, MatchRepository, TournamentRepository, UserRepository};
use super::timeouts::{with_default_timeout, with_long_timeout};
use crate::auth::{NewUser, ProfileUpdate, User, UserId};
use crate::bracket::{BestOf, Match, MatchId};
use crate::channel::{Channel, ChannelId};
use crate::tournament::{Tournament, TournamentId};

const USER_COLUMNS: &str = "id, username, email, display_name, bio, avatar_url, created_at";

const CHANNEL_COLUMNS: &str =
    "id, name, description, sport, is_private, owner_id, admins, members, tournaments, created_at";

const TOURNAMENT_COLUMNS: &str = "id, channel_id, name, description, organizer_id, format, \
     start_date, max_participants, participants, matches, status, winner_id, created_at";

const MATCH_COLUMNS: &str = "id, tournament_id, round, match_number, position, status, best_of, \
     team1, team2, games, winner, next_match_id, stats, created_at, updated_at";

/// Repository implementation over a PostgreSQL pool
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_u32(row: &PgRow, column: &str) -> StoreResult<u32> {
    let value: i32 = row.try_get(column)?;
    u32::try_from(value).map_err(|_| StoreError::Corrupt(format!("{column} = {value}")))
}

fn to_i32(value: u32, column: &str) -> StoreResult<i32> {
    i32::try_from(value).map_err(|_| StoreError::Corrupt(format!("{column} = {value}")))
}

fn parse<T: FromStr<Err = String>>(row: &PgRow, column: &str) -> StoreResult<T> {
    let value: String = row.try_get(column)?;
    value.parse().map_err(StoreError::Corrupt)
}

fn user_from_row(r: &PgRow) -> StoreResult<User> {
    Ok(User {
        id: r.try_get("id")?,
        username: r.try_get("username")?,
        email: r.try_get("email")?,
        display_name: r.try_get("display_name")?,
        bio: r.try_get("bio")?,
        avatar_url: r.try_get("avatar_url")?,
        created_at: r.try_get("created_at")?,
    })
}

fn channel_from_row(r: &PgRow) -> StoreResult<Channel> {
    Ok(Channel {
        id: r.try_get("id")?,
        name: r.try_get("name")?,
        description: r.try_get("description")?,
        sport: r.try_get("sport")?,
        is_private: r.try_get("is_private")?,
        owner: r.try_get("owner_id")?,
        admins: r.try_get::<Vec<i64>, _>("admins")?.into_iter().collect(),
        members: r.try_get::<Vec<i64>, _>("members")?.into_iter().collect(),
        tournaments: r.try_get("tournaments")?,
        created_at: r.try_get("created_at")?,
    })
}

fn tournament_from_row(r: &PgRow) -> StoreResult<Tournament> {
    Ok(Tournament {
        id: r.try_get("id")?,
        channel_id: r.try_get("channel_id")?,
        name: r.try_get("name")?,
        description: r.try_get("description")?,
        organizer: r.try_get("organizer_id")?,
        format: parse(r, "format")?,
        start_date: r.try_get("start_date")?,
        max_participants: to_u32(r, "max_participants")?,
        participants: r.try_get::<Json<_>, _>("participants")?.0,
        matches: r.try_get("matches")?,
        status: parse(r, "status")?,
        winner: r.try_get("winner_id")?,
        created_at: r.try_get("created_at")?,
    })
}

fn match_from_row(r: &PgRow) -> StoreResult<Match> {
    let best_of = to_u32(r, "best_of")?;
    let winner: Option<String> = r.try_get("winner")?;

    Ok(Match {
        id: r.try_get("id")?,
        tournament_id: r.try_get("tournament_id")?,
        round: to_u32(r, "round")?,
        match_number: to_u32(r, "match_number")?,
        position: to_u32(r, "position")?,
        status: parse(r, "status")?,
        best_of: BestOf::new(best_of)
            .map_err(|_| StoreError::Corrupt(format!("best_of = {best_of}")))?,
        team1: r.try_get::<Json<_>, _>("team1")?.0,
        team2: r.try_get::<Json<_>, _>("team2")?.0,
        games: r.try_get::<Json<_>, _>("games")?.0,
        winner: winner
            .map(|side| side.parse())
            .transpose()
            .map_err(StoreError::Corrupt)?,
        next_match: r.try_get("next_match_id")?,
        stats: r.try_get::<Json<_>, _>("stats")?.0,
        created_at: r.try_get("created_at")?,
        updated_at: r.try_get("updated_at")?,
    })
}

#[async_trait]
impl UserRepository for PgStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let sql = format!(
            "INSERT INTO users (username, email, display_name, password_hash)
             VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        );
        let row = with_default_timeout(
            sqlx::query(&sql)
                .bind(&user.username)
                .bind(&user.email)
                .bind(&user.display_name)
                .bind(&user.password_hash)
                .fetch_one(&self.pool),
        )
        .await?;

        user_from_row(&row)
    }

    async fn find_credentials(&self, username: &str) -> StoreResult<Option<(User, String)>> {
        let sql = format!("SELECT {USER_COLUMNS}, password_hash FROM users WHERE username = $1");
        let row = with_default_timeout(
            sqlx::query(&sql)
                .bind(username)
                .fetch_optional(&self.pool),
        )
        .await?;

        row.map(|r| -> StoreResult<(User, String)> {
            Ok((user_from_row(&r)?, r.try_get("password_hash")?))
        })
        .transpose()
    }

    async fn find_by_id(&self, user_id: UserId) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = with_default_timeout(
            sqlx::query(&sql)
                .bind(user_id)
                .fetch_optional(&self.pool),
        )
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn update_profile(
        &self,
        user_id: UserId,
        update: &ProfileUpdate,
    ) -> StoreResult<Option<User>> {
        let sql = format!(
            "UPDATE users SET
                display_name = COALESCE($2, display_name),
                bio = COALESCE($3, bio),
                avatar_url = COALESCE($4, avatar_url)
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let row = with_default_timeout(
            sqlx::query(&sql)
                .bind(user_id)
                .bind(&update.display_name)
                .bind(&update.bio)
                .bind(&update.avatar_url)
                .fetch_optional(&self.pool),
        )
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }
}

#[async_trait]
impl ChannelRepository for PgStore {
    async fn insert_channel(&self, channel: Channel) -> StoreResult<Channel> {
        let sql = format!(
            "INSERT INTO channels
                (name, description, sport, is_private, owner_id, admins, members, tournaments, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {CHANNEL_COLUMNS}"
        );
        let row = with_default_timeout(
            sqlx::query(&sql)
                .bind(&channel.name)
                .bind(&channel.description)
                .bind(&channel.sport)
                .bind(channel.is_private)
                .bind(channel.owner)
                .bind(channel.admins.iter().copied().collect::<Vec<_>>())
                .bind(channel.members.iter().copied().collect::<Vec<_>>())
                .bind(&channel.tournaments)
                .bind(channel.created_at)
                .fetch_one(&self.pool),
        )
        .await?;

        channel_from_row(&row)
    }

    async fn find_channel(&self, channel_id: ChannelId) -> StoreResult<Option<Channel>> {
        let sql = format!("SELECT {CHANNEL_COLUMNS} FROM channels WHERE id = $1");
        let row = with_default_timeout(
            sqlx::query(&sql)
                .bind(channel_id)
                .fetch_optional(&self.pool),
        )
        .await?;

        row.as_ref().map(channel_from_row).transpose()
    }

    async fn list_channels(&self) -> StoreResult<Vec<Channel>> {
        let sql = format!("SELECT {CHANNEL_COLUMNS} FROM channels ORDER BY id");
        let rows = with_long_timeout(sqlx::query(&sql).fetch_all(&self.pool)).await?;
        rows.iter().map(channel_from_row).collect()
    }

    async fn save_channel(&self, channel: &Channel) -> StoreResult<()> {
        with_default_timeout(
            sqlx::query(
                "UPDATE channels SET
                    name = $2, description = $3, sport = $4, is_private = $5,
                    admins = $6, members = $7
                 WHERE id = $1",
            )
            .bind(channel.id)
            .bind(&channel.name)
            .bind(&channel.description)
            .bind(&channel.sport)
            .bind(channel.is_private)
            .bind(channel.admins.iter().copied().collect::<Vec<_>>())
            .bind(channel.members.iter().copied().collect::<Vec<_>>())
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn append_channel_tournament(
        &self,
        channel_id: ChannelId,
        tournament_id: TournamentId,
    ) -> StoreResult<()> {
        with_default_timeout(
            sqlx::query(
                "UPDATE channels SET tournaments = array_append(tournaments, $2) WHERE id = $1",
            )
            .bind(channel_id)
            .bind(tournament_id)
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn remove_channel_tournament(
        &self,
        channel_id: ChannelId,
        tournament_id: TournamentId,
    ) -> StoreResult<()> {
        with_default_timeout(
            sqlx::query(
                "UPDATE channels SET tournaments = array_remove(tournaments, $2) WHERE id = $1",
            )
            .bind(channel_id)
            .bind(tournament_id)
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn delete_channel(&self, channel_id: ChannelId) -> StoreResult<bool> {
        let result = with_default_timeout(
            sqlx::query("DELETE FROM channels WHERE id = $1")
                .bind(channel_id)
                .execute(&self.pool),
        )
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl TournamentRepository for PgStore {
    async fn insert_tournament(&self, tournament: Tournament) -> StoreResult<Tournament> {
        let sql = format!(
            "INSERT INTO tournaments
                (channel_id, name, description, organizer_id, format, start_date,
                 max_participants, participants, matches, status, winner_id, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING {TOURNAMENT_COLUMNS}"
        );
        let row = with_default_timeout(
            sqlx::query(&sql)
                .bind(tournament.channel_id)
                .bind(&tournament.name)
                .bind(&tournament.description)
                .bind(tournament.organizer)
                .bind(tournament.format.as_str())
                .bind(tournament.start_date)
                .bind(to_i32(tournament.max_participants, "max_participants")?)
                .bind(Json(&tournament.participants))
                .bind(&tournament.matches)
                .bind(tournament.status.as_str())
                .bind(tournament.winner)
                .bind(tournament.created_at)
                .fetch_one(&self.pool),
        )
        .await?;

        tournament_from_row(&row)
    }

    async fn find_tournament(
        &self,
        tournament_id: TournamentId,
    ) -> StoreResult<Option<Tournament>> {
        let sql = format!("SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE id = $1");
        let row = with_default_timeout(
            sqlx::query(&sql)
                .bind(tournament_id)
                .fetch_optional(&self.pool),
        )
        .await?;

        row.as_ref().map(tournament_from_row).transpose()
    }

    async fn list_by_channel(&self, channel_id: ChannelId) -> StoreResult<Vec<Tournament>> {
        let sql =
            format!("SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE channel_id = $1 ORDER BY id");
        let rows = with_long_timeout(
            sqlx::query(&sql)
                .bind(channel_id)
                .fetch_all(&self.pool),
        )
        .await?;

        rows.iter().map(tournament_from_row).collect()
    }

    async fn save_tournament(&self, tournament: &Tournament) -> StoreResult<()> {
        with_default_timeout(
            sqlx::query(
                "UPDATE tournaments SET
                    name = $2, description = $3, format = $4, start_date = $5,
                    max_participants = $6, participants = $7,
                    status = $8, winner_id = $9
                 WHERE id = $1",
            )
            .bind(tournament.id)
            .bind(&tournament.name)
            .bind(&tournament.description)
            .bind(tournament.format.as_str())
            .bind(tournament.start_date)
            .bind(to_i32(tournament.max_participants, "max_participants")?)
            .bind(Json(&tournament.participants))
            .bind(tournament.status.as_str())
            .bind(tournament.winner)
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn append_tournament_matches(
        &self,
        tournament_id: TournamentId,
        match_ids: &[MatchId],
    ) -> StoreResult<()> {
        with_default_timeout(
            sqlx::query("UPDATE tournaments SET matches = matches || $2 WHERE id = $1")
                .bind(tournament_id)
                .bind(match_ids)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn remove_tournament_match(
        &self,
        tournament_id: TournamentId,
        match_id: MatchId,
    ) -> StoreResult<()> {
        with_default_timeout(
            sqlx::query("UPDATE tournaments SET matches = array_remove(matches, $2) WHERE id = $1")
                .bind(tournament_id)
                .bind(match_id)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn delete_tournament(&self, tournament_id: TournamentId) -> StoreResult<bool> {
        let result = with_default_timeout(
            sqlx::query("DELETE FROM tournaments WHERE id = $1")
                .bind(tournament_id)
                .execute(&self.pool),
        )
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl MatchRepository for PgStore {
    async fn insert_match(&self, game: Match) -> StoreResult<Match> {
        let sql = format!(
            "INSERT INTO matches
                (tournament_id, round, match_number, position, status, best_of,
                 team1, team2, games, winner, next_match_id, stats, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             RETURNING {MATCH_COLUMNS}"
        );
        let row = with_default_timeout(
            sqlx::query(&sql)
                .bind(game.tournament_id)
                .bind(to_i32(game.round, "round")?)
                .bind(to_i32(game.match_number, "match_number")?)
                .bind(to_i32(game.position, "position")?)
                .bind(game.status.as_str())
                .bind(to_i32(game.best_of.get(), "best_of")?)
                .bind(Json(&game.team1))
                .bind(Json(&game.team2))
                .bind(Json(&game.games))
                .bind(game.winner.map(|side| side.as_str()))
                .bind(game.next_match)
                .bind(Json(&game.stats))
                .bind(game.created_at)
                .bind(game.updated_at)
                .fetch_one(&self.pool),
        )
        .await?;

        match_from_row(&row)
    }

    async fn find_match(&self, match_id: MatchId) -> StoreResult<Option<Match>> {
        let sql = format!("SELECT {MATCH_COLUMNS} FROM matches WHERE id = $1");
        let row = with_default_timeout(
            sqlx::query(&sql)
                .bind(match_id)
                .fetch_optional(&self.pool),
        )
        .await?;

        row.as_ref().map(match_from_row).transpose()
    }

    async fn list_by_tournament(&self, tournament_id: TournamentId) -> StoreResult<Vec<Match>> {
        let sql = format!(
            "SELECT {MATCH_COLUMNS} FROM matches WHERE tournament_id = $1
             ORDER BY round, match_number, id"
        );
        let rows = with_long_timeout(
            sqlx::query(&sql)
                .bind(tournament_id)
                .fetch_all(&self.pool),
        )
        .await?;

        rows.iter().map(match_from_row).collect()
    }

    async fn save_match(&self, game: &Match) -> StoreResult<()> {
        with_default_timeout(
            sqlx::query(
                "UPDATE matches SET
                    round = $2, match_number = $3, position = $4, status = $5, best_of = $6,
                    team1 = $7, team2 = $8, games = $9, winner = $10, next_match_id = $11,
                    stats = $12, updated_at = $13
                 WHERE id = $1",
            )
            .bind(game.id)
            .bind(to_i32(game.round, "round")?)
            .bind(to_i32(game.match_number, "match_number")?)
            .bind(to_i32(game.position, "position")?)
            .bind(game.status.as_str())
            .bind(to_i32(game.best_of.get(), "best_of")?)
            .bind(Json(&game.team1))
            .bind(Json(&game.team2))
            .bind(Json(&game.games))
            .bind(game.winner.map(|side| side.as_str()))
            .bind(game.next_match)
            .bind(Json(&game.stats))
            .bind(game.updated_at)
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn delete_match(&self, match_id: MatchId) -> StoreResult<bool> {
        let result = with_default_timeout(
            sqlx::query("DELETE FROM matches WHERE id = $1")
                .bind(match_id)
                .execute(&self.pool),
        )
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear_next_match(&self, target: MatchId) -> StoreResult<u64> {
        let result = with_long_timeout(
            sqlx::query(
                "UPDATE matches SET next_match_id = NULL, updated_at = NOW()
                 WHERE next_match_id = $1",
            )
            .bind(target)
            .execute(&self.pool),
        )
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete_by_tournament(&self, tournament_id: TournamentId) -> StoreResult<u64> {
        let result = with_long_timeout(
            sqlx::query("DELETE FROM matches WHERE tournament_id = $1")
                .bind(tournament_id)
                .execute(&self.pool),
        )
        .await?;
        Ok(result.rows_affected())
    }
}
