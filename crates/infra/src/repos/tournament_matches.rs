use crate::models::TournamentMatchRow;
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, Result as SqlxResult};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, serde::Serialize, serde::Deserialize)]
#[sqlx(type_name = "match_stage", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MatchStage {
    Groups,
    Knockout,
}

impl MatchStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStage::Groups => "groups",
            MatchStage::Knockout => "knockout",
        }
    }
}

impl FromStr for MatchStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "groups" => Ok(MatchStage::Groups),
            "knockout" => Ok(MatchStage::Knockout),
            _ => Err(format!("Unknown match stage: {}", s)),
        }
    }
}

/// Declaration order is the only valid direction of travel.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, sqlx::Type, serde::Serialize, serde::Deserialize,
)]
#[sqlx(type_name = "match_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Scheduled,
    InProgress,
    Completed,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::InProgress => "in_progress",
            MatchStatus::Completed => "completed",
        }
    }
}

impl FromStr for MatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(MatchStatus::Scheduled),
            "in_progress" => Ok(MatchStatus::InProgress),
            "completed" => Ok(MatchStatus::Completed),
            _ => Err(format!("Unknown match status: {}", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateTournamentMatch {
    pub tournament_id: Uuid,
    pub group_id: Option<Uuid>,
    pub player1_id: Option<Uuid>,
    pub player2_id: Option<Uuid>,
    pub stage: MatchStage,
    pub round_name: Option<String>,
    pub round_order: Option<i32>,
    pub match_number: Option<i32>,
    pub court: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// Column values to write. `None` leaves the stored value untouched,
/// and the two lifecycle timestamps are only ever filled once.
#[derive(Debug, Clone, Default)]
pub struct UpdateTournamentMatch {
    pub status: Option<MatchStatus>,
    pub player1_score: Option<i32>,
    pub player2_score: Option<i32>,
    pub score_details: Option<serde_json::Value>,
    pub winner_id: Option<Uuid>,
    pub court: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct MatchFilter {
    pub stage: Option<MatchStage>,
    pub status: Option<MatchStatus>,
    pub group_id: Option<Uuid>,
}

pub async fn create<'e>(
    executor: impl PgExecutor<'e>,
    data: CreateTournamentMatch,
) -> SqlxResult<TournamentMatchRow> {
    sqlx::query_as::<_, TournamentMatchRow>(
        r#"
        INSERT INTO tournament_matches (
            tournament_id, group_id, player1_id, player2_id, stage,
            round_name, round_order, match_number, court, scheduled_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING id, tournament_id, group_id, player1_id, player2_id, stage,
                  round_name, round_order, match_number, court, scheduled_at, status,
                  player1_score, player2_score, score_details, winner_id,
                  started_at, completed_at, created_at, updated_at
        "#,
    )
    .bind(data.tournament_id)
    .bind(data.group_id)
    .bind(data.player1_id)
    .bind(data.player2_id)
    .bind(data.stage)
    .bind(data.round_name)
    .bind(data.round_order)
    .bind(data.match_number)
    .bind(data.court)
    .bind(data.scheduled_at)
    .fetch_one(executor)
    .await
}

pub async fn get_by_id_for_update<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> SqlxResult<Option<TournamentMatchRow>> {
    sqlx::query_as::<_, TournamentMatchRow>(
        r#"
        SELECT id, tournament_id, group_id, player1_id, player2_id, stage,
               round_name, round_order, match_number, court, scheduled_at, status,
               player1_score, player2_score, score_details, winner_id,
               started_at, completed_at, created_at, updated_at
        FROM tournament_matches
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn list_by_tournament<'e>(
    executor: impl PgExecutor<'e>,
    tournament_id: Uuid,
    filter: MatchFilter,
) -> SqlxResult<Vec<TournamentMatchRow>> {
    sqlx::query_as::<_, TournamentMatchRow>(
        r#"
        SELECT id, tournament_id, group_id, player1_id, player2_id, stage,
               round_name, round_order, match_number, court, scheduled_at, status,
               player1_score, player2_score, score_details, winner_id,
               started_at, completed_at, created_at, updated_at
        FROM tournament_matches
        WHERE tournament_id = $1
          AND ($2::match_stage IS NULL OR stage = $2)
          AND ($3::match_status IS NULL OR status = $3)
          AND ($4::uuid IS NULL OR group_id = $4)
        ORDER BY round_order ASC NULLS LAST, match_number ASC NULLS LAST,
                 scheduled_at ASC NULLS LAST, created_at ASC
        "#,
    )
    .bind(tournament_id)
    .bind(filter.stage)
    .bind(filter.status)
    .bind(filter.group_id)
    .fetch_all(executor)
    .await
}

pub async fn count_by_stage<'e>(
    executor: impl PgExecutor<'e>,
    tournament_id: Uuid,
    stage: MatchStage,
) -> SqlxResult<i64> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM tournament_matches WHERE tournament_id = $1 AND stage = $2",
    )
    .bind(tournament_id)
    .bind(stage)
    .fetch_one(executor)
    .await?;
    Ok(count)
}

pub async fn update<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    data: UpdateTournamentMatch,
) -> SqlxResult<TournamentMatchRow> {
    sqlx::query_as::<_, TournamentMatchRow>(
        r#"
        UPDATE tournament_matches
        SET status = COALESCE($2, status),
            player1_score = COALESCE($3, player1_score),
            player2_score = COALESCE($4, player2_score),
            score_details = COALESCE($5, score_details),
            winner_id = COALESCE($6, winner_id),
            court = COALESCE($7, court),
            scheduled_at = COALESCE($8, scheduled_at),
            started_at = COALESCE(started_at, $9),
            completed_at = COALESCE(completed_at, $10),
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, tournament_id, group_id, player1_id, player2_id, stage,
                  round_name, round_order, match_number, court, scheduled_at, status,
                  player1_score, player2_score, score_details, winner_id,
                  started_at, completed_at, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(data.status)
    .bind(data.player1_score)
    .bind(data.player2_score)
    .bind(data.score_details)
    .bind(data.winner_id)
    .bind(data.court)
    .bind(data.scheduled_at)
    .bind(data.started_at)
    .bind(data.completed_at)
    .fetch_one(executor)
    .await
}
