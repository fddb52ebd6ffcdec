use crate::models::TournamentParticipantRow;
use sqlx::{PgExecutor, Result as SqlxResult};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, serde::Serialize, serde::Deserialize)]
#[sqlx(type_name = "participant_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    Pending,
    Confirmed,
    Eliminated,
    Withdrawn,
}

impl ParticipantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantStatus::Pending => "pending",
            ParticipantStatus::Confirmed => "confirmed",
            ParticipantStatus::Eliminated => "eliminated",
            ParticipantStatus::Withdrawn => "withdrawn",
        }
    }
}

impl FromStr for ParticipantStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ParticipantStatus::Pending),
            "confirmed" => Ok(ParticipantStatus::Confirmed),
            "eliminated" => Ok(ParticipantStatus::Eliminated),
            "withdrawn" => Ok(ParticipantStatus::Withdrawn),
            _ => Err(format!("Unknown participant status: {}", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateTournamentParticipant {
    pub tournament_id: Uuid,
    pub user_id: Uuid,
    pub seed: Option<i32>,
}

pub async fn create<'e>(
    executor: impl PgExecutor<'e>,
    data: CreateTournamentParticipant,
) -> SqlxResult<TournamentParticipantRow> {
    sqlx::query_as::<_, TournamentParticipantRow>(
        r#"
        INSERT INTO tournament_participants (tournament_id, user_id, seed)
        VALUES ($1, $2, $3)
        RETURNING id, tournament_id, user_id, status, group_id, group_position,
                  seed, created_at, updated_at
        "#,
    )
    .bind(data.tournament_id)
    .bind(data.user_id)
    .bind(data.seed)
    .fetch_one(executor)
    .await
}

pub async fn get_by_id<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> SqlxResult<Option<TournamentParticipantRow>> {
    sqlx::query_as::<_, TournamentParticipantRow>(
        r#"
        SELECT id, tournament_id, user_id, status, group_id, group_position,
               seed, created_at, updated_at
        FROM tournament_participants
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn get_by_tournament_and_user<'e>(
    executor: impl PgExecutor<'e>,
    tournament_id: Uuid,
    user_id: Uuid,
) -> SqlxResult<Option<TournamentParticipantRow>> {
    sqlx::query_as::<_, TournamentParticipantRow>(
        r#"
        SELECT id, tournament_id, user_id, status, group_id, group_position,
               seed, created_at, updated_at
        FROM tournament_participants
        WHERE tournament_id = $1 AND user_id = $2
        "#,
    )
    .bind(tournament_id)
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

pub async fn list_by_tournament<'e>(
    executor: impl PgExecutor<'e>,
    tournament_id: Uuid,
    status: Option<ParticipantStatus>,
) -> SqlxResult<Vec<TournamentParticipantRow>> {
    sqlx::query_as::<_, TournamentParticipantRow>(
        r#"
        SELECT id, tournament_id, user_id, status, group_id, group_position,
               seed, created_at, updated_at
        FROM tournament_participants
        WHERE tournament_id = $1
          AND ($2::participant_status IS NULL OR status = $2)
        ORDER BY seed ASC NULLS LAST, created_at ASC
        "#,
    )
    .bind(tournament_id)
    .bind(status)
    .fetch_all(executor)
    .await
}

pub async fn list_by_group<'e>(
    executor: impl PgExecutor<'e>,
    group_id: Uuid,
) -> SqlxResult<Vec<TournamentParticipantRow>> {
    sqlx::query_as::<_, TournamentParticipantRow>(
        r#"
        SELECT id, tournament_id, user_id, status, group_id, group_position,
               seed, created_at, updated_at
        FROM tournament_participants
        WHERE group_id = $1
        ORDER BY group_position ASC
        "#,
    )
    .bind(group_id)
    .fetch_all(executor)
    .await
}

pub async fn update_status_and_seed<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    status: Option<ParticipantStatus>,
    seed: Option<i32>,
) -> SqlxResult<Option<TournamentParticipantRow>> {
    sqlx::query_as::<_, TournamentParticipantRow>(
        r#"
        UPDATE tournament_participants
        SET status = COALESCE($2, status),
            seed = COALESCE($3, seed),
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, tournament_id, user_id, status, group_id, group_position,
                  seed, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(status)
    .bind(seed)
    .fetch_optional(executor)
    .await
}

pub async fn assign_group<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    group_id: Uuid,
    group_position: i32,
) -> SqlxResult<TournamentParticipantRow> {
    sqlx::query_as::<_, TournamentParticipantRow>(
        r#"
        UPDATE tournament_participants
        SET group_id = $2, group_position = $3, updated_at = NOW()
        WHERE id = $1
        RETURNING id, tournament_id, user_id, status, group_id, group_position,
                  seed, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(group_id)
    .bind(group_position)
    .fetch_one(executor)
    .await
}

/// Drop every group assignment in a tournament ahead of a fresh draw.
pub async fn clear_group_assignments<'e>(
    executor: impl PgExecutor<'e>,
    tournament_id: Uuid,
) -> SqlxResult<u64> {
    let result = sqlx::query(
        r#"
        UPDATE tournament_participants
        SET group_id = NULL, group_position = NULL, updated_at = NOW()
        WHERE tournament_id = $1 AND group_id IS NOT NULL
        "#,
    )
    .bind(tournament_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}
