use crate::models::ReservationRow;
use crate::pagination::LimitOffset;
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, Result as SqlxResult};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, serde::Serialize, serde::Deserialize)]
#[sqlx(type_name = "reservation_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Active,
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Active => "active",
            ReservationStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for ReservationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ReservationStatus::Active),
            "cancelled" => Ok(ReservationStatus::Cancelled),
            _ => Err(format!("Unknown reservation status: {}", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateReservation {
    pub user_id: Uuid,
    pub court: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub manager_confirmed: bool,
    pub is_block: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ReservationFilter {
    pub user_id: Option<Uuid>,
    pub court: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub status: Option<ReservationStatus>,
}

const COLUMNS: &str = "id, user_id, court, start_time, end_time, status, manager_confirmed, \
                       is_block, notes, created_at, updated_at";

pub async fn create<'e>(
    executor: impl PgExecutor<'e>,
    data: CreateReservation,
) -> SqlxResult<ReservationRow> {
    sqlx::query_as::<_, ReservationRow>(&format!(
        r#"
        INSERT INTO reservations (
            user_id, court, start_time, end_time, manager_confirmed, is_block, notes
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(data.user_id)
    .bind(data.court)
    .bind(data.start_time)
    .bind(data.end_time)
    .bind(data.manager_confirmed)
    .bind(data.is_block)
    .bind(data.notes)
    .fetch_one(executor)
    .await
}

pub async fn get_by_id<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> SqlxResult<Option<ReservationRow>> {
    sqlx::query_as::<_, ReservationRow>(&format!(
        "SELECT {COLUMNS} FROM reservations WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Same as [`get_by_id`] but takes a row lock; call inside a transaction.
pub async fn get_by_id_for_update<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> SqlxResult<Option<ReservationRow>> {
    sqlx::query_as::<_, ReservationRow>(&format!(
        "SELECT {COLUMNS} FROM reservations WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Non-cancelled reservations on `court` whose half-open interval intersects
/// `[start, end)`. Confirmation is not filtered here.
pub async fn list_overlapping<'e>(
    executor: impl PgExecutor<'e>,
    court: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    exclude_id: Option<Uuid>,
) -> SqlxResult<Vec<ReservationRow>> {
    sqlx::query_as::<_, ReservationRow>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM reservations
        WHERE court = $1
          AND status <> 'cancelled'
          AND start_time < $3
          AND end_time > $2
          AND ($4::uuid IS NULL OR id <> $4)
        ORDER BY start_time ASC
        "#
    ))
    .bind(court)
    .bind(start)
    .bind(end)
    .bind(exclude_id)
    .fetch_all(executor)
    .await
}

/// Serialize writers for one court until the surrounding transaction ends.
pub async fn lock_court<'e>(executor: impl PgExecutor<'e>, court: &str) -> SqlxResult<()> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(court)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn confirm<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> SqlxResult<ReservationRow> {
    sqlx::query_as::<_, ReservationRow>(&format!(
        r#"
        UPDATE reservations
        SET manager_confirmed = true,
            updated_at = NOW()
        WHERE id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .fetch_one(executor)
    .await
}

pub async fn cancel<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> SqlxResult<Option<ReservationRow>> {
    sqlx::query_as::<_, ReservationRow>(&format!(
        r#"
        UPDATE reservations
        SET status = 'cancelled',
            updated_at = CASE WHEN status = 'cancelled' THEN updated_at ELSE NOW() END
        WHERE id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn list<'e>(
    executor: impl PgExecutor<'e>,
    filter: ReservationFilter,
    page: LimitOffset,
) -> SqlxResult<Vec<ReservationRow>> {
    // Dynamic WHERE using the NULL-or-match pattern to keep a single prepared statement
    sqlx::query_as::<_, ReservationRow>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM reservations
        WHERE ($1::uuid IS NULL OR user_id = $1)
          AND ($2::text IS NULL OR court = $2)
          AND ($3::timestamptz IS NULL OR end_time > $3)
          AND ($4::timestamptz IS NULL OR start_time < $4)
          AND ($5::reservation_status IS NULL OR status = $5)
        ORDER BY start_time ASC
        LIMIT $6 OFFSET $7
        "#
    ))
    .bind(filter.user_id)
    .bind(filter.court)
    .bind(filter.from)
    .bind(filter.to)
    .bind(filter.status)
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(executor)
    .await
}
