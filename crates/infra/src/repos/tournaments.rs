use crate::{db::Db, models::TournamentRow};
use chrono::NaiveDate;
use sqlx::{PgExecutor, Result as SqlxResult};
use std::str::FromStr;
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, sqlx::Type, serde::Serialize, serde::Deserialize,
)]
#[sqlx(type_name = "tournament_phase", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TournamentPhase {
    Registration,
    Groups,
    Knockout,
    Completed,
}

impl TournamentPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TournamentPhase::Registration => "registration",
            TournamentPhase::Groups => "groups",
            TournamentPhase::Knockout => "knockout",
            TournamentPhase::Completed => "completed",
        }
    }

    /// Phases only move forward. Skipping ahead is allowed
    /// (a knockout-only tournament goes straight from registration to knockout).
    pub fn can_advance_to(&self, next: TournamentPhase) -> bool {
        next > *self
    }

    pub fn accepts_registrations(&self) -> bool {
        *self == TournamentPhase::Registration
    }

    /// Group draws may be (re)generated until the knockout stage begins.
    pub fn allows_group_draw(&self) -> bool {
        matches!(self, TournamentPhase::Registration | TournamentPhase::Groups)
    }
}

impl FromStr for TournamentPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registration" => Ok(TournamentPhase::Registration),
            "groups" => Ok(TournamentPhase::Groups),
            "knockout" => Ok(TournamentPhase::Knockout),
            "completed" => Ok(TournamentPhase::Completed),
            _ => Err(format!("Unknown tournament phase: {}", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateTournamentData {
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub max_participants: Option<i32>,
}

#[derive(Clone)]
pub struct TournamentRepo {
    pool: Db,
}

impl TournamentRepo {
    pub fn new(pool: Db) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: Uuid) -> SqlxResult<Option<TournamentRow>> {
        get_by_id(&self.pool, id).await
    }

    pub async fn create(&self, data: CreateTournamentData) -> SqlxResult<TournamentRow> {
        sqlx::query_as::<_, TournamentRow>(
            r#"
            INSERT INTO tournaments (name, description, start_date, end_date, max_participants)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, description, phase, start_date, end_date,
                      max_participants, created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.description)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(data.max_participants)
        .fetch_one(&self.pool)
        .await
    }
}

pub async fn get_by_id<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> SqlxResult<Option<TournamentRow>> {
    sqlx::query_as::<_, TournamentRow>(
        r#"
        SELECT id, name, description, phase, start_date, end_date,
               max_participants, created_at, updated_at
        FROM tournaments
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Lock the tournament row for the rest of the transaction.
pub async fn get_by_id_for_update<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> SqlxResult<Option<TournamentRow>> {
    sqlx::query_as::<_, TournamentRow>(
        r#"
        SELECT id, name, description, phase, start_date, end_date,
               max_participants, created_at, updated_at
        FROM tournaments
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn set_phase<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    phase: TournamentPhase,
) -> SqlxResult<TournamentRow> {
    sqlx::query_as::<_, TournamentRow>(
        r#"
        UPDATE tournaments
        SET phase = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING id, name, description, phase, start_date, end_date,
                  max_participants, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(phase)
    .fetch_one(executor)
    .await
}
