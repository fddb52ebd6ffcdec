use crate::repos::{MatchStage, MatchStatus, ParticipantStatus, ReservationStatus, TournamentPhase};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ReservationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub court: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: ReservationStatus,
    pub manager_confirmed: bool,
    pub is_block: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReservationRow {
    /// A reservation only blocks a court once a manager has confirmed it
    /// and nobody has cancelled it.
    pub fn is_blocking(&self) -> bool {
        self.status == ReservationStatus::Active && self.manager_confirmed
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TournamentRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub phase: TournamentPhase,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub max_participants: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TournamentGroupRow {
    pub id: Uuid,
    pub tournament_id: Uuid,
    pub label: String,
    pub display_order: i32,
    pub capacity: i32,
    pub advancement_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TournamentParticipantRow {
    pub id: Uuid,
    pub tournament_id: Uuid,
    pub user_id: Uuid,
    pub status: ParticipantStatus,
    pub group_id: Option<Uuid>,
    pub group_position: Option<i32>,
    pub seed: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TournamentMatchRow {
    pub id: Uuid,
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
    pub status: MatchStatus,
    pub player1_score: Option<i32>,
    pub player2_score: Option<i32>,
    pub score_details: Option<serde_json::Value>, // JSONB: [{"player1": 6, "player2": 4}, ...]
    pub winner_id: Option<Uuid>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TournamentMatchRow {
    pub fn has_player(&self, participant_id: Uuid) -> bool {
        self.player1_id == Some(participant_id) || self.player2_id == Some(participant_id)
    }
}
