use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use infra::models::TournamentMatchRow;
use infra::repos::{MatchStage, MatchStatus};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateMatchInput {
    pub player1_id: Option<Uuid>,
    pub player2_id: Option<Uuid>,
    pub stage: MatchStage,
    pub round_name: Option<String>,
    pub round_order: Option<i32>,
    pub group_id: Option<Uuid>,
    pub match_number: Option<i32>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub court: Option<String>,
}

/// Partial result update. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMatchInput {
    pub player1_score: Option<i32>,
    pub player2_score: Option<i32>,
    pub score_details: Option<serde_json::Value>,
    pub winner_id: Option<Uuid>,
    pub status: Option<MatchStatus>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub court: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MatchListQuery {
    pub stage: Option<String>,
    pub status: Option<String>,
}

/// Knockout matches of one round, in bracket order.
#[derive(Debug, Clone, Serialize)]
pub struct RoundMatches {
    pub round_name: String,
    pub round_order: i32,
    pub matches: Vec<TournamentMatchRow>,
}

#[derive(Debug, Serialize)]
pub struct MatchListResponse {
    pub matches: Vec<TournamentMatchRow>,
    pub rounds: Vec<RoundMatches>,
}

#[derive(Debug, Serialize)]
pub struct FixturesResponse {
    pub matches: Vec<TournamentMatchRow>,
    pub count: usize,
}
