use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use infra::models::TournamentMatchRow;
use infra::repos::{MatchFilter, MatchStage, MatchStatus};

use crate::auth::{AuthUser, Role};
use crate::domains::matches::service;
use crate::domains::matches::types::{
    CreateMatchInput, FixturesResponse, MatchListQuery, MatchListResponse, UpdateMatchInput,
};
use crate::error::AppError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::state::AppState;

/// `GET /tournaments/{id}/matches?stage&status`
pub async fn list(
    State(state): State<AppState>,
    _caller: AuthUser,
    AppPath(tournament_id): AppPath<Uuid>,
    AppQuery(query): AppQuery<MatchListQuery>,
) -> Result<Json<MatchListResponse>, AppError> {
    let filter = MatchFilter {
        stage: query
            .stage
            .as_deref()
            .map(str::parse::<MatchStage>)
            .transpose()
            .map_err(AppError::BadRequest)?,
        status: query
            .status
            .as_deref()
            .map(str::parse::<MatchStatus>)
            .transpose()
            .map_err(AppError::BadRequest)?,
        group_id: None,
    };

    let response = service::list_matches(&state.db, tournament_id, filter).await?;
    Ok(Json(response))
}

/// `POST /tournaments/{id}/matches`
pub async fn create(
    State(state): State<AppState>,
    caller: AuthUser,
    AppPath(tournament_id): AppPath<Uuid>,
    AppJson(input): AppJson<CreateMatchInput>,
) -> Result<(StatusCode, Json<TournamentMatchRow>), AppError> {
    caller.require_any_role(Role::STAFF)?;

    let row = service::create_match(&state.db, tournament_id, input).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// `PUT /tournaments/matches/{match_id}`
pub async fn update(
    State(state): State<AppState>,
    caller: AuthUser,
    AppPath(match_id): AppPath<Uuid>,
    AppJson(input): AppJson<UpdateMatchInput>,
) -> Result<Json<TournamentMatchRow>, AppError> {
    caller.require_any_role(Role::STAFF)?;

    let row = service::update_match(&state.db, match_id, input).await?;
    Ok(Json(row))
}

/// `POST /tournaments/{id}/groups/matches`: round-robin fixtures for every group.
pub async fn generate_fixtures(
    State(state): State<AppState>,
    caller: AuthUser,
    AppPath(tournament_id): AppPath<Uuid>,
) -> Result<(StatusCode, Json<FixturesResponse>), AppError> {
    caller.require_any_role(Role::STAFF)?;

    let matches = service::generate_group_fixtures(&state.db, tournament_id).await?;
    let count = matches.len();
    Ok((StatusCode::CREATED, Json(FixturesResponse { matches, count })))
}
