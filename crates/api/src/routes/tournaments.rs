use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use infra::models::{TournamentParticipantRow, TournamentRow};
use infra::repos::ParticipantStatus;

use crate::auth::{AuthUser, Role};
use crate::domains::groups::{generate_groups, DrawnGroup, GroupDrawParams};
use crate::domains::standings::{group_standings, list_groups_with_standings, GroupWithStandings, Standing};
use crate::domains::tournaments::service::{
    self, CreateTournamentInput, ParticipantListQuery, PhaseInput, RegisterParticipantInput,
    UpdateParticipantInput,
};
use crate::error::AppError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct GroupsResponse<T> {
    pub groups: Vec<T>,
}

#[derive(Debug, Serialize)]
pub struct StandingsResponse {
    pub group_id: Uuid,
    pub standings: Vec<Standing>,
}

/// `POST /tournaments`
pub async fn create(
    State(state): State<AppState>,
    caller: AuthUser,
    AppJson(input): AppJson<CreateTournamentInput>,
) -> Result<(StatusCode, Json<TournamentRow>), AppError> {
    caller.require_any_role(Role::MANAGEMENT)?;

    let row = service::create_tournament(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// `GET /tournaments/{id}`
pub async fn get(
    State(state): State<AppState>,
    _caller: AuthUser,
    AppPath(tournament_id): AppPath<Uuid>,
) -> Result<Json<TournamentRow>, AppError> {
    Ok(Json(service::get_tournament(&state.db, tournament_id).await?))
}

/// `POST /tournaments/{id}/phase`
pub async fn advance_phase(
    State(state): State<AppState>,
    caller: AuthUser,
    AppPath(tournament_id): AppPath<Uuid>,
    AppJson(input): AppJson<PhaseInput>,
) -> Result<Json<TournamentRow>, AppError> {
    caller.require_any_role(Role::MANAGEMENT)?;

    let row = service::advance_phase(&state.db, tournament_id, input.phase).await?;
    Ok(Json(row))
}

/// `GET /tournaments/{id}/participants`
pub async fn list_participants(
    State(state): State<AppState>,
    _caller: AuthUser,
    AppPath(tournament_id): AppPath<Uuid>,
    AppQuery(query): AppQuery<ParticipantListQuery>,
) -> Result<Json<Vec<TournamentParticipantRow>>, AppError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<ParticipantStatus>)
        .transpose()
        .map_err(AppError::BadRequest)?;

    let rows = service::list_participants(&state.db, tournament_id, status).await?;
    Ok(Json(rows))
}

/// `POST /tournaments/{id}/participants`
pub async fn register_participant(
    State(state): State<AppState>,
    caller: AuthUser,
    AppPath(tournament_id): AppPath<Uuid>,
    AppJson(input): AppJson<RegisterParticipantInput>,
) -> Result<(StatusCode, Json<TournamentParticipantRow>), AppError> {
    let row = service::register_participant(&state.db, &caller, tournament_id, input).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// `PUT /tournaments/participants/{participant_id}`
pub async fn update_participant(
    State(state): State<AppState>,
    caller: AuthUser,
    AppPath(participant_id): AppPath<Uuid>,
    AppJson(input): AppJson<UpdateParticipantInput>,
) -> Result<Json<TournamentParticipantRow>, AppError> {
    caller.require_any_role(Role::MANAGEMENT)?;

    let row = service::update_participant(&state.db, participant_id, input).await?;
    Ok(Json(row))
}

/// `GET /tournaments/{id}/groups`
pub async fn list_groups(
    State(state): State<AppState>,
    _caller: AuthUser,
    AppPath(tournament_id): AppPath<Uuid>,
) -> Result<Json<GroupsResponse<GroupWithStandings>>, AppError> {
    service::get_tournament(&state.db, tournament_id).await?;

    let groups = list_groups_with_standings(&state.db, state.standings(), tournament_id).await?;
    Ok(Json(GroupsResponse { groups }))
}

/// `POST /tournaments/{id}/groups`
pub async fn draw_groups(
    State(state): State<AppState>,
    caller: AuthUser,
    AppPath(tournament_id): AppPath<Uuid>,
    AppJson(params): AppJson<GroupDrawParams>,
) -> Result<(StatusCode, Json<GroupsResponse<DrawnGroup>>), AppError> {
    caller.require_any_role(Role::MANAGEMENT)?;

    let mut rng = state.draw_rng();
    let groups = generate_groups(&state.db, &mut rng, tournament_id, params).await?;
    Ok((StatusCode::CREATED, Json(GroupsResponse { groups })))
}

/// `GET /tournaments/groups/{group_id}/standings`
pub async fn standings(
    State(state): State<AppState>,
    _caller: AuthUser,
    AppPath(group_id): AppPath<Uuid>,
) -> Result<Json<StandingsResponse>, AppError> {
    let standings = group_standings(&state.db, state.standings(), group_id).await?;
    Ok(Json(StandingsResponse {
        group_id,
        standings,
    }))
}
