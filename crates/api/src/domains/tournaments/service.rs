use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use infra::models::{TournamentParticipantRow, TournamentRow};
use infra::repos::tournaments::CreateTournamentData;
use infra::repos::{
    tournament_participants, tournaments, CreateTournamentParticipant, ParticipantStatus,
    TournamentPhase, TournamentRepo,
};

use crate::auth::AuthUser;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct CreateTournamentInput {
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub max_participants: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct PhaseInput {
    pub phase: TournamentPhase,
}

#[derive(Debug, Deserialize)]
pub struct RegisterParticipantInput {
    pub user_id: Option<Uuid>,
    pub seed: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateParticipantInput {
    pub status: Option<ParticipantStatus>,
    pub seed: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ParticipantListQuery {
    pub status: Option<String>,
}

pub fn validate_new_tournament(input: &CreateTournamentInput) -> Result<(), AppError> {
    if input.name.trim().is_empty() {
        return Err(AppError::BadRequest("Tournament name is required".to_string()));
    }
    if let (Some(start), Some(end)) = (input.start_date, input.end_date) {
        if end < start {
            return Err(AppError::BadRequest(
                "end_date cannot be before start_date".to_string(),
            ));
        }
    }
    if input.max_participants.is_some_and(|max| max < 2) {
        return Err(AppError::BadRequest(
            "max_participants must be at least 2".to_string(),
        ));
    }
    Ok(())
}

/// Reject anything but a forward move.
pub fn check_phase_transition(
    current: TournamentPhase,
    next: TournamentPhase,
) -> Result<(), AppError> {
    if current.can_advance_to(next) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "Tournament cannot move from {} to {}",
            current.as_str(),
            next.as_str()
        )))
    }
}

pub async fn create_tournament(
    pool: &PgPool,
    input: CreateTournamentInput,
) -> Result<TournamentRow, AppError> {
    validate_new_tournament(&input)?;

    let row = TournamentRepo::new(pool.clone())
        .create(CreateTournamentData {
            name: input.name.trim().to_string(),
            description: input.description,
            start_date: input.start_date,
            end_date: input.end_date,
            max_participants: input.max_participants,
        })
        .await?;
    tracing::info!(tournament_id = %row.id, name = %row.name, "Tournament created");
    Ok(row)
}

pub async fn get_tournament(pool: &PgPool, tournament_id: Uuid) -> Result<TournamentRow, AppError> {
    TournamentRepo::new(pool.clone())
        .get(tournament_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Tournament {tournament_id} not found")))
}

pub async fn advance_phase(
    pool: &PgPool,
    tournament_id: Uuid,
    next: TournamentPhase,
) -> Result<TournamentRow, AppError> {
    let mut tx = pool.begin().await?;

    let current = tournaments::get_by_id_for_update(&mut *tx, tournament_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Tournament {tournament_id} not found")))?;
    check_phase_transition(current.phase, next)?;

    let updated = tournaments::set_phase(&mut *tx, tournament_id, next).await?;
    tx.commit().await?;

    tracing::info!(
        %tournament_id,
        from = current.phase.as_str(),
        to = next.as_str(),
        "Tournament phase changed"
    );
    Ok(updated)
}

/// Register a player. Members register themselves; staff may register
/// anyone and set a seed.
pub async fn register_participant(
    pool: &PgPool,
    caller: &AuthUser,
    tournament_id: Uuid,
    input: RegisterParticipantInput,
) -> Result<TournamentParticipantRow, AppError> {
    let user_id = input.user_id.unwrap_or(caller.user_id);
    if (user_id != caller.user_id || input.seed.is_some()) && !caller.is_staff() {
        return Err(AppError::Forbidden(
            "Only academy staff can register other players or assign seeds".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    let tournament = tournaments::get_by_id_for_update(&mut *tx, tournament_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Tournament {tournament_id} not found")))?;
    if !tournament.phase.accepts_registrations() {
        return Err(AppError::BadRequest(
            "Registrations are closed for this tournament".to_string(),
        ));
    }

    if tournament_participants::get_by_tournament_and_user(&mut *tx, tournament_id, user_id)
        .await?
        .is_some()
    {
        return Err(AppError::BadRequest(
            "Player is already registered for this tournament".to_string(),
        ));
    }

    if let Some(max) = tournament.max_participants {
        let active = tournament_participants::list_by_tournament(&mut *tx, tournament_id, None)
            .await?
            .into_iter()
            .filter(|p| p.status != ParticipantStatus::Withdrawn)
            .count();
        if active >= max as usize {
            return Err(AppError::BadRequest(format!(
                "Tournament is full ({max} participants)"
            )));
        }
    }

    let row = tournament_participants::create(
        &mut *tx,
        CreateTournamentParticipant {
            tournament_id,
            user_id,
            seed: input.seed,
        },
    )
    .await?;
    tx.commit().await?;

    tracing::info!(%tournament_id, %user_id, "Participant registered");
    Ok(row)
}

pub async fn list_participants(
    pool: &PgPool,
    tournament_id: Uuid,
    status: Option<ParticipantStatus>,
) -> Result<Vec<TournamentParticipantRow>, AppError> {
    get_tournament(pool, tournament_id).await?;
    Ok(tournament_participants::list_by_tournament(pool, tournament_id, status).await?)
}

/// Participants are never deleted; withdrawal and elimination are status changes.
pub async fn update_participant(
    pool: &PgPool,
    participant_id: Uuid,
    input: UpdateParticipantInput,
) -> Result<TournamentParticipantRow, AppError> {
    if input.seed.is_some_and(|seed| seed < 1) {
        return Err(AppError::BadRequest("seed must be at least 1".to_string()));
    }

    tournament_participants::update_status_and_seed(pool, participant_id, input.status, input.seed)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Participant {participant_id} not found")))
}
