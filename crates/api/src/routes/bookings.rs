use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration, TimeDelta};
use uuid::Uuid;

use infra::models::ReservationRow;
use infra::pagination::LimitOffset;
use infra::repos::{ReservationFilter, ReservationStatus};

use crate::auth::{AuthUser, Role};
use crate::domains::bookings::service::{self, SlotKind};
use crate::domains::bookings::types::{
    parse_date, parse_time_of_day, AvailabilityQuery, AvailabilityResponse, BatchBookingInput,
    BatchBookingResponse, BookingListQuery, BookingOutcome, ConflictResponse, CourtBlockInput,
    CreateBookingInput, SlotDescriptor, SlotRequest, TimeRange,
};
use crate::error::AppError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::state::AppState;

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, AppError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("Missing required parameter: {name}")))
}

fn court_name(raw: &str) -> Result<String, AppError> {
    let court = raw.trim();
    if court.is_empty() {
        return Err(AppError::BadRequest("court is required".to_string()));
    }
    Ok(court.to_string())
}

/// `GET /bookings/availability?date&court&start_time[&end_time]`
pub async fn availability(
    State(state): State<AppState>,
    _caller: AuthUser,
    AppQuery(query): AppQuery<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let date = parse_date(required(&query.date, "date")?)?;
    let court = court_name(required(&query.court, "court")?)?;
    let start_time = parse_time_of_day(required(&query.start_time, "start_time")?)?;
    let end_time = match query.end_time.as_deref() {
        Some(raw) => parse_time_of_day(raw)?,
        None => {
            let (end, wrapped) = start_time.overflowing_add_signed(TimeDelta::minutes(
                state.config().default_slot_minutes,
            ));
            if wrapped != 0 {
                return Err(AppError::BadRequest(
                    "Slot cannot run past midnight".to_string(),
                ));
            }
            end
        }
    };

    let range = TimeRange::new(
        date.and_time(start_time).and_utc(),
        date.and_time(end_time).and_utc(),
    )?;
    let result = service::check_availability(&state.db, &court, range).await?;

    Ok(Json(AvailabilityResponse {
        available: result.available,
        slot: SlotDescriptor {
            date,
            court,
            start_time,
            end_time,
        },
        conflicting_bookings: result.conflicting_bookings,
    }))
}

/// `GET /bookings`
pub async fn list(
    State(state): State<AppState>,
    caller: AuthUser,
    AppQuery(query): AppQuery<BookingListQuery>,
) -> Result<Json<Vec<ReservationRow>>, AppError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<ReservationStatus>)
        .transpose()
        .map_err(AppError::BadRequest)?;
    let (from, to) = match query.date {
        Some(date) => {
            let start = date.and_hms_opt(0, 0, 0).map(|d| d.and_utc());
            (start, start.map(|s| s + Duration::days(1)))
        }
        None => (None, None),
    };

    let filter = ReservationFilter {
        user_id: None,
        court: query.court,
        from,
        to,
        status,
    };
    let page = LimitOffset::from_params(query.limit, query.offset);
    let rows = service::list_bookings(&state.db, &caller, filter, page).await?;
    Ok(Json(rows))
}

/// `POST /bookings`. Pending until a manager confirms it.
pub async fn create(
    State(state): State<AppState>,
    caller: AuthUser,
    AppJson(input): AppJson<CreateBookingInput>,
) -> Result<Response, AppError> {
    let user_id = input.user_id.unwrap_or(caller.user_id);
    if user_id != caller.user_id && !caller.is_staff() {
        return Err(AppError::Forbidden(
            "Only academy staff can book on behalf of another user".to_string(),
        ));
    }

    let request = SlotRequest {
        user_id,
        court: court_name(&input.court)?,
        range: TimeRange::new(input.start_time, input.end_time)?,
        notes: input.notes,
    };
    let outcome = service::create_slot(&state.db, request, SlotKind::Pending).await?;
    Ok(outcome.into_response_with(StatusCode::CREATED))
}

/// `POST /bookings/batch`. All slots are inserted, or none.
pub async fn create_batch(
    State(state): State<AppState>,
    caller: AuthUser,
    AppJson(input): AppJson<BatchBookingInput>,
) -> Result<Response, AppError> {
    caller.require_any_role(Role::STAFF)?;

    if input.bookings.is_empty() {
        return Err(AppError::BadRequest(
            "At least one booking is required".to_string(),
        ));
    }

    let requests = input
        .bookings
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let range =
                TimeRange::new(item.start_time, item.end_time).map_err(|e| match e {
                    AppError::BadRequest(msg) => {
                        AppError::BadRequest(format!("booking #{}: {msg}", index + 1))
                    }
                    other => other,
                })?;
            Ok(SlotRequest {
                user_id: item.user_id,
                court: court_name(&item.court)?,
                range,
                notes: item.notes,
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    match service::create_batch(&state.db, requests).await? {
        BookingOutcome::Accepted(bookings) => {
            let count = bookings.len();
            Ok((
                StatusCode::CREATED,
                Json(BatchBookingResponse { bookings, count }),
            )
                .into_response())
        }
        BookingOutcome::Rejected(conflicts) => Ok(ConflictResponse(conflicts).into_response()),
    }
}

/// `POST /courts/blocks`. Takes a court out of use.
pub async fn create_court_block(
    State(state): State<AppState>,
    caller: AuthUser,
    AppJson(input): AppJson<CourtBlockInput>,
) -> Result<Response, AppError> {
    caller.require_any_role(Role::MANAGEMENT)?;

    let request = SlotRequest {
        user_id: caller.user_id,
        court: court_name(&input.court)?,
        range: TimeRange::new(input.start_time, input.end_time)?,
        notes: input.reason,
    };
    let outcome = service::create_slot(&state.db, request, SlotKind::Block).await?;
    Ok(outcome.into_response_with(StatusCode::CREATED))
}

/// `PUT /bookings/{id}/confirm`
pub async fn confirm(
    State(state): State<AppState>,
    caller: AuthUser,
    AppPath(reservation_id): AppPath<Uuid>,
) -> Result<Response, AppError> {
    caller.require_any_role(Role::MANAGEMENT)?;

    let outcome = service::confirm_booking(&state.db, reservation_id).await?;
    Ok(outcome.into_response_with(StatusCode::OK))
}

/// `PUT /bookings/{id}/cancel`
pub async fn cancel(
    State(state): State<AppState>,
    caller: AuthUser,
    AppPath(reservation_id): AppPath<Uuid>,
) -> Result<Json<ReservationRow>, AppError> {
    let row = service::cancel_booking(&state.db, &caller, reservation_id).await?;
    Ok(Json(row))
}
