use std::collections::{BTreeSet, HashMap};

use sqlx::PgPool;
use uuid::Uuid;

use infra::db::{has_sqlstate, EXCLUSION_VIOLATION};
use infra::models::ReservationRow;
use infra::pagination::LimitOffset;
use infra::repos::{reservations, CreateReservation, ReservationFilter, ReservationStatus};

use super::types::{BookingOutcome, SlotConflict, SlotRequest, TimeRange};
use crate::auth::AuthUser;
use crate::error::AppError;

/// Reservations on `court` that overlap `range` and are blocking (see
/// [`ReservationRow::is_blocking`]). Pending requests never block anybody.
pub fn confirmed_conflicts<'a>(
    court: &str,
    range: &TimeRange,
    existing: &'a [ReservationRow],
) -> Vec<&'a ReservationRow> {
    existing
        .iter()
        .filter(|r| r.court == court && r.is_blocking())
        .filter(|r| {
            TimeRange::new(r.start_time, r.end_time)
                .map(|other| other.overlaps(range))
                .unwrap_or(false)
        })
        .collect()
}

/// Check every slot of a batch before anything is written. A slot conflicts
/// when it overlaps a confirmed reservation or another slot of the same
/// batch on the same court. An empty result means the whole batch may go in.
pub fn plan_batch(requests: &[SlotRequest], existing: &[ReservationRow]) -> Vec<SlotConflict> {
    requests
        .iter()
        .enumerate()
        .filter_map(|(index, request)| {
            let stored = confirmed_conflicts(&request.court, &request.range, existing).len();
            let sibling = requests
                .iter()
                .enumerate()
                .filter(|(other_index, other)| {
                    *other_index != index
                        && other.court == request.court
                        && other.range.overlaps(&request.range)
                })
                .count();

            let conflict_count = stored + sibling;
            (conflict_count > 0).then(|| SlotConflict {
                index,
                court: request.court.clone(),
                start_time: request.range.start(),
                end_time: request.range.end(),
                conflict_count,
            })
        })
        .collect()
}

/// Result of a read-only availability probe.
#[derive(Debug, Clone, Copy)]
pub struct Availability {
    pub available: bool,
    pub conflicting_bookings: usize,
}

pub async fn check_availability(
    pool: &PgPool,
    court: &str,
    range: TimeRange,
) -> Result<Availability, AppError> {
    let existing =
        reservations::list_overlapping(pool, court, range.start(), range.end(), None).await?;
    let conflicting_bookings = confirmed_conflicts(court, &range, &existing).len();

    Ok(Availability {
        available: conflicting_bookings == 0,
        conflicting_bookings,
    })
}

/// Kind of single-slot write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    /// Member request, waits for a manager.
    Pending,
    /// Administrative court block, confirmed on creation.
    Block,
}

/// Insert one reservation after checking it against confirmed ones.
///
/// The check and the insert share a transaction holding the court's
/// advisory lock, so two writers can't both pass the check. The database
/// exclusion constraint backs this up for confirmed rows.
pub async fn create_slot(
    pool: &PgPool,
    request: SlotRequest,
    kind: SlotKind,
) -> Result<BookingOutcome<ReservationRow>, AppError> {
    let mut tx = pool.begin().await?;
    reservations::lock_court(&mut *tx, &request.court).await?;

    let existing = reservations::list_overlapping(
        &mut *tx,
        &request.court,
        request.range.start(),
        request.range.end(),
        None,
    )
    .await?;

    let conflicts = plan_batch(std::slice::from_ref(&request), &existing);
    if !conflicts.is_empty() {
        tracing::info!(
            court = %request.court,
            start = %request.range.start(),
            "Booking rejected: slot overlaps a confirmed reservation"
        );
        return Ok(BookingOutcome::Rejected(conflicts));
    }

    let data = CreateReservation {
        user_id: request.user_id,
        court: request.court.clone(),
        start_time: request.range.start(),
        end_time: request.range.end(),
        manager_confirmed: kind == SlotKind::Block,
        is_block: kind == SlotKind::Block,
        notes: request.notes.clone(),
    };

    match reservations::create(&mut *tx, data).await {
        Ok(row) => {
            tx.commit().await?;
            Ok(BookingOutcome::Accepted(row))
        }
        Err(e) if has_sqlstate(&e, EXCLUSION_VIOLATION) => {
            Ok(BookingOutcome::Rejected(vec![constraint_conflict(0, &request)]))
        }
        Err(e) => Err(e.into()),
    }
}

/// Insert a batch of staff bookings, all or nothing.
///
/// Every affected court is locked (in sorted order, so concurrent batches
/// can't deadlock), every slot is checked, and only then are rows written.
/// Any conflict rolls the transaction back with nothing persisted.
pub async fn create_batch(
    pool: &PgPool,
    requests: Vec<SlotRequest>,
) -> Result<BookingOutcome<Vec<ReservationRow>>, AppError> {
    if requests.is_empty() {
        return Err(AppError::BadRequest(
            "At least one booking is required".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    let courts: BTreeSet<&str> = requests.iter().map(|r| r.court.as_str()).collect();
    for court in &courts {
        reservations::lock_court(&mut *tx, court).await?;
    }

    // Same row can overlap several requested slots; keep one copy of each.
    let mut existing: HashMap<Uuid, ReservationRow> = HashMap::new();
    for request in &requests {
        let rows = reservations::list_overlapping(
            &mut *tx,
            &request.court,
            request.range.start(),
            request.range.end(),
            None,
        )
        .await?;
        existing.extend(rows.into_iter().map(|row| (row.id, row)));
    }
    let existing: Vec<ReservationRow> = existing.into_values().collect();

    let conflicts = plan_batch(&requests, &existing);
    if !conflicts.is_empty() {
        tracing::info!(
            requested = requests.len(),
            conflicts = conflicts.len(),
            "Batch booking rejected, nothing inserted"
        );
        tx.rollback().await?;
        return Ok(BookingOutcome::Rejected(conflicts));
    }

    let mut inserted = Vec::with_capacity(requests.len());
    for (index, request) in requests.iter().enumerate() {
        let data = CreateReservation {
            user_id: request.user_id,
            court: request.court.clone(),
            start_time: request.range.start(),
            end_time: request.range.end(),
            manager_confirmed: true,
            is_block: false,
            notes: request.notes.clone(),
        };
        match reservations::create(&mut *tx, data).await {
            Ok(row) => inserted.push(row),
            Err(e) if has_sqlstate(&e, EXCLUSION_VIOLATION) => {
                tx.rollback().await?;
                return Ok(BookingOutcome::Rejected(vec![constraint_conflict(
                    index, request,
                )]));
            }
            Err(e) => return Err(e.into()),
        }
    }

    tx.commit().await?;
    tracing::info!(count = inserted.len(), "Batch booking inserted");
    Ok(BookingOutcome::Accepted(inserted))
}

/// Promote a pending reservation to confirmed, re-checking it against the
/// reservations confirmed since it was requested.
pub async fn confirm_booking(
    pool: &PgPool,
    reservation_id: Uuid,
) -> Result<BookingOutcome<ReservationRow>, AppError> {
    let mut tx = pool.begin().await?;

    let current = reservations::get_by_id_for_update(&mut *tx, reservation_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Booking {reservation_id} not found")))?;

    if current.status == ReservationStatus::Cancelled {
        return Err(AppError::BadRequest(
            "A cancelled booking cannot be confirmed".to_string(),
        ));
    }
    if current.manager_confirmed {
        return Ok(BookingOutcome::Accepted(current));
    }

    reservations::lock_court(&mut *tx, &current.court).await?;
    let range = TimeRange::new(current.start_time, current.end_time)?;
    let others = reservations::list_overlapping(
        &mut *tx,
        &current.court,
        range.start(),
        range.end(),
        Some(current.id),
    )
    .await?;

    let blocking = confirmed_conflicts(&current.court, &range, &others).len();
    if blocking > 0 {
        return Ok(BookingOutcome::Rejected(vec![SlotConflict {
            index: 0,
            court: current.court.clone(),
            start_time: current.start_time,
            end_time: current.end_time,
            conflict_count: blocking,
        }]));
    }

    let confirmed = match reservations::confirm(&mut *tx, current.id).await {
        Ok(row) => row,
        Err(e) if has_sqlstate(&e, EXCLUSION_VIOLATION) => {
            return Ok(BookingOutcome::Rejected(vec![SlotConflict {
                index: 0,
                court: current.court.clone(),
                start_time: current.start_time,
                end_time: current.end_time,
                conflict_count: 1,
            }]));
        }
        Err(e) => return Err(e.into()),
    };
    tx.commit().await?;

    tracing::info!(reservation_id = %confirmed.id, court = %confirmed.court, "Booking confirmed");
    Ok(BookingOutcome::Accepted(confirmed))
}

/// Cancel a reservation. Owners may cancel their own; staff may cancel any.
pub async fn cancel_booking(
    pool: &PgPool,
    caller: &AuthUser,
    reservation_id: Uuid,
) -> Result<ReservationRow, AppError> {
    let current = reservations::get_by_id(pool, reservation_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Booking {reservation_id} not found")))?;

    if current.user_id != caller.user_id && !caller.is_staff() {
        return Err(AppError::Forbidden(
            "Only the booking owner or academy staff can cancel this booking".to_string(),
        ));
    }

    reservations::cancel(pool, reservation_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Booking {reservation_id} not found")))
}

/// Members only ever see their own bookings.
pub async fn list_bookings(
    pool: &PgPool,
    caller: &AuthUser,
    mut filter: ReservationFilter,
    page: LimitOffset,
) -> Result<Vec<ReservationRow>, AppError> {
    if !caller.is_staff() {
        filter.user_id = Some(caller.user_id);
    }
    Ok(reservations::list(pool, filter, page).await?)
}

fn constraint_conflict(index: usize, request: &SlotRequest) -> SlotConflict {
    SlotConflict {
        index,
        court: request.court.clone(),
        start_time: request.range.start(),
        end_time: request.range.end(),
        conflict_count: 1,
    }
}
