use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Half-open interval `[start, end)`. Construction guarantees `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, AppError> {
        if start >= end {
            return Err(AppError::BadRequest(format!(
                "start_time ({start}) must be before end_time ({end})"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// `[s1, e1)` and `[s2, e2)` overlap iff `s1 < e2 && e1 > s2`.
    /// Back-to-back ranges (`e1 == s2`) do not overlap.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && self.end > other.start
    }
}

/// One slot a caller wants to occupy.
#[derive(Debug, Clone)]
pub struct SlotRequest {
    pub user_id: Uuid,
    pub court: String,
    pub range: TimeRange,
    pub notes: Option<String>,
}

/// A requested slot that cannot be booked, with how many reservations
/// (or other slots of the same batch) it collides with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotConflict {
    pub index: usize,
    pub court: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub conflict_count: usize,
}

/// Result of a write that may be refused by the no-double-booking rule.
/// A refusal is a normal outcome, not an error.
#[derive(Debug)]
pub enum BookingOutcome<T> {
    Accepted(T),
    Rejected(Vec<SlotConflict>),
}

#[derive(Serialize)]
struct ConflictBody {
    error: String,
    conflicts: Vec<SlotConflict>,
    conflict_count: usize,
}

/// 409 response listing every conflicting slot.
pub struct ConflictResponse(pub Vec<SlotConflict>);

impl IntoResponse for ConflictResponse {
    fn into_response(self) -> Response {
        let conflict_count = self.0.len();
        (
            StatusCode::CONFLICT,
            Json(ConflictBody {
                error: "The requested time slot overlaps an existing confirmed booking".to_string(),
                conflicts: self.0,
                conflict_count,
            }),
        )
            .into_response()
    }
}

impl<T: Serialize> BookingOutcome<T> {
    /// Render as `success` on acceptance or 409 on rejection.
    pub fn into_response_with(self, success: StatusCode) -> Response {
        match self {
            BookingOutcome::Accepted(body) => (success, Json(body)).into_response(),
            BookingOutcome::Rejected(conflicts) => ConflictResponse(conflicts).into_response(),
        }
    }
}

// --- HTTP payloads ---

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: Option<String>,
    pub court: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SlotDescriptor {
    pub date: NaiveDate,
    pub court: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub available: bool,
    pub slot: SlotDescriptor,
    pub conflicting_bookings: usize,
}

#[derive(Debug, Deserialize)]
pub struct CreateBookingInput {
    pub user_id: Option<Uuid>,
    pub court: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BatchBookingItem {
    pub user_id: Uuid,
    pub court: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BatchBookingInput {
    pub bookings: Vec<BatchBookingItem>,
}

#[derive(Debug, Serialize)]
pub struct BatchBookingResponse {
    pub bookings: Vec<infra::models::ReservationRow>,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct CourtBlockInput {
    pub court: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BookingListQuery {
    pub court: Option<String>,
    pub date: Option<NaiveDate>,
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Accepts `HH:MM` or `HH:MM:SS`.
pub fn parse_time_of_day(value: &str) -> Result<NaiveTime, AppError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| AppError::BadRequest(format!("Invalid time '{value}', expected HH:MM")))
}

pub fn parse_date(value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("Invalid date '{value}', expected YYYY-MM-DD")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 14, hour, minute, 0).unwrap()
    }

    fn range(start: (u32, u32), end: (u32, u32)) -> TimeRange {
        TimeRange::new(at(start.0, start.1), at(end.0, end.1)).unwrap()
    }

    #[test]
    fn overlap_matches_half_open_predicate() {
        let hours = [8, 9, 10, 11, 12];
        for &s1 in &hours {
            for &e1 in hours.iter().filter(|&&e| e > s1) {
                for &s2 in &hours {
                    for &e2 in hours.iter().filter(|&&e| e > s2) {
                        let a = range((s1, 0), (e1, 0));
                        let b = range((s2, 0), (e2, 0));
                        assert_eq!(a.overlaps(&b), s1 < e2 && e1 > s2);
                        assert_eq!(a.overlaps(&b), b.overlaps(&a));
                    }
                }
            }
        }
    }

    #[test]
    fn adjacent_ranges_do_not_overlap() {
        let morning = range((9, 0), (10, 0));
        let next = range((10, 0), (11, 0));
        assert!(!morning.overlaps(&next));
        assert!(!next.overlaps(&morning));
    }

    #[test]
    fn empty_or_inverted_range_is_rejected() {
        assert!(matches!(
            TimeRange::new(at(10, 0), at(10, 0)),
            Err(AppError::BadRequest(_))
        ));
        assert!(TimeRange::new(at(11, 0), at(10, 0)).is_err());
    }

    #[test]
    fn parses_short_and_long_times() {
        assert_eq!(
            parse_time_of_day("09:30").unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap()
        );
        assert_eq!(
            parse_time_of_day("18:00:00").unwrap(),
            NaiveTime::from_hms_opt(18, 0, 0).unwrap()
        );
        assert!(parse_time_of_day("25:00").is_err());
        assert!(parse_date("2025-02-30").is_err());
    }
}
