pub mod service;
pub mod types;

pub use service::{confirmed_conflicts, plan_batch, Availability, SlotKind};
pub use types::{BookingOutcome, ConflictResponse, SlotConflict, SlotRequest, TimeRange};
