pub mod bookings;
pub mod matches;
pub mod tournaments;
