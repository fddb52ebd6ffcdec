pub mod bookings;
pub mod groups;
pub mod matches;
pub mod standings;
pub mod tournaments;
