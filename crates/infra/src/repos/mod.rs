pub mod reservations;
pub mod tournament_groups;
pub mod tournament_matches;
pub mod tournament_participants;
pub mod tournaments;

pub use reservations::{CreateReservation, ReservationFilter, ReservationStatus};
pub use tournament_groups::CreateTournamentGroup;
pub use tournament_matches::{CreateTournamentMatch, MatchFilter, MatchStage, MatchStatus, UpdateTournamentMatch};
pub use tournament_participants::{CreateTournamentParticipant, ParticipantStatus};
pub use tournaments::{TournamentPhase, TournamentRepo};
