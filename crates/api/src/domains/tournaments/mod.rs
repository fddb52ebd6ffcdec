pub mod service;

pub use service::{check_phase_transition, validate_new_tournament};
