pub mod service;
pub mod types;

pub use service::{organize_rounds, plan_update, round_robin_rounds};
pub use types::{CreateMatchInput, MatchListQuery, RoundMatches, UpdateMatchInput};
