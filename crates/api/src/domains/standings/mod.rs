pub mod service;
pub mod strategy;

pub use service::{group_standings, list_groups_with_standings, GroupWithStandings};
pub use strategy::{PointsTableStrategy, Standing, StandingsStrategy};
