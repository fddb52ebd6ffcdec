pub mod service;

pub use service::{assign_groups, generate_groups, group_label, DrawnGroup, GroupDrawParams, GroupSlot};
