//! Release groups and rollouts

pub mod engine;
pub mod groups;
pub mod outcome;
