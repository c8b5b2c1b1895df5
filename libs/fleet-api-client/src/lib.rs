//! Fleet API client models

pub mod models;

pub use models::*;
