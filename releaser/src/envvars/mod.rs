//! Environment variable filtering and removal

pub mod remover;
pub mod scope;
