//! In-memory caches

pub mod snapshot;
