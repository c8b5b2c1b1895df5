//! Resin release tool library
//!
//! Staged rollouts of release commits across the devices of one balena
//! application, grouped by device tags.

pub mod app;
pub mod backend;
pub mod cache;
pub mod cli;
pub mod envvars;
pub mod errors;
pub mod fleet;
pub mod http;
pub mod logs;
pub mod output;
pub mod release;
pub mod storage;
pub mod utils;
