//! HTTP access to the fleet-management service

pub mod applications;
pub mod backend;
pub mod client;
pub mod devices;
pub mod env_vars;
