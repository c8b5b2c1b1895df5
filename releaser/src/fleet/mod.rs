//! Fleet state

pub mod reader;
