//! Error types for the release tool

use thiserror::Error;

/// Main error type for the release tool
#[derive(Error, Debug)]
pub enum ReleaserError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error: {status} - {body}")]
    ApiError { status: u16, body: String },

    #[error("Application not found: {0}")]
    ApplicationNotFound(u64),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Invalid release commit: {0}")]
    InvalidCommit(String),

    #[error("Invalid release group: {}", .0.join(", "))]
    InvalidGroup(Vec<String>),

    #[error("The environment {0} model selected is invalid")]
    InvalidScope(String),

    /// `owner` reads like "any of the devices" or "the fleet"
    #[error("The variable {name} does not exist in {owner}")]
    VariableNotFound { name: String, owner: String },

    #[error("No environment variable {0} matches the condition")]
    NoMatch(String),

    #[error("A service name is required for the {0} environment model")]
    MissingServiceName(String),

    #[error("Device {device_id} has conflicting {tag_key} tags: {first} and {second}")]
    ConflictingGroupTags {
        device_id: u64,
        tag_key: String,
        first: String,
        second: String,
    },

    #[error("Device {device_id} has its {tag_key} tag set to the reserved group name None")]
    ReservedGroupName { device_id: u64, tag_key: String },

    #[error("Unsupported grouping strategy: {0}")]
    UnsupportedStrategy(String),

    #[error("Missing required flag: {0}")]
    MissingFlag(String),

    #[error("Cancelled!")]
    Cancelled,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ReleaserError {
    /// Process exit code for the command line front end
    pub fn exit_code(&self) -> i32 {
        match self {
            ReleaserError::Cancelled => 1,
            ReleaserError::InvalidCommit(_) => 2,
            ReleaserError::InvalidGroup(_) => 3,
            ReleaserError::MissingFlag(_) => 4,
            _ => 1,
        }
    }
}

impl From<anyhow::Error> for ReleaserError {
    fn from(err: anyhow::Error) -> Self {
        ReleaserError::Internal(format!("{err:#}"))
    }
}
