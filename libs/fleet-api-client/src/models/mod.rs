//! API models
//!
//! Shapes returned by the fleet-management service's pine (OData) endpoints.
//! Links to other resources come back as `{"__id": n}` objects and list
//! responses are wrapped in a `{"d": [...]}` envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reference to another resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PineRef {
    #[serde(rename = "__id")]
    pub id: u64,
}

impl PineRef {
    pub fn new(id: u64) -> Self {
        Self { id }
    }
}

/// Envelope wrapping every pine read
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PineResponse<T> {
    pub d: Vec<T>,
}

impl<T> PineResponse<T> {
    /// Take the single row of a by-id lookup, if any
    pub fn into_first(self) -> Option<T> {
        self.d.into_iter().next()
    }
}

/// Application (fleet)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: u64,
    pub app_name: String,
    #[serde(rename = "is_for__device_type")]
    pub device_type: PineRef,
    /// Release the whole fleet should be running
    #[serde(rename = "should_be_running__release", default)]
    pub release: Option<PineRef>,
    #[serde(default)]
    pub should_track_latest_release: bool,
}

/// Device type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceType {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub slug: Option<String>,
    pub name: String,
}

/// Device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: u64,
    pub uuid: String,
    #[serde(default)]
    pub device_name: String,
    #[serde(rename = "belongs_to__application", default)]
    pub application: Option<PineRef>,
    /// Release the device is pinned to; `None` tracks the fleet release
    #[serde(
        rename = "is_pinned_on__release",
        alias = "should_be_running__release",
        default
    )]
    pub pinned_release: Option<PineRef>,
}

impl Device {
    pub fn is_pinned(&self) -> bool {
        self.pinned_release.is_some()
    }
}

/// Tag attached to a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceTag {
    #[serde(default)]
    pub id: u64,
    pub device: PineRef,
    pub tag_key: String,
    #[serde(default)]
    pub value: String,
}

/// Release build status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseStatus {
    Success,
    Failed,
    Running,
    Cancelled,
    Error,
    Interrupted,
    #[serde(other)]
    Unknown,
}

/// Release
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    pub id: u64,
    pub commit: String,
    pub status: ReleaseStatus,
    #[serde(default)]
    pub end_timestamp: Option<DateTime<Utc>>,
}

impl Release {
    pub fn is_successful(&self) -> bool {
        self.status == ReleaseStatus::Success
    }
}

/// Service defined by the application's compose file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: u64,
    pub service_name: String,
}

/// Environment variable, regardless of the resource it was read from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentVariable {
    pub id: u64,
    pub name: String,
    pub value: String,
}
