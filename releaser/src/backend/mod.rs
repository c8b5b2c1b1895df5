//! Fleet backend gateway
//!
//! Everything the release tool reads from or writes to the fleet-management
//! service goes through [`FleetBackend`]. Calls are awaited one at a time by
//! the callers; implementations own their own timeouts and retries.

use async_trait::async_trait;

use fleet_api_client::models::{
    Application, Device, DeviceTag, DeviceType, EnvironmentVariable, Release, Service,
};

use crate::envvars::scope::{EnvVarKind, EnvVarOwner};
use crate::errors::ReleaserError;

/// Fleet backend trait for testability
#[async_trait]
pub trait FleetBackend: Send + Sync {
    /// Get an application; fails with `ApplicationNotFound`
    async fn get_application(&self, app_id: u64) -> Result<Application, ReleaserError>;

    /// Get a device type; fails with `ResourceNotFound`
    async fn get_device_type(&self, id: u64) -> Result<DeviceType, ReleaserError>;

    /// Get a release; fails with `ResourceNotFound`
    async fn get_release(&self, id: u64) -> Result<Release, ReleaserError>;

    /// All devices of the application
    async fn get_all_devices(&self, app_id: u64) -> Result<Vec<Device>, ReleaserError>;

    /// All device tags of the application
    async fn get_device_tags(&self, app_id: u64) -> Result<Vec<DeviceTag>, ReleaserError>;

    /// All releases of the application, whatever their status
    async fn get_releases(&self, app_id: u64) -> Result<Vec<Release>, ReleaserError>;

    /// Services of the application
    async fn get_services(&self, app_id: u64) -> Result<Vec<Service>, ReleaserError>;

    /// Pin a device to a commit, or unpin it with `None`
    async fn set_device_release(
        &self,
        uuid: &str,
        commit: Option<&str>,
    ) -> Result<(), ReleaserError>;

    /// Set the release the whole fleet runs, or clear it with `None`
    async fn set_app_release(&self, app_id: u64, commit: Option<&str>)
        -> Result<(), ReleaserError>;

    async fn enable_rolling_updates(&self, app_id: u64) -> Result<(), ReleaserError>;

    async fn disable_rolling_updates(&self, app_id: u64) -> Result<(), ReleaserError>;

    /// Environment variables defined for one owner
    async fn get_env_vars(
        &self,
        owner: EnvVarOwner,
    ) -> Result<Vec<EnvironmentVariable>, ReleaserError>;

    async fn remove_env_var(&self, kind: EnvVarKind, id: u64) -> Result<(), ReleaserError>;
}
