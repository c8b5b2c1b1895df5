//! Fleet backend over the pine REST API

use async_trait::async_trait;

use fleet_api_client::models::{
    Application, Device, DeviceTag, DeviceType, EnvironmentVariable, Release, Service,
};

use crate::backend::FleetBackend;
use crate::envvars::scope::{EnvVarKind, EnvVarOwner};
use crate::errors::ReleaserError;
use crate::http::client::HttpClient;

#[async_trait]
impl FleetBackend for HttpClient {
    async fn get_application(&self, app_id: u64) -> Result<Application, ReleaserError> {
        self.fetch_application(app_id).await
    }

    async fn get_device_type(&self, id: u64) -> Result<DeviceType, ReleaserError> {
        self.fetch_device_type(id).await
    }

    async fn get_release(&self, id: u64) -> Result<Release, ReleaserError> {
        self.fetch_release(id).await
    }

    async fn get_all_devices(&self, app_id: u64) -> Result<Vec<Device>, ReleaserError> {
        self.fetch_devices(app_id).await
    }

    async fn get_device_tags(&self, app_id: u64) -> Result<Vec<DeviceTag>, ReleaserError> {
        self.fetch_device_tags(app_id).await
    }

    async fn get_releases(&self, app_id: u64) -> Result<Vec<Release>, ReleaserError> {
        self.fetch_releases(app_id).await
    }

    async fn get_services(&self, app_id: u64) -> Result<Vec<Service>, ReleaserError> {
        self.fetch_services(app_id).await
    }

    async fn set_device_release(
        &self,
        uuid: &str,
        commit: Option<&str>,
    ) -> Result<(), ReleaserError> {
        self.update_device_release(uuid, commit).await
    }

    async fn set_app_release(
        &self,
        app_id: u64,
        commit: Option<&str>,
    ) -> Result<(), ReleaserError> {
        self.update_app_release(app_id, commit).await
    }

    async fn enable_rolling_updates(&self, app_id: u64) -> Result<(), ReleaserError> {
        self.update_rolling_updates(app_id, true).await
    }

    async fn disable_rolling_updates(&self, app_id: u64) -> Result<(), ReleaserError> {
        self.update_rolling_updates(app_id, false).await
    }

    async fn get_env_vars(
        &self,
        owner: EnvVarOwner,
    ) -> Result<Vec<EnvironmentVariable>, ReleaserError> {
        self.fetch_env_vars(owner).await
    }

    async fn remove_env_var(&self, kind: EnvVarKind, id: u64) -> Result<(), ReleaserError> {
        self.delete_env_var(kind, id).await
    }
}
