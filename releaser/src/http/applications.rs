//! Application, release and service API client

use fleet_api_client::models::{Application, DeviceType, Release, Service};

use crate::errors::ReleaserError;
use crate::http::client::HttpClient;
use crate::utils::odata_literal;

const APPLICATION_SELECT: &str =
    "id,app_name,is_for__device_type,should_be_running__release,should_track_latest_release";
const RELEASE_SELECT: &str = "id,commit,status,end_timestamp";

impl HttpClient {
    /// Get an application by id
    pub async fn fetch_application(&self, app_id: u64) -> Result<Application, ReleaserError> {
        self.first("application", format!("id eq {}", app_id), APPLICATION_SELECT)
            .await?
            .ok_or(ReleaserError::ApplicationNotFound(app_id))
    }

    /// Get a device type by id
    pub async fn fetch_device_type(&self, id: u64) -> Result<DeviceType, ReleaserError> {
        self.first("device_type", format!("id eq {}", id), "id,slug,name")
            .await?
            .ok_or_else(|| ReleaserError::ResourceNotFound(format!("device_type {}", id)))
    }

    /// Get a release by id
    pub async fn fetch_release(&self, id: u64) -> Result<Release, ReleaserError> {
        self.first("release", format!("id eq {}", id), RELEASE_SELECT)
            .await?
            .ok_or_else(|| ReleaserError::ResourceNotFound(format!("release {}", id)))
    }

    /// Get every release of an application
    pub async fn fetch_releases(&self, app_id: u64) -> Result<Vec<Release>, ReleaserError> {
        self.list(
            "release",
            format!("belongs_to__application eq {}", app_id),
            RELEASE_SELECT,
        )
        .await
    }

    /// Get the services of an application
    pub async fn fetch_services(&self, app_id: u64) -> Result<Vec<Service>, ReleaserError> {
        self.list(
            "service",
            format!("application eq {}", app_id),
            "id,service_name",
        )
        .await
    }

    /// Resolve a commit of an application to its release id
    pub async fn resolve_release_id(
        &self,
        app_id: u64,
        commit: &str,
    ) -> Result<u64, ReleaserError> {
        let release: Option<Release> = self
            .first(
                "release",
                format!(
                    "belongs_to__application eq {} and commit eq {}",
                    app_id,
                    odata_literal(commit)
                ),
                RELEASE_SELECT,
            )
            .await?;

        release
            .map(|release| release.id)
            .ok_or_else(|| ReleaserError::ResourceNotFound(format!("release {}", commit)))
    }

    /// Patch fields of an application
    pub async fn patch_application(
        &self,
        app_id: u64,
        body: &serde_json::Value,
    ) -> Result<(), ReleaserError> {
        let url = self.resource_url("application", &[("$filter", format!("id eq {}", app_id))])?;
        self.patch(url, body).await
    }

    /// Set the release an application should be running
    pub async fn update_app_release(
        &self,
        app_id: u64,
        commit: Option<&str>,
    ) -> Result<(), ReleaserError> {
        let release_id = match commit {
            Some(commit) => Some(self.resolve_release_id(app_id, commit).await?),
            None => None,
        };
        let body = serde_json::json!({ "should_be_running__release": release_id });
        self.patch_application(app_id, &body).await
    }

    /// Toggle whether the application tracks its latest release
    pub async fn update_rolling_updates(
        &self,
        app_id: u64,
        enabled: bool,
    ) -> Result<(), ReleaserError> {
        let body = serde_json::json!({ "should_track_latest_release": enabled });
        self.patch_application(app_id, &body).await
    }
}
