//! Device API client

use fleet_api_client::models::{Device, DeviceTag};

use crate::errors::ReleaserError;
use crate::http::client::HttpClient;
use crate::utils::odata_literal;

const DEVICE_SELECT: &str = "id,uuid,device_name,belongs_to__application,is_pinned_on__release";

impl HttpClient {
    /// Get every device of an application
    pub async fn fetch_devices(&self, app_id: u64) -> Result<Vec<Device>, ReleaserError> {
        self.list(
            "device",
            format!("belongs_to__application eq {}", app_id),
            DEVICE_SELECT,
        )
        .await
    }

    /// Get a device by uuid
    pub async fn fetch_device(&self, uuid: &str) -> Result<Device, ReleaserError> {
        self.first(
            "device",
            format!("uuid eq {}", odata_literal(uuid)),
            DEVICE_SELECT,
        )
        .await?
        .ok_or_else(|| ReleaserError::ResourceNotFound(format!("device {}", uuid)))
    }

    /// Get every device tag of an application
    pub async fn fetch_device_tags(&self, app_id: u64) -> Result<Vec<DeviceTag>, ReleaserError> {
        self.list(
            "device_tag",
            format!("device/belongs_to__application eq {}", app_id),
            "id,device,tag_key,value",
        )
        .await
    }

    /// Pin a device to a commit of its own application, or unpin it
    pub async fn update_device_release(
        &self,
        uuid: &str,
        commit: Option<&str>,
    ) -> Result<(), ReleaserError> {
        let release_id = match commit {
            Some(commit) => {
                let device = self.fetch_device(uuid).await?;
                let app_id = device.application.map(|app| app.id).ok_or_else(|| {
                    ReleaserError::ResourceNotFound(format!("application of device {}", uuid))
                })?;
                Some(self.resolve_release_id(app_id, commit).await?)
            }
            None => None,
        };

        let url = self.resource_url(
            "device",
            &[("$filter", format!("uuid eq {}", odata_literal(uuid)))],
        )?;
        let body = serde_json::json!({ "is_pinned_on__release": release_id });
        self.patch(url, &body).await
    }
}
