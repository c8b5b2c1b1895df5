//! Environment variable API client

use fleet_api_client::models::EnvironmentVariable;

use crate::envvars::scope::{EnvVarKind, EnvVarOwner};
use crate::errors::ReleaserError;
use crate::http::client::HttpClient;

impl HttpClient {
    /// Get the environment variables of one owner
    pub async fn fetch_env_vars(
        &self,
        owner: EnvVarOwner,
    ) -> Result<Vec<EnvironmentVariable>, ReleaserError> {
        let filter = match owner {
            EnvVarOwner::Application { app_id } => format!("application eq {}", app_id),
            EnvVarOwner::Service { service_id } => format!("service eq {}", service_id),
            EnvVarOwner::Device { device_id } => format!("device eq {}", device_id),
            EnvVarOwner::DeviceService {
                device_id,
                service_id,
            } => format!(
                "service_install/any(si:si/device eq {} and si/installs__service eq {})",
                device_id, service_id
            ),
        };
        self.list(owner.kind().resource(), filter, "id,name,value")
            .await
    }

    /// Delete an environment variable
    pub async fn delete_env_var(&self, kind: EnvVarKind, id: u64) -> Result<(), ReleaserError> {
        let url = self.resource_url(&format!("{}({})", kind.resource(), id), &[])?;
        self.delete(url).await
    }
}
