//! Fleet state reader

use std::sync::Arc;

use tracing::debug;

use fleet_api_client::models::{Application, Device, DeviceTag, Release};

use crate::backend::FleetBackend;
use crate::cache::snapshot::FleetCache;
use crate::errors::ReleaserError;

/// Reads devices, tags and releases of one application, caching each list
/// until [`FleetStateReader::invalidate`] is called
pub struct FleetStateReader {
    backend: Arc<dyn FleetBackend>,
    app_id: u64,
    cache: FleetCache,
}

impl FleetStateReader {
    /// Create a new reader
    pub fn new(backend: Arc<dyn FleetBackend>, app_id: u64) -> Self {
        Self {
            backend,
            app_id,
            cache: FleetCache::new(),
        }
    }

    pub fn app_id(&self) -> u64 {
        self.app_id
    }

    /// The application itself, never cached
    pub async fn application(&self) -> Result<Application, ReleaserError> {
        self.backend.get_application(self.app_id).await
    }

    /// Devices of the application
    pub async fn devices(&self) -> Result<Vec<Device>, ReleaserError> {
        if let Some(devices) = self.cache.devices.get() {
            return Ok(devices);
        }
        let devices = self.backend.get_all_devices(self.app_id).await?;
        debug!("Fetched {} devices of app {}", devices.len(), self.app_id);
        self.cache.devices.insert(devices.clone());
        Ok(devices)
    }

    /// Device tags of the application
    pub async fn tags(&self) -> Result<Vec<DeviceTag>, ReleaserError> {
        if let Some(tags) = self.cache.tags.get() {
            return Ok(tags);
        }
        let tags = self.backend.get_device_tags(self.app_id).await?;
        debug!("Fetched {} device tags of app {}", tags.len(), self.app_id);
        self.cache.tags.insert(tags.clone());
        Ok(tags)
    }

    /// Every release of the application, whatever its status
    pub async fn releases(&self) -> Result<Vec<Release>, ReleaserError> {
        if let Some(releases) = self.cache.releases.get() {
            return Ok(releases);
        }
        let releases = self.backend.get_releases(self.app_id).await?;
        debug!("Fetched {} releases of app {}", releases.len(), self.app_id);
        self.cache.releases.insert(releases.clone());
        Ok(releases)
    }

    /// Releases that finished successfully; the only valid targets
    pub async fn successful_releases(&self) -> Result<Vec<Release>, ReleaserError> {
        Ok(self
            .releases()
            .await?
            .into_iter()
            .filter(Release::is_successful)
            .collect())
    }

    /// Successful release with the given commit
    pub async fn find_successful_release(
        &self,
        commit: &str,
    ) -> Result<Option<Release>, ReleaserError> {
        Ok(self
            .successful_releases()
            .await?
            .into_iter()
            .find(|release| release.commit == commit))
    }

    pub async fn is_valid_commit(&self, commit: &str) -> Result<bool, ReleaserError> {
        Ok(self.find_successful_release(commit).await?.is_some())
    }

    /// Successful releases, most recently finished first
    pub async fn latest_releases(&self, count: usize) -> Result<Vec<Release>, ReleaserError> {
        let mut releases = self.successful_releases().await?;
        // releases that never finished sort last
        releases.sort_by(|a, b| b.end_timestamp.cmp(&a.end_timestamp));
        releases.truncate(count);
        Ok(releases)
    }

    /// Forget every cached read; called after each mutation
    pub fn invalidate(&self) {
        if !self.cache.is_empty() {
            debug!("Invalidating fleet snapshot of app {}", self.app_id);
        }
        self.cache.clear();
    }
}
