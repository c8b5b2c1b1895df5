//! Release rollout engine
//!
//! Validates requested commits and groups against the fleet state, then
//! applies mutations one remote call at a time in a fixed order. Validation
//! always finishes before the first mutation is sent.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use fleet_api_client::models::{Device, Release};

use crate::backend::FleetBackend;
use crate::errors::ReleaserError;
use crate::fleet::reader::FleetStateReader;
use crate::release::groups::{
    Classification, GroupKey, GroupingStrategy, CANARIES, OLD_CANARIES,
};
use crate::release::outcome::{CanaryReport, GroupOutcome, ReleaseReport, RolloutResult};
use crate::utils::short_uuid;

/// Commit a device is pinned to, as shown to operators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceVersion {
    pub uuid: String,
    pub device_name: String,
    /// `None` when the device tracks the fleet release
    pub commit: Option<String>,
}

/// Versions of every device of one group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupVersions {
    pub group: GroupKey,
    pub devices: Vec<DeviceVersion>,
}

/// Release rollout engine
pub struct RolloutEngine {
    backend: Arc<dyn FleetBackend>,
    reader: FleetStateReader,
    strategy: GroupingStrategy,
}

impl RolloutEngine {
    /// Create a new engine for one application
    pub fn new(backend: Arc<dyn FleetBackend>, app_id: u64, strategy: GroupingStrategy) -> Self {
        let reader = FleetStateReader::new(backend.clone(), app_id);
        Self {
            backend,
            reader,
            strategy,
        }
    }

    pub fn app_id(&self) -> u64 {
        self.reader.app_id()
    }

    pub fn reader(&self) -> &FleetStateReader {
        &self.reader
    }

    pub fn strategy(&self) -> &GroupingStrategy {
        &self.strategy
    }

    // ================================ READS ==================================== //

    /// Summary of the application, one line per fact
    pub async fn info(&self) -> Result<Vec<String>, ReleaserError> {
        let app = self.reader.application().await?;
        let device_type = self.backend.get_device_type(app.device_type.id).await?;
        let commit = match app.release {
            Some(release) => self.backend.get_release(release.id).await?.commit,
            None => "None".to_string(),
        };
        let rolling = if app.should_track_latest_release {
            "Yes"
        } else {
            "No"
        };

        Ok(vec![
            format!("Fleet Name: {}", app.app_name),
            format!("Device Type: {}", device_type.name),
            format!("In Commit: {}", commit),
            format!("Rolling enabled: {}", rolling),
        ])
    }

    /// Split the fleet into groups with the configured strategy
    pub async fn classify(&self) -> Result<Classification, ReleaserError> {
        let devices = self.reader.devices().await?;
        let tags = self.reader.tags().await?;
        self.strategy.classify(&devices, &tags)
    }

    pub async fn is_valid_commit(&self, commit: &str) -> Result<bool, ReleaserError> {
        self.reader.is_valid_commit(commit).await
    }

    pub async fn is_valid_group(&self, group: &GroupKey) -> Result<bool, ReleaserError> {
        Ok(self.classify().await?.contains(group))
    }

    /// Successful releases, newest first
    pub async fn latest_releases(&self, count: usize) -> Result<Vec<Release>, ReleaserError> {
        self.reader.latest_releases(count).await
    }

    /// Commit each device is pinned to, per group
    pub async fn group_versions(&self) -> Result<Vec<GroupVersions>, ReleaserError> {
        let classification = self.classify().await?;
        let commits: HashMap<u64, String> = self
            .reader
            .releases()
            .await?
            .into_iter()
            .map(|release| (release.id, release.commit))
            .collect();

        Ok(classification
            .iter()
            .map(|(group, devices)| GroupVersions {
                group: group.clone(),
                devices: devices
                    .into_iter()
                    .map(|device| DeviceVersion {
                        uuid: device.uuid.clone(),
                        device_name: device.device_name.clone(),
                        commit: device.pinned_release.map(|release| {
                            commits
                                .get(&release.id)
                                .cloned()
                                .unwrap_or_else(|| format!("release {}", release.id))
                        }),
                    })
                    .collect(),
            })
            .collect())
    }

    // ============================== VALIDATION ================================= //

    /// Check a target commit; empty or absent means "unpin" and maps to `None`
    pub async fn validate_commit(
        &self,
        commit: Option<&str>,
    ) -> Result<Option<String>, ReleaserError> {
        match commit.map(str::trim).filter(|commit| !commit.is_empty()) {
            None => Ok(None),
            Some(commit) => {
                if self.reader.is_valid_commit(commit).await? {
                    Ok(Some(commit.to_string()))
                } else {
                    Err(ReleaserError::InvalidCommit(commit.to_string()))
                }
            }
        }
    }

    /// Check that every group exists, reporting all unknown names at once
    pub async fn validate_groups(
        &self,
        groups: &[GroupKey],
    ) -> Result<Classification, ReleaserError> {
        let classification = self.classify().await?;
        let invalid: Vec<String> = groups
            .iter()
            .filter(|group| !classification.contains(group))
            .map(GroupKey::to_string)
            .collect();

        if invalid.is_empty() {
            Ok(classification)
        } else {
            Err(ReleaserError::InvalidGroup(invalid))
        }
    }

    // =============================== MUTATIONS ================================= //

    /// Pin a group and/or the whole fleet to `commit`
    ///
    /// The group is pinned first. With `app_wide`, rolling updates are then
    /// disabled and the fleet release set.
    pub async fn set_release(
        &self,
        commit: Option<&str>,
        group: Option<&GroupKey>,
        app_wide: bool,
    ) -> Result<ReleaseReport, ReleaserError> {
        if group.is_none() && !app_wide {
            return Err(ReleaserError::MissingFlag("--group or --app".to_string()));
        }

        let classification = match group {
            Some(group) => Some(self.validate_groups(std::slice::from_ref(group)).await?),
            None => None,
        };
        let commit = self.validate_commit(commit).await?;

        let mut report = ReleaseReport::default();

        if let (Some(group), Some(classification)) = (group, classification) {
            info!(
                "Setting release group {} to {}",
                group,
                commit.as_deref().unwrap_or("None")
            );
            let result = self
                .pin_devices(&classification.devices(group), commit.as_deref())
                .await;
            report.group = Some(GroupOutcome {
                group: group.clone(),
                result,
            });
        }

        if app_wide {
            self.disable_rolling().await?;
            self.set_app_release(commit.as_deref()).await?;
            report.app_release = Some(commit);
        }

        Ok(report)
    }

    /// Pin every device of one group to `commit`
    pub async fn set_group(
        &self,
        commit: &str,
        group: &GroupKey,
    ) -> Result<RolloutResult, ReleaserError> {
        let classification = self.validate_groups(std::slice::from_ref(group)).await?;
        let commit = self.validate_commit(Some(commit)).await?;

        info!(
            "Setting release group {} to {}",
            group,
            commit.as_deref().unwrap_or("None")
        );
        Ok(self
            .pin_devices(&classification.devices(group), commit.as_deref())
            .await)
    }

    /// Return the devices of each group to the fleet release
    ///
    /// Every name is validated before the first device is touched.
    pub async fn unpin(&self, groups: &[GroupKey]) -> Result<Vec<GroupOutcome>, ReleaserError> {
        let classification = self.validate_groups(groups).await?;

        let mut outcomes = Vec::with_capacity(groups.len());
        for group in groups {
            info!("Unpinning release group {}", group);
            let result = self.pin_devices(&classification.devices(group), None).await;
            outcomes.push(GroupOutcome {
                group: group.clone(),
                result,
            });
        }
        Ok(outcomes)
    }

    /// Canary rollout: revert old canaries, pin canaries to `canary_commit`
    /// and move the fleet to `release_commit`
    pub async fn canary_rollout(
        &self,
        release_commit: &str,
        canary_commit: Option<&str>,
    ) -> Result<CanaryReport, ReleaserError> {
        self.require_canary_strategy()?;

        let release_commit = self
            .validate_commit(Some(release_commit))
            .await?
            .ok_or_else(|| ReleaserError::InvalidCommit(release_commit.to_string()))?;
        let canary_commit = self.validate_commit(canary_commit).await?;
        let classification = self.classify().await?;

        let old_canaries = classification.devices(&GroupKey::named(OLD_CANARIES));
        let canaries = classification.devices(&GroupKey::named(CANARIES));

        info!("Disabling rolling releases on the application");
        self.disable_rolling().await?;

        let mut report = CanaryReport::default();

        if !old_canaries.is_empty() {
            info!("Resetting {} old canaries", old_canaries.len());
            report.reset = self.pin_devices(&old_canaries, None).await;
        }

        if !canaries.is_empty() {
            info!("Setting {} canaries", canaries.len());
            report.promoted = self.pin_devices(&canaries, canary_commit.as_deref()).await;
        }

        // Moving the fleet release is what triggers the update on every
        // device that tracks it.
        info!("Setting up current release to: {}", release_commit);
        self.set_app_release(Some(&release_commit)).await?;

        Ok(report)
    }

    /// Fail unless devices are grouped into canaries
    pub fn require_canary_strategy(&self) -> Result<(), ReleaserError> {
        match self.strategy {
            GroupingStrategy::Canary { .. } => Ok(()),
            GroupingStrategy::ReleaseGroups { .. } => Err(ReleaserError::UnsupportedStrategy(
                format!(
                    "canary rollout needs the canary grouping, not {}",
                    self.strategy.name()
                ),
            )),
        }
    }

    /// Enable rolling updates and move the fleet to the newest release
    pub async fn enable_rolling(&self) -> Result<Option<String>, ReleaserError> {
        self.backend.enable_rolling_updates(self.app_id()).await?;
        self.reader.invalidate();

        let latest = self.reader.latest_releases(1).await?.into_iter().next();
        match latest {
            Some(release) => {
                self.set_app_release(Some(&release.commit)).await?;
                Ok(Some(release.commit))
            }
            None => Ok(None),
        }
    }

    pub async fn disable_rolling(&self) -> Result<(), ReleaserError> {
        self.backend.disable_rolling_updates(self.app_id()).await?;
        self.reader.invalidate();
        Ok(())
    }

    async fn set_app_release(&self, commit: Option<&str>) -> Result<(), ReleaserError> {
        let result = self.backend.set_app_release(self.app_id(), commit).await;
        self.reader.invalidate();
        result
    }

    /// Pin each device in turn, counting failures instead of stopping
    async fn pin_devices(&self, devices: &[&Device], commit: Option<&str>) -> RolloutResult {
        let mut result = RolloutResult::default();

        for device in devices {
            match self.backend.set_device_release(&device.uuid, commit).await {
                Ok(()) => {
                    info!(
                        "{} ({}) -> {}",
                        device.device_name,
                        short_uuid(&device.uuid),
                        commit.unwrap_or("None")
                    );
                    result.record_success();
                }
                Err(e) => {
                    warn!(
                        "Failed to set release of {} ({}): {}",
                        device.device_name,
                        short_uuid(&device.uuid),
                        e
                    );
                    result.record_failure(device.id);
                }
            }
        }

        if !devices.is_empty() {
            self.reader.invalidate();
        }
        result
    }
}
