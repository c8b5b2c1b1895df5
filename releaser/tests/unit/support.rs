//! In-memory fleet backend shared by the integration tests

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use fleet_api_client::models::{
    Application, Device, DeviceTag, DeviceType, EnvironmentVariable, PineRef, Release,
    ReleaseStatus, Service,
};
use releaser::backend::FleetBackend;
use releaser::envvars::scope::{EnvVarKind, EnvVarOwner};
use releaser::errors::ReleaserError;
use releaser::release::engine::RolloutEngine;
use releaser::release::groups::{GroupingStrategy, CANARY_TAG, RELEASE_GROUP_TAG};

pub const APP_ID: u64 = 1;

/// Mutation recorded by the fake backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SetDeviceRelease { uuid: String, commit: Option<String> },
    SetAppRelease(Option<String>),
    EnableRolling,
    DisableRolling,
    RemoveEnvVar { kind: EnvVarKind, id: u64 },
}

impl Call {
    pub fn pin(uuid: &str, commit: Option<&str>) -> Self {
        Call::SetDeviceRelease {
            uuid: uuid.to_string(),
            commit: commit.map(str::to_string),
        }
    }
}

struct FleetState {
    application: Application,
    device_type: DeviceType,
    devices: Vec<Device>,
    tags: Vec<DeviceTag>,
    releases: Vec<Release>,
    services: Vec<Service>,
    env_vars: HashMap<EnvVarOwner, Vec<EnvironmentVariable>>,
}

pub struct FakeBackend {
    state: Mutex<FleetState>,
    calls: Mutex<Vec<Call>>,
    failing_uuids: HashSet<String>,
    failing_env_vars: HashSet<u64>,
    device_reads: AtomicUsize,
}

impl FakeBackend {
    /// Fleet "fleet" with releases `aaa` and `bbb` (successful) and `ccc` (failed),
    /// running `aaa`
    pub fn new() -> Self {
        let releases = vec![
            release(10, "aaa", ReleaseStatus::Success, 1),
            release(11, "bbb", ReleaseStatus::Success, 2),
            release(12, "ccc", ReleaseStatus::Failed, 3),
        ];

        Self {
            state: Mutex::new(FleetState {
                application: Application {
                    id: APP_ID,
                    app_name: "fleet".to_string(),
                    device_type: PineRef::new(5),
                    release: Some(PineRef::new(10)),
                    should_track_latest_release: false,
                },
                device_type: DeviceType {
                    id: 5,
                    slug: Some("raspberrypi4-64".to_string()),
                    name: "Raspberry Pi 4 (using 64bit OS)".to_string(),
                },
                devices: Vec::new(),
                tags: Vec::new(),
                releases,
                services: Vec::new(),
                env_vars: HashMap::new(),
            }),
            calls: Mutex::new(Vec::new()),
            failing_uuids: HashSet::new(),
            failing_env_vars: HashSet::new(),
            device_reads: AtomicUsize::new(0),
        }
    }

    fn state_mut(&mut self) -> &mut FleetState {
        self.state.get_mut().unwrap()
    }

    pub fn with_device(mut self, id: u64, uuid: &str, pinned: Option<u64>) -> Self {
        self.state_mut().devices.push(device(id, uuid, pinned));
        self
    }

    pub fn with_tag(mut self, device_id: u64, key: &str, value: &str) -> Self {
        self.state_mut().tags.push(DeviceTag {
            id: 0,
            device: PineRef::new(device_id),
            tag_key: key.to_string(),
            value: value.to_string(),
        });
        self
    }

    pub fn with_group(self, device_id: u64, group: &str) -> Self {
        self.with_tag(device_id, RELEASE_GROUP_TAG, group)
    }

    pub fn with_canary(self, device_id: u64) -> Self {
        self.with_tag(device_id, CANARY_TAG, "")
    }

    pub fn with_app_release(mut self, release: Option<u64>, rolling: bool) -> Self {
        let app = &mut self.state_mut().application;
        app.release = release.map(PineRef::new);
        app.should_track_latest_release = rolling;
        self
    }

    pub fn with_app_name(mut self, name: &str) -> Self {
        self.state_mut().application.app_name = name.to_string();
        self
    }

    pub fn with_device_type(mut self, id: u64, name: &str) -> Self {
        let state = self.state_mut();
        state.application.device_type = PineRef::new(id);
        state.device_type = DeviceType {
            id,
            slug: None,
            name: name.to_string(),
        };
        self
    }

    pub fn with_release(mut self, id: u64, commit: &str, status: ReleaseStatus) -> Self {
        let day = self.state_mut().releases.len() as u32 + 1;
        self.state_mut().releases.push(release(id, commit, status, day));
        self
    }

    pub fn with_service(mut self, id: u64, name: &str) -> Self {
        self.state_mut().services.push(Service {
            id,
            service_name: name.to_string(),
        });
        self
    }

    pub fn with_env_var(mut self, owner: EnvVarOwner, id: u64, name: &str, value: &str) -> Self {
        self.state_mut()
            .env_vars
            .entry(owner)
            .or_default()
            .push(EnvironmentVariable {
                id,
                name: name.to_string(),
                value: value.to_string(),
            });
        self
    }

    pub fn failing_device(mut self, uuid: &str) -> Self {
        self.failing_uuids.insert(uuid.to_string());
        self
    }

    pub fn failing_env_var(mut self, id: u64) -> Self {
        self.failing_env_vars.insert(id);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Number of times the device list was fetched
    pub fn device_reads(&self) -> usize {
        self.device_reads.load(Ordering::SeqCst)
    }

    pub fn pinned_release(&self, uuid: &str) -> Option<u64> {
        let state = self.state.lock().unwrap();
        state
            .devices
            .iter()
            .find(|device| device.uuid == uuid)
            .and_then(|device| device.pinned_release)
            .map(|release| release.id)
    }

    pub fn env_var_ids(&self) -> Vec<u64> {
        let state = self.state.lock().unwrap();
        let mut ids: Vec<u64> = state
            .env_vars
            .values()
            .flat_map(|vars| vars.iter().map(|var| var.id))
            .collect();
        ids.sort_unstable();
        ids
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn release_id(&self, commit: Option<&str>) -> Result<Option<u64>, ReleaserError> {
        let Some(commit) = commit else {
            return Ok(None);
        };
        let state = self.state.lock().unwrap();
        state
            .releases
            .iter()
            .find(|release| release.commit == commit)
            .map(|release| Some(release.id))
            .ok_or_else(|| ReleaserError::ResourceNotFound(format!("release {}", commit)))
    }
}

/// Shared backend plus an engine reading from it
pub fn engine(
    backend: FakeBackend,
    strategy: GroupingStrategy,
) -> (Arc<FakeBackend>, RolloutEngine) {
    let backend = Arc::new(backend);
    let engine = RolloutEngine::new(backend.clone(), APP_ID, strategy);
    (backend, engine)
}

pub fn device(id: u64, uuid: &str, pinned: Option<u64>) -> Device {
    Device {
        id,
        uuid: uuid.to_string(),
        device_name: format!("device-{}", id),
        application: Some(PineRef::new(APP_ID)),
        pinned_release: pinned.map(PineRef::new),
    }
}

pub fn release(id: u64, commit: &str, status: ReleaseStatus, day: u32) -> Release {
    Release {
        id,
        commit: commit.to_string(),
        status,
        end_timestamp: Some(Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap()),
    }
}

#[async_trait]
impl FleetBackend for FakeBackend {
    async fn get_application(&self, app_id: u64) -> Result<Application, ReleaserError> {
        let state = self.state.lock().unwrap();
        if state.application.id != app_id {
            return Err(ReleaserError::ApplicationNotFound(app_id));
        }
        Ok(state.application.clone())
    }

    async fn get_device_type(&self, id: u64) -> Result<DeviceType, ReleaserError> {
        let state = self.state.lock().unwrap();
        if state.device_type.id != id {
            return Err(ReleaserError::ResourceNotFound(format!("device type {}", id)));
        }
        Ok(state.device_type.clone())
    }

    async fn get_release(&self, id: u64) -> Result<Release, ReleaserError> {
        let state = self.state.lock().unwrap();
        state
            .releases
            .iter()
            .find(|release| release.id == id)
            .cloned()
            .ok_or_else(|| ReleaserError::ResourceNotFound(format!("release {}", id)))
    }

    async fn get_all_devices(&self, _app_id: u64) -> Result<Vec<Device>, ReleaserError> {
        self.device_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.state.lock().unwrap().devices.clone())
    }

    async fn get_device_tags(&self, _app_id: u64) -> Result<Vec<DeviceTag>, ReleaserError> {
        Ok(self.state.lock().unwrap().tags.clone())
    }

    async fn get_releases(&self, _app_id: u64) -> Result<Vec<Release>, ReleaserError> {
        Ok(self.state.lock().unwrap().releases.clone())
    }

    async fn get_services(&self, _app_id: u64) -> Result<Vec<Service>, ReleaserError> {
        Ok(self.state.lock().unwrap().services.clone())
    }

    async fn set_device_release(
        &self,
        uuid: &str,
        commit: Option<&str>,
    ) -> Result<(), ReleaserError> {
        self.record(Call::pin(uuid, commit));
        if self.failing_uuids.contains(uuid) {
            return Err(ReleaserError::ApiError {
                status: 500,
                body: "device update failed".to_string(),
            });
        }

        let release_id = self.release_id(commit)?;
        let mut state = self.state.lock().unwrap();
        let device = state
            .devices
            .iter_mut()
            .find(|device| device.uuid == uuid)
            .ok_or_else(|| ReleaserError::ResourceNotFound(format!("device {}", uuid)))?;
        device.pinned_release = release_id.map(PineRef::new);
        Ok(())
    }

    async fn set_app_release(
        &self,
        _app_id: u64,
        commit: Option<&str>,
    ) -> Result<(), ReleaserError> {
        self.record(Call::SetAppRelease(commit.map(str::to_string)));
        let release_id = self.release_id(commit)?;
        self.state.lock().unwrap().application.release = release_id.map(PineRef::new);
        Ok(())
    }

    async fn enable_rolling_updates(&self, _app_id: u64) -> Result<(), ReleaserError> {
        self.record(Call::EnableRolling);
        self.state.lock().unwrap().application.should_track_latest_release = true;
        Ok(())
    }

    async fn disable_rolling_updates(&self, _app_id: u64) -> Result<(), ReleaserError> {
        self.record(Call::DisableRolling);
        self.state.lock().unwrap().application.should_track_latest_release = false;
        Ok(())
    }

    async fn get_env_vars(
        &self,
        owner: EnvVarOwner,
    ) -> Result<Vec<EnvironmentVariable>, ReleaserError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .env_vars
            .get(&owner)
            .cloned()
            .unwrap_or_default())
    }

    async fn remove_env_var(&self, kind: EnvVarKind, id: u64) -> Result<(), ReleaserError> {
        self.record(Call::RemoveEnvVar { kind, id });
        if self.failing_env_vars.contains(&id) {
            return Err(ReleaserError::ApiError {
                status: 500,
                body: "variable removal failed".to_string(),
            });
        }

        let mut state = self.state.lock().unwrap();
        for (owner, vars) in state.env_vars.iter_mut() {
            if owner.kind() == kind {
                vars.retain(|var| var.id != id);
            }
        }
        Ok(())
    }
}
