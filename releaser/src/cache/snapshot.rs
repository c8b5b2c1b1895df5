//! Fleet snapshot cache
//!
//! Holds what one command invocation has read about the fleet. Entries live
//! only as long as the process and are dropped whenever the tool mutates the
//! fleet, so the next read goes back to the service.

use std::sync::RwLock;

use fleet_api_client::models::{Device, DeviceTag, Release};

/// One cached resource list
pub struct CacheSlot<T> {
    entry: RwLock<Option<T>>,
}

impl<T: Clone> CacheSlot<T> {
    pub fn new() -> Self {
        Self {
            entry: RwLock::new(None),
        }
    }

    /// Get the cached value
    pub fn get(&self) -> Option<T> {
        let entry = self.entry.read().unwrap_or_else(|e| e.into_inner());
        entry.clone()
    }

    /// Replace the cached value
    pub fn insert(&self, value: T) {
        let mut entry = self.entry.write().unwrap_or_else(|e| e.into_inner());
        *entry = Some(value);
    }

    /// Drop the cached value
    pub fn invalidate(&self) {
        let mut entry = self.entry.write().unwrap_or_else(|e| e.into_inner());
        *entry = None;
    }

    pub fn is_empty(&self) -> bool {
        let entry = self.entry.read().unwrap_or_else(|e| e.into_inner());
        entry.is_none()
    }
}

impl<T: Clone> Default for CacheSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Cached reads of one fleet
#[derive(Default)]
pub struct FleetCache {
    pub devices: CacheSlot<Vec<Device>>,
    pub tags: CacheSlot<Vec<DeviceTag>>,
    pub releases: CacheSlot<Vec<Release>>,
}

impl FleetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every cached read
    pub fn clear(&self) {
        self.devices.invalidate();
        self.tags.invalidate();
        self.releases.invalidate();
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty() && self.tags.is_empty() && self.releases.is_empty()
    }
}
