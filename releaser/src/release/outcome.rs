//! Aggregated results of batch mutations

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::release::groups::GroupKey;

/// Outcome of one batch of per-device mutations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RolloutResult {
    pub succeeded: usize,
    pub failed: usize,
    /// Ids of the devices whose mutation failed
    pub failed_devices: BTreeSet<u64>,
}

impl RolloutResult {
    pub fn record_success(&mut self) {
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self, device_id: u64) {
        self.failed += 1;
        self.failed_devices.insert(device_id);
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for RolloutResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "done: {}, failed: {}", self.succeeded, self.failed)?;
        if !self.failed_devices.is_empty() {
            let ids: Vec<String> = self.failed_devices.iter().map(u64::to_string).collect();
            write!(f, " (devices: {})", ids.join(", "))?;
        }
        Ok(())
    }
}

/// Outcome of pinning one group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupOutcome {
    pub group: GroupKey,
    pub result: RolloutResult,
}

/// Outcome of a release command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseReport {
    /// Set when a group was pinned
    pub group: Option<GroupOutcome>,

    /// Set when the fleet-wide release was changed
    pub app_release: Option<Option<String>>,
}

/// Outcome of the canary rollout sequence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanaryReport {
    /// Old canaries reverted to the fleet release
    pub reset: RolloutResult,

    /// Canaries pinned to the canary commit
    pub promoted: RolloutResult,
}
