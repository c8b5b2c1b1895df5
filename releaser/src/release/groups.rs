//! Device classification into release groups

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use fleet_api_client::models::{Device, DeviceTag};

use crate::errors::ReleaserError;

/// Tag key naming a device's release group
pub const RELEASE_GROUP_TAG: &str = "release_group";

/// Tag key marking a canary device
pub const CANARY_TAG: &str = "CANARY";

pub const CANARIES: &str = "canaries";
pub const OLD_CANARIES: &str = "old_canaries";
pub const REST: &str = "rest";

/// Name shown for, and accepted as, the group of untagged devices
pub const UNGROUPED: &str = "None";

/// Name of a group of devices
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupKey {
    Named(String),
    /// Devices without a release group tag
    Ungrouped,
}

impl GroupKey {
    pub fn named(name: impl Into<String>) -> Self {
        GroupKey::Named(name.into())
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Named(name) => f.write_str(name),
            GroupKey::Ungrouped => f.write_str(UNGROUPED),
        }
    }
}

impl FromStr for GroupKey {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            UNGROUPED => GroupKey::Ungrouped,
            name => GroupKey::Named(name.to_string()),
        })
    }
}

/// How devices are split into groups, chosen once per session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum GroupingStrategy {
    /// One group per value of `tag_key`, untagged devices in [`GroupKey::Ungrouped`]
    ReleaseGroups {
        #[serde(default = "default_release_group_tag")]
        tag_key: String,
    },

    /// Fixed `canaries` / `old_canaries` / `rest` split, canaries carry `tag_key`
    Canary {
        #[serde(default = "default_canary_tag")]
        tag_key: String,
    },
}

fn default_release_group_tag() -> String {
    RELEASE_GROUP_TAG.to_string()
}

fn default_canary_tag() -> String {
    CANARY_TAG.to_string()
}

impl Default for GroupingStrategy {
    fn default() -> Self {
        Self::release_groups()
    }
}

impl GroupingStrategy {
    pub fn release_groups() -> Self {
        GroupingStrategy::ReleaseGroups {
            tag_key: default_release_group_tag(),
        }
    }

    pub fn canary() -> Self {
        GroupingStrategy::Canary {
            tag_key: default_canary_tag(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GroupingStrategy::ReleaseGroups { .. } => "release_groups",
            GroupingStrategy::Canary { .. } => "canary",
        }
    }

    pub fn tag_key(&self) -> &str {
        match self {
            GroupingStrategy::ReleaseGroups { tag_key } | GroupingStrategy::Canary { tag_key } => {
                tag_key
            }
        }
    }

    /// Partition `devices` into disjoint groups
    ///
    /// Tags pointing at devices outside `devices` are ignored. Never mutates
    /// anything.
    pub fn classify(
        &self,
        devices: &[Device],
        tags: &[DeviceTag],
    ) -> Result<Classification, ReleaserError> {
        let tagged = tagged_devices(devices, tags, self.tag_key())?;
        let mut classification = Classification::default();

        match self {
            GroupingStrategy::ReleaseGroups { tag_key } => {
                // a tagged group named like the untagged one could not be told apart
                let reserved = tagged.iter().find(|(_, group)| group.as_str() == UNGROUPED);
                if let Some((&device_id, _)) = reserved {
                    return Err(ReleaserError::ReservedGroupName {
                        device_id,
                        tag_key: tag_key.clone(),
                    });
                }

                for device in devices {
                    let key = match tagged.get(&device.id) {
                        Some(group) => GroupKey::Named(group.clone()),
                        None => GroupKey::Ungrouped,
                    };
                    classification.insert(key, device.clone());
                }
            }
            GroupingStrategy::Canary { .. } => {
                for name in [CANARIES, OLD_CANARIES, REST] {
                    classification.ensure(GroupKey::named(name));
                }

                let canaries: HashSet<u64> = devices
                    .iter()
                    .filter(|device| tagged.contains_key(&device.id))
                    .map(|device| device.id)
                    .collect();

                for device in devices {
                    let name = if canaries.contains(&device.id) {
                        CANARIES
                    } else if device.is_pinned() {
                        OLD_CANARIES
                    } else {
                        REST
                    };
                    classification.insert(GroupKey::named(name), device.clone());
                }
            }
        }

        Ok(classification)
    }
}

/// Map device id to the value of its `tag_key` tag
fn tagged_devices(
    devices: &[Device],
    tags: &[DeviceTag],
    tag_key: &str,
) -> Result<HashMap<u64, String>, ReleaserError> {
    let fleet: HashSet<u64> = devices.iter().map(|device| device.id).collect();
    let mut tagged: HashMap<u64, String> = HashMap::new();

    for tag in tags {
        if tag.tag_key != tag_key || !fleet.contains(&tag.device.id) {
            continue;
        }
        match tagged.get(&tag.device.id) {
            Some(existing) if existing != &tag.value => {
                return Err(ReleaserError::ConflictingGroupTags {
                    device_id: tag.device.id,
                    tag_key: tag_key.to_string(),
                    first: existing.clone(),
                    second: tag.value.clone(),
                });
            }
            Some(_) => {}
            None => {
                tagged.insert(tag.device.id, tag.value.clone());
            }
        }
    }

    Ok(tagged)
}

/// Devices keyed by group, then by device id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    groups: BTreeMap<GroupKey, BTreeMap<u64, Device>>,
}

impl Classification {
    fn ensure(&mut self, key: GroupKey) {
        self.groups.entry(key).or_default();
    }

    fn insert(&mut self, key: GroupKey, device: Device) {
        self.groups.entry(key).or_default().insert(device.id, device);
    }

    pub fn contains(&self, key: &GroupKey) -> bool {
        self.groups.contains_key(key)
    }

    /// Devices of one group, ordered by id
    pub fn devices(&self, key: &GroupKey) -> Vec<&Device> {
        self.groups
            .get(key)
            .map(|devices| devices.values().collect())
            .unwrap_or_default()
    }

    pub fn device_ids(&self, key: &GroupKey) -> Vec<u64> {
        self.groups
            .get(key)
            .map(|devices| devices.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn keys(&self) -> impl Iterator<Item = &GroupKey> {
        self.groups.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&GroupKey, Vec<&Device>)> {
        self.groups
            .iter()
            .map(|(key, devices)| (key, devices.values().collect()))
    }

    /// Group the device was classified into
    pub fn group_of(&self, device_id: u64) -> Option<&GroupKey> {
        self.groups
            .iter()
            .find(|(_, devices)| devices.contains_key(&device_id))
            .map(|(key, _)| key)
    }

    /// Number of devices across all groups
    pub fn device_count(&self) -> usize {
        self.groups.values().map(BTreeMap::len).sum()
    }
}
