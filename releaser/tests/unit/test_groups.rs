//! Device classification tests

use std::collections::HashSet;

use fleet_api_client::models::{Device, DeviceTag, PineRef};
use releaser::release::groups::{
    GroupKey, GroupingStrategy, CANARIES, CANARY_TAG, OLD_CANARIES, RELEASE_GROUP_TAG, REST,
};

fn create_device(id: u64, pinned: bool) -> Device {
    Device {
        id,
        uuid: format!("{:032x}", id),
        device_name: format!("device-{}", id),
        application: Some(PineRef::new(1)),
        pinned_release: pinned.then(|| PineRef::new(100)),
    }
}

fn create_tag(device_id: u64, key: &str, value: &str) -> DeviceTag {
    DeviceTag {
        id: device_id,
        device: PineRef::new(device_id),
        tag_key: key.to_string(),
        value: value.to_string(),
    }
}

fn ids(devices: &[&Device]) -> HashSet<u64> {
    devices.iter().map(|device| device.id).collect()
}

/// Every pinned/tagged combination of up to four devices
fn canary_fleets() -> Vec<(Vec<Device>, Vec<DeviceTag>)> {
    let mut fleets = Vec::new();
    for count in 0..=4u64 {
        for pinned_mask in 0..(1u32 << count) {
            for tagged_mask in 0..(1u32 << count) {
                let devices: Vec<Device> = (0..count)
                    .map(|i| create_device(i + 1, pinned_mask & (1 << i) != 0))
                    .collect();
                let tags: Vec<DeviceTag> = (0..count)
                    .filter(|i| tagged_mask & (1 << i) != 0)
                    .map(|i| create_tag(i + 1, CANARY_TAG, ""))
                    .collect();
                fleets.push((devices, tags));
            }
        }
    }
    fleets
}

#[test]
fn test_canary_groups_partition_the_fleet() {
    let strategy = GroupingStrategy::canary();

    for (devices, tags) in canary_fleets() {
        let groups = strategy.classify(&devices, &tags).unwrap();

        let canaries = ids(&groups.devices(&GroupKey::named(CANARIES)));
        let old_canaries = ids(&groups.devices(&GroupKey::named(OLD_CANARIES)));
        let rest = ids(&groups.devices(&GroupKey::named(REST)));

        assert!(canaries.is_disjoint(&old_canaries));
        assert!(canaries.is_disjoint(&rest));
        assert!(old_canaries.is_disjoint(&rest));

        let all: HashSet<u64> = devices.iter().map(|device| device.id).collect();
        let union: HashSet<u64> = canaries
            .iter()
            .chain(old_canaries.iter())
            .chain(rest.iter())
            .copied()
            .collect();
        assert_eq!(union, all);
        assert_eq!(groups.device_count(), devices.len());
    }
}

#[test]
fn test_canary_membership_rules() {
    let strategy = GroupingStrategy::canary();

    for (devices, tags) in canary_fleets() {
        let groups = strategy.classify(&devices, &tags).unwrap();
        let tagged: HashSet<u64> = tags.iter().map(|tag| tag.device.id).collect();

        for device in &devices {
            let expected = if tagged.contains(&device.id) {
                CANARIES
            } else if device.is_pinned() {
                OLD_CANARIES
            } else {
                REST
            };
            assert_eq!(groups.group_of(device.id), Some(&GroupKey::named(expected)));
        }
    }
}

#[test]
fn test_canary_groups_always_exist() {
    let groups = GroupingStrategy::canary().classify(&[], &[]).unwrap();
    for name in [CANARIES, OLD_CANARIES, REST] {
        assert!(groups.contains(&GroupKey::named(name)));
        assert!(groups.devices(&GroupKey::named(name)).is_empty());
    }
}

#[test]
fn test_release_groups_partition_the_fleet() {
    let values = [Some("alpha"), Some("beta"), None];
    let strategy = GroupingStrategy::release_groups();

    // every assignment of three devices to alpha, beta or no group
    for a in values {
        for b in values {
            for c in values {
                let devices: Vec<Device> = (1..=3).map(|id| create_device(id, false)).collect();
                let tags: Vec<DeviceTag> = [a, b, c]
                    .iter()
                    .enumerate()
                    .filter_map(|(i, value)| {
                        value.map(|value| create_tag(i as u64 + 1, RELEASE_GROUP_TAG, value))
                    })
                    .collect();

                let groups = strategy.classify(&devices, &tags).unwrap();
                assert_eq!(groups.device_count(), 3);

                for (i, value) in [a, b, c].iter().enumerate() {
                    let expected = match value {
                        Some(name) => GroupKey::named(*name),
                        None => GroupKey::Ungrouped,
                    };
                    assert_eq!(groups.group_of(i as u64 + 1), Some(&expected));
                }

                // only groups that hold a device are offered
                for key in groups.keys() {
                    assert!(!groups.devices(key).is_empty());
                }
            }
        }
    }
}

#[test]
fn test_canary_scenario_with_other_tags() {
    let devices = vec![
        create_device(1, false),
        create_device(2, true),
        create_device(3, false),
    ];
    let tags = vec![
        create_tag(1, CANARY_TAG, ""),
        create_tag(3, RELEASE_GROUP_TAG, "beta"),
    ];

    let groups = GroupingStrategy::canary().classify(&devices, &tags).unwrap();
    assert_eq!(groups.device_ids(&GroupKey::named(CANARIES)), vec![1]);
    assert_eq!(groups.device_ids(&GroupKey::named(OLD_CANARIES)), vec![2]);
    assert_eq!(groups.device_ids(&GroupKey::named(REST)), vec![3]);
}

#[test]
fn test_custom_tag_key() {
    let devices = vec![create_device(1, false), create_device(2, false)];
    let tags = vec![
        create_tag(1, "ring", "early"),
        create_tag(2, RELEASE_GROUP_TAG, "beta"),
    ];

    let strategy = GroupingStrategy::ReleaseGroups {
        tag_key: "ring".to_string(),
    };
    let groups = strategy.classify(&devices, &tags).unwrap();
    assert_eq!(groups.device_ids(&GroupKey::named("early")), vec![1]);
    assert_eq!(groups.device_ids(&GroupKey::Ungrouped), vec![2]);
    assert!(!groups.contains(&GroupKey::named("beta")));
}
