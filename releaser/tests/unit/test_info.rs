//! Application summary tests

mod support;

use fleet_api_client::models::ReleaseStatus;
use releaser::errors::ReleaserError;
use releaser::release::engine::RolloutEngine;
use releaser::release::groups::GroupingStrategy;

use support::{engine, FakeBackend};

#[tokio::test]
async fn test_info_lines() {
    let (backend, engine) = engine(FakeBackend::new(), GroupingStrategy::release_groups());

    let lines = engine.info().await.unwrap();

    assert_eq!(
        lines,
        vec![
            "Fleet Name: fleet",
            "Device Type: Raspberry Pi 4 (using 64bit OS)",
            "In Commit: aaa",
            "Rolling enabled: No",
        ]
    );
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_info_for_pinned_fleet() {
    let backend = FakeBackend::new()
        .with_app_name("my_fleet")
        .with_device_type(58, "Raspberry Pi 3")
        .with_release(
            2073634,
            "2727adf02f82035cd32b26749db274f5",
            ReleaseStatus::Success,
        )
        .with_app_release(Some(2073634), false);
    let (_backend, engine) = engine(backend, GroupingStrategy::release_groups());

    let lines = engine.info().await.unwrap();

    assert_eq!(
        lines,
        vec![
            "Fleet Name: my_fleet",
            "Device Type: Raspberry Pi 3",
            "In Commit: 2727adf02f82035cd32b26749db274f5",
            "Rolling enabled: No",
        ]
    );
}

#[tokio::test]
async fn test_info_with_rolling_and_no_release() {
    let backend = FakeBackend::new().with_app_release(None, true);
    let (_backend, engine) = engine(backend, GroupingStrategy::release_groups());

    let lines = engine.info().await.unwrap();

    assert_eq!(lines[2], "In Commit: None");
    assert_eq!(lines[3], "Rolling enabled: Yes");
}

#[tokio::test]
async fn test_info_reflects_fleet_release_changes() {
    let backend = FakeBackend::new().with_device(1, "aaaa1111", None);
    let (_backend, engine) = engine(backend, GroupingStrategy::release_groups());

    engine.set_release(Some("bbb"), None, true).await.unwrap();

    let lines = engine.info().await.unwrap();
    assert_eq!(lines[2], "In Commit: bbb");
    assert_eq!(lines[3], "Rolling enabled: No");
}

#[tokio::test]
async fn test_info_for_unknown_application() {
    let backend = std::sync::Arc::new(FakeBackend::new());
    let engine = RolloutEngine::new(backend, 999, GroupingStrategy::release_groups());

    let err = engine.info().await.unwrap_err();
    assert!(matches!(err, ReleaserError::ApplicationNotFound(999)));
}
