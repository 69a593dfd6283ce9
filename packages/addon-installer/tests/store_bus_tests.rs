//! Store subscribers observe every action a tracker dispatches.

mod common;

use std::sync::Arc;

use addon_installer::testing::{drain_actions, MockExtensionManager};
use addon_installer::{
    AddonType, ClientAddon, Dispatcher, InstallParams, InstallationStatus, InstallationStore,
    InstallationTracker, InstallerConfig,
};
use common::*;

#[tokio::test]
async fn subscribers_see_actions_in_dispatch_order() {
    let config = InstallerConfig {
        bus_capacity: 16,
        ..InstallerConfig::default()
    };
    let store = Arc::new(config.build_store());
    let mut receiver = store.subscribe();
    let manager = Arc::new(
        MockExtensionManager::new().with_installs_as(ClientAddon::new(GUID, AddonType::Extension)),
    );
    let tracker = InstallationTracker::new(manager, store.clone())
        .with_config(config)
        .for_addon(extension());

    tracker.set_current_status(GUID, None).await.unwrap();
    tracker
        .install(InstallParams::from(&extension()))
        .await
        .unwrap();
    tracker.set_current_status(GUID, None).await.unwrap();

    let envelopes = drain_actions(&mut receiver);
    let seqs: Vec<u64> = envelopes.iter().map(|e| e.seq).collect();
    assert_eq!(seqs, vec![1, 2, 3, 4]);

    let types: Vec<_> = envelopes.iter().map(|e| e.action.type_name()).collect();
    assert_eq!(
        types,
        vec!["INSTALL_STATE", "START_DOWNLOAD", "SHOW_INFO", "INSTALL_STATE"]
    );
    assert_eq!(store.status(GUID), Some(InstallationStatus::Enabled));
    assert_eq!(store.applied(), 4);
}

#[tokio::test]
async fn server_rendering_leaves_store_empty() {
    let store = Arc::new(InstallationStore::new());
    let tracker = InstallationTracker::new(Arc::new(MockExtensionManager::new()), store.clone())
        .with_config(InstallerConfig::default().server_rendering(true))
        .for_addon(extension());

    tracker.set_current_status(GUID, None).await.unwrap();
    tracker
        .install(InstallParams::from(&extension()))
        .await
        .unwrap();

    assert!(store.is_empty());
    assert_eq!(store.applied(), 0);
}

#[test]
fn snapshot_serializes_records() {
    let store = InstallationStore::new();
    store.dispatch(addon_installer::InstallAction::set_status(
        GUID,
        InstallationStatus::Disabled,
    ));

    let json: serde_json::Value = serde_json::from_str(&store.snapshot_json().unwrap()).unwrap();
    assert_eq!(json[0]["guid"], GUID);
    assert_eq!(json[0]["status"], "DISABLED");
}
