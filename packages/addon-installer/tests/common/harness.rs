//! Test harness wiring a tracker, a change listener and a recording store
//! around one scripted extension manager.

use std::sync::Arc;

use addon_installer::testing::{
    init_test_tracing, MockExtensionManager, RecordingDispatcher, RecordingTracking,
};
use addon_installer::{
    AddonInfo, AddonType, ChangeListener, InstallationRecord, InstallationTracker,
    InstallerConfig, TrackingSink,
};

pub const GUID: &str = "@lifecycle";
pub const NAME: &str = "Lifecycle Add-on";
pub const INSTALL_URL: &str = "https://addons.example/lifecycle-1.0.xpi";

pub struct TestHarness {
    pub manager: Arc<MockExtensionManager>,
    pub dispatcher: Arc<RecordingDispatcher>,
    pub tracking: Arc<RecordingTracking>,
    pub tracker: InstallationTracker,
    pub listener: ChangeListener,
}

impl TestHarness {
    pub fn new(manager: MockExtensionManager) -> Self {
        Self::with_addon(manager, extension())
    }

    pub fn with_addon(manager: MockExtensionManager, addon: AddonInfo) -> Self {
        Self::build(manager, addon, Arc::new(RecordingTracking::new()))
    }

    pub fn with_tracking(manager: MockExtensionManager, tracking: RecordingTracking) -> Self {
        Self::build(manager, extension(), Arc::new(tracking))
    }

    fn build(manager: MockExtensionManager, addon: AddonInfo, tracking: Arc<RecordingTracking>) -> Self {
        // Run tests with: RUST_LOG=debug cargo test -- --nocapture
        init_test_tracing();

        let manager = Arc::new(manager);
        let dispatcher = Arc::new(RecordingDispatcher::new());
        let sink: Arc<dyn TrackingSink> = tracking.clone();
        let tracker = InstallationTracker::new(manager.clone(), dispatcher.clone())
            .with_tracking(sink)
            .with_config(InstallerConfig::default())
            .for_addon(addon);
        let listener = ChangeListener::new(manager.clone(), dispatcher.clone());

        Self {
            manager,
            dispatcher,
            tracking,
            tracker,
            listener,
        }
    }

    pub fn record(&self) -> InstallationRecord {
        self.dispatcher
            .store()
            .get(GUID)
            .unwrap_or_else(|| panic!("no record for {GUID}"))
    }
}

pub fn extension() -> AddonInfo {
    AddonInfo::new(GUID, NAME, AddonType::Extension).with_install_url(INSTALL_URL)
}

pub fn static_theme() -> AddonInfo {
    AddonInfo::new(GUID, NAME, AddonType::StaticTheme).with_install_url(INSTALL_URL)
}
