//! Testing utilities including mock implementations.
//!
//! These let applications exercise the tracker without a browser: a scripted
//! extension manager, a dispatcher that records every action it applies, and
//! a tracking sink that keeps what it was sent.
//!
//! ```ignore
//! use addon_installer::testing::{MockExtensionManager, RecordingDispatcher};
//!
//! let manager = Arc::new(MockExtensionManager::new().with_addon(addon));
//! let dispatcher = Arc::new(RecordingDispatcher::new());
//! let tracker = InstallationTracker::new(manager, dispatcher.clone());
//!
//! tracker.set_current_status("@my-addon", None).await?;
//! assert_dispatched!(dispatcher, "INSTALL_STATE");
//! ```

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

use crate::actions::InstallAction;
use crate::bus::ActionEnvelope;
use crate::error::{ManagerError, ManagerResult};
use crate::events::{InstallEvent, ProgressEvent};
use crate::manager::{ExtensionManager, InstallOptions};
use crate::progress::ProgressHandler;
use crate::store::{Dispatcher, InstallationStore};
use crate::tracking::{TrackingEvent, TrackingSink};
use crate::types::{ClientAddon, InstallationRecord, InstallationStatus};

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

/// Asserts the action types a [`RecordingDispatcher`] has applied, in order.
///
/// ```ignore
/// assert_dispatched!(dispatcher, "INSTALL_STATE", "INSTALL_ERROR");
/// assert_dispatched!(dispatcher);  // nothing dispatched
/// ```
#[macro_export]
macro_rules! assert_dispatched {
    ($dispatcher:expr $(, $kind:expr)* $(,)?) => {{
        let actual: Vec<&'static str> = $dispatcher
            .actions()
            .iter()
            .map(|action| action.type_name())
            .collect();
        let expected: Vec<&str> = vec![$($kind),*];
        assert_eq!(
            actual, expected,
            "Unexpected actions\n  expected: {:?}\n  actual: {:?}",
            expected, actual
        );
    }};
}

pub use assert_dispatched;

/// Install test logging once. Honors `RUST_LOG`.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Drain every envelope already published on a bus receiver.
pub fn drain_actions(receiver: &mut broadcast::Receiver<ActionEnvelope>) -> Vec<ActionEnvelope> {
    let mut envelopes = Vec::new();
    while let Ok(envelope) = receiver.try_recv() {
        envelopes.push(envelope);
    }
    envelopes
}

/// Record of a call made to the mock extension manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockManagerCall {
    GetAddon { guid: String },
    Install { url: String, guid: String },
    Uninstall { guid: String },
    Enable { guid: String },
}

/// A scripted extension manager.
///
/// Lookups for guids that were never registered fail with
/// [`ManagerError::NotFound`]. An install replays the configured progress
/// events through the handler before it settles.
#[derive(Default)]
pub struct MockExtensionManager {
    /// Host handles by guid; `None` resolves the lookup without a handle
    addons: Arc<RwLock<HashMap<String, Option<ClientAddon>>>>,

    /// Events fed to the progress handler on install
    install_events: Arc<RwLock<Vec<(ProgressEvent, Option<InstallEvent>)>>>,

    /// Handle registered when an install succeeds
    installs_as: Option<ClientAddon>,

    install_error: Option<ManagerError>,
    uninstall_error: Option<ManagerError>,
    enable_error: Option<ManagerError>,
    permission_prompts: bool,

    last_install_options: Arc<RwLock<Option<InstallOptions>>>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<MockManagerCall>>>,
}

impl MockExtensionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a host handle.
    pub fn with_addon(self, addon: ClientAddon) -> Self {
        write(&self.addons).insert(addon.id.clone(), Some(addon));
        self
    }

    /// Make lookups for `guid` resolve without a handle.
    pub fn with_null_addon(self, guid: impl Into<String>) -> Self {
        write(&self.addons).insert(guid.into(), None);
        self
    }

    /// Events replayed through the progress handler on every install.
    pub fn with_install_events(self, events: Vec<(ProgressEvent, Option<InstallEvent>)>) -> Self {
        *write(&self.install_events) = events;
        self
    }

    /// Register `addon` as a host handle once an install succeeds.
    pub fn with_installs_as(mut self, addon: ClientAddon) -> Self {
        self.installs_as = Some(addon);
        self
    }

    /// Fail every install with `error`, after replaying the events.
    pub fn with_install_error(mut self, error: ManagerError) -> Self {
        self.install_error = Some(error);
        self
    }

    /// Fail every uninstall with `error`.
    pub fn with_uninstall_error(mut self, error: ManagerError) -> Self {
        self.uninstall_error = Some(error);
        self
    }

    /// Fail every enable with `error`.
    pub fn with_enable_error(mut self, error: ManagerError) -> Self {
        self.enable_error = Some(error);
        self
    }

    /// Whether the host shows its own permission prompts.
    pub fn with_permission_prompts(mut self, enabled: bool) -> Self {
        self.permission_prompts = enabled;
        self
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockManagerCall> {
        read(&self.calls).clone()
    }

    pub fn clear_calls(&self) {
        write(&self.calls).clear();
    }

    pub fn last_install_options(&self) -> Option<InstallOptions> {
        read(&self.last_install_options).clone()
    }

    fn record(&self, call: MockManagerCall) {
        write(&self.calls).push(call);
    }
}

#[async_trait]
impl ExtensionManager for MockExtensionManager {
    async fn get_addon(&self, guid: &str) -> ManagerResult<Option<ClientAddon>> {
        self.record(MockManagerCall::GetAddon {
            guid: guid.to_string(),
        });

        read(&self.addons)
            .get(guid)
            .cloned()
            .ok_or_else(|| ManagerError::NotFound {
                guid: guid.to_string(),
            })
    }

    async fn install(
        &self,
        url: &str,
        handler: ProgressHandler,
        options: InstallOptions,
    ) -> ManagerResult<()> {
        self.record(MockManagerCall::Install {
            url: url.to_string(),
            guid: handler.guid().to_string(),
        });
        *write(&self.last_install_options) = Some(options);

        let events = read(&self.install_events).clone();
        for (install, event) in &events {
            handler.handle(install, event.as_ref());
        }

        if let Some(error) = &self.install_error {
            return Err(error.clone());
        }
        if let Some(addon) = &self.installs_as {
            write(&self.addons).insert(addon.id.clone(), Some(addon.clone()));
        }
        Ok(())
    }

    async fn uninstall(&self, guid: &str) -> ManagerResult<()> {
        self.record(MockManagerCall::Uninstall {
            guid: guid.to_string(),
        });

        if let Some(error) = &self.uninstall_error {
            return Err(error.clone());
        }
        write(&self.addons).remove(guid);
        Ok(())
    }

    async fn enable(&self, guid: &str) -> ManagerResult<()> {
        self.record(MockManagerCall::Enable {
            guid: guid.to_string(),
        });

        if let Some(error) = &self.enable_error {
            return Err(error.clone());
        }
        if let Some(Some(addon)) = write(&self.addons).get_mut(guid) {
            addon.is_enabled = true;
            addon.is_active = true;
        }
        Ok(())
    }

    fn permission_prompts_enabled(&self) -> bool {
        self.permission_prompts
    }
}

/// Dispatcher that applies actions to a real store and keeps a copy of each.
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    store: InstallationStore,
    actions: RwLock<Vec<InstallAction>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every action dispatched so far, in order.
    pub fn actions(&self) -> Vec<InstallAction> {
        read(&self.actions).clone()
    }

    pub fn clear(&self) {
        write(&self.actions).clear();
    }

    pub fn store(&self) -> &InstallationStore {
        &self.store
    }

    pub fn last_status(&self, guid: &str) -> Option<InstallationStatus> {
        self.store.status(guid)
    }
}

impl Dispatcher for RecordingDispatcher {
    fn dispatch(&self, action: InstallAction) {
        write(&self.actions).push(action.clone());
        self.store.dispatch(action);
    }

    fn installation(&self, guid: &str) -> Option<InstallationRecord> {
        self.store.get(guid)
    }
}

/// Tracking sink that keeps every event, or fails every send.
#[derive(Debug, Default)]
pub struct RecordingTracking {
    events: RwLock<Vec<TrackingEvent>>,
    fail: bool,
}

impl RecordingTracking {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose sends all fail. Failed events are still recorded.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<TrackingEvent> {
        read(&self.events).clone()
    }
}

impl TrackingSink for RecordingTracking {
    fn send_event(&self, event: &TrackingEvent) -> anyhow::Result<()> {
        write(&self.events).push(event.clone());
        if self.fail {
            anyhow::bail!("tracking unavailable");
        }
        Ok(())
    }
}
