//! Reducer-backed installation state.
//!
//! The store is the only owner of [`InstallationRecord`]s. The tracker never
//! mutates records; it dispatches [`InstallAction`]s and the store applies
//! each one in a single reducer pass while holding that guid's entry lock.
//!
//! # Key Properties
//!
//! - **One action, one reducer pass**: updates to a guid are atomic
//! - **Records are never removed**: they live for the session
//! - **Applied actions are broadcast**: see [`ActionBus`]
//! - **Bus order is apply order**: dispatches are serialized, so sequence
//!   numbers follow the order the reducer ran in

use std::sync::{Mutex, MutexGuard, RwLock};

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::debug;

use crate::actions::{InfoDialog, InstallAction};
use crate::bus::{ActionBus, ActionEnvelope};
use crate::types::{InstallationRecord, InstallationStatus};

/// Where the tracker sends actions and reads current state.
///
/// `dispatch` must apply the action before returning so that a later
/// `installation` call observes it.
pub trait Dispatcher: Send + Sync {
    fn dispatch(&self, action: InstallAction);

    /// Current record for `guid`, if any action has named it.
    fn installation(&self, guid: &str) -> Option<InstallationRecord>;
}

/// In-memory [`Dispatcher`] that reduces actions into per-guid records.
pub struct InstallationStore {
    records: DashMap<String, InstallationRecord>,
    info_dialog: RwLock<Option<InfoDialog>>,
    /// Held across reduce and publish in `dispatch`.
    seq: Mutex<u64>,
    bus: ActionBus,
}

impl InstallationStore {
    pub fn new() -> Self {
        Self::with_bus(ActionBus::new())
    }

    pub fn with_bus(bus: ActionBus) -> Self {
        Self {
            records: DashMap::new(),
            info_dialog: RwLock::new(None),
            seq: Mutex::new(0),
            bus,
        }
    }

    /// Apply one action to the state.
    pub fn reduce(&self, action: &InstallAction) {
        debug!(
            action = action.type_name(),
            guid = ?action.guid(),
            "reducing action"
        );

        match action {
            InstallAction::InstallState(payload) => {
                self.update(&payload.guid, |record| {
                    record.set_status(payload.status, payload.error);
                    if payload.status != InstallationStatus::Installing {
                        record.download_progress = 0;
                    }
                    if let Some(url) = &payload.url {
                        record.url = Some(url.clone());
                    }
                    if let Some(can_uninstall) = payload.can_uninstall {
                        record.can_uninstall = can_uninstall;
                    }
                });
            }
            InstallAction::StartDownload { guid } => {
                self.update(guid, |record| {
                    record.download_progress = 0;
                    if record.status == InstallationStatus::Error {
                        record.set_status(InstallationStatus::Uninstalled, None);
                    }
                });
            }
            InstallAction::DownloadProgress {
                guid,
                download_progress,
            } => {
                self.update(guid, |record| {
                    record.download_progress = (*download_progress).min(100);
                });
            }
            InstallAction::InstallCancelled { guid } => {
                self.update(guid, |record| {
                    record.set_status(InstallationStatus::Uninstalled, None);
                    record.download_progress = 0;
                });
            }
            InstallAction::InstallError { guid, error } => {
                self.update(guid, |record| {
                    record.set_status(InstallationStatus::Error, Some(*error));
                    record.download_progress = 0;
                });
            }
            InstallAction::ThemePreviewStarted { guid, node } => {
                self.update(guid, |record| {
                    record.is_previewing_theme = true;
                    record.preview_node = Some(node.clone());
                });
            }
            InstallAction::ThemePreviewCleared { guid } => {
                self.update(guid, |record| {
                    record.is_previewing_theme = false;
                    record.preview_node = None;
                });
            }
            InstallAction::ShowInfo(dialog) => {
                *self.info_dialog.write().unwrap_or_else(|e| e.into_inner()) = Some(dialog.clone());
            }
            InstallAction::CloseInfo => {
                *self.info_dialog.write().unwrap_or_else(|e| e.into_inner()) = None;
            }
        }
    }

    fn update(&self, guid: &str, apply: impl FnOnce(&mut InstallationRecord)) {
        let mut record = self
            .records
            .entry(guid.to_string())
            .or_insert_with(|| InstallationRecord::new(guid));
        apply(record.value_mut());
        record.updated_at = Utc::now();
    }

    pub fn get(&self, guid: &str) -> Option<InstallationRecord> {
        self.records.get(guid).map(|record| record.value().clone())
    }

    pub fn status(&self, guid: &str) -> Option<InstallationStatus> {
        self.records.get(guid).map(|record| record.status)
    }

    pub fn info_dialog(&self) -> Option<InfoDialog> {
        self.info_dialog
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// All records, sorted by guid.
    pub fn snapshot(&self) -> Vec<InstallationRecord> {
        let mut records: Vec<_> = self.records.iter().map(|r| r.value().clone()).collect();
        records.sort_by(|a, b| a.guid.cmp(&b.guid));
        records
    }

    pub fn snapshot_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.snapshot())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of actions dispatched so far.
    pub fn applied(&self) -> u64 {
        *self.lock_seq()
    }

    fn lock_seq(&self) -> MutexGuard<'_, u64> {
        self.seq.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ActionEnvelope> {
        self.bus.subscribe()
    }

    pub fn bus(&self) -> &ActionBus {
        &self.bus
    }
}

impl Default for InstallationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher for InstallationStore {
    fn dispatch(&self, action: InstallAction) {
        let mut seq = self.lock_seq();
        self.reduce(&action);
        *seq += 1;
        self.bus.publish(ActionEnvelope {
            seq: *seq,
            dispatched_at: Utc::now(),
            action,
        });
    }

    fn installation(&self, guid: &str) -> Option<InstallationRecord> {
        self.get(guid)
    }
}

impl std::fmt::Debug for InstallationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallationStore")
            .field("records", &self.records.len())
            .field("applied", &self.applied())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ErrorCode, ThemeNode};

    const GUID: &str = "@my-addon";

    #[test]
    fn test_first_action_creates_record() {
        let store = InstallationStore::new();
        assert!(store.get(GUID).is_none());

        store.dispatch(InstallAction::set_status(GUID, InstallationStatus::Enabled));

        let record = store.get(GUID).unwrap();
        assert_eq!(record.status, InstallationStatus::Enabled);
        assert_eq!(record.error, None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_error_status_always_carries_code() {
        let store = InstallationStore::new();
        store.dispatch(InstallAction::set_status(GUID, InstallationStatus::Error));

        let record = store.get(GUID).unwrap();
        assert_eq!(record.status, InstallationStatus::Error);
        assert_eq!(record.error, Some(ErrorCode::FatalError));
    }

    #[test]
    fn test_install_state_keeps_url_and_can_uninstall() {
        let store = InstallationStore::new();
        store.dispatch(InstallAction::InstallState(crate::actions::InstallStatePayload {
            guid: GUID.into(),
            status: InstallationStatus::Enabled,
            url: Some("https://a.m.o/file.xpi".into()),
            error: None,
            can_uninstall: Some(false),
        }));
        store.dispatch(InstallAction::set_status(GUID, InstallationStatus::Disabled));

        let record = store.get(GUID).unwrap();
        assert_eq!(record.status, InstallationStatus::Disabled);
        assert_eq!(record.url.as_deref(), Some("https://a.m.o/file.xpi"));
        assert!(!record.can_uninstall);
    }

    #[test]
    fn test_download_lifecycle() {
        let store = InstallationStore::new();

        store.dispatch(InstallAction::StartDownload { guid: GUID.into() });
        store.dispatch(InstallAction::DownloadProgress {
            guid: GUID.into(),
            download_progress: 30,
        });
        assert_eq!(store.get(GUID).unwrap().download_progress, 30);

        store.dispatch(InstallAction::DownloadProgress {
            guid: GUID.into(),
            download_progress: 100,
        });
        store.dispatch(InstallAction::set_status(GUID, InstallationStatus::Installing));

        let record = store.get(GUID).unwrap();
        assert_eq!(record.status, InstallationStatus::Installing);
        assert_eq!(record.download_progress, 100);
    }

    #[test]
    fn test_download_progress_is_clamped() {
        let store = InstallationStore::new();
        store.dispatch(InstallAction::DownloadProgress {
            guid: GUID.into(),
            download_progress: 250,
        });
        assert_eq!(store.get(GUID).unwrap().download_progress, 100);
    }

    #[test]
    fn test_cancel_resets_to_uninstalled() {
        let store = InstallationStore::new();
        store.dispatch(InstallAction::set_status(GUID, InstallationStatus::Installing));
        store.dispatch(InstallAction::InstallCancelled { guid: GUID.into() });

        let record = store.get(GUID).unwrap();
        assert_eq!(record.status, InstallationStatus::Uninstalled);
        assert_eq!(record.download_progress, 0);
    }

    #[test]
    fn test_start_download_clears_previous_error() {
        let store = InstallationStore::new();
        store.dispatch(InstallAction::install_error(GUID, ErrorCode::FatalInstallError));
        store.dispatch(InstallAction::StartDownload { guid: GUID.into() });

        let record = store.get(GUID).unwrap();
        assert_eq!(record.status, InstallationStatus::Uninstalled);
        assert_eq!(record.error, None);
    }

    #[test]
    fn test_start_download_keeps_non_error_status() {
        let store = InstallationStore::new();
        store.dispatch(InstallAction::set_status(GUID, InstallationStatus::Disabled));
        store.dispatch(InstallAction::StartDownload { guid: GUID.into() });

        assert_eq!(store.status(GUID), Some(InstallationStatus::Disabled));
    }

    #[test]
    fn test_theme_preview_flags() {
        let store = InstallationStore::new();
        let node = ThemeNode::new("theme-card");

        store.dispatch(InstallAction::ThemePreviewStarted {
            guid: GUID.into(),
            node: node.clone(),
        });
        let record = store.get(GUID).unwrap();
        assert!(record.is_previewing_theme);
        assert_eq!(record.preview_node, Some(node));

        store.dispatch(InstallAction::ThemePreviewCleared { guid: GUID.into() });
        let record = store.get(GUID).unwrap();
        assert!(!record.is_previewing_theme);
        assert_eq!(record.preview_node, None);
    }

    #[test]
    fn test_info_dialog_does_not_touch_records() {
        let store = InstallationStore::new();
        store.dispatch(InstallAction::ShowInfo(InfoDialog {
            addon_name: "My Add-on".into(),
            image_url: None,
            auto_close: true,
        }));

        assert!(store.is_empty());
        assert_eq!(store.info_dialog().unwrap().addon_name, "My Add-on");

        store.dispatch(InstallAction::CloseInfo);
        assert!(store.info_dialog().is_none());
    }

    #[tokio::test]
    async fn test_dispatch_publishes_in_order() {
        let store = InstallationStore::new();
        let mut receiver = store.subscribe();

        store.dispatch(InstallAction::set_status(GUID, InstallationStatus::Uninstalling));
        store.dispatch(InstallAction::set_status(GUID, InstallationStatus::Uninstalled));

        let first = receiver.recv().await.unwrap();
        let second = receiver.recv().await.unwrap();
        assert_eq!(first.seq, 1);
        assert_eq!(second.seq, 2);
        assert_eq!(
            first.action.resulting_status(),
            Some(InstallationStatus::Uninstalling)
        );
        assert_eq!(store.applied(), 2);
    }

    #[test]
    fn test_concurrent_dispatch_publishes_in_apply_order() {
        let store = InstallationStore::new();
        let mut receiver = store.subscribe();

        std::thread::scope(|scope| {
            for worker in 0..8u8 {
                let store = &store;
                scope.spawn(move || {
                    for step in 0..50u8 {
                        store.dispatch(InstallAction::DownloadProgress {
                            guid: GUID.into(),
                            download_progress: (worker * 10 + step) % 101,
                        });
                    }
                });
            }
        });

        let envelopes = crate::testing::drain_actions(&mut receiver);
        assert_eq!(envelopes.len(), 400);
        assert_eq!(store.applied(), 400);

        let seqs: Vec<u64> = envelopes.iter().map(|e| e.seq).collect();
        assert_eq!(seqs, (1..=400).collect::<Vec<u64>>());

        let last = match &envelopes[399].action {
            InstallAction::DownloadProgress {
                download_progress, ..
            } => *download_progress,
            other => panic!("unexpected action {other:?}"),
        };
        assert_eq!(store.get(GUID).unwrap().download_progress, last);
    }

    #[test]
    fn test_snapshot_is_sorted_json() {
        let store = InstallationStore::new();
        store.dispatch(InstallAction::set_status("@b", InstallationStatus::Enabled));
        store.dispatch(InstallAction::set_status("@a", InstallationStatus::Disabled));

        let guids: Vec<_> = store.snapshot().into_iter().map(|r| r.guid).collect();
        assert_eq!(guids, vec!["@a", "@b"]);

        let json = store.snapshot_json().unwrap();
        assert!(json.contains("\"DISABLED\""));
    }
}
