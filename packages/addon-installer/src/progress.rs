//! Per-install progress handler.
//!
//! The host calls the handler for every lifecycle event of one in-flight
//! install. Each call maps `(state, callback)` to at most one action:
//!
//! | Trigger                         | Action                                   |
//! |---------------------------------|------------------------------------------|
//! | `state == STATE_DOWNLOADING`    | `DOWNLOAD_PROGRESS` with the percentage  |
//! | `onDownloadFailed` (corrupt)    | `INSTALL_ERROR` / `ERROR_CORRUPT_FILE`   |
//! | `onDownloadFailed`              | `INSTALL_ERROR` / `DOWNLOAD_FAILED`      |
//! | `onDownloadEnded`               | `INSTALL_STATE` / `INSTALLING`           |
//! | `onInstallCancelled`            | `INSTALL_CANCELLED`                      |
//! | `onInstallFailed`               | `INSTALL_ERROR` / `INSTALL_FAILED`       |
//! | anything else                   | nothing                                  |
//!
//! The handler keeps no state of its own beyond what it was built with.

use std::sync::Arc;

use tracing::{debug, info};

use crate::actions::InstallAction;
use crate::events::{InstallEvent, InstallState, ProgressEvent};
use crate::store::Dispatcher;
use crate::tracking::{self, TrackedAction, TrackingEvent, TrackingSink};
use crate::types::{AddonType, ErrorCode, InstallationStatus};

/// Percentage of `progress` over `max_progress`, rounded, in `[0, 100]`.
///
/// An unknown total (`max_progress <= 0`, the host sends `-1`) reports 0.
/// Negative progress counts as none.
pub fn download_progress(progress: i64, max_progress: i64) -> u8 {
    if max_progress <= 0 {
        return 0;
    }
    let progress = i128::from(progress.max(0));
    let max_progress = i128::from(max_progress);
    let percent = (200 * progress + max_progress) / (2 * max_progress);
    percent.min(100) as u8
}

/// Maps the events of one in-flight install to actions.
///
/// Created by [`InstallationTracker::make_progress_handler`](crate::InstallationTracker::make_progress_handler)
/// and handed to the host with the install request.
#[derive(Clone)]
pub struct ProgressHandler {
    guid: String,
    name: String,
    addon_type: AddonType,
    dispatcher: Arc<dyn Dispatcher>,
    tracking: Arc<dyn TrackingSink>,
}

impl ProgressHandler {
    /// Handler for `guid`; `name` and `addon_type` label tracking events.
    pub fn new(
        guid: impl Into<String>,
        name: impl Into<String>,
        addon_type: AddonType,
        dispatcher: Arc<dyn Dispatcher>,
        tracking: Arc<dyn TrackingSink>,
    ) -> Self {
        Self {
            guid: guid.into(),
            name: name.into(),
            addon_type,
            dispatcher,
            tracking,
        }
    }

    pub fn guid(&self) -> &str {
        &self.guid
    }

    /// Handle one host event for this install.
    pub fn handle(&self, install: &ProgressEvent, event: Option<&InstallEvent>) {
        if install.state == InstallState::Downloading {
            self.dispatcher.dispatch(InstallAction::DownloadProgress {
                guid: self.guid.clone(),
                download_progress: download_progress(install.progress, install.max_progress),
            });
            return;
        }

        let Some(event) = event else {
            debug!(guid = %self.guid, state = ?install.state, "install event without callback ignored");
            return;
        };

        match event {
            InstallEvent::DownloadFailed { .. } if event.is_corrupt_file() => {
                info!(guid = %self.guid, "download failed: corrupt file");
                self.dispatcher
                    .dispatch(InstallAction::install_error(&self.guid, ErrorCode::CorruptFile));
            }
            InstallEvent::DownloadFailed { .. } => {
                info!(guid = %self.guid, "download failed");
                self.dispatcher
                    .dispatch(InstallAction::install_error(&self.guid, ErrorCode::DownloadFailed));
                self.track(TrackedAction::InstallDownloadFailed);
            }
            InstallEvent::DownloadEnded => {
                self.dispatcher
                    .dispatch(InstallAction::set_status(&self.guid, InstallationStatus::Installing));
            }
            InstallEvent::InstallCancelled => {
                info!(guid = %self.guid, "install cancelled");
                self.dispatcher.dispatch(InstallAction::InstallCancelled {
                    guid: self.guid.clone(),
                });
                self.track(TrackedAction::InstallCancelled);
            }
            InstallEvent::InstallFailed => {
                info!(guid = %self.guid, "install failed");
                self.dispatcher
                    .dispatch(InstallAction::install_error(&self.guid, ErrorCode::InstallFailed));
            }
            InstallEvent::DownloadStarted
            | InstallEvent::DownloadProgress
            | InstallEvent::DownloadCancelled
            | InstallEvent::InstallStarted
            | InstallEvent::InstallProgress
            | InstallEvent::InstallEnded
            | InstallEvent::Unknown => {
                debug!(guid = %self.guid, event = ?event, "install event ignored");
            }
        }
    }

    fn track(&self, tracked: TrackedAction) {
        tracking::send(
            self.tracking.as_ref(),
            TrackingEvent::for_addon(&self.addon_type, tracked, self.name.clone()),
        );
    }
}

impl std::fmt::Debug for ProgressHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressHandler")
            .field("guid", &self.guid)
            .field("addon_type", &self.addon_type)
            .finish_non_exhaustive()
    }
}
