//! Analytics sink and the install/uninstall event taxonomy.
//!
//! Tracking observes what the tracker did; it never decides anything. A sink
//! that fails is logged and otherwise ignored so analytics can never change
//! an installation outcome.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::AddonType;

pub const TRACKING_TYPE_EXTENSION: &str = "addon";
pub const TRACKING_TYPE_STATIC_THEME: &str = "statictheme";
/// Action value for installs through the theme callback, any theme type.
pub const TRACKING_TYPE_THEME: &str = "theme";
pub const TRACKING_TYPE_INVALID: &str = "invalid";

pub const ENABLE_EXTENSION_CATEGORY: &str = "AMO Addon Activation";
pub const ENABLE_THEME_CATEGORY: &str = "AMO Theme Activation";
pub const INSTALL_EXTENSION_CATEGORY: &str = "AMO Addon Installs";
pub const INSTALL_THEME_CATEGORY: &str = "AMO Theme Installs";
pub const INSTALL_CANCELLED_EXTENSION_CATEGORY: &str = "AMO Addon Installs Cancelled";
pub const INSTALL_CANCELLED_THEME_CATEGORY: &str = "AMO Theme Installs Cancelled";
pub const INSTALL_DOWNLOAD_FAILED_EXTENSION_CATEGORY: &str = "AMO Addon Installs Download Failed";
pub const INSTALL_DOWNLOAD_FAILED_THEME_CATEGORY: &str = "AMO Theme Installs Download Failed";
pub const INSTALL_STARTED_EXTENSION_CATEGORY: &str = "AMO Addon Installs Started";
pub const INSTALL_STARTED_THEME_CATEGORY: &str = "AMO Theme Installs Started";
pub const UNINSTALL_EXTENSION_CATEGORY: &str = "AMO Addon Uninstalls";
pub const UNINSTALL_THEME_CATEGORY: &str = "AMO Theme Uninstalls";

/// What happened, for category selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackedAction {
    Enable,
    Install,
    InstallCancelled,
    InstallDownloadFailed,
    InstallStarted,
    Uninstall,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingEvent {
    pub action: String,
    pub category: String,
    pub label: String,
}

impl TrackingEvent {
    pub fn new(
        action: impl Into<String>,
        category: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            action: action.into(),
            category: category.into(),
            label: label.into(),
        }
    }

    /// Event for `tracked` on an add-on of `addon_type`, labelled `label`.
    pub fn for_addon(addon_type: &AddonType, tracked: TrackedAction, label: impl Into<String>) -> Self {
        Self {
            action: addon_type_for_tracking(addon_type).to_string(),
            category: addon_event_category(addon_type, tracked).to_string(),
            label: label.into(),
        }
    }
}

/// Tracking `action` value for an add-on type.
pub fn addon_type_for_tracking(addon_type: &AddonType) -> &'static str {
    match addon_type {
        AddonType::Extension | AddonType::Dictionary | AddonType::Language => {
            TRACKING_TYPE_EXTENSION
        }
        AddonType::StaticTheme => TRACKING_TYPE_STATIC_THEME,
        AddonType::Persona | AddonType::Search | AddonType::Unknown => TRACKING_TYPE_INVALID,
    }
}

/// Tracking `category` for an action on an add-on type.
pub fn addon_event_category(addon_type: &AddonType, tracked: TrackedAction) -> &'static str {
    let theme = *addon_type == AddonType::StaticTheme;

    match (tracked, theme) {
        (TrackedAction::Enable, true) => ENABLE_THEME_CATEGORY,
        (TrackedAction::Enable, false) => ENABLE_EXTENSION_CATEGORY,
        (TrackedAction::InstallCancelled, true) => INSTALL_CANCELLED_THEME_CATEGORY,
        (TrackedAction::InstallCancelled, false) => INSTALL_CANCELLED_EXTENSION_CATEGORY,
        (TrackedAction::InstallDownloadFailed, true) => INSTALL_DOWNLOAD_FAILED_THEME_CATEGORY,
        (TrackedAction::InstallDownloadFailed, false) => {
            INSTALL_DOWNLOAD_FAILED_EXTENSION_CATEGORY
        }
        (TrackedAction::InstallStarted, true) => INSTALL_STARTED_THEME_CATEGORY,
        (TrackedAction::InstallStarted, false) => INSTALL_STARTED_EXTENSION_CATEGORY,
        (TrackedAction::Uninstall, true) => UNINSTALL_THEME_CATEGORY,
        (TrackedAction::Uninstall, false) => UNINSTALL_EXTENSION_CATEGORY,
        (TrackedAction::Install, true) => INSTALL_THEME_CATEGORY,
        (TrackedAction::Install, false) => INSTALL_EXTENSION_CATEGORY,
    }
}

/// Analytics sink.
pub trait TrackingSink: Send + Sync {
    /// Record one event. Errors are logged by the caller and otherwise ignored.
    fn send_event(&self, event: &TrackingEvent) -> Result<()>;
}

/// Send an event, logging sink failures.
pub(crate) fn send(sink: &dyn TrackingSink, event: TrackingEvent) {
    if let Err(e) = sink.send_event(&event) {
        warn!(
            category = %event.category,
            label = %event.label,
            error = %e,
            "tracking sink failed"
        );
    }
}

/// Sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracking;

impl TrackingSink for NoopTracking {
    fn send_event(&self, _event: &TrackingEvent) -> Result<()> {
        Ok(())
    }
}
