//! Events delivered by the host extension manager.
//!
//! Two families:
//! - install events, delivered to the [`ProgressHandler`](crate::ProgressHandler)
//!   registered for one in-flight install ([`ProgressEvent`] + [`InstallEvent`])
//! - global change events, fired for any add-on ([`AddonChangeEvent`])
//!
//! Host event names are strings; they are parsed into closed enums here so the
//! rest of the crate matches exhaustively. Names the crate does not know map to
//! an `Unknown` variant for install events and to an error for change events.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::InstallerError;

/// `state` field of the host's in-flight install object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstallState {
    #[serde(rename = "STATE_AVAILABLE")]
    Available,
    #[serde(rename = "STATE_DOWNLOADING")]
    Downloading,
    #[serde(rename = "STATE_CHECKING")]
    Checking,
    #[serde(rename = "STATE_DOWNLOADED")]
    Downloaded,
    #[serde(rename = "STATE_DOWNLOAD_FAILED")]
    DownloadFailed,
    #[serde(rename = "STATE_INSTALLING")]
    Installing,
    #[serde(rename = "STATE_INSTALLED")]
    Installed,
    #[serde(rename = "STATE_INSTALL_FAILED")]
    InstallFailed,
    #[serde(rename = "STATE_CANCELLED")]
    Cancelled,
    #[serde(other)]
    Unknown,
}

/// Snapshot of an in-flight install, passed with every install event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub state: InstallState,
    #[serde(default)]
    pub progress: i64,
    /// `-1` when the host does not know the download size.
    #[serde(default)]
    pub max_progress: i64,
}

impl ProgressEvent {
    pub fn new(state: InstallState) -> Self {
        Self {
            state,
            progress: 0,
            max_progress: 0,
        }
    }

    pub fn downloading(progress: i64, max_progress: i64) -> Self {
        Self {
            state: InstallState::Downloading,
            progress,
            max_progress,
        }
    }
}

/// Host error string for a download whose hash did not match.
pub const ERROR_CORRUPT_FILE: &str = "ERROR_CORRUPT_FILE";

/// Callback discriminator of an install event (`event.type` on the host).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InstallEvent {
    #[serde(rename = "onDownloadStarted")]
    DownloadStarted,
    #[serde(rename = "onDownloadProgress")]
    DownloadProgress,
    #[serde(rename = "onDownloadEnded")]
    DownloadEnded,
    #[serde(rename = "onDownloadCancelled")]
    DownloadCancelled,
    #[serde(rename = "onDownloadFailed")]
    DownloadFailed {
        /// `event.target.error` when the host provides one.
        #[serde(default)]
        error: Option<String>,
    },
    #[serde(rename = "onInstallStarted")]
    InstallStarted,
    #[serde(rename = "onInstallProgress")]
    InstallProgress,
    #[serde(rename = "onInstallEnded")]
    InstallEnded,
    #[serde(rename = "onInstallCancelled")]
    InstallCancelled,
    #[serde(rename = "onInstallFailed")]
    InstallFailed,
    #[serde(other)]
    Unknown,
}

impl InstallEvent {
    pub fn is_corrupt_file(&self) -> bool {
        matches!(self, Self::DownloadFailed { error: Some(e) } if e == ERROR_CORRUPT_FILE)
    }
}

/// Kind of a host-global add-on change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeEventKind {
    #[serde(rename = "onEnabling")]
    Enabling,
    #[serde(rename = "onEnabled")]
    Enabled,
    #[serde(rename = "onDisabling")]
    Disabling,
    #[serde(rename = "onDisabled")]
    Disabled,
    #[serde(rename = "onInstalling")]
    Installing,
    #[serde(rename = "onInstalled")]
    Installed,
    #[serde(rename = "onUninstalling")]
    Uninstalling,
    #[serde(rename = "onUninstalled")]
    Uninstalled,
    #[serde(rename = "onOperationCancelled")]
    OperationCancelled,
}

impl ChangeEventKind {
    pub const ALL: [ChangeEventKind; 9] = [
        Self::Enabling,
        Self::Enabled,
        Self::Disabling,
        Self::Disabled,
        Self::Installing,
        Self::Installed,
        Self::Uninstalling,
        Self::Uninstalled,
        Self::OperationCancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enabling => "onEnabling",
            Self::Enabled => "onEnabled",
            Self::Disabling => "onDisabling",
            Self::Disabled => "onDisabled",
            Self::Installing => "onInstalling",
            Self::Installed => "onInstalled",
            Self::Uninstalling => "onUninstalling",
            Self::Uninstalled => "onUninstalled",
            Self::OperationCancelled => "onOperationCancelled",
        }
    }
}

impl FromStr for ChangeEventKind {
    type Err = InstallerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| InstallerError::UnknownChangeEvent {
                kind: s.to_string(),
            })
    }
}

/// Global change event fired by the host for any add-on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddonChangeEvent {
    /// The add-on guid.
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ChangeEventKind,
    #[serde(default)]
    pub needs_restart: bool,
}

impl AddonChangeEvent {
    pub fn new(id: impl Into<String>, kind: ChangeEventKind) -> Self {
        Self {
            id: id.into(),
            kind,
            needs_restart: false,
        }
    }
}
