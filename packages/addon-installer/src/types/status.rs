//! Installation status, error codes and the per-add-on record.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::theme::ThemeNode;

/// Observable installation status of one add-on.
///
/// Exactly one status is associated with a guid at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstallationStatus {
    Uninstalled,
    Installing,
    Installed,
    Uninstalling,
    Enabled,
    Disabled,
    Error,
}

impl InstallationStatus {
    /// Statuses that only an explicit install/uninstall can produce.
    pub fn is_transitional(&self) -> bool {
        matches!(self, Self::Installing | Self::Uninstalling)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninstalled => "UNINSTALLED",
            Self::Installing => "INSTALLING",
            Self::Installed => "INSTALLED",
            Self::Uninstalling => "UNINSTALLING",
            Self::Enabled => "ENABLED",
            Self::Disabled => "DISABLED",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for InstallationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error code carried by a record whose status is [`InstallationStatus::Error`].
///
/// All codes are terminal: nothing retries automatically. Recovery takes a
/// new user action or a status re-query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Null handle from the host, or an unclassified enable failure.
    FatalError,
    /// The host rejected `install()`.
    FatalInstallError,
    /// The host rejected `uninstall()`.
    FatalUninstallError,
    /// The host reported a failed download mid-progress.
    DownloadFailed,
    /// The host reported a failed install mid-progress.
    InstallFailed,
    /// The downloaded file failed its integrity check.
    #[serde(rename = "ERROR_CORRUPT_FILE")]
    CorruptFile,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FatalError => "FATAL_ERROR",
            Self::FatalInstallError => "FATAL_INSTALL_ERROR",
            Self::FatalUninstallError => "FATAL_UNINSTALL_ERROR",
            Self::DownloadFailed => "DOWNLOAD_FAILED",
            Self::InstallFailed => "INSTALL_FAILED",
            Self::CorruptFile => "ERROR_CORRUPT_FILE",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Installation state for one add-on, owned by the store.
///
/// Created on the first action naming the guid and updated in place by every
/// later one. Records are never removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallationRecord {
    pub guid: String,
    pub status: InstallationStatus,
    /// Integer percentage in `[0, 100]`.
    pub download_progress: u8,
    /// `Some` exactly when `status` is `Error`.
    pub error: Option<ErrorCode>,
    pub is_previewing_theme: bool,
    /// Node the current theme preview was applied to, kept for the reset.
    pub preview_node: Option<ThemeNode>,
    pub url: Option<String>,
    pub can_uninstall: bool,
    pub updated_at: DateTime<Utc>,
}

impl InstallationRecord {
    pub fn new(guid: impl Into<String>) -> Self {
        Self {
            guid: guid.into(),
            status: InstallationStatus::Uninstalled,
            download_progress: 0,
            error: None,
            is_previewing_theme: false,
            preview_node: None,
            url: None,
            can_uninstall: true,
            updated_at: Utc::now(),
        }
    }

    /// Set the status, keeping the error field consistent with it.
    pub(crate) fn set_status(&mut self, status: InstallationStatus, error: Option<ErrorCode>) {
        self.status = status;
        self.error = match status {
            InstallationStatus::Error => Some(error.unwrap_or(ErrorCode::FatalError)),
            _ => None,
        };
    }
}
