//! Actions the tracker dispatches to the store.
//!
//! Actions are facts: each one describes a single state change for one guid
//! (or the info dialog) and carries every value the reducer needs. They
//! serialize as `{"type": "...", "payload": {...}}` with camelCase payload
//! keys, matching what the host page reads.

use serde::{Deserialize, Serialize};

use crate::types::{ErrorCode, InstallationStatus, ThemeNode};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum InstallAction {
    /// Set the status of an add-on.
    InstallState(InstallStatePayload),

    /// An install was requested and the download is about to start.
    StartDownload { guid: String },

    /// Download percentage update.
    DownloadProgress { guid: String, download_progress: u8 },

    /// The host cancelled the install; the add-on is back to uninstalled.
    InstallCancelled { guid: String },

    /// An install or uninstall failed.
    InstallError { guid: String, error: ErrorCode },

    /// A theme preview was applied to `node`.
    ThemePreviewStarted { guid: String, node: ThemeNode },

    /// The theme preview was removed.
    ThemePreviewCleared { guid: String },

    /// Transient notification shown when the host has no permission prompts.
    ShowInfo(InfoDialog),

    CloseInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallStatePayload {
    pub guid: String,
    pub status: InstallationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_uninstall: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoDialog {
    pub addon_name: String,
    pub image_url: Option<String>,
    pub auto_close: bool,
}

impl InstallAction {
    pub fn set_status(guid: impl Into<String>, status: InstallationStatus) -> Self {
        Self::InstallState(InstallStatePayload {
            guid: guid.into(),
            status,
            url: None,
            error: None,
            can_uninstall: None,
        })
    }

    /// `INSTALL_STATE` with status `ERROR` and the given code.
    pub fn set_error_status(guid: impl Into<String>, error: ErrorCode) -> Self {
        Self::InstallState(InstallStatePayload {
            guid: guid.into(),
            status: InstallationStatus::Error,
            url: None,
            error: Some(error),
            can_uninstall: None,
        })
    }

    pub fn install_error(guid: impl Into<String>, error: ErrorCode) -> Self {
        Self::InstallError {
            guid: guid.into(),
            error,
        }
    }

    /// Guid the action applies to, `None` for dialog actions.
    pub fn guid(&self) -> Option<&str> {
        match self {
            Self::InstallState(payload) => Some(&payload.guid),
            Self::StartDownload { guid }
            | Self::DownloadProgress { guid, .. }
            | Self::InstallCancelled { guid }
            | Self::InstallError { guid, .. }
            | Self::ThemePreviewStarted { guid, .. }
            | Self::ThemePreviewCleared { guid } => Some(guid),
            Self::ShowInfo(_) | Self::CloseInfo => None,
        }
    }

    /// Wire name of the action type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::InstallState(_) => "INSTALL_STATE",
            Self::StartDownload { .. } => "START_DOWNLOAD",
            Self::DownloadProgress { .. } => "DOWNLOAD_PROGRESS",
            Self::InstallCancelled { .. } => "INSTALL_CANCELLED",
            Self::InstallError { .. } => "INSTALL_ERROR",
            Self::ThemePreviewStarted { .. } => "THEME_PREVIEW_STARTED",
            Self::ThemePreviewCleared { .. } => "THEME_PREVIEW_CLEARED",
            Self::ShowInfo(_) => "SHOW_INFO",
            Self::CloseInfo => "CLOSE_INFO",
        }
    }

    /// The status this action leaves the record in, when it decides one.
    pub fn resulting_status(&self) -> Option<InstallationStatus> {
        match self {
            Self::InstallState(payload) => Some(payload.status),
            Self::InstallCancelled { .. } => Some(InstallationStatus::Uninstalled),
            Self::InstallError { .. } => Some(InstallationStatus::Error),
            _ => None,
        }
    }

    /// The error code this action sets, if any.
    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            Self::InstallState(payload) => payload.error,
            Self::InstallError { error, .. } => Some(*error),
            _ => None,
        }
    }
}
