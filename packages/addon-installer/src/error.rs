//! Typed errors for the installer.
//!
//! Host failures are never returned to callers of the tracker: they are caught
//! inside each operation and turned into an `ERROR` status dispatch. What does
//! come back as `Err` is a caller contract violation, detected before any
//! dispatch happens.

use thiserror::Error;

/// Errors reported by the host extension manager.
///
/// This is the typed host contract: "capability unavailable" is its own
/// variant instead of a sentinel error message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ManagerError {
    /// The host has no add-on with this guid.
    #[error("add-on not found: {guid}")]
    NotFound { guid: String },

    /// The host add-on handle cannot be enabled programmatically.
    #[error("setEnabled not available for {guid}")]
    SetEnableNotAvailable { guid: String },

    /// No extension manager is exposed to this page.
    #[error("extension manager unavailable")]
    Unavailable,

    /// The host rejected the request.
    #[error("extension manager rejected the request: {reason}")]
    Rejected { reason: String },
}

impl ManagerError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }
}

/// Errors returned by installer operations.
#[derive(Debug, Error)]
pub enum InstallerError {
    /// Extensions need a download URL; themes may go through the theme path.
    #[error("installURL is required to install {guid}")]
    MissingInstallUrl { guid: String },

    /// Operations need a guid to act on.
    #[error("guid is required")]
    EmptyGuid,

    /// The host fired a global event this crate does not know.
    #[error("unknown global event: {kind}")]
    UnknownChangeEvent { kind: String },

    /// Host lookup failed where the caller asked for the result.
    #[error("extension manager error: {0}")]
    Manager(#[from] ManagerError),

    /// Theme operations act on the add-on the tracker was built for.
    #[error("no add-on bound to this tracker")]
    NoBoundAddon,

    #[error("invalid install URL {url}: {source}")]
    InvalidInstallUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Result type alias for installer operations.
pub type Result<T> = std::result::Result<T, InstallerError>;

/// Result type alias for host calls.
pub type ManagerResult<T> = std::result::Result<T, ManagerError>;
