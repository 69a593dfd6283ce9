//! # Add-on Installer
//!
//! Tracks the installation status of browser add-ons by reconciling what the
//! host extension manager reports with a reducer-backed store.
//!
//! ## Core Concepts
//!
//! The installer separates **requests** from **facts**:
//! - [`InstallationTracker`] = requests (install, uninstall, enable, query)
//! - [`InstallAction`] = facts (what the host said happened)
//!
//! Only the store mutates state. The tracker and the progress handlers it
//! creates translate host outcomes into actions and dispatch them.
//!
//! ## Architecture
//!
//! ```text
//! UI / caller
//!     │
//!     ▼ install() / uninstall() / enable() / set_current_status()
//! InstallationTracker ─────► ExtensionManager (host)
//!     │                          │
//!     │                          ├─► ProgressHandler.handle()  (per install)
//!     │                          │
//!     │                          └─► global change events ─► ChangeListener
//!     │                                                         │
//!     ▼ dispatch()                                              │
//! InstallationStore.reduce() ◄──────────────────────────────────┘
//!     │
//!     ▼ publish()
//! ActionBus ─► subscribers
//! ```
//!
//! ## Key Invariants
//!
//! 1. **Host failures never escape** - they become an `ERROR` status with a code
//! 2. **Contract violations fail early** - returned as `Err` before any dispatch
//! 3. **`ERROR` always carries a code** - the reducer fills in `FATAL_ERROR`
//! 4. **Records are never deleted** - they live for the session
//! 5. **Tracking observes only** - a failing sink never changes an outcome
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use addon_installer::{AddonInfo, AddonType, InstallationStore, InstallationTracker, InstallParams};
//!
//! let store = Arc::new(InstallationStore::new());
//! let tracker = InstallationTracker::new(manager, store.clone())
//!     .for_addon(
//!         AddonInfo::new("@my-addon", "My Add-on", AddonType::Extension)
//!             .with_install_url("https://addons.example/my-addon.xpi"),
//!     );
//!
//! tracker.set_current_status("@my-addon", None).await?;
//! tracker.install(InstallParams::from(tracker.addon().unwrap())).await?;
//!
//! println!("{:?}", store.status("@my-addon"));
//! ```

pub mod actions;
pub mod bus;
pub mod config;
pub mod error;
pub mod events;
pub mod listener;
pub mod manager;
pub mod platform;
pub mod progress;
pub mod store;
pub mod tracker;
pub mod tracking;
pub mod types;

// Testing utilities, usable from downstream crates.
pub mod testing;

pub use actions::{InfoDialog, InstallAction, InstallStatePayload};
pub use bus::{ActionBus, ActionEnvelope};
pub use config::InstallerConfig;
pub use error::{InstallerError, ManagerError, ManagerResult, Result};
pub use events::{AddonChangeEvent, ChangeEventKind, InstallEvent, InstallState, ProgressEvent};
pub use listener::ChangeListener;
pub use manager::{addon_status, ExtensionManager, InstallOptions};
pub use platform::{find_install_url, Platform, PlatformFile, PlatformFiles};
pub use progress::{download_progress, ProgressHandler};
pub use store::{Dispatcher, InstallationStore};
pub use tracker::{
    AddonInfo, EnableParams, InstallParams, InstallationTracker, ThemeInstallTarget,
    UninstallParams,
};
pub use tracking::{NoopTracking, TrackedAction, TrackingEvent, TrackingSink};
pub use types::{
    AddonType, ClientAddon, ErrorCode, InstallationRecord, InstallationStatus, ThemeAction,
    ThemeNode,
};

// Re-export async_trait for implementing ExtensionManager
pub use async_trait::async_trait;
