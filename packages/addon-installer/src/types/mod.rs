//! Domain types shared by the tracker, the store and the host seam.

pub mod addon;
pub mod status;
pub mod theme;

pub use addon::{AddonType, ClientAddon};
pub use status::{ErrorCode, InstallationRecord, InstallationStatus};
pub use theme::{ThemeAction, ThemeNode};
