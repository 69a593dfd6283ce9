//! Host extension manager capability.
//!
//! The browser exposes add-on management to privileged pages. This crate only
//! sees it through [`ExtensionManager`], injected as `Arc<dyn ExtensionManager>`
//! so tests can substitute [`MockExtensionManager`](crate::testing::MockExtensionManager).
//!
//! Every method is a suspension point; the tracker resumes only when the host
//! resolves or rejects. The host is assumed to serialize operations on one
//! add-on internally.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ManagerResult;
use crate::progress::ProgressHandler;
use crate::types::{ClientAddon, InstallationStatus};

/// Options forwarded to the host with an install request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallOptions {
    /// Where on the site the install was triggered from.
    pub src: Option<String>,
    /// Expected file hash, checked by the host after download.
    pub hash: Option<String>,
}

#[async_trait]
pub trait ExtensionManager: Send + Sync {
    /// Look up the host's handle for `guid`.
    ///
    /// `Err` means the host rejected the lookup, normally because the add-on
    /// is not installed. `Ok(None)` is a host contract violation: the lookup
    /// resolved without a handle.
    async fn get_addon(&self, guid: &str) -> ManagerResult<Option<ClientAddon>>;

    /// Download and install from `url`.
    ///
    /// The host calls `handler` for every lifecycle event of this install,
    /// zero or more times, before the returned future settles.
    async fn install(
        &self,
        url: &str,
        handler: ProgressHandler,
        options: InstallOptions,
    ) -> ManagerResult<()>;

    async fn uninstall(&self, guid: &str) -> ManagerResult<()>;

    /// Fails with [`ManagerError::SetEnableNotAvailable`](crate::ManagerError::SetEnableNotAvailable)
    /// when the host handle cannot be enabled programmatically.
    async fn enable(&self, guid: &str) -> ManagerResult<()>;

    /// Whether the host shows its own permission prompts on install/enable.
    fn permission_prompts_enabled(&self) -> bool;
}

/// Status of an add-on the host reports as present.
pub fn addon_status(addon: &ClientAddon) -> InstallationStatus {
    if addon.is_active && addon.is_enabled {
        InstallationStatus::Enabled
    } else {
        InstallationStatus::Disabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AddonType;

    #[test]
    fn test_active_and_enabled_is_enabled() {
        let addon = ClientAddon::new("@ext", AddonType::Extension);
        assert_eq!(addon_status(&addon), InstallationStatus::Enabled);
    }

    #[test]
    fn test_anything_else_is_disabled() {
        let inactive = ClientAddon::new("@ext", AddonType::Extension).inactive();
        assert_eq!(addon_status(&inactive), InstallationStatus::Disabled);

        let disabled = ClientAddon::new("@theme", AddonType::StaticTheme).disabled();
        assert_eq!(addon_status(&disabled), InstallationStatus::Disabled);

        let mut enabled_but_inactive_theme = ClientAddon::new("@theme", AddonType::StaticTheme);
        enabled_but_inactive_theme.is_active = false;
        assert_eq!(
            addon_status(&enabled_but_inactive_theme),
            InstallationStatus::Disabled
        );
    }
}
