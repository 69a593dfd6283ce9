//! Installation state tracker.
//!
//! [`InstallationTracker`] turns calls on an add-on (query, install,
//! uninstall, enable, theme preview) into host requests, and host outcomes
//! into dispatched actions. Host failures never escape: each operation catches
//! them and dispatches an `ERROR` status with a code. The only `Err`s returned
//! are caller contract violations, raised before anything is dispatched.
//!
//! ```text
//! UNINSTALLED --install()--> (download) --onDownloadEnded--> INSTALLING --host--> ENABLED|DISABLED
//! UNINSTALLED --install() fails--> ERROR
//! INSTALLING --onInstallCancelled--> UNINSTALLED
//! INSTALLING --onInstallFailed / onDownloadFailed--> ERROR
//! ENABLED|DISABLED --uninstall()--> UNINSTALLING --host--> UNINSTALLED
//! UNINSTALLING --failure--> ERROR
//! ERROR --set_current_status()--> UNINSTALLED|ENABLED|DISABLED
//! ```
//!
//! Concurrent operations on the same guid are not queued or rejected; the host
//! is expected to serialize them.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, error, info};

use crate::actions::{InfoDialog, InstallAction, InstallStatePayload};
use crate::config::InstallerConfig;
use crate::error::{InstallerError, ManagerError, Result};
use crate::manager::{addon_status, ExtensionManager, InstallOptions};
use crate::platform::{find_install_url, PlatformFiles};
use crate::progress::ProgressHandler;
use crate::store::Dispatcher;
use crate::tracking::{
    self, NoopTracking, TrackedAction, TrackingEvent, TrackingSink, INSTALL_THEME_CATEGORY,
    TRACKING_TYPE_THEME,
};
use crate::types::{AddonType, ErrorCode, InstallationStatus, ThemeAction, ThemeNode};

/// The add-on a tracker is built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddonInfo {
    pub guid: String,
    pub name: String,
    pub addon_type: AddonType,
    pub icon_url: Option<String>,
    /// Download URL for the current version on this platform.
    pub install_url: Option<String>,
}

impl AddonInfo {
    /// Add-on with no icon and no install URL.
    pub fn new(guid: impl Into<String>, name: impl Into<String>, addon_type: AddonType) -> Self {
        Self {
            guid: guid.into(),
            name: name.into(),
            addon_type,
            icon_url: None,
            install_url: None,
        }
    }

    pub fn with_install_url(mut self, url: impl Into<String>) -> Self {
        self.install_url = Some(url.into());
        self
    }

    pub fn with_icon_url(mut self, url: impl Into<String>) -> Self {
        self.icon_url = Some(url.into());
        self
    }

    /// Set the install URL to the listed file for `user_agent_os`.
    ///
    /// Leaves the add-on without a URL when no file matches.
    pub fn with_platform_files(
        mut self,
        files: &PlatformFiles,
        user_agent_os: Option<&str>,
        source: Option<&str>,
    ) -> Result<Self> {
        self.install_url = find_install_url(files, user_agent_os, source)?;
        Ok(self)
    }
}

/// Arguments to [`InstallationTracker::install`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallParams {
    pub guid: String,
    pub install_url: Option<String>,
    pub name: String,
    pub addon_type: AddonType,
    pub icon_url: Option<String>,
    pub hash: Option<String>,
    /// Overrides [`InstallerConfig::install_source`].
    pub src: Option<String>,
}

impl From<&AddonInfo> for InstallParams {
    fn from(addon: &AddonInfo) -> Self {
        Self {
            guid: addon.guid.clone(),
            install_url: addon.install_url.clone(),
            name: addon.name.clone(),
            addon_type: addon.addon_type.clone(),
            icon_url: addon.icon_url.clone(),
            hash: None,
            src: None,
        }
    }
}

/// Arguments to [`InstallationTracker::uninstall`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UninstallParams {
    pub guid: String,
    pub install_url: Option<String>,
    pub name: String,
    pub addon_type: AddonType,
}

impl From<&AddonInfo> for UninstallParams {
    fn from(addon: &AddonInfo) -> Self {
        Self {
            guid: addon.guid.clone(),
            install_url: addon.install_url.clone(),
            name: addon.name.clone(),
            addon_type: addon.addon_type.clone(),
        }
    }
}

/// Arguments to [`InstallationTracker::enable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnableParams {
    pub guid: String,
    pub name: String,
    pub addon_type: AddonType,
    pub icon_url: Option<String>,
    /// Overrides [`InstallerConfig::send_enable_tracking`].
    pub send_tracking_event: Option<bool>,
}

impl From<&AddonInfo> for EnableParams {
    fn from(addon: &AddonInfo) -> Self {
        Self {
            guid: addon.guid.clone(),
            name: addon.name.clone(),
            addon_type: addon.addon_type.clone(),
            icon_url: addon.icon_url.clone(),
            send_tracking_event: None,
        }
    }
}

/// Add-on-like value accepted by [`InstallationTracker::install_theme`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeInstallTarget {
    pub guid: String,
    pub name: String,
    pub addon_type: AddonType,
    pub status: Option<InstallationStatus>,
}

/// Drives one page's add-on operations against the host and the store.
///
/// Built with [`InstallationTracker::new`] and configured with the `with_*`
/// builders. Theme operations need an add-on bound with
/// [`InstallationTracker::for_addon`].
pub struct InstallationTracker {
    manager: Arc<dyn ExtensionManager>,
    dispatcher: Arc<dyn Dispatcher>,
    tracking: Arc<dyn TrackingSink>,
    config: InstallerConfig,
    addon: Option<AddonInfo>,
}

impl InstallationTracker {
    /// Tracker with no analytics, default config and no bound add-on.
    pub fn new(manager: Arc<dyn ExtensionManager>, dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self {
            manager,
            dispatcher,
            tracking: Arc::new(NoopTracking),
            config: InstallerConfig::default(),
            addon: None,
        }
    }

    /// Send analytics to `tracking` instead of dropping them.
    pub fn with_tracking(mut self, tracking: Arc<dyn TrackingSink>) -> Self {
        self.tracking = tracking;
        self
    }

    pub fn with_config(mut self, config: InstallerConfig) -> Self {
        self.config = config;
        self
    }

    /// Bind the tracker to one add-on.
    pub fn for_addon(mut self, addon: AddonInfo) -> Self {
        self.addon = Some(addon);
        self
    }

    pub fn addon(&self) -> Option<&AddonInfo> {
        self.addon.as_ref()
    }

    pub fn config(&self) -> &InstallerConfig {
        &self.config
    }

    /// Query the host for `guid` and dispatch the status it reports.
    ///
    /// Dispatches exactly one `INSTALL_STATE`: `ENABLED`/`DISABLED` when the
    /// host has the add-on, `UNINSTALLED` when the lookup is rejected, and
    /// `ERROR`/`FATAL_ERROR` when the host resolves without a handle.
    /// `install_url` falls back to the bound add-on's URL.
    pub async fn set_current_status(&self, guid: &str, install_url: Option<&str>) -> Result<()> {
        if guid.is_empty() {
            return Err(InstallerError::EmptyGuid);
        }

        if self.config.server_rendering {
            info!(guid = %guid, "no extension manager, cannot set add-on status");
            return Ok(());
        }

        let url = install_url
            .map(str::to_string)
            .or_else(|| self.addon.as_ref().and_then(|a| a.install_url.clone()));

        info!(guid = %guid, "setting add-on status");

        let payload = match self.manager.get_addon(guid).await {
            Ok(Some(addon)) => InstallStatePayload {
                guid: guid.to_string(),
                status: addon_status(&addon),
                url,
                error: None,
                can_uninstall: Some(addon.can_uninstall),
            },
            Ok(None) => {
                error!(guid = %guid, "extension manager resolved without an add-on handle");
                InstallStatePayload {
                    guid: guid.to_string(),
                    status: InstallationStatus::Error,
                    url,
                    error: Some(ErrorCode::FatalError),
                    can_uninstall: None,
                }
            }
            Err(e) => {
                info!(
                    guid = %guid,
                    error = %e,
                    "add-on not found, setting status to UNINSTALLED"
                );
                InstallStatePayload {
                    guid: guid.to_string(),
                    status: InstallationStatus::Uninstalled,
                    url,
                    error: None,
                    can_uninstall: None,
                }
            }
        };

        self.dispatcher.dispatch(InstallAction::InstallState(payload));
        Ok(())
    }

    /// [`set_current_status`](Self::set_current_status) for several add-ons at once.
    ///
    /// Lookups run concurrently; dispatch order follows host completion order.
    pub async fn set_current_statuses<'a, I>(&self, addons: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
    {
        let results = join_all(
            addons
                .into_iter()
                .map(|(guid, install_url)| self.set_current_status(guid, install_url)),
        )
        .await;

        results.into_iter().collect()
    }

    /// Whether the host reports `guid` as enabled. Lookup failures read as `false`.
    pub async fn is_addon_enabled(&self, guid: &str) -> bool {
        if self.config.server_rendering {
            return false;
        }

        match self.manager.get_addon(guid).await {
            Ok(Some(addon)) => addon.is_enabled,
            Ok(None) => false,
            Err(e) => {
                error!(guid = %guid, error = %e, "could not determine whether the add-on was enabled");
                false
            }
        }
    }

    /// Handler for the host's lifecycle events of one install.
    pub fn make_progress_handler(
        &self,
        guid: &str,
        name: &str,
        addon_type: AddonType,
    ) -> ProgressHandler {
        ProgressHandler::new(
            guid,
            name,
            addon_type,
            self.dispatcher.clone(),
            self.tracking.clone(),
        )
    }

    /// Install an add-on through the host.
    ///
    /// Extensions require an install URL; calling without one fails before
    /// any dispatch. A theme without a URL has nothing to download and must go
    /// through [`install_theme`](Self::install_theme); this call is then a no-op.
    pub async fn install(&self, params: InstallParams) -> Result<()> {
        if params.guid.is_empty() {
            return Err(InstallerError::EmptyGuid);
        }

        let install_url = match params.install_url.as_deref().filter(|url| !url.is_empty()) {
            Some(url) => url.to_string(),
            None if params.addon_type.is_theme() => {
                debug!(guid = %params.guid, "theme has no install URL, nothing to install");
                return Ok(());
            }
            None => {
                return Err(InstallerError::MissingInstallUrl {
                    guid: params.guid.clone(),
                })
            }
        };

        if self.config.server_rendering {
            info!(guid = %params.guid, "no extension manager, cannot install");
            return Ok(());
        }

        self.dispatcher.dispatch(InstallAction::StartDownload {
            guid: params.guid.clone(),
        });
        self.track(&params.addon_type, TrackedAction::InstallStarted, &params.name);

        let handler = self.make_progress_handler(&params.guid, &params.name, params.addon_type.clone());
        let options = InstallOptions {
            src: params.src.clone().or_else(|| self.config.install_source.clone()),
            hash: params.hash.clone(),
        };

        match self.manager.install(&install_url, handler, options).await {
            Ok(()) => {
                self.track(&params.addon_type, TrackedAction::Install, &params.name);

                if !self.manager.permission_prompts_enabled() {
                    self.show_info(&params.name, params.icon_url.clone());
                }
            }
            Err(e) => {
                error!(guid = %params.guid, error = %e, "install error");
                self.dispatcher.dispatch(InstallAction::install_error(
                    &params.guid,
                    ErrorCode::FatalInstallError,
                ));
            }
        }

        Ok(())
    }

    /// Uninstall an add-on through the host.
    ///
    /// `UNINSTALLING` is dispatched before the host call. On success the host
    /// reports `onUninstalled` through the [`ChangeListener`](crate::ChangeListener).
    pub async fn uninstall(&self, params: UninstallParams) -> Result<()> {
        if params.guid.is_empty() {
            return Err(InstallerError::EmptyGuid);
        }

        if self.config.server_rendering {
            info!(guid = %params.guid, "no extension manager, cannot uninstall");
            return Ok(());
        }

        self.dispatcher.dispatch(InstallAction::set_status(
            &params.guid,
            InstallationStatus::Uninstalling,
        ));

        info!(guid = %params.guid, "requesting uninstall");

        match self.manager.uninstall(&params.guid).await {
            Ok(()) => {
                self.track(&params.addon_type, TrackedAction::Uninstall, &params.name);
            }
            Err(e) => {
                error!(guid = %params.guid, error = %e, "uninstall error");
                self.dispatcher.dispatch(InstallAction::install_error(
                    &params.guid,
                    ErrorCode::FatalUninstallError,
                ));
            }
        }

        Ok(())
    }

    /// Enable an installed add-on through the host.
    ///
    /// A host that cannot enable programmatically is not an error: nothing is
    /// dispatched. Any other failure dispatches `ERROR`/`FATAL_ERROR`.
    pub async fn enable(&self, params: EnableParams) -> Result<()> {
        if params.guid.is_empty() {
            return Err(InstallerError::EmptyGuid);
        }

        if self.config.server_rendering {
            info!(guid = %params.guid, "no extension manager, cannot enable");
            return Ok(());
        }

        match self.manager.enable(&params.guid).await {
            Ok(()) => {
                if params
                    .send_tracking_event
                    .unwrap_or(self.config.send_enable_tracking)
                {
                    self.track(&params.addon_type, TrackedAction::Enable, &params.name);
                }

                if !self.manager.permission_prompts_enabled() {
                    self.show_info(&params.name, params.icon_url.clone());
                }
            }
            Err(ManagerError::SetEnableNotAvailable { .. }) => {
                info!(guid = %params.guid, "setEnabled not available, unable to enable");
            }
            Err(e) => {
                error!(guid = %params.guid, error = %e, "error while trying to enable");
                self.dispatcher.dispatch(InstallAction::set_error_status(
                    &params.guid,
                    ErrorCode::FatalError,
                ));
            }
        }

        Ok(())
    }

    /// Apply a theme preview to `node` and remember it.
    pub fn preview_theme(
        &self,
        node: &ThemeNode,
        theme_action: &dyn Fn(&ThemeNode, ThemeAction),
    ) -> Result<()> {
        let guid = self.bound_guid()?;
        theme_action(node, ThemeAction::Preview);
        self.dispatcher.dispatch(InstallAction::ThemePreviewStarted {
            guid: guid.to_string(),
            node: node.clone(),
        });
        Ok(())
    }

    pub fn reset_theme_preview(
        &self,
        node: &ThemeNode,
        theme_action: &dyn Fn(&ThemeNode, ThemeAction),
    ) -> Result<()> {
        let guid = self.bound_guid()?;
        theme_action(node, ThemeAction::ResetPreview);
        self.dispatcher.dispatch(InstallAction::ThemePreviewCleared {
            guid: guid.to_string(),
        });
        Ok(())
    }

    /// Preview the bound theme if it is uninstalled, reset the preview if one
    /// is showing, and otherwise leave state alone.
    ///
    /// The uninstalled check runs first: a record that is both uninstalled and
    /// previewing is previewed again.
    pub fn toggle_theme_preview(
        &self,
        node: &ThemeNode,
        theme_action: &dyn Fn(&ThemeNode, ThemeAction),
    ) -> Result<()> {
        let guid = self.bound_guid()?;

        match self.dispatcher.installation(guid) {
            Some(record) if record.status == InstallationStatus::Uninstalled => {
                self.preview_theme(node, theme_action)
            }
            Some(record) if record.is_previewing_theme => {
                self.reset_theme_preview(node, theme_action)
            }
            Some(record) if record.status == InstallationStatus::Enabled => {
                info!(guid = %guid, "theme already enabled");
                Ok(())
            }
            Some(record) => {
                info!(guid = %guid, status = %record.status, "theme cannot be previewed");
                Ok(())
            }
            None => {
                info!(guid = %guid, "theme not found");
                Ok(())
            }
        }
    }

    /// Install a theme through the theme path.
    ///
    /// No-op for non-theme types and for themes already `INSTALLED`.
    pub fn install_theme(
        &self,
        node: &ThemeNode,
        target: &ThemeInstallTarget,
        theme_action: &dyn Fn(&ThemeNode, ThemeAction),
    ) {
        if !target.addon_type.is_theme()
            || target.status == Some(InstallationStatus::Installed)
        {
            debug!(guid = %target.guid, "install_theme skipped");
            return;
        }

        theme_action(node, ThemeAction::Install);
        tracking::send(
            self.tracking.as_ref(),
            TrackingEvent::new(TRACKING_TYPE_THEME, INSTALL_THEME_CATEGORY, target.name.as_str()),
        );
    }

    fn show_info(&self, name: &str, image_url: Option<String>) {
        self.dispatcher.dispatch(InstallAction::ShowInfo(InfoDialog {
            addon_name: name.to_string(),
            image_url,
            auto_close: self.config.info_dialog_auto_close,
        }));
    }

    fn track(&self, addon_type: &AddonType, tracked: TrackedAction, label: &str) {
        tracking::send(
            self.tracking.as_ref(),
            TrackingEvent::for_addon(addon_type, tracked, label),
        );
    }

    fn bound_guid(&self) -> Result<&str> {
        self.addon
            .as_ref()
            .map(|addon| addon.guid.as_str())
            .filter(|guid| !guid.is_empty())
            .ok_or(InstallerError::NoBoundAddon)
    }
}

impl std::fmt::Debug for InstallationTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallationTracker")
            .field("addon", &self.addon)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
