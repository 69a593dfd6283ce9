use std::env;

use anyhow::{Context, Result};
use dotenvy::dotenv;

use crate::bus::{ActionBus, DEFAULT_CAPACITY};
use crate::store::InstallationStore;

/// Installer configuration, passed explicitly to the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerConfig {
    /// Rendering on the server: there is no extension manager, so host
    /// operations are skipped.
    pub server_rendering: bool,
    /// Default `src` sent with install requests.
    pub install_source: Option<String>,
    /// Default for [`EnableParams::send_tracking_event`](crate::EnableParams).
    pub send_enable_tracking: bool,
    /// Whether "show info" notifications close on their own.
    pub info_dialog_auto_close: bool,
    /// Action bus capacity for stores built from this config.
    pub bus_capacity: usize,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            server_rendering: false,
            install_source: None,
            send_enable_tracking: true,
            info_dialog_auto_close: true,
            bus_capacity: DEFAULT_CAPACITY,
        }
    }
}

impl InstallerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let defaults = Self::default();

        Ok(Self {
            server_rendering: bool_var("ADDON_INSTALLER_SERVER_RENDERING")?
                .unwrap_or(defaults.server_rendering),
            install_source: env::var("ADDON_INSTALLER_INSTALL_SOURCE")
                .ok()
                .filter(|src| !src.is_empty()),
            send_enable_tracking: bool_var("ADDON_INSTALLER_SEND_ENABLE_TRACKING")?
                .unwrap_or(defaults.send_enable_tracking),
            info_dialog_auto_close: bool_var("ADDON_INSTALLER_INFO_AUTO_CLOSE")?
                .unwrap_or(defaults.info_dialog_auto_close),
            bus_capacity: env::var("ADDON_INSTALLER_BUS_CAPACITY")
                .ok()
                .map(|value| value.parse::<usize>())
                .transpose()
                .context("ADDON_INSTALLER_BUS_CAPACITY must be a valid number")?
                .unwrap_or(defaults.bus_capacity),
        })
    }

    /// An empty store whose action bus uses the configured capacity.
    pub fn build_store(&self) -> InstallationStore {
        InstallationStore::with_bus(ActionBus::with_capacity(self.bus_capacity))
    }

    pub fn with_install_source(mut self, src: impl Into<String>) -> Self {
        self.install_source = Some(src.into());
        self
    }

    pub fn server_rendering(mut self, server_rendering: bool) -> Self {
        self.server_rendering = server_rendering;
        self
    }
}

fn bool_var(name: &str) -> Result<Option<bool>> {
    match env::var(name) {
        Ok(value) => parse_bool(&value)
            .map(Some)
            .with_context(|| format!("{name} must be true/false")),
        Err(_) => Ok(None),
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("invalid boolean: {other}"),
    }
}
