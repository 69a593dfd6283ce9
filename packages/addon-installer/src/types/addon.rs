use serde::{Deserialize, Serialize};

/// Add-on type as reported by the listing API.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddonType {
    Extension,
    #[serde(rename = "statictheme")]
    StaticTheme,
    /// Lightweight theme.
    Persona,
    Dictionary,
    Language,
    Search,
    #[serde(other)]
    Unknown,
}

impl AddonType {
    /// Themes are applied through the theme path and may have no install URL.
    pub fn is_theme(&self) -> bool {
        matches!(self, Self::StaticTheme | Self::Persona)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Extension => "extension",
            Self::StaticTheme => "statictheme",
            Self::Persona => "persona",
            Self::Dictionary => "dictionary",
            Self::Language => "language",
            Self::Search => "search",
            Self::Unknown => "unknown",
        }
    }
}

/// The host's view of an installed add-on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientAddon {
    pub id: String,
    pub is_active: bool,
    pub is_enabled: bool,
    #[serde(rename = "type")]
    pub addon_type: AddonType,
    #[serde(default = "default_can_uninstall")]
    pub can_uninstall: bool,
}

fn default_can_uninstall() -> bool {
    true
}

impl ClientAddon {
    pub fn new(id: impl Into<String>, addon_type: AddonType) -> Self {
        Self {
            id: id.into(),
            is_active: true,
            is_enabled: true,
            addon_type,
            can_uninstall: true,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.is_enabled = false;
        self.is_active = false;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn with_can_uninstall(mut self, can_uninstall: bool) -> Self {
        self.can_uninstall = can_uninstall;
        self
    }
}
