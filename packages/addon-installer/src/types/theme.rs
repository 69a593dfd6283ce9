use serde::{Deserialize, Serialize};

/// Opaque reference to the UI node a theme preview is applied to.
///
/// The tracker never looks inside it; it is stored with the preview so the
/// same node can be handed back on reset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThemeNode(pub String);

impl ThemeNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Action passed to the caller-supplied theme function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThemeAction {
    #[serde(rename = "PreviewBrowserTheme")]
    Preview,
    #[serde(rename = "ResetBrowserThemePreview")]
    ResetPreview,
    #[serde(rename = "InstallBrowserTheme")]
    Install,
}

impl ThemeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Preview => "PreviewBrowserTheme",
            Self::ResetPreview => "ResetBrowserThemePreview",
            Self::Install => "InstallBrowserTheme",
        }
    }
}
