//! Platform-specific install URLs.
//!
//! A listing carries one file per platform, plus optionally one for all
//! platforms. [`find_install_url`] picks the file for the visitor's operating
//! system (as reported by the user agent) and tags the URL with the install
//! source.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::{InstallerError, Result};

/// Platform key of a listed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    All,
    Android,
    Linux,
    Mac,
    Windows,
}

const LINUX_FAMILY: &[&str] = &[
    "dragonfly",
    "freebsd",
    "netbsd",
    "openbsd",
    "pc-bsd",
    "linux",
    "arch",
    "centos",
    "debian",
    "fedora",
    "gentoo",
    "gnu",
    "linpus",
    "pclinuxos",
    "redhat",
    "slackware",
    "suse",
    "ubuntu",
    "vectorlinux",
    "zenwalk",
    "unix",
];

impl Platform {
    /// Platform for a user agent OS name such as `"Mac OS"` or `"Ubuntu"`.
    ///
    /// Returns `None` for systems with no listed files (iOS) and for names
    /// the crate does not know.
    pub fn from_user_agent_os(os_name: &str) -> Option<Self> {
        let os_name = os_name.trim().to_ascii_lowercase();
        match os_name.as_str() {
            "android" => Some(Self::Android),
            "mac os" => Some(Self::Mac),
            "windows" => Some(Self::Windows),
            name if LINUX_FAMILY.contains(&name) => Some(Self::Linux),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Android => "android",
            Self::Linux => "linux",
            Self::Mac => "mac",
            Self::Windows => "windows",
        }
    }
}

/// One listed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformFile {
    pub url: String,
    #[serde(default)]
    pub hash: Option<String>,
}

impl PlatformFile {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            hash: None,
        }
    }
}

/// Files of the current version, keyed by platform.
pub type PlatformFiles = HashMap<Platform, PlatformFile>;

/// File for the visitor's OS, falling back to the all-platforms file.
pub fn find_platform_file<'a>(
    files: &'a PlatformFiles,
    user_agent_os: Option<&str>,
) -> Option<&'a PlatformFile> {
    user_agent_os
        .and_then(Platform::from_user_agent_os)
        .and_then(|platform| files.get(&platform))
        .or_else(|| files.get(&Platform::All))
}

/// Install URL for the visitor's OS, with `src` set to `source` when given.
///
/// Returns `Ok(None)` when neither a platform file nor an all-platforms file
/// is listed. An existing `src` parameter is replaced.
pub fn find_install_url(
    files: &PlatformFiles,
    user_agent_os: Option<&str>,
    source: Option<&str>,
) -> Result<Option<String>> {
    let Some(file) = find_platform_file(files, user_agent_os) else {
        debug!(os = ?user_agent_os, "no file found for platform");
        return Ok(None);
    };

    match source {
        Some(source) => with_source(&file.url, source).map(Some),
        None => Ok(Some(file.url.clone())),
    }
}

fn with_source(install_url: &str, source: &str) -> Result<String> {
    let mut url = Url::parse(install_url).map_err(|source| InstallerError::InvalidInstallUrl {
        url: install_url.to_string(),
        source,
    })?;

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "src")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair("src", source);

    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(entries: &[(Platform, &str)]) -> PlatformFiles {
        entries
            .iter()
            .map(|(platform, url)| (*platform, PlatformFile::new(*url)))
            .collect()
    }

    #[test]
    fn test_user_agent_os_mapping() {
        assert_eq!(Platform::from_user_agent_os("Windows"), Some(Platform::Windows));
        assert_eq!(Platform::from_user_agent_os("Mac OS"), Some(Platform::Mac));
        assert_eq!(Platform::from_user_agent_os("Android"), Some(Platform::Android));
        assert_eq!(Platform::from_user_agent_os("Ubuntu"), Some(Platform::Linux));
        assert_eq!(Platform::from_user_agent_os("FreeBSD"), Some(Platform::Linux));
        assert_eq!(Platform::from_user_agent_os("PC-BSD"), Some(Platform::Linux));
        assert_eq!(Platform::from_user_agent_os("iOS"), None);
        assert_eq!(Platform::from_user_agent_os("BeOS"), None);
    }

    #[test]
    fn test_platform_file_preferred_over_all() {
        let files = files(&[
            (Platform::All, "https://addons.example/all.xpi"),
            (Platform::Mac, "https://addons.example/mac.xpi"),
        ]);

        assert_eq!(
            find_install_url(&files, Some("Mac OS"), None).unwrap().as_deref(),
            Some("https://addons.example/mac.xpi")
        );
        assert_eq!(
            find_install_url(&files, Some("Windows"), None).unwrap().as_deref(),
            Some("https://addons.example/all.xpi")
        );
        assert_eq!(
            find_install_url(&files, None, None).unwrap().as_deref(),
            Some("https://addons.example/all.xpi")
        );
    }

    #[test]
    fn test_no_matching_file() {
        let files = files(&[(Platform::Windows, "https://addons.example/win.xpi")]);

        assert_eq!(find_install_url(&files, Some("Linux"), Some("home")).unwrap(), None);
        assert_eq!(find_install_url(&PlatformFiles::new(), None, None).unwrap(), None);
    }

    #[test]
    fn test_source_is_appended() {
        let files = files(&[(Platform::All, "https://addons.example/file.xpi?lang=fr")]);

        assert_eq!(
            find_install_url(&files, None, Some("featured")).unwrap().as_deref(),
            Some("https://addons.example/file.xpi?lang=fr&src=featured")
        );
    }

    #[test]
    fn test_existing_source_is_replaced() {
        let files = files(&[(
            Platform::Linux,
            "https://addons.example/file.xpi?src=old&lang=fr",
        )]);

        assert_eq!(
            find_install_url(&files, Some("Debian"), Some("search")).unwrap().as_deref(),
            Some("https://addons.example/file.xpi?lang=fr&src=search")
        );
    }

    #[test]
    fn test_unparseable_url_with_source() {
        let files = files(&[(Platform::All, "not a url")]);

        let err = find_install_url(&files, None, Some("featured")).unwrap_err();
        assert!(matches!(err, InstallerError::InvalidInstallUrl { url, .. } if url == "not a url"));

        assert_eq!(
            find_install_url(&files, None, None).unwrap().as_deref(),
            Some("not a url")
        );
    }
}
