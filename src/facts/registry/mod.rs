//! Package registry download counts and the history backfill planner.

pub mod backfill;
mod npm;

pub use npm::{DailyDownloads, NPM_API_URL, NpmProvider};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A package registry we can query for download counts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, strum::Display, strum::EnumString, strum::IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RegistrySource {
    Npm,
}

/// Packages to track for a repository, keyed by registry.
pub type Packages = BTreeMap<RegistrySource, Vec<String>>;

/// Live download figures for one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDownloads {
    pub source: RegistrySource,
    pub package: String,
    pub daily_downloads: u64,

    /// Downloads over the trailing seven days
    pub weekly_downloads: u64,
}

impl PackageDownloads {
    /// Whether the registry reported any downloads at all.
    #[must_use]
    pub const fn has_downloads(&self) -> bool {
        self.daily_downloads > 0 || self.weekly_downloads > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::str::FromStr;

    #[test]
    fn test_registry_source_display() {
        assert_eq!(RegistrySource::Npm.to_string(), "npm");
    }

    #[test]
    fn test_registry_source_from_str() {
        assert_eq!(RegistrySource::from_str("npm").unwrap(), RegistrySource::Npm);
        let _ = RegistrySource::from_str("pypi").unwrap_err();
    }

    #[test]
    fn test_registry_source_serde() {
        let packages: Packages = serde_json::from_str(r#"{"npm": ["left-pad"]}"#).unwrap();
        assert_eq!(packages[&RegistrySource::Npm], vec!["left-pad".to_string()]);
        let _ = serde_json::from_str::<Packages>(r#"{"pypi": ["requests"]}"#).unwrap_err();
    }

    #[test]
    fn test_has_downloads() {
        let mut downloads = PackageDownloads {
            source: RegistrySource::Npm,
            package: "left-pad".to_string(),
            daily_downloads: 0,
            weekly_downloads: 0,
        };
        assert!(!downloads.has_downloads());

        downloads.weekly_downloads = 3;
        assert!(downloads.has_downloads());
    }
}
