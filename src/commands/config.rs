use crate::Result;
use crate::facts::RepoSpec;
use crate::facts::registry::{Packages, RegistrySource};
use camino::Utf8Path;
use core::str::FromStr;
use ohno::{IntoAppError, app_err, bail};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;

/// The set of repositories to track.
///
/// ```json
/// {
///   "repos": [
///     "octo/widgets",
///     { "repo": "octo/gadgets", "packages": { "npm": ["gadgets", "@octo/gadgets-cli"] } }
///   ]
/// }
/// ```
///
/// Files ending in `.toml` are read as TOML with the same structure; anything else is JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub repos: Vec<RepoEntry>,
}

/// One tracked repository and the registry packages published from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoEntry {
    pub repo: RepoSpec,
    pub packages: Packages,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    repos: Vec<RawEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Bare(String),
    Detailed(DetailedEntry),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DetailedEntry {
    repo: String,
    #[serde(default)]
    packages: BTreeMap<String, Vec<String>>,
}

impl Config {
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let text = fs::read_to_string(path).into_app_err_with(|| format!("reading configuration file '{path}'"))?;

        let raw: RawConfig = if path.extension() == Some("toml") {
            toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{path}'"))?
        } else {
            serde_json::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{path}'"))?
        };

        Self::from_raw(raw).map_err(|e| app_err!("invalid configuration file '{path}': {e}"))
    }

    /// Parse a JSON configuration document.
    pub fn from_json(text: &str) -> Result<Self> {
        let raw: RawConfig = serde_json::from_str(text).into_app_err("parsing configuration")?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self> {
        if raw.repos.is_empty() {
            bail!("no repositories configured");
        }

        let repos = raw.repos.into_iter().map(RepoEntry::from_raw).collect::<Result<_>>()?;
        Ok(Self { repos })
    }
}

impl RepoEntry {
    fn from_raw(raw: RawEntry) -> Result<Self> {
        let (repo, raw_packages) = match raw {
            RawEntry::Bare(repo) => (repo, BTreeMap::new()),
            RawEntry::Detailed(entry) => (entry.repo, entry.packages),
        };

        let repo = RepoSpec::parse(&repo)?;

        let mut packages = Packages::new();
        for (registry, names) in raw_packages {
            let Ok(source) = RegistrySource::from_str(&registry) else {
                bail!("unknown package registry '{registry}' for '{repo}'");
            };

            if names.is_empty() {
                continue;
            }

            if let Some(name) = names.iter().find(|name| name.trim().is_empty()) {
                bail!("invalid {source} package name '{name}' for '{repo}'");
            }

            packages.entry(source).or_default().extend(names);
        }

        Ok(Self { repo, packages })
    }
}
