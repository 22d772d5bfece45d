use super::hosting::GITHUB_API_URL;
use super::hosting::star_sampler::DEFAULT_SAMPLE_COUNT;
use super::registry::NPM_API_URL;
use core::fmt::{Debug, Formatter};
use std::path::PathBuf;
use url::Url;

/// Run-wide settings, built once at startup and handed to every component that needs them.
#[derive(Clone)]
pub struct Settings {
    /// Bearer token for the GitHub API
    pub github_token: Option<String>,

    /// Base URL of the GitHub REST API
    pub github_api_url: Url,

    /// Base URL of the npm download-count API
    pub npm_api_url: Url,

    /// Root directory holding one sub-directory per tracked repository
    pub data_dir: PathBuf,

    /// Number of stargazer pages to sample when reconstructing star history
    pub star_samples: u32,
}

impl Settings {
    /// Settings pointing at the public APIs, with no token.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            github_token: None,
            github_api_url: Url::parse(GITHUB_API_URL).expect("GITHUB_API_URL is a valid URL"),
            npm_api_url: Url::parse(NPM_API_URL).expect("NPM_API_URL is a valid URL"),
            data_dir: data_dir.into(),
            star_samples: DEFAULT_SAMPLE_COUNT,
        }
    }
}

impl Debug for Settings {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Settings")
            .field("github_token", &self.github_token.as_ref().map(|_| "<redacted>"))
            .field("github_api_url", &self.github_api_url.as_str())
            .field("npm_api_url", &self.npm_api_url.as_str())
            .field("data_dir", &self.data_dir)
            .field("star_samples", &self.star_samples)
            .finish()
    }
}
