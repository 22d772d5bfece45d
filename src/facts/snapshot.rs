use super::registry::PackageDownloads;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything collected for one repository on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub collected_at: DateTime<Utc>,
    pub repo: RepoInfo,
    pub traffic: Traffic,
    pub releases: Vec<Release>,
    pub languages: BTreeMap<String, u64>,
    pub code_frequency: Option<CodeFrequency>,
    pub contributors_count: u64,
    pub releases_downloads: u64,
    pub star_history: Vec<StarPoint>,
    pub issue_counts: IssueCounts,
    pub packages: Vec<PackageDownloads>,
}

/// Repository profile counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoInfo {
    pub full_name: Option<String>,
    pub stars: u64,
    pub forks: u64,
    pub watchers: u64,

    /// GitHub's combined count of open issues and open pull requests
    pub open_issues_and_prs: u64,
    pub size_kb: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Traffic {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub views: Option<TrafficCounts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clones: Option<TrafficCounts>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub referrers: Vec<Referrer>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub popular_paths: Vec<PopularPath>,
}

/// Two-week traffic totals with their daily breakdown.
///
/// GitHub names the breakdown `views` or `clones` depending on the endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficCounts {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub uniques: u64,
    #[serde(default, alias = "views", alias = "clones")]
    pub daily: Vec<TrafficDay>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficDay {
    pub timestamp: DateTime<Utc>,
    pub count: u64,
    pub uniques: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Referrer {
    pub referrer: String,
    pub count: u64,
    pub uniques: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopularPath {
    pub path: String,
    #[serde(default)]
    pub title: String,
    pub count: u64,
    pub uniques: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub tag: String,
    pub name: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub assets: Vec<ReleaseAsset>,
}

/// A downloadable release asset; `download_count` is a cumulative counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    #[serde(default)]
    pub download_count: u64,
    #[serde(default)]
    pub size: u64,
}

/// Additions and deletions for the most recent week reported by GitHub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeFrequency {
    pub week: NaiveDate,
    pub additions: u64,
    pub deletions: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueCounts {
    pub open_issues: u64,
    pub open_prs: u64,
}

/// One sampled point on the star-growth curve.
///
/// `stars` is the approximate cumulative count at the start of the sampled page,
/// not an exact tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarPoint {
    pub date: NaiveDate,
    pub stars: u64,
}

impl Snapshot {
    /// Total downloads across every asset of every release.
    #[must_use]
    pub fn total_downloads(releases: &[Release]) -> u64 {
        releases
            .iter()
            .flat_map(|release| release.assets.iter())
            .map(|asset| asset.download_count)
            .sum()
    }
}
