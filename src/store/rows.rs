use super::table::Table;
use crate::facts::registry::{PackageDownloads, RegistrySource};
use crate::facts::{Snapshot, StarPoint};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row of `aggregate.csv`: the day's headline counters.
///
/// Traffic columns stay empty when the token lacked push access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateRow {
    pub date: NaiveDate,
    pub views: Option<u64>,
    pub views_unique: Option<u64>,
    pub clones: Option<u64>,
    pub clones_unique: Option<u64>,
    pub stars: u64,
    pub forks: u64,
    pub open_issues: u64,
    pub open_prs: u64,
    pub watchers: u64,
    pub size_kb: u64,
    pub releases_downloads: u64,
}

impl AggregateRow {
    #[must_use]
    pub fn from_snapshot(date: NaiveDate, snapshot: &Snapshot) -> Self {
        let views = snapshot.traffic.views.as_ref();
        let clones = snapshot.traffic.clones.as_ref();

        Self {
            date,
            views: views.map(|v| v.count),
            views_unique: views.map(|v| v.uniques),
            clones: clones.map(|c| c.count),
            clones_unique: clones.map(|c| c.uniques),
            stars: snapshot.repo.stars,
            forks: snapshot.repo.forks,
            open_issues: snapshot.issue_counts.open_issues,
            open_prs: snapshot.issue_counts.open_prs,
            watchers: snapshot.repo.watchers,
            size_kb: snapshot.repo.size_kb,
            releases_downloads: snapshot.releases_downloads,
        }
    }
}

/// One row of `releases.csv`: an asset's cumulative download count and its change since the
/// last recorded observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseAssetRow {
    pub date: NaiveDate,
    pub tag: String,
    pub asset_name: String,
    pub asset_size: u64,
    pub download_count: u64,
    pub downloads_delta: i64,
}

/// One row of `packages.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRow {
    pub date: NaiveDate,
    pub source: RegistrySource,
    pub package: String,
    pub daily_downloads: u64,
    pub weekly_downloads: u64,
}

impl PackageRow {
    #[must_use]
    pub fn new(date: NaiveDate, downloads: &PackageDownloads) -> Self {
        Self {
            date,
            source: downloads.source,
            package: downloads.package.clone(),
            daily_downloads: downloads.daily_downloads,
            weekly_downloads: downloads.weekly_downloads,
        }
    }
}

#[derive(Debug)]
pub struct AggregateTable;

impl Table for AggregateTable {
    type Row = AggregateRow;

    const FILE_NAME: &'static str = "aggregate.csv";
    const HEADERS: &'static [&'static str] = &[
        "date",
        "views",
        "views_unique",
        "clones",
        "clones_unique",
        "stars",
        "forks",
        "open_issues",
        "open_prs",
        "watchers",
        "size_kb",
        "releases_downloads",
    ];
}

#[derive(Debug)]
pub struct ReleasesTable;

impl Table for ReleasesTable {
    type Row = ReleaseAssetRow;

    const FILE_NAME: &'static str = "releases.csv";
    const HEADERS: &'static [&'static str] = &["date", "tag", "asset_name", "asset_size", "download_count", "downloads_delta"];
}

#[derive(Debug)]
pub struct PackagesTable;

impl Table for PackagesTable {
    type Row = PackageRow;

    const FILE_NAME: &'static str = "packages.csv";
    const HEADERS: &'static [&'static str] = &["date", "source", "package", "daily_downloads", "weekly_downloads"];
}

#[derive(Debug)]
pub struct StarHistoryTable;

impl Table for StarHistoryTable {
    type Row = StarPoint;

    const FILE_NAME: &'static str = "star_history.csv";
    const HEADERS: &'static [&'static str] = &["date", "stars"];
}
