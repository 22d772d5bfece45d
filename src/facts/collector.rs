use crate::Result;
use crate::facts::hosting::Provider;
use crate::facts::registry::{NpmProvider, PackageDownloads, Packages, RegistrySource, backfill};
use crate::facts::{RepoSpec, Settings, Snapshot};
use crate::store::{AggregateRow, AppendOutcome, PackageRow, RepoStore, delta};
use chrono::{NaiveDate, Utc};
use ohno::{EnrichableExt, bail};
use std::path::{Path, PathBuf};

const LOG_TARGET: &str = " collector";

/// What a collection pass did for one repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectOutcome {
    Collected,

    /// A snapshot for the date already existed; nothing was fetched or written
    AlreadyCollected,
}

/// Collects the daily facts of repositories and records them in their stores.
#[derive(Debug)]
pub struct Collector {
    hosting: Provider,
    npm: NpmProvider,
    data_dir: PathBuf,
    star_samples: u32,
}

impl Collector {
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self {
            hosting: Provider::new(settings.github_token.as_deref(), &settings.github_api_url)?,
            npm: NpmProvider::new(&settings.npm_api_url)?,
            data_dir: settings.data_dir.clone(),
            star_samples: settings.star_samples,
        })
    }

    /// Run one collection pass for `repo` on `date`.
    ///
    /// The snapshot file for the date gates the whole pass: once it exists the repository counts
    /// as collected. Only a missing repository profile or a store failure makes the pass fail;
    /// any other unavailable fact is recorded as empty.
    pub async fn collect_repo(&self, repo: &RepoSpec, packages: &Packages, date: NaiveDate) -> Result<CollectOutcome> {
        let store = RepoStore::open(&self.data_dir, repo);

        if store.snapshot_exists(date) {
            log::info!(target: LOG_TARGET, "Already collected '{repo}' for {date}, skipping");
            return Ok(CollectOutcome::AlreadyCollected);
        }

        log::info!(target: LOG_TARGET, "Collecting metrics for '{repo}'");

        let Some(repo_info) = self.hosting.get_repo_info(repo).await else {
            bail!("unable to fetch repository information for '{repo}'");
        };

        let traffic = self.hosting.get_traffic(repo).await;
        let releases = self.hosting.get_releases(repo).await;
        let languages = self.hosting.get_languages(repo).await;
        let code_frequency = self.hosting.get_code_frequency(repo).await;
        let contributors_count = self.hosting.get_contributors_count(repo).await;
        let star_history = self.hosting.get_star_history(repo, self.star_samples).await;
        let issue_counts = self.hosting.get_issue_counts(repo).await;
        let package_downloads = self.get_package_downloads(packages, date).await;

        let snapshot = Snapshot {
            collected_at: Utc::now(),
            repo: repo_info,
            traffic,
            releases_downloads: Snapshot::total_downloads(&releases),
            releases,
            languages,
            code_frequency,
            contributors_count,
            star_history: star_history.points,
            issue_counts,
            packages: package_downloads,
        };

        match self.record(&store, &snapshot, packages, date).await {
            Ok(()) => Ok(CollectOutcome::Collected),
            Err(e) => Err(e.enrich_with(|| format!("recording metrics for '{repo}'"))),
        }
    }

    async fn record(&self, store: &RepoStore, snapshot: &Snapshot, packages: &Packages, date: NaiveDate) -> Result<()> {
        let path = store.save_snapshot(date, snapshot)?;
        log::info!(target: LOG_TARGET, "Saved snapshot to '{}'", path.display());

        let aggregate = store.aggregate();
        let outcome = aggregate.append_if_new(date, &[AggregateRow::from_snapshot(date, snapshot)])?;
        log_append(aggregate.path(), outcome, date);

        let releases = store.releases();
        let previous = delta::previous_counts(&releases.read_rows()?);
        let rows = delta::release_rows(date, &snapshot.releases, &previous);
        let outcome = releases.append_if_new(date, &rows)?;
        log_append(releases.path(), outcome, date);

        if !packages.is_empty() {
            self.record_packages(store, &snapshot.packages, packages, date).await?;
        }

        let points = &snapshot.star_history;
        if !points.is_empty() && store.star_history_replaceable()? {
            store.star_history().replace_all(points)?;
            log::info!(
                target: LOG_TARGET,
                "Wrote {} star history points to '{}'",
                points.len(),
                store.star_history().path().display()
            );
        }

        Ok(())
    }

    async fn record_packages(&self, store: &RepoStore, live: &[PackageDownloads], packages: &Packages, date: NaiveDate) -> Result<()> {
        let table = store.packages();
        let existing = table.existing_dates()?;

        let history = backfill::backfill(&self.npm, packages, &existing, date).await;
        if !history.is_empty() {
            match table.append_rows(&history) {
                Ok(count) => log::info!(target: LOG_TARGET, "Added {count} days of historical package downloads"),
                Err(e) => log::warn!(target: LOG_TARGET, "Could not record historical package downloads: {e:#}"),
            }
        }

        let rows: Vec<PackageRow> = live.iter().map(|downloads| PackageRow::new(date, downloads)).collect();
        let outcome = table.append_if_new(date, &rows)?;
        log_append(table.path(), outcome, date);

        Ok(())
    }

    /// Live download counts for every configured package, leaving out packages without any.
    async fn get_package_downloads(&self, packages: &Packages, date: NaiveDate) -> Vec<PackageDownloads> {
        let mut result = Vec::new();

        for (&source, names) in packages {
            for package in names {
                let downloads = match source {
                    RegistrySource::Npm => self.npm.get_downloads(package, date).await,
                };

                if downloads.has_downloads() {
                    log::debug!(
                        target: LOG_TARGET,
                        "{source} package '{package}': {} daily, {} weekly downloads",
                        downloads.daily_downloads,
                        downloads.weekly_downloads
                    );
                    result.push(downloads);
                } else {
                    log::debug!(target: LOG_TARGET, "No {source} downloads reported for '{package}'");
                }
            }
        }

        result
    }
}

fn log_append(path: &Path, outcome: AppendOutcome, date: NaiveDate) {
    match outcome {
        AppendOutcome::Appended => log::info!(target: LOG_TARGET, "Updated '{}'", path.display()),
        AppendOutcome::AlreadyPresent => log::info!(target: LOG_TARGET, "'{}' already has data for {date}", path.display()),
    }
}
