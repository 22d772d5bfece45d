//! Tops up shallow package download history from the registry's range API.
//!
//! A repository whose `packages.csv` holds fewer than [`MIN_HISTORY_DAYS`] distinct dates gets a
//! year of daily downloads pulled in bulk. Weekly figures are rebuilt as a trailing seven-day sum
//! over the returned series, and days the table already knows about are left alone.

use super::{DailyDownloads, NpmProvider, Packages, RegistrySource};
use crate::store::PackageRow;
use chrono::{Days, NaiveDate};
use std::collections::BTreeSet;

const LOG_TARGET: &str = "  backfill";

/// Tables with fewer distinct dates than this are backfilled.
pub const MIN_HISTORY_DAYS: usize = 30;

/// How far back a backfill reaches.
pub const BACKFILL_DAYS: u64 = 365;

const ROLLING_WINDOW: usize = 7;

#[must_use]
pub fn needs_backfill(existing: &BTreeSet<NaiveDate>) -> bool {
    existing.len() < MIN_HISTORY_DAYS
}

/// The inclusive date range a backfill covers for a run on `date`: the past year up to yesterday.
#[must_use]
pub fn backfill_window(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = date.checked_sub_days(Days::new(BACKFILL_DAYS)).unwrap_or(NaiveDate::MIN);
    let end = date.pred_opt().unwrap_or(NaiveDate::MIN);
    (start, end)
}

/// Turn a daily series into package rows, deriving each day's weekly figure from up to six
/// preceding entries of the same series.
#[must_use]
pub fn rolling_weekly(source: RegistrySource, package: &str, series: &[DailyDownloads]) -> Vec<PackageRow> {
    series
        .iter()
        .enumerate()
        .map(|(n, day)| {
            let window_start = n.saturating_sub(ROLLING_WINDOW - 1);
            let weekly = series[window_start..=n].iter().map(|d| d.downloads).sum();

            PackageRow {
                date: day.day,
                source,
                package: package.to_string(),
                daily_downloads: day.downloads,
                weekly_downloads: weekly,
            }
        })
        .collect()
}

/// Drop rows for dates the table already has and order the rest by date.
///
/// The sort is stable, so rows sharing a date keep their package order.
#[must_use]
pub fn new_rows(rows: Vec<PackageRow>, existing: &BTreeSet<NaiveDate>) -> Vec<PackageRow> {
    let mut rows: Vec<_> = rows.into_iter().filter(|row| !existing.contains(&row.date)).collect();
    rows.sort_by_key(|row| row.date);
    rows
}

/// Fetch history for every configured package when `existing` is shallow.
///
/// Returns the rows to append, already filtered and sorted. Registry failures only shrink the
/// result.
pub async fn backfill(npm: &NpmProvider, packages: &Packages, existing: &BTreeSet<NaiveDate>, date: NaiveDate) -> Vec<PackageRow> {
    if !needs_backfill(existing) {
        log::debug!(
            target: LOG_TARGET,
            "Package history has {} days, skipping backfill",
            existing.len()
        );
        return Vec::new();
    }

    let (start, end) = backfill_window(date);
    let mut rows = Vec::new();

    for (&source, names) in packages {
        for package in names {
            log::info!(target: LOG_TARGET, "Backfilling {source} downloads for '{package}' from {start} to {end}");

            let series = match source {
                RegistrySource::Npm => npm.get_range(package, start, end).await,
            };

            rows.extend(rolling_weekly(source, package, &series));
        }
    }

    new_rows(rows, existing)
}
