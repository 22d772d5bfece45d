//! Turns cumulative asset download counters into per-run deltas.

use super::rows::ReleaseAssetRow;
use crate::facts::Release;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Key identifying one asset of one release.
pub type AssetKey = (String, String);

/// The last recorded download count of every asset, folding `rows` in file order so the latest
/// row for an asset wins.
#[must_use]
pub fn previous_counts(rows: &[ReleaseAssetRow]) -> HashMap<AssetKey, u64> {
    rows.iter()
        .map(|row| ((row.tag.clone(), row.asset_name.clone()), row.download_count))
        .collect()
}

/// One row per asset of `releases`, with its delta against `previous`.
///
/// An asset seen for the first time has a delta of zero. Counts that went down yield negative
/// deltas, which are kept as observed.
#[must_use]
pub fn release_rows(date: NaiveDate, releases: &[Release], previous: &HashMap<AssetKey, u64>) -> Vec<ReleaseAssetRow> {
    releases
        .iter()
        .flat_map(|release| {
            release.assets.iter().map(move |asset| {
                let key = (release.tag.clone(), asset.name.clone());
                let current = asset.download_count;
                let baseline = previous.get(&key).copied().unwrap_or(current);

                ReleaseAssetRow {
                    date,
                    tag: release.tag.clone(),
                    asset_name: asset.name.clone(),
                    asset_size: asset.size,
                    download_count: current,
                    downloads_delta: signed_diff(current, baseline),
                }
            })
        })
        .collect()
}

fn signed_diff(current: u64, baseline: u64) -> i64 {
    let diff = i128::from(current) - i128::from(baseline);
    i64::try_from(diff).unwrap_or(if diff < 0 { i64::MIN } else { i64::MAX })
}
