//! Approximate star history from a sampled stargazer feed.
//!
//! The stargazer feed is ordered oldest-first and only exposes timestamps page by page, so
//! instead of walking every page we fetch a handful of evenly spaced pages and take the
//! first entry of each as a point on the growth curve. A point's count is the number of
//! stars that precede the page plus one, which is exact at page boundaries and otherwise
//! off by at most one page (100 stars). GitHub refuses to serve pages past the 400th, so
//! repositories with more than 40,000 stars are only sampled up to that ceiling.

use super::client::{ApiResult, Client, STAR_MEDIA_TYPE, Stargazer, last_page};
use crate::Result;
use crate::facts::{RepoSpec, StarPoint};
use chrono::{DateTime, Utc};
use core::cmp::Ordering;
use ohno::{IntoAppError, bail};

const LOG_TARGET: &str = "     stars";

pub const STARS_PER_PAGE: u32 = 100;
pub const MAX_STAR_PAGES: u32 = 400;
pub const DEFAULT_SAMPLE_COUNT: u32 = 15;

/// Sampled star history for one repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StarHistory {
    /// Points ordered by date
    pub points: Vec<StarPoint>,

    /// The real page count when it exceeded [`MAX_STAR_PAGES`]
    pub truncated_from: Option<u32>,
}

/// Pick which pages to sample out of `page_count`, in ascending order.
///
/// Every page is sampled when there are no more than `sample_count` of them. Otherwise
/// page `round(i * page_count / sample_count)` is taken for `i` in `1..=sample_count`,
/// with page 1 substituted into the first slot so the curve always starts at the first star.
/// Ties round to the even page.
#[must_use]
pub fn sample_pages(page_count: u32, sample_count: u32) -> Vec<u32> {
    if page_count <= sample_count {
        return (1..=page_count).collect();
    }

    let pages = u64::from(page_count);
    let samples = u64::from(sample_count);

    let mut selected: Vec<u32> = (1..=samples)
        .map(|i| {
            let scaled = i * pages;
            let (quotient, remainder) = (scaled / samples, scaled % samples);
            let page = match (2 * remainder).cmp(&samples) {
                Ordering::Greater => quotient + 1,
                Ordering::Equal => quotient + quotient % 2,
                Ordering::Less => quotient,
            };
            u32::try_from(page).unwrap_or(page_count).max(1)
        })
        .collect();

    if let Some(first) = selected.first_mut() {
        *first = 1;
    }

    selected
}

/// Approximate cumulative star count at the first entry of `page`.
#[must_use]
pub fn approximate_stars(page: u32) -> u64 {
    u64::from(page.saturating_sub(1)) * u64::from(STARS_PER_PAGE) + 1
}

/// Reconstruct the star-growth curve of `repo` from at most `sample_count` page fetches.
///
/// Failures never propagate: a failed page is dropped, and a failed first request yields
/// an empty history.
pub async fn sample_star_history(client: &Client, repo: &RepoSpec, sample_count: u32) -> StarHistory {
    let first = match fetch_page(client, repo, 1).await {
        Ok(page) => page,
        Err(e) => {
            log::warn!(target: LOG_TARGET, "Could not fetch star history for '{repo}': {e:#}");
            return StarHistory::default();
        }
    };

    let mut page_count = first.last_page.unwrap_or(1).max(1);
    let mut truncated_from = None;
    if page_count > MAX_STAR_PAGES {
        log::warn!(
            target: LOG_TARGET,
            "Star history for '{repo}' capped at {} stars (repository has {}+)",
            MAX_STAR_PAGES * STARS_PER_PAGE,
            u64::from(page_count) * u64::from(STARS_PER_PAGE)
        );
        truncated_from = Some(page_count);
        page_count = MAX_STAR_PAGES;
    }

    let pages = sample_pages(page_count, sample_count);
    log::debug!(target: LOG_TARGET, "Sampling pages {pages:?} of {page_count} for '{repo}'");

    let mut points = Vec::with_capacity(pages.len());
    for page in pages {
        let starred_at = if page == 1 {
            first.first_starred_at
        } else {
            match fetch_page(client, repo, page).await {
                Ok(fetched) => fetched.first_starred_at,
                Err(e) => {
                    log::debug!(target: LOG_TARGET, "Skipping stargazer page {page} for '{repo}': {e:#}");
                    None
                }
            }
        };

        if let Some(starred_at) = starred_at {
            points.push(StarPoint {
                date: starred_at.date_naive(),
                stars: approximate_stars(page),
            });
        }
    }

    points.sort_by_key(|point| point.date);

    StarHistory { points, truncated_from }
}

struct StargazerPage {
    first_starred_at: Option<DateTime<Utc>>,
    last_page: Option<u32>,
}

async fn fetch_page(client: &Client, repo: &RepoSpec, page: u32) -> Result<StargazerPage> {
    let url = client.repo_url(repo, &format!("/stargazers?per_page={STARS_PER_PAGE}&page={page}"));

    let resp = match client.api_call(&url, Some(STAR_MEDIA_TYPE)).await {
        ApiResult::Success(resp) => resp,
        ApiResult::Pending => bail!("stargazers not yet available (202)"),
        ApiResult::Forbidden(_) => bail!("access denied (403)"),
        ApiResult::NotFound => bail!("not found (404)"),
        ApiResult::Failed(e) => return Err(e),
    };

    let last_page = last_page(resp.headers());
    let stargazers: Vec<Stargazer> = resp.json().await.into_app_err("decoding stargazer page")?;

    Ok(StargazerPage {
        first_starred_at: stargazers.first().map(|s| s.starred_at),
        last_page,
    })
}
