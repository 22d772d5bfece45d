use super::client::{self, ApiResult, Client, Repository, SearchResult, last_page};
use super::star_sampler::{self, StarHistory};
use crate::Result;
use crate::facts::{CodeFrequency, IssueCounts, PopularPath, Referrer, Release, RepoInfo, RepoSpec, Traffic, TrafficCounts};
use chrono::DateTime;
use std::collections::BTreeMap;
use url::Url;

const LOG_TARGET: &str = "   hosting";
const RELEASE_PAGE_SIZE: usize = 100;
const MAX_RELEASE_PAGES: u32 = 10;

/// Fetches repository facts from GitHub.
///
/// Apart from [`Provider::get_repo_info`], every method degrades to an empty or zero value
/// when the data can't be fetched, logging the reason.
#[derive(Debug, Clone)]
pub struct Provider {
    client: Client,
}

impl Provider {
    pub fn new(token: Option<&str>, base_url: &Url) -> Result<Self> {
        Ok(Self {
            client: Client::new(token, base_url)?,
        })
    }

    /// Fetch JSON from `url`, folding every non-success outcome into `None`.
    async fn fetch<T: serde::de::DeserializeOwned>(&self, url: &str, what: &str, repo: &RepoSpec) -> Option<T> {
        success_or_log(self.client.get_json(url).await, what, repo)
    }

    /// Profile counters. `None` means the repository can't be collected at all.
    pub async fn get_repo_info(&self, repo: &RepoSpec) -> Option<RepoInfo> {
        let url = self.client.repo_url(repo, "");
        let data: Repository = self.fetch(&url, "repository information", repo).await?;

        Some(RepoInfo {
            full_name: data.full_name,
            stars: data.stargazers_count.unwrap_or(0),
            forks: data.forks_count.unwrap_or(0),
            watchers: data.subscribers_count.unwrap_or(0),
            open_issues_and_prs: data.open_issues_count.unwrap_or(0),
            size_kb: data.size.unwrap_or(0),
        })
    }

    /// Traffic counters; only available with push access to the repository.
    pub async fn get_traffic(&self, repo: &RepoSpec) -> Traffic {
        let views: Option<TrafficCounts> = self
            .fetch(&self.client.repo_url(repo, "/traffic/views"), "traffic views", repo)
            .await;
        let clones: Option<TrafficCounts> = self
            .fetch(&self.client.repo_url(repo, "/traffic/clones"), "traffic clones", repo)
            .await;
        let referrers: Option<Vec<Referrer>> = self
            .fetch(&self.client.repo_url(repo, "/traffic/popular/referrers"), "traffic referrers", repo)
            .await;
        let popular_paths: Option<Vec<PopularPath>> = self
            .fetch(&self.client.repo_url(repo, "/traffic/popular/paths"), "popular paths", repo)
            .await;

        Traffic {
            views,
            clones,
            referrers: referrers.unwrap_or_default(),
            popular_paths: popular_paths.unwrap_or_default(),
        }
    }

    /// All releases with their assets, newest first, up to [`MAX_RELEASE_PAGES`] pages.
    pub async fn get_releases(&self, repo: &RepoSpec) -> Vec<Release> {
        let mut releases = Vec::new();

        for page_num in 1..=MAX_RELEASE_PAGES {
            let url = self
                .client
                .repo_url(repo, &format!("/releases?per_page={RELEASE_PAGE_SIZE}&page={page_num}"));

            let Some(page) = self.fetch::<Vec<client::Release>>(&url, &format!("releases page {page_num}"), repo).await else {
                break;
            };

            let page_len = page.len();
            releases.extend(page.into_iter().map(|r| Release {
                tag: r.tag_name,
                name: r.name,
                published_at: r.published_at,
                assets: r.assets,
            }));

            if page_len < RELEASE_PAGE_SIZE {
                break;
            }
        }

        releases
    }

    /// Bytes of code per language.
    pub async fn get_languages(&self, repo: &RepoSpec) -> BTreeMap<String, u64> {
        self.fetch(&self.client.repo_url(repo, "/languages"), "languages", repo)
            .await
            .unwrap_or_default()
    }

    /// Additions and deletions for the latest week.
    pub async fn get_code_frequency(&self, repo: &RepoSpec) -> Option<CodeFrequency> {
        let weeks: Vec<[i64; 3]> = self
            .fetch(&self.client.repo_url(repo, "/stats/code_frequency"), "code frequency statistics", repo)
            .await?;

        let [week, additions, deletions] = *weeks.last()?;
        Some(CodeFrequency {
            week: DateTime::from_timestamp(week, 0)?.date_naive(),
            additions: additions.unsigned_abs(),
            deletions: deletions.unsigned_abs(),
        })
    }

    /// Number of contributors, anonymous ones included.
    ///
    /// Asks for one contributor per page and reads the total from the last-page link.
    pub async fn get_contributors_count(&self, repo: &RepoSpec) -> u64 {
        let url = self.client.repo_url(repo, "/contributors?per_page=1&anon=true");

        let Some(resp) = success_or_log(self.client.api_call(&url, None).await, "contributors", repo) else {
            return 0;
        };

        if let Some(count) = last_page(resp.headers()) {
            return u64::from(count);
        }

        match resp.json::<Vec<serde_json::Value>>().await {
            Ok(contributors) => contributors.len() as u64,
            Err(e) => {
                log::warn!(target: LOG_TARGET, "Could not decode the contributors for '{repo}': {e:#}");
                0
            }
        }
    }

    /// Open issues and open pull requests, counted separately through the search API.
    pub async fn get_issue_counts(&self, repo: &RepoSpec) -> IssueCounts {
        IssueCounts {
            open_issues: self.search_count(repo, "issue").await,
            open_prs: self.search_count(repo, "pr").await,
        }
    }

    async fn search_count(&self, repo: &RepoSpec, kind: &str) -> u64 {
        let url = format!(
            "{}/search/issues?q=repo:{}/{}+type:{kind}+state:open",
            self.client.base_url(),
            repo.owner(),
            repo.repo()
        );

        self.fetch::<SearchResult>(&url, &format!("open {kind} count"), repo)
            .await
            .map_or(0, |result| result.total_count)
    }

    /// Approximate star history from sampled stargazer pages.
    pub async fn get_star_history(&self, repo: &RepoSpec, sample_count: u32) -> StarHistory {
        star_sampler::sample_star_history(&self.client, repo, sample_count).await
    }
}

/// Unwrap a successful call, or log why `what` is unavailable for `repo`.
///
/// Every failure degrades the same way; only the log line depends on the status.
fn success_or_log<T>(result: ApiResult<T>, what: &str, repo: &RepoSpec) -> Option<T> {
    match result {
        ApiResult::Success(data) => return Some(data),
        ApiResult::Pending => {
            log::info!(target: LOG_TARGET, "GitHub is still computing the {what} for '{repo}' (202)");
        }
        ApiResult::Forbidden(Some(rl)) if rl.remaining == 0 => log::warn!(
            target: LOG_TARGET,
            "Access to the {what} for '{repo}' denied (403): rate limit exhausted until {}",
            rl.reset_at.with_timezone(&chrono::Local).format("%T")
        ),
        ApiResult::Forbidden(_) => {
            log::warn!(target: LOG_TARGET, "Access to the {what} for '{repo}' denied (403)");
        }
        ApiResult::NotFound => {
            log::warn!(target: LOG_TARGET, "Could not find the {what} for '{repo}' (404)");
        }
        ApiResult::Failed(e) => {
            log::warn!(target: LOG_TARGET, "Could not fetch the {what} for '{repo}': {e:#}");
        }
    }

    None
}
