//! GitHub API client
//!
//! Minimal GitHub API client for fetching repository data. Every call is a single
//! GET with a fixed timeout; there are no retries.

use crate::Result;
use crate::facts::RepoSpec;
use chrono::{DateTime, Utc};
use core::time::Duration;
use regex::Regex;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderMap, LINK};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::LazyLock;
use url::Url;

pub const GITHUB_API_URL: &str = "https://api.github.com";

/// Default media type for GitHub REST calls
pub const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";

/// Media type that adds `starred_at` to each stargazer entry
pub const STAR_MEDIA_TYPE: &str = "application/vnd.github.star+json";

const API_VERSION: &str = "2022-11-28";

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

static LAST_PAGE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[?&]page=(\d+)[^>]*>;\s*rel="last""#).expect("invalid regex"));

#[derive(Debug, Deserialize)]
pub struct Repository {
    pub full_name: Option<String>,
    pub stargazers_count: Option<u64>,
    pub forks_count: Option<u64>,
    pub subscribers_count: Option<u64>,
    pub open_issues_count: Option<u64>,
    pub size: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct Release {
    pub tag_name: String,
    pub name: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assets: Vec<crate::facts::ReleaseAsset>,
}

/// A stargazer entry as returned with the star media type
#[derive(Debug, Deserialize)]
pub struct Stargazer {
    pub starred_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub total_count: u64,
}

/// Rate limit information from response headers
#[derive(Debug, Clone, Copy)]
pub struct RateLimitInfo {
    pub remaining: usize,
    pub reset_at: DateTime<Utc>,
}

/// Result of a GitHub API call
#[derive(Debug)]
pub enum ApiResult<T> {
    /// Request succeeded
    Success(T),

    /// GitHub is still computing the requested statistics (202)
    Pending,

    /// Access denied (403), possibly because the rate limit is exhausted
    Forbidden(Option<RateLimitInfo>),

    /// The requested resource was not found (404)
    NotFound,

    /// Transport failure, timeout, undecodable body, or any other status
    Failed(ohno::AppError),
}

/// GitHub API client
#[derive(Debug, Clone)]
#[expect(clippy::struct_field_names, reason = "client field stores the underlying HTTP client")]
pub struct Client {
    client: reqwest::Client,
    base_url: String,
}

impl Client {
    /// Create a new client with an optional bearer token and base URL
    pub fn new(token: Option<&str>, base_url: &Url) -> Result<Self> {
        use reqwest::header::{AUTHORIZATION, HeaderValue};

        let mut headers = HeaderMap::new();
        let _ = headers.insert(ACCEPT, HeaderValue::from_static(JSON_MEDIA_TYPE));
        let _ = headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));

        if let Some(t) = token {
            let mut auth_val = HeaderValue::from_str(&format!("Bearer {t}"))?;
            auth_val.set_sensitive(true);
            let _ = headers.insert(AUTHORIZATION, auth_val);
        }

        let client = reqwest::Client::builder()
            .user_agent("repo-tally")
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
        })
    }

    /// Get the base URL for this client
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Construct an API URL for a repository with optional path suffix
    #[must_use]
    pub fn repo_url(&self, repo: &RepoSpec, suffix: &str) -> String {
        format!("{}/repos/{}/{}{suffix}", self.base_url, repo.owner(), repo.repo())
    }

    /// Make an API call and classify the result
    pub async fn api_call(&self, url: &str, accept: Option<&'static str>) -> ApiResult<reqwest::Response> {
        let mut request = self.client.get(url).timeout(REQUEST_TIMEOUT);
        if let Some(accept) = accept {
            request = request.header(ACCEPT, accept);
        }

        let resp = match request.send().await {
            Ok(r) => r,
            Err(e) => return ApiResult::Failed(e.into()),
        };

        match resp.status() {
            StatusCode::ACCEPTED => ApiResult::Pending,
            status if status.is_success() => ApiResult::Success(resp),
            StatusCode::FORBIDDEN => ApiResult::Forbidden(extract_rate_limit_from_headers(resp.headers())),
            StatusCode::NOT_FOUND => ApiResult::NotFound,
            status => ApiResult::Failed(ohno::app_err!("HTTP {status}")),
        }
    }

    /// Make an API call and decode the JSON body
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> ApiResult<T> {
        match self.api_call(url, None).await {
            ApiResult::Success(resp) => match resp.json().await {
                Ok(data) => ApiResult::Success(data),
                Err(e) => ApiResult::Failed(e.into()),
            },
            ApiResult::Pending => ApiResult::Pending,
            ApiResult::Forbidden(rate_limit) => ApiResult::Forbidden(rate_limit),
            ApiResult::NotFound => ApiResult::NotFound,
            ApiResult::Failed(e) => ApiResult::Failed(e),
        }
    }
}

/// Extract the page number of the `rel="last"` link from a `Link` header
#[must_use]
pub fn last_page(headers: &HeaderMap) -> Option<u32> {
    let link = headers.get(LINK)?.to_str().ok()?;
    LAST_PAGE_REGEX.captures(link)?.get(1)?.as_str().parse().ok()
}

/// Extract rate limit information from API response headers
fn extract_rate_limit_from_headers(headers: &HeaderMap) -> Option<RateLimitInfo> {
    let remaining = headers.get("x-ratelimit-remaining")?.to_str().ok()?.parse::<usize>().ok()?;

    let reset_timestamp = headers.get("x-ratelimit-reset")?.to_str().ok()?.parse::<i64>().ok()?;

    let reset_at = DateTime::from_timestamp(reset_timestamp, 0)?;

    Some(RateLimitInfo { remaining, reset_at })
}
