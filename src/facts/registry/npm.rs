use super::{PackageDownloads, RegistrySource};
use crate::Result;
use chrono::NaiveDate;
use core::time::Duration;
use ohno::IntoAppError;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

const LOG_TARGET: &str = "       npm";

pub const NPM_API_URL: &str = "https://api.npmjs.org";

const POINT_TIMEOUT: Duration = Duration::from_secs(30);
const RANGE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct PointResponse {
    #[serde(default)]
    downloads: u64,
}

#[derive(Debug, Deserialize)]
struct RangeResponse {
    #[serde(default)]
    downloads: Vec<DailyDownloads>,
}

/// Downloads of a package on a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DailyDownloads {
    pub day: NaiveDate,
    pub downloads: u64,
}

/// Client for the npm download-count API.
///
/// Lookups never fail: a missing package or an unreachable registry reads as zero downloads.
#[derive(Debug, Clone)]
pub struct NpmProvider {
    client: reqwest::Client,
    base_url: String,
}

impl NpmProvider {
    pub fn new(base_url: &Url) -> Result<Self> {
        let client = reqwest::Client::builder().user_agent("repo-tally").build()?;

        Ok(Self {
            client,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
        })
    }

    /// Downloads on `date` plus the trailing week as reported by the registry.
    pub async fn get_downloads(&self, package: &str, date: NaiveDate) -> PackageDownloads {
        PackageDownloads {
            source: RegistrySource::Npm,
            package: package.to_string(),
            daily_downloads: self.get_point(package, &date.to_string()).await,
            weekly_downloads: self.get_point(package, "last-week").await,
        }
    }

    /// Daily downloads for every day in `start..=end` that the registry knows about.
    pub async fn get_range(&self, package: &str, start: NaiveDate, end: NaiveDate) -> Vec<DailyDownloads> {
        let url = format!("{}/downloads/range/{start}:{end}/{package}", self.base_url);

        match self.get_json::<RangeResponse>(&url, RANGE_TIMEOUT).await {
            Ok(Some(range)) => range.downloads,
            Ok(None) => {
                log::warn!(target: LOG_TARGET, "No download history for npm package '{package}'");
                Vec::new()
            }
            Err(e) => {
                log::warn!(target: LOG_TARGET, "Could not fetch download history for npm package '{package}': {e:#}");
                Vec::new()
            }
        }
    }

    async fn get_point(&self, package: &str, period: &str) -> u64 {
        let url = format!("{}/downloads/point/{period}/{package}", self.base_url);

        match self.get_json::<PointResponse>(&url, POINT_TIMEOUT).await {
            Ok(Some(point)) => point.downloads,
            Ok(None) => 0,
            Err(e) => {
                log::warn!(target: LOG_TARGET, "Could not fetch {period} downloads for npm package '{package}': {e:#}");
                0
            }
        }
    }

    /// GET `url` and decode it, mapping 404 to `None`.
    async fn get_json<T: DeserializeOwned>(&self, url: &str, timeout: Duration) -> Result<Option<T>> {
        let resp = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .into_app_err_with(|| format!("requesting '{url}'"))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let resp = resp.error_for_status().into_app_err_with(|| format!("requesting '{url}'"))?;
        let data = resp.json().await.into_app_err_with(|| format!("decoding '{url}'"))?;
        Ok(Some(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_response_deserialize() {
        let json = r#"{"downloads": 1234, "start": "2024-01-14", "end": "2024-01-14", "package": "left-pad"}"#;
        let point: PointResponse = serde_json::from_str(json).unwrap();
        assert_eq!(point.downloads, 1234);
    }

    #[test]
    fn test_range_response_deserialize() {
        let json = r#"{
            "start": "2024-01-01",
            "end": "2024-01-02",
            "package": "left-pad",
            "downloads": [
                {"downloads": 5, "day": "2024-01-01"},
                {"downloads": 7, "day": "2024-01-02"}
            ]
        }"#;

        let range: RangeResponse = serde_json::from_str(json).unwrap();
        assert_eq!(range.downloads.len(), 2);
        assert_eq!(range.downloads[1].day, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(range.downloads[1].downloads, 7);
    }

    #[test]
    fn test_error_payload_reads_as_empty() {
        let range: RangeResponse = serde_json::from_str(r#"{"error": "package left-pad not found"}"#).unwrap();
        assert!(range.downloads.is_empty());
    }

    #[test]
    fn test_base_url_trimmed() {
        let provider = NpmProvider::new(&Url::parse("https://api.npmjs.org/").unwrap()).unwrap();
        assert_eq!(provider.base_url, "https://api.npmjs.org");
    }
}
