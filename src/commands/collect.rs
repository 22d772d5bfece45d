use super::Host;
use super::common::{LogLevel, init_logging};
use super::config::Config;
use crate::Result;
use crate::facts::hosting::GITHUB_API_URL;
use crate::facts::hosting::star_sampler::DEFAULT_SAMPLE_COUNT;
use crate::facts::registry::NPM_API_URL;
use crate::facts::{CollectOutcome, Collector, RepoSpec, Settings};
use camino::Utf8PathBuf;
use chrono::{NaiveDate, Utc};
use clap::Parser;
use ohno::bail;
use std::io::Write;
use url::Url;

const LOG_TARGET: &str = "   collect";

#[derive(Parser, Debug)]
pub struct CollectArgs {
    /// Path to the configuration file listing the repositories to track
    #[arg(long, short = 'c', value_name = "PATH", default_value = "config.json")]
    pub config: Utf8PathBuf,

    /// Directory where snapshots and tables are stored
    #[arg(long, value_name = "PATH", default_value = "data")]
    pub data_dir: Utf8PathBuf,

    /// GitHub personal access token [falls back to $GITHUB_TOKEN]
    #[arg(long, value_name = "TOKEN", env = "GH_PAT", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Date to record the collection under [default: today, UTC]
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub date: Option<NaiveDate>,

    /// Number of stargazer pages to sample for the star history
    #[arg(long, value_name = "N", default_value_t = DEFAULT_SAMPLE_COUNT)]
    pub star_samples: u32,

    /// Base URL of the GitHub REST API
    #[arg(long, value_name = "URL", default_value = GITHUB_API_URL)]
    pub github_api_url: Url,

    /// Base URL of the npm download-count API
    #[arg(long, value_name = "URL", default_value = NPM_API_URL)]
    pub npm_api_url: Url,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    pub log_level: LogLevel,
}

impl CollectArgs {
    fn settings(&self) -> Settings {
        let github_token = self
            .github_token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
            .filter(|token| !token.trim().is_empty());

        Settings {
            github_token,
            github_api_url: self.github_api_url.clone(),
            npm_api_url: self.npm_api_url.clone(),
            data_dir: self.data_dir.clone().into_std_path_buf(),
            star_samples: self.star_samples,
        }
    }
}

/// Collect every configured repository for one date.
///
/// Repositories are processed one at a time; a failure is logged and the batch moves on. The
/// command fails if any repository failed.
pub async fn collect<H: Host>(host: &mut H, args: &CollectArgs) -> Result<()> {
    init_logging(args.log_level);

    let config = Config::load(&args.config)?;
    let date = args.date.unwrap_or_else(|| Utc::now().date_naive());
    let settings = args.settings();

    if settings.github_token.is_none() {
        log::warn!(target: LOG_TARGET, "No GitHub token configured; traffic data will be unavailable and rate limits are low");
    }

    let collector = Collector::new(&settings)?;

    let total = config.repos.len();
    let mut succeeded = 0;
    let mut failed: Vec<&RepoSpec> = Vec::new();

    for entry in &config.repos {
        match collector.collect_repo(&entry.repo, &entry.packages, date).await {
            Ok(CollectOutcome::Collected | CollectOutcome::AlreadyCollected) => succeeded += 1,
            Err(e) => {
                log::error!(target: LOG_TARGET, "Could not collect '{}': {e:#}", entry.repo);
                failed.push(&entry.repo);
            }
        }
    }

    let _ = writeln!(host.output(), "Collected {succeeded}/{total} repositories for {date}");

    if failed.is_empty() {
        return Ok(());
    }

    for repo in &failed {
        let _ = writeln!(host.error(), "❌ Failed to collect '{repo}'");
    }

    bail!("{} of {total} repositories could not be collected", failed.len())
}
