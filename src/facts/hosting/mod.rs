//! GitHub access: profile, traffic, releases, statistics, and sampled star history.

mod client;
mod provider;
pub mod star_sampler;

pub use client::{ApiResult, Client, GITHUB_API_URL, RateLimitInfo, last_page};
pub use provider::Provider;
pub use star_sampler::StarHistory;
