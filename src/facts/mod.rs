//! Data collection for tracked repositories
//!
//! This module gathers point-in-time facts about a repository from the GitHub REST API
//! and download counts for its packages from package registries, and turns them into a
//! dated [`Snapshot`].
//!
//! # Implementation Model
//!
//! - [`hosting`]: GitHub access. Every sub-collection degrades to an empty or zero value
//!   when the API is unavailable, except the repository profile, whose absence aborts the
//!   repository's pass.
//! - [`hosting::star_sampler`]: reconstructs an approximate star-growth curve by sampling a
//!   bounded number of stargazer pages.
//! - [`registry`]: npm download counts, plus the backfill planner that tops up shallow
//!   package history from the registry's range endpoint.
//!
//! The [`Collector`] drives one pass per repository and hands the results to the
//! [`store`](crate::store) for persistence.

mod collector;
pub mod hosting;
pub mod registry;
mod repo_spec;
mod settings;
mod snapshot;

pub use collector::{CollectOutcome, Collector};
pub use repo_spec::RepoSpec;
pub use settings::Settings;
pub use snapshot::{CodeFrequency, IssueCounts, PopularPath, Referrer, Release, ReleaseAsset, RepoInfo, Snapshot, StarPoint, Traffic, TrafficCounts, TrafficDay};
