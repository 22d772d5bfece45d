//! Command-line interface and run orchestration for repo-tally
//!
//! # Commands
//!
//! - **collect**: Load the configuration, then run one collection pass per configured repository
//!   in order. A repository that fails is logged and counted, and the remaining ones still run.
//!   The command fails when any repository failed.
//! - **validate**: Load and check a configuration file without touching the network.
//!
//! The `run` function parses the command line with clap and routes to the handler. Handlers
//! write their user-facing output through a [`Host`] so they can be exercised in tests.

mod collect;
mod common;
mod config;
mod host;
mod run;
mod validate;

pub use collect::{CollectArgs, collect};
pub use common::LogLevel;
pub use config::{Config, RepoEntry};
pub use host::Host;
pub use run::run;
pub use validate::{ValidateArgs, validate_config};
