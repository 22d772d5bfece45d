#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core library for repo-tally
//!
//! This crate is an implementation detail of the `repo-tally` tool. Its API is fluid and may change
//! without warning and in a semver-incompatible way.
//!
//! # Module Organization
//!
//! - [`commands`]: Command-line interface and run orchestration
//! - [`facts`]: Data collection from GitHub and package registries
//! - [`store`]: Per-repository snapshots and append-only CSV tables

/// Result type alias using `ohno::AppError` as the default error type.
pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

pub mod commands;
pub mod facts;
pub mod store;

pub use crate::commands::{Host, run};
