//! Durable per-repository records.
//!
//! Each tracked repository owns a directory holding one JSON snapshot per collected day plus a
//! set of CSV tables that only ever grow by whole dates. The star history table is the exception:
//! it is a disposable reconstruction that gets rewritten rather than appended to.

pub mod delta;
mod repo_store;
mod rows;
mod table;

pub use repo_store::{RepoStore, STAR_HISTORY_REPLACE_BELOW};
pub use rows::{AggregateRow, AggregateTable, PackageRow, PackagesTable, ReleaseAssetRow, ReleasesTable, StarHistoryTable};
pub use table::{AppendOutcome, CsvTable, Table};
