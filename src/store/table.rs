use crate::Result;
use chrono::NaiveDate;
use core::marker::PhantomData;
use ohno::IntoAppError;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

const LOG_TARGET: &str = "     store";

/// Describes one CSV table whose rows carry a `date` column.
///
/// The field order of `Row` must match `HEADERS`, since rows are written without a header line.
pub trait Table {
    type Row: Serialize + DeserializeOwned;

    const FILE_NAME: &'static str;
    const HEADERS: &'static [&'static str];
}

/// Result of a whole-date append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Appended,

    /// The table already had rows for the date; nothing was written
    AlreadyPresent,
}

impl AppendOutcome {
    #[must_use]
    pub const fn is_appended(self) -> bool {
        matches!(self, Self::Appended)
    }
}

#[derive(Debug, Deserialize)]
struct DateColumn {
    date: NaiveDate,
}

/// An append-only CSV file holding the rows of table `T`.
#[derive(Debug)]
pub struct CsvTable<T> {
    path: PathBuf,
    table: PhantomData<T>,
}

impl<T: Table> CsvTable<T> {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(T::FILE_NAME),
            table: PhantomData,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Size of the file in bytes, or `None` when it doesn't exist yet.
    pub fn size(&self) -> Result<Option<u64>> {
        match fs::metadata(&self.path) {
            Ok(metadata) => Ok(Some(metadata.len())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).into_app_err_with(|| format!("unable to inspect '{}'", self.path.display())),
        }
    }

    /// Create the file with its header line if it doesn't exist.
    pub fn ensure_schema(&self) -> Result<()> {
        if self.exists() {
            return Ok(());
        }

        self.create_dir()?;
        let file = File::create(&self.path).into_app_err_with(|| format!("unable to create '{}'", self.path.display()))?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        writer
            .write_record(T::HEADERS)
            .into_app_err_with(|| format!("unable to write header of '{}'", self.path.display()))?;
        writer
            .flush()
            .into_app_err_with(|| format!("unable to flush '{}'", self.path.display()))?;

        log::debug!(target: LOG_TARGET, "Created '{}'", self.path.display());
        Ok(())
    }

    /// All rows in file order. A missing file reads as empty.
    pub fn read_rows(&self) -> Result<Vec<T::Row>> {
        self.read_as::<T::Row>()
    }

    /// The distinct dates present in the table.
    pub fn existing_dates(&self) -> Result<BTreeSet<NaiveDate>> {
        Ok(self.read_as::<DateColumn>()?.into_iter().map(|row| row.date).collect())
    }

    pub fn contains_date(&self, date: NaiveDate) -> Result<bool> {
        Ok(self.read_as::<DateColumn>()?.iter().any(|row| row.date == date))
    }

    /// Append `rows` for `date` unless the table already has that date.
    ///
    /// A new date with no rows still counts as appended, even though nothing gets written.
    pub fn append_if_new(&self, date: NaiveDate, rows: &[T::Row]) -> Result<AppendOutcome> {
        self.ensure_schema()?;

        if self.contains_date(date)? {
            log::debug!(target: LOG_TARGET, "'{}' already has data for {date}", self.path.display());
            return Ok(AppendOutcome::AlreadyPresent);
        }

        let _ = self.append_rows(rows)?;
        Ok(AppendOutcome::Appended)
    }

    /// Append `rows` as-is in a single write, returning how many were written.
    pub fn append_rows(&self, rows: &[T::Row]) -> Result<usize> {
        self.ensure_schema()?;

        if rows.is_empty() {
            return Ok(0);
        }

        let file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .into_app_err_with(|| format!("unable to open '{}' for appending", self.path.display()))?;

        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        for row in rows {
            writer
                .serialize(row)
                .into_app_err_with(|| format!("unable to append to '{}'", self.path.display()))?;
        }
        writer
            .flush()
            .into_app_err_with(|| format!("unable to flush '{}'", self.path.display()))?;

        Ok(rows.len())
    }

    /// Rewrite the whole file with a header and `rows`.
    pub fn replace_all(&self, rows: &[T::Row]) -> Result<()> {
        self.create_dir()?;

        let file = File::create(&self.path).into_app_err_with(|| format!("unable to create '{}'", self.path.display()))?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        writer
            .write_record(T::HEADERS)
            .into_app_err_with(|| format!("unable to write header of '{}'", self.path.display()))?;
        for row in rows {
            writer
                .serialize(row)
                .into_app_err_with(|| format!("unable to write '{}'", self.path.display()))?;
        }

        writer
            .flush()
            .into_app_err_with(|| format!("unable to flush '{}'", self.path.display()))?;
        Ok(())
    }

    fn read_as<R: DeserializeOwned>(&self) -> Result<Vec<R>> {
        if !self.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&self.path).into_app_err_with(|| format!("unable to open '{}'", self.path.display()))?;

        reader
            .deserialize()
            .enumerate()
            .map(|(index, row)| {
                // line 1 is the header
                row.into_app_err_with(|| format!("unable to parse line {} of '{}'", index + 2, self.path.display()))
            })
            .collect()
    }

    fn create_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).into_app_err_with(|| format!("unable to create directory '{}'", parent.display()))?;
        }
        Ok(())
    }
}
