use super::rows::{AggregateTable, PackagesTable, ReleasesTable, StarHistoryTable};
use super::table::CsvTable;
use crate::Result;
use crate::facts::{RepoSpec, Snapshot};
use chrono::NaiveDate;
use ohno::{IntoAppError, bail};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

const LOG_TARGET: &str = "     store";

/// Star history files smaller than this are considered placeholders and get rewritten.
pub const STAR_HISTORY_REPLACE_BELOW: u64 = 500;

/// The on-disk records of one repository: `<data_dir>/<owner>/<name>/`.
#[derive(Debug)]
pub struct RepoStore {
    dir: PathBuf,
    snapshots_dir: PathBuf,
    aggregate: CsvTable<AggregateTable>,
    releases: CsvTable<ReleasesTable>,
    packages: CsvTable<PackagesTable>,
    star_history: CsvTable<StarHistoryTable>,
}

impl RepoStore {
    /// Locate the store for `repo` under `data_dir`. Nothing is created until something is written.
    pub fn open(data_dir: impl AsRef<Path>, repo: &RepoSpec) -> Self {
        let dir = data_dir
            .as_ref()
            .join(sanitize_path_component(repo.owner()))
            .join(sanitize_path_component(repo.repo()));

        Self {
            snapshots_dir: dir.join("snapshots"),
            aggregate: CsvTable::new(&dir),
            releases: CsvTable::new(&dir),
            packages: CsvTable::new(&dir),
            star_history: CsvTable::new(&dir),
            dir,
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn snapshot_path(&self, date: NaiveDate) -> PathBuf {
        self.snapshots_dir.join(format!("{date}.json"))
    }

    /// Whether `date` has already been collected.
    #[must_use]
    pub fn snapshot_exists(&self, date: NaiveDate) -> bool {
        self.snapshot_path(date).exists()
    }

    /// Write the snapshot for `date`. Fails rather than overwrite an existing one.
    ///
    /// The document is written to a temporary file beside it and renamed into place, so a failed
    /// write never leaves a partial snapshot that would mark the date as collected.
    pub fn save_snapshot(&self, date: NaiveDate, snapshot: &Snapshot) -> Result<PathBuf> {
        let path = self.snapshot_path(date);
        if path.exists() {
            bail!("snapshot '{}' already exists", path.display());
        }

        fs::create_dir_all(&self.snapshots_dir)
            .into_app_err_with(|| format!("unable to create directory '{}'", self.snapshots_dir.display()))?;

        let tmp_path = self.snapshots_dir.join(format!(".{date}.json.tmp"));
        if let Err(e) = write_json(&tmp_path, snapshot) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        fs::rename(&tmp_path, &path).into_app_err_with(|| format!("unable to move snapshot into '{}'", path.display()))?;

        log::debug!(target: LOG_TARGET, "Saved snapshot '{}'", path.display());
        Ok(path)
    }

    pub fn load_snapshot(&self, date: NaiveDate) -> Result<Snapshot> {
        let path = self.snapshot_path(date);
        let file = File::open(&path).into_app_err_with(|| format!("unable to open snapshot '{}'", path.display()))?;
        serde_json::from_reader(BufReader::new(file)).into_app_err_with(|| format!("unable to parse snapshot '{}'", path.display()))
    }

    #[must_use]
    pub const fn aggregate(&self) -> &CsvTable<AggregateTable> {
        &self.aggregate
    }

    #[must_use]
    pub const fn releases(&self) -> &CsvTable<ReleasesTable> {
        &self.releases
    }

    #[must_use]
    pub const fn packages(&self) -> &CsvTable<PackagesTable> {
        &self.packages
    }

    #[must_use]
    pub const fn star_history(&self) -> &CsvTable<StarHistoryTable> {
        &self.star_history
    }

    /// Whether the star history table is missing or small enough to be rewritten.
    pub fn star_history_replaceable(&self) -> Result<bool> {
        Ok(self
            .star_history
            .size()?
            .is_none_or(|size| size < STAR_HISTORY_REPLACE_BELOW))
    }
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).into_app_err_with(|| format!("unable to create '{}'", path.display()))?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value).into_app_err_with(|| format!("unable to write '{}'", path.display()))?;
    writer.flush().into_app_err_with(|| format!("unable to flush '{}'", path.display()))
}

/// Make a repository owner or name safe to use as a single directory name.
fn sanitize_path_component(s: &str) -> String {
    let cleaned: String = s
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        cleaned.replace('.', "_") + "_"
    } else {
        cleaned.replace("..", "__")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::{IssueCounts, RepoInfo, StarPoint, Traffic};
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    fn snapshot() -> Snapshot {
        Snapshot {
            collected_at: Utc.with_ymd_and_hms(2024, 1, 15, 6, 0, 0).unwrap(),
            repo: RepoInfo {
                stars: 120,
                ..RepoInfo::default()
            },
            traffic: Traffic::default(),
            releases: Vec::new(),
            languages: BTreeMap::from([("Rust".to_string(), 1000)]),
            code_frequency: None,
            contributors_count: 1,
            releases_downloads: 0,
            star_history: Vec::new(),
            issue_counts: IssueCounts::default(),
            packages: Vec::new(),
        }
    }

    #[test]
    fn test_layout() {
        let data = TempDir::new().unwrap();
        let store = RepoStore::open(data.path(), &"octo/widgets".parse().unwrap());

        assert_eq!(store.dir(), data.path().join("octo").join("widgets"));
        assert_eq!(store.snapshot_path(day()), data.path().join("octo/widgets/snapshots/2024-01-15.json"));
        assert_eq!(store.aggregate().path(), data.path().join("octo/widgets/aggregate.csv"));
        assert_eq!(store.releases().path(), data.path().join("octo/widgets/releases.csv"));
        assert_eq!(store.packages().path(), data.path().join("octo/widgets/packages.csv"));
        assert_eq!(store.star_history().path(), data.path().join("octo/widgets/star_history.csv"));
        assert!(!store.dir().exists());
    }

    #[test]
    fn test_snapshot_round_trip_and_no_overwrite() {
        let data = TempDir::new().unwrap();
        let store = RepoStore::open(data.path(), &"octo/widgets".parse().unwrap());

        assert!(!store.snapshot_exists(day()));
        let path = store.save_snapshot(day(), &snapshot()).unwrap();
        assert!(store.snapshot_exists(day()));
        assert_eq!(store.load_snapshot(day()).unwrap(), snapshot());

        let before = fs::read_to_string(&path).unwrap();
        assert!(before.contains("\n  \"collected_at\""), "snapshot should be pretty-printed");

        let mut changed = snapshot();
        changed.repo.stars = 999;
        let _ = store.save_snapshot(day(), &changed).unwrap_err();
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn test_save_snapshot_leaves_no_temporary_file() {
        let data = TempDir::new().unwrap();
        let store = RepoStore::open(data.path(), &"octo/widgets".parse().unwrap());

        let path = store.save_snapshot(day(), &snapshot()).unwrap();

        let names: Vec<String> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["2024-01-15.json".to_string()]);
    }

    #[test]
    fn test_leftover_temporary_file_does_not_count_as_collected() {
        let data = TempDir::new().unwrap();
        let store = RepoStore::open(data.path(), &"octo/widgets".parse().unwrap());

        let snapshots = store.dir().join("snapshots");
        fs::create_dir_all(&snapshots).unwrap();
        fs::write(snapshots.join(".2024-01-15.json.tmp"), "{\"collected_at\": ").unwrap();

        assert!(!store.snapshot_exists(day()));
        let _ = store.save_snapshot(day(), &snapshot()).unwrap();

        assert_eq!(store.load_snapshot(day()).unwrap(), snapshot());
        assert!(!snapshots.join(".2024-01-15.json.tmp").exists());
    }

    #[test]
    fn test_star_history_replaceable() {
        let data = TempDir::new().unwrap();
        let store = RepoStore::open(data.path(), &"octo/widgets".parse().unwrap());
        assert!(store.star_history_replaceable().unwrap());

        let start = day();
        let few: Vec<StarPoint> = (0..3)
            .map(|i| StarPoint {
                date: start + chrono::Days::new(i),
                stars: i * 100 + 1,
            })
            .collect();
        store.star_history().replace_all(&few).unwrap();
        assert!(store.star_history_replaceable().unwrap());

        let many: Vec<StarPoint> = (0..40)
            .map(|i| StarPoint {
                date: start + chrono::Days::new(i),
                stars: i * 100 + 1,
            })
            .collect();
        store.star_history().replace_all(&many).unwrap();
        assert!(store.star_history().size().unwrap().unwrap() >= STAR_HISTORY_REPLACE_BELOW);
        assert!(!store.star_history_replaceable().unwrap());
    }

    #[test]
    fn test_sanitize_path_component() {
        assert_eq!(sanitize_path_component("widgets"), "widgets");
        assert_eq!(sanitize_path_component("my.repo"), "my.repo");
        assert_eq!(sanitize_path_component("a:b|c"), "a_b_c");
        assert_eq!(sanitize_path_component("..x"), "__x");
        assert_eq!(sanitize_path_component(".."), "___");
        assert_eq!(sanitize_path_component("."), "__");
    }
}
