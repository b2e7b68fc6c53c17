//! Filesystem JSON persistence for the budget book.
//!
//! The whole book lives in one file that is rewritten through a temp file and a
//! rename on every mutation, so a recalculation pass lands on disk in one step.

use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    sync::{Mutex, RwLock, RwLockReadGuard},
};

use carryover_core::{
    BudgetRepository, BudgetStore, CoreError, PassCommit, SnapshotStore,
};
use carryover_domain::{
    Budget, BudgetBook, BudgetCategory, BudgetPeriodSnapshot, CURRENT_SCHEMA_VERSION,
};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Timelike, Utc};
use tracing::{debug, info};
use uuid::Uuid;

const BOOK_FILE: &str = "budget_book.json";
const BACKUP_PREFIX: &str = "budget_book";
const BACKUP_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S%3f";
const BACKUP_TIMESTAMP_LEN: usize = 18;
const TMP_SUFFIX: &str = "tmp";
const DEFAULT_RETENTION: usize = 5;

#[derive(Debug, Clone)]
pub struct StoragePaths {
    pub data_root: PathBuf,
    pub backup_root: PathBuf,
}

impl StoragePaths {
    pub fn under(base: &Path) -> Self {
        Self {
            data_root: base.to_path_buf(),
            backup_root: base.join("backups"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupInfo {
    /// File name inside the backup directory.
    pub id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub path: PathBuf,
}

/// [`BudgetStore`] persisted as a single JSON document.
#[derive(Debug)]
pub struct JsonBudgetStore {
    paths: StoragePaths,
    retention: usize,
    book: RwLock<BudgetBook>,
    last_backup: Mutex<Option<NaiveDateTime>>,
}

impl JsonBudgetStore {
    pub fn open(paths: StoragePaths) -> Result<Self, CoreError> {
        Self::with_retention(paths, DEFAULT_RETENTION)
    }

    pub fn with_retention(paths: StoragePaths, retention: usize) -> Result<Self, CoreError> {
        fs::create_dir_all(&paths.data_root)?;
        fs::create_dir_all(&paths.backup_root)?;
        let path = paths.data_root.join(BOOK_FILE);
        let book = if path.exists() {
            read_book(&path)?
        } else {
            BudgetBook::default()
        };
        info!(
            path = %path.display(),
            budgets = book.budgets.len(),
            snapshots = book.snapshots.len(),
            "budget book opened"
        );
        Ok(Self {
            paths,
            retention: retention.max(1),
            book: RwLock::new(book),
            last_backup: Mutex::new(None),
        })
    }

    pub fn book_path(&self) -> PathBuf {
        self.paths.data_root.join(BOOK_FILE)
    }

    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    /// Writes a timestamped copy of the current book, then prunes beyond the retention.
    pub fn backup(&self, note: Option<&str>) -> Result<BackupInfo, CoreError> {
        let json = serialize_book(&*self.read()?)?;
        let stamp = self.next_backup_stamp()?;
        let mut stem = format!("{BACKUP_PREFIX}_{}", stamp.format(BACKUP_TIMESTAMP_FORMAT));
        if let Some(label) = sanitize_note(note) {
            stem.push('_');
            stem.push_str(&label);
        }
        let id = format!("{stem}.{BACKUP_EXTENSION}");
        let path = self.paths.backup_root.join(&id);
        write_file(&path, &json)?;
        info!(backup = %id, "budget book backed up");
        self.prune_backups()?;
        Ok(BackupInfo {
            created_at: Some(DateTime::from_naive_utc_and_offset(stamp, Utc)),
            id,
            path,
        })
    }

    /// Backups, newest first.
    pub fn list_backups(&self) -> Result<Vec<BackupInfo>, CoreError> {
        let dir = &self.paths.backup_root;
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(BACKUP_EXTENSION) {
                continue;
            }
            let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            if let Some(created_at) = backup_timestamp(name) {
                entries.push(BackupInfo {
                    id: name.to_string(),
                    created_at: Some(created_at),
                    path: path.clone(),
                });
            }
        }
        entries.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(entries)
    }

    /// Replaces the live book with a backup.
    pub fn restore_backup(&self, id: &str) -> Result<BudgetBook, CoreError> {
        let path = self.paths.backup_root.join(id);
        if !path.is_file() {
            return Err(CoreError::Storage(format!("backup `{id}` not found")));
        }
        let restored = read_book(&path)?;
        let mut guard = self
            .book
            .write()
            .map_err(|_| CoreError::Storage("budget book lock poisoned".into()))?;
        self.persist(&restored)?;
        *guard = restored.clone();
        info!(backup = %id, "budget book restored");
        Ok(restored)
    }

    fn prune_backups(&self) -> Result<(), CoreError> {
        for stale in self.list_backups()?.into_iter().skip(self.retention) {
            debug!(backup = %stale.id, "pruning backup");
            fs::remove_file(&stale.path)?;
        }
        Ok(())
    }

    /// Strictly increasing stamps so backups taken within one millisecond keep their order.
    fn next_backup_stamp(&self) -> Result<NaiveDateTime, CoreError> {
        let mut last = self
            .last_backup
            .lock()
            .map_err(|_| CoreError::Storage("backup clock poisoned".into()))?;
        let now = Utc::now().naive_utc();
        let now = now
            .with_nanosecond(now.nanosecond() / 1_000_000 * 1_000_000)
            .unwrap_or(now);
        let stamp = match *last {
            Some(previous) if now <= previous => previous + Duration::milliseconds(1),
            _ => now,
        };
        *last = Some(stamp);
        Ok(stamp)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BudgetBook>, CoreError> {
        self.book
            .read()
            .map_err(|_| CoreError::Storage("budget book lock poisoned".into()))
    }

    /// Applies `change` to a copy of the book and swaps it in once it is on disk.
    /// A failed change or write leaves both the file and the memory state untouched.
    fn mutate<T>(
        &self,
        change: impl FnOnce(&mut BudgetBook) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        let mut guard = self
            .book
            .write()
            .map_err(|_| CoreError::Storage("budget book lock poisoned".into()))?;
        let mut next = guard.clone();
        let value = change(&mut next)?;
        next.updated_at = Some(Utc::now());
        self.persist(&next)?;
        *guard = next;
        Ok(value)
    }

    fn persist(&self, book: &BudgetBook) -> Result<(), CoreError> {
        let path = self.book_path();
        let tmp = tmp_path(&path);
        write_file(&tmp, &serialize_book(book)?)?;
        fs::rename(&tmp, &path)?;
        debug!(path = %path.display(), "budget book written");
        Ok(())
    }
}

impl BudgetRepository for JsonBudgetStore {
    fn budget(&self, id: Uuid) -> Result<Option<Budget>, CoreError> {
        Ok(self.read()?.budget(id).cloned())
    }

    fn budgets_for_user(&self, user_id: Uuid) -> Result<Vec<Budget>, CoreError> {
        Ok(self.read()?.budgets_for_user(user_id))
    }

    fn save_budget(&self, budget: &Budget) -> Result<(), CoreError> {
        self.mutate(|book| {
            book.upsert_budget(budget.clone());
            Ok(())
        })
    }

    fn delete_budget(&self, id: Uuid) -> Result<bool, CoreError> {
        if self.read()?.budget(id).is_none() {
            return Ok(false);
        }
        self.mutate(|book| Ok(book.remove_budget(id)))
    }

    fn set_recalculating(&self, id: Uuid, flag: bool) -> Result<(), CoreError> {
        self.mutate(|book| {
            if book.set_recalculating(id, flag) {
                Ok(())
            } else {
                Err(CoreError::BudgetNotFound(id))
            }
        })
    }

    fn budget_categories(&self, budget_id: Uuid) -> Result<Vec<BudgetCategory>, CoreError> {
        Ok(self.read()?.budget_categories(budget_id))
    }

    fn budget_category(
        &self,
        budget_id: Uuid,
        id: Uuid,
    ) -> Result<Option<BudgetCategory>, CoreError> {
        Ok(self.read()?.budget_category(budget_id, id).cloned())
    }

    fn save_budget_category(&self, row: &BudgetCategory) -> Result<(), CoreError> {
        self.mutate(|book| {
            book.upsert_budget_category(row.clone());
            Ok(())
        })
    }

    fn delete_budget_category(&self, budget_id: Uuid, id: Uuid) -> Result<bool, CoreError> {
        if self.read()?.budget_category(budget_id, id).is_none() {
            return Ok(false);
        }
        self.mutate(|book| Ok(book.remove_budget_category(budget_id, id)))
    }
}

impl SnapshotStore for JsonBudgetStore {
    fn snapshot(
        &self,
        budget_id: Uuid,
        period_start: NaiveDate,
    ) -> Result<Option<BudgetPeriodSnapshot>, CoreError> {
        Ok(self.read()?.snapshot(budget_id, period_start).cloned())
    }

    fn snapshots(&self, budget_id: Uuid) -> Result<Vec<BudgetPeriodSnapshot>, CoreError> {
        Ok(self.read()?.snapshots_for(budget_id))
    }

    fn snapshot_before(
        &self,
        budget_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<BudgetPeriodSnapshot>, CoreError> {
        Ok(self.read()?.snapshot_before(budget_id, date).cloned())
    }

    fn upsert_snapshot(&self, snapshot: &BudgetPeriodSnapshot) -> Result<(), CoreError> {
        self.mutate(|book| {
            book.upsert_snapshot(snapshot.clone());
            Ok(())
        })
    }
}

impl BudgetStore for JsonBudgetStore {
    fn commit_pass(&self, commit: PassCommit) -> Result<(), CoreError> {
        let budget_id = commit.budget.id;
        let periods = commit.snapshots.len();
        self.mutate(|book| {
            if book.budget(budget_id).is_none() {
                return Err(CoreError::BudgetNotFound(budget_id));
            }
            book.apply_pass(commit.budget, commit.snapshots, commit.replace_existing);
            Ok(())
        })?;
        debug!(%budget_id, periods, "recalculation pass persisted");
        Ok(())
    }
}

fn read_book(path: &Path) -> Result<BudgetBook, CoreError> {
    let data = fs::read_to_string(path)?;
    let book: BudgetBook =
        serde_json::from_str(&data).map_err(|err| CoreError::Serde(err.to_string()))?;
    if book.schema_version > CURRENT_SCHEMA_VERSION {
        return Err(CoreError::Storage(format!(
            "{} uses schema version {}, newest supported is {}",
            path.display(),
            book.schema_version,
            CURRENT_SCHEMA_VERSION
        )));
    }
    Ok(book)
}

fn serialize_book(book: &BudgetBook) -> Result<String, CoreError> {
    serde_json::to_string_pretty(book).map_err(|err| CoreError::Serde(err.to_string()))
}

fn sanitize_note(note: Option<&str>) -> Option<String> {
    let mut label = String::new();
    for ch in note?.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            label.push(ch.to_ascii_lowercase());
        } else if !label.is_empty() && !label.ends_with('-') {
            label.push('-');
        }
    }
    let label = label.trim_end_matches('-');
    (!label.is_empty()).then(|| label.to_string())
}

fn backup_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let rest = name.strip_prefix(BACKUP_PREFIX)?.strip_prefix('_')?;
    let stamp = rest.get(..BACKUP_TIMESTAMP_LEN)?;
    let (seconds, millis) = stamp.split_at(BACKUP_TIMESTAMP_LEN - 3);
    let millis: i64 = millis.parse().ok()?;
    NaiveDateTime::parse_from_str(seconds, "%Y%m%d_%H%M%S")
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc) + Duration::milliseconds(millis))
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{existing}.{TMP_SUFFIX}"),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_file(path: &Path, data: &str) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.sync_all()?;
    Ok(())
}
