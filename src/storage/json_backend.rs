use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

use crate::{
    errors::LedgerError,
    ledger::Ledger,
    utils::{
        paths,
        persistence::{ensure_dir, write_atomic},
    },
};

use super::{Result, StorageBackend, UNREADABLE_NOTE};

const BACKUP_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S%3f";
const DEFAULT_RETENTION: usize = 5;

/// File-backed ledger store rooted at the application data directory.
#[derive(Debug, Clone)]
pub struct JsonStorage {
    root: PathBuf,
    ledgers_dir: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
}

impl JsonStorage {
    pub fn new(root: Option<PathBuf>, retention: Option<usize>) -> Result<Self> {
        let app_root = root.unwrap_or_else(paths::app_data_dir);
        let ledgers_dir = paths::ledgers_dir_in(&app_root);
        let backups_dir = paths::backups_dir_in(&app_root);
        ensure_dir(&ledgers_dir)?;
        ensure_dir(&backups_dir)?;
        Ok(Self {
            root: app_root,
            ledgers_dir,
            backups_dir,
            retention: retention.unwrap_or(DEFAULT_RETENTION).max(1),
        })
    }

    pub fn new_default() -> Result<Self> {
        Self::new(None, None)
    }

    pub fn base_dir(&self) -> &Path {
        &self.root
    }

    pub fn ledger_path(&self, name: &str) -> PathBuf {
        self.ledgers_dir
            .join(format!("{}.json", canonical_name(name)))
    }

    fn backup_dir(&self, name: &str) -> PathBuf {
        self.backups_dir.join(canonical_name(name))
    }

    pub fn backup_path(&self, name: &str, backup_name: &str) -> PathBuf {
        self.backup_dir(name).join(backup_name)
    }

    /// Writes `contents` to a backup file that did not exist before.
    ///
    /// Names are `<slug>_<YYYYMMDD>_<HHMMSSmmm>[_<note>][_<n>].json`; the
    /// counter is added only when the plain name is taken.
    fn write_new_backup(
        &self,
        name: &str,
        note: Option<&str>,
        at: DateTime<Utc>,
        contents: &[u8],
    ) -> Result<String> {
        let dir = self.backup_dir(name);
        ensure_dir(&dir)?;
        let mut stem = format!(
            "{}_{}",
            canonical_name(name),
            at.format(BACKUP_TIMESTAMP_FORMAT)
        );
        if let Some(label) = sanitize_backup_note(note) {
            stem.push('_');
            stem.push_str(&label);
        }

        let mut counter = 0u32;
        loop {
            let file_name = match counter {
                0 => format!("{stem}.{BACKUP_EXTENSION}"),
                n => format!("{stem}_{n}.{BACKUP_EXTENSION}"),
            };
            let path = dir.join(&file_name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(contents)?;
                    file.sync_all()?;
                    debug!(backup = %path.display(), "backup written");
                    return Ok(file_name);
                }
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => counter += 1,
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Copies the current file aside before it is overwritten. The copy is
    /// byte-for-byte so an unreadable document is preserved too.
    fn backup_existing_file(&self, name: &str, path: &Path, at: DateTime<Utc>) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }
        let contents = fs::read(path)?;
        self.write_new_backup(name, None, at, &contents)?;
        self.prune_backups(name)
    }

    /// Keeps the newest `retention` backups. Preserved unreadable copies
    /// are neither counted nor removed.
    fn prune_backups(&self, name: &str) -> Result<()> {
        let backups = self.list_backups(name)?;
        let stale = backups
            .iter()
            .filter(|entry| !is_preserved_copy(entry))
            .skip(self.retention);
        for entry in stale {
            if let Err(err) = fs::remove_file(self.backup_path(name, entry)) {
                warn!(backup = %entry, error = %err, "could not prune backup");
            }
        }
        Ok(())
    }
}

impl StorageBackend for JsonStorage {
    fn save(&self, ledger: &Ledger, name: &str, at: DateTime<Utc>) -> Result<()> {
        let path = self.ledger_path(name);
        self.backup_existing_file(name, &path, at)?;
        save_ledger_to_path(ledger, &path)?;
        info!(
            ledger = name,
            transactions = ledger.transactions.len(),
            rules = ledger.recurring.len(),
            "ledger saved"
        );
        Ok(())
    }

    fn load(&self, name: &str) -> Result<Ledger> {
        let path = self.ledger_path(name);
        if !path.exists() {
            return Err(LedgerError::NotFound(name.to_string()));
        }
        load_ledger_from_path(&path)
    }

    fn exists(&self, name: &str) -> bool {
        self.ledger_path(name).exists()
    }

    fn list_backups(&self, name: &str) -> Result<Vec<String>> {
        let dir = self.backup_dir(name);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(BACKUP_EXTENSION) {
                continue;
            }
            if let Some(file_name) = path.file_name().and_then(|stem| stem.to_str()) {
                entries.push(file_name.to_string());
            }
        }
        entries.sort_by(|a, b| {
            parse_backup_stamp(b)
                .cmp(&parse_backup_stamp(a))
                .then_with(|| b.cmp(a))
        });
        Ok(entries)
    }

    fn backup(
        &self,
        ledger: &Ledger,
        name: &str,
        note: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<String> {
        let json = serde_json::to_string_pretty(ledger)?;
        let file_name = self.write_new_backup(name, note, at, json.as_bytes())?;
        self.prune_backups(name)?;
        Ok(file_name)
    }

    fn load_backup(&self, name: &str, backup: &str) -> Result<Ledger> {
        let path = self.backup_path(name, backup);
        if !path.exists() {
            return Err(LedgerError::NotFound(format!("{name}/{backup}")));
        }
        load_ledger_from_path(&path)
    }

    fn preserve_unreadable(&self, name: &str, at: DateTime<Utc>) -> Result<Option<String>> {
        let path = self.ledger_path(name);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read(&path)?;
        let file_name = self.write_new_backup(name, Some(UNREADABLE_NOTE), at, &contents)?;
        warn!(ledger = name, backup = %file_name, "unreadable ledger copied aside");
        Ok(Some(file_name))
    }
}

pub fn save_ledger_to_path(ledger: &Ledger, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(ledger)?;
    write_atomic(path, &json)?;
    Ok(())
}

pub fn load_ledger_from_path(path: &Path) -> Result<Ledger> {
    let data = fs::read_to_string(path)?;
    let ledger: Ledger = serde_json::from_str(&data)?;
    Ok(ledger)
}

/// File-system safe slug for a ledger name.
pub fn canonical_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' => c,
            _ => '_',
        })
        .collect();
    if sanitized.trim_matches('_').is_empty() {
        "ledger".into()
    } else {
        sanitized
    }
}

fn sanitize_backup_note(note: Option<&str>) -> Option<String> {
    let raw = note?.trim();
    if raw.is_empty() {
        return None;
    }
    let mut sanitized = String::new();
    let mut last_dash = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            sanitized.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if (ch.is_whitespace() || matches!(ch, '-' | '.' | '_'))
            && !sanitized.is_empty()
            && !last_dash
        {
            sanitized.push('-');
            last_dash = true;
        }
    }
    let trimmed = sanitized.trim_matches('-').to_string();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Reads the stamp and collision counter from a backup name. Notes never
/// contain underscores, so the stamp is the last eight-digit date part
/// followed by a nine-digit time part, and a numeric part after it that
/// ends the name is the counter.
fn parse_backup_stamp(name: &str) -> Option<(DateTime<Utc>, u32)> {
    let stem = name.strip_suffix(".json")?;
    let parts: Vec<&str> = stem.split('_').collect();
    let index = (0..parts.len().saturating_sub(1))
        .rev()
        .find(|&i| is_digits(parts[i], 8) && is_digits(parts[i + 1], 9))?;
    let (date, time) = (parts[index], parts[index + 1]);
    let number = |raw: &str| raw.parse::<u32>().ok();
    let day = NaiveDate::from_ymd_opt(
        date[..4].parse().ok()?,
        number(&date[4..6])?,
        number(&date[6..8])?,
    )?;
    let naive = day.and_hms_milli_opt(
        number(&time[..2])?,
        number(&time[2..4])?,
        number(&time[4..6])?,
        number(&time[6..9])?,
    )?;
    let counter = match parts.get(index + 2..) {
        Some([.., last]) if !last.is_empty() && last.chars().all(|c| c.is_ascii_digit()) => {
            last.parse().unwrap_or(0)
        }
        _ => 0,
    };
    Some((Utc.from_utc_datetime(&naive), counter))
}

fn is_preserved_copy(name: &str) -> bool {
    name.strip_suffix(".json")
        .map(|stem| stem.split('_').any(|part| part == UNREADABLE_NOTE))
        .unwrap_or(false)
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage_with_temp_dir() -> (JsonStorage, TempDir) {
        let temp = TempDir::new().expect("temp dir");
        let storage =
            JsonStorage::new(Some(temp.path().to_path_buf()), Some(3)).expect("json storage");
        (storage, temp)
    }

    fn sample_ledger() -> Ledger {
        let mut ledger = Ledger::new();
        ledger.overall_budget = Some(1500.0);
        ledger
    }

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 13, minute, 5).unwrap()
    }

    #[test]
    fn save_and_load_roundtrip() {
        let (storage, _guard) = storage_with_temp_dir();
        let ledger = sample_ledger();
        storage.save(&ledger, "household", at(0)).expect("save ledger");
        let loaded = storage.load("household").expect("load ledger");
        assert_eq!(loaded.overall_budget, Some(1500.0));
    }

    #[test]
    fn load_missing_ledger_is_not_found() {
        let (storage, _guard) = storage_with_temp_dir();
        assert!(!storage.exists("ghost"));
        assert!(matches!(
            storage.load("ghost"),
            Err(LedgerError::NotFound(_))
        ));
    }

    #[test]
    fn overwrite_copies_previous_file_aside() {
        let (storage, _guard) = storage_with_temp_dir();
        storage.save(&sample_ledger(), "family", at(0)).expect("first save");
        assert!(storage.list_backups("family").expect("list").is_empty());
        storage.save(&Ledger::new(), "family", at(1)).expect("second save");
        let backups = storage.list_backups("family").expect("list backups");
        assert_eq!(backups, vec!["family_20261018_130105000.json"]);
        let previous = storage.load_backup("family", &backups[0]).expect("load backup");
        assert_eq!(previous.overall_budget, Some(1500.0));
    }

    #[test]
    fn same_instant_backups_get_distinct_names() {
        let (storage, _guard) = storage_with_temp_dir();
        let first = storage.backup(&sample_ledger(), "family", None, at(2)).unwrap();
        let second = storage.backup(&Ledger::new(), "family", None, at(2)).unwrap();
        assert_eq!(first, "family_20261018_130205000.json");
        assert_eq!(second, "family_20261018_130205000_1.json");
        assert_eq!(storage.list_backups("family").unwrap(), vec![second.clone(), first.clone()]);
        assert_eq!(storage.load_backup("family", &first).unwrap().overall_budget, Some(1500.0));
        assert_eq!(storage.load_backup("family", &second).unwrap().overall_budget, None);
    }

    #[test]
    fn backup_writes_timestamped_files() {
        let (storage, _guard) = storage_with_temp_dir();
        let name = storage
            .backup(&sample_ledger(), "family", Some("Before Import"), at(3))
            .expect("create backup");
        assert_eq!(name, "family_20261018_130305000_before-import.json");
        assert_eq!(storage.list_backups("family").expect("list backups"), vec![name.clone()]);
        assert_eq!(parse_backup_stamp(&name), Some((at(3), 0)));
    }

    #[test]
    fn preserved_copy_outlives_retention() {
        let (storage, _guard) = storage_with_temp_dir();
        fs::write(storage.ledger_path("family"), "{ broken").unwrap();
        let kept = storage
            .preserve_unreadable("family", at(4))
            .unwrap()
            .expect("copy written");
        for minute in 5..10 {
            storage.save(&Ledger::new(), "family", at(minute)).unwrap();
        }
        let backups = storage.list_backups("family").unwrap();
        assert!(backups.contains(&kept));
        assert_eq!(backups.len(), 4);
        let preserved = fs::read_to_string(storage.backup_path("family", &kept)).unwrap();
        assert_eq!(preserved, "{ broken");
    }

    #[test]
    fn nothing_to_preserve_without_a_file() {
        let (storage, _guard) = storage_with_temp_dir();
        assert_eq!(storage.preserve_unreadable("ghost", at(0)).unwrap(), None);
    }

    #[test]
    fn canonical_name_slugs_unsafe_characters() {
        assert_eq!(canonical_name(" My Budget! "), "my_budget_");
        assert_eq!(canonical_name("///"), "ledger");
    }
}
