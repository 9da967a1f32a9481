use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use chrono::{DateTime, Utc};

use crate::{errors::LedgerError, ledger::Ledger};

use super::{Result, StorageBackend, UNREADABLE_NOTE};

/// Keeps serialized ledgers in process memory. Documents are stored as JSON
/// text so loads go through the same decoding path as the file store.
#[derive(Default)]
pub struct MemoryStorage {
    documents: Mutex<HashMap<String, String>>,
    backups: Mutex<HashMap<String, Vec<StoredBackup>>>,
}

/// A labelled snapshot, kept in creation order.
struct StoredBackup {
    label: String,
    document: String,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores raw text under `name`, bypassing serialization.
    pub fn insert_raw(&self, name: &str, contents: impl Into<String>) -> Result<()> {
        lock(&self.documents)?.insert(name.to_string(), contents.into());
        Ok(())
    }

    pub fn raw(&self, name: &str) -> Option<String> {
        self.documents
            .lock()
            .ok()
            .and_then(|docs| docs.get(name).cloned())
    }

    /// Raw text of the backup `label` taken for `name`.
    pub fn backup_document(&self, name: &str, label: &str) -> Option<String> {
        let backups = self.backups.lock().ok()?;
        backups
            .get(name)?
            .iter()
            .find(|stored| stored.label == label)
            .map(|stored| stored.document.clone())
    }

    fn push_backup(
        &self,
        name: &str,
        note: Option<&str>,
        at: DateTime<Utc>,
        document: String,
    ) -> Result<String> {
        let mut backups = lock(&self.backups)?;
        let entries = backups.entry(name.to_string()).or_default();
        let stamp = at.format("%Y%m%d_%H%M%S%3f");
        let base = match note {
            Some(note) => format!("{name}_{stamp}_{note}"),
            None => format!("{name}_{stamp}"),
        };
        let mut label = base.clone();
        let mut counter = 0;
        while entries.iter().any(|stored| stored.label == label) {
            counter += 1;
            label = format!("{base}_{counter}");
        }
        entries.push(StoredBackup {
            label: label.clone(),
            document,
        });
        Ok(label)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| LedgerError::Storage("memory store lock poisoned".into()))
}

impl StorageBackend for MemoryStorage {
    fn save(&self, ledger: &Ledger, name: &str, _at: DateTime<Utc>) -> Result<()> {
        let json = serde_json::to_string_pretty(ledger)?;
        lock(&self.documents)?.insert(name.to_string(), json);
        Ok(())
    }

    fn load(&self, name: &str) -> Result<Ledger> {
        let docs = lock(&self.documents)?;
        let data = docs
            .get(name)
            .ok_or_else(|| LedgerError::NotFound(name.to_string()))?;
        Ok(serde_json::from_str(data)?)
    }

    fn exists(&self, name: &str) -> bool {
        self.documents
            .lock()
            .map(|docs| docs.contains_key(name))
            .unwrap_or(false)
    }

    fn list_backups(&self, name: &str) -> Result<Vec<String>> {
        let backups = lock(&self.backups)?;
        Ok(backups
            .get(name)
            .map(|entries| entries.iter().rev().map(|stored| stored.label.clone()).collect())
            .unwrap_or_default())
    }

    fn backup(
        &self,
        ledger: &Ledger,
        name: &str,
        note: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<String> {
        let document = serde_json::to_string_pretty(ledger)?;
        self.push_backup(name, note, at, document)
    }

    fn load_backup(&self, name: &str, backup: &str) -> Result<Ledger> {
        let document = self
            .backup_document(name, backup)
            .ok_or_else(|| LedgerError::NotFound(format!("{name}/{backup}")))?;
        Ok(serde_json::from_str(&document)?)
    }

    fn preserve_unreadable(&self, name: &str, at: DateTime<Utc>) -> Result<Option<String>> {
        let Some(document) = self.raw(name) else {
            return Ok(None);
        };
        self.push_backup(name, Some(UNREADABLE_NOTE), at, document)
            .map(Some)
    }
}
