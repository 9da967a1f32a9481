pub mod json_backend;
pub mod memory;
pub mod sync;
pub mod transfer;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::{errors::LedgerError, ledger::Ledger};

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Note attached to the verbatim copy of a document that failed to load.
/// Copies under this note are exempt from backup retention.
pub const UNREADABLE_NOTE: &str = "unreadable";

/// Abstraction over persistence backends capable of storing ledgers and snapshots.
///
/// Every call that creates a backup takes the instant to stamp it with, so
/// backup names follow the caller's clock.
pub trait StorageBackend: Send + Sync {
    fn save(&self, ledger: &Ledger, name: &str, at: DateTime<Utc>) -> Result<()>;
    fn load(&self, name: &str) -> Result<Ledger>;
    fn exists(&self, name: &str) -> bool;
    /// Backup names for `name`, newest first.
    fn list_backups(&self, name: &str) -> Result<Vec<String>>;
    /// Snapshots `ledger` and returns the new backup's name. Never replaces
    /// an existing backup.
    fn backup(
        &self,
        ledger: &Ledger,
        name: &str,
        note: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<String>;
    fn load_backup(&self, name: &str, backup: &str) -> Result<Ledger>;
    /// Copies the stored document for `name` aside byte for byte under
    /// [`UNREADABLE_NOTE`]. Returns `None` when nothing is stored.
    fn preserve_unreadable(&self, name: &str, at: DateTime<Utc>) -> Result<Option<String>>;
}

impl<T: StorageBackend + ?Sized> StorageBackend for Arc<T> {
    fn save(&self, ledger: &Ledger, name: &str, at: DateTime<Utc>) -> Result<()> {
        (**self).save(ledger, name, at)
    }

    fn load(&self, name: &str) -> Result<Ledger> {
        (**self).load(name)
    }

    fn exists(&self, name: &str) -> bool {
        (**self).exists(name)
    }

    fn list_backups(&self, name: &str) -> Result<Vec<String>> {
        (**self).list_backups(name)
    }

    fn backup(
        &self,
        ledger: &Ledger,
        name: &str,
        note: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<String> {
        (**self).backup(ledger, name, note, at)
    }

    fn load_backup(&self, name: &str, backup: &str) -> Result<Ledger> {
        (**self).load_backup(name, backup)
    }

    fn preserve_unreadable(&self, name: &str, at: DateTime<Utc>) -> Result<Option<String>> {
        (**self).preserve_unreadable(name, at)
    }
}

/// Outcome of [`load_or_recover`].
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub ledger: Ledger,
    /// Set when no stored ledger existed and the first-run dataset was used.
    pub seeded: bool,
    /// Set when the stored document could not be read; holds the reason.
    pub recovered: Option<String>,
}

impl LoadReport {
    /// Whether the loaded snapshot differs from what storage holds.
    pub fn needs_save(&self) -> bool {
        self.seeded || self.recovered.is_some()
    }
}

/// Loads `name`, falling back to the seed dataset when it is missing or
/// unreadable. Never fails.
pub fn load_or_recover(
    backend: &dyn StorageBackend,
    name: &str,
    reference: DateTime<Utc>,
) -> LoadReport {
    if !backend.exists(name) {
        return LoadReport {
            ledger: Ledger::seeded(reference),
            seeded: true,
            recovered: None,
        };
    }
    match backend.load(name) {
        Ok(ledger) => LoadReport {
            ledger,
            seeded: false,
            recovered: None,
        },
        Err(err) => {
            warn!(ledger = name, error = %err, "stored ledger unreadable, using seed data");
            LoadReport {
                ledger: Ledger::seeded(reference),
                seeded: false,
                recovered: Some(err.to_string()),
            }
        }
    }
}

pub use json_backend::JsonStorage;
pub use memory::MemoryStorage;
