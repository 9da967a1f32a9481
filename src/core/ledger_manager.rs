use std::{fs, path::Path};

use tracing::{info, warn};

use crate::core::services::{RecordedTransaction, TransactionDraft, TransactionService};
use crate::core::time::Clock;
use crate::errors::LedgerError;
use crate::ledger::{expand, Category, Frequency, Ledger};
use crate::storage::{load_or_recover, sync, transfer, StorageBackend};
use crate::utils::persistence::write_atomic;

/// Outcome of opening a ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenReport {
    /// Occurrences materialized by the recurrence engine while opening.
    pub generated: usize,
    /// True when no stored ledger existed and the first-run data was written.
    pub seeded: bool,
    /// Reason the stored document was discarded, when it was unreadable.
    pub recovered: Option<String>,
    /// Backup holding the unreadable document as it was found.
    pub preserved: Option<String>,
}

/// Result of [`LedgerManager::add_transaction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOutcome {
    pub recorded: RecordedTransaction,
    /// Past-due occurrences of the new rule materialized immediately.
    pub generated: usize,
}

/// Facade that owns the current ledger snapshot and is the only caller of
/// the recurrence engine.
///
/// Every mutation follows the same sequence: change the snapshot, expand
/// overdue rules, persist the whole document in one write. The snapshot is
/// replaced only after the write succeeds, so a failed save never leaves
/// advanced rule cursors in memory that storage does not hold.
pub struct LedgerManager {
    storage: Box<dyn StorageBackend>,
    clock: Box<dyn Clock>,
    current: Option<Ledger>,
    current_name: Option<String>,
}

impl LedgerManager {
    pub fn new(storage: Box<dyn StorageBackend>, clock: Box<dyn Clock>) -> Self {
        Self {
            storage,
            clock,
            current: None,
            current_name: None,
        }
    }

    pub fn storage(&self) -> &dyn StorageBackend {
        self.storage.as_ref()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current_name.as_deref()
    }

    /// Borrows the open ledger.
    pub fn ledger(&self) -> Result<&Ledger, LedgerError> {
        self.current
            .as_ref()
            .ok_or_else(|| LedgerError::Storage("no ledger loaded".into()))
    }

    /// Loads `name`, materializes overdue occurrences and persists the
    /// result when anything changed.
    pub fn open(&mut self, name: &str) -> Result<OpenReport, LedgerError> {
        let now = self.clock.now();
        let loaded = load_or_recover(self.storage.as_ref(), name, now);
        let must_save = loaded.needs_save();
        let preserved = match loaded.recovered {
            Some(_) => self.storage.preserve_unreadable(name, now)?,
            None => None,
        };
        if let Some(copy) = &preserved {
            warn!(ledger = name, backup = %copy, "unreadable ledger kept as a backup");
        }
        let expansion = expand(
            &loaded.ledger.transactions,
            &loaded.ledger.recurring,
            self.clock.local_now(),
        );

        let mut ledger = loaded.ledger;
        if expansion.changed || must_save {
            ledger.transactions = expansion.transactions;
            ledger.recurring = expansion.rules;
            self.persist(&mut ledger, name)?;
        }
        info!(
            ledger = name,
            generated = expansion.generated,
            seeded = loaded.seeded,
            recovered = loaded.recovered.is_some(),
            "ledger opened"
        );
        self.current = Some(ledger);
        self.current_name = Some(name.to_string());
        Ok(OpenReport {
            generated: expansion.generated,
            seeded: loaded.seeded,
            recovered: loaded.recovered,
            preserved,
        })
    }

    /// Records a user-entered transaction and, for a repeating frequency, the
    /// rule that continues it.
    pub fn add_transaction(
        &mut self,
        draft: TransactionDraft,
        frequency: Frequency,
    ) -> Result<AddOutcome, LedgerError> {
        let mut ledger = self.ledger()?.clone();
        let recorded = TransactionService::record(&mut ledger, draft, frequency)?;
        let generated = if recorded.rule_id.is_some() {
            self.expand_into(&mut ledger)
        } else {
            0
        };
        self.commit(ledger)?;
        info!(
            id = %recorded.transaction_id,
            rule = recorded.rule_id.as_deref().unwrap_or("-"),
            generated,
            "transaction recorded"
        );
        Ok(AddOutcome {
            recorded,
            generated,
        })
    }

    pub fn set_limit(&mut self, category: Category, amount: f64) -> Result<(), LedgerError> {
        if !amount.is_finite() {
            return Err(LedgerError::Validation(format!(
                "limit must be a finite number, got {amount}"
            )));
        }
        let mut ledger = self.ledger()?.clone();
        ledger.set_limit(category, amount);
        self.commit(ledger)
    }

    /// Removes the limit for `category`; returns whether one existed.
    pub fn clear_limit(&mut self, category: Category) -> Result<bool, LedgerError> {
        let mut ledger = self.ledger()?.clone();
        let removed = ledger.clear_limit(category);
        if removed {
            self.commit(ledger)?;
        }
        Ok(removed)
    }

    pub fn set_overall_budget(&mut self, budget: Option<f64>) -> Result<(), LedgerError> {
        if let Some(amount) = budget {
            if !amount.is_finite() {
                return Err(LedgerError::Validation(format!(
                    "budget must be a finite number, got {amount}"
                )));
            }
        }
        let mut ledger = self.ledger()?.clone();
        ledger.overall_budget = budget;
        self.commit(ledger)
    }

    /// Writes the open ledger as an export document at `path`.
    pub fn export(&self, path: &Path) -> Result<(), LedgerError> {
        let document = transfer::export_document(self.ledger()?, self.clock.now())?;
        write_atomic(path, &document)?;
        info!(path = %path.display(), "ledger exported");
        Ok(())
    }

    /// Overwrites the open ledger with the document at `path`.
    ///
    /// The current state is backed up first. Imported rules are expanded
    /// right away, as they would be on the next open. Returns the number of
    /// occurrences generated.
    pub fn import(&mut self, path: &Path) -> Result<usize, LedgerError> {
        let contents = fs::read_to_string(path)?;
        let current = self.ledger()?;
        let mut ledger = transfer::import_document(current, &contents)?;
        let name = self.require_name()?.to_string();
        self.storage
            .backup(current, &name, Some("before import"), self.clock.now())?;
        let generated = self.expand_into(&mut ledger);
        self.commit(ledger)?;
        info!(path = %path.display(), generated, "ledger imported");
        Ok(generated)
    }

    /// Reconciles the open ledger with a snapshot from another device.
    /// Returns true when the remote snapshot replaced the local one.
    pub fn sync_with(&mut self, remote: Ledger) -> Result<bool, LedgerError> {
        let local = self.ledger()?.clone();
        let local_stamp = local.updated_at;
        let mut winner = sync::last_write_wins(local, remote);
        if winner.updated_at == local_stamp {
            return Ok(false);
        }
        self.expand_into(&mut winner);
        self.commit(winner)?;
        Ok(true)
    }

    /// Snapshots the open ledger; returns the backup's name.
    pub fn backup(&self, note: Option<&str>) -> Result<String, LedgerError> {
        self.storage
            .backup(self.ledger()?, self.require_name()?, note, self.clock.now())
    }

    pub fn list_backups(&self) -> Result<Vec<String>, LedgerError> {
        self.storage.list_backups(self.require_name()?)
    }

    fn require_name(&self) -> Result<&str, LedgerError> {
        self.current_name
            .as_deref()
            .ok_or_else(|| LedgerError::Storage("no ledger loaded".into()))
    }

    fn expand_into(&self, ledger: &mut Ledger) -> usize {
        let expansion = expand(&ledger.transactions, &ledger.recurring, self.clock.local_now());
        if expansion.changed {
            ledger.transactions = expansion.transactions;
            ledger.recurring = expansion.rules;
        }
        expansion.generated
    }

    fn commit(&mut self, mut ledger: Ledger) -> Result<(), LedgerError> {
        let name = self.require_name()?.to_string();
        self.persist(&mut ledger, &name)?;
        self.current = Some(ledger);
        Ok(())
    }

    fn persist(&self, ledger: &mut Ledger, name: &str) -> Result<(), LedgerError> {
        let now = self.clock.now();
        ledger.touch(now);
        self.storage.save(ledger, name, now)
    }
}
