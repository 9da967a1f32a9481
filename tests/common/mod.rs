#![allow(dead_code)]

use std::{path::PathBuf, sync::Mutex};

use budgetwise::{
    config::ConfigManager,
    core::{ledger_manager::LedgerManager, time::FixedClock},
    ledger::{Category, Frequency, RecurringTransaction, TransactionType},
    storage::json_backend::JsonStorage,
};
use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Fresh directory that outlives the calling test.
pub fn temp_root() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

/// Creates isolated managers backed by a unique directory, pinned to `now`.
pub fn setup_test_env(now: DateTime<Utc>) -> (LedgerManager, ConfigManager, PathBuf) {
    let base = temp_root();
    let storage = JsonStorage::new(Some(base.clone()), Some(3)).expect("create json storage backend");
    let ledger_manager = LedgerManager::new(Box::new(storage), Box::new(FixedClock::new(now)));
    let config_manager =
        ConfigManager::with_base_dir(base.clone()).expect("create config manager for temp dir");
    (ledger_manager, config_manager, base)
}

pub fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

pub fn rule(
    frequency: Frequency,
    start: DateTime<Utc>,
    next_due: DateTime<Utc>,
) -> RecurringTransaction {
    RecurringTransaction {
        id: format!("rule-{}", frequency.label().to_lowercase()),
        amount: 50.0,
        category: Category::Food,
        description: "Groceries".into(),
        kind: TransactionType::Expense,
        frequency,
        start_date: start,
        next_due_date: next_due,
    }
}
