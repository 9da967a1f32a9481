mod common;

use std::fs;

use budgetwise::{
    core::services::TransactionDraft,
    errors::LedgerError,
    ledger::{Category, Frequency, Ledger},
    storage::{json_backend::JsonStorage, load_or_recover, StorageBackend, UNREADABLE_NOTE},
    utils::persistence::tmp_path,
};
use common::{setup_test_env, temp_root, utc};

#[test]
fn atomic_save_failure_preserves_original_file() {
    let root = temp_root();
    let store = JsonStorage::new(Some(root), Some(2)).unwrap();

    let mut ledger = Ledger::seeded(utc(2025, 1, 10));
    store.save(&ledger, "reliable", utc(2025, 1, 10)).expect("initial save");
    let path = store.ledger_path("reliable");
    let original = fs::read_to_string(&path).expect("read original file");

    // A directory at the staging path makes the write fail before the rename.
    let staging = tmp_path(&path);
    fs::create_dir_all(&staging).unwrap();

    ledger.overall_budget = Some(99.0);
    assert!(store.save(&ledger, "reliable", utc(2025, 1, 11)).is_err());

    let current = fs::read_to_string(&path).expect("read after failure");
    assert_eq!(current, original, "failed save must not corrupt the ledger");
    assert!(!store.list_backups("reliable").unwrap().is_empty());

    let _ = fs::remove_dir_all(&staging);
}

#[test]
fn backups_are_pruned_to_retention() {
    let root = temp_root();
    let store = JsonStorage::new(Some(root), Some(2)).unwrap();
    let ledger = Ledger::new();
    for (day, note) in (10..).zip(["one", "two", "three", "four"]) {
        store.backup(&ledger, "pruned", Some(note), utc(2025, 1, day)).unwrap();
    }
    let kept = store.list_backups("pruned").unwrap();
    assert_eq!(kept.len(), 2);
    assert!(kept.iter().any(|name| name.ends_with("_four.json")));
}

#[test]
fn corrupt_ledger_recovers_and_keeps_a_copy() {
    let (mut manager, _config, root) = setup_test_env(utc(2024, 6, 5));
    let store = JsonStorage::new(Some(root.clone()), Some(3)).unwrap();
    fs::write(store.ledger_path("home"), "{ definitely not json").unwrap();

    let report = manager.open("home").unwrap();
    assert!(report.recovered.is_some());
    assert_eq!(manager.ledger().unwrap().transactions.len(), 3);
    let copy = report.preserved.expect("unreadable copy");
    assert!(copy.contains(UNREADABLE_NOTE));

    // Later saves at the same instant must not replace the copy.
    for amount in [12.0, 13.0, 14.0, 15.0] {
        manager
            .add_transaction(
                TransactionDraft::expense(amount, Category::Food, "Snack", utc(2024, 6, 5)),
                Frequency::None,
            )
            .unwrap();
    }

    let backups = store.list_backups("home").unwrap();
    assert!(backups.contains(&copy));
    let preserved = fs::read_to_string(store.backup_path("home", &copy)).unwrap();
    assert_eq!(preserved, "{ definitely not json");
    let distinct: std::collections::HashSet<_> = backups.iter().collect();
    assert_eq!(distinct.len(), backups.len());
}

#[test]
fn load_or_recover_never_fails() {
    let root = temp_root();
    let store = JsonStorage::new(Some(root), None).unwrap();
    let missing = load_or_recover(&store, "nobody", utc(2024, 2, 1));
    assert!(missing.seeded);
    assert!(missing.recovered.is_none());
}

#[test]
fn open_expands_and_commits_before_returning() {
    let (mut manager, _config, root) = setup_test_env(utc(2024, 1, 1));
    manager.open("home").unwrap();
    manager
        .add_transaction(
            TransactionDraft::expense(50.0, Category::Food, "Groceries", utc(2024, 1, 1)),
            Frequency::Weekly,
        )
        .unwrap();

    let later = JsonStorage::new(Some(root.clone()), Some(3)).unwrap();
    let mut reopened = budgetwise::core::LedgerManager::new(
        Box::new(later),
        Box::new(budgetwise::core::FixedClock::new(utc(2024, 1, 22))),
    );
    assert_eq!(reopened.open("home").unwrap().generated, 3);

    let on_disk = JsonStorage::new(Some(root), Some(3))
        .unwrap()
        .load("home")
        .unwrap();
    assert_eq!(on_disk.recurring[0].next_due_date, utc(2024, 1, 29));
    assert_eq!(on_disk.transactions.len(), reopened.ledger().unwrap().transactions.len());
}

#[test]
fn export_then_import_restores_the_ledger() {
    let (mut manager, _config, root) = setup_test_env(utc(2024, 3, 15));
    manager.open("home").unwrap();
    manager.set_limit(Category::Food, 300.0).unwrap();
    manager.set_overall_budget(Some(2000.0)).unwrap();
    let export_path = root.join("backup.json");
    manager.export(&export_path).unwrap();

    let exported = fs::read_to_string(&export_path).unwrap();
    assert!(exported.contains("\"version\": 1"));
    assert!(exported.contains("\"exportDate\""));

    manager.clear_limit(Category::Food).unwrap();
    manager.set_overall_budget(None).unwrap();
    manager.import(&export_path).unwrap();
    let ledger = manager.ledger().unwrap();
    assert_eq!(ledger.limit_for(Category::Food).map(|l| l.limit), Some(300.0));
    assert_eq!(ledger.overall_budget, Some(2000.0));
}

#[test]
fn malformed_import_changes_nothing() {
    let (mut manager, _config, root) = setup_test_env(utc(2024, 3, 15));
    manager.open("home").unwrap();
    let before = manager.ledger().unwrap().clone();
    let bad = root.join("bad.json");
    fs::write(&bad, "{ \"transactions\": [ {").unwrap();

    let err = manager.import(&bad).unwrap_err();
    assert!(matches!(err, LedgerError::Import(_)));
    assert_eq!(manager.ledger().unwrap(), &before);
    let stored = JsonStorage::new(Some(root), None).unwrap().load("home").unwrap();
    assert_eq!(stored, before);
}

#[test]
fn config_lives_beside_ledgers() {
    let (_manager, config_manager, root) = setup_test_env(utc(2024, 3, 15));
    let mut config = config_manager.load().unwrap();
    config.last_opened_ledger = Some("home".into());
    config_manager.save(&config).unwrap();
    assert!(root.join("config.json").exists());
    assert_eq!(config_manager.load().unwrap().ledger_name(), "home");
}
