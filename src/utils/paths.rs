use dirs::home_dir;
use std::{env, path::PathBuf};

const DEFAULT_DIR_NAME: &str = ".budgetwise";
const LEDGER_DIR: &str = "ledgers";
const BACKUP_DIR: &str = "backups";
const CONFIG_FILE: &str = "config.json";

/// Environment variable that relocates all application data.
pub const HOME_ENV: &str = "BUDGETWISE_HOME";

/// Returns the application-specific data directory, defaulting to `~/.budgetwise`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV) {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

/// Directory holding ledger documents under `root`.
pub fn ledgers_dir_in(root: &std::path::Path) -> PathBuf {
    root.join(LEDGER_DIR)
}

/// Base directory for backup snapshots under `root`.
pub fn backups_dir_in(root: &std::path::Path) -> PathBuf {
    root.join(BACKUP_DIR)
}

/// Path to the configuration document under `root`.
pub fn config_file_in(root: &std::path::Path) -> PathBuf {
    root.join(CONFIG_FILE)
}
