mod common;

use assert_cmd::Command;
use chrono::{Duration, Utc};
use predicates::prelude::*;
use predicates::str::contains;
use std::path::Path;

const SCRIPT_ENV: &str = "BUDGETWISE_CLI_SCRIPT";

fn cli(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("budgetwise_cli").unwrap();
    cmd.env(SCRIPT_ENV, "1")
        .env("BUDGETWISE_HOME", home)
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn first_run_seeds_and_summarizes() {
    let home = common::temp_root();
    cli(&home)
        .write_stdin("summary\nexit\n")
        .assert()
        .success()
        .stdout(contains("Created ledger `default` with sample data."))
        .stdout(contains("Balance"));
    assert!(home.join("ledgers").join("default.json").exists());
    assert!(home.join("config.json").exists());
}

#[test]
fn script_mode_records_and_lists() {
    let home = common::temp_root();
    cli(&home)
        .write_stdin("add expense 12.50 Food \"Lunch downtown\"\nlist 5\nexit\n")
        .assert()
        .success()
        .stdout(contains("recorded"))
        .stdout(contains("Lunch downtown"));

    let json = std::fs::read_to_string(home.join("ledgers").join("default.json")).unwrap();
    assert!(json.contains("\"Lunch downtown\""));
    assert!(json.contains("\"EXPENSE\""));
}

#[test]
fn backdated_daily_rule_catches_up() {
    let home = common::temp_root();
    let start = (Utc::now() - Duration::days(3)).format("%Y-%m-%d");
    cli(&home)
        .write_stdin(format!(
            "add expense 5 Transport Bus --date {start} --every daily\nrecurring\nexit\n"
        ))
        .assert()
        .success()
        .stdout(contains("Generated 3 recurring transaction(s)."))
        .stdout(contains("Daily"));

    // Reopening the same day finds nothing new to generate.
    cli(&home)
        .write_stdin("exit\n")
        .assert()
        .success()
        .stdout(contains("Generated").not());
}

#[test]
fn unknown_command_gets_a_suggestion() {
    let home = common::temp_root();
    cli(&home)
        .write_stdin("sumary\n")
        .assert()
        .success()
        .stdout(contains("Unknown command `sumary`"))
        .stdout(contains("Did you mean `summary`?"));
}

#[test]
fn invalid_amount_is_reported_and_shell_continues() {
    let home = common::temp_root();
    cli(&home)
        .write_stdin("add expense lots Food Snacks\nbudget 500\nbudget\n")
        .assert()
        .success()
        .stdout(contains("`lots` is not a valid amount"))
        .stdout(contains("Overall budget set to $500.00."));
}

#[test]
fn export_and_import_round_trip() {
    let home = common::temp_root();
    let file = home.join("export.json");
    cli(&home)
        .write_stdin(format!(
            "limit set Food 250\nexport {}\nlimit clear Food\nimport {}\nlimit\n",
            file.display(),
            file.display()
        ))
        .assert()
        .success()
        .stdout(contains("Ledger exported"))
        .stdout(contains("Ledger imported"))
        .stdout(contains("Food:"));

    let exported = std::fs::read_to_string(&file).unwrap();
    assert!(exported.contains("\"exportDate\""));
    assert!(exported.contains("\"limits\""));
}

#[test]
fn theme_choice_is_saved() {
    let home = common::temp_root();
    cli(&home)
        .write_stdin("theme dark\n")
        .assert()
        .success()
        .stdout(contains("Theme set to dark."));
    let config = std::fs::read_to_string(home.join("config.json")).unwrap();
    assert!(config.contains("\"dark\""));
}

#[cfg(unix)]
#[test]
fn advise_pipes_prompt_to_configured_command() {
    let home = common::temp_root();
    std::fs::write(
        home.join("config.json"),
        r#"{ "advisor_command": "cat" }"#,
    )
    .unwrap();
    cli(&home)
        .write_stdin("advise\n")
        .assert()
        .success()
        .stdout(contains("Act as a financial advisor"))
        .stdout(contains("Grocery Run"));
}

#[test]
fn advise_without_command_explains_setup() {
    let home = common::temp_root();
    cli(&home)
        .write_stdin("advise\n")
        .assert()
        .success()
        .stdout(contains("No advisor configured."));
}
