use std::io;

use chrono::{DateTime, NaiveDate, Utc};
use dialoguer::{theme::ColorfulTheme, Confirm};
use strsim::levenshtein;
use thiserror::Error;

use crate::{
    config::{Config, ConfigError, ConfigManager},
    core::{
        ledger_manager::{LedgerManager, OpenReport},
        time::SystemClock,
    },
    errors::LedgerError,
    ledger::Ledger,
    storage::json_backend::JsonStorage,
};

use super::commands::{self, CommandDefinition, CommandRegistry};
use super::output;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error("exit requested")]
    ExitRequested,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] LedgerError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Invalid input: {0}")]
    Input(String),
    #[error("Command failed: {0}")]
    Command(String),
    #[error(transparent)]
    Readline(#[from] rustyline::error::ReadlineError),
}

impl From<CommandError> for CliError {
    fn from(err: CommandError) -> Self {
        CliError::Command(err.to_string())
    }
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        CliError::Command(err.to_string())
    }
}

pub type CommandResult = Result<(), CommandError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

/// Everything a command handler can reach.
pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub manager: LedgerManager,
    pub config_manager: ConfigManager,
    pub config: Config,
    pub theme: ColorfulTheme,
    pub last_command: Option<String>,
    pub running: bool,
}

impl ShellContext {
    /// Builds the context against the application data directory and opens
    /// the last used ledger, which brings recurring rules up to date.
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        let config_manager = ConfigManager::new()?;
        let config = match config_manager.load() {
            Ok(config) => config,
            Err(err) => {
                output::warning(format!("Ignoring unreadable configuration: {err}"));
                Config::default()
            }
        };
        output::set_theme(config.theme);

        let storage = JsonStorage::new(Some(config_manager.base_dir().to_path_buf()), None)?;
        let manager = LedgerManager::new(Box::new(storage), Box::new(SystemClock));

        let mut context = Self {
            mode,
            registry: CommandRegistry::new(commands::all_definitions()),
            manager,
            config_manager,
            config,
            theme: ColorfulTheme::default(),
            last_command: None,
            running: true,
        };
        let name = context.config.ledger_name().to_string();
        context.open_ledger(&name)?;
        Ok(context)
    }

    fn open_ledger(&mut self, name: &str) -> Result<(), CliError> {
        let report = self.manager.open(name)?;
        self.report_open(name, &report);
        if self.config.last_opened_ledger.as_deref() != Some(name) {
            self.config.last_opened_ledger = Some(name.to_string());
            self.persist_config()?;
        }
        Ok(())
    }

    fn report_open(&self, name: &str, report: &OpenReport) {
        if let Some(reason) = &report.recovered {
            output::warning(format!(
                "Ledger `{name}` could not be read ({reason}); restored sample data."
            ));
            if let Some(copy) = &report.preserved {
                output::hint(format!("The unreadable file was kept as backup `{copy}`."));
            }
        } else if report.seeded {
            output::info(format!("Created ledger `{name}` with sample data."));
        }
        if report.generated > 0 {
            output::success(format!(
                "Generated {} recurring transaction(s).",
                report.generated
            ));
        }
    }

    pub fn ledger(&self) -> Result<&Ledger, CommandError> {
        Ok(self.manager.ledger()?)
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.manager.clock().now()
    }

    pub fn currency(&self) -> &str {
        &self.config.currency
    }

    pub fn money(&self, amount: f64) -> String {
        output::money(amount, &self.config.currency)
    }

    pub(crate) fn persist_config(&self) -> Result<(), ConfigError> {
        self.config_manager.save(&self.config)
    }

    pub fn prompt(&self) -> String {
        format!(
            "budgetwise({})> ",
            self.manager.current_name().unwrap_or("-")
        )
    }

    /// `(name, usage)` pairs for every registered command.
    pub fn command_usages(&self) -> Vec<(&'static str, &'static str)> {
        self.registry.iter().map(|def| (def.name, def.usage)).collect()
    }

    pub fn command(&self, name: &str) -> Option<&CommandDefinition> {
        self.registry.get(name)
    }

    /// Asks before a destructive action. Script mode answers yes.
    pub fn confirm(&self, prompt: &str) -> Result<bool, CommandError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        Ok(Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(false)
            .interact()?)
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(handler) = self.registry.get(command).map(|def| def.handler) {
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        output::warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));

        let lowered = input.to_lowercase();
        let best = self
            .registry
            .names()
            .map(|key| (levenshtein(key, &lowered), key))
            .min_by_key(|(distance, _)| *distance);

        if let Some((distance, best)) = best {
            if distance <= 3 {
                output::hint(format!("Did you mean `{}`?", best));
            }
        }
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        Ok(self.confirm("Exit shell?")?)
    }

    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested => Ok(()),
            CommandError::InvalidArguments(message) => {
                output::error(&message);
                output::hint("Use `help <command>` for usage details.");
                Ok(())
            }
            CommandError::Ledger(LedgerError::Validation(message)) => {
                output::error(message);
                Ok(())
            }
            other => {
                output::error(other.to_string());
                Ok(())
            }
        }
    }
}

/// Parses a non-negative money amount.
pub(crate) fn parse_amount(raw: &str) -> Result<f64, CommandError> {
    let cleaned = raw.trim().trim_start_matches('$').replace(',', "");
    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        _ => Err(CommandError::InvalidArguments(format!(
            "`{raw}` is not a valid amount"
        ))),
    }
}

/// Parses `YYYY-MM-DD` as midnight UTC.
pub(crate) fn parse_date(raw: &str) -> Result<DateTime<Utc>, CommandError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
        .ok_or_else(|| {
            CommandError::InvalidArguments(format!("`{raw}` is not a date (use YYYY-MM-DD)"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn amounts_accept_currency_decorations() {
        assert_eq!(parse_amount("$1,200.50").unwrap(), 1200.5);
        assert!(parse_amount("-4").is_err());
        assert!(parse_amount("lots").is_err());
    }

    #[test]
    fn dates_are_midnight_utc() {
        assert_eq!(
            parse_date("2024-02-29").unwrap(),
            Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap()
        );
        assert!(parse_date("2023-02-29").is_err());
    }
}
