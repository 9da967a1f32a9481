use std::io::{self, BufRead};

use rustyline::{
    completion::{Completer, Pair},
    error::ReadlineError,
    highlight::Highlighter,
    hint::Hinter,
    history::DefaultHistory,
    validate::Validator,
    Cmd, Context as ReadlineContext, Editor, Helper, KeyEvent,
};

use crate::cli::core::{CliError, CliMode, CommandError, LoopControl, ShellContext};
use crate::cli::output;
use crate::ledger::{Category, Frequency};

/// When set, commands are read line by line from stdin without a prompt.
pub const SCRIPT_ENV: &str = "BUDGETWISE_CLI_SCRIPT";

pub fn run_cli() -> Result<(), CliError> {
    let mode = if std::env::var_os(SCRIPT_ENV).is_some() {
        CliMode::Script
    } else {
        CliMode::Interactive
    };

    let mut context = ShellContext::new(mode)?;
    match mode {
        CliMode::Interactive => run_interactive(&mut context),
        CliMode::Script => run_script(&mut context),
    }
}

fn run_interactive(context: &mut ShellContext) -> Result<(), CliError> {
    let mut editor = Editor::<LedgerHelper, DefaultHistory>::new()?;
    editor.set_helper(Some(LedgerHelper::new(context.command_usages())));
    editor.bind_sequence(KeyEvent::from('?'), Cmd::Complete);

    while context.running {
        match editor.readline(&context.prompt()) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                editor.add_history_entry(line).ok();
                if run_line(context, line)? == LoopControl::Exit {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                if context.confirm_exit()? {
                    break;
                }
            }
            Err(ReadlineError::Eof) => {
                output::info("Exiting shell.");
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

/// Script lines starting with `#` are comments.
fn run_script(context: &mut ShellContext) -> Result<(), CliError> {
    for line in io::stdin().lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if run_line(context, line)? == LoopControl::Exit || !context.running {
            break;
        }
    }
    Ok(())
}

fn run_line(context: &mut ShellContext, line: &str) -> Result<LoopControl, CliError> {
    match handle_line(context, line) {
        Ok(control) => Ok(control),
        Err(err) => {
            context.report_error(err)?;
            Ok(LoopControl::Continue)
        }
    }
}

fn handle_line(context: &mut ShellContext, line: &str) -> Result<LoopControl, CommandError> {
    let tokens = match shell_words::split(line) {
        Ok(tokens) => tokens,
        Err(err) => {
            output::warning(format!("Could not parse command: {err}"));
            return Ok(LoopControl::Continue);
        }
    };
    let Some((raw, rest)) = tokens.split_first() else {
        return Ok(LoopControl::Continue);
    };
    let args: Vec<&str> = rest.iter().map(String::as_str).collect();

    context.last_command = Some(line.to_string());
    let control = context.dispatch(&raw.to_lowercase(), raw, &args)?;
    if control == LoopControl::Exit {
        context.running = false;
    }
    Ok(control)
}

/// Line editor support: completes command names, transaction kinds,
/// categories, frequencies and theme names, and hints a command's usage
/// once its name has been typed.
struct LedgerHelper {
    commands: Vec<(&'static str, &'static str)>,
}

impl LedgerHelper {
    fn new(mut commands: Vec<(&'static str, &'static str)>) -> Self {
        commands.sort_by_key(|(name, _)| *name);
        commands.dedup_by_key(|(name, _)| *name);
        Self { commands }
    }

    fn usage(&self, name: &str) -> Option<&'static str> {
        self.commands
            .iter()
            .find(|(command, _)| command.eq_ignore_ascii_case(name))
            .map(|(_, usage)| *usage)
    }

    /// Candidates for the word after `words`, where `words[0]` is the command.
    fn candidates(&self, words: &[&str]) -> Vec<String> {
        let Some((command, args)) = words.split_first() else {
            return self.commands.iter().map(|(name, _)| name.to_string()).collect();
        };
        let previous = args.last().copied().unwrap_or_default();
        match (command.to_ascii_lowercase().as_str(), args) {
            ("help", []) => self.commands.iter().map(|(name, _)| name.to_string()).collect(),
            ("add", []) => words_of(&["expense", "income"]),
            ("add", _) if previous == "--every" => Frequency::RECURRING
                .iter()
                .map(|frequency| frequency.label().to_ascii_lowercase())
                .collect(),
            ("add", _) if previous == "--date" => Vec::new(),
            ("add", [kind, _amount]) if kind.eq_ignore_ascii_case("expense") => category_labels(),
            ("add", [_, _, ..]) => words_of(&["--date", "--every"]),
            ("limit", []) => words_of(&["set", "clear"]),
            ("limit", [_]) => category_labels(),
            ("budget", []) => words_of(&["clear"]),
            ("theme", []) => words_of(&["light", "dark", "toggle"]),
            _ => Vec::new(),
        }
    }
}

fn words_of(words: &[&str]) -> Vec<String> {
    words.iter().map(|word| word.to_string()).collect()
}

fn category_labels() -> Vec<String> {
    Category::ALL
        .iter()
        .map(|category| category.label().to_string())
        .collect()
}

impl Helper for LedgerHelper {}

impl Completer for LedgerHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &ReadlineContext<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let prefix = &line[..pos];
        let start = prefix
            .rfind(char::is_whitespace)
            .map(|idx| idx + 1)
            .unwrap_or(0);
        let typed: Vec<&str> = prefix[..start].split_whitespace().collect();
        let needle = prefix[start..].to_ascii_lowercase();

        let matches = self
            .candidates(&typed)
            .into_iter()
            .filter(|candidate| candidate.to_ascii_lowercase().starts_with(&needle))
            .map(|candidate| Pair {
                display: candidate.clone(),
                replacement: candidate,
            })
            .collect();
        Ok((start, matches))
    }
}

impl Hinter for LedgerHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &ReadlineContext<'_>) -> Option<String> {
        if pos < line.len() {
            return None;
        }
        let name = line.trim_start().strip_suffix(' ')?;
        if name.contains(char::is_whitespace) {
            return None;
        }
        let usage = self.usage(name)?.lines().next()?;
        let rest = usage.get(name.len()..)?.trim_start();
        (!rest.is_empty()).then(|| rest.to_string())
    }
}

impl Highlighter for LedgerHelper {}

impl Validator for LedgerHelper {}
