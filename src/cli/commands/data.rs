use std::path::Path;

use crate::advisor::{request_analysis, CommandAdvisor};
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::output;

use super::CommandDefinition;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "export",
            "Write the ledger to a JSON backup file",
            "export <path>",
            cmd_export,
        ),
        CommandDefinition::new(
            "import",
            "Replace the ledger with a JSON backup file",
            "import <path>",
            cmd_import,
        ),
        CommandDefinition::new(
            "advise",
            "Ask the configured advisor to comment on your spending",
            "advise",
            cmd_advise,
        ),
    ]
}

fn single_path<'a>(args: &[&'a str], usage: &str) -> Result<&'a Path, CommandError> {
    match args {
        [path] => Ok(Path::new(*path)),
        _ => Err(CommandError::InvalidArguments(format!("usage: {usage}"))),
    }
}

fn cmd_export(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let path = single_path(args, "export <path>")?;
    context.manager.export(path)?;
    output::success(format!("Ledger exported to {}.", path.display()));
    Ok(())
}

fn cmd_import(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let path = single_path(args, "import <path>")?;
    if !context.confirm("Importing replaces your current data. Continue?")? {
        output::info("Import cancelled.");
        return Ok(());
    }
    let generated = context.manager.import(path)?;
    output::success(format!("Ledger imported from {}.", path.display()));
    if generated > 0 {
        output::success(format!("Generated {generated} recurring transaction(s)."));
    }
    Ok(())
}

fn cmd_advise(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let Some(command_line) = context.config.advisor_command.as_deref() else {
        output::warning("No advisor configured.");
        output::hint(format!(
            "Set `advisor_command` in {} to a program that reads a prompt on stdin.",
            context.config_manager.path().display()
        ));
        return Ok(());
    };
    let advisor = CommandAdvisor::from_command_line(command_line)
        .map_err(|err| CommandError::Message(err.to_string()))?;
    let ledger = context.ledger()?;
    output::info("Asking the advisor...");
    let analysis = request_analysis(&advisor, &ledger.transactions);
    output::section("Advisor");
    output::plain(analysis);
    Ok(())
}
