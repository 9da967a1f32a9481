use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::config::Theme;

use super::CommandDefinition;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "help",
            "Show available commands",
            "help [command]",
            cmd_help,
        ),
        CommandDefinition::new(
            "theme",
            "Show, set or toggle the color theme",
            "theme [light|dark|toggle]",
            cmd_theme,
        ),
        CommandDefinition::new("exit", "Exit the shell", "exit", cmd_exit),
    ]
}

fn cmd_help(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if let Some(name) = args.first().map(|name| name.to_lowercase()) {
        match context.command(&name) {
            Some(command) => {
                output::section(format!("Help: {}", command.name));
                output::info(format!("Description: {}", command.description));
                output::info(format!("Usage: {}", command.usage));
            }
            None => context.suggest_command(args[0]),
        }
        return Ok(());
    }

    output::section("Available commands");
    for command in context.registry.iter() {
        output::plain(format!("  {:<10} {}", command.name, command.description));
    }
    output::plain("Use `help <command>` for details.");
    Ok(())
}

fn cmd_theme(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let theme = match args.first() {
        None => {
            output::info(format!("Theme: {}", context.config.theme));
            return Ok(());
        }
        Some(value) if value.eq_ignore_ascii_case("toggle") => context.config.theme.toggled(),
        Some(value) => value.parse::<Theme>()?,
    };
    context.config.theme = theme;
    context.persist_config()?;
    output::set_theme(theme);
    output::success(format!("Theme set to {theme}."));
    Ok(())
}

fn cmd_exit(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    Err(CommandError::ExitRequested)
}
