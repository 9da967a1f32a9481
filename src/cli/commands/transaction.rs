use crate::cli::core::{parse_amount, parse_date, CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::cli::table::{Table, TableColumn};
use crate::core::services::{TransactionDraft, TransactionService};
use crate::ledger::{Category, Frequency, TransactionType};

use super::CommandDefinition;

const DEFAULT_LIST_LIMIT: usize = 20;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "add",
            "Record an income or expense, optionally repeating",
            "add expense <amount> <category> <description> [--date YYYY-MM-DD] [--every daily|weekly|monthly|yearly]\n         add income <amount> <description> [--date YYYY-MM-DD] [--every ...]",
            cmd_add,
        ),
        CommandDefinition::new(
            "list",
            "Show the most recent transactions",
            "list [count]",
            cmd_list,
        ),
        CommandDefinition::new(
            "recurring",
            "Show recurring rules and their next due date",
            "recurring",
            cmd_recurring,
        ),
    ]
}

struct AddArgs<'a> {
    positional: Vec<&'a str>,
    date: Option<&'a str>,
    every: Option<&'a str>,
}

fn split_options<'a>(args: &[&'a str]) -> Result<AddArgs<'a>, CommandError> {
    let mut parsed = AddArgs {
        positional: Vec::new(),
        date: None,
        every: None,
    };
    let mut iter = args.iter().copied();
    while let Some(arg) = iter.next() {
        let slot = match arg {
            "--date" => &mut parsed.date,
            "--every" => &mut parsed.every,
            other => {
                parsed.positional.push(other);
                continue;
            }
        };
        let value = iter
            .next()
            .ok_or_else(|| CommandError::InvalidArguments(format!("`{arg}` needs a value")))?;
        *slot = Some(value);
    }
    Ok(parsed)
}

fn cmd_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = split_options(args)?;
    let usage = || CommandError::InvalidArguments("usage: see `help add`".into());
    let (kind, rest) = parsed.positional.split_first().ok_or_else(usage)?;

    let date = match parsed.date {
        Some(raw) => parse_date(raw)?,
        None => context.now(),
    };
    let frequency = match parsed.every {
        Some(raw) => Frequency::from_label(raw).ok_or_else(|| {
            CommandError::InvalidArguments(format!(
                "unknown frequency `{raw}` (daily, weekly, monthly, yearly)"
            ))
        })?,
        None => Frequency::None,
    };

    let draft = match kind.to_lowercase().as_str() {
        "expense" => {
            let [amount, category, description @ ..] = rest else {
                return Err(usage());
            };
            let category: Category = category
                .parse()
                .map_err(CommandError::InvalidArguments)?;
            TransactionDraft::expense(parse_amount(amount)?, category, description.join(" "), date)
        }
        "income" => {
            let [amount, description @ ..] = rest else {
                return Err(usage());
            };
            TransactionDraft::income(parse_amount(amount)?, description.join(" "), date)
        }
        _ => return Err(usage()),
    };

    let outcome = context.manager.add_transaction(draft, frequency)?;
    output::success(format!("Transaction {} recorded.", outcome.recorded.transaction_id));
    if outcome.recorded.rule_id.is_some() {
        output::info(format!("Repeats {}.", frequency.label().to_lowercase()));
    }
    if outcome.generated > 0 {
        output::success(format!(
            "Generated {} recurring transaction(s).",
            outcome.generated
        ));
    }
    Ok(())
}

fn cmd_list(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let limit = match args.first() {
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| CommandError::InvalidArguments(format!("`{raw}` is not a count")))?,
        None => DEFAULT_LIST_LIMIT,
    };
    let ledger = context.ledger()?;
    if ledger.transactions.is_empty() {
        output::info("No transactions yet.");
        return Ok(());
    }

    let mut table = Table::new(vec![
        TableColumn::left("Date"),
        TableColumn::left("Type"),
        TableColumn::left("Category"),
        TableColumn::right("Amount"),
        TableColumn::left("Description").max_width(32),
    ]);
    for txn in TransactionService::newest_first(&ledger.transactions)
        .into_iter()
        .take(limit)
    {
        let amount = match txn.kind {
            TransactionType::Income => format!("+{}", context.money(txn.amount)),
            TransactionType::Expense => format!("-{}", context.money(txn.amount)),
        };
        table.push(vec![
            txn.date.format("%Y-%m-%d").to_string(),
            txn.kind.to_string(),
            txn.category.to_string(),
            amount,
            txn.description.clone(),
        ]);
    }
    output::section("Transactions");
    output::plain(table.render());
    Ok(())
}

fn cmd_recurring(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let ledger = context.ledger()?;
    if ledger.recurring.is_empty() {
        output::info("No recurring transactions.");
        return Ok(());
    }
    let mut table = Table::new(vec![
        TableColumn::left("Description").max_width(32),
        TableColumn::left("Every"),
        TableColumn::right("Amount"),
        TableColumn::left("Started"),
        TableColumn::left("Next due"),
    ]);
    for rule in &ledger.recurring {
        table.push(vec![
            rule.description.clone(),
            rule.frequency.label().to_string(),
            context.money(rule.amount),
            rule.start_date.format("%Y-%m-%d").to_string(),
            rule.next_due_date.format("%Y-%m-%d").to_string(),
        ]);
    }
    output::section("Recurring");
    output::plain(table.render());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_are_pulled_out_of_positionals() {
        let parsed = split_options(&["expense", "12", "Food", "--every", "weekly", "Lunch", "out"])
            .unwrap();
        assert_eq!(parsed.positional, vec!["expense", "12", "Food", "Lunch", "out"]);
        assert_eq!(parsed.every, Some("weekly"));
        assert!(parsed.date.is_none());
    }

    #[test]
    fn dangling_option_is_rejected() {
        assert!(split_options(&["income", "5", "Gift", "--date"]).is_err());
    }
}
