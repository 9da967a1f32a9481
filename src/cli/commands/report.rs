use crate::cli::core::{parse_amount, CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::cli::table::{Table, TableColumn};
use crate::core::services::{AnalyticsService, BudgetLimitStatus, SummaryService};
use crate::ledger::Category;

use super::CommandDefinition;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "summary",
            "Balance, this month's totals and recent activity",
            "summary",
            cmd_summary,
        ),
        CommandDefinition::new(
            "analytics",
            "Category breakdown, six-month trend and projections",
            "analytics",
            cmd_analytics,
        ),
        CommandDefinition::new(
            "limit",
            "Show, set or clear monthly category limits",
            "limit [set <category> <amount> | clear <category>]",
            cmd_limit,
        ),
        CommandDefinition::new(
            "budget",
            "Show, set or clear the overall monthly budget",
            "budget [<amount> | clear]",
            cmd_budget,
        ),
    ]
}

fn cmd_summary(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let now = context.now();
    let ledger = context.ledger()?;
    let summary = SummaryService::dashboard(&ledger.transactions, now);

    output::section("Summary");
    output::plain(format!("  Balance        {}", context.money(summary.total_balance)));
    output::plain(format!("  Income (month) {}", context.money(summary.monthly_income)));
    output::plain(format!("  Spent (month)  {}", context.money(summary.monthly_expense)));
    output::plain(format!("  Net (month)    {}", context.money(summary.monthly_net())));

    if let Some(status) =
        AnalyticsService::overall_status(&ledger.transactions, ledger.overall_budget, now)
    {
        print_status_line("Overall budget", &status, context);
    }

    if !summary.recent.is_empty() {
        output::section("Recent");
        for txn in &summary.recent {
            let sign = if txn.is_income() { "+" } else { "-" };
            output::plain(format!(
                "  {}  {}{:<12}  {}",
                txn.date.format("%Y-%m-%d"),
                sign,
                context.money(txn.amount),
                txn.description
            ));
        }
    }
    Ok(())
}

fn cmd_analytics(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let now = context.now();
    let ledger = context.ledger()?;
    let txns = &ledger.transactions;

    output::section(format!("Spending by category ({})", now.format("%B %Y")));
    let totals = AnalyticsService::category_totals(txns, now);
    if totals.is_empty() {
        output::info("No expenses this month.");
    } else {
        let mut table = Table::new(vec![TableColumn::left("Category"), TableColumn::right("Spent")]);
        for row in &totals {
            table.push(vec![row.category.to_string(), context.money(row.total)]);
        }
        output::plain(table.render());
    }

    output::section("Last six months");
    let mut trend = Table::new(vec![
        TableColumn::left("Month"),
        TableColumn::right("Income"),
        TableColumn::right("Expense"),
    ]);
    for flow in AnalyticsService::monthly_series(txns, now) {
        trend.push(vec![
            format!("{} {}", flow.label, flow.year),
            context.money(flow.income),
            context.money(flow.expense),
        ]);
    }
    output::plain(trend.render());

    let projections = AnalyticsService::projections(txns, now);
    output::section("Projections");
    output::plain(format!(
        "  Month: {} so far, {} projected ({:.0}%)",
        context.money(projections.month.current),
        context.money(projections.month.projected),
        projections.month.progress_percent()
    ));
    output::plain(format!(
        "  Year:  {} so far, {} projected ({:.0}%)",
        context.money(projections.year.current),
        context.money(projections.year.projected),
        projections.year.progress_percent()
    ));
    Ok(())
}

fn cmd_limit(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args {
        [] => show_limits(context),
        [action, category, amount] if action.eq_ignore_ascii_case("set") => {
            let category = parse_category(category)?;
            let amount = parse_amount(amount)?;
            context.manager.set_limit(category, amount)?;
            output::success(format!(
                "Limit for {category} set to {}.",
                context.money(amount)
            ));
            Ok(())
        }
        [action, category] if action.eq_ignore_ascii_case("clear") => {
            let category = parse_category(category)?;
            if context.manager.clear_limit(category)? {
                output::success(format!("Limit for {category} removed."));
            } else {
                output::warning(format!("No limit set for {category}."));
            }
            Ok(())
        }
        _ => Err(CommandError::InvalidArguments(
            "usage: limit [set <category> <amount> | clear <category>]".into(),
        )),
    }
}

fn show_limits(context: &ShellContext) -> CommandResult {
    let now = context.now();
    let ledger = context.ledger()?;
    if ledger.limits.is_empty() {
        output::info("No limits set. Use `limit set <category> <amount>`.");
        return Ok(());
    }
    let rows = AnalyticsService::limit_status(&ledger.transactions, &ledger.limits, now);
    output::section("Limits");
    for status in &rows {
        let label = status
            .category
            .map(|category| category.to_string())
            .unwrap_or_default();
        print_status_line(&label, status, context);
    }
    Ok(())
}

fn cmd_budget(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args {
        [] => {
            let now = context.now();
            let ledger = context.ledger()?;
            match AnalyticsService::overall_status(&ledger.transactions, ledger.overall_budget, now)
            {
                Some(status) => print_status_line("Overall budget", &status, context),
                None => output::info("No overall budget set. Use `budget <amount>`."),
            }
            Ok(())
        }
        [value] if value.eq_ignore_ascii_case("clear") => {
            context.manager.set_overall_budget(None)?;
            output::success("Overall budget cleared.");
            Ok(())
        }
        [value] => {
            let amount = parse_amount(value)?;
            context.manager.set_overall_budget(Some(amount))?;
            output::success(format!("Overall budget set to {}.", context.money(amount)));
            Ok(())
        }
        _ => Err(CommandError::InvalidArguments(
            "usage: budget [<amount> | clear]".into(),
        )),
    }
}

fn parse_category(raw: &str) -> Result<Category, CommandError> {
    raw.parse().map_err(CommandError::InvalidArguments)
}

fn print_status_line(label: &str, status: &BudgetLimitStatus, context: &ShellContext) {
    let line = match status.percentage {
        Some(percent) => format!(
            "{label}: {} of {} ({percent:.0}%)",
            context.money(status.spent),
            context.money(status.limit)
        ),
        None => format!("{label}: {} spent (no limit)", context.money(status.spent)),
    };
    if status.is_over_limit {
        output::warning(format!("{line} over limit"));
    } else {
        output::info(line);
    }
}
