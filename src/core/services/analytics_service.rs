//! Budget aggregation: category breakdowns, monthly flows, projections and
//! limit tracking. Every reducer is recomputed from the full transaction list.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::ledger::{days_in_month, days_in_year, BudgetLimit, Category, Transaction};

const TRAILING_MONTHS: i32 = 6;

/// Expense total for one category in the reference month.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub category: Category,
    pub total: f64,
}

/// Income and expense for one calendar month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyFlow {
    pub year: i32,
    pub month: u32,
    pub label: String,
    pub income: f64,
    pub expense: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub current: f64,
    pub projected: f64,
}

impl Projection {
    /// Share of the projection already spent, between 0 and 100.
    pub fn progress_percent(&self) -> f64 {
        if self.projected > 0.0 {
            (self.current / self.projected * 100.0).min(100.0)
        } else {
            0.0
        }
    }
}

/// Linear month-end and year-end expense projections.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projections {
    pub month: Projection,
    pub year: Projection,
}

/// Spending against a limit in the reference month.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetLimitStatus {
    pub category: Option<Category>,
    pub limit: f64,
    pub spent: f64,
    /// `None` when the limit is zero, negative or not finite ("no limit").
    pub percentage: Option<f64>,
    pub is_over_limit: bool,
}

impl BudgetLimitStatus {
    fn measure(category: Option<Category>, limit: f64, spent: f64) -> Self {
        let enforceable = BudgetLimit::enforceable(limit);
        let percentage = enforceable.then(|| spent / limit * 100.0);
        Self {
            category,
            limit,
            spent,
            percentage,
            is_over_limit: enforceable && spent > limit,
        }
    }

    pub fn remaining(&self) -> f64 {
        (self.limit - self.spent).max(0.0)
    }
}

/// Stateless budgeting reducers that operate over transaction snapshots.
pub struct AnalyticsService;

impl AnalyticsService {
    /// Expenses of the reference month grouped by category, largest first.
    pub fn category_totals(
        transactions: &[Transaction],
        reference: DateTime<Utc>,
    ) -> Vec<CategoryTotal> {
        let mut sums: BTreeMap<Category, f64> = BTreeMap::new();
        for txn in month_expenses(transactions, reference) {
            *sums.entry(txn.category).or_default() += txn.amount;
        }
        let mut totals: Vec<CategoryTotal> = sums
            .into_iter()
            .map(|(category, total)| CategoryTotal { category, total })
            .collect();
        totals.sort_by(|a, b| b.total.total_cmp(&a.total));
        totals
    }

    /// Income and expense for the six months ending with the reference month,
    /// oldest first.
    pub fn monthly_series(
        transactions: &[Transaction],
        reference: DateTime<Utc>,
    ) -> Vec<MonthlyFlow> {
        let anchor = month_index(reference.year(), reference.month());
        let mut series: Vec<MonthlyFlow> = (0..TRAILING_MONTHS)
            .rev()
            .map(|back| {
                let index = anchor - back;
                let year = index.div_euclid(12);
                let month = index.rem_euclid(12) as u32 + 1;
                let label = NaiveDate::from_ymd_opt(year, month, 1)
                    .map(|first| first.format("%b").to_string())
                    .unwrap_or_default();
                MonthlyFlow {
                    year,
                    month,
                    label,
                    income: 0.0,
                    expense: 0.0,
                }
            })
            .collect();

        for txn in transactions {
            let offset = anchor - month_index(txn.date.year(), txn.date.month());
            if !(0..TRAILING_MONTHS).contains(&offset) {
                continue;
            }
            let slot = &mut series[(TRAILING_MONTHS - 1 - offset) as usize];
            if txn.is_income() {
                slot.income += txn.amount;
            } else {
                slot.expense += txn.amount;
            }
        }
        series
    }

    /// Month-to-date and year-to-date expenses extrapolated linearly to the
    /// end of the month and year.
    pub fn projections(transactions: &[Transaction], reference: DateTime<Utc>) -> Projections {
        let year = reference.year();
        let month = reference.month();
        let mut month_spent = 0.0;
        let mut year_spent = 0.0;
        for txn in transactions.iter().filter(|txn| txn.is_expense()) {
            if txn.date.year() != year {
                continue;
            }
            year_spent += txn.amount;
            if txn.date.month() == month {
                month_spent += txn.amount;
            }
        }

        let month_elapsed = f64::from(reference.day().max(1));
        let year_elapsed = f64::from(reference.ordinal().max(1));
        Projections {
            month: Projection {
                current: month_spent,
                projected: month_spent / month_elapsed * f64::from(days_in_month(year, month)),
            },
            year: Projection {
                current: year_spent,
                projected: year_spent / year_elapsed * f64::from(days_in_year(year)),
            },
        }
    }

    /// Reference-month spending against each category limit, highest
    /// percentage first; limits without a percentage sort last.
    pub fn limit_status(
        transactions: &[Transaction],
        limits: &[BudgetLimit],
        reference: DateTime<Utc>,
    ) -> Vec<BudgetLimitStatus> {
        let mut spent: BTreeMap<Category, f64> = BTreeMap::new();
        for txn in month_expenses(transactions, reference) {
            *spent.entry(txn.category).or_default() += txn.amount;
        }
        let mut rows: Vec<BudgetLimitStatus> = limits
            .iter()
            .map(|limit| {
                let amount = spent.get(&limit.category).copied().unwrap_or(0.0);
                BudgetLimitStatus::measure(Some(limit.category), limit.limit, amount)
            })
            .collect();
        rows.sort_by(|a, b| {
            let left = a.percentage.unwrap_or(f64::NEG_INFINITY);
            let right = b.percentage.unwrap_or(f64::NEG_INFINITY);
            right.total_cmp(&left)
        });
        rows
    }

    /// Reference-month spending across all categories against the ledger-wide budget.
    pub fn overall_status(
        transactions: &[Transaction],
        overall_budget: Option<f64>,
        reference: DateTime<Utc>,
    ) -> Option<BudgetLimitStatus> {
        let budget = overall_budget?;
        let spent = month_expenses(transactions, reference)
            .map(|txn| txn.amount)
            .sum();
        Some(BudgetLimitStatus::measure(None, budget, spent))
    }
}

fn month_index(year: i32, month: u32) -> i32 {
    year * 12 + month as i32 - 1
}

fn in_month(txn: &Transaction, reference: DateTime<Utc>) -> bool {
    txn.date.year() == reference.year() && txn.date.month() == reference.month()
}

fn month_expenses(
    transactions: &[Transaction],
    reference: DateTime<Utc>,
) -> impl Iterator<Item = &Transaction> {
    transactions
        .iter()
        .filter(move |txn| txn.is_expense() && in_month(txn, reference))
}
