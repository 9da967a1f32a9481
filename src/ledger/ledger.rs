use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::budget::BudgetLimit;
use super::recurring::RecurringTransaction;
use super::transaction::{Category, Transaction, TransactionType};

/// Version stamped on exported backups.
pub const EXPORT_VERSION: u32 = 1;

/// The persisted budgeting document: every transaction, recurring rule and
/// limit the user owns.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ledger {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub recurring: Vec<RecurringTransaction>,
    #[serde(default)]
    pub limits: Vec<BudgetLimit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_budget: Option<f64>,
    /// Category display order chosen by the user, when customised.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<Category>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// First-run dataset placed in the month of `reference`.
    pub fn seeded(reference: DateTime<Utc>) -> Self {
        let on_day = |day: u32| {
            NaiveDate::from_ymd_opt(reference.year(), reference.month(), day)
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
                .unwrap_or(reference)
        };
        let seed = |id: &str, amount: f64, category, description: &str, day, kind| Transaction {
            id: id.to_string(),
            amount,
            category,
            description: description.to_string(),
            date: on_day(day),
            kind,
        };
        Self {
            transactions: vec![
                seed("1", 2500.0, Category::Income, "Monthly Salary", 1, TransactionType::Income),
                seed("2", 65.0, Category::Food, "Grocery Run", 3, TransactionType::Expense),
                seed("3", 1200.0, Category::Housing, "Rent", 1, TransactionType::Expense),
            ],
            ..Self::default()
        }
    }

    pub fn add_transaction(&mut self, transaction: Transaction) -> String {
        let id = transaction.id.clone();
        self.transactions.push(transaction);
        id
    }

    pub fn add_rule(&mut self, rule: RecurringTransaction) -> String {
        let id = rule.id.clone();
        self.recurring.push(rule);
        id
    }

    pub fn transaction(&self, id: &str) -> Option<&Transaction> {
        self.transactions.iter().find(|txn| txn.id == id)
    }

    pub fn limit_for(&self, category: Category) -> Option<&BudgetLimit> {
        self.limits.iter().find(|limit| limit.category == category)
    }

    /// Inserts or replaces the limit for `category`.
    pub fn set_limit(&mut self, category: Category, amount: f64) {
        match self.limits.iter_mut().find(|limit| limit.category == category) {
            Some(existing) => existing.limit = amount,
            None => self.limits.push(BudgetLimit::new(category, amount)),
        }
    }

    /// Removes the limit for `category`, returning whether one existed.
    pub fn clear_limit(&mut self, category: Category) -> bool {
        let before = self.limits.len();
        self.limits.retain(|limit| limit.category != category);
        before != self.limits.len()
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(now);
    }
}

/// Backup document produced by export and accepted by import.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerExport {
    pub version: u32,
    pub export_date: DateTime<Utc>,
    #[serde(flatten)]
    pub ledger: Ledger,
}

impl LedgerExport {
    pub fn new(ledger: Ledger, export_date: DateTime<Utc>) -> Self {
        Self {
            version: EXPORT_VERSION,
            export_date,
            ledger,
        }
    }
}
