use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single income or expense entry in the ledger.
///
/// Transactions are append-only: once created their id never changes and the
/// engine never edits an existing entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: String,
    pub amount: f64,
    pub category: Category,
    pub description: String,
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: TransactionType,
}

impl Transaction {
    pub fn new(
        amount: f64,
        category: Category,
        description: impl Into<String>,
        date: DateTime<Utc>,
        kind: TransactionType,
    ) -> Self {
        Self {
            id: new_id(),
            amount,
            category,
            description: description.into(),
            date,
            kind,
        }
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionType::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionType::Expense
    }

    /// Amount with its sign applied: income adds to the balance, expenses subtract.
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            TransactionType::Income => self.amount,
            TransactionType::Expense => -self.amount,
        }
    }
}

/// Mints a fresh opaque identifier.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TransactionType {
    #[serde(rename = "INCOME")]
    Income,
    #[serde(rename = "EXPENSE")]
    Expense,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransactionType::Income => "Income",
            TransactionType::Expense => "Expense",
        };
        f.write_str(label)
    }
}

/// Fixed spending/earning buckets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Food,
    Transport,
    Housing,
    Utilities,
    Entertainment,
    Shopping,
    Health,
    Income,
    Other,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Food,
        Category::Transport,
        Category::Housing,
        Category::Utilities,
        Category::Entertainment,
        Category::Shopping,
        Category::Health,
        Category::Income,
        Category::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Transport => "Transport",
            Category::Housing => "Housing",
            Category::Utilities => "Utilities",
            Category::Entertainment => "Entertainment",
            Category::Shopping => "Shopping",
            Category::Health => "Health",
            Category::Income => "Income",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let needle = value.trim();
        Category::ALL
            .into_iter()
            .find(|category| category.label().eq_ignore_ascii_case(needle))
            .ok_or_else(|| format!("unknown category `{}`", value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn serializes_with_camel_case_field_names() {
        let date = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut txn = Transaction::new(50.0, Category::Food, "Lunch", date, TransactionType::Expense);
        txn.id = "abc".into();
        let json = serde_json::to_value(&txn).unwrap();
        assert_eq!(json["type"], "EXPENSE");
        assert_eq!(json["category"], "Food");
        assert_eq!(json["id"], "abc");
    }

    #[test]
    fn accepts_millisecond_iso_dates() {
        let raw = r#"{"id":"1","amount":2500,"category":"Income","description":"Salary",
            "date":"2024-03-01T00:00:00.000Z","type":"INCOME"}"#;
        let txn: Transaction = serde_json::from_str(raw).unwrap();
        assert!(txn.is_income());
        assert_eq!(txn.date, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!("food".parse::<Category>(), Ok(Category::Food));
        assert_eq!(" Health ".parse::<Category>(), Ok(Category::Health));
        assert!("groceries".parse::<Category>().is_err());
    }

    #[test]
    fn signed_amount_follows_type() {
        let date = Utc::now();
        let income = Transaction::new(10.0, Category::Income, "x", date, TransactionType::Income);
        let expense = Transaction::new(4.0, Category::Food, "y", date, TransactionType::Expense);
        assert_eq!(income.signed_amount() + expense.signed_amount(), 6.0);
    }
}
