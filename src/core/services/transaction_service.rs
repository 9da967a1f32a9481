//! Business logic helpers for entering transactions and their recurring rules.

use chrono::{DateTime, Utc};

use crate::core::services::ServiceResult;
use crate::errors::LedgerError;
use crate::ledger::{
    new_rule, Category, Frequency, Ledger, Transaction, TransactionType,
};

/// User input for a new transaction, before an id is assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionDraft {
    pub amount: f64,
    pub category: Category,
    pub description: String,
    pub date: DateTime<Utc>,
    pub kind: TransactionType,
}

impl TransactionDraft {
    pub fn expense(
        amount: f64,
        category: Category,
        description: impl Into<String>,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            amount,
            category,
            description: description.into(),
            date,
            kind: TransactionType::Expense,
        }
    }

    pub fn income(amount: f64, description: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            amount,
            category: Category::Income,
            description: description.into(),
            date,
            kind: TransactionType::Income,
        }
    }
}

/// Identifiers created by [`TransactionService::record`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedTransaction {
    pub transaction_id: String,
    pub rule_id: Option<String>,
}

/// Provides validated helpers for ledger transactions.
pub struct TransactionService;

impl TransactionService {
    /// Rejects drafts the ledger must never contain.
    pub fn validate(draft: &TransactionDraft) -> ServiceResult<()> {
        if !draft.amount.is_finite() || draft.amount < 0.0 {
            return Err(LedgerError::Validation(format!(
                "amount must be a non-negative number, got {}",
                draft.amount
            )));
        }
        if draft.description.trim().is_empty() {
            return Err(LedgerError::Validation("description is required".into()));
        }
        Ok(())
    }

    /// Appends the drafted transaction and, when `frequency` repeats, the rule
    /// that continues it.
    ///
    /// Income is always filed under [`Category::Income`].
    pub fn record(
        ledger: &mut Ledger,
        draft: TransactionDraft,
        frequency: Frequency,
    ) -> ServiceResult<RecordedTransaction> {
        Self::validate(&draft)?;
        let category = match draft.kind {
            TransactionType::Income => Category::Income,
            TransactionType::Expense => draft.category,
        };
        let transaction = Transaction::new(
            draft.amount,
            category,
            draft.description.trim(),
            draft.date,
            draft.kind,
        );
        let rule = new_rule(&transaction, frequency);
        let transaction_id = ledger.add_transaction(transaction);
        let rule_id = rule.map(|rule| ledger.add_rule(rule));
        Ok(RecordedTransaction {
            transaction_id,
            rule_id,
        })
    }

    /// Transactions ordered newest first.
    pub fn newest_first(transactions: &[Transaction]) -> Vec<&Transaction> {
        let mut sorted: Vec<&Transaction> = transactions.iter().collect();
        sorted.sort_by(|a, b| b.date.cmp(&a.date));
        sorted
    }
}
