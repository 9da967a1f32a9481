//! Ledger domain models, persistence-friendly types, and the recurrence engine.

pub mod budget;
#[allow(clippy::module_inception)]
pub mod ledger;
pub mod frequency;
pub mod recurring;
pub mod transaction;

pub use budget::BudgetLimit;
pub use frequency::{days_in_month, days_in_year, Frequency};
pub use ledger::{Ledger, LedgerExport, EXPORT_VERSION};
pub use recurring::{end_of_day, expand, new_rule, Expansion, RecurringTransaction};
pub use transaction::{Category, Transaction, TransactionType};
