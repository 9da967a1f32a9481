//! Stateless services over ledger snapshots.

pub mod analytics_service;
pub mod summary_service;
pub mod transaction_service;

pub use analytics_service::{
    AnalyticsService, BudgetLimitStatus, CategoryTotal, MonthlyFlow, Projection, Projections,
};
pub use summary_service::{DashboardSummary, SummaryService};
pub use transaction_service::{RecordedTransaction, TransactionDraft, TransactionService};

use crate::errors::LedgerError;

pub type ServiceResult<T> = Result<T, LedgerError>;
