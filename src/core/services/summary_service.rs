use chrono::{DateTime, Datelike, Utc};

use crate::ledger::Transaction;

use super::TransactionService;

const RECENT_LIMIT: usize = 5;

/// Headline figures shown at the top of the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    pub total_balance: f64,
    pub monthly_income: f64,
    pub monthly_expense: f64,
    pub recent: Vec<Transaction>,
}

impl DashboardSummary {
    pub fn monthly_net(&self) -> f64 {
        self.monthly_income - self.monthly_expense
    }
}

pub struct SummaryService;

impl SummaryService {
    pub fn dashboard(transactions: &[Transaction], reference: DateTime<Utc>) -> DashboardSummary {
        let mut summary = DashboardSummary {
            total_balance: 0.0,
            monthly_income: 0.0,
            monthly_expense: 0.0,
            recent: Vec::new(),
        };
        for txn in transactions {
            summary.total_balance += txn.signed_amount();
            let same_month =
                txn.date.year() == reference.year() && txn.date.month() == reference.month();
            if !same_month {
                continue;
            }
            if txn.is_income() {
                summary.monthly_income += txn.amount;
            } else {
                summary.monthly_expense += txn.amount;
            }
        }
        summary.recent = TransactionService::newest_first(transactions)
            .into_iter()
            .take(RECENT_LIMIT)
            .cloned()
            .collect();
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{Category, TransactionType};
    use chrono::TimeZone;

    fn on(m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, m, d, 9, 0, 0).unwrap()
    }

    #[test]
    fn dashboard_splits_balance_and_month_flows() {
        let txns = vec![
            Transaction::new(2500.0, Category::Income, "Salary", on(4, 1), TransactionType::Income),
            Transaction::new(1200.0, Category::Housing, "Rent", on(4, 1), TransactionType::Expense),
            Transaction::new(100.0, Category::Food, "Old", on(3, 20), TransactionType::Expense),
        ];
        let summary = SummaryService::dashboard(&txns, on(4, 15));
        assert_eq!(summary.total_balance, 1200.0);
        assert_eq!(summary.monthly_income, 2500.0);
        assert_eq!(summary.monthly_expense, 1200.0);
        assert_eq!(summary.monthly_net(), 1300.0);
        assert_eq!(summary.recent.len(), 3);
        assert_eq!(summary.recent[2].description, "Old");
    }

    #[test]
    fn recent_is_capped_at_five() {
        let txns: Vec<Transaction> = (1..=8)
            .map(|day| {
                Transaction::new(1.0, Category::Food, format!("d{day}"), on(4, day), TransactionType::Expense)
            })
            .collect();
        let summary = SummaryService::dashboard(&txns, on(4, 30));
        assert_eq!(summary.recent.len(), 5);
        assert_eq!(summary.recent[0].description, "d8");
    }
}
