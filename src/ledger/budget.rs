use serde::{Deserialize, Serialize};

use super::transaction::Category;

/// A monthly spending cap for one category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BudgetLimit {
    pub category: Category,
    pub limit: f64,
}

impl BudgetLimit {
    pub fn new(category: Category, limit: f64) -> Self {
        Self { category, limit }
    }

    /// Whether `amount` can act as a cap: finite and strictly positive.
    /// Anything else reads as "no limit".
    pub fn enforceable(amount: f64) -> bool {
        amount.is_finite() && amount > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_positive_finite_amounts_cap_spending() {
        assert!(BudgetLimit::enforceable(0.01));
        for amount in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            assert!(!BudgetLimit::enforceable(amount), "{amount}");
        }
    }
}
