//! Backup documents: export to a versioned JSON file and import by
//! overwriting local collections.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::{
    errors::LedgerError,
    ledger::{BudgetLimit, Category, Ledger, LedgerExport, RecurringTransaction, Transaction},
};

use super::Result;

/// Serializes `ledger` as an export document stamped with `now`.
pub fn export_document(ledger: &Ledger, now: DateTime<Utc>) -> Result<String> {
    let export = LedgerExport::new(ledger.clone(), now);
    Ok(serde_json::to_string_pretty(&export)?)
}

/// Applies an export document on top of `current` and returns the result.
///
/// Each collection present as an array replaces the current one verbatim;
/// absent or non-array fields leave the current value in place. The input is
/// fully decoded before anything is replaced, so a failure leaves `current`
/// untouched.
pub fn import_document(current: &Ledger, contents: &str) -> Result<Ledger> {
    let value: Value = serde_json::from_str(contents)
        .map_err(|err| LedgerError::Import(format!("invalid JSON: {err}")))?;
    let Value::Object(fields) = value else {
        return Err(LedgerError::Import("expected a JSON object".into()));
    };

    let mut ledger = current.clone();
    if let Some(transactions) = array_field::<Transaction>(&fields, "transactions")? {
        ledger.transactions = transactions;
    }
    if let Some(recurring) = array_field::<RecurringTransaction>(&fields, "recurring")? {
        ledger.recurring = recurring;
    }
    if let Some(limits) = array_field::<BudgetLimit>(&fields, "limits")? {
        ledger.limits = limits;
    }
    if let Some(budget) = fields.get("overallBudget") {
        ledger.overall_budget = decode(budget.clone(), "overallBudget")?;
    }
    if let Some(categories) = fields.get("categories") {
        ledger.categories = decode::<Option<Vec<Category>>>(categories.clone(), "categories")?;
    }

    if let Some(version) = fields.get("version").and_then(Value::as_u64) {
        if version > u64::from(crate::ledger::EXPORT_VERSION) {
            warn!(version, "importing a document from a newer export version");
        }
    }
    info!(
        transactions = ledger.transactions.len(),
        rules = ledger.recurring.len(),
        limits = ledger.limits.len(),
        "import decoded"
    );
    Ok(ledger)
}

fn array_field<T: DeserializeOwned>(
    fields: &Map<String, Value>,
    key: &str,
) -> Result<Option<Vec<T>>> {
    match fields.get(key) {
        Some(value @ Value::Array(_)) => decode(value.clone(), key).map(Some),
        Some(_) => {
            warn!(field = key, "import field is not an array, keeping current data");
            Ok(None)
        }
        None => Ok(None),
    }
}

fn decode<T: DeserializeOwned>(value: Value, key: &str) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|err| LedgerError::Import(format!("field `{key}`: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Frequency;
    use chrono::TimeZone;

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 8, 0, 0).unwrap()
    }

    #[test]
    fn export_carries_version_and_date() {
        let ledger = Ledger::seeded(reference());
        let json = export_document(&ledger, reference()).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["exportDate"], "2024-06-15T08:00:00Z");
        assert_eq!(value["transactions"].as_array().map(Vec::len), Some(3));
    }

    #[test]
    fn import_replaces_only_present_arrays() {
        let mut current = Ledger::seeded(reference());
        current.set_limit(Category::Food, 200.0);
        let doc = r#"{ "transactions": [], "recurring": "oops" }"#;
        let imported = import_document(&current, doc).unwrap();
        assert!(imported.transactions.is_empty());
        assert_eq!(imported.limits, current.limits);
    }

    #[test]
    fn import_normalizes_unknown_frequency() {
        let doc = r#"{
            "recurring": [{
                "id": "r1", "amount": 9.99, "category": "Entertainment",
                "description": "Streaming", "type": "EXPENSE",
                "frequency": "fortnightly",
                "startDate": "2024-01-05T00:00:00Z",
                "nextDueDate": "2024-02-05T00:00:00Z"
            }]
        }"#;
        let imported = import_document(&Ledger::new(), doc).unwrap();
        assert_eq!(imported.recurring[0].frequency, Frequency::Daily);
    }

    #[test]
    fn malformed_json_is_an_import_error() {
        let current = Ledger::seeded(reference());
        let err = import_document(&current, "{ \"transactions\": [").unwrap_err();
        assert!(matches!(err, LedgerError::Import(_)));
    }

    #[test]
    fn badly_typed_elements_reject_whole_document() {
        let doc = r#"{ "limits": [], "transactions": [{ "amount": "lots" }] }"#;
        let err = import_document(&Ledger::new(), doc).unwrap_err();
        assert!(matches!(err, LedgerError::Import(msg) if msg.contains("transactions")));
    }

    #[test]
    fn overall_budget_and_categories_replace_when_present() {
        let doc = r#"{ "overallBudget": 2500, "categories": ["Food", "Other"] }"#;
        let imported = import_document(&Ledger::new(), doc).unwrap();
        assert_eq!(imported.overall_budget, Some(2500.0));
        assert_eq!(imported.categories, Some(vec![Category::Food, Category::Other]));
    }
}
