//! Recurring transaction rules and the expansion engine that materializes
//! their missed occurrences.
//!
//! The engine is a pure function over a snapshot: it never reads the clock
//! and never touches storage. It also never looks at existing transactions
//! for duplicates, so callers must persist the advanced rules together with
//! the generated transactions before expanding again.

use chrono::{DateTime, Datelike, Duration, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::frequency::Frequency;
use super::transaction::{new_id, Category, Transaction, TransactionType};

/// A repeating transaction template with a schedule cursor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecurringTransaction {
    pub id: String,
    pub amount: f64,
    pub category: Category,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(default)]
    pub frequency: Frequency,
    pub start_date: DateTime<Utc>,
    /// Next occurrence not yet materialized.
    pub next_due_date: DateTime<Utc>,
}

impl RecurringTransaction {
    /// Builds the rule for a freshly entered transaction.
    ///
    /// The first due date is one step after the transaction's own date, so
    /// the entered transaction is never generated a second time.
    pub fn from_transaction(txn: &Transaction, frequency: Frequency) -> Option<Self> {
        let next_due_date = frequency.advance(txn.date)?;
        Some(Self {
            id: new_id(),
            amount: txn.amount,
            category: txn.category,
            description: txn.description.clone(),
            kind: txn.kind,
            frequency,
            start_date: txn.date,
            next_due_date,
        })
    }

    /// Concrete transaction for the occurrence at `date`, with a fresh id.
    pub fn occurrence(&self, date: DateTime<Utc>) -> Transaction {
        Transaction {
            id: new_id(),
            amount: self.amount,
            category: self.category,
            description: self.description.clone(),
            date,
            kind: self.kind,
        }
    }

    /// Next cursor after `from`.
    ///
    /// Month and year steps aim at the larger of the start day and the
    /// cursor day: a cursor only sits below the start day after being
    /// clamped, and this brings it back.
    pub fn step(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let preferred_day = self.start_date.day().max(from.day());
        self.frequency.advance_anchored(from, preferred_day)
    }

    /// Whether the rule has an occurrence on or before the end of
    /// `reference`'s day, as seen in `reference`'s own time zone.
    pub fn is_due<Tz: TimeZone>(&self, reference: DateTime<Tz>) -> bool {
        self.frequency.is_recurring() && self.next_due_date <= end_of_day(reference)
    }
}

/// Shorthand for [`RecurringTransaction::from_transaction`].
pub fn new_rule(txn: &Transaction, frequency: Frequency) -> Option<RecurringTransaction> {
    RecurringTransaction::from_transaction(txn, frequency)
}

/// Output of [`expand`].
#[derive(Debug, Clone)]
pub struct Expansion {
    /// Input transactions followed by the generated ones.
    pub transactions: Vec<Transaction>,
    /// Input rules, in the same order, with advanced cursors.
    pub rules: Vec<RecurringTransaction>,
    /// Number of transactions appended.
    pub generated: usize,
    pub changed: bool,
}

/// Last millisecond of `reference`'s calendar day in its own time zone,
/// expressed in UTC. Pass a UTC reference for a UTC day.
pub fn end_of_day<Tz: TimeZone>(reference: DateTime<Tz>) -> DateTime<Utc> {
    let Some(last) = reference.date_naive().and_hms_milli_opt(23, 59, 59, 999) else {
        return reference.with_timezone(&Utc);
    };
    match reference.timezone().from_local_datetime(&last).latest() {
        Some(local) => local.with_timezone(&Utc),
        // 23:59:59.999 skipped by a transition: keep the reference's offset.
        None => {
            let offset = i64::from(reference.offset().fix().local_minus_utc());
            Utc.from_utc_datetime(&(last - Duration::seconds(offset)))
        }
    }
}

/// Materializes every occurrence due on or before the end of `reference`'s
/// day and advances each rule's cursor past it.
///
/// The day is the one on the user's calendar: callers pass the current
/// instant in the user's time zone.
///
/// Generated transactions are appended after the existing ones, grouped by
/// rule in input order and chronological within a rule. Rules with
/// [`Frequency::None`] are returned untouched.
pub fn expand<Tz: TimeZone>(
    transactions: &[Transaction],
    rules: &[RecurringTransaction],
    reference: DateTime<Tz>,
) -> Expansion {
    let cutoff = end_of_day(reference);
    let mut generated = Vec::new();
    let mut advanced = Vec::with_capacity(rules.len());

    for rule in rules {
        let (rule, emitted) = expand_rule(rule, cutoff);
        generated.extend(emitted);
        advanced.push(rule);
    }

    let count = generated.len();
    let mut merged = Vec::with_capacity(transactions.len() + count);
    merged.extend_from_slice(transactions);
    merged.extend(generated);

    Expansion {
        transactions: merged,
        rules: advanced,
        generated: count,
        changed: count > 0,
    }
}

fn expand_rule(
    rule: &RecurringTransaction,
    cutoff: DateTime<Utc>,
) -> (RecurringTransaction, Vec<Transaction>) {
    if !rule.frequency.is_recurring() {
        if rule.next_due_date <= cutoff {
            tracing::warn!(rule = %rule.id, "skipping recurring rule without a frequency");
        }
        return (rule.clone(), Vec::new());
    }

    let mut cursor = rule.next_due_date;
    let mut emitted = Vec::new();
    while cursor <= cutoff {
        emitted.push(rule.occurrence(cursor));
        match rule.step(cursor) {
            Some(next) if next > cursor => cursor = next,
            _ => {
                tracing::warn!(rule = %rule.id, %cursor, "recurrence step out of calendar range");
                break;
            }
        }
    }

    if !emitted.is_empty() {
        tracing::debug!(
            rule = %rule.id,
            frequency = %rule.frequency,
            generated = emitted.len(),
            next_due = %cursor,
            "expanded recurring rule"
        );
    }

    let mut advanced = rule.clone();
    advanced.next_due_date = cursor;
    (advanced, emitted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn rule(frequency: Frequency, start: DateTime<Utc>, next: DateTime<Utc>) -> RecurringTransaction {
        RecurringTransaction {
            id: "rule".into(),
            amount: 50.0,
            category: Category::Food,
            description: "Groceries".into(),
            kind: TransactionType::Expense,
            frequency,
            start_date: start,
            next_due_date: next,
        }
    }

    #[test]
    fn end_of_day_is_last_millisecond() {
        let eod = end_of_day(Utc.with_ymd_and_hms(2024, 5, 5, 8, 0, 0).unwrap());
        assert_eq!(eod.to_rfc3339(), "2024-05-05T23:59:59.999+00:00");
    }

    #[test]
    fn end_of_day_follows_the_reference_zone() {
        let sydney = FixedOffset::east_opt(10 * 3600).unwrap();
        let morning = sydney.with_ymd_and_hms(2024, 5, 5, 8, 0, 0).unwrap();
        assert_eq!(end_of_day(morning).to_rfc3339(), "2024-05-05T13:59:59.999+00:00");
    }

    #[test]
    fn east_of_utc_books_today_before_utc_midnight() {
        // 11:00 on May 5 in UTC+10, while it is still May 4 in UTC.
        let due = Utc.with_ymd_and_hms(2024, 5, 5, 1, 0, 0).unwrap();
        let rules = vec![rule(Frequency::Daily, due, due)];
        let sydney = FixedOffset::east_opt(10 * 3600).unwrap();
        let now = sydney.with_ymd_and_hms(2024, 5, 5, 8, 0, 0).unwrap();

        let out = expand(&[], &rules, now);
        assert_eq!(out.generated, 1);
        assert_eq!(out.transactions[0].date, due);
        assert!(!expand(&[], &rules, now.with_timezone(&Utc)).changed);
    }

    #[test]
    fn west_of_utc_waits_for_tomorrow() {
        // 04:00 on May 6 in UTC-5; at 21:00 on May 5 local it is not due yet.
        let due = Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0).unwrap();
        let rules = vec![rule(Frequency::Daily, due, due)];
        let new_york = FixedOffset::west_opt(5 * 3600).unwrap();
        let evening = new_york.with_ymd_and_hms(2024, 5, 5, 21, 0, 0).unwrap();

        assert!(!rules[0].is_due(evening));
        assert!(!expand(&[], &rules, evening).changed);
        assert!(rules[0].is_due(evening.with_timezone(&Utc)));
    }

    #[test]
    fn rule_due_later_today_is_materialized() {
        let due = Utc.with_ymd_and_hms(2024, 5, 5, 18, 0, 0).unwrap();
        let rules = vec![rule(Frequency::Daily, due, due)];
        let out = expand(&[], &rules, Utc.with_ymd_and_hms(2024, 5, 5, 7, 0, 0).unwrap());
        assert_eq!(out.generated, 1);
        assert_eq!(out.transactions[0].date, due);
        assert_eq!(out.rules[0].next_due_date, Utc.with_ymd_and_hms(2024, 5, 6, 18, 0, 0).unwrap());
    }

    #[test]
    fn none_frequency_rule_is_left_alone() {
        let rules = vec![rule(Frequency::None, utc(2024, 1, 1), utc(2024, 1, 1))];
        let out = expand(&[], &rules, utc(2024, 6, 1));
        assert!(!out.changed);
        assert_eq!(out.rules, rules);
    }

    #[test]
    fn input_slices_are_not_mutated() {
        let rules = vec![rule(Frequency::Weekly, utc(2024, 1, 1), utc(2024, 1, 1))];
        let snapshot = rules.clone();
        let _ = expand(&[], &rules, utc(2024, 2, 1));
        assert_eq!(rules, snapshot);
    }

    #[test]
    fn new_rule_starts_one_step_after_the_entry() {
        let txn = Transaction::new(
            1200.0,
            Category::Housing,
            "Rent",
            utc(2024, 1, 31),
            TransactionType::Expense,
        );
        let created = new_rule(&txn, Frequency::Monthly).expect("monthly rule");
        assert_eq!(created.start_date, utc(2024, 1, 31));
        assert_eq!(created.next_due_date, utc(2024, 2, 29));
        assert!(new_rule(&txn, Frequency::None).is_none());
    }

    #[test]
    fn missing_frequency_reads_as_daily() {
        let raw = r#"{"id":"r","amount":5,"category":"Other","description":"x","type":"EXPENSE",
            "startDate":"2024-01-01T00:00:00.000Z","nextDueDate":"2024-01-02T00:00:00.000Z"}"#;
        let parsed: RecurringTransaction = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.frequency, Frequency::Daily);
    }
}
