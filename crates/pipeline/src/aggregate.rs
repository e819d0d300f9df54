use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap, HashSet};

use grosz_core::{Transaction, TransactionField};

/// Label applied to groups outside the top-N selection.
pub const OTHER_GROUP: &str = "other";

/// Time bucket for display aggregation, backed by the ISO strings
/// computed once at normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Day,
    Month,
    Year,
}

impl Bucket {
    fn key(self, tx: &Transaction) -> &str {
        match self {
            Bucket::Day => &tx.date_iso_day,
            Bucket::Month => &tx.date_iso_month,
            Bucket::Year => &tx.date_iso_year,
        }
    }
}

/// Transactions within `[start, end]`, both ends inclusive.
pub fn filter_date_range(
    transactions: &[Transaction],
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|tx| tx.transaction_date >= start && tx.transaction_date <= end)
        .cloned()
        .collect()
}

/// The `n_biggest` group values by total `amount_abs`. Ties break on the
/// group name so the selection is stable across runs.
pub fn significant_group_values(
    transactions: &[Transaction],
    group_by: TransactionField,
    n_biggest: usize,
) -> HashSet<String> {
    let mut sums: HashMap<String, Decimal> = HashMap::new();
    for tx in transactions {
        *sums.entry(tx.field_str(group_by)).or_insert(Decimal::ZERO) += tx.amount_abs;
    }

    let mut ranked: Vec<(String, Decimal)> = sums.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
        .into_iter()
        .take(n_biggest)
        .map(|(group, _)| group)
        .collect()
}

/// A transaction's display group: its own value when significant, the
/// shared "other" bucket otherwise.
pub fn group_label(
    tx: &Transaction,
    group_by: TransactionField,
    significant: &HashSet<String>,
) -> String {
    let value = tx.field_str(group_by);
    if significant.contains(&value) {
        value
    } else {
        OTHER_GROUP.to_string()
    }
}

/// Sum `amount_abs` per (time bucket, display group). Ordered map so
/// consumers iterate buckets chronologically without resorting.
pub fn sum_by_bucket(
    transactions: &[Transaction],
    group_by: TransactionField,
    bucket: Bucket,
    significant: &HashSet<String>,
) -> BTreeMap<(String, String), Decimal> {
    let mut sums = BTreeMap::new();
    for tx in transactions {
        let key = (
            bucket.key(tx).to_string(),
            group_label(tx, group_by, significant),
        );
        *sums.entry(key).or_insert(Decimal::ZERO) += tx.amount_abs;
    }
    sums
}
