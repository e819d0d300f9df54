use chrono::{Duration, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::str::FromStr;

use grosz_core::{hash, SourceType, Transaction};

use crate::adapters::RawRecord;

/// Minutes added to every parsed transaction date. Keeps transactions off
/// the exact midnight boundary so later sorting and date-range filters
/// with inclusive day ends never split a day's rows ambiguously.
pub const DATE_OFFSET_MINUTES: i64 = 1;

/// Currency-unit token stripped from raw amounts before numeric parsing.
const CURRENCY_TOKEN: &str = "PLN";

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y", "%d-%m-%Y"];

/// Parse a raw date string against the known locale formats.
pub fn parse_transaction_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Parse a raw amount string: strip the currency token and whitespace
/// thousands separators (including NBSP), accept a comma decimal
/// separator. Returns `None` for anything non-numeric; callers treat
/// such rows as non-transactions.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .replace(CURRENCY_TOKEN, "")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let cleaned = cleaned.replace(',', ".");
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}

/// Convert one adapter's raw rows into canonical transactions.
///
/// Rows whose amount or date fails to parse are dropped silently; real
/// exports end with commentary rows that are not transactions. Sources
/// without a native id get a deterministic content-hash id, so reruns
/// over the same file produce identical ids.
pub fn normalize(
    records: Vec<RawRecord>,
    source_file_path: &str,
    source_type: SourceType,
) -> Vec<Transaction> {
    let mut transactions = Vec::with_capacity(records.len());
    let mut dropped = 0usize;

    for record in records {
        let Some(amount) = parse_amount(&record.amount) else {
            dropped += 1;
            continue;
        };
        let Some(date) = parse_transaction_date(&record.transaction_date) else {
            dropped += 1;
            continue;
        };
        let date = date + Duration::minutes(DATE_OFFSET_MINUTES);

        let transaction_id = match record.transaction_id {
            Some(ref id) => id.clone(),
            None => hash::sha256_hex(&record.concat_values()),
        };

        transactions.push(Transaction::new(
            transaction_id,
            date,
            record.contractor,
            record.title,
            amount,
            record.account_name.unwrap_or_default(),
            source_file_path.to_string(),
            source_type,
        ));
    }

    if dropped > 0 {
        tracing::debug!("{dropped} non-transaction rows dropped from {source_file_path}");
    }

    transactions
}
