use std::path::Path;

use super::{column, read_body_records, read_folded_lines, statement_body, FormatError, RawRecord};

/// First header cell of the transaction table; everything above it is
/// account metadata.
const HEADER_MARKER: &str = "\"Data transakcji\"";
/// Legal disclaimer line closing the transaction table.
const FOOTER_MARKER: &str = "\"Dokument ma charakter informacyjny";

// Fixed column positions in the ING export body.
const COL_DATE: usize = 0;
const COL_CONTRACTOR: usize = 2;
const COL_TITLE: usize = 3;
const COL_TRANSACTION_ID: usize = 7;
const COL_AMOUNT: usize = 8;
const COL_ACCOUNT_NAME: usize = 14;

/// Parse an ING export: Windows-1250 bytes, ASCII-folded, transaction
/// rows between the header and footer marker lines, `;`-separated with
/// fixed column positions. Dates and amounts stay raw strings.
pub fn parse(path: &Path) -> Result<Vec<RawRecord>, FormatError> {
    let lines = read_folded_lines(path)?;
    let body = statement_body(
        lines,
        HEADER_MARKER,
        |line| line.starts_with(FOOTER_MARKER),
        FOOTER_MARKER,
        path,
    )?;

    let records = read_body_records(&body)?;
    Ok(records
        .iter()
        .map(|record| {
            let native_id = column(record, COL_TRANSACTION_ID);
            RawRecord {
                transaction_date: column(record, COL_DATE),
                contractor: column(record, COL_CONTRACTOR),
                title: column(record, COL_TITLE),
                transaction_id: (!native_id.is_empty()).then_some(native_id),
                amount: column(record, COL_AMOUNT),
                account_name: Some(column(record, COL_ACCOUNT_NAME)),
            }
        })
        .collect())
}
