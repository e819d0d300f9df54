use std::path::Path;

use super::{column, read_body_records, read_folded_lines, statement_body, FormatError, RawRecord};

/// Folded form of the bank's header cell "#Data księgowania".
const HEADER_MARKER: &str = "#Data ksiegowania";
/// The closing-balance line; unlike ING this is matched anywhere in the
/// line, and the header row itself contains the token ("#Saldo po
/// operacji"), so the search starts below the header.
const FOOTER_MARKER: &str = "#Saldo";

// Fixed column positions in the mBank export body.
const COL_DATE: usize = 0;
const COL_TITLE: usize = 3;
const COL_CONTRACTOR: usize = 4;
const COL_AMOUNT: usize = 6;

/// Account label for this source; mBank exports carry no account column.
const ACCOUNT_NAME: &str = "mbank";

/// Parse an mBank export. Same code page and folding as ING, different
/// markers and column layout; no native transaction id, so the normalizer
/// synthesizes one from the raw row content.
pub fn parse(path: &Path) -> Result<Vec<RawRecord>, FormatError> {
    let lines = read_folded_lines(path)?;
    let body = statement_body(
        lines,
        HEADER_MARKER,
        |line| line.contains(FOOTER_MARKER),
        FOOTER_MARKER,
        path,
    )?;

    let records = read_body_records(&body)?;
    Ok(records
        .iter()
        .map(|record| RawRecord {
            transaction_date: column(record, COL_DATE),
            contractor: column(record, COL_CONTRACTOR),
            title: column(record, COL_TITLE),
            transaction_id: None,
            amount: column(record, COL_AMOUNT),
            account_name: Some(ACCOUNT_NAME.to_string()),
        })
        .collect())
}
