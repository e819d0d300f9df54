pub mod generic;
pub mod ing;
pub mod mbank;

use std::path::Path;
use thiserror::Error;

use grosz_core::SourceType;

use crate::encoding;

/// One row as produced by a format adapter. Values stay in their raw
/// string form; the normalizer owns every conversion. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct RawRecord {
    pub transaction_date: String,
    pub contractor: String,
    pub title: String,
    /// Native transaction id, when the source format supplies one.
    pub transaction_id: Option<String>,
    pub amount: String,
    /// Account name, when the source carries one (mbank uses a fixed
    /// literal set by its adapter).
    pub account_name: Option<String>,
}

impl RawRecord {
    /// The row's raw data fields concatenated in a fixed order. This is
    /// the input to transaction-id synthesis for sources without a native
    /// id, so the order must never change.
    pub fn concat_values(&self) -> String {
        format!(
            "{}{}{}{}",
            self.transaction_date, self.contractor, self.title, self.amount
        )
    }
}

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Header marker '{marker}' not found in {file}")]
    HeaderMarkerNotFound { marker: &'static str, file: String },
    #[error("Footer marker '{marker}' not found in {file}")]
    FooterMarkerNotFound { marker: &'static str, file: String },
    #[error("Missing fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),
}

/// Parse one export file with the adapter for its source type.
///
/// The adapters form a closed strategy set selected by the source-type
/// tag; adding a bank means adding a variant and a module, nothing
/// dynamic.
pub fn parse_raw(source_type: SourceType, path: &Path) -> Result<Vec<RawRecord>, FormatError> {
    match source_type {
        SourceType::Ing => ing::parse(path),
        SourceType::Mbank => mbank::parse(path),
        SourceType::Generic => generic::parse(path),
    }
}

/// Read a code-page export and return its lines folded to ASCII. Marker
/// scanning and the CSV body both operate on the folded text.
pub(crate) fn read_folded_lines(path: &Path) -> Result<Vec<String>, std::io::Error> {
    let bytes = std::fs::read(path)?;
    let text = encoding::fold_to_ascii(&encoding::decode_cp1250(&bytes));
    Ok(text.lines().map(str::to_string).collect())
}

/// Keep only the lines strictly between the header marker line and the
/// footer marker line. The footer is searched only below the header, since
/// some banks repeat the footer token inside the header row.
pub(crate) fn statement_body(
    lines: Vec<String>,
    header_marker: &'static str,
    is_footer: impl Fn(&str) -> bool,
    footer_marker: &'static str,
    path: &Path,
) -> Result<Vec<String>, FormatError> {
    let header_idx = lines
        .iter()
        .position(|line| line.starts_with(header_marker))
        .ok_or_else(|| FormatError::HeaderMarkerNotFound {
            marker: header_marker,
            file: path.display().to_string(),
        })?;

    let body = &lines[header_idx + 1..];
    let footer_idx =
        body.iter()
            .position(|line| is_footer(line))
            .ok_or_else(|| FormatError::FooterMarkerNotFound {
                marker: footer_marker,
                file: path.display().to_string(),
            })?;

    Ok(body[..footer_idx].to_vec())
}

/// Parse a headerless `;`-separated statement body. Row widths vary
/// between banks and between sections, so the reader is flexible; a
/// column index past the row's end reads as empty.
pub(crate) fn read_body_records(body: &[String]) -> Result<Vec<csv::StringRecord>, FormatError> {
    let joined = body.join("\n");
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_reader(joined.as_bytes());

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        records.push(record);
    }
    Ok(records)
}

pub(crate) fn column(record: &csv::StringRecord, index: usize) -> String {
    record.get(index).unwrap_or("").to_string()
}
