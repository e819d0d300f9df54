use std::path::Path;

use super::{FormatError, RawRecord};

/// Canonical columns a generic file must declare in its header row.
/// Provenance (`source_file_path`) and the derived columns are stamped by
/// the normalizer, never read from the file.
const MANDATORY_FIELDS: [&str; 6] = [
    "transaction_date",
    "contractor",
    "title",
    "transaction_id",
    "amount",
    "account_name",
];

/// Parse a generic export: plain comma-separated UTF-8 with canonical
/// column names in the header. No byte-level transformation is needed;
/// any missing mandatory column fails the whole file, reported by name.
pub fn parse(path: &Path) -> Result<Vec<RawRecord>, FormatError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b',')
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let index_of =
        |name: &str| headers.iter().position(|header| header == name);

    let mut missing: Vec<String> = MANDATORY_FIELDS
        .iter()
        .filter(|name| index_of(name).is_none())
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        missing.sort();
        return Err(FormatError::MissingFields(missing));
    }

    // Presence was just checked; the lookups below cannot fail.
    let col_date = index_of("transaction_date").unwrap();
    let col_contractor = index_of("contractor").unwrap();
    let col_title = index_of("title").unwrap();
    let col_id = index_of("transaction_id").unwrap();
    let col_amount = index_of("amount").unwrap();
    let col_account = index_of("account_name").unwrap();

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        let get = |i: usize| record.get(i).unwrap_or("").to_string();
        records.push(RawRecord {
            transaction_date: get(col_date),
            contractor: get(col_contractor),
            title: get(col_title),
            transaction_id: Some(get(col_id)).filter(|id| !id.is_empty()),
            amount: get(col_amount),
            account_name: Some(get(col_account)),
        });
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_sample(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn parses_canonical_header_file() {
        let file = write_sample(
            "transaction_id,transaction_date,contractor,title,amount,account_name\n\
             tx-001,2024-01-15,ZABKA K.15,Zakup,-12.50,savings\n\
             tx-002,2024-01-16,EMPLOYER,Salary,1234.00,savings\n",
        );
        let records = parse(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].transaction_id.as_deref(), Some("tx-001"));
        assert_eq!(records[0].amount, "-12.50");
        assert_eq!(records[1].account_name.as_deref(), Some("savings"));
    }

    #[test]
    fn column_order_does_not_matter() {
        let file = write_sample(
            "amount,title,account_name,transaction_date,transaction_id,contractor\n\
             5.00,Coffee,main,2024-02-01,tx-9,CAFE\n",
        );
        let records = parse(file.path()).unwrap();
        assert_eq!(records[0].contractor, "CAFE");
        assert_eq!(records[0].amount, "5.00");
    }

    #[test]
    fn missing_mandatory_fields_reported_by_name() {
        let file = write_sample("transaction_date,title,amount\nx,y,z\n");
        match parse(file.path()) {
            Err(FormatError::MissingFields(missing)) => {
                assert_eq!(missing, vec!["account_name", "contractor", "transaction_id"]);
            }
            other => panic!("expected MissingFields, got {other:?}"),
        }
    }

    #[test]
    fn extra_columns_are_ignored() {
        let file = write_sample(
            "transaction_id,transaction_date,contractor,title,amount,account_name,notes\n\
             tx-1,2024-03-01,SHOP,Stuff,-3.00,main,ignore me\n",
        );
        let records = parse(file.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Stuff");
    }
}
