use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category assigned when no rule matches a transaction.
pub const UNRECOGNIZED_CATEGORY: &str = "unrecognized";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Ing,
    Mbank,
    Generic,
}

impl SourceType {
    pub const ALL: [SourceType; 3] = [SourceType::Ing, SourceType::Mbank, SourceType::Generic];

    /// Name of the input subdirectory holding this source's export files.
    pub fn dir_name(self) -> &'static str {
        match self {
            SourceType::Ing => "ing",
            SourceType::Mbank => "mbank",
            SourceType::Generic => "generic",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dir_name())
    }
}

impl FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ing" => Ok(SourceType::Ing),
            "mbank" => Ok(SourceType::Mbank),
            "generic" => Ok(SourceType::Generic),
            other => Err(format!("Unknown source type: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Outcome,
}

impl TransactionType {
    pub fn from_amount(amount: Decimal) -> Self {
        if amount >= Decimal::ZERO {
            TransactionType::Income
        } else {
            TransactionType::Outcome
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionType::Income => write!(f, "income"),
            TransactionType::Outcome => write!(f, "outcome"),
        }
    }
}

/// Transaction fields addressable from category rules. A closed set, so a
/// rule referencing a nonexistent column fails at load time, not during
/// evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionField {
    TransactionDate,
    Contractor,
    Title,
    TransactionId,
    Amount,
    AccountName,
    SourceFilePath,
    Type,
}

impl fmt::Display for TransactionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransactionField::TransactionDate => "transaction_date",
            TransactionField::Contractor => "contractor",
            TransactionField::Title => "title",
            TransactionField::TransactionId => "transaction_id",
            TransactionField::Amount => "amount",
            TransactionField::AccountName => "account_name",
            TransactionField::SourceFilePath => "source_file_path",
            TransactionField::Type => "type",
        };
        write!(f, "{name}")
    }
}

impl FromStr for TransactionField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transaction_date" => Ok(TransactionField::TransactionDate),
            "contractor" => Ok(TransactionField::Contractor),
            "title" => Ok(TransactionField::Title),
            "transaction_id" => Ok(TransactionField::TransactionId),
            "amount" => Ok(TransactionField::Amount),
            "account_name" => Ok(TransactionField::AccountName),
            "source_file_path" => Ok(TransactionField::SourceFilePath),
            "type" => Ok(TransactionField::Type),
            other => Err(format!("Unknown transaction field: '{other}'")),
        }
    }
}

/// The canonical transaction record every source format normalizes into.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: String,
    pub transaction_date: NaiveDateTime,
    pub contractor: String,
    pub title: String,
    pub amount: Decimal,
    pub amount_abs: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub account_name: String,
    pub source_file_path: String,
    pub source_type: SourceType,
    pub category: String,
    pub category_rule_id: Option<i64>,
    /// ISO date at day granularity, e.g. "2024-01-15".
    pub date_iso_day: String,
    /// ISO date at month granularity, e.g. "2024-01".
    pub date_iso_month: String,
    /// ISO date at year granularity, e.g. "2024".
    pub date_iso_year: String,
}

impl Transaction {
    /// Build a canonical transaction, computing every derived field so
    /// downstream consumers never recompute them. Starts uncategorized.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        transaction_id: String,
        transaction_date: NaiveDateTime,
        contractor: String,
        title: String,
        amount: Decimal,
        account_name: String,
        source_file_path: String,
        source_type: SourceType,
    ) -> Self {
        Transaction {
            transaction_id,
            contractor,
            title,
            amount,
            amount_abs: amount.abs(),
            kind: TransactionType::from_amount(amount),
            account_name,
            source_file_path,
            source_type,
            category: UNRECOGNIZED_CATEGORY.to_string(),
            category_rule_id: None,
            date_iso_day: transaction_date.format("%Y-%m-%d").to_string(),
            date_iso_month: transaction_date.format("%Y-%m").to_string(),
            date_iso_year: transaction_date.format("%Y").to_string(),
            transaction_date,
        }
    }

    /// String form of a field, as seen by rule conditions. Rules are
    /// authored against the literal bank text, so no case or whitespace
    /// normalization happens here.
    pub fn field_str(&self, field: TransactionField) -> String {
        match field {
            TransactionField::TransactionDate => self.transaction_date.to_string(),
            TransactionField::Contractor => self.contractor.clone(),
            TransactionField::Title => self.title.clone(),
            TransactionField::TransactionId => self.transaction_id.clone(),
            TransactionField::Amount => self.amount.to_string(),
            TransactionField::AccountName => self.account_name.clone(),
            TransactionField::SourceFilePath => self.source_file_path.clone(),
            TransactionField::Type => self.kind.to_string(),
        }
    }
}
