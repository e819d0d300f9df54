use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use grosz_core::{hash, TransactionField};

use crate::rules::{CategoryRule, Condition, Relation, RuleSet};

/// One line of the rule definition file. Consecutive rows sharing a
/// `rule_id` contribute conditions to the same rule.
#[derive(Debug, Serialize, Deserialize)]
struct RuleRow {
    rule_id: i64,
    column: String,
    relation: String,
    value: String,
    category: String,
}

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Unknown column in rule {rule_id}: '{column}'")]
    UnknownColumn { rule_id: i64, column: String },
    #[error("Unknown relation in rule {rule_id}: '{relation}'")]
    UnknownRelation { rule_id: i64, relation: String },
    #[error("Rule {rule_id} maps to both '{first}' and '{second}'")]
    InconsistentCategory {
        rule_id: i64,
        first: String,
        second: String,
    },
}

/// Load the ordered rule set from its CSV definition file.
///
/// The fingerprint is computed over the file's raw bytes, so any edit
/// (including reordering or whitespace) invalidates caches keyed on it.
/// Rules keep first-seen id order; a rule id mapping to two categories is
/// a hard error. With `add_fallback` the always-matching "unrecognized"
/// rule is appended last.
pub fn load_rules(path: &Path, add_fallback: bool) -> Result<RuleSet, RuleError> {
    let fingerprint = hash::to_hex(&hash::sha256_file(path)?);

    let mut reader = csv::ReaderBuilder::new().from_path(path)?;
    let mut rules: Vec<CategoryRule> = Vec::new();
    let mut index_by_id: HashMap<i64, usize> = HashMap::new();

    for result in reader.deserialize::<RuleRow>() {
        let row = result?;
        let column = TransactionField::from_str(&row.column).map_err(|_| {
            RuleError::UnknownColumn {
                rule_id: row.rule_id,
                column: row.column.clone(),
            }
        })?;
        let relation = Relation::from_str(&row.relation).map_err(|_| {
            RuleError::UnknownRelation {
                rule_id: row.rule_id,
                relation: row.relation.clone(),
            }
        })?;
        let condition = Condition {
            column,
            relation,
            value: row.value,
        };

        match index_by_id.get(&row.rule_id) {
            Some(&idx) => {
                if rules[idx].category != row.category {
                    return Err(RuleError::InconsistentCategory {
                        rule_id: row.rule_id,
                        first: rules[idx].category.clone(),
                        second: row.category,
                    });
                }
                rules[idx].conditions.push(condition);
            }
            None => {
                index_by_id.insert(row.rule_id, rules.len());
                rules.push(CategoryRule {
                    rule_id: Some(row.rule_id),
                    category: row.category,
                    conditions: vec![condition],
                });
            }
        }
    }

    if add_fallback {
        rules.push(CategoryRule::fallback());
    }

    Ok(RuleSet { rules, fingerprint })
}

/// Persist the full rule list back to its definition file. The synthetic
/// fallback (no id) is skipped; it is re-added at next load. All
/// non-numeric fields are quoted to keep user-authored literals
/// unambiguous on reload, and the file is replaced atomically.
pub fn save_rules(path: &Path, rules: &[CategoryRule]) -> Result<(), RuleError> {
    let tmp = tmp_path(path);
    {
        let mut writer = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::NonNumeric)
            .from_path(&tmp)?;

        for rule in rules {
            let Some(rule_id) = rule.rule_id else {
                continue;
            };
            for condition in &rule.conditions {
                writer.serialize(RuleRow {
                    rule_id,
                    column: condition.column.to_string(),
                    relation: condition.relation.to_string(),
                    value: condition.value.clone(),
                    category: rule.category.clone(),
                })?;
            }
        }
        writer.flush()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Append a new single-condition rule with `rule_id = max + 1` and persist
/// the edited set. This is the only mutation entry point into the rule
/// store.
pub fn add_category_rule(
    path: &Path,
    column: TransactionField,
    relation: Relation,
    value: &str,
    category: &str,
) -> Result<i64, RuleError> {
    let set = load_rules(path, false)?;
    let next_id = set.max_rule_id().unwrap_or(0) + 1;

    let mut rules = set.rules;
    rules.push(CategoryRule {
        rule_id: Some(next_id),
        category: category.to_string(),
        conditions: vec![Condition {
            column,
            relation,
            value: value.to_string(),
        }],
    });

    save_rules(path, &rules)?;
    Ok(next_id)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use grosz_core::UNRECOGNIZED_CATEGORY;

    const SAMPLE_RULES: &str = "\
rule_id,column,relation,value,category\n\
1,contractor,contains,ZABKA,groceries\n\
2,contractor,contains,KOWALSKI,rent\n\
2,title,contains,czynsz,rent\n\
3,title,equals,Bilet miesieczny,transport\n";

    fn write_rules(content: &str) -> tempfile::NamedTempFile {
        let file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        fs::write(file.path(), content).unwrap();
        file
    }

    #[test]
    fn loads_rules_grouping_conditions_by_id() {
        let file = write_rules(SAMPLE_RULES);
        let set = load_rules(file.path(), false).unwrap();

        assert_eq!(set.rules.len(), 3);
        assert_eq!(set.rules[0].rule_id, Some(1));
        assert_eq!(set.rules[1].rule_id, Some(2));
        assert_eq!(set.rules[1].conditions.len(), 2);
        assert_eq!(set.rules[2].category, "transport");
    }

    #[test]
    fn fallback_appended_last_when_requested() {
        let file = write_rules(SAMPLE_RULES);
        let set = load_rules(file.path(), true).unwrap();

        let last = set.rules.last().unwrap();
        assert_eq!(last.rule_id, None);
        assert_eq!(last.category, UNRECOGNIZED_CATEGORY);
        assert_eq!(set.rules.len(), 4);
    }

    #[test]
    fn inconsistent_category_for_one_id_is_fatal() {
        let file = write_rules(
            "rule_id,column,relation,value,category\n\
             1,contractor,contains,ZABKA,groceries\n\
             1,title,contains,Zakup,transport\n",
        );
        match load_rules(file.path(), false) {
            Err(RuleError::InconsistentCategory { rule_id, first, second }) => {
                assert_eq!(rule_id, 1);
                assert_eq!(first, "groceries");
                assert_eq!(second, "transport");
            }
            other => panic!("expected InconsistentCategory, got {other:?}"),
        }
    }

    #[test]
    fn unknown_column_is_fatal() {
        let file = write_rules(
            "rule_id,column,relation,value,category\n1,merchant,contains,X,misc\n",
        );
        assert!(matches!(
            load_rules(file.path(), false),
            Err(RuleError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn unknown_relation_is_fatal() {
        let file = write_rules(
            "rule_id,column,relation,value,category\n1,title,regex,X,misc\n",
        );
        assert!(matches!(
            load_rules(file.path(), false),
            Err(RuleError::UnknownRelation { .. })
        ));
    }

    #[test]
    fn fingerprint_tracks_file_bytes() {
        let file = write_rules(SAMPLE_RULES);
        let before = load_rules(file.path(), false).unwrap().fingerprint;

        // Whitespace-only edit still changes the fingerprint.
        fs::write(file.path(), format!("{SAMPLE_RULES}\n")).unwrap();
        let after = load_rules(file.path(), false).unwrap().fingerprint;
        assert_ne!(before, after);

        fs::write(file.path(), SAMPLE_RULES).unwrap();
        let restored = load_rules(file.path(), false).unwrap().fingerprint;
        assert_eq!(before, restored);
    }

    #[test]
    fn save_then_load_round_trips() {
        let file = write_rules(SAMPLE_RULES);
        let original = load_rules(file.path(), false).unwrap();

        let copy = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        save_rules(copy.path(), &original.rules).unwrap();
        let reloaded = load_rules(copy.path(), false).unwrap();

        assert_eq!(original.rules, reloaded.rules);
    }

    #[test]
    fn save_skips_fallback_and_quotes_non_numeric_fields() {
        let file = write_rules(SAMPLE_RULES);
        let set = load_rules(file.path(), true).unwrap();

        let copy = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        save_rules(copy.path(), &set.rules).unwrap();

        let content = fs::read_to_string(copy.path()).unwrap();
        assert!(!content.contains(UNRECOGNIZED_CATEGORY));
        assert!(content.contains("\"groceries\""));
        // Rule ids stay numeric and unquoted.
        assert!(content.lines().nth(1).unwrap().starts_with("1,"));
    }

    #[test]
    fn add_category_rule_appends_with_next_id() {
        let file = write_rules(SAMPLE_RULES);
        let new_id = add_category_rule(
            file.path(),
            TransactionField::Contractor,
            Relation::Contains,
            "BIEDRONKA",
            "groceries",
        )
        .unwrap();
        assert_eq!(new_id, 4);

        let set = load_rules(file.path(), false).unwrap();
        let last = set.rules.last().unwrap();
        assert_eq!(last.rule_id, Some(4));
        assert_eq!(last.category, "groceries");
        assert_eq!(last.conditions.len(), 1);
        assert_eq!(last.conditions[0].value, "BIEDRONKA");
    }

    #[test]
    fn add_category_rule_on_empty_set_starts_at_one() {
        let file = write_rules("rule_id,column,relation,value,category\n");
        let new_id = add_category_rule(
            file.path(),
            TransactionField::Title,
            Relation::Equals,
            "Przelew",
            "own-transfer",
        )
        .unwrap();
        assert_eq!(new_id, 1);
    }
}
