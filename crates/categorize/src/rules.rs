use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use grosz_core::{Transaction, TransactionField, UNRECOGNIZED_CATEGORY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    Equals,
    Contains,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relation::Equals => write!(f, "equals"),
            Relation::Contains => write!(f, "contains"),
        }
    }
}

impl FromStr for Relation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "equals" => Ok(Relation::Equals),
            "contains" => Ok(Relation::Contains),
            other => Err(format!("Unknown relation: '{other}'")),
        }
    }
}

/// One predicate over a single transaction field. Comparisons are
/// case-sensitive and exact on the field's string form; rules are
/// authored against literal bank text, so no normalization happens here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub column: TransactionField,
    pub relation: Relation,
    pub value: String,
}

impl Condition {
    pub fn evaluate(&self, tx: &Transaction) -> bool {
        let field = tx.field_str(self.column);
        match self.relation {
            Relation::Equals => field == self.value,
            Relation::Contains => field.contains(&self.value),
        }
    }
}

/// An ordered group of conditions mapping to one category. Matches a
/// transaction iff every condition holds. The synthetic fallback rule has
/// no id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub rule_id: Option<i64>,
    pub category: String,
    pub conditions: Vec<Condition>,
}

impl CategoryRule {
    pub fn matches(&self, tx: &Transaction) -> bool {
        self.conditions.iter().all(|condition| condition.evaluate(tx))
    }

    /// The always-matching rule appended last at load time, guaranteeing
    /// every transaction receives a category.
    pub fn fallback() -> Self {
        CategoryRule {
            rule_id: None,
            category: UNRECOGNIZED_CATEGORY.to_string(),
            conditions: vec![Condition {
                column: TransactionField::Title,
                relation: Relation::Contains,
                value: String::new(),
            }],
        }
    }
}

/// The loaded rule list in evaluation order, plus the fingerprint of the
/// backing file's raw bytes. The fingerprint is the cache-validity token:
/// any byte-level edit to the rule file changes it.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSet {
    pub rules: Vec<CategoryRule>,
    pub fingerprint: String,
}

impl RuleSet {
    /// Distinct category vocabulary, sorted; includes the fallback's
    /// category when the set was loaded with one.
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> =
            self.rules.iter().map(|rule| rule.category.clone()).collect();
        categories.sort();
        categories.dedup();
        categories
    }

    pub fn max_rule_id(&self) -> Option<i64> {
        self.rules.iter().filter_map(|rule| rule.rule_id).max()
    }
}

/// Evaluate the rules in order against one transaction; first match wins.
/// With no matching rule (and no fallback in the list) the reserved
/// "unrecognized" label is returned with no rule id.
pub fn categorize(tx: &Transaction, rules: &[CategoryRule]) -> (String, Option<i64>) {
    for rule in rules {
        if rule.matches(tx) {
            return (rule.category.clone(), rule.rule_id);
        }
    }
    (UNRECOGNIZED_CATEGORY.to_string(), None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use grosz_core::SourceType;
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use std::str::FromStr as _;

    fn tx(contractor: &str, title: &str) -> Transaction {
        Transaction::new(
            "tx-1".to_string(),
            NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_opt(0, 1, 0)
                .unwrap(),
            contractor.to_string(),
            title.to_string(),
            Decimal::from_str("-12.50").unwrap(),
            "main".to_string(),
            "/data/ing/f.csv".to_string(),
            SourceType::Ing,
        )
    }

    fn rule(id: i64, category: &str, conditions: Vec<Condition>) -> CategoryRule {
        CategoryRule {
            rule_id: Some(id),
            category: category.to_string(),
            conditions,
        }
    }

    fn contains(column: TransactionField, value: &str) -> Condition {
        Condition {
            column,
            relation: Relation::Contains,
            value: value.to_string(),
        }
    }

    #[test]
    fn contractor_contains_scenario() {
        let rules = vec![rule(
            1,
            "groceries",
            vec![contains(TransactionField::Contractor, "ZABKA")],
        )];

        let (category, rule_id) = categorize(&tx("ZABKA K.15", "Zakup"), &rules);
        assert_eq!(category, "groceries");
        assert_eq!(rule_id, Some(1));

        let (category, rule_id) = categorize(&tx("OTHER", "Zakup"), &rules);
        assert_eq!(category, UNRECOGNIZED_CATEGORY);
        assert_eq!(rule_id, None);
    }

    #[test]
    fn all_conditions_must_hold() {
        let rules = vec![rule(
            1,
            "transfers",
            vec![
                contains(TransactionField::Contractor, "KOWALSKI"),
                contains(TransactionField::Title, "czynsz"),
            ],
        )];

        assert_eq!(
            categorize(&tx("JAN KOWALSKI", "czynsz 11/2024"), &rules).0,
            "transfers"
        );
        // One condition false → the whole rule fails.
        assert_eq!(
            categorize(&tx("JAN KOWALSKI", "prezent"), &rules).0,
            UNRECOGNIZED_CATEGORY
        );
    }

    #[test]
    fn first_match_wins_in_list_order() {
        let rules = vec![
            rule(7, "first", vec![contains(TransactionField::Contractor, "ZABKA")]),
            rule(2, "second", vec![contains(TransactionField::Contractor, "ZABKA")]),
        ];
        let (category, rule_id) = categorize(&tx("ZABKA K.15", "Zakup"), &rules);
        assert_eq!(category, "first");
        assert_eq!(rule_id, Some(7));
    }

    #[test]
    fn comparisons_are_case_sensitive() {
        let rules = vec![rule(
            1,
            "groceries",
            vec![contains(TransactionField::Contractor, "zabka")],
        )];
        assert_eq!(categorize(&tx("ZABKA K.15", "Zakup"), &rules).0, UNRECOGNIZED_CATEGORY);
    }

    #[test]
    fn equals_is_exact() {
        let rules = vec![rule(
            1,
            "groceries",
            vec![Condition {
                column: TransactionField::Contractor,
                relation: Relation::Equals,
                value: "ZABKA K.15".to_string(),
            }],
        )];
        assert_eq!(categorize(&tx("ZABKA K.15", "Zakup"), &rules).0, "groceries");
        assert_eq!(categorize(&tx("ZABKA K.15 ", "Zakup"), &rules).0, UNRECOGNIZED_CATEGORY);
    }

    #[test]
    fn fallback_rule_always_matches() {
        let rules = vec![CategoryRule::fallback()];
        let (category, rule_id) = categorize(&tx("ANYONE", "anything"), &rules);
        assert_eq!(category, UNRECOGNIZED_CATEGORY);
        assert_eq!(rule_id, None);
    }

    #[test]
    fn categories_vocabulary_sorted_distinct() {
        let set = RuleSet {
            rules: vec![
                rule(1, "groceries", vec![]),
                rule(2, "transport", vec![]),
                rule(3, "groceries", vec![]),
                CategoryRule::fallback(),
            ],
            fingerprint: "f".to_string(),
        };
        assert_eq!(set.categories(), vec!["groceries", "transport", "unrecognized"]);
        assert_eq!(set.max_rule_id(), Some(3));
    }

    // ── property: a selected rule never has a false condition ─────────────────

    fn condition_strategy() -> impl Strategy<Value = Condition> {
        (
            prop_oneof![
                Just(TransactionField::Contractor),
                Just(TransactionField::Title),
                Just(TransactionField::AccountName),
            ],
            prop_oneof![Just(Relation::Equals), Just(Relation::Contains)],
            prop_oneof![
                Just("".to_string()),
                Just("ZABKA".to_string()),
                Just("ZABKA K.15".to_string()),
                Just("Zakup".to_string()),
                Just("main".to_string()),
                Just("nothing-matches-this".to_string()),
            ],
        )
            .prop_map(|(column, relation, value)| Condition { column, relation, value })
    }

    fn rules_strategy() -> impl Strategy<Value = Vec<CategoryRule>> {
        prop::collection::vec(
            prop::collection::vec(condition_strategy(), 1..4),
            0..8,
        )
        .prop_map(|groups| {
            groups
                .into_iter()
                .enumerate()
                .map(|(i, conditions)| CategoryRule {
                    rule_id: Some(i as i64 + 1),
                    category: format!("category-{i}"),
                    conditions,
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn selected_rule_has_all_conditions_true(rules in rules_strategy()) {
            let sample = tx("ZABKA K.15", "Zakup");
            let (category, rule_id) = categorize(&sample, &rules);

            match rule_id {
                Some(id) => {
                    let selected = rules
                        .iter()
                        .find(|rule| rule.rule_id == Some(id))
                        .expect("selected id must exist");
                    prop_assert!(selected.matches(&sample));
                    prop_assert_eq!(&category, &selected.category);
                }
                None => {
                    // Fallback: no rule may fully match.
                    prop_assert_eq!(&category, UNRECOGNIZED_CATEGORY);
                    prop_assert!(rules.iter().all(|rule| !rule.matches(&sample)));
                }
            }
        }
    }
}
