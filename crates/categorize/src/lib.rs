pub mod cache;
pub mod rules;
pub mod store;

pub use cache::{apply_categories, ApplyStats, CategoryCache};
pub use rules::{categorize, CategoryRule, Condition, Relation, RuleSet};
pub use store::{add_category_rule, load_rules, save_rules, RuleError};
