pub mod aggregate;
pub mod dedup;

use std::path::PathBuf;
use thiserror::Error;

use grosz_categorize::{apply_categories, load_rules, CategoryCache, RuleError};
use grosz_core::Transaction;
use grosz_import::{normalize, parse_raw, scan_root, DiscoveryError, FormatError};

pub use aggregate::{
    filter_date_range, group_label, significant_group_values, sum_by_bucket, Bucket, OTHER_GROUP,
};
pub use dedup::dedupe_by_id;

/// Everything one ingestion run reads or writes, passed explicitly so
/// cache and rule state never live in globals.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    /// Root holding one subdirectory per source type (`ing/`, `mbank/`,
    /// `generic/`).
    pub transactions_dir: PathBuf,
    pub rules_path: PathBuf,
    pub cache_path: PathBuf,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),
    #[error("Format error: {0}")]
    Format(#[from] FormatError),
    #[error("Rule error: {0}")]
    Rules(#[from] RuleError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub files_read: usize,
    pub duplicates_dropped: usize,
    pub categories_recomputed: usize,
    pub categories_from_cache: usize,
}

/// One ingestion run's result: the canonical table plus the resolved
/// category vocabulary (fallback included). Read-only for consumers.
#[derive(Debug)]
pub struct PipelineOutput {
    pub transactions: Vec<Transaction>,
    pub categories: Vec<String>,
    pub stats: PipelineStats,
}

/// Run the whole pipeline: discover export files, parse each with its
/// source adapter, normalize into the canonical schema, de-duplicate by
/// transaction id, then categorize against the rule file with the
/// fingerprint-guarded cache.
///
/// Adapter and rule-loader failures abort the run; the cache never does.
pub fn run(ctx: &PipelineContext) -> Result<PipelineOutput, PipelineError> {
    let files = scan_root(&ctx.transactions_dir)?;

    let mut transactions = Vec::new();
    for file in &files {
        tracing::info!("Parsing {} as {}", file.path.display(), file.source_type);
        let records = parse_raw(file.source_type, &file.path)?;
        let normalized = normalize(records, &file.path.to_string_lossy(), file.source_type);
        tracing::info!(
            "{} transactions read from {}",
            normalized.len(),
            file.path.display()
        );
        transactions.extend(normalized);
    }

    let (mut transactions, duplicates_dropped) = dedup::dedupe_by_id(transactions);

    let rules = load_rules(&ctx.rules_path, true)?;
    let mut cache = CategoryCache::new(&ctx.cache_path);
    cache.read();
    let apply = apply_categories(&mut transactions, &rules, &mut cache);

    Ok(PipelineOutput {
        categories: rules.categories(),
        transactions,
        stats: PipelineStats {
            files_read: files.len(),
            duplicates_dropped,
            categories_recomputed: apply.recomputed,
            categories_from_cache: apply.from_cache,
        },
    })
}
