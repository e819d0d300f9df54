use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use grosz_core::Transaction;

use crate::rules::{categorize, RuleSet};

/// Comment line carrying the fingerprint of the rule set that produced
/// the cached mapping. Kept inside the cache file so the whole artifact
/// stays one flat delimited file.
const FINGERPRINT_PREFIX: &str = "# rules_fingerprint: ";

#[derive(Debug, Serialize, Deserialize)]
struct CacheRow {
    transaction_id: String,
    category: String,
    category_rule_id: Option<i64>,
}

/// Persisted `transaction_id → (category, rule_id)` mapping.
///
/// Explicitly constructed and explicitly read/written: cache validity is
/// an input and output of categorization, not ambient state. A missing or
/// corrupt file is a cold start, never an error.
#[derive(Debug)]
pub struct CategoryCache {
    file_path: PathBuf,
    entries: HashMap<String, (String, Option<i64>)>,
    fingerprint: Option<String>,
}

impl CategoryCache {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        CategoryCache {
            file_path: file_path.into(),
            entries: HashMap::new(),
            fingerprint: None,
        }
    }

    /// Attempt to load the persisted mapping; on any read or parse
    /// failure the cache simply stays empty.
    pub fn read(&mut self) {
        self.entries.clear();
        self.fingerprint = None;

        match self.try_read() {
            Ok((fingerprint, entries)) => {
                self.fingerprint = fingerprint;
                self.entries = entries;
            }
            Err(err) => {
                tracing::debug!(
                    "category cache at {} not usable ({err}); starting cold",
                    self.file_path.display()
                );
            }
        }
    }

    fn try_read(
        &self,
    ) -> Result<(Option<String>, HashMap<String, (String, Option<i64>)>), io::Error> {
        let content = fs::read_to_string(&self.file_path)?;

        let (fingerprint, body) = match content.split_once('\n') {
            Some((first, rest)) if first.starts_with(FINGERPRINT_PREFIX) => (
                Some(first[FINGERPRINT_PREFIX.len()..].trim().to_string()),
                rest,
            ),
            _ => (None, content.as_str()),
        };

        let mut reader = csv::Reader::from_reader(body.as_bytes());
        let mut entries = HashMap::new();
        for result in reader.deserialize::<CacheRow>() {
            let row = result.map_err(io::Error::other)?;
            entries.insert(row.transaction_id, (row.category, row.category_rule_id));
        }
        Ok((fingerprint, entries))
    }

    pub fn lookup(&self, transaction_id: &str) -> Option<(String, Option<i64>)> {
        self.entries.get(transaction_id).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    /// Persist the full mapping for `transactions`, overwriting the store
    /// wholesale together with the producing rule set's fingerprint.
    pub fn write(&mut self, transactions: &[Transaction], fingerprint: &str) -> io::Result<()> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for tx in transactions {
            writer
                .serialize(CacheRow {
                    transaction_id: tx.transaction_id.clone(),
                    category: tx.category.clone(),
                    category_rule_id: tx.category_rule_id,
                })
                .map_err(io::Error::other)?;
        }
        let body = writer.into_inner().map_err(io::Error::other)?;

        let mut content = format!("{FINGERPRINT_PREFIX}{fingerprint}\n").into_bytes();
        content.extend_from_slice(&body);

        let tmp = {
            let mut name = self
                .file_path
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_default();
            name.push(".tmp");
            self.file_path.with_file_name(name)
        };
        fs::write(&tmp, &content)?;
        fs::rename(&tmp, &self.file_path)?;

        self.fingerprint = Some(fingerprint.to_string());
        self.entries = transactions
            .iter()
            .map(|tx| {
                (
                    tx.transaction_id.clone(),
                    (tx.category.clone(), tx.category_rule_id),
                )
            })
            .collect();
        Ok(())
    }
}

/// Counters for one categorization pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ApplyStats {
    pub recomputed: usize,
    pub from_cache: usize,
}

/// Categorize a batch, consulting the cache under its coherence protocol:
/// a fingerprint mismatch (or empty cache) invalidates the whole cache
/// and every transaction is recomputed; on a match only ids unseen at
/// cache-write time are recomputed. The full merged mapping is written
/// back afterwards. Persisting the cache is best-effort; a failed write
/// costs a recompute next session, nothing more.
pub fn apply_categories(
    transactions: &mut [Transaction],
    rules: &RuleSet,
    cache: &mut CategoryCache,
) -> ApplyStats {
    let cache_valid = !cache.is_empty() && cache.fingerprint() == Some(rules.fingerprint.as_str());
    let mut stats = ApplyStats::default();

    for tx in transactions.iter_mut() {
        let cached = if cache_valid {
            cache.lookup(&tx.transaction_id)
        } else {
            None
        };
        match cached {
            Some((category, rule_id)) => {
                tx.category = category;
                tx.category_rule_id = rule_id;
                stats.from_cache += 1;
            }
            None => {
                let (category, rule_id) = categorize(tx, &rules.rules);
                tx.category = category;
                tx.category_rule_id = rule_id;
                stats.recomputed += 1;
            }
        }
    }

    tracing::info!("Categories recomputed: {}", stats.recomputed);
    tracing::info!("Categories read from cache: {}", stats.from_cache);

    if let Err(err) = cache.write(transactions, &rules.fingerprint) {
        tracing::warn!(
            "failed to persist category cache at {}: {err}",
            cache.file_path.display()
        );
    }

    stats
}
