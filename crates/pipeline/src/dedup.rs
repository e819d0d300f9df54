use std::collections::HashSet;

use grosz_core::Transaction;

/// Drop transactions whose id was already seen, keeping the first
/// occurrence. Files arrive in scanner order, so a duplicate export of
/// the same statement contributes nothing new. Synthesized ids make two
/// byte-identical rows collide here by construction; native ids collide
/// whenever the bank exported the same transaction twice.
pub fn dedupe_by_id(transactions: Vec<Transaction>) -> (Vec<Transaction>, usize) {
    let before = transactions.len();
    let mut seen = HashSet::with_capacity(before);
    let kept: Vec<Transaction> = transactions
        .into_iter()
        .filter(|tx| seen.insert(tx.transaction_id.clone()))
        .collect();

    let dropped = before - kept.len();
    if dropped > 0 {
        tracing::info!("{dropped} duplicate transactions dropped by id");
    }
    (kept, dropped)
}
