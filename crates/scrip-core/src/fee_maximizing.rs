//! Greedy fee-ordered batch selection.
//!
//! Candidates are ranked once, by descending fee against the pool as it is
//! when the epoch starts; equal fees keep batch order. They are then visited
//! in rank order and each is re-validated against the live pool, so a
//! transaction that conflicts with an earlier acceptance is rejected. Every
//! transaction identity is decided once: duplicates and earlier rejections
//! are not retried.

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::crypto::CachedVerifier;
use crate::fee::transaction_fee;
use crate::traits::{SelectionStrategy, SignatureVerifier};
use crate::types::{Hash256, Transaction};
use crate::utxo_pool::UtxoPool;
use crate::validation::validate_transaction;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeeMaximizingStrategy;

impl SelectionStrategy for FeeMaximizingStrategy {
    fn name(&self) -> &'static str {
        "fee_maximizing"
    }

    fn select(
        &self,
        candidates: &[Transaction],
        pool: &mut UtxoPool,
        verifier: &dyn SignatureVerifier,
    ) -> Vec<Transaction> {
        let cached = CachedVerifier::new(verifier);
        let verifier: &dyn SignatureVerifier = &cached;
        let mut ranked: Vec<(i64, &Transaction)> = candidates
            .iter()
            .map(|tx| (transaction_fee(tx, pool, verifier), tx))
            .collect();
        // Stable: equal fees stay in batch order.
        ranked.sort_by(|a, b| b.0.cmp(&a.0));

        let mut decided: HashSet<Hash256> = HashSet::with_capacity(ranked.len());
        let mut accepted = Vec::new();

        for (ranked_fee, tx) in ranked {
            let txid = tx.hash();
            if !decided.insert(txid) {
                trace!(%txid, "already decided this epoch");
                continue;
            }

            let outcome = validate_transaction(tx, pool, verifier)
                .and_then(|v| pool.apply_transaction(tx).map(|_| v).map_err(Into::into));
            match outcome {
                Ok(v) => {
                    debug!(%txid, fee = v.fee, ranked_fee, "accepted");
                    accepted.push(tx.clone());
                }
                Err(reason) => debug!(%txid, ranked_fee, %reason, "rejected"),
            }
        }

        accepted
    }
}
