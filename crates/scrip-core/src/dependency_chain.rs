//! Dependency-aware batch selection.
//!
//! Transactions in a batch may spend outputs created by other transactions in
//! the same batch. This strategy resolves those spends depth-first: before a
//! transaction is validated, every in-batch producer of an output it claims is
//! explored and applied to a scratch pool.
//!
//! Each batch position is tried as the start of a path. A path begins with the
//! start transaction (and its producers) and is extended with every other
//! batch transaction that still fits, in batch order, passing over the batch
//! again until nothing more fits. The longest path wins; ties go to the
//! earliest start. Only the winning path touches the real pool.
//!
//! Signature checks do not depend on the pool, so their results are shared
//! across all paths of one call.
//!
//! A transaction that depends on itself, directly or through other batch
//! transactions, is rejected.

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace, warn};

use crate::constants::DEFAULT_MAX_DEPENDENCY_DEPTH;
use crate::crypto::CachedVerifier;
use crate::error::TransactionError;
use crate::traits::{SelectionStrategy, SignatureVerifier};
use crate::types::{Hash256, Transaction};
use crate::utxo_pool::UtxoPool;
use crate::validation::validate_transaction;

/// Selects the longest sequentially-applicable path through the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyChainStrategy {
    max_depth: usize,
}

impl DependencyChainStrategy {
    /// `max_depth` bounds how many producers deep one exploration may go.
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

impl Default for DependencyChainStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPENDENCY_DEPTH)
    }
}

impl SelectionStrategy for DependencyChainStrategy {
    fn name(&self) -> &'static str {
        "dependency_chain"
    }

    fn select(
        &self,
        candidates: &[Transaction],
        pool: &mut UtxoPool,
        verifier: &dyn SignatureVerifier,
    ) -> Vec<Transaction> {
        // First occurrence wins for duplicate hashes.
        let mut producers: HashMap<Hash256, &Transaction> = HashMap::with_capacity(candidates.len());
        for tx in candidates {
            producers.entry(tx.hash()).or_insert(tx);
        }

        let cached = CachedVerifier::new(verifier);
        let mut best: Vec<&Transaction> = Vec::new();
        for (start, tx) in candidates.iter().enumerate() {
            let mut builder = PathBuilder::new(&producers, pool.clone(), &cached, self.max_depth);

            if let Err(reason) = builder.explore(tx, 0) {
                trace!(start, txid = %tx.hash(), %reason, "path start rejected");
                continue;
            }
            // Repeat until a pass places nothing: a transaction cut off by the
            // depth bound may fit once more of its producers are placed.
            loop {
                let placed = builder.path.len();
                for other in candidates {
                    let _ = builder.explore(other, 0);
                }
                if builder.path.len() == placed {
                    break;
                }
            }

            trace!(start, len = builder.path.len(), "path explored");
            if builder.path.len() > best.len() {
                best = builder.path;
                if best.len() == producers.len() {
                    break;
                }
            }
        }

        let mut accepted = Vec::with_capacity(best.len());
        for tx in best {
            match pool.apply_transaction(tx) {
                Ok(_) => {
                    debug!(txid = %tx.hash(), "accepted");
                    accepted.push(tx.clone());
                }
                // The path was built on a copy of this exact pool.
                Err(e) => warn!(txid = %tx.hash(), "winning path failed to apply: {e}"),
            }
        }
        accepted
    }
}

/// One path build: a scratch pool plus per-transaction decisions.
struct PathBuilder<'a> {
    producers: &'a HashMap<Hash256, &'a Transaction>,
    verifier: &'a dyn SignatureVerifier,
    max_depth: usize,
    scratch: UtxoPool,
    path: Vec<&'a Transaction>,
    placed: HashSet<Hash256>,
    rejected: HashMap<Hash256, TransactionError>,
    /// Transactions on the current exploration stack.
    visiting: HashSet<Hash256>,
}

impl<'a> PathBuilder<'a> {
    fn new(
        producers: &'a HashMap<Hash256, &'a Transaction>,
        scratch: UtxoPool,
        verifier: &'a dyn SignatureVerifier,
        max_depth: usize,
    ) -> Self {
        Self {
            producers,
            verifier,
            max_depth,
            scratch,
            path: Vec::new(),
            placed: HashSet::new(),
            rejected: HashMap::new(),
            visiting: HashSet::new(),
        }
    }

    /// Place `tx` on the path after its in-batch producers, or say why not.
    fn explore(&mut self, tx: &'a Transaction, depth: usize) -> Result<(), TransactionError> {
        let hash = tx.hash();
        if self.placed.contains(&hash) {
            return Ok(());
        }
        if let Some(reason) = self.rejected.get(&hash) {
            return Err(reason.clone());
        }
        if depth > self.max_depth {
            return Err(TransactionError::DependencyTooDeep { max: self.max_depth });
        }
        if !self.visiting.insert(hash) {
            return Err(TransactionError::DependencyCycle(hash.to_string()));
        }

        let result = self.resolve_and_apply(tx, depth);
        self.visiting.remove(&hash);

        match &result {
            Ok(()) => {
                self.placed.insert(hash);
                self.path.push(tx);
            }
            // Too deep is a property of the route, not of the transaction.
            Err(TransactionError::DependencyTooDeep { .. }) => {
                trace!(txid = %hash, "too deep on this route");
            }
            Err(reason) => {
                trace!(txid = %hash, %reason, "rejected on this path");
                self.rejected.insert(hash, reason.clone());
            }
        }
        result
    }

    fn resolve_and_apply(&mut self, tx: &'a Transaction, depth: usize) -> Result<(), TransactionError> {
        for input in tx.inputs() {
            if self.scratch.contains(&input.utxo_id()) {
                continue;
            }
            let Some(producer) = self.producers.get(&input.prev_tx_hash).copied() else {
                continue;
            };
            match self.explore(producer, depth + 1) {
                Err(e @ (TransactionError::DependencyCycle(_) | TransactionError::DependencyTooDeep { .. })) => {
                    return Err(e);
                }
                // Any other producer failure shows up below as an unknown UTXO.
                _ => {}
            }
        }

        validate_transaction(tx, &self.scratch, self.verifier)?;
        self.scratch.apply_transaction(tx)?;
        Ok(())
    }
}
