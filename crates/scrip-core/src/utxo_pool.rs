//! The set of currently spendable outputs.
//!
//! [`UtxoPool`] maps each [`UtxoId`] to its [`TxOutput`]. It changes only
//! through [`UtxoPool::apply_transaction`], which spends a transaction's
//! inputs and creates its outputs keyed by the transaction hash.
//!
//! `Clone` is a deep copy. Callers that hand a pool to an
//! [`EpochHandler`](crate::handler::EpochHandler) give up their handle to it;
//! to keep a snapshot, clone first.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::PoolError;
use crate::types::{Transaction, TxOutput, UtxoId};

/// Result of applying a transaction to the pool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApplyResult {
    /// Number of UTXOs removed by the transaction's inputs.
    pub utxos_spent: usize,
    /// Number of UTXOs created by the transaction's outputs.
    pub utxos_created: usize,
}

/// One entry of a serialized pool snapshot.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PoolEntry {
    pub id: UtxoId,
    pub output: TxOutput,
}

/// Mapping of unspent outputs.
///
/// Serializes as a list of [`PoolEntry`] sorted by id; deserializing goes
/// through [`UtxoPool::from_entries`] and so rejects malformed snapshots.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(into = "Vec<PoolEntry>", try_from = "Vec<PoolEntry>")]
pub struct UtxoPool {
    utxos: HashMap<UtxoId, TxOutput>,
}

impl UtxoPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a pool from an externally supplied snapshot.
    ///
    /// # Errors
    ///
    /// - [`PoolError::DuplicateUtxo`] if an id appears twice
    /// - [`PoolError::NegativeValue`] if an output carries a negative value
    pub fn from_entries<I>(entries: I) -> Result<Self, PoolError>
    where
        I: IntoIterator<Item = (UtxoId, TxOutput)>,
    {
        let mut pool = Self::new();
        for (id, output) in entries {
            if pool.contains(&id) {
                return Err(PoolError::DuplicateUtxo(id.to_string()));
            }
            pool.add_utxo(id, output)?;
        }
        Ok(pool)
    }

    /// Insert or replace the output at `id`.
    ///
    /// Returns the previous output, if any.
    pub fn add_utxo(&mut self, id: UtxoId, output: TxOutput) -> Result<Option<TxOutput>, PoolError> {
        if output.value < 0 {
            return Err(PoolError::NegativeValue {
                utxo: id.to_string(),
                value: output.value,
            });
        }
        Ok(self.utxos.insert(id, output))
    }

    /// Remove and return the output at `id`.
    pub fn remove_utxo(&mut self, id: &UtxoId) -> Option<TxOutput> {
        self.utxos.remove(id)
    }

    pub fn get(&self, id: &UtxoId) -> Option<&TxOutput> {
        self.utxos.get(id)
    }

    pub fn contains(&self, id: &UtxoId) -> bool {
        self.utxos.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.utxos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utxos.is_empty()
    }

    /// Iterate over all entries (arbitrary order).
    pub fn iter(&self) -> impl Iterator<Item = (&UtxoId, &TxOutput)> {
        self.utxos.iter()
    }

    /// All ids, sorted.
    pub fn utxo_ids(&self) -> Vec<UtxoId> {
        let mut ids: Vec<UtxoId> = self.utxos.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Sum of all output values. Returns None on overflow.
    pub fn total_value(&self) -> Option<i64> {
        self.utxos
            .values()
            .try_fold(0i64, |acc, out| acc.checked_add(out.value))
    }

    /// Spend `tx`'s inputs and create its outputs.
    ///
    /// All-or-nothing: every consumed id must be present (and claimed once)
    /// and no produced id may already exist, otherwise the pool is left
    /// untouched. Signatures and value rules are not checked here; validate
    /// first.
    ///
    /// # Errors
    ///
    /// - [`PoolError::MissingUtxo`] if an input's id is absent or claimed twice
    /// - [`PoolError::OutputExists`] if an output id is already in the pool
    /// - [`PoolError::NegativeValue`] if an output value is negative
    pub fn apply_transaction(&mut self, tx: &Transaction) -> Result<ApplyResult, PoolError> {
        let mut claimed = HashSet::with_capacity(tx.inputs().len());
        for input in tx.inputs() {
            let id = input.utxo_id();
            if !self.contains(&id) || !claimed.insert(id) {
                return Err(PoolError::MissingUtxo(id.to_string()));
            }
        }

        for (index, output) in tx.outputs().iter().enumerate() {
            let id = tx.output_id(index as u32);
            if output.value < 0 {
                return Err(PoolError::NegativeValue {
                    utxo: id.to_string(),
                    value: output.value,
                });
            }
            // A produced id that is also consumed by this transaction frees up
            // before the outputs are written.
            if self.contains(&id) && !claimed.contains(&id) {
                return Err(PoolError::OutputExists(id.to_string()));
            }
        }

        for id in &claimed {
            self.utxos.remove(id);
        }
        for (index, output) in tx.outputs().iter().enumerate() {
            self.utxos.insert(tx.output_id(index as u32), output.clone());
        }

        Ok(ApplyResult {
            utxos_spent: claimed.len(),
            utxos_created: tx.outputs().len(),
        })
    }
}

impl From<UtxoPool> for Vec<PoolEntry> {
    fn from(pool: UtxoPool) -> Self {
        let mut entries: Vec<PoolEntry> = pool
            .utxos
            .into_iter()
            .map(|(id, output)| PoolEntry { id, output })
            .collect();
        entries.sort_unstable_by_key(|e| e.id);
        entries
    }
}

impl TryFrom<Vec<PoolEntry>> for UtxoPool {
    type Error = PoolError;

    fn try_from(entries: Vec<PoolEntry>) -> Result<Self, Self::Error> {
        Self::from_entries(entries.into_iter().map(|e| (e.id, e.output)))
    }
}

impl FromIterator<(UtxoId, TxOutput)> for UtxoPool {
    /// Later entries replace earlier ones. Use [`UtxoPool::from_entries`] for
    /// untrusted snapshots.
    fn from_iter<T: IntoIterator<Item = (UtxoId, TxOutput)>>(iter: T) -> Self {
        Self {
            utxos: iter.into_iter().collect(),
        }
    }
}
