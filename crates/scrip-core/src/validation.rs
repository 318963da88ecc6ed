//! Transaction validation against a UTXO pool.
//!
//! A transaction is valid against a pool snapshot when:
//!
//! 1. every input claims an output present in the pool,
//! 2. every input's signature verifies against the claimed output's owner,
//! 3. no output is claimed twice,
//! 4. no output value is negative, and
//! 5. the claimed input value covers the output value.
//!
//! [`validate_transaction`] reports the first violated rule;
//! [`is_valid_transaction`] collapses that to a boolean. Neither touches the
//! pool, and neither panics on malformed input.

use std::collections::HashSet;

use crate::crypto;
use crate::error::TransactionError;
use crate::traits::SignatureVerifier;
use crate::types::Transaction;
use crate::utxo_pool::UtxoPool;

/// Summary of a successfully validated transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedTransaction {
    /// Total value of all claimed inputs.
    pub total_input: i64,
    /// Total value of all outputs.
    pub total_output: i64,
    /// `total_input - total_output`, never negative.
    pub fee: i64,
}

/// Validate `tx` against `pool`.
pub fn validate_transaction<V>(
    tx: &Transaction,
    pool: &UtxoPool,
    verifier: &V,
) -> Result<ValidatedTransaction, TransactionError>
where
    V: SignatureVerifier + ?Sized,
{
    let mut seen = HashSet::with_capacity(tx.inputs().len());
    let mut total_input: i64 = 0;

    for (i, input) in tx.inputs().iter().enumerate() {
        let id = input.utxo_id();

        let utxo = pool
            .get(&id)
            .ok_or_else(|| TransactionError::UnknownUtxo(id.to_string()))?;

        if !seen.insert(id) {
            return Err(TransactionError::DuplicateInput(id.to_string()));
        }

        crypto::verify_transaction_input(tx, i, &utxo.owner, verifier)
            .map_err(|_| TransactionError::InvalidSignature { index: i })?;

        total_input = total_input
            .checked_add(utxo.value)
            .ok_or(TransactionError::ValueOverflow)?;
    }

    let mut total_output: i64 = 0;
    for (i, output) in tx.outputs().iter().enumerate() {
        if output.value < 0 {
            return Err(TransactionError::NegativeOutput(i));
        }
        total_output = total_output
            .checked_add(output.value)
            .ok_or(TransactionError::ValueOverflow)?;
    }

    if total_input < total_output {
        return Err(TransactionError::InsufficientFunds {
            have: total_input,
            need: total_output,
        });
    }

    Ok(ValidatedTransaction {
        total_input,
        total_output,
        fee: total_input - total_output,
    })
}

/// `true` iff [`validate_transaction`] succeeds.
pub fn is_valid_transaction<V>(tx: &Transaction, pool: &UtxoPool, verifier: &V) -> bool
where
    V: SignatureVerifier + ?Sized,
{
    validate_transaction(tx, pool, verifier).is_ok()
}
