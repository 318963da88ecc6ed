//! Transaction fee against the live pool.
//!
//! The fee is what a transaction would pay if it were accepted right now.
//! Input values only count while the whole transaction is valid against the
//! pool; an invalid transaction is worth the negation of its outputs. The fee
//! therefore moves as the pool is mutated and is never cached.

use crate::traits::SignatureVerifier;
use crate::types::Transaction;
use crate::utxo_pool::UtxoPool;
use crate::validation::is_valid_transaction;

/// Claimed input value minus output value of `tx` against `pool`.
///
/// Saturates instead of overflowing.
pub fn transaction_fee<V>(tx: &Transaction, pool: &UtxoPool, verifier: &V) -> i64
where
    V: SignatureVerifier + ?Sized,
{
    let valid = is_valid_transaction(tx, pool, verifier);

    let input_sum = tx
        .inputs()
        .iter()
        .filter_map(|input| pool.get(&input.utxo_id()))
        .filter(|_| valid)
        .fold(0i64, |acc, out| acc.saturating_add(out.value));

    let output_sum = tx
        .outputs()
        .iter()
        .fold(0i64, |acc, out| acc.saturating_add(out.value));

    input_sum.saturating_sub(output_sum)
}
