//! Core ledger types: hashes, UTXO identities, inputs, outputs, transactions.
//!
//! All monetary values are signed fixed-point units (1 coin = 10^8 units).
//! Values are signed so that a negative amount from an untrusted source can be
//! represented and rejected by validation rather than by the type system.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte hash value.
///
/// Used for transaction hashes (BLAKE3) and signing payloads.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    /// Create a Hash256 from a byte array.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Hash256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Identity of a spendable output: the producing transaction's hash plus the
/// output's position in that transaction.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
pub struct UtxoId {
    /// Hash of the transaction that created the output.
    pub tx_hash: Hash256,
    /// Index of the output within that transaction.
    pub index: u32,
}

impl UtxoId {
    pub fn new(tx_hash: Hash256, index: u32) -> Self {
        Self { tx_hash, index }
    }
}

impl fmt::Display for UtxoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tx_hash, self.index)
    }
}

/// A transaction input, claiming a previous output.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TxInput {
    /// Hash of the transaction whose output is being spent.
    pub prev_tx_hash: Hash256,
    /// Index of the spent output within that transaction.
    pub output_index: u32,
    /// Signature over the signing payload for this input's position.
    /// Empty until signed.
    pub signature: Vec<u8>,
}

impl TxInput {
    /// An unsigned input claiming `utxo`.
    pub fn new(utxo: UtxoId) -> Self {
        Self {
            prev_tx_hash: utxo.tx_hash,
            output_index: utxo.index,
            signature: Vec::new(),
        }
    }

    /// The pool key this input claims.
    pub fn utxo_id(&self) -> UtxoId {
        UtxoId::new(self.prev_tx_hash, self.output_index)
    }
}

/// A transaction output, creating a new UTXO.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TxOutput {
    /// Value in units. Must be non-negative to pass validation.
    pub value: i64,
    /// Raw public key of the owner allowed to spend this output.
    pub owner: Vec<u8>,
}

impl TxOutput {
    pub fn new(value: i64, owner: impl Into<Vec<u8>>) -> Self {
        Self {
            value,
            owner: owner.into(),
        }
    }
}

/// A transaction transferring value between owners.
///
/// The hash is fixed when the value is constructed and never recomputed:
/// it keys the outputs this transaction creates and identifies it within a
/// batch. Fields are read-only so the hash cannot drift from the content it
/// was derived from.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Transaction {
    hash: Hash256,
    inputs: Vec<TxInput>,
    outputs: Vec<TxOutput>,
}

impl Transaction {
    /// Build a transaction whose hash is the BLAKE3 content hash of its
    /// inputs (signatures included) and outputs.
    pub fn new(inputs: Vec<TxInput>, outputs: Vec<TxOutput>) -> Self {
        let hash = content_hash(&inputs, &outputs);
        Self {
            hash,
            inputs,
            outputs,
        }
    }

    /// Build a transaction with an externally supplied identity.
    ///
    /// The hash is trusted as given; it is not checked against the content.
    pub fn from_parts(hash: Hash256, inputs: Vec<TxInput>, outputs: Vec<TxOutput>) -> Self {
        Self {
            hash,
            inputs,
            outputs,
        }
    }

    pub fn hash(&self) -> Hash256 {
        self.hash
    }

    pub fn inputs(&self) -> &[TxInput] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[TxOutput] {
        &self.outputs
    }

    /// Take the inputs and outputs back, dropping the hash.
    pub fn into_parts(self) -> (Vec<TxInput>, Vec<TxOutput>) {
        (self.inputs, self.outputs)
    }

    /// Identity of the `index`-th output this transaction creates.
    pub fn output_id(&self, index: u32) -> UtxoId {
        UtxoId::new(self.hash, index)
    }

    /// Sum of all output values. Returns None on overflow.
    pub fn total_output_value(&self) -> Option<i64> {
        self.outputs
            .iter()
            .try_fold(0i64, |acc, out| acc.checked_add(out.value))
    }
}

/// BLAKE3 over a fixed byte layout:
/// `n_inputs || (prev_hash || index || sig_len || sig)* || n_outputs || (value || owner_len || owner)*`,
/// integers little-endian.
fn content_hash(inputs: &[TxInput], outputs: &[TxOutput]) -> Hash256 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(inputs.len() as u64).to_le_bytes());
    for input in inputs {
        hasher.update(input.prev_tx_hash.as_bytes());
        hasher.update(&input.output_index.to_le_bytes());
        hasher.update(&(input.signature.len() as u64).to_le_bytes());
        hasher.update(&input.signature);
    }
    hasher.update(&(outputs.len() as u64).to_le_bytes());
    for output in outputs {
        hasher.update(&output.value.to_le_bytes());
        hasher.update(&(output.owner.len() as u64).to_le_bytes());
        hasher.update(&output.owner);
    }
    Hash256(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::COIN;

    fn sample_tx() -> Transaction {
        Transaction::new(
            vec![TxInput {
                prev_tx_hash: Hash256([0x11; 32]),
                output_index: 0,
                signature: vec![0u8; 64],
            }],
            vec![TxOutput::new(50 * COIN, vec![0xAA; 32])],
        )
    }

    // --- Hash256 ---

    #[test]
    fn hash256_display_hex() {
        let h = Hash256([0xAB; 32]);
        let s = format!("{h}");
        assert_eq!(s.len(), 64);
        assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(&s[0..2], "ab");
    }

    #[test]
    fn hash256_from_bytes() {
        let bytes = [42u8; 32];
        let h = Hash256::from_bytes(bytes);
        assert_eq!(h.as_bytes(), &bytes);
        assert_eq!(Hash256::from(bytes), h);
    }

    // --- UtxoId ---

    #[test]
    fn utxo_id_equality_is_by_value() {
        let a = UtxoId::new(Hash256([1; 32]), 3);
        let b = UtxoId::new(Hash256([1; 32]), 3);
        assert_eq!(a, b);
        assert_ne!(a, UtxoId::new(Hash256([1; 32]), 4));

        let mut set = std::collections::HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn utxo_id_display() {
        let id = UtxoId::new(Hash256([0xFF; 32]), 3);
        assert!(format!("{id}").ends_with(":3"));
    }

    #[test]
    fn input_points_at_its_utxo() {
        let id = UtxoId::new(Hash256([7; 32]), 2);
        let input = TxInput::new(id);
        assert_eq!(input.utxo_id(), id);
        assert!(input.signature.is_empty());
    }

    // --- Transaction ---

    #[test]
    fn hash_deterministic() {
        assert_eq!(sample_tx().hash(), sample_tx().hash());
    }

    #[test]
    fn hash_covers_signatures() {
        let tx = sample_tx();
        let (mut inputs, outputs) = tx.clone().into_parts();
        inputs[0].signature[0] ^= 1;
        assert_ne!(tx.hash(), Transaction::new(inputs, outputs).hash());
    }

    #[test]
    fn hash_covers_outputs() {
        let tx = sample_tx();
        let (inputs, mut outputs) = tx.clone().into_parts();
        outputs[0].value += 1;
        assert_ne!(tx.hash(), Transaction::new(inputs, outputs).hash());
    }

    #[test]
    fn from_parts_keeps_supplied_hash() {
        let tx = Transaction::from_parts(Hash256([9; 32]), vec![], vec![]);
        assert_eq!(tx.hash(), Hash256([9; 32]));
        assert_eq!(tx.output_id(1), UtxoId::new(Hash256([9; 32]), 1));
    }

    #[test]
    fn total_output_value_sums_correctly() {
        let tx = Transaction::new(
            vec![],
            vec![
                TxOutput::new(100, vec![]),
                TxOutput::new(200, vec![]),
                TxOutput::new(-50, vec![]),
            ],
        );
        assert_eq!(tx.total_output_value(), Some(250));
    }

    #[test]
    fn total_output_value_overflow_returns_none() {
        let tx = Transaction::new(
            vec![],
            vec![TxOutput::new(i64::MAX, vec![]), TxOutput::new(1, vec![])],
        );
        assert_eq!(tx.total_output_value(), None);
    }

    #[test]
    fn serde_json_preserves_hash() {
        let tx = sample_tx();
        let json = serde_json::to_string(&tx).unwrap();
        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(back.hash(), tx.hash());
        assert_eq!(back, tx);
    }
}
