//! Shared builders for the integration suites.

use scrip_core::crypto::{sign_transaction_input, KeyPair};
use scrip_core::types::{Hash256, Transaction, TxInput, TxOutput, UtxoId};
use scrip_core::UtxoPool;
use tracing_subscriber::EnvFilter;

/// Hash of the synthetic transaction that funds every test pool.
pub const GENESIS: Hash256 = Hash256([0x01; 32]);

/// Install a test-writer subscriber filtered by `RUST_LOG`. Safe to call
/// from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Deterministic keypair from a seed byte.
pub fn keypair(seed: u8) -> KeyPair {
    KeyPair::from_secret_bytes([seed; 32])
}

pub fn genesis_id(index: u32) -> UtxoId {
    UtxoId::new(GENESIS, index)
}

/// Pool holding one genesis output per value, all owned by `owner`.
pub fn funded_pool(owner: &KeyPair, values: &[i64]) -> UtxoPool {
    UtxoPool::from_entries(values.iter().enumerate().map(|(i, v)| {
        (genesis_id(i as u32), TxOutput::new(*v, owner.public_key()))
    }))
    .expect("genesis values are non-negative")
}

/// Transaction spending `inputs`, paying every output to `signer`, with
/// every input signed by `signer`.
pub fn signed_spend(signer: &KeyPair, inputs: &[UtxoId], outputs: &[i64]) -> Transaction {
    pay_to(signer, inputs, &outputs.iter().map(|v| (*v, signer)).collect::<Vec<_>>())
}

/// Transaction spending `inputs` with explicit recipients, signed by `signer`.
pub fn pay_to(signer: &KeyPair, inputs: &[UtxoId], outputs: &[(i64, &KeyPair)]) -> Transaction {
    let mut tx = Transaction::new(
        inputs.iter().map(|id| TxInput::new(*id)).collect(),
        outputs
            .iter()
            .map(|(v, to)| TxOutput::new(*v, to.public_key()))
            .collect(),
    );
    for i in 0..inputs.len() {
        tx = sign_transaction_input(tx, i, signer).expect("input index in range");
    }
    tx
}

/// `len` transactions, each spending output 0 of the previous one and
/// paying `step` in fees, starting from `from`. Returned in spend order.
pub fn spend_chain(signer: &KeyPair, from: UtxoId, value: i64, step: i64, len: usize) -> Vec<Transaction> {
    let mut chain = Vec::with_capacity(len);
    let mut from = from;
    let mut value = value;
    for _ in 0..len {
        value -= step;
        let tx = signed_spend(signer, &[from], &[value]);
        from = tx.output_id(0);
        chain.push(tx);
    }
    chain
}

pub fn hashes(txs: &[Transaction]) -> Vec<Hash256> {
    txs.iter().map(|tx| tx.hash()).collect()
}
