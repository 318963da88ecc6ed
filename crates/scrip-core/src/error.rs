//! Error types for the Scrip ledger.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("unknown UTXO: {0}")] UnknownUtxo(String),
    #[error("invalid signature on input {index}")] InvalidSignature { index: usize },
    #[error("duplicate input: {0}")] DuplicateInput(String),
    #[error("negative value on output {0}")] NegativeOutput(usize),
    #[error("insufficient funds: have {have}, need {need}")] InsufficientFunds { have: i64, need: i64 },
    #[error("value overflow")] ValueOverflow,
    #[error("dependency cycle through {0}")] DependencyCycle(String),
    #[error("dependency chain deeper than {max}")] DependencyTooDeep { max: usize },
    #[error("cannot apply: {0}")] Apply(#[from] PoolError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid public key bytes")] InvalidPublicKey,
    #[error("invalid signature bytes")] InvalidSignature,
    #[error("signature verification failed")] VerificationFailed,
    #[error("input index out of bounds: {index} >= {len}")] InputIndexOutOfBounds { index: usize, len: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("duplicate UTXO in snapshot: {0}")] DuplicateUtxo(String),
    #[error("negative value {value} for UTXO {utxo}")] NegativeValue { utxo: String, value: i64 },
    #[error("missing UTXO: {0}")] MissingUtxo(String),
    #[error("output already exists: {0}")] OutputExists(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config source: {0}")] Source(#[from] config::ConfigError),
    #[error("invalid value for {field}: {reason}")] Invalid { field: &'static str, reason: String },
}

#[derive(Error, Debug)]
pub enum ScripError {
    #[error(transparent)] Transaction(#[from] TransactionError),
    #[error(transparent)] Crypto(#[from] CryptoError),
    #[error(transparent)] Pool(#[from] PoolError),
    #[error(transparent)] Config(#[from] ConfigError),
}
