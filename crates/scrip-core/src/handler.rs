//! Epoch handler.
//!
//! [`EpochHandler`] owns the UTXO pool between epochs. Each call to
//! [`EpochHandler::handle_epoch`] runs the configured selection strategy over
//! one batch of candidates and permanently applies what it accepts.

use std::fmt;

use tracing::info;

use crate::config::EpochConfig;
use crate::crypto::Ed25519Verifier;
use crate::dependency_chain::DependencyChainStrategy;
use crate::error::{ConfigError, ScripError};
use crate::fee::transaction_fee;
use crate::traits::{SelectionStrategy, SignatureVerifier};
use crate::types::{Transaction, TxOutput, UtxoId};
use crate::utxo_pool::UtxoPool;
use crate::validation::is_valid_transaction;

/// Runs epochs against an exclusively owned pool.
pub struct EpochHandler {
    pool: UtxoPool,
    strategy: Box<dyn SelectionStrategy>,
    verifier: Box<dyn SignatureVerifier>,
    epoch: u64,
}

impl EpochHandler {
    /// Handler with the dependency-chain strategy and Ed25519 signatures.
    pub fn new(pool: UtxoPool) -> Self {
        Self::with_strategy(pool, Box::new(DependencyChainStrategy::default()))
    }

    pub fn with_strategy(pool: UtxoPool, strategy: Box<dyn SelectionStrategy>) -> Self {
        Self {
            pool,
            strategy,
            verifier: Box::new(Ed25519Verifier),
            epoch: 0,
        }
    }

    pub fn from_config(pool: UtxoPool, config: &EpochConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_strategy(pool, config.build_strategy()))
    }

    /// Build the pool from a snapshot, failing fast on a malformed one.
    pub fn from_snapshot<I>(entries: I, config: &EpochConfig) -> Result<Self, ScripError>
    where
        I: IntoIterator<Item = (UtxoId, TxOutput)>,
    {
        let pool = UtxoPool::from_entries(entries)?;
        Ok(Self::from_config(pool, config)?)
    }

    /// Replace the signature verifier.
    pub fn with_verifier(mut self, verifier: impl SignatureVerifier + 'static) -> Self {
        self.verifier = Box::new(verifier);
        self
    }

    /// Run one epoch over `candidates`.
    ///
    /// Returns the accepted transactions in acceptance order. Every accepted
    /// transaction has been applied to the pool when this returns.
    pub fn handle_epoch(&mut self, candidates: &[Transaction]) -> Vec<Transaction> {
        self.epoch += 1;
        let before = self.pool.total_value();

        let accepted = self
            .strategy
            .select(candidates, &mut self.pool, self.verifier.as_ref());

        let fees = before
            .zip(self.pool.total_value())
            .map(|(before, after)| before.saturating_sub(after));
        info!(
            epoch = self.epoch,
            strategy = self.strategy.name(),
            candidates = candidates.len(),
            accepted = accepted.len(),
            ?fees,
            "epoch handled"
        );

        accepted
    }

    /// Whether `tx` is valid against the current pool.
    pub fn is_valid(&self, tx: &Transaction) -> bool {
        is_valid_transaction(tx, &self.pool, self.verifier.as_ref())
    }

    /// Fee of `tx` against the current pool.
    pub fn fee(&self, tx: &Transaction) -> i64 {
        transaction_fee(tx, &self.pool, self.verifier.as_ref())
    }

    pub fn pool(&self) -> &UtxoPool {
        &self.pool
    }

    pub fn into_pool(self) -> UtxoPool {
        self.pool
    }

    /// Number of epochs handled so far.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }
}

impl fmt::Debug for EpochHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EpochHandler")
            .field("epoch", &self.epoch)
            .field("strategy", &self.strategy.name())
            .field("utxos", &self.pool.len())
            .finish()
    }
}
