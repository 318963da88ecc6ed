//! # scrip-core
//! Transaction validation, UTXO pool and per-epoch batch selection for Scrip.
//!
//! - [`validation`]: the five acceptance rules for a single transaction
//! - [`fee`]: net value of a transaction against the live pool
//! - [`dependency_chain`] / [`fee_maximizing`]: batch selection strategies
//! - [`handler::EpochHandler`]: owns the pool and runs one epoch at a time

pub mod config;
pub mod constants;
pub mod crypto;
pub mod dependency_chain;
pub mod error;
pub mod fee;
pub mod fee_maximizing;
pub mod handler;
pub mod traits;
pub mod types;
pub mod utxo_pool;
pub mod validation;

pub use config::{EpochConfig, StrategyKind};
pub use handler::EpochHandler;
pub use utxo_pool::UtxoPool;
