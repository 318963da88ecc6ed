//! Integration and adversarial test suite for Scrip.
//!
//! The suites under `tests/` drive [`scrip_core::EpochHandler`] end to end
//! with Ed25519-signed transactions, and use proptest to check that ledger
//! invariants hold for randomized batches.

pub mod helpers;
