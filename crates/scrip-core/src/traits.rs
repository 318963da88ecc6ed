//! Trait seams of the ledger:
//! - [`SignatureVerifier`]: the signature capability the validator consumes
//! - [`SelectionStrategy`]: how an epoch picks its accepted subset

use crate::types::Transaction;
use crate::utxo_pool::UtxoPool;

/// Pure signature check over raw bytes.
///
/// Any failure is reported as `false`. A panic inside `verify` is caught by
/// [`verify_transaction_input`](crate::crypto::verify_transaction_input) and
/// counts as `false` too. Any `Fn(&[u8], &[u8], &[u8]) -> bool` closure is a
/// verifier.
pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> bool;
}

impl<F> SignatureVerifier for F
where
    F: Fn(&[u8], &[u8], &[u8]) -> bool + Send + Sync,
{
    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
        self(public_key, message, signature)
    }
}

/// Batch selection policy for one epoch.
///
/// A strategy receives exclusive access to the pool for the duration of the
/// call, applies every transaction it accepts, and returns the accepted
/// transactions in acceptance order. Each candidate is accepted or rejected at
/// most once per call.
pub trait SelectionStrategy: Send + Sync {
    /// Short stable name used in logs.
    fn name(&self) -> &'static str;

    fn select(
        &self,
        candidates: &[Transaction],
        pool: &mut UtxoPool,
        verifier: &dyn SignatureVerifier,
    ) -> Vec<Transaction>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency_chain::DependencyChainStrategy;
    use crate::fee_maximizing::FeeMaximizingStrategy;

    fn _assert_verifier_object_safe(v: &dyn SignatureVerifier) {
        let _ = v;
    }

    fn _assert_strategy_object_safe(s: &dyn SelectionStrategy) {
        let _ = s;
    }

    #[test]
    fn closure_is_a_verifier() {
        let accept_all = |_: &[u8], _: &[u8], _: &[u8]| true;
        let reject_all = |_: &[u8], _: &[u8], _: &[u8]| false;
        assert!(accept_all.verify(b"k", b"m", b"s"));
        assert!(!reject_all.verify(b"k", b"m", b"s"));
    }

    #[test]
    fn closure_sees_arguments_in_order() {
        let check = |k: &[u8], m: &[u8], s: &[u8]| k == b"key" && m == b"msg" && s == b"sig";
        assert!(check.verify(b"key", b"msg", b"sig"));
        assert!(!check.verify(b"msg", b"key", b"sig"));
    }

    #[test]
    fn strategies_are_boxable() {
        let strategies: Vec<Box<dyn SelectionStrategy>> = vec![
            Box::new(DependencyChainStrategy::default()),
            Box::new(FeeMaximizingStrategy),
        ];
        let names: Vec<_> = strategies.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["dependency_chain", "fee_maximizing"]);
    }
}
