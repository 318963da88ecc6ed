//! Ed25519 signing and verification for transaction inputs.
//!
//! # Signing scheme
//!
//! Each input is signed over a **signing hash** (BLAKE3) that commits to:
//! - All input outpoints (prev tx hash + output index)
//! - All outputs (value + owner key)
//! - The index of the input being signed
//!
//! Signatures are excluded from the signing hash so that inputs can be signed
//! independently and in any order. The transaction hash, by contrast, covers
//! signatures, so signing an input yields a transaction with a new hash.

use ed25519_dalek::{Signer, Verifier};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crate::error::CryptoError;
use crate::traits::SignatureVerifier;
use crate::types::{Hash256, Transaction};

/// Ed25519 keypair for signing transaction inputs.
pub struct KeyPair {
    signing_key: ed25519_dalek::SigningKey,
}

impl KeyPair {
    /// Generate a random keypair using the OS cryptographic RNG.
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng;
        Self {
            signing_key: ed25519_dalek::SigningKey::generate(&mut csprng),
        }
    }

    /// Create a keypair from 32-byte secret key material.
    pub fn from_secret_bytes(bytes: [u8; 32]) -> Self {
        Self {
            signing_key: ed25519_dalek::SigningKey::from_bytes(&bytes),
        }
    }

    /// Raw 32-byte public key, as stored in [`TxOutput::owner`](crate::types::TxOutput::owner).
    pub fn public_key(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Get the raw secret key bytes (32 bytes). Handle with care.
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// Sign a message, returning the raw 64-byte Ed25519 signature.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

impl Clone for KeyPair {
    fn clone(&self) -> Self {
        Self::from_secret_bytes(self.secret_bytes())
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &hex::encode(self.public_key()))
            .finish_non_exhaustive()
    }
}

/// Verify a raw Ed25519 signature against a raw public key.
///
/// Key and signature must be exactly 32 and 64 bytes.
pub fn verify_ed25519(public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
    let pk_bytes: [u8; 32] = public_key
        .try_into()
        .map_err(|_| CryptoError::InvalidPublicKey)?;
    let vk = ed25519_dalek::VerifyingKey::from_bytes(&pk_bytes)
        .map_err(|_| CryptoError::InvalidPublicKey)?;
    let sig_bytes: [u8; 64] = signature
        .try_into()
        .map_err(|_| CryptoError::InvalidSignature)?;
    let sig = ed25519_dalek::Signature::from_bytes(&sig_bytes);
    vk.verify(message, &sig)
        .map_err(|_| CryptoError::VerificationFailed)
}

/// The default signature capability: Ed25519 over raw key bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

impl SignatureVerifier for Ed25519Verifier {
    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
        verify_ed25519(public_key, message, signature).is_ok()
    }
}

/// Remembers another verifier's answers.
///
/// Keyed on the full `(public key, message, signature)` triple, so a cached
/// answer is the one the inner verifier gave for the same bytes. Selection
/// wraps its verifier in one of these for the duration of a call, since the
/// same input is checked again on every path it is explored on.
pub struct CachedVerifier<'a> {
    inner: &'a dyn SignatureVerifier,
    results: Mutex<HashMap<(Vec<u8>, Vec<u8>, Vec<u8>), bool>>,
}

impl<'a> CachedVerifier<'a> {
    pub fn new(inner: &'a dyn SignatureVerifier) -> Self {
        Self {
            inner,
            results: Mutex::new(HashMap::new()),
        }
    }

    /// Number of distinct triples answered so far.
    pub fn cached(&self) -> usize {
        self.results.lock().len()
    }
}

impl SignatureVerifier for CachedVerifier<'_> {
    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
        let key = (public_key.to_vec(), message.to_vec(), signature.to_vec());
        let hit = self.results.lock().get(&key).copied();
        if let Some(ok) = hit {
            return ok;
        }
        // Not under the lock: the inner verifier may unwind.
        let ok = self.inner.verify(public_key, message, signature);
        self.results.lock().insert(key, ok);
        ok
    }
}

impl fmt::Debug for CachedVerifier<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedVerifier")
            .field("cached", &self.cached())
            .finish_non_exhaustive()
    }
}

/// Compute the signing hash for a transaction input.
pub fn signing_hash(tx: &Transaction, input_index: usize) -> Result<Hash256, CryptoError> {
    let inputs = tx.inputs();
    if input_index >= inputs.len() {
        return Err(CryptoError::InputIndexOutOfBounds {
            index: input_index,
            len: inputs.len(),
        });
    }

    let mut data = Vec::new();

    // All input outpoints (no signatures)
    data.extend_from_slice(&(inputs.len() as u64).to_le_bytes());
    for input in inputs {
        data.extend_from_slice(input.prev_tx_hash.as_bytes());
        data.extend_from_slice(&input.output_index.to_le_bytes());
    }

    // All outputs
    data.extend_from_slice(&(tx.outputs().len() as u64).to_le_bytes());
    for output in tx.outputs() {
        data.extend_from_slice(&output.value.to_le_bytes());
        data.extend_from_slice(&(output.owner.len() as u64).to_le_bytes());
        data.extend_from_slice(&output.owner);
    }

    // Input index being signed
    data.extend_from_slice(&(input_index as u64).to_le_bytes());

    Ok(Hash256(blake3::hash(&data).into()))
}

/// Sign one input and return the re-hashed transaction.
///
/// Consumes `tx`: the signed transaction has a different hash, so the old
/// value must not survive as an alias for it.
pub fn sign_transaction_input(
    tx: Transaction,
    input_index: usize,
    keypair: &KeyPair,
) -> Result<Transaction, CryptoError> {
    let sighash = signing_hash(&tx, input_index)?;
    let signature = keypair.sign(sighash.as_bytes());

    let (mut inputs, outputs) = tx.into_parts();
    inputs[input_index].signature = signature.to_vec();
    Ok(Transaction::new(inputs, outputs))
}

/// Verify one input's signature against the owner key of the output it spends.
///
/// A verifier that panics is treated as having answered `false`.
pub fn verify_transaction_input<V>(
    tx: &Transaction,
    input_index: usize,
    owner: &[u8],
    verifier: &V,
) -> Result<(), CryptoError>
where
    V: SignatureVerifier + ?Sized,
{
    let sighash = signing_hash(tx, input_index)?;
    let signature = &tx.inputs()[input_index].signature;
    let verified = panic::catch_unwind(AssertUnwindSafe(|| {
        verifier.verify(owner, sighash.as_bytes(), signature)
    }))
    .unwrap_or(false);
    if verified {
        Ok(())
    } else {
        Err(CryptoError::VerificationFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::COIN;
    use crate::types::{TxInput, TxOutput, UtxoId};

    fn unsigned_tx(kp: &KeyPair) -> Transaction {
        Transaction::new(
            vec![
                TxInput::new(UtxoId::new(Hash256([0x11; 32]), 0)),
                TxInput::new(UtxoId::new(Hash256([0x22; 32]), 1)),
            ],
            vec![TxOutput::new(10 * COIN, kp.public_key())],
        )
    }

    // --- KeyPair ---

    #[test]
    fn keypair_generate_unique() {
        let kp1 = KeyPair::generate();
        let kp2 = KeyPair::generate();
        assert_ne!(kp1.public_key(), kp2.public_key());
    }

    #[test]
    fn keypair_from_secret_deterministic() {
        let kp1 = KeyPair::from_secret_bytes([42u8; 32]);
        let kp2 = KeyPair::from_secret_bytes([42u8; 32]);
        assert_eq!(kp1.public_key(), kp2.public_key());
        assert_eq!(kp1.secret_bytes(), kp2.secret_bytes());
    }

    #[test]
    fn keypair_debug_hides_secret() {
        let kp = KeyPair::generate();
        let debug = format!("{kp:?}");
        assert!(debug.contains("KeyPair"));
        assert!(!debug.contains(&hex::encode(kp.secret_bytes())));
    }

    // --- Raw verification ---

    #[test]
    fn verify_ed25519_accepts_valid_signature() {
        let kp = KeyPair::from_secret_bytes([1; 32]);
        let sig = kp.sign(b"hello scrip");
        assert!(verify_ed25519(&kp.public_key(), b"hello scrip", &sig).is_ok());
    }

    #[test]
    fn verify_ed25519_wrong_message_fails() {
        let kp = KeyPair::from_secret_bytes([1; 32]);
        let sig = kp.sign(b"original");
        assert_eq!(
            verify_ed25519(&kp.public_key(), b"tampered", &sig).unwrap_err(),
            CryptoError::VerificationFailed
        );
    }

    #[test]
    fn verify_ed25519_rejects_short_key_and_signature() {
        let kp = KeyPair::from_secret_bytes([1; 32]);
        let sig = kp.sign(b"m");
        assert_eq!(
            verify_ed25519(&kp.public_key()[..31], b"m", &sig).unwrap_err(),
            CryptoError::InvalidPublicKey
        );
        assert_eq!(
            verify_ed25519(&kp.public_key(), b"m", &sig[..63]).unwrap_err(),
            CryptoError::InvalidSignature
        );
    }

    #[test]
    fn ed25519_verifier_is_boolean() {
        let kp = KeyPair::from_secret_bytes([3; 32]);
        let sig = kp.sign(b"m");
        assert!(Ed25519Verifier.verify(&kp.public_key(), b"m", &sig));
        assert!(!Ed25519Verifier.verify(&[], b"m", &sig));
        assert!(!Ed25519Verifier.verify(&kp.public_key(), b"m", &[]));
    }

    // --- Signing hash ---

    #[test]
    fn signing_hash_depends_on_index() {
        let tx = unsigned_tx(&KeyPair::from_secret_bytes([5; 32]));
        assert_ne!(signing_hash(&tx, 0).unwrap(), signing_hash(&tx, 1).unwrap());
    }

    #[test]
    fn signing_hash_ignores_signatures() {
        let kp = KeyPair::from_secret_bytes([5; 32]);
        let tx = unsigned_tx(&kp);
        let before = signing_hash(&tx, 1).unwrap();
        let signed = sign_transaction_input(tx, 0, &kp).unwrap();
        assert_eq!(signing_hash(&signed, 1).unwrap(), before);
    }

    #[test]
    fn signing_hash_out_of_bounds() {
        let tx = unsigned_tx(&KeyPair::from_secret_bytes([5; 32]));
        assert_eq!(
            signing_hash(&tx, 2).unwrap_err(),
            CryptoError::InputIndexOutOfBounds { index: 2, len: 2 }
        );
    }

    // --- Input signing ---

    #[test]
    fn sign_then_verify_input() {
        let kp = KeyPair::from_secret_bytes([8; 32]);
        let signed = sign_transaction_input(unsigned_tx(&kp), 0, &kp).unwrap();
        assert!(verify_transaction_input(&signed, 0, &kp.public_key(), &Ed25519Verifier).is_ok());
        // Input 1 was never signed.
        assert!(verify_transaction_input(&signed, 1, &kp.public_key(), &Ed25519Verifier).is_err());
    }

    #[test]
    fn signing_changes_transaction_hash() {
        let kp = KeyPair::from_secret_bytes([8; 32]);
        let tx = unsigned_tx(&kp);
        let before = tx.hash();
        let signed = sign_transaction_input(tx, 0, &kp).unwrap();
        assert_ne!(signed.hash(), before);
    }

    #[test]
    fn verify_input_with_wrong_owner_fails() {
        let kp = KeyPair::from_secret_bytes([8; 32]);
        let other = KeyPair::from_secret_bytes([9; 32]);
        let signed = sign_transaction_input(unsigned_tx(&kp), 0, &kp).unwrap();
        assert_eq!(
            verify_transaction_input(&signed, 0, &other.public_key(), &Ed25519Verifier).unwrap_err(),
            CryptoError::VerificationFailed
        );
    }

    #[test]
    fn sign_out_of_bounds_input_fails() {
        let kp = KeyPair::from_secret_bytes([8; 32]);
        assert!(sign_transaction_input(unsigned_tx(&kp), 5, &kp).is_err());
    }

    #[test]
    fn panicking_verifier_counts_as_failure() {
        let kp = KeyPair::from_secret_bytes([8; 32]);
        let signed = sign_transaction_input(unsigned_tx(&kp), 0, &kp).unwrap();
        let explode = |_: &[u8], _: &[u8], _: &[u8]| -> bool { panic!("verifier crashed") };
        assert_eq!(
            verify_transaction_input(&signed, 0, &kp.public_key(), &explode).unwrap_err(),
            CryptoError::VerificationFailed
        );
    }

    // --- Cached verification ---

    #[test]
    fn cached_verifier_asks_inner_once_per_triple() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let calls = AtomicUsize::new(0);
        let counting = |k: &[u8], _: &[u8], _: &[u8]| {
            calls.fetch_add(1, Ordering::Relaxed);
            k == b"good"
        };
        let cached = CachedVerifier::new(&counting);

        for _ in 0..3 {
            assert!(cached.verify(b"good", b"m", b"s"));
            assert!(!cached.verify(b"bad", b"m", b"s"));
        }
        assert!(cached.verify(b"good", b"other", b"s"));

        assert_eq!(calls.load(Ordering::Relaxed), 3);
        assert_eq!(cached.cached(), 3);
    }

    #[test]
    fn cached_verifier_does_not_remember_a_panic() {
        let explode = |_: &[u8], _: &[u8], _: &[u8]| -> bool { panic!("verifier crashed") };
        let cached = CachedVerifier::new(&explode);
        let kp = KeyPair::from_secret_bytes([8; 32]);
        let signed = sign_transaction_input(unsigned_tx(&kp), 0, &kp).unwrap();

        assert!(verify_transaction_input(&signed, 0, &kp.public_key(), &cached).is_err());
        assert_eq!(cached.cached(), 0);
    }
}
