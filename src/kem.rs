//! Per-message key encapsulation and authenticated encryption.
//!
//! Every message gets a fresh 32-byte capsule. The symmetric key is
//! `SHA-256(capsule || master)`, used once with ChaCha20-Poly1305:
//!
//! ```text
//! capsule    <- 32 random bytes
//! key         = SHA-256(capsule || master_secret)
//! nonce      <- 12 random bytes
//! ciphertext  = ChaCha20-Poly1305(key, nonce, plaintext) || tag
//! ```
//!
//! Capsule and nonce travel in the clear. The master secret never leaves the process.

use core::fmt::{self, Debug};

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand_core::CryptoRngCore;
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{Error, Result};

/// Capsule length in bytes.
pub const CAPSULE_LEN: usize = 32;

/// AEAD nonce length in bytes.
pub const AEAD_NONCE_LEN: usize = 12;

/// AEAD authentication tag length in bytes.
pub const AEAD_TAG_LEN: usize = 16;

/// Derived symmetric key length in bytes.
pub const SESSION_KEY_LEN: usize = 32;

/// Long-lived shared secret feeding the key deriver.
///
/// Zeroized on drop and never printed.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterSecret(Vec<u8>);

impl MasterSecret {
    /// Wraps raw secret bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParams`] for an empty secret.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(Error::InvalidParams(
                "master secret must not be empty".to_string(),
            ));
        }
        Ok(Self(bytes))
    }

    /// Generates `len` random bytes of master secret.
    pub fn generate<R: CryptoRngCore>(rng: &mut R, len: usize) -> Result<Self> {
        let mut bytes = vec![0u8; len];
        rng.try_fill_bytes(&mut bytes)?;
        Self::new(bytes)
    }

    /// Exposes the secret bytes.
    pub fn expose(&self) -> &[u8] {
        &self.0
    }
}

impl Debug for MasterSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterSecret(<redacted>)")
    }
}

/// Single-use symmetric key.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SessionKey([u8; SESSION_KEY_LEN]);

impl SessionKey {
    /// Wraps derived key bytes.
    pub fn new(bytes: [u8; SESSION_KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Returns the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; SESSION_KEY_LEN] {
        &self.0
    }
}

/// Turns a capsule into a symmetric key.
pub trait Deriver: Send + Sync + 'static {
    /// Derives the key for `capsule`.
    fn derive(&self, capsule: &[u8; CAPSULE_LEN]) -> SessionKey;
}

/// Deriver computing `SHA-256(capsule || master)`.
#[derive(Clone, Debug)]
pub struct Sha256Deriver {
    master: MasterSecret,
}

impl Sha256Deriver {
    /// Creates a deriver bound to `master`.
    pub fn new(master: MasterSecret) -> Self {
        Self { master }
    }
}

impl Deriver for Sha256Deriver {
    fn derive(&self, capsule: &[u8; CAPSULE_LEN]) -> SessionKey {
        let mut hasher = Sha256::new();
        hasher.update(capsule);
        hasher.update(self.master.expose());
        SessionKey(hasher.finalize().into())
    }
}

/// Output of [`Encapsulator::encapsulate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sealed {
    /// Ciphertext with the authentication tag appended.
    pub ciphertext: Vec<u8>,
    /// Key-encapsulating randomness.
    pub capsule: [u8; CAPSULE_LEN],
    /// AEAD nonce.
    pub nonce: [u8; AEAD_NONCE_LEN],
}

/// Key-encapsulating AEAD.
#[derive(Clone, Debug)]
pub struct Encapsulator<D: Deriver = Sha256Deriver> {
    deriver: D,
}

impl Encapsulator {
    /// Creates an encapsulator using the SHA-256 deriver over `master`.
    pub fn new(master: MasterSecret) -> Self {
        Self::with_deriver(Sha256Deriver::new(master))
    }
}

impl<D: Deriver> Encapsulator<D> {
    /// Creates an encapsulator around a custom deriver.
    pub fn with_deriver(deriver: D) -> Self {
        Self { deriver }
    }

    /// Encrypts `plaintext` under a freshly encapsulated key.
    ///
    /// # Errors
    ///
    /// - [`Error::Entropy`] if capsule or nonce sampling fails
    /// - [`Error::InvalidParams`] if `plaintext` is too long for one AEAD message
    pub fn encapsulate<R: CryptoRngCore>(&self, rng: &mut R, plaintext: &[u8]) -> Result<Sealed> {
        let mut capsule = [0u8; CAPSULE_LEN];
        rng.try_fill_bytes(&mut capsule)?;
        let mut nonce = [0u8; AEAD_NONCE_LEN];
        rng.try_fill_bytes(&mut nonce)?;

        let key = self.deriver.derive(&capsule);
        let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));

        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|_| {
                Error::InvalidParams(format!(
                    "plaintext of {} bytes exceeds the AEAD message limit",
                    plaintext.len()
                ))
            })?;

        Ok(Sealed {
            ciphertext,
            capsule,
            nonce,
        })
    }

    /// Decrypts `ciphertext` with the key encapsulated in `capsule`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Authentication`] if the tag does not verify or any input
    /// has the wrong length. No partial plaintext is ever returned.
    pub fn decrypt(&self, ciphertext: &[u8], capsule: &[u8], nonce: &[u8]) -> Result<Vec<u8>> {
        let capsule: &[u8; CAPSULE_LEN] =
            capsule.try_into().map_err(|_| Error::Authentication)?;
        if nonce.len() != AEAD_NONCE_LEN || ciphertext.len() < AEAD_TAG_LEN {
            return Err(Error::Authentication);
        }

        let key = self.deriver.derive(capsule);
        let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));

        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| Error::Authentication)
    }

    /// Decrypts a [`Sealed`] value.
    pub fn open(&self, sealed: &Sealed) -> Result<Vec<u8>> {
        self.decrypt(&sealed.ciphertext, &sealed.capsule, &sealed.nonce)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SecureRng;

    fn encapsulator(secret: &[u8]) -> Encapsulator {
        Encapsulator::new(MasterSecret::new(secret).unwrap())
    }

    #[test]
    fn encapsulate_then_decrypt() {
        let kem = encapsulator(b"secret");
        let mut rng = SecureRng::new();
        let text = b"the quick brown fox jumped over the lazy dog";

        let sealed = kem.encapsulate(&mut rng, text).unwrap();
        assert_eq!(sealed.ciphertext.len(), text.len() + AEAD_TAG_LEN);
        assert_eq!(kem.open(&sealed).unwrap(), text);
    }

    #[test]
    fn empty_plaintext_is_supported() {
        let kem = encapsulator(b"secret");
        let mut rng = SecureRng::new();

        let sealed = kem.encapsulate(&mut rng, b"").unwrap();
        assert!(kem.open(&sealed).unwrap().is_empty());
    }

    #[test]
    fn every_bit_flip_is_detected() {
        let kem = encapsulator(b"secret");
        let mut rng = SecureRng::new();
        let sealed = kem.encapsulate(&mut rng, b"tamper me").unwrap();

        for byte in 0..sealed.ciphertext.len() {
            for bit in 0..8 {
                let mut tampered = sealed.clone();
                tampered.ciphertext[byte] ^= 1 << bit;
                assert!(matches!(kem.open(&tampered), Err(Error::Authentication)));
            }
        }
    }

    #[test]
    fn tampered_capsule_or_nonce_fails() {
        let kem = encapsulator(b"secret");
        let mut rng = SecureRng::new();
        let sealed = kem.encapsulate(&mut rng, b"payload").unwrap();

        let mut bad_capsule = sealed.clone();
        bad_capsule.capsule[0] ^= 1;
        assert!(kem.open(&bad_capsule).is_err());

        let mut bad_nonce = sealed.clone();
        bad_nonce.nonce[11] ^= 0x80;
        assert!(kem.open(&bad_nonce).is_err());
    }

    #[test]
    fn wrong_master_secret_fails() {
        let mut rng = SecureRng::new();
        let sealed = encapsulator(b"secret").encapsulate(&mut rng, b"payload").unwrap();
        assert!(matches!(
            encapsulator(b"other").open(&sealed),
            Err(Error::Authentication)
        ));
    }

    #[test]
    fn malformed_inputs_fail_authentication() {
        let kem = encapsulator(b"secret");
        assert!(matches!(
            kem.decrypt(&[0u8; 32], &[0u8; 31], &[0u8; AEAD_NONCE_LEN]),
            Err(Error::Authentication)
        ));
        assert!(matches!(
            kem.decrypt(&[0u8; 32], &[0u8; CAPSULE_LEN], &[0u8; 8]),
            Err(Error::Authentication)
        ));
        assert!(matches!(
            kem.decrypt(&[0u8; 4], &[0u8; CAPSULE_LEN], &[0u8; AEAD_NONCE_LEN]),
            Err(Error::Authentication)
        ));
    }

    #[test]
    fn capsules_are_fresh_per_message() {
        let kem = encapsulator(b"secret");
        let mut rng = SecureRng::new();

        let a = kem.encapsulate(&mut rng, b"same").unwrap();
        let b = kem.encapsulate(&mut rng, b"same").unwrap();
        assert_ne!(a.capsule, b.capsule);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn derivation_is_hash_of_capsule_then_master() {
        let deriver = Sha256Deriver::new(MasterSecret::new(b"secret".to_vec()).unwrap());
        let capsule = [7u8; CAPSULE_LEN];

        let mut hasher = Sha256::new();
        hasher.update(capsule);
        hasher.update(b"secret");
        let expected: [u8; 32] = hasher.finalize().into();

        assert_eq!(deriver.derive(&capsule).as_bytes(), &expected);
    }

    #[test]
    fn empty_master_secret_rejected() {
        assert!(MasterSecret::new(Vec::new()).is_err());
    }
}
