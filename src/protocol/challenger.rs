//! Transcript-chained Fiat-Shamir challenger.
//!
//! The challenge for a block is bound to every block verified before it:
//!
//! ```text
//! h1        = SHA-256(T || block)
//! challenge = SHA-256(bytes(x) || h1)
//! update:   T <- SHA-256(T || block)
//! ```
//!
//! Prover and verifier each own a [`ChainChallenger`]. They stay in lockstep only
//! if both fold in the same blocks in the same order; the prover folds a block in
//! once it is sent, the verifier only once its proof has been accepted.

use num_bigint::BigUint;
use sha2::{Digest, Sha256};

/// Challenge output length in bytes.
pub const CHALLENGE_LEN: usize = 32;

/// Number of challenge bits available to select key-vector positions.
pub const CHALLENGE_BITS: usize = CHALLENGE_LEN * 8;

/// Deterministic challenge bytes for one proof.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Challenge([u8; CHALLENGE_LEN]);

impl Challenge {
    /// Wraps raw challenge bytes.
    pub fn new(bytes: [u8; CHALLENGE_LEN]) -> Self {
        Self(bytes)
    }

    /// Returns challenge bit `i`, `(bytes[i / 8] >> (i % 8)) & 1`.
    ///
    /// Bits past [`CHALLENGE_BITS`] read as zero. Prover and verifier refuse key
    /// vectors that long at construction, so this never silently drops a key.
    pub fn bit(&self, i: usize) -> bool {
        self.0
            .get(i / 8)
            .is_some_and(|byte| (byte >> (i % 8)) & 1 == 1)
    }

    /// Returns the raw challenge bytes.
    pub fn as_bytes(&self) -> &[u8; CHALLENGE_LEN] {
        &self.0
    }
}

/// A transcript value computed ahead of time, applied with a single swap.
///
/// Only a [`Challenger`] can create one, so an update can never be assembled from
/// outside the accept path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingUpdate {
    digest: [u8; CHALLENGE_LEN],
}

/// Produces challenges bound to a running transcript.
pub trait Challenger: Send + Sync + 'static {
    /// Derives the challenge for `statement` over `block` without touching the transcript.
    fn challenge(&self, statement: &BigUint, block: &[u8]) -> Challenge;

    /// Computes the transcript value that folding in `block` would produce.
    fn prepare(&self, block: &[u8]) -> PendingUpdate;

    /// Replaces the transcript with a prepared value.
    fn apply(&mut self, update: PendingUpdate);

    /// Current transcript bytes. Empty before the first update.
    fn transcript(&self) -> &[u8];

    /// Number of challenge bits produced per proof.
    fn challenge_bits(&self) -> usize {
        CHALLENGE_BITS
    }

    /// Folds `block` into the transcript.
    fn update(&mut self, block: &[u8]) {
        let pending = self.prepare(block);
        self.apply(pending);
    }
}

/// SHA-256 chained challenger.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChainChallenger {
    chain: Vec<u8>,
}

impl ChainChallenger {
    /// Creates a challenger with an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    fn chain_digest(&self, block: &[u8]) -> [u8; CHALLENGE_LEN] {
        let mut hasher = Sha256::new();
        hasher.update(&self.chain);
        hasher.update(block);
        hasher.finalize().into()
    }
}

impl Challenger for ChainChallenger {
    fn challenge(&self, statement: &BigUint, block: &[u8]) -> Challenge {
        let h1 = self.chain_digest(block);

        let mut hasher = Sha256::new();
        hasher.update(statement.to_bytes_be());
        hasher.update(h1);
        Challenge(hasher.finalize().into())
    }

    fn prepare(&self, block: &[u8]) -> PendingUpdate {
        PendingUpdate {
            digest: self.chain_digest(block),
        }
    }

    fn apply(&mut self, update: PendingUpdate) {
        self.chain = update.digest.to_vec();
    }

    fn transcript(&self) -> &[u8] {
        &self.chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn challenge_is_deterministic() {
        let c1 = ChainChallenger::new();
        let c2 = ChainChallenger::new();
        let x = BigUint::from(12345u32);

        assert_eq!(c1.challenge(&x, b"block"), c2.challenge(&x, b"block"));
    }

    #[test]
    fn challenge_depends_on_statement_and_block() {
        let challenger = ChainChallenger::new();
        let x = BigUint::from(12345u32);
        let base = challenger.challenge(&x, b"block");

        assert_ne!(base, challenger.challenge(&BigUint::from(12346u32), b"block"));
        assert_ne!(base, challenger.challenge(&x, b"blocK"));
    }

    #[test]
    fn challenge_does_not_mutate_transcript() {
        let challenger = ChainChallenger::new();
        let _ = challenger.challenge(&BigUint::from(7u32), b"data");
        assert!(challenger.transcript().is_empty());
    }

    #[test]
    fn update_hashes_previous_chain_with_block() {
        let mut challenger = ChainChallenger::new();
        challenger.update(b"first");
        let expected_first: [u8; 32] = Sha256::digest(b"first").into();
        assert_eq!(challenger.transcript(), &expected_first);

        challenger.update(b"second");
        let mut hasher = Sha256::new();
        hasher.update(expected_first);
        hasher.update(b"second");
        let expected_second: [u8; 32] = hasher.finalize().into();
        assert_eq!(challenger.transcript(), &expected_second);
    }

    #[test]
    fn challenge_matches_published_construction() {
        let mut challenger = ChainChallenger::new();
        challenger.update(b"history");
        let x = BigUint::from(0x0102_0304u32);

        let mut inner = Sha256::new();
        inner.update(challenger.transcript());
        inner.update(b"payload");
        let h1 = inner.finalize();

        let mut outer = Sha256::new();
        outer.update([1u8, 2, 3, 4]);
        outer.update(h1);
        let expected: [u8; 32] = outer.finalize().into();

        assert_eq!(challenger.challenge(&x, b"payload").as_bytes(), &expected);
    }

    #[test]
    fn diverged_transcripts_give_different_challenges() {
        let mut a = ChainChallenger::new();
        let mut b = ChainChallenger::new();
        a.update(b"sent");
        b.update(b"tampered");

        let x = BigUint::from(99u32);
        assert_ne!(a.challenge(&x, b"next"), b.challenge(&x, b"next"));
    }

    #[test]
    fn prepared_update_is_only_applied_on_request() {
        let mut challenger = ChainChallenger::new();
        let pending = challenger.prepare(b"block");
        assert!(challenger.transcript().is_empty());

        challenger.apply(pending);
        assert_eq!(challenger.transcript().len(), CHALLENGE_LEN);
    }

    #[test]
    fn bit_extraction_is_lsb_first_per_byte() {
        let mut bytes = [0u8; CHALLENGE_LEN];
        bytes[0] = 0b0000_0101;
        bytes[1] = 0b1000_0000;
        let challenge = Challenge::new(bytes);

        assert!(challenge.bit(0));
        assert!(!challenge.bit(1));
        assert!(challenge.bit(2));
        assert!(challenge.bit(15));
        assert!(!challenge.bit(8));
        assert!(!challenge.bit(CHALLENGE_BITS));
    }
}
