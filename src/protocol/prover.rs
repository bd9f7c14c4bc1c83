use num_bigint::BigUint;
use rand_core::CryptoRngCore;

use super::challenger::{ChainChallenger, Challenger};
use super::{PrivateKey, Proof};
use crate::groups::MultiplicativeGroup;
use crate::{Error, Result};

/// Prover for the chained Feige-Fiat-Shamir NIZK.
///
/// Proves knowledge of the square roots `{s_i}` of the public vector `{v_i}`
/// for each block it sends, with the challenge bound to the transcript of all
/// previously sent blocks.
///
/// # Security
///
/// - The randomness `r` passed to [`prove`](Self::prove) must be freshly sampled
///   for every call. Two proofs under one `r` with different challenges reveal
///   a product of secrets.
/// - Call [`update`](Self::update) exactly once per sent block, in send order.
pub struct FfsProver<G: MultiplicativeGroup, C: Challenger = ChainChallenger> {
    group: G,
    private: PrivateKey,
    challenger: C,
}

impl<G: MultiplicativeGroup> FfsProver<G> {
    /// Creates a prover with a fresh [`ChainChallenger`].
    pub fn new(group: G, private: PrivateKey) -> Result<Self> {
        Self::with_challenger(group, private, ChainChallenger::new())
    }
}

impl<G: MultiplicativeGroup, C: Challenger> FfsProver<G, C> {
    /// Creates a prover around an existing challenger.
    ///
    /// # Errors
    ///
    /// - [`Error::ChallengeExhausted`] if the key vector is longer than the
    ///   challenger's bit output
    /// - [`Error::InvalidParams`] if a secret is not a member of `group`
    pub fn with_challenger(group: G, private: PrivateKey, challenger: C) -> Result<Self> {
        let available = challenger.challenge_bits();
        if private.len() > available {
            return Err(Error::ChallengeExhausted {
                k: private.len(),
                available,
            });
        }

        if let Some(i) = private.secrets().iter().position(|s| !group.in_group(s)) {
            return Err(Error::InvalidParams(format!(
                "private key element {i} is not a group member"
            )));
        }

        Ok(Self {
            group,
            private,
            challenger,
        })
    }

    /// Returns the group.
    pub fn group(&self) -> &G {
        &self.group
    }

    /// Returns the challenger.
    pub fn challenger(&self) -> &C {
        &self.challenger
    }

    /// Samples fresh proof randomness from the group.
    pub fn sample_randomness<R: CryptoRngCore>(&self, rng: &mut R) -> Result<BigUint> {
        self.group.random_element(rng)
    }

    /// Generates a proof for `block` under randomness `r`.
    ///
    /// The transcript is not modified.
    pub fn prove(&self, randomness: &BigUint, block: &[u8]) -> Proof {
        let ring = self.group.ring();

        let statement = ring.square(randomness);
        let challenge = self.challenger.challenge(&statement, block);

        let mut response = ring.reduce(randomness);
        for (i, secret) in self.private.secrets().iter().enumerate() {
            if challenge.bit(i) {
                response = ring.mul(&response, secret);
            }
        }

        Proof::new(statement, response)
    }

    /// Samples randomness and proves `block` in one step.
    pub fn prove_with_rng<R: CryptoRngCore>(&self, rng: &mut R, block: &[u8]) -> Result<Proof> {
        let randomness = self.sample_randomness(rng)?;
        Ok(self.prove(&randomness, block))
    }

    /// Folds a sent block into the transcript.
    pub fn update(&mut self, block: &[u8]) {
        self.challenger.update(block);
    }
}
