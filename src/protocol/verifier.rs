use num_bigint::BigUint;
use subtle::ConstantTimeEq;

use super::challenger::{ChainChallenger, Challenger, PendingUpdate};
use super::{Proof, PublicKey};
use crate::groups::{ModulusGroup, MultiplicativeGroup};
use crate::{Error, Result};

/// Proof of a successful check, redeemable once through [`FfsVerifier::commit`].
///
/// Carries the already-computed transcript value, so committing is a single swap
/// and a rejected block has no way to reach the transcript.
#[derive(Debug)]
#[must_use = "an accepted block must be committed to keep the transcript in sync"]
pub struct Acceptance {
    pending: PendingUpdate,
}

/// Outcome of checking one proof.
#[derive(Debug)]
pub enum Verdict {
    /// The proof is valid for this block and transcript.
    Accepted(Acceptance),
    /// The proof is invalid. The transcript must not advance.
    Rejected,
}

impl Verdict {
    /// Returns `true` for [`Verdict::Accepted`].
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted(_))
    }
}

/// Verifier for the chained Feige-Fiat-Shamir NIZK.
///
/// Holds only the modulus and the public key vector. The transcript advances
/// exclusively through [`commit`](Self::commit), which requires an
/// [`Acceptance`] produced by a successful [`check`](Self::check).
pub struct FfsVerifier<C: Challenger = ChainChallenger> {
    group: ModulusGroup,
    public: PublicKey,
    challenger: C,
}

impl FfsVerifier {
    /// Creates a verifier with a fresh [`ChainChallenger`].
    pub fn new(group: ModulusGroup, public: PublicKey) -> Result<Self> {
        Self::with_challenger(group, public, ChainChallenger::new())
    }
}

impl<C: Challenger> FfsVerifier<C> {
    /// Creates a verifier around an existing challenger.
    ///
    /// # Errors
    ///
    /// - [`Error::ChallengeExhausted`] if the key vector is longer than the
    ///   challenger's bit output
    /// - [`Error::InvalidParams`] if a public value is not a member of `group`
    pub fn with_challenger(group: ModulusGroup, public: PublicKey, challenger: C) -> Result<Self> {
        let available = challenger.challenge_bits();
        if public.len() > available {
            return Err(Error::ChallengeExhausted {
                k: public.len(),
                available,
            });
        }

        if let Some(i) = public.values().iter().position(|v| !group.in_group(v)) {
            return Err(Error::InvalidParams(format!(
                "public key element {i} is not a group member"
            )));
        }

        Ok(Self {
            group,
            public,
            challenger,
        })
    }

    /// Returns the modulus-only group.
    pub fn group(&self) -> &ModulusGroup {
        &self.group
    }

    /// Returns the challenger.
    pub fn challenger(&self) -> &C {
        &self.challenger
    }

    /// Checks `proof` against `block` under the current transcript.
    ///
    /// Accepts iff `y^2 = x * prod(v_i : c_i = 1) mod n`. A statement outside
    /// `[1, n)` or a response outside `[0, n)` is rejected outright, since
    /// `x = y = 0` would otherwise satisfy the equation for any challenge.
    pub fn verify(&self, proof: &Proof, block: &[u8]) -> bool {
        let ring = self.group.ring();
        let statement = proof.statement();
        let response = proof.response();

        if !ring.in_ring(statement) || response >= ring.modulus() {
            return false;
        }

        let challenge = self.challenger.challenge(statement, block);

        let mut expected = statement.clone();
        for (i, value) in self.public.values().iter().enumerate() {
            if challenge.bit(i) {
                expected = ring.mul(&expected, value);
            }
        }

        let squared = ring.square(response);
        constant_time_eq(&expected, &squared)
    }

    /// Checks a proof and, on success, hands back the pending transcript update.
    pub fn check(&self, proof: &Proof, block: &[u8]) -> Verdict {
        if self.verify(proof, block) {
            Verdict::Accepted(Acceptance {
                pending: self.challenger.prepare(block),
            })
        } else {
            Verdict::Rejected
        }
    }

    /// Folds an accepted block into the transcript.
    pub fn commit(&mut self, acceptance: Acceptance) {
        self.challenger.apply(acceptance.pending);
    }

    /// Checks a proof and commits it if valid. Returns whether it was accepted.
    pub fn verify_and_commit(&mut self, proof: &Proof, block: &[u8]) -> bool {
        match self.check(proof, block) {
            Verdict::Accepted(acceptance) => {
                self.commit(acceptance);
                true
            }
            Verdict::Rejected => false,
        }
    }
}

fn constant_time_eq(a: &BigUint, b: &BigUint) -> bool {
    a.to_bytes_le().ct_eq(&b.to_bytes_le()).into()
}
