//! Feige-Fiat-Shamir key vectors.

use core::fmt::{self, Debug};

use num_bigint::BigUint;
use rand_core::CryptoRngCore;

use super::challenger::CHALLENGE_BITS;
use crate::groups::{ModRing, MultiplicativeGroup};
use crate::{Error, Result};

/// Private key vector `{s_i}`, each a random group member.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey {
    secrets: Vec<BigUint>,
}

/// Public key vector `{v_i = s_i^2 mod n}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey {
    values: Vec<BigUint>,
}

/// Matching private and public key vectors.
#[derive(Clone, Debug)]
pub struct KeyPair {
    /// Public half, safe to provision to verifiers.
    pub public: PublicKey,
    /// Private half, held by the prover only.
    pub private: PrivateKey,
}

fn check_vector_len(k: usize) -> Result<()> {
    if k == 0 {
        return Err(Error::InvalidParams(
            "key vector must not be empty".to_string(),
        ));
    }
    if k > CHALLENGE_BITS {
        return Err(Error::ChallengeExhausted {
            k,
            available: CHALLENGE_BITS,
        });
    }
    Ok(())
}

fn encode_vector(ring: &ModRing, values: &[BigUint]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(values.len() * ring.byte_width());
    for value in values {
        out.extend_from_slice(&ring.encode(value)?);
    }
    Ok(out)
}

fn decode_vector<G: MultiplicativeGroup>(group: &G, k: usize, bytes: &[u8]) -> Result<Vec<BigUint>> {
    check_vector_len(k)?;

    let width = group.ring().byte_width();
    let needed = k * width;
    if bytes.len() != needed {
        return Err(Error::Truncated {
            field: "key vector",
            needed,
            available: bytes.len(),
        });
    }

    bytes
        .chunks_exact(width)
        .enumerate()
        .map(|(i, chunk)| {
            let value = group.ring().decode(chunk)?;
            if !group.in_group(&value) {
                return Err(Error::InvalidParams(format!(
                    "key element {i} is not a group member"
                )));
            }
            Ok(value)
        })
        .collect()
}

impl PrivateKey {
    /// Wraps secrets that are already group members.
    pub fn new(secrets: Vec<BigUint>) -> Result<Self> {
        check_vector_len(secrets.len())?;
        Ok(Self { secrets })
    }

    /// Returns the key vector length `k`.
    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    /// Always false: construction rejects empty vectors.
    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }

    pub(crate) fn secrets(&self) -> &[BigUint] {
        &self.secrets
    }

    /// Derives the matching public key, `v_i = s_i^2 mod n`.
    pub fn public_key<G: MultiplicativeGroup>(&self, group: &G) -> PublicKey {
        PublicKey {
            values: self.secrets.iter().map(|s| group.ring().square(s)).collect(),
        }
    }

    /// Serializes as `k` fixed-width big-endian elements.
    pub fn to_bytes(&self, ring: &ModRing) -> Result<Vec<u8>> {
        encode_vector(ring, &self.secrets)
    }

    /// Parses `k` fixed-width elements, rejecting any non-member.
    pub fn from_bytes<G: MultiplicativeGroup>(group: &G, k: usize, bytes: &[u8]) -> Result<Self> {
        Ok(Self {
            secrets: decode_vector(group, k, bytes)?,
        })
    }
}

impl Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("k", &self.secrets.len())
            .finish_non_exhaustive()
    }
}

impl PublicKey {
    /// Wraps public values.
    pub fn new(values: Vec<BigUint>) -> Result<Self> {
        check_vector_len(values.len())?;
        Ok(Self { values })
    }

    /// Returns the key vector length `k`.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false: construction rejects empty vectors.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the public values.
    pub fn values(&self) -> &[BigUint] {
        &self.values
    }

    /// Serializes as `k` fixed-width big-endian elements.
    pub fn to_bytes(&self, ring: &ModRing) -> Result<Vec<u8>> {
        encode_vector(ring, &self.values)
    }

    /// Parses `k` fixed-width elements, rejecting any non-member.
    pub fn from_bytes<G: MultiplicativeGroup>(group: &G, k: usize, bytes: &[u8]) -> Result<Self> {
        Ok(Self {
            values: decode_vector(group, k, bytes)?,
        })
    }
}

impl KeyPair {
    /// Generates `k` random secrets and their squares.
    ///
    /// # Errors
    ///
    /// - [`Error::ChallengeExhausted`] if `k` exceeds the challenge bit count
    /// - [`Error::InvalidParams`] if `k` is zero
    /// - sampling errors from [`MultiplicativeGroup::random_element`]
    pub fn generate<G, R>(rng: &mut R, group: &G, k: usize) -> Result<Self>
    where
        G: MultiplicativeGroup,
        R: CryptoRngCore,
    {
        check_vector_len(k)?;

        let secrets = (0..k)
            .map(|_| group.random_element(rng))
            .collect::<Result<Vec<_>>>()?;
        let private = PrivateKey { secrets };
        let public = private.public_key(group);

        tracing::debug!(k, bits = group.ring().bits(), "generated FFS key pair");
        Ok(Self { public, private })
    }
}
