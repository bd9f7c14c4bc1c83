use core::fmt::{self, Debug};

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::One;
use rand_core::CryptoRngCore;

use super::ring::ModRing;
use crate::primitives::prime::{generate_prime, MIN_PRIME_BITS};
use crate::primitives::rng::DEFAULT_SAMPLING_ATTEMPTS;
use crate::{Error, Result};

/// Attempts at drawing a second prime distinct from the first.
const DISTINCT_PRIME_ATTEMPTS: usize = 8;

/// Multiplicative group of units modulo a composite `n`.
///
/// Implemented by both the key-generating party's [`CompositeGroup`] and the
/// modulus-only [`ModulusGroup`]. Only the former can invert elements; see
/// [`Invertible`].
pub trait MultiplicativeGroup: Clone + Debug + Send + Sync + 'static {
    /// Returns the underlying ring.
    fn ring(&self) -> &ModRing;

    /// Returns the cap on rejection-sampling attempts.
    fn sampling_attempts(&self) -> usize {
        DEFAULT_SAMPLING_ATTEMPTS
    }

    /// Overrides the rejection-sampling cap.
    fn with_sampling_attempts(self, attempts: usize) -> Self;

    /// Returns the modulus `n`.
    fn modulus(&self) -> &BigUint {
        self.ring().modulus()
    }

    /// Checks ring membership, `1 <= x < n`.
    fn in_ring(&self, x: &BigUint) -> bool {
        self.ring().in_ring(x)
    }

    /// Checks group membership, `1 <= x < n` and `gcd(x, n) = 1`.
    fn in_group(&self, x: &BigUint) -> bool {
        self.in_ring(x) && x.gcd(self.modulus()).is_one()
    }

    /// Computes `x mod n`.
    fn reduce(&self, x: &BigUint) -> BigUint {
        self.ring().reduce(x)
    }

    /// Samples a group member uniformly.
    ///
    /// Draws from `[0, n)` until a co-prime candidate appears. For `n = p * q`
    /// with large primes a non-co-prime draw is negligible, so one draw is
    /// the expected cost.
    ///
    /// # Errors
    ///
    /// - [`Error::Entropy`] if the RNG fails
    /// - [`Error::SamplingExhausted`] if the attempt cap is reached
    fn random_element<R: CryptoRngCore>(&self, rng: &mut R) -> Result<BigUint> {
        let attempts = self.sampling_attempts();
        for _ in 0..attempts {
            let candidate = crate::primitives::random_below(rng, self.modulus(), attempts)?;
            if self.in_group(&candidate) {
                return Ok(candidate);
            }
        }

        Err(Error::SamplingExhausted { attempts })
    }
}

/// A group that knows its totient and can therefore invert elements.
pub trait Invertible: MultiplicativeGroup {
    /// Computes `x^-1 mod n` as `x^(phi(n) - 1) mod n`.
    ///
    /// Returns `None` if `x` is not a group member.
    fn inverse(&self, x: &BigUint) -> Option<BigUint>;
}

/// Group reconstructed from a transmitted modulus.
///
/// Holds `n` only. It deliberately has no inverse operation: without the
/// factorization of `n` the totient is unknown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModulusGroup {
    ring: ModRing,
    sampling_attempts: usize,
}

impl ModulusGroup {
    /// Wraps an existing ring.
    pub fn new(ring: ModRing) -> Self {
        Self {
            ring,
            sampling_attempts: DEFAULT_SAMPLING_ATTEMPTS,
        }
    }

    /// Rebuilds the group from a modulus value.
    pub fn from_modulus(modulus: BigUint) -> Result<Self> {
        Ok(Self::new(ModRing::new(modulus)?))
    }

    /// Rebuilds the group from big-endian modulus bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Self::new(ModRing::from_bytes(bytes)?))
    }
}

impl MultiplicativeGroup for ModulusGroup {
    fn ring(&self) -> &ModRing {
        &self.ring
    }

    fn sampling_attempts(&self) -> usize {
        self.sampling_attempts
    }

    fn with_sampling_attempts(mut self, attempts: usize) -> Self {
        self.sampling_attempts = attempts;
        self
    }
}

/// Samples two distinct primes of `bit_size / 2` bits and returns `(ring, p, q)`.
///
/// # Errors
///
/// - [`Error::InvalidParams`] if `bit_size` is odd or too small
/// - [`Error::PrimeGeneration`] or [`Error::Entropy`] if sampling fails
pub fn setup_composite<R: CryptoRngCore>(
    rng: &mut R,
    bit_size: usize,
) -> Result<(ModRing, BigUint, BigUint)> {
    if bit_size % 2 != 0 || bit_size < 2 * MIN_PRIME_BITS {
        return Err(Error::InvalidParams(format!(
            "composite modulus size must be even and at least {} bits, got {bit_size}",
            2 * MIN_PRIME_BITS
        )));
    }

    let half = bit_size / 2;
    let p = generate_prime(rng, half)?;

    for _ in 0..DISTINCT_PRIME_ATTEMPTS {
        let q = generate_prime(rng, half)?;
        if q != p {
            let ring = ModRing::new(&p * &q)?;
            return Ok((ring, p, q));
        }
    }

    Err(Error::PrimeGeneration { bits: half })
}

/// Composite group held by the key-generating party.
///
/// Retains `phi(n) = (p - 1)(q - 1)` and exposes [`Invertible::inverse`].
/// Use [`CompositeGroup::public`] to hand a modulus-only view to a verifier.
#[derive(Clone)]
pub struct CompositeGroup {
    ring: ModRing,
    totient: BigUint,
    sampling_attempts: usize,
}

impl CompositeGroup {
    /// Generates a fresh `bit_size`-bit modulus.
    pub fn setup<R: CryptoRngCore>(rng: &mut R, bit_size: usize) -> Result<Self> {
        let (ring, p, q) = setup_composite(rng, bit_size)?;
        let group = Self::from_ring_and_primes(ring, &p, &q);
        tracing::debug!(bits = group.ring.bits(), "composite group generated");
        Ok(group)
    }

    /// Builds the group from known primes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParams`] if either factor is below 2 or they are equal.
    pub fn from_primes(p: &BigUint, q: &BigUint) -> Result<Self> {
        let two = BigUint::from(2u32);
        if *p < two || *q < two || p == q {
            return Err(Error::InvalidParams(
                "factors must be distinct and at least 2".to_string(),
            ));
        }

        let ring = ModRing::new(p * q)?;
        Ok(Self::from_ring_and_primes(ring, p, q))
    }

    fn from_ring_and_primes(ring: ModRing, p: &BigUint, q: &BigUint) -> Self {
        let one = BigUint::one();
        let totient = (p - &one) * (q - &one);
        Self {
            ring,
            totient,
            sampling_attempts: DEFAULT_SAMPLING_ATTEMPTS,
        }
    }

    /// Returns a modulus-only view suitable for a verifier.
    pub fn public(&self) -> ModulusGroup {
        ModulusGroup::new(self.ring.clone()).with_sampling_attempts(self.sampling_attempts)
    }
}

impl Debug for CompositeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeGroup")
            .field("ring", &self.ring)
            .field("totient", &"<redacted>")
            .finish()
    }
}

impl MultiplicativeGroup for CompositeGroup {
    fn ring(&self) -> &ModRing {
        &self.ring
    }

    fn sampling_attempts(&self) -> usize {
        self.sampling_attempts
    }

    fn with_sampling_attempts(mut self, attempts: usize) -> Self {
        self.sampling_attempts = attempts;
        self
    }
}

impl Invertible for CompositeGroup {
    fn inverse(&self, x: &BigUint) -> Option<BigUint> {
        if !self.in_group(x) {
            return None;
        }

        let exponent = &self.totient - BigUint::one();
        Some(x.modpow(&exponent, self.modulus()))
    }
}
