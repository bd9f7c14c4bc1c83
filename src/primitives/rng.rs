//! Cryptographically secure random number generation.

use num_bigint::BigUint;
use num_traits::Zero;
use rand_core::{CryptoRng, CryptoRngCore, OsRng, RngCore};

use crate::{Error, Result};

/// Default cap on rejection-sampling attempts.
///
/// Every draw succeeds with probability at least 1/2, so hitting the cap
/// means the entropy source is broken rather than unlucky.
pub const DEFAULT_SAMPLING_ATTEMPTS: usize = 128;

/// Cryptographically secure random number generator.
///
/// This is a thin wrapper around `OsRng` that provides a consistent interface
/// for cryptographic randomness throughout the library.
pub struct SecureRng(OsRng);

impl SecureRng {
    /// Creates a new cryptographically secure random number generator.
    pub fn new() -> Self {
        Self(OsRng)
    }
}

impl Default for SecureRng {
    fn default() -> Self {
        Self::new()
    }
}

impl RngCore for SecureRng {
    fn next_u32(&mut self) -> u32 {
        self.0.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.0.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.0.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> core::result::Result<(), rand_core::Error> {
        self.0.try_fill_bytes(dest)
    }
}

impl CryptoRng for SecureRng {}

/// Samples uniformly from `[0, bound)`.
///
/// Draws `bound.bits()` random bits per attempt and rejects values at or above
/// `bound`. Entropy failures surface as [`Error::Entropy`] instead of panicking.
pub fn random_below<R: CryptoRngCore>(
    rng: &mut R,
    bound: &BigUint,
    max_attempts: usize,
) -> Result<BigUint> {
    if bound.is_zero() {
        return Err(Error::InvalidParams(
            "sampling bound must be non-zero".to_string(),
        ));
    }

    let bits = bound.bits() as usize;
    let len = bits.div_ceil(8);
    let mask = 0xffu8 >> (len * 8 - bits);
    let mut buf = vec![0u8; len];

    for _ in 0..max_attempts {
        rng.try_fill_bytes(&mut buf)?;
        buf[0] &= mask;

        let candidate = BigUint::from_bytes_be(&buf);
        if &candidate < bound {
            return Ok(candidate);
        }
    }

    Err(Error::SamplingExhausted {
        attempts: max_attempts,
    })
}

/// Samples an odd integer of exactly `bits` bits with the top two bits set.
///
/// Setting the second bit guarantees that the product of two such values has
/// exactly `2 * bits` bits.
pub fn random_odd_with_top_bits<R: CryptoRngCore>(rng: &mut R, bits: usize) -> Result<BigUint> {
    if bits < 2 {
        return Err(Error::InvalidParams(format!(
            "cannot sample a {bits}-bit odd integer with two top bits set"
        )));
    }

    let len = bits.div_ceil(8);
    let excess = len * 8 - bits;
    let mut buf = vec![0u8; len];
    rng.try_fill_bytes(&mut buf)?;

    buf[0] &= 0xffu8 >> excess;
    let mut candidate = BigUint::from_bytes_be(&buf);
    candidate.set_bit(bits as u64 - 1, true);
    candidate.set_bit(bits as u64 - 2, true);
    candidate.set_bit(0, true);

    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_below_stays_in_range() {
        let mut rng = SecureRng::new();
        let bound = BigUint::from(1000u32);

        for _ in 0..200 {
            let value = random_below(&mut rng, &bound, DEFAULT_SAMPLING_ATTEMPTS).unwrap();
            assert!(value < bound);
        }
    }

    #[test]
    fn random_below_rejects_zero_bound() {
        let mut rng = SecureRng::new();
        let result = random_below(&mut rng, &BigUint::zero(), DEFAULT_SAMPLING_ATTEMPTS);
        assert!(matches!(result, Err(Error::InvalidParams(_))));
    }

    #[test]
    fn random_below_respects_attempt_cap() {
        let mut rng = SecureRng::new();
        let result = random_below(&mut rng, &BigUint::from(7u32), 0);
        assert!(matches!(result, Err(Error::SamplingExhausted { attempts: 0 })));
    }

    #[test]
    fn odd_candidate_has_exact_bit_length() {
        let mut rng = SecureRng::new();

        for bits in [2usize, 9, 64, 257] {
            let value = random_odd_with_top_bits(&mut rng, bits).unwrap();
            assert_eq!(value.bits() as usize, bits);
            assert!(value.bit(0));
            assert!(value.bit(bits as u64 - 2));
        }
    }
}
