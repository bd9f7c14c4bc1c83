use num_bigint::BigUint;
use num_traits::One;
use rand_core::CryptoRngCore;

use crate::primitives::rng::random_below;
use crate::{Error, Result};

/// Ring of integers modulo `n`.
///
/// Elements are serialized at a fixed width of `ceil(bits(n) / 8)` bytes,
/// big-endian and zero-padded, so framed values never need a length prefix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModRing {
    modulus: BigUint,
    byte_width: usize,
}

impl ModRing {
    /// Creates a ring over `modulus`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParams`] if the modulus is smaller than 2.
    pub fn new(modulus: BigUint) -> Result<Self> {
        if modulus <= BigUint::one() {
            return Err(Error::InvalidParams(
                "ring modulus must be at least 2".to_string(),
            ));
        }

        let byte_width = (modulus.bits() as usize).div_ceil(8);
        Ok(Self {
            modulus,
            byte_width,
        })
    }

    /// Rebuilds a ring from a big-endian modulus.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::new(BigUint::from_bytes_be(bytes))
    }

    /// Serializes the modulus as minimal big-endian bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.modulus.to_bytes_be()
    }

    /// Returns the modulus `n`.
    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    /// Returns the bit length of the modulus.
    pub fn bits(&self) -> usize {
        self.modulus.bits() as usize
    }

    /// Returns the fixed serialization width of a ring element in bytes.
    pub fn byte_width(&self) -> usize {
        self.byte_width
    }

    /// Checks `1 <= x < n`.
    pub fn in_ring(&self, x: &BigUint) -> bool {
        *x >= BigUint::one() && *x < self.modulus
    }

    /// Computes `x mod n`.
    pub fn reduce(&self, x: &BigUint) -> BigUint {
        x % &self.modulus
    }

    /// Reduces `x` modulo `n` in place.
    pub fn reduce_in_place(&self, x: &mut BigUint) {
        *x %= &self.modulus;
    }

    /// Multiplies two values and reduces the product.
    pub fn mul(&self, a: &BigUint, b: &BigUint) -> BigUint {
        (a * b) % &self.modulus
    }

    /// Squares a value modulo `n`.
    pub fn square(&self, x: &BigUint) -> BigUint {
        x.modpow(&BigUint::from(2u32), &self.modulus)
    }

    /// Samples a ring member uniformly from `[1, n)`.
    pub fn random_element<R: CryptoRngCore>(
        &self,
        rng: &mut R,
        max_attempts: usize,
    ) -> Result<BigUint> {
        for _ in 0..max_attempts {
            let candidate = random_below(rng, &self.modulus, max_attempts)?;
            if self.in_ring(&candidate) {
                return Ok(candidate);
            }
        }

        Err(Error::SamplingExhausted {
            attempts: max_attempts,
        })
    }

    /// Encodes `x` as exactly [`byte_width`](Self::byte_width) big-endian bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParams`] if `x` does not fit the ring width.
    pub fn encode(&self, x: &BigUint) -> Result<Vec<u8>> {
        let raw = x.to_bytes_be();
        if raw.len() > self.byte_width {
            return Err(Error::InvalidParams(format!(
                "value of {} bytes does not fit ring width {}",
                raw.len(),
                self.byte_width
            )));
        }

        let mut out = vec![0u8; self.byte_width];
        out[self.byte_width - raw.len()..].copy_from_slice(&raw);
        Ok(out)
    }

    /// Decodes a fixed-width big-endian value.
    ///
    /// Range is not checked here; callers decide whether `x >= n` is an error.
    pub fn decode(&self, bytes: &[u8]) -> Result<BigUint> {
        if bytes.len() != self.byte_width {
            return Err(Error::Framing(format!(
                "ring element must be {} bytes, got {}",
                self.byte_width,
                bytes.len()
            )));
        }

        Ok(BigUint::from_bytes_be(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SecureRng, DEFAULT_SAMPLING_ATTEMPTS};

    fn ring_77() -> ModRing {
        ModRing::new(BigUint::from(77u32)).unwrap()
    }

    #[test]
    fn membership_bounds() {
        let ring = ring_77();

        assert!(!ring.in_ring(&BigUint::from(0u32)));
        assert!(ring.in_ring(&BigUint::from(1u32)));
        assert!(ring.in_ring(&BigUint::from(76u32)));
        assert!(!ring.in_ring(&BigUint::from(77u32)));
    }

    #[test]
    fn reduce_by_value_and_in_place_agree() {
        let ring = ring_77();
        let x = BigUint::from(1000u32);

        let mut y = x.clone();
        ring.reduce_in_place(&mut y);

        assert_eq!(ring.reduce(&x), BigUint::from(76u32));
        assert_eq!(y, BigUint::from(76u32));
    }

    #[test]
    fn fixed_width_encoding_pads_with_zeros() {
        let ring = ModRing::new(BigUint::from(0x01_0000u32)).unwrap();
        assert_eq!(ring.byte_width(), 3);

        let encoded = ring.encode(&BigUint::from(5u32)).unwrap();
        assert_eq!(encoded, vec![0, 0, 5]);
        assert_eq!(ring.decode(&encoded).unwrap(), BigUint::from(5u32));
    }

    #[test]
    fn encode_rejects_oversized_values() {
        let ring = ring_77();
        assert!(ring.encode(&BigUint::from(256u32)).is_err());
    }

    #[test]
    fn decode_rejects_wrong_width() {
        let ring = ring_77();
        assert!(matches!(ring.decode(&[0, 1]), Err(Error::Framing(_))));
    }

    #[test]
    fn random_elements_are_ring_members() {
        let ring = ring_77();
        let mut rng = SecureRng::new();

        for _ in 0..100 {
            let x = ring.random_element(&mut rng, DEFAULT_SAMPLING_ATTEMPTS).unwrap();
            assert!(ring.in_ring(&x));
        }
    }

    #[test]
    fn modulus_bytes_are_minimal() {
        let ring = ModRing::new(BigUint::from(0x1_0001u32)).unwrap();

        assert_eq!(ring.to_bytes(), vec![0x01, 0x00, 0x01]);
        assert_eq!(ModRing::from_bytes(&ring.to_bytes()).unwrap(), ring);
    }

    #[test]
    fn degenerate_modulus_is_rejected() {
        assert!(ModRing::new(BigUint::one()).is_err());
    }
}
