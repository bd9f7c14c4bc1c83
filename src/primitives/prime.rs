//! Random prime generation over arbitrary-precision integers.

use std::sync::OnceLock;

use num_bigint::BigUint;
use num_traits::{One, Zero};
use rand_core::CryptoRngCore;

use super::rng::{random_below, random_odd_with_top_bits, DEFAULT_SAMPLING_ATTEMPTS};
use crate::{Error, Result};

/// Miller-Rabin rounds applied to a candidate that survives trial division.
pub const MILLER_RABIN_ROUNDS: usize = 20;

/// Smallest prime size we are willing to generate.
pub const MIN_PRIME_BITS: usize = 8;

/// Candidates drawn per requested bit before prime generation gives up.
///
/// The prime number theorem puts the expected number of odd draws near
/// `0.35 * bits`, so this budget is never reached with a working RNG.
const CANDIDATES_PER_BIT: usize = 64;

/// Upper limit for the trial-division sieve.
const SIEVE_LIMIT: usize = 2048;

fn small_primes() -> &'static [u32] {
    static PRIMES: OnceLock<Vec<u32>> = OnceLock::new();
    PRIMES.get_or_init(|| {
        let mut composite = vec![false; SIEVE_LIMIT];
        let mut primes = Vec::new();
        for i in 2..SIEVE_LIMIT {
            if composite[i] {
                continue;
            }
            primes.push(i as u32);
            let mut j = i * i;
            while j < SIEVE_LIMIT {
                composite[j] = true;
                j += i;
            }
        }
        primes
    })
}

/// Generates a random prime of exactly `bits` bits.
///
/// The two most significant bits are always set, so the product of two primes
/// of `bits` bits has exactly `2 * bits` bits.
pub fn generate_prime<R: CryptoRngCore>(rng: &mut R, bits: usize) -> Result<BigUint> {
    if bits < MIN_PRIME_BITS {
        return Err(Error::InvalidParams(format!(
            "prime size must be at least {MIN_PRIME_BITS} bits, got {bits}"
        )));
    }

    for _ in 0..bits * CANDIDATES_PER_BIT {
        let candidate = random_odd_with_top_bits(rng, bits)?;
        if is_probable_prime(rng, &candidate, MILLER_RABIN_ROUNDS)? {
            return Ok(candidate);
        }
    }

    Err(Error::PrimeGeneration { bits })
}

/// Probabilistic primality test: trial division followed by Miller-Rabin.
///
/// A composite passes with probability at most `4^-rounds`.
pub fn is_probable_prime<R: CryptoRngCore>(
    rng: &mut R,
    n: &BigUint,
    rounds: usize,
) -> Result<bool> {
    let two = BigUint::from(2u32);
    if *n < two {
        return Ok(false);
    }

    for &p in small_primes() {
        if *n == BigUint::from(p) {
            return Ok(true);
        }
        if (n % p).is_zero() {
            return Ok(false);
        }
    }

    let one = BigUint::one();
    let n_minus_one = n - &one;
    let s = n_minus_one.trailing_zeros().unwrap_or(0);
    let d = &n_minus_one >> s;

    // witnesses are drawn from [2, n - 2]
    let witness_range = n - 3u32;

    'witness: for _ in 0..rounds {
        let a = random_below(rng, &witness_range, DEFAULT_SAMPLING_ATTEMPTS)? + &two;
        let mut x = a.modpow(&d, n);

        if x == one || x == n_minus_one {
            continue;
        }

        for _ in 1..s {
            x = x.modpow(&two, n);
            if x == n_minus_one {
                continue 'witness;
            }
            if x == one {
                return Ok(false);
            }
        }

        return Ok(false);
    }

    Ok(true)
}
