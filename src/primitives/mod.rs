//! Number-theoretic building blocks.
//!
//! - **rng**: secure randomness and bounded rejection sampling
//! - **prime**: random prime generation for composite moduli

/// Random prime generation.
pub mod prime;
/// Cryptographically secure random number generation.
pub mod rng;

pub use prime::{generate_prime, is_probable_prime};
pub use rng::{random_below, SecureRng, DEFAULT_SAMPLING_ATTEMPTS};
