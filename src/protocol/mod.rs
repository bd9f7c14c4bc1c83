/// Transcript-chained Fiat-Shamir challenger.
pub mod challenger;
/// Private and public key vectors.
pub mod keys;
/// Proof type and its fixed-width encoding.
pub mod proof;
/// Prover implementation for generating proofs.
pub mod prover;
/// Verifier implementation for validating proofs.
pub mod verifier;

pub use challenger::{ChainChallenger, Challenge, Challenger, PendingUpdate, CHALLENGE_BITS};
pub use keys::{KeyPair, PrivateKey, PublicKey};
pub use proof::Proof;
pub use prover::FfsProver;
pub use verifier::{Acceptance, FfsVerifier, Verdict};
