//! Feige-Fiat-Shamir authenticated, encrypted duplex byte channel.
//!
//! Every chunk sent through the channel carries a non-interactive
//! zero-knowledge proof that the sender knows the square roots behind a
//! published key vector. The Fiat-Shamir challenge is bound to the hash chain
//! of every chunk accepted so far, so proofs cannot be replayed, reordered or
//! moved to another session. Each framed chunk is then sealed with
//! ChaCha20-Poly1305 under a per-message key derived from a random capsule and
//! a shared master secret.
//!
//! - **primitives**: secure randomness and prime generation
//! - **groups**: the composite-modulus group, with and without the totient
//! - **protocol**: key vectors, the chained challenger, prover and verifier
//! - **kem**: capsule-based key encapsulation and AEAD
//! - **channel**: frames, wire records, pipelines and the duplex endpoint
//! - **config**: channel settings and provisioning bundles
//!
//! # Example
//!
//! ```
//! use ffs_tunnel::{
//!     CompositeGroup, FfsProver, FfsVerifier, KeyPair, SecureRng,
//! };
//!
//! # fn main() -> ffs_tunnel::Result<()> {
//! let mut rng = SecureRng::new();
//! let group = CompositeGroup::setup(&mut rng, 256)?;
//! let pair = KeyPair::generate(&mut rng, &group, 16)?;
//!
//! let mut verifier = FfsVerifier::new(group.public(), pair.public)?;
//! let mut prover = FfsProver::new(group, pair.private)?;
//!
//! let proof = prover.prove_with_rng(&mut rng, b"Hello World!!")?;
//! prover.update(b"Hello World!!");
//! assert!(verifier.verify_and_commit(&proof, b"Hello World!!"));
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod config;
mod error;
pub mod groups;
pub mod kem;
pub mod primitives;
pub mod protocol;

pub use channel::{Authenticity, Delivery, Endpoint, Frame, Inbound, Outbound, MAX_CHUNK_LEN};
pub use config::{ChannelSettings, ProverConfig, Provisioning, RejectPolicy, VerifierConfig};
pub use error::Error;
pub use groups::{CompositeGroup, Invertible, ModRing, ModulusGroup, MultiplicativeGroup};
pub use kem::{Deriver, Encapsulator, MasterSecret, Sealed, Sha256Deriver};
pub use primitives::{SecureRng, DEFAULT_SAMPLING_ATTEMPTS};
pub use protocol::{
    ChainChallenger, Challenge, Challenger, FfsProver, FfsVerifier, KeyPair, PrivateKey, Proof,
    PublicKey, Verdict,
};

/// Result type used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;
