//! Error types for the FFS tunnel.

/// Main error types for the library.
///
/// A rejected proof is not represented here: rejection is a normal outcome
/// reported through [`Verdict`](crate::Verdict) and [`Authenticity`](crate::Authenticity).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The system entropy source failed.
    #[error("Entropy source failure: {0}")]
    Entropy(String),

    /// No prime was found within the candidate budget.
    #[error("Prime generation failed for {bits}-bit prime")]
    PrimeGeneration {
        /// Requested prime size in bits.
        bits: usize,
    },

    /// Rejection sampling did not produce a member within the attempt cap.
    #[error("Rejection sampling exhausted after {attempts} attempts")]
    SamplingExhausted {
        /// Number of candidates drawn before giving up.
        attempts: usize,
    },

    /// Invalid setup parameters were provided.
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// The key vector is longer than the challenge can cover bit for bit.
    #[error("Key vector of length {k} exceeds the {available} available challenge bits")]
    ChallengeExhausted {
        /// Key vector length.
        k: usize,
        /// Challenge bits produced per proof.
        available: usize,
    },

    /// A caller-supplied chunk does not fit the one-byte length prefix.
    #[error("Chunk of {len} bytes exceeds the {max}-byte frame limit")]
    ChunkTooLarge {
        /// Offending chunk length.
        len: usize,
        /// Largest chunk a frame can carry.
        max: usize,
    },

    /// A field was cut short.
    #[error("Truncated {field}: need {needed} bytes, have {available}")]
    Truncated {
        /// Name of the field being read.
        field: &'static str,
        /// Bytes the field requires.
        needed: usize,
        /// Bytes actually present.
        available: usize,
    },

    /// A frame or record is structurally invalid.
    #[error("Framing error: {0}")]
    Framing(String),

    /// AEAD tag verification failed.
    #[error("Authentication failed: ciphertext was tampered with or keys are out of sync")]
    Authentication,

    /// Configuration could not be loaded or failed validation.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rand_core::Error> for Error {
    fn from(err: rand_core::Error) -> Self {
        Error::Entropy(err.to_string())
    }
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(err.to_string())
    }
}
