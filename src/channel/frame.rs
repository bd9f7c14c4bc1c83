//! Proof-carrying frame, the plaintext inside every AEAD record.
//!
//! ```text
//! chunk_len : 1 byte (0..=255)
//! chunk     : chunk_len bytes
//! statement : ring width, zero-padded big-endian
//! response  : ring width, zero-padded big-endian
//! ```

use crate::groups::ModRing;
use crate::protocol::Proof;
use crate::{Error, Result};

/// Largest chunk a frame can carry; the length prefix is one byte.
pub const MAX_CHUNK_LEN: usize = u8::MAX as usize;

/// Rejects chunks longer than [`MAX_CHUNK_LEN`].
pub fn check_chunk(chunk: &[u8]) -> Result<()> {
    if chunk.len() > MAX_CHUNK_LEN {
        return Err(Error::ChunkTooLarge {
            len: chunk.len(),
            max: MAX_CHUNK_LEN,
        });
    }
    Ok(())
}

/// A chunk together with its proof.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    chunk: Vec<u8>,
    proof: Proof,
}

impl Frame {
    /// Creates a frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChunkTooLarge`] for chunks over [`MAX_CHUNK_LEN`].
    pub fn new(chunk: Vec<u8>, proof: Proof) -> Result<Self> {
        check_chunk(&chunk)?;
        Ok(Self { chunk, proof })
    }

    /// Returns the chunk.
    pub fn chunk(&self) -> &[u8] {
        &self.chunk
    }

    /// Returns the proof.
    pub fn proof(&self) -> &Proof {
        &self.proof
    }

    /// Splits the frame into chunk and proof.
    pub fn into_parts(self) -> (Vec<u8>, Proof) {
        (self.chunk, self.proof)
    }

    /// Encoded size of a frame carrying `chunk_len` bytes.
    pub fn encoded_len(ring: &ModRing, chunk_len: usize) -> usize {
        1 + chunk_len + Proof::encoded_len(ring)
    }

    /// Largest possible encoded frame for `ring`.
    pub fn max_encoded_len(ring: &ModRing) -> usize {
        Self::encoded_len(ring, MAX_CHUNK_LEN)
    }

    /// Serializes the frame.
    pub fn encode(&self, ring: &ModRing) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(Self::encoded_len(ring, self.chunk.len()));
        out.push(self.chunk.len() as u8);
        out.extend_from_slice(&self.chunk);
        self.proof.encode_into(ring, &mut out)?;
        Ok(out)
    }

    /// Parses a frame that must span `bytes` exactly.
    ///
    /// # Errors
    ///
    /// - [`Error::Truncated`] if any field is cut short
    /// - [`Error::Framing`] if bytes remain after the response
    pub fn decode(ring: &ModRing, bytes: &[u8]) -> Result<Self> {
        let Some((&chunk_len, rest)) = bytes.split_first() else {
            return Err(Error::Truncated {
                field: "chunk length",
                needed: 1,
                available: 0,
            });
        };
        let chunk_len = usize::from(chunk_len);

        if rest.len() < chunk_len {
            return Err(Error::Truncated {
                field: "chunk",
                needed: chunk_len,
                available: rest.len(),
            });
        }
        let (chunk, rest) = rest.split_at(chunk_len);

        let proof_len = Proof::encoded_len(ring);
        if rest.len() < proof_len {
            return Err(Error::Truncated {
                field: "proof",
                needed: proof_len,
                available: rest.len(),
            });
        }
        if rest.len() > proof_len {
            return Err(Error::Framing(format!(
                "{} trailing bytes after proof",
                rest.len() - proof_len
            )));
        }

        Ok(Self {
            chunk: chunk.to_vec(),
            proof: Proof::decode(ring, rest)?,
        })
    }
}
