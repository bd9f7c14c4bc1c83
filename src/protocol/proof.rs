use num_bigint::BigUint;

use crate::groups::ModRing;
use crate::Result;

/// Non-interactive FFS proof for one block.
///
/// `statement = r^2 mod n` and `response = r * prod(s_i : c_i = 1) mod n`.
/// Proofs are ephemeral and never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Proof {
    statement: BigUint,
    response: BigUint,
}

impl Proof {
    /// Creates a proof from its two components.
    pub fn new(statement: BigUint, response: BigUint) -> Self {
        Self {
            statement,
            response,
        }
    }

    /// Returns the statement `x`.
    pub fn statement(&self) -> &BigUint {
        &self.statement
    }

    /// Returns the response `y`.
    pub fn response(&self) -> &BigUint {
        &self.response
    }

    /// Length of an encoded proof for `ring`.
    pub fn encoded_len(ring: &ModRing) -> usize {
        2 * ring.byte_width()
    }

    /// Appends `[statement][response]`, each zero-padded to the ring width.
    pub fn encode_into(&self, ring: &ModRing, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(&ring.encode(&self.statement)?);
        out.extend_from_slice(&ring.encode(&self.response)?);
        Ok(())
    }

    /// Parses `[statement][response]` from exactly [`encoded_len`](Self::encoded_len) bytes.
    pub fn decode(ring: &ModRing, bytes: &[u8]) -> Result<Self> {
        let width = ring.byte_width();
        if bytes.len() != 2 * width {
            return Err(crate::Error::Framing(format!(
                "proof must be {} bytes, got {}",
                2 * width,
                bytes.len()
            )));
        }

        let (statement, response) = bytes.split_at(width);
        Ok(Self {
            statement: ring.decode(statement)?,
            response: ring.decode(response)?,
        })
    }
}
