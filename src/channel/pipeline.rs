//! Directional pipelines: prove-then-seal outbound, open-then-verify inbound.
//!
//! Each pipeline owns its transcript and processes frames strictly in order.
//! A frame's transcript update happens only after the frame has been fully
//! produced (outbound) or accepted (inbound).

use rand_core::CryptoRngCore;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use super::frame::{check_chunk, Frame};
use super::record::{read_record, write_record};
use crate::config::{ChannelSettings, ProverConfig, RejectPolicy, VerifierConfig};
use crate::groups::{ModulusGroup, MultiplicativeGroup};
use crate::kem::{Encapsulator, Sealed, AEAD_TAG_LEN};
use crate::protocol::{FfsProver, FfsVerifier, Verdict};
use crate::{Result, SecureRng};

/// Whether a received chunk carried a valid proof.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Authenticity {
    /// The proof verified and the transcript advanced.
    Authenticated,
    /// The proof failed. The chunk is unauthenticated and the transcript is unchanged.
    Rejected,
}

/// A chunk recovered from the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delivery {
    /// Chunk bytes.
    pub data: Vec<u8>,
    /// Proof outcome.
    pub authenticity: Authenticity,
}

impl Delivery {
    /// Returns `true` if the chunk was authenticated.
    pub fn is_authenticated(&self) -> bool {
        self.authenticity == Authenticity::Authenticated
    }
}

/// Counters for one outbound run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SendStats {
    /// Frames written.
    pub frames: u64,
    /// Payload bytes written.
    pub bytes: u64,
}

/// Counters for one inbound run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RecvStats {
    /// Frames whose proof verified.
    pub accepted: u64,
    /// Frames whose proof failed.
    pub rejected: u64,
    /// Payload bytes written to the sink.
    pub delivered: u64,
}

/// Sending half: proves, frames and seals each chunk.
pub struct Outbound<G: MultiplicativeGroup = ModulusGroup, R: CryptoRngCore = SecureRng> {
    prover: FfsProver<G>,
    kem: Encapsulator,
    chunk_size: usize,
    rng: R,
}

impl<G: MultiplicativeGroup> Outbound<G> {
    /// Builds the pipeline from prover key material, drawing from the OS.
    pub fn new(config: ProverConfig<G>, settings: &ChannelSettings) -> Result<Self> {
        Self::with_rng(config, settings, SecureRng::new())
    }
}

impl<G: MultiplicativeGroup, R: CryptoRngCore> Outbound<G, R> {
    /// Builds the pipeline around a caller-supplied randomness source.
    pub fn with_rng(config: ProverConfig<G>, settings: &ChannelSettings, rng: R) -> Result<Self> {
        settings.validate()?;

        let group = config.group.with_sampling_attempts(settings.sampling_attempts);
        Ok(Self {
            prover: FfsProver::new(group, config.private)?,
            kem: Encapsulator::new(config.master),
            chunk_size: settings.chunk_size,
            rng,
        })
    }

    /// Returns the prover.
    pub fn prover(&self) -> &FfsProver<G> {
        &self.prover
    }

    /// Produces the sealed record for one chunk and advances the transcript.
    ///
    /// # Errors
    ///
    /// - [`Error::ChunkTooLarge`](crate::Error::ChunkTooLarge) for chunks over 255
    ///   bytes, before any randomness is drawn
    /// - entropy and sampling errors; the transcript is untouched on failure
    pub fn seal_chunk(&mut self, chunk: &[u8]) -> Result<Sealed> {
        check_chunk(chunk)?;

        let proof = self.prover.prove_with_rng(&mut self.rng, chunk)?;
        let plaintext = Frame::new(chunk.to_vec(), proof)?.encode(self.prover.group().ring())?;
        let sealed = self.kem.encapsulate(&mut self.rng, &plaintext)?;

        self.prover.update(chunk);
        debug!(
            chunk_len = chunk.len(),
            ciphertext_len = sealed.ciphertext.len(),
            "sealed frame"
        );
        Ok(sealed)
    }

    /// Seals and writes one chunk.
    pub async fn send_chunk<W>(&mut self, writer: &mut W, chunk: &[u8]) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let sealed = self.seal_chunk(chunk)?;
        write_record(writer, &sealed).await
    }

    /// Splits `data` into `chunk_size` slices and sends each in order.
    pub async fn send<W>(&mut self, writer: &mut W, data: &[u8]) -> Result<SendStats>
    where
        W: AsyncWrite + Unpin,
    {
        let mut stats = SendStats::default();
        for chunk in data.chunks(self.chunk_size) {
            self.send_chunk(writer, chunk).await?;
            stats.frames += 1;
            stats.bytes += chunk.len() as u64;
        }
        Ok(stats)
    }

    /// Forwards `source` until EOF, then shuts the writer down.
    pub async fn pump<S, W>(&mut self, source: &mut S, writer: &mut W) -> Result<SendStats>
    where
        S: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!(chunk_size = self.chunk_size, "outbound pipeline started");

        let mut stats = SendStats::default();
        let mut buf = vec![0u8; self.chunk_size];
        loop {
            let n = source.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            self.send_chunk(writer, &buf[..n]).await?;
            stats.frames += 1;
            stats.bytes += n as u64;
        }

        writer.shutdown().await?;
        info!(frames = stats.frames, bytes = stats.bytes, "outbound pipeline finished");
        Ok(stats)
    }
}

/// Receiving half: opens each record and verifies its proof.
pub struct Inbound {
    verifier: FfsVerifier,
    kem: Encapsulator,
    policy: RejectPolicy,
    max_ciphertext_len: usize,
}

impl Inbound {
    /// Builds the pipeline from verifier key material.
    pub fn new(config: VerifierConfig, settings: &ChannelSettings) -> Result<Self> {
        settings.validate()?;

        let max_ciphertext_len = Frame::max_encoded_len(config.group.ring()) + AEAD_TAG_LEN;
        Ok(Self {
            verifier: FfsVerifier::new(config.group, config.public)?,
            kem: Encapsulator::new(config.master),
            policy: settings.reject_policy,
            max_ciphertext_len,
        })
    }

    /// Returns the verifier.
    pub fn verifier(&self) -> &FfsVerifier {
        &self.verifier
    }

    /// Largest ciphertext a well-formed record can carry.
    pub fn max_ciphertext_len(&self) -> usize {
        self.max_ciphertext_len
    }

    /// Decrypts and verifies one record.
    ///
    /// The transcript advances only when the proof verifies.
    ///
    /// # Errors
    ///
    /// - [`Error::Authentication`](crate::Error::Authentication) if the AEAD tag fails
    /// - framing errors if the decrypted frame is malformed
    pub fn open(&mut self, sealed: &Sealed) -> Result<Delivery> {
        let plaintext = self.kem.open(sealed).inspect_err(|_| {
            warn!("record failed authentication");
        })?;

        let (data, proof) = Frame::decode(self.verifier.group().ring(), &plaintext)?.into_parts();
        let authenticity = match self.verifier.check(&proof, &data) {
            Verdict::Accepted(acceptance) => {
                self.verifier.commit(acceptance);
                debug!(chunk_len = data.len(), "frame authenticated");
                Authenticity::Authenticated
            }
            Verdict::Rejected => {
                warn!(chunk_len = data.len(), "frame proof rejected");
                Authenticity::Rejected
            }
        };

        Ok(Delivery { data, authenticity })
    }

    /// Reads and opens the next record. Returns `Ok(None)` at clean EOF.
    pub async fn recv<R>(&mut self, reader: &mut R) -> Result<Option<Delivery>>
    where
        R: AsyncRead + Unpin,
    {
        match read_record(reader, self.max_ciphertext_len).await? {
            Some(sealed) => self.open(&sealed).map(Some),
            None => Ok(None),
        }
    }

    /// Delivers chunks to `sink` until EOF, applying the reject policy.
    pub async fn pump<R, K>(&mut self, reader: &mut R, sink: &mut K) -> Result<RecvStats>
    where
        R: AsyncRead + Unpin,
        K: AsyncWrite + Unpin,
    {
        info!(policy = ?self.policy, "inbound pipeline started");

        let mut stats = RecvStats::default();
        while let Some(delivery) = self.recv(reader).await? {
            let forward = match delivery.authenticity {
                Authenticity::Authenticated => {
                    stats.accepted += 1;
                    true
                }
                Authenticity::Rejected => {
                    stats.rejected += 1;
                    match self.policy {
                        RejectPolicy::Drop => false,
                        RejectPolicy::Deliver => true,
                        RejectPolicy::Terminate => {
                            warn!("terminating inbound pipeline on rejected frame");
                            break;
                        }
                    }
                }
            };

            if forward {
                sink.write_all(&delivery.data).await?;
                sink.flush().await?;
                stats.delivered += delivery.data.len() as u64;
            }
        }

        info!(
            accepted = stats.accepted,
            rejected = stats.rejected,
            "inbound pipeline finished"
        );
        Ok(stats)
    }
}
