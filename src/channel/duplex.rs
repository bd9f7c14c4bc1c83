//! Full-duplex endpoint driving both directions over one byte stream.

use tokio::io::{AsyncRead, AsyncWrite};

use super::pipeline::{Inbound, Outbound, RecvStats, SendStats};
use crate::config::{ChannelSettings, ProverConfig, VerifierConfig};
use crate::groups::{ModulusGroup, MultiplicativeGroup};
use crate::Result;

/// Counters from a finished [`Endpoint::run`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Report {
    /// Outbound counters.
    pub sent: SendStats,
    /// Inbound counters.
    pub received: RecvStats,
}

/// One side of an authenticated tunnel.
///
/// Proves what it sends with its own private key and verifies what it
/// receives against the peer's public key. Each direction keeps its own
/// transcript.
pub struct Endpoint<G: MultiplicativeGroup = ModulusGroup> {
    outbound: Outbound<G>,
    inbound: Inbound,
}

impl<G: MultiplicativeGroup> Endpoint<G> {
    /// Creates an endpoint from explicit key material.
    pub fn new(
        prover: ProverConfig<G>,
        verifier: VerifierConfig,
        settings: ChannelSettings,
    ) -> Result<Self> {
        Ok(Self {
            outbound: Outbound::new(prover, &settings)?,
            inbound: Inbound::new(verifier, &settings)?,
        })
    }

    /// Separates the two directions.
    pub fn split(self) -> (Outbound<G>, Inbound) {
        (self.outbound, self.inbound)
    }

    /// Runs both directions concurrently until each finishes.
    ///
    /// Outbound ends when `source` reaches EOF and then closes the write side
    /// of `transport`; inbound ends when the peer closes, or on a rejected
    /// frame under [`RejectPolicy::Terminate`](crate::RejectPolicy::Terminate),
    /// releasing its half of `transport`. The transport itself closes once
    /// both halves are released. The first error in either direction aborts both.
    pub async fn run<T, S, K>(self, transport: T, source: &mut S, sink: &mut K) -> Result<Report>
    where
        T: AsyncRead + AsyncWrite,
        S: AsyncRead + Unpin,
        K: AsyncWrite + Unpin,
    {
        let (mut outbound, mut inbound) = self.split();
        let (mut reader, mut writer) = tokio::io::split(transport);

        // The read half goes away as soon as the inbound direction ends.
        let receiving = async move {
            let received = inbound.pump(&mut reader, sink).await;
            drop(reader);
            received
        };
        let (sent, received) = tokio::try_join!(outbound.pump(source, &mut writer), receiving)?;

        Ok(Report { sent, received })
    }
}
