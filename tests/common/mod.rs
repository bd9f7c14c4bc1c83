//! Common test utilities shared across integration tests.
#![allow(dead_code)]

use ffs_tunnel::{
    ChannelSettings, CompositeGroup, Inbound, KeyPair, MasterSecret, MultiplicativeGroup,
    Outbound, ProverConfig, SecureRng, VerifierConfig,
};
use num_bigint::BigUint;
use rand_core::{CryptoRng, RngCore};

/// Initialize test tracing (call once at the beginning of tests).
///
/// Sets up tracing with DEBUG output from this crate to the test writer.
/// Subsequent calls are safe and will be ignored.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::new("ffs_tunnel=debug");

    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(filter)
        .try_init();
}

/// Group over two known primes, fast enough for property tests.
pub fn small_group() -> CompositeGroup {
    CompositeGroup::from_primes(&BigUint::from(1_000_003u32), &BigUint::from(999_983u32))
        .expect("Fixed primes should form a group")
}

/// Freshly generated group of the given size.
pub fn generated_group(bits: usize) -> CompositeGroup {
    let mut rng = SecureRng::new();
    CompositeGroup::setup(&mut rng, bits).expect("Group setup should succeed")
}

/// Key material for one direction of a tunnel.
pub struct Direction {
    pub prover: ProverConfig<CompositeGroup>,
    pub verifier: VerifierConfig,
}

/// Generates a key pair of length `k` and pairs both ends under `master`.
pub fn direction(group: &CompositeGroup, k: usize, master: &[u8]) -> Direction {
    let mut rng = SecureRng::new();
    let pair = KeyPair::generate(&mut rng, group, k).expect("Key generation should succeed");
    let master = MasterSecret::new(master.to_vec()).expect("Master secret should be non-empty");

    Direction {
        verifier: VerifierConfig {
            group: group.public(),
            public: pair.public,
            master: master.clone(),
        },
        prover: ProverConfig {
            group: group.clone(),
            private: pair.private,
            master,
        },
    }
}

/// Builds matching outbound and inbound pipelines.
pub fn pipelines(
    group: &CompositeGroup,
    k: usize,
    master: &[u8],
    settings: &ChannelSettings,
) -> (Outbound<CompositeGroup>, Inbound) {
    let Direction { prover, verifier } = direction(group, k, master);
    let outbound = Outbound::new(prover, settings).expect("Outbound pipeline should build");
    let inbound = Inbound::new(verifier, settings).expect("Inbound pipeline should build");
    (outbound, inbound)
}

/// Byte width of the group's ring.
pub fn width(group: &CompositeGroup) -> usize {
    group.ring().byte_width()
}

/// Randomness source whose every draw fails.
pub struct FailingRng;

impl RngCore for FailingRng {
    fn next_u32(&mut self) -> u32 {
        panic!("infallible draw from a failing entropy source")
    }

    fn next_u64(&mut self) -> u64 {
        panic!("infallible draw from a failing entropy source")
    }

    fn fill_bytes(&mut self, _dest: &mut [u8]) {
        panic!("infallible draw from a failing entropy source")
    }

    fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand_core::Error> {
        let code = std::num::NonZeroU32::new(rand_core::Error::CUSTOM_START)
            .expect("Custom error code is non-zero");
        Err(rand_core::Error::from(code))
    }
}

impl CryptoRng for FailingRng {}
