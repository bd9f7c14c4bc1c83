use std::time::Instant;

use clap::Parser;
use ffs_tunnel::{
    ChannelSettings, CompositeGroup, Endpoint, KeyPair, MasterSecret, MultiplicativeGroup,
    Provisioning, SecureRng,
};
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug)]
#[command(name = "ffs-loopback")]
#[command(about = "Send a message through two in-memory FFS tunnel endpoints", long_about = None)]
#[command(version)]
struct Args {
    /// Modulus size in bits
    #[arg(short, long, env = "FFS_BITS", default_value = "1024")]
    bits: usize,

    /// Key vector length
    #[arg(short, long, env = "FFS_K", default_value = "128")]
    k: usize,

    /// Message sent from the left endpoint to the right one
    #[arg(short, long, default_value = "Hello World!!")]
    message: String,
}

/// Generates a fresh modulus and key pair and returns a provisioning bundle.
fn provision(rng: &mut SecureRng, bits: usize, k: usize) -> ffs_tunnel::Result<Provisioning> {
    let group = CompositeGroup::setup(rng, bits)?;
    let pair = KeyPair::generate(rng, &group, k)?;
    let master = MasterSecret::generate(rng, 32)?;
    Provisioning::new(group.ring(), &pair.public, Some(&pair.private), &master)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = ChannelSettings::from_env().unwrap_or_else(|e| {
        error!("Failed to load configuration: {e}");
        info!("Using default configuration");
        ChannelSettings::default()
    });

    let mut rng = SecureRng::new();
    let started = Instant::now();
    let left = provision(&mut rng, args.bits, args.k)?;
    let right = provision(&mut rng, args.bits, args.k)?;
    info!(
        bits = args.bits,
        k = args.k,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "provisioned both endpoints"
    );

    let left_endpoint = Endpoint::new(
        left.prover_config()?,
        right.verifier_config()?,
        settings.clone(),
    )?;
    let right_endpoint = Endpoint::new(right.prover_config()?, left.verifier_config()?, settings)?;

    let (left_io, right_io) = tokio::io::duplex(64 * 1024);
    let mut left_source = args.message.as_bytes();
    let mut right_source: &[u8] = &[];
    let mut left_sink = Vec::new();
    let mut right_sink = Vec::new();

    let started = Instant::now();
    let (_, report) = tokio::try_join!(
        left_endpoint.run(left_io, &mut left_source, &mut left_sink),
        right_endpoint.run(right_io, &mut right_source, &mut right_sink),
    )?;

    println!("received: {}", String::from_utf8_lossy(&right_sink));
    println!(
        "accepted frames: {}, rejected frames: {}, elapsed: {:?}",
        report.received.accepted,
        report.received.rejected,
        started.elapsed()
    );

    if report.received.rejected > 0 || right_sink != args.message.as_bytes() {
        return Err("message was not authenticated end to end".into());
    }
    Ok(())
}
