/// Composite-modulus multiplicative groups (prover-side and modulus-only).
pub mod composite;
/// Integers modulo `n` with fixed-width serialization.
pub mod ring;

pub use composite::{setup_composite, CompositeGroup, Invertible, ModulusGroup, MultiplicativeGroup};
pub use ring::ModRing;
