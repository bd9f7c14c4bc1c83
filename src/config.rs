//! Channel settings and key-material provisioning.

use serde::{Deserialize, Serialize};

use crate::channel::MAX_CHUNK_LEN;
use crate::groups::{ModRing, ModulusGroup, MultiplicativeGroup};
use crate::kem::MasterSecret;
use crate::primitives::DEFAULT_SAMPLING_ATTEMPTS;
use crate::protocol::{PrivateKey, PublicKey};
use crate::{Error, Result};

/// What the receiving side does with a chunk whose proof fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RejectPolicy {
    /// Discard the chunk and keep reading.
    #[default]
    Drop,
    /// Hand the chunk to the sink anyway.
    Deliver,
    /// Stop the inbound direction.
    Terminate,
}

/// Tunable channel behaviour.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelSettings {
    /// Bytes per frame when splitting outbound data, `1..=255`.
    pub chunk_size: usize,
    /// Handling of chunks that fail verification.
    pub reject_policy: RejectPolicy,
    /// Cap on rejection-sampling draws for proof randomness.
    pub sampling_attempts: usize,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            chunk_size: MAX_CHUNK_LEN,
            reject_policy: RejectPolicy::Drop,
            sampling_attempts: DEFAULT_SAMPLING_ATTEMPTS,
        }
    }
}

impl ChannelSettings {
    /// Loads settings from `config/channel.toml` and `FFS_*` environment variables.
    ///
    /// Configuration priority: environment variables > TOML file > defaults.
    pub fn from_env() -> Result<Self> {
        use figment::providers::{Env, Format, Serialized, Toml};
        use figment::Figment;

        let settings: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file("config/channel.toml"))
            .merge(Env::prefixed("FFS_"))
            .extract()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 || self.chunk_size > MAX_CHUNK_LEN {
            return Err(Error::Config(format!(
                "chunk_size must be in 1..={MAX_CHUNK_LEN}, got {}",
                self.chunk_size
            )));
        }
        if self.sampling_attempts == 0 {
            return Err(Error::Config(
                "sampling_attempts must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Key material for the sending direction.
#[derive(Clone, Debug)]
pub struct ProverConfig<G: MultiplicativeGroup = ModulusGroup> {
    /// Group the private key lives in.
    pub group: G,
    /// Private key vector.
    pub private: PrivateKey,
    /// Master secret for outbound records.
    pub master: MasterSecret,
}

/// Key material for the receiving direction.
#[derive(Clone, Debug)]
pub struct VerifierConfig {
    /// Modulus-only group.
    pub group: ModulusGroup,
    /// Public key vector of the remote prover.
    pub public: PublicKey,
    /// Master secret for inbound records.
    pub master: MasterSecret,
}

/// Serializable provisioning bundle; every field is lowercase hex.
///
/// Key vectors are fixed-width big-endian concatenations, one element per
/// ring width. `private` is omitted from bundles given to verifiers.
#[derive(Clone, Serialize, Deserialize)]
pub struct Provisioning {
    /// Modulus `n`, big-endian.
    pub modulus: String,
    /// Key vector length.
    pub k: usize,
    /// Public key vector.
    pub public: String,
    /// Private key vector, prover side only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private: Option<String>,
    /// Master secret.
    pub master: String,
}

impl core::fmt::Debug for Provisioning {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Provisioning")
            .field("modulus", &self.modulus)
            .field("k", &self.k)
            .field("public", &self.public)
            .field("private", &self.private.as_ref().map(|_| "<redacted>"))
            .field("master", &"<redacted>")
            .finish()
    }
}

impl Provisioning {
    /// Bundles key material. Pass `private = None` for a verifier-only bundle.
    pub fn new(
        ring: &ModRing,
        public: &PublicKey,
        private: Option<&PrivateKey>,
        master: &MasterSecret,
    ) -> Result<Self> {
        let private = match private {
            Some(key) => Some(hex::encode(key.to_bytes(ring)?)),
            None => None,
        };

        Ok(Self {
            modulus: hex::encode(ring.to_bytes()),
            k: public.len(),
            public: hex::encode(public.to_bytes(ring)?),
            private,
            master: hex::encode(master.expose()),
        })
    }

    /// Drops the private key vector.
    pub fn without_private(mut self) -> Self {
        self.private = None;
        self
    }

    /// Rebuilds the modulus-only group.
    pub fn group(&self) -> Result<ModulusGroup> {
        ModulusGroup::from_bytes(&decode_hex("modulus", &self.modulus)?)
    }

    /// Builds the sending-side configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParams`] if the bundle has no private key or any
    /// field fails to parse.
    pub fn prover_config(&self) -> Result<ProverConfig> {
        let Some(private) = &self.private else {
            return Err(Error::InvalidParams(
                "provisioning bundle has no private key".to_string(),
            ));
        };

        let group = self.group()?;
        let private = PrivateKey::from_bytes(&group, self.k, &decode_hex("private", private)?)?;
        Ok(ProverConfig {
            group,
            private,
            master: MasterSecret::new(decode_hex("master", &self.master)?)?,
        })
    }

    /// Builds the receiving-side configuration.
    pub fn verifier_config(&self) -> Result<VerifierConfig> {
        let group = self.group()?;
        let public = PublicKey::from_bytes(&group, self.k, &decode_hex("public", &self.public)?)?;
        Ok(VerifierConfig {
            group,
            public,
            master: MasterSecret::new(decode_hex("master", &self.master)?)?,
        })
    }
}

fn decode_hex(field: &str, value: &str) -> Result<Vec<u8>> {
    hex::decode(value).map_err(|e| Error::InvalidParams(format!("{field}: {e}")))
}

#[cfg(test)]
mod tests {
    use num_bigint::BigUint;

    use super::*;
    use crate::groups::CompositeGroup;
    use crate::protocol::KeyPair;
    use crate::SecureRng;

    fn bundle() -> (CompositeGroup, KeyPair, Provisioning) {
        let group =
            CompositeGroup::from_primes(&BigUint::from(1_000_003u32), &BigUint::from(999_983u32))
                .unwrap();
        let mut rng = SecureRng::new();
        let pair = KeyPair::generate(&mut rng, &group, 16).unwrap();
        let master = MasterSecret::new(b"secret".to_vec()).unwrap();

        let bundle = Provisioning::new(group.ring(), &pair.public, Some(&pair.private), &master)
            .unwrap();
        (group, pair, bundle)
    }

    #[test]
    fn defaults_are_valid() {
        let settings = ChannelSettings::default();
        assert_eq!(settings.chunk_size, 255);
        assert_eq!(settings.reject_policy, RejectPolicy::Drop);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn chunk_size_bounds() {
        for chunk_size in [0, 256] {
            let settings = ChannelSettings {
                chunk_size,
                ..Default::default()
            };
            assert!(matches!(settings.validate(), Err(Error::Config(_))));
        }
    }

    #[test]
    fn figment_reads_env_overrides() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("FFS_CHUNK_SIZE", "64");
            jail.set_env("FFS_REJECT_POLICY", "terminate");

            let settings = ChannelSettings::from_env().map_err(|e| e.to_string())?;
            assert_eq!(settings.chunk_size, 64);
            assert_eq!(settings.reject_policy, RejectPolicy::Terminate);
            assert_eq!(settings.sampling_attempts, DEFAULT_SAMPLING_ATTEMPTS);
            Ok(())
        });
    }

    #[test]
    fn figment_reads_toml_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_dir("config")?;
            jail.create_file(
                "config/channel.toml",
                "chunk_size = 100\nreject_policy = \"deliver\"\n",
            )?;

            let settings = ChannelSettings::from_env().map_err(|e| e.to_string())?;
            assert_eq!(settings.chunk_size, 100);
            assert_eq!(settings.reject_policy, RejectPolicy::Deliver);
            Ok(())
        });
    }

    #[test]
    fn figment_rejects_out_of_range_chunk() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("FFS_CHUNK_SIZE", "300");
            assert!(matches!(ChannelSettings::from_env(), Err(Error::Config(_))));
            Ok(())
        });
    }

    #[test]
    fn provisioning_restores_both_sides() {
        let (group, pair, bundle) = bundle();

        let prover = bundle.prover_config().unwrap();
        assert_eq!(prover.group.modulus(), group.modulus());
        assert_eq!(prover.private, pair.private);

        let verifier = bundle.without_private().verifier_config().unwrap();
        assert_eq!(verifier.public, pair.public);
        assert_eq!(verifier.master.expose(), b"secret");
    }

    #[test]
    fn verifier_bundle_cannot_build_prover() {
        let (_, _, bundle) = bundle();
        assert!(matches!(
            bundle.without_private().prover_config(),
            Err(Error::InvalidParams(_))
        ));
    }

    #[test]
    fn verifier_bundle_parses_from_toml() {
        use figment::providers::{Format, Toml};
        use figment::Figment;

        let (_, pair, bundle) = bundle();
        let text = format!(
            "modulus = \"{}\"\nk = {}\npublic = \"{}\"\nmaster = \"{}\"\n",
            bundle.modulus, bundle.k, bundle.public, bundle.master
        );

        let parsed: Provisioning = Figment::from(Toml::string(&text)).extract().unwrap();
        assert!(parsed.private.is_none());
        assert_eq!(parsed.verifier_config().unwrap().public, pair.public);
    }

    #[test]
    fn debug_hides_secrets() {
        let (_, _, bundle) = bundle();
        let rendered = format!("{bundle:?}");
        assert!(!rendered.contains(&bundle.master));
        assert!(rendered.contains("redacted"));
    }
}
