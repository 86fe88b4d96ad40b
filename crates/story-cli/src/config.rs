use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use story_program::RuntimeConfig;
use story_types::Address;

/// Config file read from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "story.toml";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    #[serde(with = "hex_address")]
    pub program_id: Address,
    pub ledger_path: PathBuf,
    pub keypair_path: PathBuf,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            program_id: story_program::ID,
            ledger_path: PathBuf::from(".story/ledger.wal"),
            keypair_path: PathBuf::from(".story/id.json"),
        }
    }
}

impl CliConfig {
    /// Load `explicit` (which must exist), else `story.toml` if present,
    /// else defaults.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let path = match explicit {
            Some(path) => path,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Path::new(DEFAULT_CONFIG_FILE),
            None => return Ok(Self::default()),
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            program_id: self.program_id,
            ..RuntimeConfig::default()
        }
    }
}

mod hex_address {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use story_types::Address;

    pub fn serialize<S: Serializer>(address: &Address, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&address.to_hex())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Address, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::from_hex(&s).map_err(de::Error::custom)
    }
}
