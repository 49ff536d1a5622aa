use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

// ------------------------------------------------------------
// Root configuration
// ------------------------------------------------------------
//
// Loaded from an optional `config.json` next to the binaries.
// Every field has a production default, so a missing file is
// not an error: both binaries run against Finney out of the box
// with no flags and no environment variables.
//
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    /// Which chain endpoint the collector talks to
    pub network: NetworkConfig,

    /// Where artifacts are written
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

// ------------------------------------------------------------
// Network configuration
// ------------------------------------------------------------
//
// Only public chain state is read; no credentials are involved.
//
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NetworkConfig {
    /// Network tag recorded in the Collection (e.g. "finney")
    pub name: String,

    /// WebSocket RPC endpoint of a public archive/lite node
    pub endpoint: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            name: "finney".to_string(),
            endpoint: "wss://entrypoint-finney.opentensor.ai:443".to_string(),
        }
    }
}

// ------------------------------------------------------------
// Output paths
// ------------------------------------------------------------
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    /// Destination of the Collection JSON document
    pub collection: PathBuf,

    /// Directory receiving one Markdown profile per subnet
    pub profiles: PathBuf,

    /// Directory holding optional hand-written or agent-written
    /// per-subnet descriptions (`<id>.md`), substituted into the
    /// Primary Function section when present
    pub descriptions: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            collection: PathBuf::from("data/subnets.json"),
            profiles: PathBuf::from("data/profiles"),
            descriptions: PathBuf::from("data/descriptions"),
        }
    }
}

impl Config {
    /// Load configuration from `path`, falling back to defaults
    /// when the file does not exist. A file that exists but does
    /// not parse is an error: silently ignoring it would run the
    /// collector against the wrong network.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let cfg = serde_json::from_str(&data)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = Config::load("definitely/not/a/config.json").unwrap();
        assert_eq!(cfg.network.name, "finney");
        assert_eq!(cfg.output.collection, PathBuf::from("data/subnets.json"));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"network": {"name": "test"}}"#).unwrap();

        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.network.name, "test");
        // Unnamed fields keep their defaults.
        assert_eq!(
            cfg.network.endpoint,
            "wss://entrypoint-finney.opentensor.ai:443"
        );
        assert_eq!(cfg.output.profiles, PathBuf::from("data/profiles"));
        assert_eq!(cfg.output.descriptions, PathBuf::from("data/descriptions"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(Config::load(&path).is_err());
    }
}
