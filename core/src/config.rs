//! Client configuration loaded from TOML.
//!
//! Every field has a default, so an empty file yields the testnet endpoint,
//! the deployed program id, and auto-connect enabled.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::address::{default_program_id, Address};
use crate::error::ConfigError;

pub const DEFAULT_ENDPOINT: &str = "https://api.testnet.solana.com";

/// Client settings, usually read from a TOML file next to the host app.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_program_id")]
    pub program_id: Address,
    /// RPC endpoint handed to the host's transport.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Reconnect a remembered wallet on startup.
    #[serde(default = "default_auto_connect")]
    pub auto_connect: bool,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_auto_connect() -> bool {
    true
}

impl ClientConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            program_id: default_program_id(),
            endpoint: default_endpoint(),
            auto_connect: default_auto_connect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = ClientConfig::from_toml_str("").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.program_id.to_string(), crate::address::DEFAULT_PROGRAM_ID);
        assert!(config.auto_connect);
    }

    #[test]
    fn fields_override_defaults() {
        let config = ClientConfig::from_toml_str(
            r#"
            program_id = "11111111111111111111111111111111"
            endpoint = "http://127.0.0.1:8899"
            auto_connect = false
            "#,
        )
        .unwrap();
        assert_eq!(config.program_id, Address::SYSTEM_PROGRAM);
        assert_eq!(config.endpoint, "http://127.0.0.1:8899");
        assert!(!config.auto_connect);
    }

    #[test]
    fn bad_program_id_is_a_parse_error() {
        let err = ClientConfig::from_toml_str(r#"program_id = "nope""#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "auto_connect = false").unwrap();
        let config = ClientConfig::load(file.path()).unwrap();
        assert!(!config.auto_connect);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = ClientConfig::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
