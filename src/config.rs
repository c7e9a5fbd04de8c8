//! Configuration for the `ebics-nexus` binary.
//!
//! The config parser itself is an out-of-scope collaborator (a single
//! text file supplies a typed bundle); what lives here is the typed
//! `Config` struct and the `clap`/`serde` loading path, the same split the
//! teacher draws in `src/config.rs` between `CliArgs` (the `--config` flag)
//! and `Config` (the deserialized bundle).

use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// CLI arguments shared by every subcommand: where the configuration file
/// lives.
#[derive(Parser, Debug)]
#[command(name = "ebics-nexus")]
pub struct CliArgs {
    /// Path to the TOML configuration file.
    #[arg(long, short, env = "EBICS_NEXUS_CONFIG", default_value = "nexus.conf")]
    pub config: PathBuf,
}

/// `[nexus-ebics]`: the one configured EBICS subscriber and the account it
/// speaks for.
#[derive(Debug, Clone, Deserialize)]
pub struct EbicsSection {
    pub currency: String,
    pub host_base_url: String,
    pub host_id: String,
    pub user_id: String,
    pub partner_id: String,
    pub iban: String,
    pub bic: Option<String>,
    pub name: String,
    pub bank_public_keys_file: PathBuf,
    pub client_private_keys_file: PathBuf,
    #[serde(default = "defaults::dialect")]
    pub bank_dialect: String,
}

/// `[nexus-fetch]`: the fetch scheduler's cadence.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchSection {
    #[serde(default = "defaults::fetch_frequency")]
    pub frequency: String,
    pub ignore_transactions_before: Option<String>,
}

impl Default for FetchSection {
    fn default() -> Self {
        FetchSection {
            frequency: defaults::fetch_frequency(),
            ignore_transactions_before: None,
        }
    }
}

/// `[libeufin-nexusdb-postgres]`: the Postgres connection and schema
/// migration directory (the migration tool itself is out of scope; this
/// only names where it put its SQL).
#[derive(Debug, Clone, Deserialize)]
pub struct DbSection {
    pub config: String,
    pub sql_dir: Option<PathBuf>,
}

/// `[gateway]`: the HTTP facade's bind address and Basic-auth credentials.
/// Not named in `spec.md`'s configuration-key excerpt but required to
/// stand the facade up; grouped with the rest of the ambient stack the
/// way the teacher's `Config` carries `host`/`port` alongside protocol
/// settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewaySection {
    #[serde(default = "defaults::gateway_host")]
    pub host: String,
    #[serde(default = "defaults::gateway_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
}

mod defaults {
    pub fn dialect() -> String {
        "h004".to_string()
    }

    pub fn fetch_frequency() -> String {
        "5m".to_string()
    }

    pub fn gateway_host() -> String {
        "127.0.0.1".to_string()
    }

    pub fn gateway_port() -> u16 {
        8080
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(rename = "nexus-ebics")]
    pub ebics: EbicsSection,
    #[serde(rename = "nexus-fetch", default)]
    pub fetch: FetchSection,
    #[serde(rename = "libeufin-nexusdb-postgres")]
    pub db: DbSection,
    #[serde(default)]
    pub gateway: GatewaySection,
}

impl Default for GatewaySection {
    fn default() -> Self {
        GatewaySection {
            host: defaults::gateway_host(),
            port: defaults::gateway_port(),
            username: "nexus".to_string(),
            password: "change-me".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file at {0}: {1}")]
    FileRead(PathBuf, std::io::Error),
    #[error("failed to parse config file: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl Config {
    /// Loads configuration from the `--config`/`EBICS_NEXUS_CONFIG` path.
    pub fn load(cli_args: &CliArgs) -> Result<Self, ConfigError> {
        Self::load_from_path(&cli_args.config)
    }

    fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_path_buf(), e))?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_config() {
        let text = r#"
            [nexus-ebics]
            currency = "EUR"
            host_base_url = "https://bank.example/ebics"
            host_id = "HOST01"
            user_id = "USER1"
            partner_id = "PARTNER1"
            iban = "DE89370400440532013000"
            bic = "COBADEFFXXX"
            name = "Example GmbH"
            bank_public_keys_file = "bank.pub"
            client_private_keys_file = "client.key"

            [nexus-fetch]

            [libeufin-nexusdb-postgres]
            config = "postgres://nexus@localhost/nexus"

            [gateway]
            username = "nexus"
            password = "secret"
        "#;
        let config: Config = toml::from_str(text).unwrap();
        assert_eq!(config.ebics.currency, "EUR");
        assert_eq!(config.fetch.frequency, "5m");
        assert_eq!(config.gateway.port, 8080);
    }
}
