use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment};
use serde::Deserialize;
use std::convert::TryFrom;

pub const DEFAULT_RPC_URL: &str = "https://api.mainnet-beta.solana.com";

/// Default minimum organic score a search match needs to resolve cleanly.
/// Deployments override via MIN_TOKEN_SCORE.
pub const DEFAULT_MIN_TOKEN_SCORE: f64 = 95.0;

/// Process-wide settings, established at startup and read-only thereafter.
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// Solana RPC endpoint used for authoritative mint lookups.
    pub rpc_url: String,

    /// Optional Jupiter API key; selects the paid endpoint when present.
    pub jupiter_api_key: Option<String>,

    /// Minimum organic score for token search matches.
    pub min_token_score: f64,

    /// Console log level when RUST_LOG is unset.
    pub log_level: String,
}

impl TryFrom<Config> for Settings {
    type Error = ConfigError;

    fn try_from(config: Config) -> Result<Self, Self::Error> {
        Ok(Settings {
            rpc_url: config.get_string("rpc_url")?,
            jupiter_api_key: config.get_string("jupiter_api_key").ok(),
            min_token_score: config.get_float("min_token_score")?,
            log_level: config.get_string("log_level")?,
        })
    }
}

impl Settings {
    /// Loads settings from the environment, falling back to defaults for
    /// everything but credentials.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = ConfigBuilder::<DefaultState>::default()
            .set_default("rpc_url", DEFAULT_RPC_URL)?
            .set_default("min_token_score", DEFAULT_MIN_TOKEN_SCORE)?
            .set_default("log_level", "info")?
            .add_source(Environment::default())
            .build()?;

        Settings::try_from(config)
    }
}
