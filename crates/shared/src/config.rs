//! Application configuration management.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Ledger engine tuning.
    #[serde(default)]
    pub ledger: LedgerConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Ledger engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Maximum accepted difference between total debit and total credit.
    #[serde(default = "default_balance_tolerance")]
    pub balance_tolerance: Decimal,
    /// Default page size for entry listings.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// How many times a mutation is attempted when it hits a retryable conflict.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// Inflation index table used when the caller does not name one.
    #[serde(default = "default_inflation_table")]
    pub default_inflation_table: String,
}

fn default_balance_tolerance() -> Decimal {
    crate::types::money::BALANCE_TOLERANCE
}

fn default_page_size() -> u32 {
    50
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_inflation_table() -> String {
    "A".to_string()
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            balance_tolerance: default_balance_tolerance(),
            page_size: default_page_size(),
            retry_attempts: default_retry_attempts(),
            default_inflation_table: default_inflation_table(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("PARTIDA").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
