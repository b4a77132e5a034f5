//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Sweep scheduler configuration.
    #[serde(default)]
    pub sweeps: SweepConfig,
    /// Billing policy configuration.
    #[serde(default)]
    pub billing: BillingPolicy,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Sweep scheduler configuration (intervals in seconds).
#[derive(Debug, Clone, Deserialize)]
pub struct SweepConfig {
    /// Interval for the consent expiry sweep.
    #[serde(default = "default_consent_sweep_secs")]
    pub consent_expiry_secs: u64,
    /// Interval for the invoice overdue sweep.
    #[serde(default = "default_invoice_sweep_secs")]
    pub invoice_overdue_secs: u64,
    /// Interval for the subscription delinquency sweep.
    #[serde(default = "default_delinquency_sweep_secs")]
    pub subscription_delinquency_secs: u64,
    /// Interval for the monthly canteen transfer aggregation.
    #[serde(default = "default_transfer_sweep_secs")]
    pub monthly_transfer_secs: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            consent_expiry_secs: default_consent_sweep_secs(),
            invoice_overdue_secs: default_invoice_sweep_secs(),
            subscription_delinquency_secs: default_delinquency_sweep_secs(),
            monthly_transfer_secs: default_transfer_sweep_secs(),
        }
    }
}

/// Billing policy configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BillingPolicy {
    /// Days past the period end before a past-due subscription is blocked.
    #[serde(default = "default_grace_period_days")]
    pub grace_period_days: i64,
    /// Whether a canceled subscription may be reactivated.
    ///
    /// The product exposes "Reativar" from CANCELED as well as PAUSED,
    /// which conflicts with the usual reading of "canceled" as terminal.
    /// Kept configurable until product confirms the intent.
    #[serde(default = "default_true")]
    pub allow_reactivate_canceled: bool,
}

impl Default for BillingPolicy {
    fn default() -> Self {
        Self {
            grace_period_days: default_grace_period_days(),
            allow_reactivate_canceled: default_true(),
        }
    }
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

const fn default_consent_sweep_secs() -> u64 {
    300
}

const fn default_invoice_sweep_secs() -> u64 {
    3600
}

const fn default_delinquency_sweep_secs() -> u64 {
    3600
}

const fn default_transfer_sweep_secs() -> u64 {
    86400
}

const fn default_grace_period_days() -> i64 {
    15
}

const fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `ESCOLA_ENV`)
    /// 3. Environment variables with `ESCOLA_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("ESCOLA_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("ESCOLA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("ESCOLA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_defaults() {
        let sweeps = SweepConfig::default();
        assert_eq!(sweeps.consent_expiry_secs, 300);
        assert_eq!(sweeps.monthly_transfer_secs, 86400);
    }

    #[test]
    fn test_billing_policy_defaults() {
        let billing = BillingPolicy::default();
        assert_eq!(billing.grace_period_days, 15);
        assert!(billing.allow_reactivate_canceled);
    }
}
