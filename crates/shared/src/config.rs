//! Application configuration management.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Scheduled transfer executor configuration.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Movement limits.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Log output configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
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

/// Scheduled transfer executor configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between executor ticks.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: u64,
    /// Maximum number of due entries processed per tick.
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,
    /// How far ahead of now a transfer may be scheduled.
    #[serde(default = "default_window_hours")]
    pub window_hours: i64,
}

fn default_tick_interval() -> u64 {
    60
}

fn default_batch_size() -> u64 {
    100
}

fn default_window_hours() -> i64 {
    24
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_interval(),
            batch_size: default_batch_size(),
            window_hours: default_window_hours(),
        }
    }
}

/// Per-movement amount limits. `None` disables a limit.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Largest amount a single transfer may move.
    #[serde(default = "default_transfer_limit")]
    pub transfer: Option<Decimal>,
    /// Largest amount a single teller credit or debit may move.
    #[serde(default = "default_teller_limit")]
    pub teller: Option<Decimal>,
    /// Largest amount a single staff-initiated transfer may move.
    #[serde(default = "default_teller_limit")]
    pub teller_transfer: Option<Decimal>,
}

#[allow(clippy::unnecessary_wraps)]
fn default_transfer_limit() -> Option<Decimal> {
    Some(Decimal::from(150_000))
}

#[allow(clippy::unnecessary_wraps)]
fn default_teller_limit() -> Option<Decimal> {
    Some(Decimal::from(250_000))
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            transfer: default_transfer_limit(),
            teller: default_teller_limit(),
            teller_transfer: default_teller_limit(),
        }
    }
}

/// Log output configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of the human-readable format.
    #[serde(default)]
    pub json: bool,
}

fn default_log_filter() -> String {
    "coffer=info,sea_orm=warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
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
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("COFFER").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_load_from_environment_with_defaults() {
        temp_env::with_vars(
            [
                ("COFFER__DATABASE__URL", Some("postgres://localhost/coffer_test")),
                ("RUN_MODE", Some("test-none")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "postgres://localhost/coffer_test");
                assert_eq!(config.database.max_connections, 10);
                assert_eq!(config.scheduler.tick_interval_secs, 60);
                assert_eq!(config.scheduler.batch_size, 100);
                assert_eq!(config.scheduler.window_hours, 24);
                assert_eq!(config.limits.transfer, Some(dec!(150000)));
                assert_eq!(config.limits.teller, Some(dec!(250000)));
                assert_eq!(config.limits.teller_transfer, Some(dec!(250000)));
                assert!(!config.logging.json);
            },
        );
    }

    #[test]
    fn test_environment_overrides_scheduler() {
        temp_env::with_vars(
            [
                ("COFFER__DATABASE__URL", Some("postgres://localhost/coffer_test")),
                ("COFFER__SCHEDULER__TICK_INTERVAL_SECS", Some("5")),
                ("RUN_MODE", Some("test-none")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.scheduler.tick_interval_secs, 5);
            },
        );
    }

    #[test]
    fn test_missing_database_url_fails() {
        temp_env::with_vars(
            [
                ("COFFER__DATABASE__URL", None::<&str>),
                ("RUN_MODE", Some("test-none")),
            ],
            || {
                assert!(AppConfig::load().is_err());
            },
        );
    }
}
