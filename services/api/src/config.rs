//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// The transactions endpoint used when `PAYMENT_API_URL` is not set.
pub const DEFAULT_PAYMENT_API_URL: &str = "https://api.frendz.com.br/api/public/v1/transactions";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Timer periods for the background loops.
#[derive(Clone, Debug)]
pub struct TimerConfig {
    pub status_flip_interval: Duration,
    pub status_flip_probability: f64,
    pub toast_visible: Duration,
    pub toast_exit: Duration,
    pub verification_delay: Duration,
    pub call_tick: Duration,
}

impl TimerConfig {
    /// How long a toast stays up before it is dismissed, exit animation included.
    pub fn toast_lifetime(&self) -> Duration {
        self.toast_visible + self.toast_exit
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            status_flip_interval: Duration::from_secs(5),
            status_flip_probability: 0.1,
            toast_visible: Duration::from_millis(4000),
            toast_exit: Duration::from_millis(500),
            verification_delay: Duration::from_secs(5),
            call_tick: Duration::from_millis(1000),
        }
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    /// When set, the durable slot lives in Postgres instead of `data_dir`.
    pub database_url: Option<String>,
    pub data_dir: PathBuf,
    /// When set, the catalog is fetched from `{catalog_url}/api/models`.
    pub catalog_url: Option<String>,
    pub catalog_path: PathBuf,
    pub payment_api_url: String,
    pub payment_api_token: Option<String>,
    pub admin_token: Option<String>,
    pub cors_origin: String,
    pub timers: TimerConfig,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin = std::env::var("CORS_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        // --- Load Collaborator Settings ---
        let database_url = optional_var("DATABASE_URL");
        let data_dir = std::env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));

        let catalog_url = optional_var("CATALOG_URL");
        let catalog_path = std::env::var("CATALOG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./db.json"));

        let payment_api_url = std::env::var("PAYMENT_API_URL")
            .unwrap_or_else(|_| DEFAULT_PAYMENT_API_URL.to_string());
        let payment_api_token = optional_var("PAYMENT_API_TOKEN");
        let admin_token = optional_var("ADMIN_TOKEN");

        // --- Load Timer Settings ---
        let defaults = TimerConfig::default();
        let status_flip_probability: f64 =
            parse_var("STATUS_FLIP_PROBABILITY", defaults.status_flip_probability)?;
        if !(0.0..=1.0).contains(&status_flip_probability) {
            return Err(ConfigError::InvalidValue(
                "STATUS_FLIP_PROBABILITY".to_string(),
                format!("{} is not between 0 and 1", status_flip_probability),
            ));
        }
        let timers = TimerConfig {
            status_flip_interval: Duration::from_secs(parse_var(
                "STATUS_FLIP_INTERVAL_SECS",
                defaults.status_flip_interval.as_secs(),
            )?),
            status_flip_probability,
            toast_visible: Duration::from_millis(parse_var(
                "TOAST_VISIBLE_MS",
                defaults.toast_visible.as_millis() as u64,
            )?),
            toast_exit: Duration::from_millis(parse_var(
                "TOAST_EXIT_MS",
                defaults.toast_exit.as_millis() as u64,
            )?),
            verification_delay: Duration::from_secs(parse_var(
                "VERIFICATION_DELAY_SECS",
                defaults.verification_delay.as_secs(),
            )?),
            call_tick: Duration::from_millis(parse_var(
                "CALL_TICK_MS",
                defaults.call_tick.as_millis() as u64,
            )?),
        };
        if timers.call_tick.is_zero() || timers.status_flip_interval.is_zero() {
            return Err(ConfigError::InvalidValue(
                "CALL_TICK_MS / STATUS_FLIP_INTERVAL_SECS".to_string(),
                "timer periods must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            bind_address,
            log_level,
            database_url,
            data_dir,
            catalog_url,
            catalog_path,
            payment_api_url,
            payment_api_token,
            admin_token,
            cors_origin,
            timers,
        })
    }
}

/// Unset and empty values both count as absent.
fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional_var(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timers_match_the_storefront() {
        let timers = TimerConfig::default();

        assert_eq!(timers.toast_lifetime(), Duration::from_millis(4500));
        assert_eq!(timers.call_tick, Duration::from_secs(1));
        assert_eq!(timers.status_flip_probability, 0.1);
    }

    #[test]
    fn unparsable_numbers_are_reported_by_name() {
        // Tests share the process environment; keep the name unique.
        std::env::set_var("AURA_TEST_TICK", "soon");

        let err = parse_var::<u64>("AURA_TEST_TICK", 1).unwrap_err();

        assert!(err.to_string().contains("AURA_TEST_TICK"));
        std::env::remove_var("AURA_TEST_TICK");
    }

    #[test]
    fn missing_numbers_fall_back_to_default() {
        assert_eq!(parse_var::<u64>("AURA_TEST_UNSET_VAR", 7).unwrap(), 7);
    }
}
