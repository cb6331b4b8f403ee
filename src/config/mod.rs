//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables carry the `SAVINGS_TRACKER`
//! prefix and nested values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use savings_tracker::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on port {}", config.server.port);
//! ```

mod database;
mod error;
mod server;
mod sync;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use server::{Environment, ServerConfig};
pub use sync::SyncConfig;

use serde::Deserialize;

use crate::adapters::rate_limiter::ThrottleConfig;

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a working
/// development server backed by the in-memory store.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (optional PostgreSQL connection)
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Viewer feed configuration (reaper, queue depth, goal)
    #[serde(default)]
    pub sync: SyncConfig,

    /// Mutation throttle limits per tier
    #[serde(default)]
    pub throttle: ThrottleConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `SAVINGS_TRACKER` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `SAVINGS_TRACKER__SERVER__PORT=5000` -> `server.port = 5000`
    /// - `SAVINGS_TRACKER__DATABASE__URL=...` -> `database.url = ...`
    /// - `SAVINGS_TRACKER__THROTTLE__CLEAR__MAX_REQUESTS=3`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("SAVINGS_TRACKER")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.sync.validate()?;
        if let Some(tier) = self.throttle.first_invalid_tier() {
            return Err(ValidationError::InvalidThrottleTier(tier.as_str()));
        }
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "SAVINGS_TRACKER__DATABASE__URL",
        "SAVINGS_TRACKER__SERVER__PORT",
        "SAVINGS_TRACKER__SERVER__ENVIRONMENT",
        "SAVINGS_TRACKER__SYNC__SAVINGS_GOAL",
        "SAVINGS_TRACKER__THROTTLE__CLEAR__MAX_REQUESTS",
        "SAVINGS_TRACKER__THROTTLE__CLEAR__WINDOW_SECS",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_with_empty_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let result = AppConfig::load();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert!(config.database.url().is_none());
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.throttle, ThrottleConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("SAVINGS_TRACKER__DATABASE__URL", "postgresql://test@localhost/test");
        env::set_var("SAVINGS_TRACKER__SYNC__SAVINGS_GOAL", "2500");
        env::set_var("SAVINGS_TRACKER__THROTTLE__CLEAR__MAX_REQUESTS", "7");
        env::set_var("SAVINGS_TRACKER__THROTTLE__CLEAR__WINDOW_SECS", "1800");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.database.url(), Some("postgresql://test@localhost/test"));
        assert_eq!(config.sync.savings_goal, 2500.0);
        assert_eq!(config.throttle.clear.max_requests, 7);
        assert_eq!(config.throttle.clear.window_secs, 1800);
        assert_eq!(config.throttle.write, ThrottleConfig::default().write);
    }

    #[test]
    fn test_is_production() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("SAVINGS_TRACKER__SERVER__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.is_production());
    }

    #[test]
    fn test_custom_server_port() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("SAVINGS_TRACKER__SERVER__PORT", "3000");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_validate_rejects_zero_throttle_limit() {
        let mut config = AppConfig::default();
        config.throttle.clear.max_requests = 0;
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidThrottleTier("clear"))
        );
    }
}
