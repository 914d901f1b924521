//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `INTAKE_AGENT_` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use intake_agent::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {:?}", config.server.socket_addr());
//! ```

mod ai;
mod error;
mod intake;
mod server;

pub use ai::{AiConfig, OPENAI_API_KEY_ENV};
pub use error::{ConfigError, ValidationError};
pub use intake::{IntakeConfig, RecordSinkKind};
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults; only the OpenAI API key is required.
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment, frame limit)
    #[serde(default)]
    pub server: ServerConfig,

    /// AI provider configuration (OpenAI-compatible endpoint)
    #[serde(default)]
    pub ai: AiConfig,

    /// Intake conversation configuration (timeouts, record sink)
    #[serde(default)]
    pub intake: IntakeConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `INTAKE_AGENT` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `INTAKE_AGENT__SERVER__PORT=5000` -> `server.port = 5000`
    /// - `INTAKE_AGENT__AI__MODEL=gpt-4o` -> `ai.model = "gpt-4o"`
    /// - `INTAKE_AGENT__INTAKE__RECORD_SINK=memory` -> `intake.record_sink = Memory`
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
                    .prefix("INTAKE_AGENT")
                    .prefix_separator("__")
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
        self.ai.validate()?;
        self.intake.validate()?;
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
        "INTAKE_AGENT__SERVER__PORT",
        "INTAKE_AGENT__SERVER__ENVIRONMENT",
        "INTAKE_AGENT__AI__OPENAI_API_KEY",
        "INTAKE_AGENT__AI__MODEL",
        "INTAKE_AGENT__INTAKE__RECORD_SINK",
        "INTAKE_AGENT__INTAKE__EXTRACTION_TIMEOUT_SECS",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_defaults_without_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let config = AppConfig::load().unwrap();

        assert_eq!(config.server.port, 5000);
        assert_eq!(config.ai.model, "gpt-4");
        assert_eq!(config.intake.extraction_timeout_secs, 30);
        assert_eq!(config.intake.record_sink, RecordSinkKind::File);
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("INTAKE_AGENT__SERVER__PORT", "3000");
        env::set_var("INTAKE_AGENT__AI__OPENAI_API_KEY", "sk-test");
        env::set_var("INTAKE_AGENT__AI__MODEL", "gpt-4o-mini");
        env::set_var("INTAKE_AGENT__INTAKE__RECORD_SINK", "memory");
        env::set_var("INTAKE_AGENT__INTAKE__EXTRACTION_TIMEOUT_SECS", "10");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.ai.openai_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.ai.model, "gpt-4o-mini");
        assert_eq!(config.intake.record_sink, RecordSinkKind::Memory);
        assert_eq!(config.intake.extraction_timeout_secs, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_is_production() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("INTAKE_AGENT__SERVER__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        assert!(result.unwrap().is_production());
    }

    #[test]
    fn test_validate_reports_first_bad_section() {
        let config = AppConfig {
            server: ServerConfig {
                port: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidPort));
    }
}
