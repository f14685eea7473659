//! Configuration management for the `VitalAir` application
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::VitalAirError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the `VitalAir` application
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VitalAirConfig {
    /// Forecast dataset locations
    pub data: DataConfig,
    /// Dashboard web server settings
    pub server: ServerConfig,
    /// Chat bot settings
    pub bot: BotConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Forecast CSV locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Combined AQI forecast CSV
    pub aqi_forecast_path: PathBuf,
    /// Combined HRI forecast CSV
    pub hri_forecast_path: PathBuf,
}

/// Web server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Directory served for paths outside `/api`
    pub static_dir: Option<PathBuf>,
    /// PEM certificate chain, enables HTTPS together with `tls_key_path`
    pub tls_cert_path: Option<PathBuf>,
    /// PEM private key
    pub tls_key_path: Option<PathBuf>,
}

/// Telegram bot settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Whether the bot runs at all
    pub enabled: bool,
    /// Run the bot inside the `serve` process
    pub embedded: bool,
    /// Bot API token
    pub token: Option<String>,
    /// Bot API base URL
    pub api_base_url: String,
    /// Long-polling timeout in seconds
    pub poll_timeout_seconds: u32,
    /// Retries for transient HTTP failures
    pub max_retries: u32,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
}

// Default value functions
fn default_aqi_forecast_path() -> PathBuf {
    PathBuf::from("./data/combined_AQI_forecast.csv")
}

fn default_hri_forecast_path() -> PathBuf {
    PathBuf::from("./data/combined_HRI_forecast.csv")
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_bot_api_base_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout() -> u32 {
    30
}

fn default_bot_max_retries() -> u32 {
    3
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            aqi_forecast_path: default_aqi_forecast_path(),
            hri_forecast_path: default_hri_forecast_path(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: None,
            tls_cert_path: None,
            tls_key_path: None,
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            embedded: true,
            token: None,
            api_base_url: default_bot_api_base_url(),
            poll_timeout_seconds: default_poll_timeout(),
            max_retries: default_bot_max_retries(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl VitalAirConfig {
    /// Load configuration from the given file (or the default locations)
    /// and environment variables
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path()
                .filter(|p| p.exists())
                .unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. VITALAIR_SERVER__PORT=9000
        builder = builder.add_source(
            Environment::with_prefix("VITALAIR")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: VitalAirConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_deployment_env(|key| std::env::var(key).ok());
        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("vitalair").join("config.toml"))
    }

    /// Honour the plain variables hosting platforms set: `PORT`,
    /// `TELEGRAM_BOT_TOKEN` and `RAILWAY_ENVIRONMENT`.
    pub fn apply_deployment_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT").and_then(|p| p.trim().parse().ok()) {
            self.server.port = port;
        }
        if self.bot.token.is_none() {
            self.bot.token = lookup("TELEGRAM_BOT_TOKEN").filter(|t| !t.is_empty());
        }
        // On Railway the bot is deployed as its own service
        if lookup("RAILWAY_ENVIRONMENT").as_deref() == Some("production") {
            self.bot.embedded = false;
        }
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.data.aqi_forecast_path.as_os_str().is_empty() {
            self.data.aqi_forecast_path = default_aqi_forecast_path();
        }
        if self.data.hri_forecast_path.as_os_str().is_empty() {
            self.data.hri_forecast_path = default_hri_forecast_path();
        }
        if self.server.host.is_empty() {
            self.server.host = default_host();
        }
        if self.bot.api_base_url.is_empty() {
            self.bot.api_base_url = default_bot_api_base_url();
        }
        if self.bot.poll_timeout_seconds == 0 {
            self.bot.poll_timeout_seconds = default_poll_timeout();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Whether `serve` should also start the bot
    #[must_use]
    pub fn runs_embedded_bot(&self) -> bool {
        self.bot.enabled && self.bot.embedded && self.bot.token.is_some()
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_bot_token()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        self.validate_tls_paths()?;
        Ok(())
    }

    /// Validate the bot token shape
    pub fn validate_bot_token(&self) -> Result<()> {
        if let Some(token) = &self.bot.token {
            if token.trim().is_empty() {
                return Err(VitalAirError::config(
                    "Bot token cannot be empty if provided. Either remove it or provide a valid token.",
                )
                .into());
            }

            if !token.contains(':') {
                return Err(VitalAirError::config(
                    "Bot token appears to be invalid (expected '<id>:<secret>'). Please check your token.",
                )
                .into());
            }
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(VitalAirError::config("Server port cannot be 0").into());
        }

        if self.bot.poll_timeout_seconds > 300 {
            return Err(
                VitalAirError::config("Bot poll timeout cannot exceed 300 seconds").into(),
            );
        }

        if self.bot.max_retries > 10 {
            return Err(VitalAirError::config("Bot max retries cannot exceed 10").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(VitalAirError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(VitalAirError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if !self.bot.api_base_url.starts_with("http://")
            && !self.bot.api_base_url.starts_with("https://")
        {
            return Err(VitalAirError::config(
                "Bot API base URL must be a valid HTTP or HTTPS URL",
            )
            .into());
        }

        Ok(())
    }

    fn validate_tls_paths(&self) -> Result<()> {
        match (&self.server.tls_cert_path, &self.server.tls_key_path) {
            (Some(_), None) | (None, Some(_)) => Err(VitalAirError::config(
                "TLS needs both tls_cert_path and tls_key_path",
            )
            .into()),
            _ => Ok(()),
        }
    }
}
