//! Controller timing configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Debounce and refresh timings for the task controller.
///
/// # Examples
///
/// ```
/// use courier_relay::config::ControllerConfig;
/// use std::time::Duration;
///
/// let config = ControllerConfig::from_toml_str("refresh_interval_ms = 10000")?;
/// assert_eq!(config.refresh_interval(), Duration::from_secs(10));
/// assert_eq!(config.time_field_debounce(), Duration::from_millis(300));
/// # Ok::<(), courier_relay::config::ConfigError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Debounce window for time fields and rider patches.
    pub time_field_debounce_ms: u64,
    /// Debounce window for contact, address and priority edits.
    pub text_field_debounce_ms: u64,
    /// Delay between background refreshes.
    pub refresh_interval_ms: u64,
    /// Delay before rechecking when the controller is busy or idle.
    pub refresh_backoff_ms: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            time_field_debounce_ms: 300,
            text_field_debounce_ms: 500,
            refresh_interval_ms: 30_000,
            refresh_backoff_ms: 3_000,
        }
    }
}

impl ControllerConfig {
    /// Parses a configuration from TOML text, defaulting missing keys.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the text is not valid TOML or a
    /// key has the wrong type.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Renders the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Render`] when serialization fails.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Returns a configuration with every debounce window disabled.
    #[must_use]
    pub const fn without_debounce(self) -> Self {
        Self {
            time_field_debounce_ms: 0,
            text_field_debounce_ms: 0,
            ..self
        }
    }

    /// Debounce window for time fields and rider patches.
    #[must_use]
    pub const fn time_field_debounce(&self) -> Duration {
        Duration::from_millis(self.time_field_debounce_ms)
    }

    /// Debounce window for contact, address and priority edits.
    #[must_use]
    pub const fn text_field_debounce(&self) -> Duration {
        Duration::from_millis(self.text_field_debounce_ms)
    }

    /// Delay between background refreshes.
    #[must_use]
    pub const fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    /// Delay before rechecking a busy or idle controller.
    #[must_use]
    pub const fn refresh_backoff(&self) -> Duration {
        Duration::from_millis(self.refresh_backoff_ms)
    }
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML text could not be parsed.
    #[error("invalid controller configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// The configuration could not be rendered.
    #[error("failed to render controller configuration: {0}")]
    Render(#[from] toml::ser::Error),
}
