use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CadenceError, Result};

pub const DEFAULT_OFFLINE_RATE: f64 = 10.0; // ticks per second
pub const DEFAULT_FRAME_RATE: f64 = 60.0; // typical display refresh
pub const DEFAULT_LOG_CAPACITY: usize = 60 * 60 * 20; // twenty minutes at 60 fps

/// Top-level config (cadence.toml + CADENCE_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CadenceConfig {
    #[serde(default)]
    pub clock: ClockConfig,
    #[serde(default)]
    pub logger: LoggerConfig,
}

/// Which clock implementation drives the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockKind {
    /// Manually stepped, no reference to wall-clock time.
    Offline,
    /// Samples the monotonic system clock on every tick.
    Realtime,
    /// Realtime clock ticked once per rendered frame.
    Frame,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockConfig {
    #[serde(default = "default_clock_kind")]
    pub kind: ClockKind,
    /// Ticks per second. When unset the kind's natural rate is used.
    #[serde(default)]
    pub rate: Option<f64>,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            kind: default_clock_kind(),
            rate: None,
        }
    }
}

impl ClockConfig {
    /// Effective tick rate: the configured value or the kind's default.
    pub fn effective_rate(&self) -> f64 {
        self.rate.unwrap_or(match self.kind {
            ClockKind::Frame => DEFAULT_FRAME_RATE,
            ClockKind::Offline | ClockKind::Realtime => DEFAULT_OFFLINE_RATE,
        })
    }
}

/// Tick-interval logger settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggerConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Maximum number of intervals retained; later ticks are counted but not stored.
    #[serde(default = "default_log_capacity")]
    pub capacity: usize,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            capacity: default_log_capacity(),
        }
    }
}

fn default_clock_kind() -> ClockKind {
    ClockKind::Offline
}
fn default_log_capacity() -> usize {
    DEFAULT_LOG_CAPACITY
}

impl CadenceConfig {
    /// Load config from a TOML file with CADENCE_* env var overrides.
    ///
    /// Falls back to `~/.cadence/cadence.toml` when no path is given. A
    /// missing file is not an error; every section has defaults.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);
        debug!(%path, "loading config");

        Self::extract(
            Figment::new()
                .merge(Toml::file(&path))
                .merge(Env::prefixed("CADENCE_").split("_")),
        )
    }

    /// Extract and validate a config from an already-assembled figment.
    pub fn extract(figment: Figment) -> Result<Self> {
        let config: CadenceConfig = figment
            .extract()
            .map_err(|e| CadenceError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if let Some(rate) = self.clock.rate {
            if !rate.is_finite() || rate <= 0.0 {
                return Err(CadenceError::Config(format!(
                    "clock.rate must be a positive number, got {rate}"
                )));
            }
        }
        if self.logger.capacity == 0 {
            return Err(CadenceError::Config(
                "logger.capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.cadence/cadence.toml", home)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(toml: &str) -> Result<CadenceConfig> {
        CadenceConfig::extract(Figment::new().merge(Toml::string(toml)))
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = from_toml("").unwrap();
        assert_eq!(config.clock.kind, ClockKind::Offline);
        assert_eq!(config.clock.rate, None);
        assert!(!config.logger.enabled);
        assert_eq!(config.logger.capacity, DEFAULT_LOG_CAPACITY);
    }

    #[test]
    fn clock_section_parses() {
        let config = from_toml(
            r#"
            [clock]
            kind = "realtime"
            rate = 100.0
            "#,
        )
        .unwrap();
        assert_eq!(config.clock.kind, ClockKind::Realtime);
        assert_eq!(config.clock.effective_rate(), 100.0);
    }

    #[test]
    fn frame_clock_defaults_to_display_rate() {
        let config = from_toml("[clock]\nkind = \"frame\"").unwrap();
        assert_eq!(config.clock.effective_rate(), DEFAULT_FRAME_RATE);
    }

    #[test]
    fn non_positive_rate_rejected() {
        let err = from_toml("[clock]\nrate = 0.0").unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
        assert!(err.to_string().contains("clock.rate"));
    }

    #[test]
    fn zero_log_capacity_rejected() {
        assert!(from_toml("[logger]\ncapacity = 0").is_err());
    }

    #[test]
    fn env_overrides_use_single_underscore_nesting() {
        // No other test in this crate reads CADENCE_* variables.
        std::env::set_var("CADENCE_CLOCK_KIND", "frame");
        std::env::set_var("CADENCE_LOGGER_CAPACITY", "120");
        let config = CadenceConfig::load(Some("/nonexistent/cadence.toml"));
        std::env::remove_var("CADENCE_CLOCK_KIND");
        std::env::remove_var("CADENCE_LOGGER_CAPACITY");

        let config = config.unwrap();
        assert_eq!(config.clock.kind, ClockKind::Frame);
        assert_eq!(config.logger.capacity, 120);
    }

    #[test]
    fn unknown_clock_kind_is_config_error() {
        let err = from_toml("[clock]\nkind = \"sundial\"").unwrap_err();
        assert!(matches!(err, CadenceError::Config(_)));
    }
}
