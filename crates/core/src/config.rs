//! Layered engine configuration
//!
//! Three layers are consulted per field, highest priority first:
//! 1. Per-instance overrides
//! 2. Ambient defaults shared by many instances
//! 3. Hard-coded defaults (`model` unset, `dbl_delay` 300ms)
//!
//! Resolution never fails. Bad values are corrected and reported as
//! [`ConfigAnomaly`] warnings.

use crate::limiter::RatePolicy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Default quiet period / throttle window
pub const DEFAULT_DELAY_MS: u64 = 0;

/// Default settle period for single/double disambiguation
pub const DEFAULT_DBL_DELAY_MS: u64 = 300;

/// Rate limiting model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Model {
    /// Fire after a quiet period
    Debounce,
    /// Fire at most once per window
    Throttle,
}

impl Model {
    /// Name as written in configuration
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debounce => "debounce",
            Self::Throttle => "throttle",
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Model {
    type Err = ConfigAnomaly;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debounce" => Ok(Self::Debounce),
            "throttle" => Ok(Self::Throttle),
            other => Err(ConfigAnomaly::InvalidModel(other.to_string())),
        }
    }
}

/// A recoverable configuration problem
///
/// Anomalies are advisory: resolution always produces a usable config.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigAnomaly {
    /// `model` is neither "debounce" nor "throttle"
    #[error("invalid model {0:?} (expected \"debounce\" or \"throttle\"); rate limiting is disabled")]
    InvalidModel(String),

    /// A duration below zero
    #[error("{field} must not be negative (got {value}ms); using 0ms")]
    NegativeDuration {
        /// Offending field name
        field: &'static str,
        /// Configured value
        value: i64,
    },

    /// `dbl_delay` shorter than `delay`
    #[error("dbl_delay ({dbl_delay}ms) is less than delay ({delay}ms); the delay value ({delay}ms) will be used as dbl_delay")]
    InvertedThreshold {
        /// Configured settle period
        dbl_delay: u64,
        /// Configured delay
        delay: u64,
    },
}

/// Failure to load a configuration layer from disk
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read config file {}: {source}", .path.display())]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File is not a valid layer
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// One layer of configuration; unset fields defer to lower layers
///
/// Durations are milliseconds. They are signed so that negative values can be
/// reported rather than rejected by the parser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigLayer {
    /// "debounce" or "throttle"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Debounce quiet period / throttle window
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<i64>,
    /// Debounce max-wait bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_wait: Option<i64>,
    /// Single/double settle period
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dbl_delay: Option<i64>,
}

impl ConfigLayer {
    /// Empty layer
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `model`
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set `delay` in milliseconds
    pub fn with_delay(mut self, ms: i64) -> Self {
        self.delay = Some(ms);
        self
    }

    /// Set `max_wait` in milliseconds
    pub fn with_max_wait(mut self, ms: i64) -> Self {
        self.max_wait = Some(ms);
        self
    }

    /// Set `dbl_delay` in milliseconds
    pub fn with_dbl_delay(mut self, ms: i64) -> Self {
        self.dbl_delay = Some(ms);
        self
    }

    /// Whether no field is set
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Parse a layer from TOML
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load a layer from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }
}

/// Fully resolved configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Rate limiting model (none = pass-through)
    pub model: Option<Model>,
    /// Debounce quiet period / throttle window
    pub delay: Duration,
    /// Debounce max-wait bound (ignored by throttle)
    pub max_wait: Option<Duration>,
    /// Configured settle period, before clamping
    pub dbl_delay: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model: None,
            delay: Duration::from_millis(DEFAULT_DELAY_MS),
            max_wait: None,
            dbl_delay: Duration::from_millis(DEFAULT_DBL_DELAY_MS),
        }
    }
}

impl EngineConfig {
    /// Settle period actually used: never shorter than `delay`
    pub fn effective_dbl_delay(&self) -> Duration {
        self.dbl_delay.max(self.delay)
    }

    /// Rate limiting policy for this config
    pub fn rate_policy(&self) -> RatePolicy {
        match self.model {
            None => RatePolicy::Immediate,
            Some(Model::Debounce) => RatePolicy::Debounce {
                delay: self.delay,
                max_wait: self.max_wait,
            },
            Some(Model::Throttle) => RatePolicy::Throttle { delay: self.delay },
        }
    }
}

/// Result of resolving the layers once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Corrected configuration
    pub config: EngineConfig,
    /// Problems found (and corrected) while resolving
    pub anomalies: Vec<ConfigAnomaly>,
}

impl Resolution {
    /// Whether resolution found nothing to correct
    pub fn is_clean(&self) -> bool {
        self.anomalies.is_empty()
    }

    /// Emit one warning per anomaly
    pub fn report(&self) {
        for anomaly in &self.anomalies {
            warn!("clickgate config: {}", anomaly);
        }
    }
}

/// Resolve the effective configuration from overrides and ambient defaults
pub fn resolve(overrides: &ConfigLayer, ambient: &ConfigLayer) -> Resolution {
    let mut anomalies = Vec::new();

    // The first layer that mentions a model decides it, even if invalid
    let model = match overrides.model.as_deref().or(ambient.model.as_deref()) {
        None => None,
        Some(raw) => match raw.parse::<Model>() {
            Ok(model) => Some(model),
            Err(anomaly) => {
                anomalies.push(anomaly);
                None
            }
        },
    };

    let delay_ms = clamp_ms(
        "delay",
        overrides.delay.or(ambient.delay),
        &mut anomalies,
    )
    .unwrap_or(DEFAULT_DELAY_MS);

    let max_wait_ms = clamp_ms(
        "max_wait",
        overrides.max_wait.or(ambient.max_wait),
        &mut anomalies,
    );

    let dbl_delay_ms = clamp_ms(
        "dbl_delay",
        overrides.dbl_delay.or(ambient.dbl_delay),
        &mut anomalies,
    )
    .unwrap_or(DEFAULT_DBL_DELAY_MS);

    if dbl_delay_ms < delay_ms {
        anomalies.push(ConfigAnomaly::InvertedThreshold {
            dbl_delay: dbl_delay_ms,
            delay: delay_ms,
        });
    }

    Resolution {
        config: EngineConfig {
            model,
            delay: Duration::from_millis(delay_ms),
            max_wait: max_wait_ms.map(Duration::from_millis),
            dbl_delay: Duration::from_millis(dbl_delay_ms),
        },
        anomalies,
    }
}

fn clamp_ms(field: &'static str, value: Option<i64>, anomalies: &mut Vec<ConfigAnomaly>) -> Option<u64> {
    let value = value?;
    match u64::try_from(value) {
        Ok(ms) => Some(ms),
        Err(_) => {
            anomalies.push(ConfigAnomaly::NegativeDuration { field, value });
            Some(0)
        }
    }
}

/// Ambient default layer shared between engines
///
/// Cloning yields another handle to the same layer, so a change made through
/// one handle is seen by every engine on its next resolution.
#[derive(Debug, Clone, Default)]
pub struct AmbientConfig {
    layer: Arc<RwLock<ConfigLayer>>,
}

impl AmbientConfig {
    /// Create a handle holding `layer`
    pub fn new(layer: ConfigLayer) -> Self {
        Self {
            layer: Arc::new(RwLock::new(layer)),
        }
    }

    /// Replace the ambient layer
    pub fn set(&self, layer: ConfigLayer) {
        *self.layer.write() = layer;
    }

    /// Copy of the current ambient layer
    pub fn snapshot(&self) -> ConfigLayer {
        self.layer.read().clone()
    }

    /// Resolve `overrides` against the current ambient layer
    pub fn resolve(&self, overrides: &ConfigLayer) -> Resolution {
        resolve(overrides, &self.layer.read())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let resolution = resolve(&ConfigLayer::new(), &ConfigLayer::new());

        assert!(resolution.is_clean());
        assert_eq!(resolution.config, EngineConfig::default());
        assert_eq!(resolution.config.model, None);
        assert_eq!(resolution.config.effective_dbl_delay(), Duration::from_millis(300));
        assert_eq!(resolution.config.rate_policy(), RatePolicy::Immediate);
    }

    #[test]
    fn test_overrides_beat_ambient_per_field() {
        let overrides = ConfigLayer::new().with_delay(100);
        let ambient = ConfigLayer::new()
            .with_model("throttle")
            .with_delay(500)
            .with_dbl_delay(400);

        let config = resolve(&overrides, &ambient).config;
        assert_eq!(config.model, Some(Model::Throttle));
        assert_eq!(config.delay, Duration::from_millis(100));
        assert_eq!(config.dbl_delay, Duration::from_millis(400));
        assert_eq!(config.rate_policy(), RatePolicy::Throttle { delay: Duration::from_millis(100) });
    }

    #[test]
    fn test_inverted_threshold_is_clamped_and_reported() {
        let overrides = ConfigLayer::new().with_delay(500).with_dbl_delay(300);
        let resolution = resolve(&overrides, &ConfigLayer::new());

        assert_eq!(
            resolution.anomalies,
            vec![ConfigAnomaly::InvertedThreshold { dbl_delay: 300, delay: 500 }]
        );
        assert_eq!(resolution.config.effective_dbl_delay(), Duration::from_millis(500));

        let message = resolution.anomalies[0].to_string();
        assert!(message.contains("300"), "message should name dbl_delay: {}", message);
        assert!(message.contains("500"), "message should name delay: {}", message);
    }

    #[test]
    fn test_delay_above_default_dbl_delay_is_inverted() {
        let overrides = ConfigLayer::new().with_model("debounce").with_delay(400);
        let resolution = resolve(&overrides, &ConfigLayer::new());

        assert_eq!(
            resolution.anomalies,
            vec![ConfigAnomaly::InvertedThreshold { dbl_delay: 300, delay: 400 }]
        );
    }

    #[test]
    fn test_invalid_model_falls_back_to_none() {
        let overrides = ConfigLayer::new().with_model("debouce");
        let ambient = ConfigLayer::new().with_model("throttle");
        let resolution = resolve(&overrides, &ambient);

        assert_eq!(resolution.config.model, None);
        assert_eq!(
            resolution.anomalies,
            vec![ConfigAnomaly::InvalidModel("debouce".to_string())]
        );
    }

    #[test]
    fn test_negative_durations_clamped_to_zero() {
        let overrides = ConfigLayer::new()
            .with_model("debounce")
            .with_delay(-5)
            .with_max_wait(-1);
        let resolution = resolve(&overrides, &ConfigLayer::new());

        assert_eq!(resolution.config.delay, Duration::ZERO);
        assert_eq!(resolution.config.max_wait, Some(Duration::ZERO));
        assert_eq!(
            resolution.anomalies,
            vec![
                ConfigAnomaly::NegativeDuration { field: "delay", value: -5 },
                ConfigAnomaly::NegativeDuration { field: "max_wait", value: -1 },
            ]
        );
    }

    #[test]
    fn test_layer_from_toml() {
        let layer = ConfigLayer::from_toml_str(
            r#"
            model = "debounce"
            delay = 250
            max_wait = 1000
            "#,
        )
        .unwrap();

        assert_eq!(layer.model.as_deref(), Some("debounce"));
        assert_eq!(layer.delay, Some(250));
        assert_eq!(layer.max_wait, Some(1000));
        assert_eq!(layer.dbl_delay, None);
    }

    #[test]
    fn test_layer_rejects_unknown_keys() {
        assert!(ConfigLayer::from_toml_str("dellay = 3").is_err());
        assert!(ConfigLayer::from_toml_str("delay = \"fast\"").is_err());
    }

    #[test]
    fn test_load_layer_from_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("ambient.toml");
        std::fs::write(&path, "model = \"throttle\"\ndelay = 120\n").unwrap();

        let layer = ConfigLayer::load(&path).unwrap();
        assert_eq!(layer, ConfigLayer::new().with_model("throttle").with_delay(120));

        let missing = ConfigLayer::load(&temp_dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_ambient_changes_are_shared() {
        let ambient = AmbientConfig::default();
        let other_handle = ambient.clone();

        other_handle.set(ConfigLayer::new().with_model("debounce").with_delay(50));

        let config = ambient.resolve(&ConfigLayer::new()).config;
        assert_eq!(config.model, Some(Model::Debounce));
        assert_eq!(config.delay, Duration::from_millis(50));
        assert_eq!(ambient.snapshot().delay, Some(50));
    }
}
