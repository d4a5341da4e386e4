//! Configuration loading and typed config structures for the run engine.
//!
//! The canonical configuration lives in `underworld-config.yaml` at the
//! project root. This module defines strongly-typed structs that mirror the
//! YAML structure, and provides a loader that reads and validates the file.
//! Every field has a default, so an empty document is a valid config.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use underworld_types::RiskTier;

/// Environment variable that, when set, is prefixed to relative content
/// package paths.
pub const CONTENT_DIR_ENV: &str = "UNDERWORLD_CONTENT_DIR";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but holds an unusable value.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// Tick cadence, lockout, and phase split.
    #[serde(default)]
    pub run: RunConfig,

    /// Default run length per risk tier.
    #[serde(default)]
    pub durations: DurationConfig,

    /// Content package locations.
    #[serde(default)]
    pub content: ContentConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Load and validate configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if it is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.run.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                reason: "run.tick_interval_ms must be at least 1".to_owned(),
            });
        }
        let timing = self.run.phase_timing();
        if timing.setup_end_pct == 0
            || timing.setup_end_pct >= timing.execution_end_pct
            || timing.execution_end_pct >= 100
        {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "phase split must satisfy 0 < setup_end_pct ({}) < execution_end_pct ({}) < 100",
                    timing.setup_end_pct, timing.execution_end_pct
                ),
            });
        }
        for tier in RiskTier::ALL {
            if self.durations.for_tier(tier) == 0 {
                return Err(ConfigError::Invalid {
                    reason: format!("duration for {tier:?} must be at least 1ms"),
                });
            }
        }
        Ok(())
    }
}

/// Run pacing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunConfig {
    /// Milliseconds between ticks of an active run.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// How long a failed run blocks the next one, in milliseconds.
    #[serde(default = "default_failure_lockout_ms")]
    pub failure_lockout_ms: u64,

    /// Percentage of the run at which setup gives way to execution.
    #[serde(default = "default_setup_end_pct")]
    pub setup_end_pct: u32,

    /// Percentage of the run at which execution gives way to the climax.
    #[serde(default = "default_execution_end_pct")]
    pub execution_end_pct: u32,

    /// Seed for reproducible draws. Random when absent.
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

impl RunConfig {
    /// The phase split as a standalone value.
    pub const fn phase_timing(&self) -> PhaseTiming {
        PhaseTiming {
            setup_end_pct: self.setup_end_pct,
            execution_end_pct: self.execution_end_pct,
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            failure_lockout_ms: default_failure_lockout_ms(),
            setup_end_pct: default_setup_end_pct(),
            execution_end_pct: default_execution_end_pct(),
            rng_seed: None,
        }
    }
}

/// Where each phase ends, as a percentage of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTiming {
    /// End of setup (default 25).
    pub setup_end_pct: u32,
    /// End of execution (default 80).
    pub execution_end_pct: u32,
}

impl Default for PhaseTiming {
    fn default() -> Self {
        Self {
            setup_end_pct: default_setup_end_pct(),
            execution_end_pct: default_execution_end_pct(),
        }
    }
}

/// Default run length per risk tier, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DurationConfig {
    /// Low tier (default 20 s).
    #[serde(default = "default_low_ms")]
    pub low_ms: u64,
    /// Medium tier (default 60 s).
    #[serde(default = "default_medium_ms")]
    pub medium_ms: u64,
    /// High tier (default 3 min).
    #[serde(default = "default_high_ms")]
    pub high_ms: u64,
    /// Extreme tier (default 5 min).
    #[serde(default = "default_extreme_ms")]
    pub extreme_ms: u64,
}

impl DurationConfig {
    /// Default run length for `tier`.
    pub const fn for_tier(&self, tier: RiskTier) -> u64 {
        match tier {
            RiskTier::Low => self.low_ms,
            RiskTier::Medium => self.medium_ms,
            RiskTier::High => self.high_ms,
            RiskTier::Extreme => self.extreme_ms,
        }
    }
}

impl Default for DurationConfig {
    fn default() -> Self {
        Self {
            low_ms: default_low_ms(),
            medium_ms: default_medium_ms(),
            high_ms: default_high_ms(),
            extreme_ms: default_extreme_ms(),
        }
    }
}

/// Content package configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ContentConfig {
    /// JSON package paths, loaded in order. Later packages override earlier
    /// ones.
    #[serde(default)]
    pub packages: Vec<PathBuf>,
}

impl ContentConfig {
    /// Package paths with [`CONTENT_DIR_ENV`] applied to relative entries.
    pub fn resolved_packages(&self) -> Vec<PathBuf> {
        let base = std::env::var_os(CONTENT_DIR_ENV).map(PathBuf::from);
        self.resolve_against(base.as_deref())
    }

    fn resolve_against(&self, base: Option<&Path>) -> Vec<PathBuf> {
        self.packages
            .iter()
            .map(|path| match base {
                Some(dir) if path.is_relative() => dir.join(path),
                _ => path.clone(),
            })
            .collect()
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_tick_interval_ms() -> u64 {
    100
}

const fn default_failure_lockout_ms() -> u64 {
    6_000
}

const fn default_setup_end_pct() -> u32 {
    25
}

const fn default_execution_end_pct() -> u32 {
    80
}

const fn default_low_ms() -> u64 {
    20_000
}

const fn default_medium_ms() -> u64 {
    60_000
}

const fn default_high_ms() -> u64 {
    180_000
}

const fn default_extreme_ms() -> u64 {
    300_000
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = EngineConfig::parse("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.run.tick_interval_ms, 100);
        assert_eq!(config.run.failure_lockout_ms, 6_000);
        assert_eq!(config.run.phase_timing(), PhaseTiming::default());
        assert_eq!(config.durations.for_tier(RiskTier::Low), 20_000);
        assert_eq!(config.durations.for_tier(RiskTier::Medium), 60_000);
        assert_eq!(config.durations.for_tier(RiskTier::High), 180_000);
        assert_eq!(config.durations.for_tier(RiskTier::Extreme), 300_000);
        assert_eq!(config.logging.level, "info");
        assert!(config.content.packages.is_empty());
    }

    #[test]
    fn partial_document_overrides() {
        let yaml = r"
run:
  tick_interval_ms: 50
  rng_seed: 7
durations:
  low_ms: 1000
content:
  packages:
    - content/street.json
    - content/heists.json
";
        let config = EngineConfig::parse(yaml).unwrap();
        assert_eq!(config.run.tick_interval_ms, 50);
        assert_eq!(config.run.rng_seed, Some(7));
        assert_eq!(config.run.failure_lockout_ms, 6_000);
        assert_eq!(config.durations.low_ms, 1_000);
        assert_eq!(config.durations.medium_ms, 60_000);
        assert_eq!(config.content.packages.len(), 2);
    }

    #[test]
    fn zero_tick_interval_rejected() {
        let result = EngineConfig::parse("run:\n  tick_interval_ms: 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn inverted_phase_split_rejected() {
        let result = EngineConfig::parse("run:\n  setup_end_pct: 90\n  execution_end_pct: 80\n");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));

        let result = EngineConfig::parse("run:\n  execution_end_pct: 100\n");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn zero_duration_rejected() {
        let result = EngineConfig::parse("durations:\n  high_ms: 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn malformed_yaml_rejected() {
        let result = EngineConfig::parse("run: [unterminated");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn relative_packages_resolve_against_base() {
        let content = ContentConfig {
            packages: vec![PathBuf::from("street.json"), PathBuf::from("/abs/heists.json")],
        };
        let resolved = content.resolve_against(Some(Path::new("/data")));
        assert_eq!(
            resolved,
            vec![PathBuf::from("/data/street.json"), PathBuf::from("/abs/heists.json")]
        );
        assert_eq!(content.resolve_against(None), content.packages);
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = EngineConfig::from_file(Path::new("/no/such/underworld-config.yaml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
