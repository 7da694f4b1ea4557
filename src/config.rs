//! Configuration management with validation and defaults
//!
//! Configuration is read once at start-up: TOML file first, then `ROULETTE_*`
//! environment overrides, then validation. The engine treats it as immutable.

use crate::errors::{ConfigurationError, EngineResult};
use crate::roulette::{Amount, PlayerId};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Complete engine configuration
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub table: TableConfig,
    pub keeper: KeeperConfig,
    pub randomness: RandomnessConfig,
    pub monitoring: MonitoringConfig,
}

/// Table limits and round cadence
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Identity allowed to withdraw the house balance and close the table
    pub owner: String,
    pub min_stake: Amount,
    pub max_stake: Amount,
    /// Minimum value in the bank before a round may start
    pub min_round_stake: Amount,
    /// Minimum seconds between two resolutions
    pub round_interval_secs: u64,
    /// House bankroll received at construction
    pub initial_bankroll: Amount,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            owner: "house".to_string(),
            min_stake: 1,
            max_stake: 100_000_000_000,
            min_round_stake: 10_000_000,
            round_interval_secs: 30,
            initial_bankroll: 0,
        }
    }
}

/// Background round driver
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeeperConfig {
    pub enabled: bool,
    pub poll_interval_ms: u64,
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_ms: 1_000,
        }
    }
}

/// VRF randomness source
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomnessConfig {
    /// Prefix of every signed VRF input message
    pub vrf_domain: String,
    /// Hex-encoded schnorrkel secret key; a fresh key is generated when absent
    pub secret_key_hex: Option<String>,
    /// Artificial delay before a request is fulfilled
    pub fulfillment_delay_ms: u64,
}

impl Default for RandomnessConfig {
    fn default() -> Self {
        Self {
            vrf_domain: "roulette".to_string(),
            secret_key_hex: None,
            fulfillment_delay_ms: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(ConfigurationError::InvalidValue {
                field: "monitoring.log_level".to_string(),
                value: s.to_string(),
                reason: "Expected one of error, warn, info, debug, trace".to_string(),
            }),
        }
    }
}

/// Logging and notification settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub log_level: LogLevel,
    /// Buffer of the live event broadcast
    pub event_channel_capacity: usize,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            event_channel_capacity: 1_024,
        }
    }
}

impl EngineConfig {
    /// Fast rounds and small limits for local runs
    pub fn development() -> Self {
        Self {
            table: TableConfig {
                min_round_stake: 1,
                round_interval_secs: 0,
                initial_bankroll: 1_000_000,
                ..Default::default()
            },
            keeper: KeeperConfig {
                enabled: true,
                poll_interval_ms: 50,
            },
            monitoring: MonitoringConfig {
                log_level: LogLevel::Debug,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn production() -> Self {
        Self {
            table: TableConfig {
                round_interval_secs: 30,
                ..Default::default()
            },
            keeper: KeeperConfig {
                enabled: true,
                poll_interval_ms: 1_000,
            },
            monitoring: MonitoringConfig {
                log_level: LogLevel::Info,
                event_channel_capacity: 10_000,
            },
            ..Default::default()
        }
    }

    pub fn owner(&self) -> PlayerId {
        PlayerId::new(self.table.owner.clone())
    }

    /// Validate configuration for logical consistency
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.table.owner.trim().is_empty() {
            return Err(ConfigurationError::MissingRequired("table.owner".to_string()));
        }

        if self.table.min_stake == 0 {
            return Err(ConfigurationError::InvalidValue {
                field: "table.min_stake".to_string(),
                value: "0".to_string(),
                reason: "Minimal stake must be > 0".to_string(),
            });
        }

        if self.table.max_stake < self.table.min_stake {
            return Err(ConfigurationError::InvalidValue {
                field: "table.max_stake".to_string(),
                value: self.table.max_stake.to_string(),
                reason: format!("Must be >= min_stake ({})", self.table.min_stake),
            });
        }

        if self.keeper.poll_interval_ms == 0 {
            return Err(ConfigurationError::InvalidValue {
                field: "keeper.poll_interval_ms".to_string(),
                value: "0".to_string(),
                reason: "Poll interval must be > 0".to_string(),
            });
        }

        if self.randomness.vrf_domain.is_empty() {
            return Err(ConfigurationError::MissingRequired("randomness.vrf_domain".to_string()));
        }

        if self.monitoring.event_channel_capacity == 0 {
            return Err(ConfigurationError::InvalidValue {
                field: "monitoring.event_channel_capacity".to_string(),
                value: "0".to_string(),
                reason: "Event channel capacity must be > 0".to_string(),
            });
        }

        Ok(())
    }

    pub fn round_interval(&self) -> Duration {
        Duration::from_secs(self.table.round_interval_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.keeper.poll_interval_ms)
    }

    pub fn fulfillment_delay(&self) -> Duration {
        Duration::from_millis(self.randomness.fulfillment_delay_ms)
    }
}

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    config_path: Option<String>,
    env_prefix: String,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            config_path: None,
            env_prefix: "ROULETTE".to_string(),
        }
    }

    /// Set the configuration file path
    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_string_lossy().to_string());
        self
    }

    /// Read overrides from `<prefix>_*` variables instead of `ROULETTE_*`
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Load configuration from file and environment variables
    pub fn load(&self) -> EngineResult<EngineConfig> {
        let mut config = if let Some(ref path) = self.config_path {
            self.load_from_file(path)?
        } else {
            EngineConfig::default()
        };

        self.apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(config)
    }

    fn load_from_file(&self, path: &str) -> EngineResult<EngineConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigurationError::LoadFailed(format!("Failed to read {}: {}", path, e))
        })?;

        Ok(toml::from_str(&content).map_err(ConfigurationError::from)?)
    }

    fn var(&self, name: &str) -> Option<(String, String)> {
        let key = format!("{}_{}", self.env_prefix, name);
        env::var(&key).ok().map(|value| (key, value))
    }

    fn parse_var<T: std::str::FromStr>(&self, name: &str, reason: &str) -> EngineResult<Option<T>> {
        match self.var(name) {
            Some((key, value)) => value.parse().map(Some).map_err(|_| {
                ConfigurationError::InvalidValue {
                    field: key,
                    value,
                    reason: reason.to_string(),
                }
                .into()
            }),
            None => Ok(None),
        }
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&self, config: &mut EngineConfig) -> EngineResult<()> {
        if let Some((_, owner)) = self.var("OWNER") {
            config.table.owner = owner;
        }
        if let Some(v) = self.parse_var("MIN_STAKE", "Invalid amount")? {
            config.table.min_stake = v;
        }
        if let Some(v) = self.parse_var("MAX_STAKE", "Invalid amount")? {
            config.table.max_stake = v;
        }
        if let Some(v) = self.parse_var("MIN_ROUND_STAKE", "Invalid amount")? {
            config.table.min_round_stake = v;
        }
        if let Some(v) = self.parse_var("ROUND_INTERVAL_SECS", "Invalid number of seconds")? {
            config.table.round_interval_secs = v;
        }
        if let Some(v) = self.parse_var("INITIAL_BANKROLL", "Invalid amount")? {
            config.table.initial_bankroll = v;
        }
        if let Some(v) = self.parse_var("KEEPER_ENABLED", "Invalid boolean value")? {
            config.keeper.enabled = v;
        }
        if let Some(v) = self.parse_var("KEEPER_POLL_MS", "Invalid interval")? {
            config.keeper.poll_interval_ms = v;
        }
        if let Some((_, secret)) = self.var("VRF_SECRET_KEY") {
            config.randomness.secret_key_hex = Some(secret);
        }
        if let Some((_, level)) = self.var("LOG_LEVEL") {
            config.monitoring.log_level = level.parse()?;
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, config: &EngineConfig, path: &str) -> EngineResult<()> {
        let toml_string = toml::to_string_pretty(config).map_err(|e| {
            ConfigurationError::SaveFailed(format!("Failed to serialize config: {}", e))
        })?;

        std::fs::write(path, toml_string).map_err(|e| {
            ConfigurationError::SaveFailed(format!("Failed to write to {}: {}", path, e)).into()
        })
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate a sample configuration file
pub fn generate_sample_config(path: &str, config: &EngineConfig) -> EngineResult<()> {
    ConfigLoader::new().save(config, path)
}
