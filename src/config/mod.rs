//! Application configuration loading and validation.
//!
//! Aggregates all engine settings. Load from a TOML file with
//! [`Config::load`] or parse directly with [`Config::parse_toml`];
//! everything has defaults except the channel list, so a minimal config is
//! just `[[channels]]` entries and an output path.
//!
//! # Example
//!
//! ```no_run
//! use sigrelay::config::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

pub mod logging;

pub use logging::LoggingConfig;

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::domain::{ChannelHandle, ChannelId, ChannelPriority, ChannelSpec};
use crate::error::{ConfigError, Result};
use crate::history::SignalHistory;
use crate::monitor::MonitorConfig;
use crate::parser::SymbolMapper;
use crate::writer::SignalWriter;

/// One channel to monitor.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelConfig {
    /// Unique channel identifier.
    pub id: i64,
    /// Display name, used in output lines and events.
    pub name: String,
    /// Opaque handle passed through to the source adapter.
    pub handle: String,
    /// Polling priority.
    #[serde(default)]
    pub priority: ChannelPriority,
}

impl ChannelConfig {
    /// Convert to the domain spec.
    #[must_use]
    pub fn spec(&self) -> ChannelSpec {
        ChannelSpec::new(
            ChannelId::new(self.id),
            self.name.clone(),
            ChannelHandle::new(self.handle.clone()),
            self.priority,
        )
    }
}

/// Destination file settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path of the file the trading robot tails.
    pub path: String,
    /// Seconds an equivalent signal suppresses re-delivery.
    pub duplicate_window_secs: u64,
    /// Seconds to wait for the writer lock before abandoning a write.
    pub lock_timeout_secs: u64,
    /// How many trailing lines the duplicate scan inspects.
    pub scan_depth: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "signals.txt".into(),
            duplicate_window_secs: 600,
            lock_timeout_secs: 10,
            scan_depth: 50,
        }
    }
}

impl OutputConfig {
    /// Build the delivery writer for these settings.
    #[must_use]
    pub fn writer(&self) -> SignalWriter {
        SignalWriter::new(
            &self.path,
            Duration::from_secs(self.lock_timeout_secs),
            Duration::from_secs(self.duplicate_window_secs),
            self.scan_depth,
        )
    }
}

/// Symbol translation settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SymbolConfig {
    /// Provider spelling → broker symbol, many to one.
    pub aliases: HashMap<String, String>,
    /// Broker prefix attached to mapped symbols.
    pub prefix: String,
    /// Broker suffix attached to mapped symbols.
    pub suffix: String,
    /// Symbols delivered without prefix/suffix.
    pub skip_prefix_suffix: HashSet<String>,
    /// Symbols never delivered.
    pub excluded: HashSet<String>,
    /// When non-empty, only these symbols are delivered.
    pub allowed: HashSet<String>,
}

impl SymbolConfig {
    /// Build the symbol mapper for these settings.
    #[must_use]
    pub fn mapper(&self) -> SymbolMapper {
        SymbolMapper::new(
            self.aliases.clone(),
            self.prefix.clone(),
            self.suffix.clone(),
            self.skip_prefix_suffix.iter().cloned(),
            self.excluded.iter().cloned(),
            self.allowed.iter().cloned(),
        )
    }
}

/// Processed-record history settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Snapshot file path.
    pub path: String,
    /// Maximum records retained.
    pub cap: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: "signals_history.json".into(),
            cap: 1000,
        }
    }
}

impl HistoryConfig {
    /// Build the history store for these settings.
    #[must_use]
    pub fn store(&self) -> SignalHistory {
        SignalHistory::new(&self.path, self.cap)
    }
}

/// Main application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging and tracing configuration.
    pub logging: LoggingConfig,
    /// Engine tunables.
    pub monitor: MonitorConfig,
    /// Output file settings.
    pub output: OutputConfig,
    /// Symbol mapping settings.
    pub symbols: SymbolConfig,
    /// Processed-record history settings.
    pub history: HistoryConfig,
    /// Channels to monitor.
    pub channels: Vec<ChannelConfig>,
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation
    /// fails.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML content is
    /// malformed, or validation fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<()> {
        if self.output.path.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "output.path",
            }
            .into());
        }
        if self.output.lock_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "output.lock_timeout_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.output.duplicate_window_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "output.duplicate_window_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.monitor.tick_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "monitor.tick_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.monitor.max_batch == 0 {
            return Err(ConfigError::InvalidValue {
                field: "monitor.max_batch",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.monitor.queue_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "monitor.queue_capacity",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.monitor.poll_retries == 0 {
            return Err(ConfigError::InvalidValue {
                field: "monitor.poll_retries",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.monitor.reconnect_max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "monitor.reconnect_max_attempts",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        let mut seen = HashSet::new();
        for channel in &self.channels {
            if channel.name.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "channels.name",
                    reason: format!("channel {} has an empty name", channel.id),
                }
                .into());
            }
            if !seen.insert(channel.id) {
                return Err(ConfigError::InvalidValue {
                    field: "channels.id",
                    reason: format!("duplicate channel id {}", channel.id),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Channel specs for the monitor.
    #[must_use]
    pub fn channel_specs(&self) -> Vec<ChannelSpec> {
        self.channels.iter().map(ChannelConfig::spec).collect()
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [logging]
        level = "debug"
        format = "json"

        [output]
        path = "robot/signals.txt"
        duplicate_window_secs = 300

        [monitor]
        tick_ms = 250
        max_batch = 5

        [symbols]
        prefix = ""
        suffix = ".m"
        excluded = ["USDTRY"]

        [symbols.aliases]
        GOLD = "XAUUSD"

        [[channels]]
        id = 1001
        name = "majors vip"
        handle = "peer:1001"
        priority = "high"

        [[channels]]
        id = 1002
        name = "metals"
        handle = "peer:1002"
    "#;

    #[test]
    fn parses_full_config() {
        let config = Config::parse_toml(SAMPLE).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.output.path, "robot/signals.txt");
        assert_eq!(config.output.duplicate_window_secs, 300);
        // unset fields keep defaults
        assert_eq!(config.output.scan_depth, 50);
        assert_eq!(config.monitor.tick_ms, 250);
        assert_eq!(config.monitor.poll_limit, 20);
        assert_eq!(config.channels.len(), 2);
        assert_eq!(config.channels[0].priority, ChannelPriority::High);
        assert_eq!(config.channels[1].priority, ChannelPriority::Medium);
    }

    #[test]
    fn channel_specs_map_identity() {
        let config = Config::parse_toml(SAMPLE).unwrap();
        let specs = config.channel_specs();
        assert_eq!(specs[0].id, ChannelId::new(1001));
        assert_eq!(specs[0].handle.as_str(), "peer:1001");
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::parse_toml("").unwrap();
        assert_eq!(config.output.path, "signals.txt");
        assert_eq!(config.monitor.tick_ms, 500);
        assert!(config.channels.is_empty());
    }

    #[test]
    fn rejects_duplicate_channel_ids() {
        let bad = r#"
            [[channels]]
            id = 1
            name = "a"
            handle = "h1"

            [[channels]]
            id = 1
            name = "b"
            handle = "h2"
        "#;
        assert!(Config::parse_toml(bad).is_err());
    }

    #[test]
    fn rejects_zero_tick() {
        let bad = "[monitor]\ntick_ms = 0";
        assert!(Config::parse_toml(bad).is_err());
    }

    #[test]
    fn rejects_empty_output_path() {
        let bad = "[output]\npath = \"\"";
        assert!(Config::parse_toml(bad).is_err());
    }

    #[test]
    fn mapper_round_trip() {
        let config = Config::parse_toml(SAMPLE).unwrap();
        let mapper = config.symbols.mapper();
        let mut signal =
            crate::domain::ParsedSignal::new("GOLD", crate::domain::Direction::Buy);
        mapper.apply(&mut signal).unwrap();
        assert_eq!(signal.final_symbol, "XAUUSD.m");
    }
}
