//! Configuration module for the Serial JSON Monitor
//!
//! This module handles the operator configuration file:
//! - Serial device and link speed
//! - Numeric display precision
//! - Quick-send command buttons
//! - Heatmap rules (per-table thresholds, or one global threshold)
//!
//! # File Location
//!
//! The file is looked up in this order:
//! 1. The path given as the first command line argument
//! 2. `config.yaml` in the working directory
//! 3. `config.yaml` in the platform config directory under `serial-json-monitor`
//!
//! Files ending in `.toml` are read as TOML, everything else as YAML.
//!
//! # Leniency
//!
//! The document is applied field by field. A field that is missing keeps its
//! default silently; a field that is present but invalid keeps its default and
//! logs a warning. A missing file means "use defaults" without any warning.
//!
//! # Example
//!
//! ```yaml
//! COM: /dev/ttyACM0
//! BAUD: 115200
//! precision: 2
//! buttons:
//!   - { name: Reset, value: "RST" }
//!   - { name: Status, value: "STAT?" }
//! heatmaps:
//!   - { name: cells, max_deviation: 0.1 }
//! ```

use crate::error::{MonitorError, Result};
use crate::render::heatmap::{HeatmapRule, HeatmapRules};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application identifier for the platform config directory
pub const APP_ID: &str = "serial-json-monitor";

/// Default configuration filename
pub const CONFIG_FILE: &str = "config.yaml";

/// Default serial device
pub const DEFAULT_PORT: &str = "/dev/ttyUSB0";

/// Default link speed
pub const DEFAULT_BAUD_RATE: u32 = 500_000;

/// Default number of decimals shown for numeric values
pub const DEFAULT_PRECISION: usize = 3;

/// Default global heatmap threshold (fraction of the table mean)
pub const DEFAULT_MAX_DEVIATION: f64 = 0.05;

/// Default serial read timeout. Bounds how long a stop request waits on a
/// read that has no data.
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 200;

// ==================== File Location ====================

/// Pick the configuration file to load
///
/// An explicit path always wins, even if it does not exist (it then falls back
/// to defaults at load time).
pub fn resolve_config_path(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }

    let local = PathBuf::from(CONFIG_FILE);
    if local.exists() {
        return local;
    }

    if let Some(user) = dirs_next::config_dir().map(|p| p.join(APP_ID).join(CONFIG_FILE)) {
        if user.exists() {
            return user;
        }
    }

    local
}

/// Syntax of a configuration file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
}

impl ConfigFormat {
    /// Choose the format from the file extension
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Yaml,
        }
    }

    /// Parse file content into a generic document
    pub fn parse(self, content: &str) -> Result<Value> {
        match self {
            ConfigFormat::Yaml => serde_yaml::from_str(content)
                .map_err(|e| MonitorError::Config(format!("Invalid YAML: {}", e))),
            ConfigFormat::Toml => toml::from_str(content)
                .map_err(|e| MonitorError::Config(format!("Invalid TOML: {}", e))),
        }
    }
}

// ==================== Sections ====================

/// Serial link configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SerialConfig {
    /// Device path or name (e.g. `/dev/ttyUSB0`, `COM3`)
    pub port: String,

    /// Link speed in baud
    pub baud_rate: u32,

    /// Read timeout in milliseconds
    pub read_timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
        }
    }
}

impl SerialConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// Display formatting configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayConfig {
    /// Decimal places for numeric values (trailing zeros are trimmed)
    pub precision: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
        }
    }
}

/// A named command sent with one click
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuickCommand {
    /// Button label
    pub name: String,
    /// Text sent over the link
    pub value: String,
}

impl QuickCommand {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Threshold for one named table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableThreshold {
    pub name: String,
    pub max_deviation: f64,
}

/// Heatmap configuration as written in the file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapConfig {
    /// Per-table thresholds (`heatmaps:`)
    pub tables: Option<Vec<TableThreshold>>,

    /// Legacy list of table names sharing the global threshold (`heatmap_tables:`)
    pub legacy_tables: Option<Vec<String>>,

    /// Global threshold (`max_deviation:`)
    pub max_deviation: f64,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            tables: None,
            legacy_tables: None,
            max_deviation: DEFAULT_MAX_DEVIATION,
        }
    }
}

impl HeatmapConfig {
    /// Resolve the configured entries into rendering rules
    ///
    /// Per-table thresholds take priority, then the legacy table list (all at
    /// the global threshold). With neither, the global threshold applies to
    /// every table.
    pub fn rules(&self) -> HeatmapRules {
        if let Some(tables) = self.tables.as_ref().filter(|t| !t.is_empty()) {
            return HeatmapRules::per_table(
                tables
                    .iter()
                    .map(|t| HeatmapRule::for_table(t.name.clone(), t.max_deviation)),
            );
        }

        if let Some(names) = self.legacy_tables.as_ref().filter(|t| !t.is_empty()) {
            return HeatmapRules::per_table(
                names
                    .iter()
                    .map(|name| HeatmapRule::for_table(name.clone(), self.max_deviation)),
            );
        }

        HeatmapRules::uniform(self.max_deviation)
    }
}

// ==================== App Config ====================

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AppConfig {
    pub serial: SerialConfig,
    pub display: DisplayConfig,
    pub buttons: Vec<QuickCommand>,
    pub heatmap: HeatmapConfig,
}

impl AppConfig {
    /// Load and apply a configuration file
    ///
    /// Fails only if the file cannot be read or is not valid YAML/TOML.
    /// Invalid individual fields are warned about and left at their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let document = ConfigFormat::from_path(path).parse(&content)?;
        Ok(Self::from_document(&document))
    }

    /// Load a configuration file, returning defaults on any error
    ///
    /// A missing file is not worth a warning.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => {
                tracing::info!("Loaded configuration from {:?}", path);
                config
            }
            Err(MonitorError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No configuration at {:?}, using defaults", path);
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to load config {:?}, using defaults: {}", path, e);
                Self::default()
            }
        }
    }

    /// Apply a parsed document on top of the defaults, field by field
    pub fn from_document(document: &Value) -> Self {
        let mut config = Self::default();

        let Some(doc) = document.as_object() else {
            if !document.is_null() {
                tracing::warn!("Configuration root is not a mapping; using defaults");
            }
            return config;
        };

        if let Some(port) = doc.get("COM").and_then(Value::as_str) {
            if !port.is_empty() {
                config.serial.port = port.to_string();
            }
        }

        if let Some(baud) = doc.get("BAUD") {
            match as_integer(baud).and_then(|b| u32::try_from(b).ok()).filter(|b| *b > 0) {
                Some(baud) => config.serial.baud_rate = baud,
                None => tracing::warn!(
                    "Invalid BAUD in config; using default {}",
                    DEFAULT_BAUD_RATE
                ),
            }
        }

        if let Some(timeout) = doc.get("read_timeout_ms") {
            match as_integer(timeout).and_then(|t| u64::try_from(t).ok()).filter(|t| *t > 0) {
                Some(timeout) => config.serial.read_timeout_ms = timeout,
                None => tracing::warn!(
                    "Invalid read_timeout_ms in config; using default {}",
                    DEFAULT_READ_TIMEOUT_MS
                ),
            }
        }

        if let Some(Value::Array(items)) = doc.get("buttons") {
            config.buttons = parse_buttons(items);
        }

        if let Some(precision) = doc.get("precision").or_else(|| doc.get("PRECISION")) {
            match as_integer(precision).and_then(|p| usize::try_from(p).ok()) {
                Some(p) => config.display.precision = p,
                None => tracing::warn!(
                    "Invalid precision in config; using default {}",
                    DEFAULT_PRECISION
                ),
            }
        }

        if let Some(max_dev) = doc.get("max_deviation") {
            match as_float(max_dev).filter(|d| *d >= 0.0) {
                Some(d) => config.heatmap.max_deviation = d,
                None => tracing::warn!(
                    "Invalid max_deviation in config; using default {}",
                    DEFAULT_MAX_DEVIATION
                ),
            }
        }

        if let Some(Value::Array(entries)) = doc.get("heatmaps") {
            let tables = parse_table_thresholds(entries, DEFAULT_MAX_DEVIATION);
            config.heatmap.tables = (!tables.is_empty()).then_some(tables);
        }

        if config.heatmap.tables.is_none() {
            config.heatmap.legacy_tables = match doc.get("heatmap_tables") {
                Some(Value::String(name)) if !name.is_empty() => Some(vec![name.clone()]),
                Some(Value::Array(names)) => Some(
                    names
                        .iter()
                        .filter(|v| is_truthy(v))
                        .map(stringify)
                        .collect(),
                ),
                _ => None,
            };
        }

        config
    }

    /// Heatmap rules resolved from this configuration
    pub fn heatmap_rules(&self) -> HeatmapRules {
        self.heatmap.rules()
    }
}

fn parse_buttons(items: &[Value]) -> Vec<QuickCommand> {
    items
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|item| {
            let name = item.get("name").map(stringify).unwrap_or_default();
            let value = item.get("value").map(stringify).unwrap_or_default();
            let (name, value) = (name.trim(), value.trim());

            if name.is_empty() || value.is_empty() {
                let entry = Value::Object(item.clone());
                tracing::warn!("Skipping button with missing name/value: {}", entry);
                None
            } else {
                Some(QuickCommand::new(name, value))
            }
        })
        .collect()
}

fn parse_table_thresholds(entries: &[Value], default_max_deviation: f64) -> Vec<TableThreshold> {
    entries
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|entry| {
            let name = entry.get("name").map(stringify).unwrap_or_default();
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            let max_deviation = entry
                .get("max_deviation")
                .and_then(as_float)
                .unwrap_or(default_max_deviation);
            Some(TableThreshold {
                name: name.to_string(),
                max_deviation: max_deviation.max(0.0),
            })
        })
        .collect()
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_float(value: &Value) -> Option<f64> {
    let parsed: Option<f64> = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.filter(|f| f.is_finite())
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

// ==================== Tests ====================
