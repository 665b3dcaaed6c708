// Kbfn Config Parser - TOML with Serde
// Parses the device selection and layer list from TOML files

use super::layer::{LayerConfig, LayerDescriptor};
use crate::key::key_from_name;
use crate::Key;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Discovery retry interval when the config does not set one
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(1000);

/// Configuration errors; all of them are fatal at startup
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("Unknown layer kind: {0}")]
    UnknownLayerKind(String),

    #[error("Invalid options for {kind} layer: {message}")]
    InvalidOptions { kind: String, message: String },

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Dual-role key {0} needs either a keymap or a modifier")]
    MissingHoldAction(String),

    #[error("Dual-role key {0} has both a keymap and a modifier")]
    ConflictingHoldAction(String),

    #[error("Invalid timing: {0}")]
    InvalidTiming(String),

    #[error("No input device configured")]
    MissingDevice,
}

/// Main configuration structure (root TOML table)
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigToml {
    #[serde(default)]
    device: Option<DeviceToml>,

    #[serde(default)]
    layers: Vec<LayerDescriptor>,
}

/// Device selection settings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct DeviceToml {
    /// Display name or /dev/input path
    name: Option<String>,
    /// Delay between discovery attempts in milliseconds
    retry_interval_ms: Option<u64>,
}

/// Validated configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Display name or path of the physical keyboard
    pub device: Option<String>,
    /// Delay between discovery attempts
    pub retry_interval: Duration,
    /// Layers in declared order, outermost (closest to the device) first
    pub layers: Vec<LayerConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device: None,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            layers: vec![],
        }
    }
}

impl Config {
    /// Parse a TOML configuration file
    pub fn from_toml_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let toml_config: ConfigToml =
            toml::from_str(content).map_err(|e| ConfigError::TomlParse(e.to_string()))?;
        toml_config.to_config()
    }

    /// `$XDG_CONFIG_HOME/kbfn/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("kbfn").join("config.toml"))
    }

    /// Device selector, or `MissingDevice` when none was configured
    pub fn device_name(&self) -> Result<&str, ConfigError> {
        self.device.as_deref().ok_or(ConfigError::MissingDevice)
    }
}

impl ConfigToml {
    fn to_config(&self) -> Result<Config, ConfigError> {
        let layers = self
            .layers
            .iter()
            .map(LayerConfig::from_descriptor)
            .collect::<Result<Vec<_>, _>>()?;

        let device = self.device.as_ref();
        let retry_interval = device
            .and_then(|d| d.retry_interval_ms)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_RETRY_INTERVAL);

        log::debug!("loaded {} layer(s)", layers.len());
        Ok(Config {
            device: device.and_then(|d| d.name.clone()),
            retry_interval,
            layers,
        })
    }
}

/// Resolve a symbolic key name (or numeric code)
pub(crate) fn parse_key(name: &str) -> Result<Key, ConfigError> {
    key_from_name(name).ok_or_else(|| ConfigError::InvalidKey(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayerKind;

    #[test]
    fn test_parse_key() {
        assert_eq!(parse_key("space").unwrap(), Key::SPACE);
        assert_eq!(parse_key("KEY_LEFTCTRL").unwrap(), Key::LEFTCTRL);
        assert!(parse_key("notakey").is_err());
    }

    #[test]
    fn test_config_from_toml() {
        let toml = r#"
            [device]
            name = "SEM USB Keyboard"
            retry_interval_ms = 250

            [[layers]]
            kind = "Remap"
            [layers.options.codes]
            CAPSLOCK = "ESC"

            [[layers]]
            kind = "DualRole"
            [layers.options]
            key = "SPACE"
            [layers.options.keymap]
            I = "UP"
            J = "LEFT"
        "#;

        let config = Config::from_toml(toml).unwrap();
        assert_eq!(config.device_name().unwrap(), "SEM USB Keyboard");
        assert_eq!(config.retry_interval, Duration::from_millis(250));
        let kinds: Vec<LayerKind> = config.layers.iter().map(LayerConfig::kind).collect();
        assert_eq!(kinds, vec![LayerKind::Remap, LayerKind::DualRole]);
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert!(matches!(config.device_name(), Err(ConfigError::MissingDevice)));
    }

    #[test]
    fn test_unknown_top_level_field() {
        let err = Config::from_toml("[display]\nname = \"x\"").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }

    #[test]
    fn test_unknown_layer_kind_is_fatal() {
        let toml = r#"
            [[layers]]
            kind = "Chord"
        "#;
        assert!(matches!(
            Config::from_toml(toml),
            Err(ConfigError::UnknownLayerKind(kind)) if kind == "Chord"
        ));
    }

    #[test]
    fn test_default_path_ends_with_config_file() {
        if let Some(path) = Config::default_path() {
            assert!(path.ends_with("kbfn/config.toml"));
        }
    }
}
