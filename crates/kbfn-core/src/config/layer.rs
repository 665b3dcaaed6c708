// Kbfn Layer Configuration
// Raw {kind, options} descriptors and their validated, typed form

use super::parser::{parse_key, ConfigError};
use crate::transform::{DualRoleConfig, HoldAction};
use crate::Key;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use strum_macros::{Display, EnumString};

/// Layer kinds a pipeline can be built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
pub enum LayerKind {
    #[strum(serialize = "Remap", serialize = "remap")]
    Remap,
    #[strum(serialize = "DualRole", serialize = "dual_role")]
    DualRole,
}

/// One `[[layers]]` entry as written in the config file
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerDescriptor {
    pub kind: String,
    #[serde(default)]
    pub options: toml::Table,
}

impl LayerDescriptor {
    pub fn new(kind: &str, options: toml::Table) -> Self {
        Self {
            kind: kind.to_string(),
            options,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RemapOptions {
    #[serde(default)]
    codes: IndexMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DualRoleOptions {
    key: String,
    threshold_ms: Option<u64>,
    lookahead_ms: Option<u64>,
    modifier: Option<String>,
    keymap: Option<IndexMap<String, String>>,
}

/// Remap layer parameters
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RemapConfig {
    pub codes: IndexMap<Key, Key>,
}

/// Validated configuration of one layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerConfig {
    Remap(RemapConfig),
    DualRole(DualRoleConfig),
}

impl LayerConfig {
    pub fn kind(&self) -> LayerKind {
        match self {
            LayerConfig::Remap(_) => LayerKind::Remap,
            LayerConfig::DualRole(_) => LayerKind::DualRole,
        }
    }

    /// Resolve and validate a raw descriptor
    pub fn from_descriptor(descriptor: &LayerDescriptor) -> Result<Self, ConfigError> {
        let kind: LayerKind = descriptor
            .kind
            .parse()
            .map_err(|_| ConfigError::UnknownLayerKind(descriptor.kind.clone()))?;

        match kind {
            LayerKind::Remap => {
                let options: RemapOptions = parse_options(kind, &descriptor.options)?;
                Ok(LayerConfig::Remap(RemapConfig {
                    codes: parse_key_map(kind, &options.codes)?,
                }))
            }
            LayerKind::DualRole => {
                let options: DualRoleOptions = parse_options(kind, &descriptor.options)?;
                dual_role_config(options).map(LayerConfig::DualRole)
            }
        }
    }
}

impl TryFrom<&LayerDescriptor> for LayerConfig {
    type Error = ConfigError;

    fn try_from(descriptor: &LayerDescriptor) -> Result<Self, Self::Error> {
        LayerConfig::from_descriptor(descriptor)
    }
}

fn parse_options<T: DeserializeOwned>(
    kind: LayerKind,
    options: &toml::Table,
) -> Result<T, ConfigError> {
    toml::Value::Table(options.clone())
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::InvalidOptions {
            kind: kind.to_string(),
            message: e.to_string(),
        })
}

/// Resolve a name map, rejecting two spellings of the same input key
fn parse_key_map(
    kind: LayerKind,
    names: &IndexMap<String, String>,
) -> Result<IndexMap<Key, Key>, ConfigError> {
    let mut codes = IndexMap::with_capacity(names.len());
    for (from, to) in names {
        let input = parse_key(from)?;
        if codes.insert(input, parse_key(to)?).is_some() {
            return Err(ConfigError::InvalidOptions {
                kind: kind.to_string(),
                message: format!("{} is mapped more than once (as \"{}\")", input, from),
            });
        }
    }
    Ok(codes)
}

fn dual_role_config(options: DualRoleOptions) -> Result<DualRoleConfig, ConfigError> {
    let key = parse_key(&options.key)?;

    let hold_action = match (options.keymap, options.modifier) {
        (Some(keymap), None) => {
            HoldAction::SwitchKeymap(
                parse_key_map(LayerKind::DualRole, &keymap)?
                    .into_iter()
                    .collect(),
            )
        }
        (None, Some(modifier)) => HoldAction::EmitCompanionModifier(parse_key(&modifier)?),
        (None, None) => return Err(ConfigError::MissingHoldAction(options.key)),
        (Some(_), Some(_)) => return Err(ConfigError::ConflictingHoldAction(options.key)),
    };

    let mut config = DualRoleConfig::new(key, hold_action);
    if let Some(ms) = options.threshold_ms {
        config = config.with_hold_threshold(Duration::from_millis(ms));
    }
    if let Some(ms) = options.lookahead_ms {
        config = config.with_lookahead_delay(Duration::from_millis(ms));
    }

    if config.lookahead_delay.is_zero() || config.lookahead_delay >= config.hold_threshold {
        return Err(ConfigError::InvalidTiming(format!(
            "{}: lookahead {:?} must be non-zero and below the hold threshold {:?}",
            key, config.lookahead_delay, config.hold_threshold
        )));
    }
    Ok(config)
}
