// Kbfn Config
// TOML loading and layer descriptor validation

pub mod layer;
pub mod parser;

pub use layer::{LayerConfig, LayerDescriptor, LayerKind, RemapConfig};
pub use parser::{Config, ConfigError, DEFAULT_RETRY_INTERVAL};
