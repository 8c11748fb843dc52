use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration from config.toml in the data directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub wish: WishConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishConfig {
    /// Artificial processing delay before a wish is answered
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

impl Default for WishConfig {
    fn default() -> Self {
        WishConfig {
            delay_ms: default_delay_ms(),
        }
    }
}

fn default_delay_ms() -> u64 {
    1500
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// JSON catalog to use instead of the built-in one.
    /// Relative paths resolve against the data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
}
