use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::model::catalog::{Catalog, CatalogError};
use crate::model::config::Config;

pub const CONFIG_FILE: &str = "config.toml";

/// Error type for reading config.toml
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError { path: PathBuf, source: io::Error },
    #[error("could not parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Resolve the data directory: explicit override, then `$XDG_DATA_HOME`,
/// then `~/.local/share`.
pub fn data_dir(override_dir: Option<&Path>) -> PathBuf {
    if let Some(dir) = override_dir {
        return dir.to_path_buf();
    }
    let base = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local").join("share"));
    base.join("blessings")
}

fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/"))
}

/// Read config.toml from the data directory. A missing file gives defaults.
pub fn read_config(dir: &Path) -> Result<Config, ConfigError> {
    let path = dir.join(CONFIG_FILE);
    let text = match fs::read_to_string(&path) {
        Ok(t) => t,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Config::default()),
        Err(e) => return Err(ConfigError::ReadError { path, source: e }),
    };
    toml::from_str(&text).map_err(|e| ConfigError::ParseError { path, source: e })
}

/// The configured catalog, or the built-in one.
pub fn load_catalog(config: &Config, dir: &Path) -> Result<Catalog, CatalogError> {
    match &config.catalog.path {
        Some(path) if path.is_absolute() => Catalog::from_json_file(path),
        Some(path) => Catalog::from_json_file(&dir.join(path)),
        None => Ok(Catalog::builtin()),
    }
}
