// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run validation.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Load `path` if given, else the default path if it exists, else defaults.
///
/// An explicitly requested file that does not exist is an error.
pub fn load_or_default(path: Option<&Path>) -> Result<ConfigFile> {
    match path {
        Some(path) => load_and_validate(path),
        None => {
            let path = default_config_path();
            if path.is_file() {
                debug!(path = %path.display(), "loading default config file");
                load_and_validate(&path)
            } else {
                Ok(ConfigFile::default())
            }
        }
    }
}

/// `stepwise.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("stepwise.toml")
}
