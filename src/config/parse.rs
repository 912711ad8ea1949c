//! Configuration ingestion
//!
//! A configuration context is captured once, either from the process
//! environment or from a `.env`-style file merged over it. Declarative
//! staging specs are loaded as opaque YAML documents.

use crate::config::types::Config;
use crate::error::{ConfigError, ConfigResult, PrepError};
use std::env;
use std::fs;
use std::path::Path;

impl Config {
    /// Capture the full process environment as a configuration context
    pub fn from_env() -> Self {
        Config::from_pairs(env::vars())
    }
}

/// Capture the process environment with a `.env`-style file merged on top.
///
/// Values in the file shadow values already present in the environment.
pub fn load_env_file(path: &Path) -> ConfigResult<Config> {
    let mut pairs: Vec<(String, String)> = env::vars().collect();

    for item in dotenvy::from_path_iter(path).map_err(|e| ConfigError::EnvFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })? {
        let (key, value) = item.map_err(|e| ConfigError::EnvFile {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        pairs.retain(|(k, _)| k != &key);
        pairs.push((key, value));
    }

    Ok(Config::from_pairs(pairs))
}

/// Load a declarative spec document as an opaque YAML value
pub fn load_yaml_file(path: &Path) -> Result<serde_yaml::Value, PrepError> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&contents)?)
}
