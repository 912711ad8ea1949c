//! Runtime context projection
//!
//! Every task needs a small fixed set of runtime values: the cycle date,
//! the cycle hour, the working directory and the run label. They are
//! projected out of the configuration context at task construction and any
//! absence is fatal.

use crate::config::types::Config;
use crate::error::{ConfigError, ConfigResult};
use std::path::PathBuf;

/// Configuration keys every task must carry
pub const RUNTIME_KEYS: &[&str] = &["PDY", "cyc", "DATA", "RUN"];

/// The minimal typed subset of configuration needed to run a task
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeContext {
    /// Cycle date, `YYYYMMDD`
    pub pdy: String,

    /// Cycle hour of day
    pub cyc: i64,

    /// Working directory for the run
    pub data: PathBuf,

    /// Run label (e.g. `gfs`, `gdas`)
    pub run: String,
}

impl RuntimeContext {
    /// Project the runtime context from a configuration.
    ///
    /// Fails with `MissingRuntimeKey` on the first absent required key;
    /// no partial context is ever produced.
    pub fn from_config(config: &Config) -> ConfigResult<Self> {
        for key in RUNTIME_KEYS {
            if !config.contains(key) {
                return Err(ConfigError::MissingRuntimeKey(key.to_string()));
            }
        }

        Ok(RuntimeContext {
            pdy: config.str("PDY")?,
            cyc: config.int("cyc")?,
            data: config.path("DATA")?,
            run: config.str("RUN")?,
        })
    }
}
