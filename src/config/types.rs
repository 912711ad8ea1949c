//! Core configuration types
//!
//! A configuration context is a flat mapping from string keys to typed
//! scalar values, conventionally sourced from environment variables.

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// A typed configuration scalar
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ConfigValue {
    /// Cast a raw string into the most specific scalar type.
    ///
    /// Booleans accept `true`/`false`, `yes`/`no` and the Fortran literals
    /// `.true.`/`.false.` (case-insensitive). Integers are tried before
    /// floats; anything else stays a string.
    pub fn cast(raw: &str) -> Self {
        let lowered = raw.to_ascii_lowercase();
        match lowered.as_str() {
            "true" | "yes" | ".true." => return ConfigValue::Bool(true),
            "false" | "no" | ".false." => return ConfigValue::Bool(false),
            _ => {}
        }
        if let Ok(i) = raw.parse::<i64>() {
            return ConfigValue::Int(i);
        }
        if let Ok(f) = raw.parse::<f64>() {
            return ConfigValue::Float(f);
        }
        ConfigValue::Str(raw.to_string())
    }

    /// The value as a string, if it is one
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The value as an integer, if it is one
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ConfigValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// The value as a float (integers widen)
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ConfigValue::Float(f) => Some(*f),
            ConfigValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// The value as a boolean, if it is one
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Bool(b) => write!(f, "{}", b),
            ConfigValue::Int(i) => write!(f, "{}", i),
            ConfigValue::Float(x) => write!(f, "{}", x),
            ConfigValue::Str(s) => write!(f, "{}", s),
        }
    }
}

/// Configuration context: a deterministic ordered key -> value mapping.
///
/// Keys are case-preserving. The context is captured once at task
/// construction and never mutated afterwards; accessors are strict and an
/// unknown key is an error, never a silent default.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(flatten)]
    entries: BTreeMap<String, ConfigValue>,
}

impl Config {
    /// Create an empty context
    pub fn new() -> Self {
        Config::default()
    }

    /// Capture a context from raw key/value pairs, casting each value
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let entries = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), ConfigValue::cast(v.as_ref())))
            .collect();
        Config { entries }
    }

    /// Look up a key
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.get(key)
    }

    /// Whether a key is defined
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Look up a key, failing if it is absent
    pub fn require(&self, key: &str) -> ConfigResult<&ConfigValue> {
        self.entries
            .get(key)
            .ok_or_else(|| ConfigError::MissingKey(key.to_string()))
    }

    /// A required string value (any scalar stringifies)
    pub fn str(&self, key: &str) -> ConfigResult<String> {
        Ok(self.require(key)?.to_string())
    }

    /// A required integer value
    pub fn int(&self, key: &str) -> ConfigResult<i64> {
        let value = self.require(key)?;
        value.as_int().ok_or_else(|| ConfigError::BadCast {
            key: key.to_string(),
            value: value.to_string(),
            wanted: "an integer",
        })
    }

    /// A required float value
    pub fn float(&self, key: &str) -> ConfigResult<f64> {
        let value = self.require(key)?;
        value.as_float().ok_or_else(|| ConfigError::BadCast {
            key: key.to_string(),
            value: value.to_string(),
            wanted: "a float",
        })
    }

    /// A required boolean value
    pub fn bool(&self, key: &str) -> ConfigResult<bool> {
        let value = self.require(key)?;
        value.as_bool().ok_or_else(|| ConfigError::BadCast {
            key: key.to_string(),
            value: value.to_string(),
            wanted: "a boolean",
        })
    }

    /// A required path value
    pub fn path(&self, key: &str) -> ConfigResult<PathBuf> {
        Ok(PathBuf::from(self.str(key)?))
    }

    /// A string with an explicit caller-supplied default
    pub fn str_or(&self, key: &str, default: &str) -> String {
        match self.get(key) {
            Some(value) => value.to_string(),
            None => default.to_string(),
        }
    }

    /// An integer with an explicit caller-supplied default
    pub fn int_or(&self, key: &str, default: i64) -> ConfigResult<i64> {
        match self.get(key) {
            Some(_) => self.int(key),
            None => Ok(default),
        }
    }

    /// A boolean with an explicit caller-supplied default
    pub fn bool_or(&self, key: &str, default: bool) -> ConfigResult<bool> {
        match self.get(key) {
            Some(_) => self.bool(key),
            None => Ok(default),
        }
    }

    /// Iterate over all entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ConfigValue)> {
        self.entries.iter()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the context is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
