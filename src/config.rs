//! Key/value configuration.
//!
//! Events read every fixed parameter through [`ConfigSource::get_from_config`]. Missing values
//! are never fatal: the typed getters in [`ConfigSourceExt`] log and substitute a default.
use std::fmt::Display;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use log::{debug, warn};
use serde_json::Value;

use crate::error::HepceError;
use crate::HashMap;

/// A source of raw configuration strings, addressed by `"section.key"`.
pub trait ConfigSource {
    fn get_from_config(&self, key: &str) -> Option<String>;
}

/// Typed coercions shared by every [`ConfigSource`].
pub trait ConfigSourceExt: ConfigSource {
    /// Case-insensitive `true`/`false`. Anything else is `false` with a warning.
    fn get_bool(&self, key: &str) -> bool {
        match self.get_from_config(key) {
            Some(value) if value.trim().eq_ignore_ascii_case("true") => true,
            Some(value) if value.trim().eq_ignore_ascii_case("false") => false,
            Some(value) => {
                warn!("Config value `{value}` for {key} is not a boolean, using false");
                false
            }
            None => {
                warn!("No config value for {key}, using false");
                false
            }
        }
    }

    fn get_int(&self, key: &str) -> i32 {
        parse_or_default(self.get_from_config(key), key, 0)
    }

    /// # Errors
    /// Returns a `ConfigError` if `non_negative` is set and the configured value is negative.
    fn get_double(&self, key: &str, non_negative: bool) -> Result<f64, HepceError> {
        let value = parse_or_default(self.get_from_config(key), key, 0.0);
        if non_negative && value < 0.0 {
            return Err(HepceError::ConfigError(format!(
                "{key} must be non-negative, got {value}"
            )));
        }
        Ok(value)
    }

    fn get_string(&self, key: &str) -> String {
        if let Some(value) = self.get_from_config(key) {
            value.trim().to_string()
        } else {
            debug!("No config value for {key}, using empty string");
            String::new()
        }
    }

    /// Splits a comma-separated value. Elements are trimmed, empty elements are dropped and
    /// elements that fail to parse are logged and dropped.
    fn get_vec<T>(&self, key: &str) -> Vec<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        let Some(value) = self.get_from_config(key) else {
            debug!("No config value for {key}, using empty list");
            return Vec::new();
        };
        value
            .split(',')
            .map(str::trim)
            .filter(|element| !element.is_empty())
            .filter_map(|element| match element.parse::<T>() {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    warn!("Skipping element `{element}` of {key}: {e}");
                    None
                }
            })
            .collect()
    }
}

impl<C: ConfigSource + ?Sized> ConfigSourceExt for C {}

fn parse_or_default<T>(value: Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Display + Copy,
{
    match value {
        Some(value) => value.trim().parse::<T>().unwrap_or_else(|_| {
            warn!("Config value `{value}` for {key} could not be parsed, using {default}");
            default
        }),
        None => {
            warn!("No config value for {key}, using {default}");
            default
        }
    }
}

/// An in-memory configuration map, built by hand or from a sectioned JSON document.
#[derive(Debug, Clone, Default)]
pub struct Config {
    values: HashMap<String, String>,
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Config::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: impl ToString) {
        self.values.insert(key.to_string(), value.to_string());
    }

    /// Parses `{ "section": { "key": value, ... }, ... }` into `"section.key"` entries. Scalars
    /// are stringified and arrays are joined with commas.
    ///
    /// # Errors
    /// Returns a `JsonError` if the text is not JSON, or a `ConfigError` if it is not an object
    /// of objects.
    pub fn from_json_str(text: &str) -> Result<Self, HepceError> {
        let root: Value = serde_json::from_str(text)?;
        let Value::Object(sections) = root else {
            return Err(HepceError::ConfigError(
                "configuration root must be a JSON object".to_string(),
            ));
        };
        let mut config = Config::new();
        for (section, entries) in sections {
            let Value::Object(entries) = entries else {
                return Err(HepceError::ConfigError(format!(
                    "configuration section `{section}` must be a JSON object"
                )));
            };
            for (key, value) in entries {
                config.set(&format!("{section}.{key}"), json_to_config_string(&value));
            }
        }
        Ok(config)
    }

    /// # Errors
    /// Returns an `IoError` if the file cannot be read, otherwise see [`Config::from_json_str`].
    pub fn from_json_file(path: &Path) -> Result<Self, HepceError> {
        let text = fs::read_to_string(path)?;
        Config::from_json_str(&text)
    }
}

fn json_to_config_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(json_to_config_string)
            .collect::<Vec<_>>()
            .join(","),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl ConfigSource for Config {
    fn get_from_config(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}
