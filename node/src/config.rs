//! Context configuration.

use serde::Deserialize;
use thiserror::Error;

/// Errors loading a `Config`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Behavior switches shared by every node of a context.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Suppress writes equal to the current value on string, number,
    /// integer and boolean nodes.
    pub distinct_scalars: bool,
    /// Unknown type tags fail at declaration instead of passing everything.
    pub strict_types: bool,
    /// Run the validator on the initial value of a new child.
    pub validate_initial: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            distinct_scalars: true,
            strict_types: false,
            validate_initial: true,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_distinct_scalars(mut self, on: bool) -> Self {
        self.distinct_scalars = on;
        self
    }

    pub fn with_strict_types(mut self, on: bool) -> Self {
        self.strict_types = on;
        self
    }

    pub fn with_validate_initial(mut self, on: bool) -> Self {
        self.validate_initial = on;
        self
    }
}
