//! Connection configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{StrataError, StrataResult};
use crate::history::DEFAULT_SUFFIX;

/// Option key naming the shadow-table suffix.
pub const SUFFIX_OPTION: &str = "suffix";

/// How to reach a database and which mode to wrap its dialect in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionDetails {
    /// Dialect name.
    pub dialect: String,
    /// Database location (path, URL or `:memory:`).
    pub database: String,
    /// Registered mode to apply; empty for the plain dialect.
    pub mode: String,
    /// Mode options. Modes remove the options they consume.
    pub options: HashMap<String, String>,
}

impl Default for ConnectionDetails {
    fn default() -> Self {
        Self {
            dialect: "sqlite".to_string(),
            database: ":memory:".to_string(),
            mode: String::new(),
            options: HashMap::new(),
        }
    }
}

impl ConnectionDetails {
    /// Load details from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<Path>) -> StrataResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| StrataError::Configuration(e.to_string()))
            }
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| StrataError::Configuration(e.to_string())),
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| StrataError::Configuration(e.to_string())),
            _ => Err(StrataError::Configuration(
                "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
            )),
        }
    }

    /// Load details from environment variables.
    pub fn from_env() -> Self {
        let mut details = Self::default();

        if let Ok(dialect) = std::env::var("STRATA_DIALECT") {
            details.dialect = dialect;
        }
        if let Ok(database) = std::env::var("STRATA_DATABASE") {
            details.database = database;
        }
        if let Ok(mode) = std::env::var("STRATA_MODE") {
            details.mode = mode;
        }
        if let Ok(suffix) = std::env::var("STRATA_HISTORY_SUFFIX") {
            details.options.insert(SUFFIX_OPTION.to_string(), suffix);
        }

        details
    }

    /// Build details using builder pattern.
    pub fn builder() -> ConnectionDetailsBuilder {
        ConnectionDetailsBuilder::default()
    }

    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    /// Remove and return an option.
    pub fn take_option(&mut self, key: &str) -> Option<String> {
        self.options.remove(key)
    }
}

/// Builder for ConnectionDetails.
#[derive(Default)]
pub struct ConnectionDetailsBuilder {
    details: ConnectionDetails,
}

impl ConnectionDetailsBuilder {
    pub fn dialect(mut self, dialect: impl Into<String>) -> Self {
        self.details.dialect = dialect.into();
        self
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.details.database = database.into();
        self
    }

    pub fn mode(mut self, mode: impl Into<String>) -> Self {
        self.details.mode = mode.into();
        self
    }

    /// Set one mode option.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.options.insert(key.into(), value.into());
        self
    }

    /// Build the details.
    pub fn build(self) -> ConnectionDetails {
        self.details
    }
}

/// Options of the history mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryOptions {
    /// Appended to a base table name to form its shadow table name.
    pub suffix: String,
}

impl Default for HistoryOptions {
    fn default() -> Self {
        Self {
            suffix: DEFAULT_SUFFIX.to_string(),
        }
    }
}

impl HistoryOptions {
    /// Take the history options out of `details`.
    ///
    /// A missing or empty `suffix` option means the default suffix.
    pub fn from_details(details: &mut ConnectionDetails) -> Self {
        match details.take_option(SUFFIX_OPTION) {
            Some(suffix) if !suffix.is_empty() => Self { suffix },
            _ => Self::default(),
        }
    }
}
