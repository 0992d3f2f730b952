//! TOML configuration for warning filters and declared deprecations.
//!
//! ```toml
//! [warnings]
//! developer = "always"
//!
//! [warnings.categories]
//! "plugin api" = "error"
//!
//! [[deprecations]]
//! keys = ["colour", "color"]
//! deprecated_in = "1.4"
//! severity = "end user"
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::DkeyError;
use crate::descriptor::{KeyDeprecation, Severity, dkey};
use crate::filter::WarningFilter;
use crate::map::DeprecatedKeys;
use crate::sink::{FilteredSink, TracingSink, WarningSink, set_global_sink};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid deprecation: {0}")]
    Deprecation(#[from] DkeyError),
}

/// One `[[deprecations]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeprecationEntry {
    /// One key (removal) or two keys (rename).
    pub keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated_in: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed_in: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default)]
    pub severity: Severity,
}

impl DeprecationEntry {
    /// Build the descriptor this entry declares.
    pub fn to_deprecation(&self) -> crate::Result<KeyDeprecation<String>> {
        let mut builder = dkey(self.keys.iter().cloned()).severity(self.severity.clone());
        if let Some(ref version) = self.deprecated_in {
            builder = builder.deprecated_in(version.as_str());
        }
        if let Some(ref version) = self.removed_in {
            builder = builder.removed_in(version.as_str());
        }
        if let Some(ref details) = self.details {
            builder = builder.details(details.as_str());
        }
        builder.build()
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DkeyConfig {
    #[serde(default)]
    pub warnings: WarningFilter,
    #[serde(default)]
    pub deprecations: Vec<DeprecationEntry>,
}

impl DkeyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        debug!(
            path = %path.display(),
            deprecations = config.deprecations.len(),
            "Loaded dkey config"
        );
        Ok(config)
    }

    pub fn filter(&self) -> &WarningFilter {
        &self.warnings
    }

    /// Build every declared deprecation, stopping at the first invalid one.
    pub fn deprecations(&self) -> Result<Vec<KeyDeprecation<String>>, ConfigError> {
        self.deprecations
            .iter()
            .map(|entry| entry.to_deprecation().map_err(ConfigError::from))
            .collect()
    }

    /// A `tracing` sink behind this config's filter.
    pub fn sink(&self) -> FilteredSink<TracingSink> {
        FilteredSink::new(TracingSink, self.warnings.clone())
    }

    /// Install [`sink`](Self::sink) as the process-wide sink, returning the
    /// previous one.
    pub fn install(&self) -> Arc<dyn WarningSink> {
        set_global_sink(Arc::new(self.sink()))
    }

    /// Wrap `base` with the declared deprecations.
    pub fn wrap<V, B>(&self, base: B) -> Result<DeprecatedKeys<String, V>, ConfigError>
    where
        B: IntoIterator<Item = (String, V)>,
        V: Clone,
    {
        Ok(DeprecatedKeys::new(base, self.deprecations()?)?)
    }

    /// Like [`wrap`](Self::wrap), emitting into `sink`.
    pub fn wrap_with_sink<V, B>(
        &self,
        base: B,
        sink: Arc<dyn WarningSink>,
    ) -> Result<DeprecatedKeys<String, V>, ConfigError>
    where
        B: IntoIterator<Item = (String, V)>,
        V: Clone,
    {
        Ok(DeprecatedKeys::with_sink(base, self.deprecations()?, sink)?)
    }
}
