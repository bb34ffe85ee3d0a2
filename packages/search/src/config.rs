//! Search engine configuration.
//!
//! Defaults are embedded from `config/search.toml` at compile time. A
//! config file may override any subset of keys, and a few values can be
//! overridden again by environment variables.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

const EMBEDDED_CONFIG: &str = include_str!("../config/search.toml");

/// Overrides [`SearchConfig::default_limit`].
pub const DEFAULT_LIMIT_ENV: &str = "PARCEL_MAP_DEFAULT_LIMIT";
/// Overrides [`SearchConfig::max_limit`].
pub const MAX_LIMIT_ENV: &str = "PARCEL_MAP_MAX_LIMIT";
/// Overrides [`SearchConfig::timeout_ms`].
pub const TIMEOUT_MS_ENV: &str = "PARCEL_MAP_TIMEOUT_MS";

/// Errors loading a [`SearchConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The TOML was malformed or had wrongly-typed values.
    #[error("Failed to parse search config: {0}")]
    Parse(#[from] toml::de::Error),

    /// An override environment variable did not parse.
    #[error("Invalid value for {var}: '{value}'")]
    InvalidEnv {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
    },

    /// The values parsed but are inconsistent.
    #[error("Invalid search config: {0}")]
    Invalid(String),
}

/// Tunables for [`crate::SearchEngine`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Result cap when the filter sets none.
    pub default_limit: u32,
    /// Hard result cap; larger requests are clamped.
    pub max_limit: u32,
    /// Time budget for one search in milliseconds.
    pub timeout_ms: u64,
    /// Building square footage at or below which a parcel counts as
    /// unimproved for vacancy inference.
    pub vacant_sqft_threshold: f64,
    /// Simplification tolerance for result geometry, in square degrees.
    pub simplify_tolerance: f64,
    /// Decimal places kept in result coordinates.
    pub coordinate_precision: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: 500,
            max_limit: 5000,
            timeout_ms: 10_000,
            vacant_sqft_threshold: 100.0,
            simplify_tolerance: 1e-10,
            coordinate_precision: 6,
        }
    }
}

impl SearchConfig {
    /// Loads the embedded defaults, then `path` if given, then environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::Io`] if `path` cannot be read
    /// * [`ConfigError::Parse`] if any TOML layer is malformed
    /// * [`ConfigError::InvalidEnv`] if an override variable is not a number
    /// * [`ConfigError::Invalid`] if the final values are inconsistent
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                log::info!("Loading search config from {}", path.display());
                Self::from_toml(&text)?
            }
            None => Self::embedded()?,
        };

        config.apply_env(|var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// The compiled-in defaults.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::Parse`] if the embedded file is malformed
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_toml(EMBEDDED_CONFIG)
    }

    /// Parses a TOML document. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::Parse`] if the document is malformed
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::de::from_str(text)?)
    }

    /// Applies environment overrides using `lookup` to read variables.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::InvalidEnv`] if a set variable does not parse
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(v) = parse_env(&lookup, DEFAULT_LIMIT_ENV)? {
            self.default_limit = v;
        }
        if let Some(v) = parse_env(&lookup, MAX_LIMIT_ENV)? {
            self.max_limit = v;
        }
        if let Some(v) = parse_env(&lookup, TIMEOUT_MS_ENV)? {
            self.timeout_ms = v;
        }
        Ok(())
    }

    /// Checks the values are usable together.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::Invalid`] describing the first inconsistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_limit == 0 {
            return Err(ConfigError::Invalid("max_limit must be positive".into()));
        }
        if self.default_limit == 0 || self.default_limit > self.max_limit {
            return Err(ConfigError::Invalid(format!(
                "default_limit must be between 1 and max_limit ({})",
                self.max_limit
            )));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid("timeout_ms must be positive".into()));
        }
        if !self.vacant_sqft_threshold.is_finite() || self.vacant_sqft_threshold < 0.0 {
            return Err(ConfigError::Invalid(
                "vacant_sqft_threshold must be a non-negative number".into(),
            ));
        }
        if !self.simplify_tolerance.is_finite() || self.simplify_tolerance < 0.0 {
            return Err(ConfigError::Invalid(
                "simplify_tolerance must be a non-negative number".into(),
            ));
        }
        Ok(())
    }

    /// Resolves a requested result cap: absent means `default_limit`,
    /// anything above `max_limit` is clamped.
    #[must_use]
    pub fn effective_limit(&self, requested: Option<u32>) -> usize {
        let limit = requested.unwrap_or(self.default_limit).min(self.max_limit);
        usize::try_from(limit).unwrap_or(usize::MAX)
    }
}

fn parse_env<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|_| ConfigError::InvalidEnv { var, value: raw })
}
