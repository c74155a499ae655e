//! Configuration
//!
//! Optional `codelink.toml` at the root (or `--config FILE`). Flags and
//! environment variables override file values; missing fields fall back to
//! defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::document::{DEFAULT_CLASS, DEFAULT_MARKER};

/// File name looked up under the root
pub const CONFIG_FILE_NAME: &str = "codelink.toml";

/// Default excerpt budget for `list` (bytes)
pub const DEFAULT_MAX_EXCERPT: usize = 400;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    Read {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    Parse {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Substring that flags a quotation
    pub marker: String,

    /// Class written onto flagged quotations
    pub class: String,

    /// File extensions treated as pages
    pub extensions: Vec<String>,

    /// Excerpt budget for `list` (bytes)
    pub max_excerpt: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            marker: DEFAULT_MARKER.to_string(),
            class: DEFAULT_CLASS.to_string(),
            extensions: vec!["html".to_string(), "htm".to_string()],
            max_excerpt: DEFAULT_MAX_EXCERPT,
        }
    }
}

/// Values from flags / environment; `None` keeps the file value
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub marker: Option<String>,
    pub class: Option<String>,
    pub max_excerpt: Option<usize>,
}

impl Config {
    /// Load from a path; `Ok(None)` when the file does not exist
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content =
            std::fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            config_path: config_path.to_path_buf(),
            source,
        })?;

        Ok(Some(config))
    }

    /// Resolve the effective configuration for a run.
    ///
    /// An explicit path must exist; the root file is optional.
    pub fn resolve(
        root: &Path,
        explicit: Option<&Path>,
        overrides: Overrides,
    ) -> Result<Self, ConfigError> {
        let config = match explicit {
            Some(path) => Self::load_from_path(path)?.ok_or_else(|| ConfigError::Read {
                config_path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
            })?,
            None => Self::load_from_path(root.join(CONFIG_FILE_NAME))?.unwrap_or_default(),
        };

        let config = config.with_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(marker) = overrides.marker {
            self.marker = marker;
        }
        if let Some(class) = overrides.class {
            self.class = class;
        }
        if let Some(max_excerpt) = overrides.max_excerpt {
            self.max_excerpt = max_excerpt;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.marker.is_empty() {
            return Err(ConfigError::Invalid {
                field: "marker",
                reason: "must not be empty".to_string(),
            });
        }

        if self.class.is_empty() {
            return Err(ConfigError::Invalid {
                field: "class",
                reason: "must not be empty".to_string(),
            });
        }
        if let Some(bad) = self
            .class
            .chars()
            .find(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '<' | '>' | '&' | '=' | '`'))
        {
            return Err(ConfigError::Invalid {
                field: "class",
                reason: format!("{:?} is not allowed in a single class name", bad),
            });
        }

        if self.extensions.is_empty() {
            return Err(ConfigError::Invalid {
                field: "extensions",
                reason: "at least one extension is required".to_string(),
            });
        }

        Ok(())
    }
}
