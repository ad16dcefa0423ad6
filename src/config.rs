//! Service configuration loaded from an optional YAML file.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working configuration:
//!
//! ```yaml
//! bind_addr: "0.0.0.0:8000"
//! known_person_ids: [1, 2, 3, 4, 5]
//! validate_responses: true
//! max_body_bytes: 10485760
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading [`AppConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("known_person_ids must only contain positive ids, found {0}")]
    NonPositiveId(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Address the HTTP server binds to.
    pub bind_addr: String,
    /// Ids accepted by `GET /person/detail/{person_id}`.
    pub known_person_ids: Vec<i64>,
    /// Check handler output against the route's response model before writing it.
    pub validate_responses: bool,
    /// Request bodies larger than this are rejected with 413.
    pub max_body_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            known_person_ids: vec![1, 2, 3, 4, 5],
            validate_responses: true,
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

impl AppConfig {
    /// Parse a configuration from YAML text.
    pub fn from_yaml_str(yaml: &str, origin: &Path) -> Result<Self, ConfigError> {
        // An empty document deserializes as `null`, which should mean "all defaults".
        let config: AppConfig = if yaml.trim().is_empty() {
            AppConfig::default()
        } else {
            serde_yaml::from_str(yaml).map_err(|source| ConfigError::Yaml {
                path: origin.to_path_buf(),
                source,
            })?
        };
        config.check()?;
        Ok(config)
    }

    /// Load a configuration file from disk.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&yaml, path)
    }

    /// Load `path` when given, otherwise fall back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    fn check(&self) -> Result<(), ConfigError> {
        if let Some(bad) = self.known_person_ids.iter().find(|id| **id <= 0) {
            return Err(ConfigError::NonPositiveId(*bad));
        }
        Ok(())
    }
}
