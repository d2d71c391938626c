//! Runtime configuration.
//!
//! Every setting has a default, so a config file is optional. When present it
//! is a JSON document whose keys mirror [`Config`] in camelCase:
//!
//! ```json
//! {
//!   "paths": { "catalog": "catalog.json", "batchDir": "data/batches", "index": "index.bs" },
//!   "memberHost": "www.pahgncb.com",
//!   "db": { "id": "PAHG", "name": "PAHG", "url": "https://www.pahgncb.com/", "version": "1.0" },
//!   "validation": { "strict": true, "reportLimit": 10 },
//!   "backup": true
//! }
//! ```
//!
//! Command-line flags take precedence over values read here.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::DbMetadata;
use crate::utils::validation::{UrlScheme, DEFAULT_MEMBER_HOST};

/// Config file picked up from the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "genefam.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error("Invalid memberHost '{0}': expected a bare host name such as www.example.com")]
    InvalidHost(String),

    #[error("Invalid URL pattern: {0}")]
    Pattern(#[from] regex::Error),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PathsConfig {
    pub catalog: PathBuf,
    pub batch_dir: PathBuf,
    pub index: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            catalog: PathBuf::from("catalog.json"),
            batch_dir: PathBuf::from("data/batches"),
            index: PathBuf::from("index.bs"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidationConfig {
    /// Treat duplicate genes and malformed URLs as failures
    pub strict: bool,

    /// How many offending member URLs to list individually
    pub report_limit: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            strict: true,
            report_limit: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub paths: PathsConfig,

    /// Host in the member URL pattern and in derived family URLs
    pub member_host: String,

    /// Metadata used when the catalog has no `db` block of its own
    pub db: DbMetadata,

    pub validation: ValidationConfig,

    /// Keep a timestamped copy of the catalog before overwriting it
    pub backup: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            member_host: DEFAULT_MEMBER_HOST.to_string(),
            db: DbMetadata::pahg(),
            validation: ValidationConfig::default(),
            backup: true,
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, [`DEFAULT_CONFIG_FILE`] is used
    /// if present and built-in defaults otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if it names an
    /// unusable host.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::load_from(default_path)
                } else {
                    tracing::debug!("No {} found, using built-in defaults", DEFAULT_CONFIG_FILE);
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load configuration from a specific file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::parse(&content).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                source,
            },
            other => other,
        })?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse configuration from a JSON string
    ///
    /// # Errors
    ///
    /// Returns an error on malformed JSON or an unusable host.
    pub fn parse(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|source| ConfigError::Parse {
            path: "<inline>".to_string(),
            source,
        })?;
        config.check_host()?;
        Ok(config)
    }

    fn check_host(&self) -> Result<(), ConfigError> {
        let host = self.member_host.as_str();
        if host.is_empty() || host.contains(['/', '?', '#', ' ']) {
            return Err(ConfigError::InvalidHost(host.to_string()));
        }
        Ok(())
    }

    /// URL layout for the configured host
    ///
    /// # Errors
    ///
    /// Returns an error if the host is unusable.
    pub fn url_scheme(&self) -> Result<UrlScheme, ConfigError> {
        self.check_host()?;
        Ok(UrlScheme::new(&self.member_host)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.paths.catalog, PathBuf::from("catalog.json"));
        assert_eq!(config.paths.batch_dir, PathBuf::from("data/batches"));
        assert_eq!(config.paths.index, PathBuf::from("index.bs"));
        assert_eq!(config.member_host, "www.pahgncb.com");
        assert!(config.validation.strict);
        assert_eq!(config.validation.report_limit, 10);
        assert!(config.backup);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config =
            Config::parse(r#"{"memberHost": "host", "validation": {"strict": false}}"#).unwrap();
        assert_eq!(config.member_host, "host");
        assert!(!config.validation.strict);
        assert_eq!(config.validation.report_limit, 10);
        assert_eq!(config.db.id, "PAHG");
    }

    #[test]
    fn test_rejects_bad_host() {
        let err = Config::parse(r#"{"memberHost": "https://host/"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidHost(_)));
    }

    #[test]
    fn test_load_from_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genefam.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("genefam.json"));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        assert!(matches!(
            Config::load(Some(&path)),
            Err(ConfigError::Read { .. })
        ));
    }
}
