//! Validator configuration.
//!
//! Every field has a default so an empty TOML file (or none at all) is valid:
//!
//! ```toml
//! [severity]
//! coercible_kind = "error"
//!
//! [schema]
//! manifest_dirs = ["/usr/lib/node_modules"]
//! max_concurrency = 4
//! ```

use crate::core::error::ConfigError;
use crate::core::issue::Level;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration of a validation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidatorConfig {
    /// Levels of the findings whose severity is a policy choice.
    pub severity: SeverityPolicy,
    /// Where operation schemas come from.
    pub schema: SchemaConfig,
}

/// Configurable severities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeverityPolicy {
    /// A value of the wrong kind that can be read as the expected one.
    pub coercible_kind: Level,
    /// A named binding the schema does not declare.
    pub unknown_parameter: Level,
    /// A step not reachable from the entry step.
    pub orphan_step: Level,
    /// An exit step with an outgoing forward edge.
    pub exit_has_successor: Level,
    /// Connected steps disagree on object mode.
    pub interface_object_mode: Level,
}

impl Default for SeverityPolicy {
    fn default() -> Self {
        Self {
            coercible_kind: Level::Warning,
            unknown_parameter: Level::Warning,
            orphan_step: Level::Warning,
            exit_has_successor: Level::Warning,
            interface_object_mode: Level::Warning,
        }
    }
}

/// Schema source settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchemaConfig {
    /// Directories holding `<package>/<manifest_file>`.
    pub manifest_dirs: Vec<PathBuf>,
    /// File name of a package manifest.
    pub manifest_file: String,
    /// Base URL serving `<package>/<manifest_file>`.
    pub registry_url: Option<String>,
    /// Timeout of one remote manifest fetch.
    pub timeout_secs: u64,
    /// Maximum number of schema resolutions in flight.
    pub max_concurrency: usize,
    /// Also search `node_modules` next to the validated document.
    pub search_document_dir: bool,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            manifest_dirs: Vec::new(),
            manifest_file: "manifest.ttl".to_string(),
            registry_url: None,
            timeout_secs: 10,
            max_concurrency: 8,
            search_document_dir: true,
        }
    }
}

impl SchemaConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ValidatorConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.check()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Set the severity policy.
    pub fn with_severity(mut self, severity: SeverityPolicy) -> Self {
        self.severity = severity;
        self
    }

    /// Set the level of coercible kind mismatches.
    pub fn with_coercible_kind(mut self, level: Level) -> Self {
        self.severity.coercible_kind = level;
        self
    }

    /// Add a manifest search directory.
    pub fn with_manifest_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.schema.manifest_dirs.push(dir.into());
        self
    }

    /// Set the remote manifest registry.
    pub fn with_registry_url(mut self, url: impl Into<String>) -> Self {
        self.schema.registry_url = Some(url.into());
        self
    }

    /// Set the schema resolution concurrency limit.
    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.schema.max_concurrency = limit;
        self
    }

    /// Enable or disable the `node_modules` lookup next to the document.
    pub fn with_document_dir_search(mut self, enabled: bool) -> Self {
        self.schema.search_document_dir = enabled;
        self
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.schema.max_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "schema.max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.schema.manifest_file.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "schema.manifest_file must not be empty".to_string(),
            ));
        }
        if let Some(url) = &self.schema.registry_url {
            url::Url::parse(url)
                .map_err(|e| ConfigError::Invalid(format!("schema.registry_url: {}", e)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_is_default() {
        let config = ValidatorConfig::from_toml_str("").unwrap();
        assert_eq!(config, ValidatorConfig::default());
        assert_eq!(config.severity.coercible_kind, Level::Warning);
        assert_eq!(config.schema.manifest_file, "manifest.ttl");
    }

    #[test]
    fn test_partial_sections() {
        let config = ValidatorConfig::from_toml_str(
            r#"
            [severity]
            coercible_kind = "error"
            orphan_step = "info"

            [schema]
            manifest_dirs = ["/opt/manifests"]
            max_concurrency = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.severity.coercible_kind, Level::Error);
        assert_eq!(config.severity.orphan_step, Level::Info);
        assert_eq!(config.severity.unknown_parameter, Level::Warning);
        assert_eq!(config.schema.manifest_dirs, vec![PathBuf::from("/opt/manifests")]);
        assert_eq!(config.schema.max_concurrency, 2);
        assert_eq!(config.schema.timeout_secs, 10);
    }

    #[test]
    fn test_rejects_unknown_keys_and_bad_values() {
        assert!(matches!(
            ValidatorConfig::from_toml_str("[severity]\nbogus = \"error\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            ValidatorConfig::from_toml_str("[schema]\nmax_concurrency = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ValidatorConfig::from_toml_str("[schema]\nregistry_url = \"not a url\""),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[schema]\nregistry_url = \"https://registry.example/\"").unwrap();
        let config = ValidatorConfig::from_file(file.path()).unwrap();
        assert_eq!(
            config.schema.registry_url.as_deref(),
            Some("https://registry.example/")
        );

        assert!(matches!(
            ValidatorConfig::from_file("/nonexistent/pipelint.toml"),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_builders() {
        let config = ValidatorConfig::new()
            .with_coercible_kind(Level::Error)
            .with_manifest_dir("/a")
            .with_max_concurrency(3)
            .with_document_dir_search(false);
        assert_eq!(config.severity.coercible_kind, Level::Error);
        assert_eq!(config.schema.manifest_dirs.len(), 1);
        assert_eq!(config.schema.max_concurrency, 3);
        assert!(!config.schema.search_document_dir);
    }
}
