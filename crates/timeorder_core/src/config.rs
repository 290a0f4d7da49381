//! Runtime configuration for core consumers.
//!
//! # Responsibility
//! - Deserialize logging, connection and soft-delete settings from TOML.
//! - Provide defaults for every field so an empty document is valid.
//!
//! # Invariants
//! - `validate()` runs after every successful parse.
//! - `log.dir`, when present, is an absolute path.

use crate::logging::{default_log_level, normalize_level};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    pub log: LogConfig,
    pub store: StoreConfig,
    pub soft_delete: SoftDeleteConfig,
}

/// `[log]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    pub level: String,
    /// Directory for rolling log files. Logging stays off when unset.
    pub dir: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            dir: None,
        }
    }
}

/// `[store]` section, applied when a connection is opened.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub busy_timeout_ms: u64,
    pub foreign_keys: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            foreign_keys: true,
        }
    }
}

/// How a repeated soft delete treats an existing `removed_at` stamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestampPolicy {
    /// Every soft delete writes the current time.
    #[default]
    LastWins,
    /// The first stamp is kept; later soft deletes do not write.
    FirstWins,
}

/// `[soft_delete]` section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SoftDeleteConfig {
    pub restamp: RestampPolicy,
}

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config document: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

impl CoreConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        normalize_level(&self.log.level).map_err(ConfigError::Invalid)?;

        if let Some(dir) = self.log.dir.as_ref() {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "log.dir must be an absolute path, got `{}`",
                    dir.display()
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, RestampPolicy};

    #[test]
    fn empty_document_yields_defaults() {
        let config = CoreConfig::from_toml_str("").expect("empty document parses");
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.store.busy_timeout_ms, 5_000);
        assert!(config.store.foreign_keys);
        assert_eq!(config.soft_delete.restamp, RestampPolicy::LastWins);
        assert!(config.log.dir.is_none());
    }

    #[test]
    fn parses_all_sections() {
        let config = CoreConfig::from_toml_str(
            r#"
[log]
level = "WARN"
dir = "/tmp/timeorder-logs"

[store]
busy_timeout_ms = 250
foreign_keys = false

[soft_delete]
restamp = "first_wins"
"#,
        )
        .expect("full document parses");

        assert_eq!(config.log.level, "WARN");
        assert_eq!(config.store.busy_timeout_ms, 250);
        assert!(!config.store.foreign_keys);
        assert_eq!(config.soft_delete.restamp, RestampPolicy::FirstWins);
    }

    #[test]
    fn rejects_unknown_level_and_relative_dir() {
        let err = CoreConfig::from_toml_str("[log]\nlevel = \"loud\"").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref msg) if msg.contains("loud")));

        let err = CoreConfig::from_toml_str("[log]\ndir = \"logs\"").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref msg) if msg.contains("absolute")));
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = CoreConfig::from_toml_str("[store]\npool_size = 4").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reads_file_and_reports_missing_path() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("timeorder.toml");
        std::fs::write(&path, "[soft_delete]\nrestamp = \"first_wins\"\n").expect("write config file");

        let config = CoreConfig::load(&path).expect("load config file");
        assert_eq!(config.soft_delete.restamp, RestampPolicy::FirstWins);

        let err = CoreConfig::load(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
