use std::{
    fs,
    path::Path,
    sync::{LazyLock, PoisonError, RwLock},
};

use qstream_criteria::{Dialect, RenderOptions};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, Result};

/// Environment variable naming a TOML file to load the configuration from.
pub const CONFIG_ENV: &str = "QSTREAM_CONFIG";

/// Settings shared by every stream created from one builder.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct StreamConfig {
    /// SQL flavor statements are rendered for.
    /// Default: generic
    pub dialect: Dialect,

    /// Wrap table and column names in double quotes.
    /// Default: false
    pub quote_identifiers: bool,

    /// How deeply subqueries may nest inside one build.
    /// Default: 32
    pub max_subquery_depth: usize,

    /// Log every prepared statement at debug level.
    /// Default: true
    pub log_statements: bool,

    /// Warn when an update or delete has no restriction.
    /// Default: true
    pub warn_on_unrestricted: bool,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::Generic,
            quote_identifiers: false,
            max_subquery_depth: 32,
            log_statements: true,
            warn_on_unrestricted: true,
        }
    }
}

pub static CONFIG: LazyLock<RwLock<Option<StreamConfig>>> = LazyLock::new(|| RwLock::new(None));

/// Loads the configuration named by `QSTREAM_CONFIG` (or the defaults) and
/// installs it as the process-wide configuration.
pub fn init() -> Result<()> {
    let config = StreamConfig::new()?;
    set_config(config);
    Ok(())
}

pub fn set_config(config: StreamConfig) {
    let mut global = CONFIG.write().unwrap_or_else(PoisonError::into_inner);
    *global = Some(config);
}

/// Returns the process-wide configuration, falling back to the defaults when
/// [`init`] was never called.
pub fn get_config() -> StreamConfig {
    CONFIG
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
        .unwrap_or_default()
}

impl StreamConfig {
    /// Loads from the file named by `QSTREAM_CONFIG`; defaults when unset.
    pub fn new() -> Result<Self> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(path),
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| {
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let config = Self::from_toml_str(&content)?;
        debug!("loaded stream configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.resolve()?;
        Ok(config)
    }

    pub fn resolve(&self) -> Result<()> {
        if self.max_subquery_depth == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_subquery_depth",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            dialect: self.dialect,
            quote_identifiers: self.quote_identifiers,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serial_test::serial;
    use tempfile::NamedTempFile;

    use super::*;
    use crate::test_utils::EnvGuard;

    #[test]
    fn test_default_config() {
        let config = StreamConfig::default();

        assert_eq!(config.dialect, Dialect::Generic);
        assert!(!config.quote_identifiers);
        assert_eq!(config.max_subquery_depth, 32);
        assert!(config.log_statements);
        assert!(config.warn_on_unrestricted);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = StreamConfig::from_toml_str(
            r#"
            dialect = "postgres"
            quote_identifiers = true
            "#,
        )
        .unwrap();

        assert_eq!(config.dialect, Dialect::Postgres);
        assert!(config.quote_identifiers);
        assert_eq!(config.max_subquery_depth, 32);
        assert_eq!(
            config.render_options(),
            RenderOptions {
                dialect: Dialect::Postgres,
                quote_identifiers: true,
            }
        );
    }

    #[test]
    fn test_invalid_values() {
        let result = StreamConfig::from_toml_str("max_subquery_depth = 0");
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue {
                field: "max_subquery_depth",
                ..
            })
        ));

        let result = StreamConfig::from_toml_str(r#"dialect = "oracle""#);
        assert!(matches!(result, Err(ConfigError::TomlDeError(_))));
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = StreamConfig {
            dialect: Dialect::Sqlite,
            log_statements: false,
            ..StreamConfig::default()
        };
        let serialized = config.to_toml().unwrap();
        assert!(serialized.contains("dialect = \"sqlite\""));
        assert_eq!(StreamConfig::from_toml_str(&serialized).unwrap(), config);
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "max_subquery_depth = 4").unwrap();

        let config = StreamConfig::from_file(file.path()).unwrap();
        assert_eq!(config.max_subquery_depth, 4);

        let missing = StreamConfig::from_file("/nonexistent/qstream.toml");
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }

    #[test]
    #[serial]
    fn test_env_override() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "warn_on_unrestricted = false").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let _guard = EnvGuard::set(CONFIG_ENV, &path);
        let config = StreamConfig::new().unwrap();
        assert!(!config.warn_on_unrestricted);
    }

    #[test]
    #[serial]
    fn test_global_config() {
        set_config(StreamConfig {
            max_subquery_depth: 3,
            ..StreamConfig::default()
        });
        assert_eq!(get_config().max_subquery_depth, 3);

        {
            let _guard = EnvGuard::set(CONFIG_ENV, "/nonexistent/qstream.toml");
            assert!(init().is_err());
        }
        assert_eq!(get_config().max_subquery_depth, 3);

        set_config(StreamConfig::default());
        assert_eq!(get_config(), StreamConfig::default());
    }
}
