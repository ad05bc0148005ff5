use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("TOML serialization error: {0}")]
    #[diagnostic(
        code(qstream_config::toml_serialize),
        help("Check your configuration structure for invalid values")
    )]
    TomlSerError(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    #[diagnostic(
        code(qstream_config::toml_deserialize),
        help("Check your qstream.toml syntax and structure")
    )]
    TomlDeError(#[from] toml::de::Error),

    #[error("Failed to read config file {path}: {source}")]
    #[diagnostic(
        code(qstream_config::read),
        help("Check that the file exists and is readable, or unset QSTREAM_CONFIG")
    )]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid value for `{field}`: {reason}")]
    #[diagnostic(code(qstream_config::invalid_value))]
    InvalidValue {
        field: &'static str,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
