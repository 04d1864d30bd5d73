//! Configuration errors.

use cf_types::ErrorCode;
use std::path::PathBuf;
use thiserror::Error;

/// Configuration error type.
///
/// | Variant | Code | Recoverable |
/// |---------|------|-------------|
/// | [`ReadFile`](Self::ReadFile) | `CONFIG_READ_FILE` | No |
/// | [`ParseToml`](Self::ParseToml) | `CONFIG_PARSE_TOML` | No |
/// | [`Serialize`](Self::Serialize) | `CONFIG_SERIALIZE` | No |
/// | [`InvalidEnvVar`](Self::InvalidEnvVar) | `CONFIG_INVALID_ENV_VAR` | Yes |
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file.
    #[error("failed to read config file '{path}': {source}")]
    ReadFile {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML.
    #[error("failed to parse config file '{path}': {source}")]
    ParseToml {
        /// File that could not be parsed.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Failed to serialize config.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Invalid environment variable value.
    #[error("invalid value for environment variable '{name}': {message}")]
    InvalidEnvVar {
        /// Variable name.
        name: String,
        /// What was wrong with it.
        message: String,
    },
}

impl ConfigError {
    /// Creates a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Creates a parse TOML error.
    pub fn parse_toml(path: impl Into<PathBuf>, source: toml::de::Error) -> Self {
        Self::ParseToml {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid env var error.
    pub fn invalid_env_var(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEnvVar {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl ErrorCode for ConfigError {
    fn code(&self) -> &'static str {
        match self {
            Self::ReadFile { .. } => "CONFIG_READ_FILE",
            Self::ParseToml { .. } => "CONFIG_PARSE_TOML",
            Self::Serialize(_) => "CONFIG_SERIALIZE",
            Self::InvalidEnvVar { .. } => "CONFIG_INVALID_ENV_VAR",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::InvalidEnvVar { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_types::assert_error_codes;

    fn parse_error() -> toml::de::Error {
        toml::from_str::<toml::Table>("= broken").expect_err("invalid TOML should fail")
    }

    #[test]
    fn error_display() {
        let err = ConfigError::invalid_env_var("CF_REGIST_SIGNAL_HANDLERS", "expected bool");
        assert!(err.to_string().contains("CF_REGIST_SIGNAL_HANDLERS"));
        assert!(err.to_string().contains("expected bool"));
    }

    #[test]
    fn all_error_codes_valid() {
        let errors = vec![
            ConfigError::read_file(
                "/x/config.toml",
                std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
            ),
            ConfigError::parse_toml("/x/config.toml", parse_error()),
            ConfigError::invalid_env_var("CF_PLUGINS", "empty"),
        ];
        assert_error_codes(&errors, "CONFIG_");
    }

    #[test]
    fn only_env_errors_are_recoverable() {
        assert!(ConfigError::invalid_env_var("CF_LOG_LEVEL", "x").is_recoverable());
        assert!(!ConfigError::parse_toml("/x", parse_error()).is_recoverable());
    }
}
