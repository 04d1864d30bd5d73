//! Runtime layer errors.
//!
//! # Error Codes
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`RuntimeError::Core`] | `RUNTIME_CORE` | as the wrapped [`CfError`] |
//! | [`RuntimeError::Config`] | `RUNTIME_CONFIG` | as the wrapped [`ConfigError`] |
//! | [`RuntimeError::Plugin`] | `RUNTIME_PLUGIN` | No |

use crate::config::ConfigError;
use cf_types::{CfError, ErrorCode};
use thiserror::Error;

/// Runtime layer error.
///
/// # Example
///
/// ```
/// use cf_runtime::RuntimeError;
/// use cf_types::{CfError, ErrorCode};
///
/// let err = RuntimeError::setup("core was terminated");
/// assert_eq!(err.code(), "RUNTIME_CORE");
/// assert!(err.is_recoverable());
/// assert!(matches!(err.core_error(), Some(CfError::SetupError(_))));
/// ```
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// An operation on the component runtime failed.
    #[error(transparent)]
    Core(#[from] CfError),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A plugin could not be found or registered.
    #[error("plugin '{name}': {source}")]
    Plugin {
        /// Library name as requested.
        name: String,
        /// What went wrong.
        #[source]
        source: CfError,
    },
}

impl RuntimeError {
    /// Creates a [`CfError::SetupError`] wrapped as a runtime error.
    pub fn setup(message: impl Into<String>) -> Self {
        Self::Core(CfError::SetupError(message.into()))
    }

    /// Creates a plugin error.
    pub fn plugin(name: impl Into<String>, source: CfError) -> Self {
        Self::Plugin {
            name: name.into(),
            source,
        }
    }

    /// The underlying core error, if any.
    #[must_use]
    pub fn core_error(&self) -> Option<&CfError> {
        match self {
            Self::Core(e) | Self::Plugin { source: e, .. } => Some(e),
            Self::Config(_) => None,
        }
    }
}

impl ErrorCode for RuntimeError {
    fn code(&self) -> &'static str {
        match self {
            Self::Core(_) => "RUNTIME_CORE",
            Self::Config(_) => "RUNTIME_CONFIG",
            Self::Plugin { .. } => "RUNTIME_PLUGIN",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::Core(e) => e.is_recoverable(),
            Self::Config(e) => e.is_recoverable(),
            Self::Plugin { .. } => false,
        }
    }
}
