//! Unified error interface for the component runtime.
//!
//! This module provides the [`ErrorCode`] trait for standardized error
//! handling across all cf3 crates, and [`CfError`], the taxonomy every
//! core operation reports through.
//!
//! # Design
//!
//! All error types should implement [`ErrorCode`] to provide:
//!
//! - **Machine-readable codes**: For programmatic error handling
//! - **Recoverability info**: For user feedback in drivers and UI servers
//!
//! The core never swallows or batches errors: a condition is signaled at the
//! point of detection and propagated with `?`.
//!
//! # Example
//!
//! ```
//! use cf_types::{CfError, ErrorCode};
//!
//! let err = CfError::ValueNotFound("cpath:/Tools/Mesher".into());
//! assert_eq!(err.code(), "CF_VALUE_NOT_FOUND");
//! assert!(!err.is_recoverable());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error code interface for cf3 errors.
///
/// # Code Format
///
/// Error codes should be:
///
/// - **UPPER_SNAKE_CASE**: e.g., `"CF_BAD_VALUE"`
/// - **Namespace-prefixed**: e.g., `"CF_"`, `"CONFIG_"`, `"RUNTIME_"`
/// - **Stable**: Codes should not change once defined
///
/// # Recoverability
///
/// An error is recoverable if the caller can take action (typically:
/// configure something) and retry the same operation successfully.
pub trait ErrorCode {
    /// Returns a machine-readable error code.
    fn code(&self) -> &'static str;

    /// Returns whether the error is recoverable.
    fn is_recoverable(&self) -> bool;
}

/// Result alias used throughout the core.
pub type CfResult<T> = Result<T, CfError>;

/// The error taxonomy of the component runtime.
///
/// | Variant | Code | Recoverable |
/// |---------|------|-------------|
/// | [`ValueNotFound`](Self::ValueNotFound) | `CF_VALUE_NOT_FOUND` | No |
/// | [`ValueExists`](Self::ValueExists) | `CF_VALUE_EXISTS` | No |
/// | [`CastingFailed`](Self::CastingFailed) | `CF_CASTING_FAILED` | No |
/// | [`BadValue`](Self::BadValue) | `CF_BAD_VALUE` | No |
/// | [`ProtocolError`](Self::ProtocolError) | `CF_PROTOCOL_ERROR` | No |
/// | [`SetupError`](Self::SetupError) | `CF_SETUP_ERROR` | Yes |
/// | [`NotImplemented`](Self::NotImplemented) | `CF_NOT_IMPLEMENTED` | No |
/// | [`NotSupported`](Self::NotSupported) | `CF_NOT_SUPPORTED` | No |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum CfError {
    /// A named lookup (child, option, signal, registry entry) failed.
    #[error("value not found: {0}")]
    ValueNotFound(String),

    /// A name that must be unique is already registered.
    #[error("value exists: {0}")]
    ValueExists(String),

    /// A dynamic type conversion did not match the requested type.
    #[error("casting failed: {0}")]
    CastingFailed(String),

    /// A value failed validation (restricted list, malformed URI, bad name).
    #[error("bad value: {0}")]
    BadValue(String),

    /// A URI scheme is not in the caller's allowed set.
    #[error("protocol error: {0}")]
    ProtocolError(String),

    /// An operation ran before its required configuration was established.
    ///
    /// **Recoverable** - configure the missing dependency and retry.
    #[error("setup error: {0}")]
    SetupError(String),

    /// The capability exists in the interface but has no implementation.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// The capability is intentionally unavailable on this component.
    #[error("not supported: {0}")]
    NotSupported(String),
}

impl CfError {
    /// Creates a [`ValueNotFound`](Self::ValueNotFound) error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::ValueNotFound(what.into())
    }

    /// Creates a [`BadValue`](Self::BadValue) error.
    pub fn bad_value(what: impl Into<String>) -> Self {
        Self::BadValue(what.into())
    }

    /// Creates a [`CastingFailed`](Self::CastingFailed) error.
    pub fn casting(what: impl Into<String>) -> Self {
        Self::CastingFailed(what.into())
    }

    /// Returns the message carried by the error, without the variant prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::ValueNotFound(m)
            | Self::ValueExists(m)
            | Self::CastingFailed(m)
            | Self::BadValue(m)
            | Self::ProtocolError(m)
            | Self::SetupError(m)
            | Self::NotImplemented(m)
            | Self::NotSupported(m) => m,
        }
    }
}

impl ErrorCode for CfError {
    fn code(&self) -> &'static str {
        match self {
            Self::ValueNotFound(_) => "CF_VALUE_NOT_FOUND",
            Self::ValueExists(_) => "CF_VALUE_EXISTS",
            Self::CastingFailed(_) => "CF_CASTING_FAILED",
            Self::BadValue(_) => "CF_BAD_VALUE",
            Self::ProtocolError(_) => "CF_PROTOCOL_ERROR",
            Self::SetupError(_) => "CF_SETUP_ERROR",
            Self::NotImplemented(_) => "CF_NOT_IMPLEMENTED",
            Self::NotSupported(_) => "CF_NOT_SUPPORTED",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::SetupError(_))
    }
}

/// Validates that an error code follows cf3 conventions.
///
/// # Checks
///
/// 1. Code is UPPER_SNAKE_CASE
/// 2. Code starts with expected prefix
/// 3. Code is not empty
///
/// # Panics
///
/// Panics with descriptive message if validation fails.
pub fn assert_error_code<E: ErrorCode>(err: &E, expected_prefix: &str) {
    let code = err.code();

    assert!(!code.is_empty(), "Error code must not be empty");

    assert!(
        code.starts_with(expected_prefix),
        "Error code '{code}' must start with prefix '{expected_prefix}'"
    );

    assert!(
        is_upper_snake_case(code),
        "Error code '{code}' must be UPPER_SNAKE_CASE"
    );
}

/// Validates multiple error codes at once.
///
/// Use this to verify all variants of an error enum.
pub fn assert_error_codes<E: ErrorCode>(errors: &[E], expected_prefix: &str) {
    for err in errors {
        assert_error_code(err, expected_prefix);
    }
}

/// Checks if a string is UPPER_SNAKE_CASE.
fn is_upper_snake_case(s: &str) -> bool {
    if s.is_empty() || s.starts_with('_') || s.ends_with('_') || s.contains("__") {
        return false;
    }

    s.chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
