//! Core types for the cf3 component runtime.
//!
//! This crate provides the foundational types shared by every other cf3
//! crate:
//!
//! - [`CfError`] / [`ErrorCode`]: the error taxonomy and code interface
//! - [`Uri`] / [`Scheme`]: hierarchical addressing of the component tree
//! - [`Value`] / [`ValueType`]: dynamically typed option values
//!
//! # Crate Architecture
//!
//! ```text
//! cf-types      errors, URIs, values
//!    ↓
//! cf-options    options, option lists, signal frames
//!    ↓
//! cf-component  component tree, signals, events, registries
//!    ↓
//! cf-runtime    Core lifecycle, environment, config, logging
//!    ↓
//! cf-cli        cf3 binary
//! ```

mod error;
mod uri;
mod value;

pub use error::{assert_error_code, assert_error_codes, CfError, CfResult, ErrorCode};
pub use uri::{Scheme, Uri};
pub use value::{FromValue, Value, ValueType};
