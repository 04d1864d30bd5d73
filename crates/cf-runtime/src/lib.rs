//! Runtime layer of cf3: core life cycle, environment, plugins and
//! configuration.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        SDK Layer                            │
//! │  cf-types     : CfError, ErrorCode, Uri, Value              │
//! │  cf-options   : ConfigOption, OptionList, SignalFrame       │
//! ├─────────────────────────────────────────────────────────────┤
//! │                        Core Layer                           │
//! │  cf-component : ComponentTree, Handle, Context              │
//! ├─────────────────────────────────────────────────────────────┤
//! │                  Runtime Layer (THIS CRATE)                 │
//! │  lifecycle    : Core, CoreState                             │
//! │  config/      : CoreConfig, ConfigLoader                    │
//! │  logging      : tracing-subscriber bring-up                 │
//! │  plugin       : PluginCatalog                               │
//! ├─────────────────────────────────────────────────────────────┤
//! │                      Frontend Layer                         │
//! │  cf-cli       : cf3 binary                                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Startup
//!
//! ```text
//! ConfigLoader::load()  ──►  CoreConfig
//!                                │
//!                                ▼
//! Core::with_catalog(config, catalog)     registers cf3.common,
//!                                │        creates /Environment, /Tools
//!                                ▼
//! core.initiate(["name:type=value", ..])  logging, plugins, libraries
//!                                │
//!                                ▼
//! core.context_mut()  ... work ...
//!                                │
//!                                ▼
//! core.terminate()
//! ```

mod common;
pub mod config;
mod environment;
mod error;
mod lifecycle;
pub mod logging;
mod plugin;

pub use common::CommonLibrary;
pub use environment::Environment;
pub use error::RuntimeError;
pub use lifecycle::{Core, CoreState};
pub use plugin::{LibraryConstructor, PluginCatalog};
