//! Configuration management with hierarchical layering.
//!
//! # Architecture
//!
//! Configuration is loaded from multiple sources with priority-based merging:
//!
//! ```text
//! Priority (highest to lowest):
//!
//! ┌─────────────────────────────────────────┐
//! │  1. Environment Variables (CF_*)        │  Runtime override
//! ├─────────────────────────────────────────┤
//! │  2. Project Config (.cf3/config.toml)   │  Project-specific
//! ├─────────────────────────────────────────┤
//! │  3. Global Config (~/.cf3/config.toml)  │  User defaults
//! ├─────────────────────────────────────────┤
//! │  4. Default Values (compile-time)       │  Fallback
//! └─────────────────────────────────────────┘
//! ```
//!
//! `Core::initiate` arguments (`name:type=value`) are applied to the
//! Environment component afterwards and win over all of the above.
//!
//! # Environment Variables
//!
//! | Variable | Config Field | Type |
//! |----------|--------------|------|
//! | `CF_PLUGINS` | `plugins` | `:`-separated list |
//! | `CF_LOG_LEVEL` | `log_level` | String |
//! | `CF_REGIST_SIGNAL_HANDLERS` | `regist_signal_handlers` | bool |
//!
//! `CF_LOG` is separate: it is an `EnvFilter` directive read by
//! [`logging::init`](crate::logging::init) and overrides `log_level`.
//!
//! # Example Configuration
//!
//! ```toml
//! # ~/.cf3/config.toml
//! log_level = "info"
//! regist_signal_handlers = true
//! plugins = ["cf3.mesh"]
//!
//! [environment]
//! log_level = "debug"
//! ```

mod error;
mod loader;
mod types;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use types::{ConfigLayer, CoreConfig, LOG_LEVELS};

/// Default global config directory.
pub fn default_config_dir() -> std::path::PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".cf3")
}

/// Default global config file path.
pub fn default_config_path() -> std::path::PathBuf {
    default_config_dir().join("config.toml")
}

/// Project config directory name.
pub const PROJECT_CONFIG_DIR: &str = ".cf3";

/// Project config file name.
pub const PROJECT_CONFIG_FILE: &str = "config.toml";
