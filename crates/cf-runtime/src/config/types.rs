//! Configuration types.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Log levels accepted by the `log_level` setting.
pub const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Startup configuration of a [`Core`](crate::Core).
///
/// Fields with `#[serde(default)]` are optional in the config file.
///
/// # Example
///
/// ```
/// use cf_runtime::config::CoreConfig;
///
/// let config = CoreConfig::from_toml(r#"
/// log_level = "debug"
/// plugins = ["cf3.mesh"]
///
/// [environment]
/// regist_signal_handlers = "true"
/// "#).expect("valid config");
///
/// assert_eq!(config.log_level, "debug");
/// assert_eq!(config.plugins, ["cf3.mesh"]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CoreConfig {
    /// Default log filter, one of [`LOG_LEVELS`].
    pub log_level: String,

    /// Install a panic hook that logs through `tracing`.
    pub regist_signal_handlers: bool,

    /// Libraries to load from the plugin catalog, in order.
    pub plugins: Vec<String>,

    /// Extra Environment options, keyed by option name. Values are parsed
    /// according to each option's declared type.
    pub environment: IndexMap<String, String>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".into(),
            regist_signal_handlers: false,
            plugins: Vec::new(),
            environment: IndexMap::new(),
        }
    }
}

impl CoreConfig {
    /// Creates a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes to TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Deserializes from TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if deserialization fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Applies a parsed config file on top of this config.
    ///
    /// Scalars present in `layer` override, even when they equal the
    /// default. Plugins accumulate without duplicates; environment entries
    /// override by key.
    pub fn merge(&mut self, layer: &ConfigLayer) {
        if let Some(level) = &layer.log_level {
            self.log_level.clone_from(level);
        }
        if let Some(flag) = layer.regist_signal_handlers {
            self.regist_signal_handlers = flag;
        }
        for plugin in &layer.plugins {
            if !self.plugins.contains(plugin) {
                self.plugins.push(plugin.clone());
            }
        }
        for (name, value) in &layer.environment {
            self.environment.insert(name.clone(), value.clone());
        }
    }
}

/// One config file as written, before it is merged.
///
/// Absent scalars stay `None` so a later file can tell "not set" apart from
/// "set to the default".
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConfigLayer {
    /// `log_level`, if the file sets it.
    pub log_level: Option<String>,

    /// `regist_signal_handlers`, if the file sets it.
    pub regist_signal_handlers: Option<bool>,

    /// Libraries appended to the plugin list.
    pub plugins: Vec<String>,

    /// Environment option overrides.
    pub environment: IndexMap<String, String>,
}

impl ConfigLayer {
    /// Deserializes a layer from TOML.
    ///
    /// # Errors
    ///
    /// Returns error if deserialization fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }
}
