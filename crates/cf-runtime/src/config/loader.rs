//! Configuration loader with hierarchical merging.
//!
//! # Load Order
//!
//! 1. Default values (compile-time)
//! 2. Global config (`~/.cf3/config.toml`)
//! 3. Project config (`.cf3/config.toml`)
//! 4. Environment variables (`CF_*`)
//!
//! Each layer overrides the previous.

use super::{
    default_config_path, ConfigError, ConfigLayer, CoreConfig, PROJECT_CONFIG_DIR, PROJECT_CONFIG_FILE,
};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration loader with builder pattern.
///
/// # Example
///
/// ```no_run
/// use cf_runtime::config::ConfigLoader;
///
/// let config = ConfigLoader::new()
///     .with_project_root("/path/to/project")
///     .skip_env_vars()
///     .load()?;
/// # Ok::<(), cf_runtime::config::ConfigError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    /// Global config file path (defaults to ~/.cf3/config.toml).
    global_config_path: Option<PathBuf>,

    /// Project root directory.
    project_root: Option<PathBuf>,

    skip_env: bool,
    skip_global: bool,
    skip_project: bool,
}

impl ConfigLoader {
    /// Creates a new loader with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a custom global config path.
    #[must_use]
    pub fn with_global_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config_path = Some(path.into());
        self
    }

    /// Sets the project root directory.
    ///
    /// Project config will be loaded from `<project_root>/.cf3/config.toml`.
    #[must_use]
    pub fn with_project_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.project_root = Some(path.into());
        self
    }

    /// Skips environment variable loading.
    #[must_use]
    pub fn skip_env_vars(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Skips global config loading.
    #[must_use]
    pub fn skip_global_config(mut self) -> Self {
        self.skip_global = true;
        self
    }

    /// Skips project config loading.
    #[must_use]
    pub fn skip_project_config(mut self) -> Self {
        self.skip_project = true;
        self
    }

    /// Loads and merges configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any config file exists but cannot be read
    /// or parsed, or an environment variable holds an invalid value.
    /// Missing config files are silently ignored.
    pub fn load(&self) -> Result<CoreConfig, ConfigError> {
        let mut config = CoreConfig::default();

        if !self.skip_global {
            let global_path = self
                .global_config_path
                .clone()
                .unwrap_or_else(default_config_path);

            if let Some(global_config) = load_file(&global_path)? {
                debug!(path = %global_path.display(), "Loaded global config");
                config.merge(&global_config);
            }
        }

        if !self.skip_project {
            if let Some(ref project_root) = self.project_root {
                let project_config_path = project_root
                    .join(PROJECT_CONFIG_DIR)
                    .join(PROJECT_CONFIG_FILE);

                if let Some(project_config) = load_file(&project_config_path)? {
                    debug!(
                        path = %project_config_path.display(),
                        project = %project_root.display(),
                        "Loaded project config"
                    );
                    config.merge(&project_config);
                }
            }
        }

        if !self.skip_env {
            apply_env_vars(&mut config)?;
        }

        Ok(config)
    }
}

/// Loads a config file, returning None if it doesn't exist.
fn load_file(path: &Path) -> Result<Option<ConfigLayer>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
    let layer = ConfigLayer::from_toml(&content).map_err(|e| ConfigError::parse_toml(path, e))?;
    Ok(Some(layer))
}

/// Applies `CF_*` overrides.
fn apply_env_vars(config: &mut CoreConfig) -> Result<(), ConfigError> {
    if let Ok(val) = std::env::var("CF_PLUGINS") {
        config.plugins = split_plugins(&val);
        debug!(plugins = ?config.plugins, "CF_PLUGINS override");
    }

    if let Ok(val) = std::env::var("CF_LOG_LEVEL") {
        let level = val.trim().to_lowercase();
        if level.is_empty() {
            return Err(ConfigError::invalid_env_var("CF_LOG_LEVEL", "empty level"));
        }
        config.log_level = level;
    }

    if let Ok(val) = std::env::var("CF_REGIST_SIGNAL_HANDLERS") {
        config.regist_signal_handlers = parse_bool(&val).ok_or_else(|| {
            ConfigError::invalid_env_var("CF_REGIST_SIGNAL_HANDLERS", "expected bool")
        })?;
    }

    Ok(())
}

/// Splits a `:`-separated library list, dropping empty entries.
pub(crate) fn split_plugins(list: &str) -> Vec<String> {
    list.split(':')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses a boolean from string.
///
/// Accepts: "true", "false", "1", "0", "yes", "no", "on", "off"
/// (case-insensitive).
fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_config_file(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("config.toml");
        std::fs::write(&path, content).expect("config file should be written");
        path
    }

    #[test]
    fn load_defaults_only() {
        let config = ConfigLoader::new()
            .skip_global_config()
            .skip_project_config()
            .skip_env_vars()
            .load()
            .expect("defaults should load");

        assert_eq!(config, CoreConfig::default());
    }

    #[test]
    fn load_global_config() {
        let temp = TempDir::new().expect("temp dir should be created");
        let config_path = create_config_file(
            temp.path(),
            r#"
log_level = "debug"
plugins = ["cf3.mesh"]
"#,
        );

        let config = ConfigLoader::new()
            .with_global_config(&config_path)
            .skip_project_config()
            .skip_env_vars()
            .load()
            .expect("global config should load");

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.plugins, ["cf3.mesh"]);
    }

    #[test]
    fn load_project_overrides_global() {
        let global_temp = TempDir::new().expect("temp dir should be created");
        let project_temp = TempDir::new().expect("temp dir should be created");

        let cf3_dir = project_temp.path().join(".cf3");
        std::fs::create_dir_all(&cf3_dir).expect("project dir should be created");

        let global_path = create_config_file(
            global_temp.path(),
            r#"
log_level = "debug"
regist_signal_handlers = true
plugins = ["cf3.mesh"]
"#,
        );
        create_config_file(
            &cf3_dir,
            r#"
log_level = "trace"
plugins = ["cf3.solver"]
"#,
        );

        let config = ConfigLoader::new()
            .with_global_config(&global_path)
            .with_project_root(project_temp.path())
            .skip_env_vars()
            .load()
            .expect("layered config should load");

        assert!(config.regist_signal_handlers, "kept from global");
        assert_eq!(config.log_level, "trace", "project wins");
        assert_eq!(config.plugins, ["cf3.mesh", "cf3.solver"]);
    }

    #[test]
    fn project_can_reset_global_to_default() {
        let global_temp = TempDir::new().expect("temp dir should be created");
        let project_temp = TempDir::new().expect("temp dir should be created");
        let cf3_dir = project_temp.path().join(".cf3");
        std::fs::create_dir_all(&cf3_dir).expect("project dir should be created");

        let global_path = create_config_file(
            global_temp.path(),
            "log_level = \"debug\"\nregist_signal_handlers = true\n",
        );
        create_config_file(
            &cf3_dir,
            "log_level = \"warn\"\nregist_signal_handlers = false\n",
        );

        let config = ConfigLoader::new()
            .with_global_config(&global_path)
            .with_project_root(project_temp.path())
            .skip_env_vars()
            .load()
            .expect("layered config should load");

        assert_eq!(config, CoreConfig::default());
    }

    #[test]
    fn missing_config_files_ok() {
        let config = ConfigLoader::new()
            .with_global_config("/nonexistent/path/config.toml")
            .with_project_root("/nonexistent/project")
            .skip_env_vars()
            .load()
            .expect("missing files are ignored");

        assert_eq!(config, CoreConfig::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = TempDir::new().expect("temp dir should be created");
        let path = create_config_file(temp.path(), "log_level = [");

        let err = ConfigLoader::new()
            .with_global_config(&path)
            .skip_project_config()
            .skip_env_vars()
            .load()
            .expect_err("malformed TOML should fail");

        assert!(matches!(err, ConfigError::ParseToml { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn split_plugins_drops_empty_entries() {
        assert_eq!(split_plugins("a::b: c :"), ["a", "b", "c"]);
        assert!(split_plugins("").is_empty());
    }

    #[test]
    fn parse_bool_values() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("yes"), Some(true));
        assert_eq!(parse_bool("on"), Some(true));

        assert_eq!(parse_bool("false"), Some(false));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("no"), Some(false));
        assert_eq!(parse_bool("off"), Some(false));

        assert_eq!(parse_bool("invalid"), None);
    }

    #[test]
    fn env_var_override() {
        // Modifies process env; the other loader tests skip env vars.
        std::env::set_var("CF_PLUGINS", "cf3.mesh:cf3.solver");
        std::env::set_var("CF_LOG_LEVEL", "DEBUG");
        std::env::set_var("CF_REGIST_SIGNAL_HANDLERS", "yes");

        let config = ConfigLoader::new()
            .skip_global_config()
            .skip_project_config()
            .load();

        std::env::set_var("CF_REGIST_SIGNAL_HANDLERS", "maybe");
        let invalid = ConfigLoader::new()
            .skip_global_config()
            .skip_project_config()
            .load();

        std::env::remove_var("CF_PLUGINS");
        std::env::remove_var("CF_LOG_LEVEL");
        std::env::remove_var("CF_REGIST_SIGNAL_HANDLERS");

        let config = config.expect("env overrides should load");
        assert_eq!(config.plugins, ["cf3.mesh", "cf3.solver"]);
        assert_eq!(config.log_level, "debug");
        assert!(config.regist_signal_handlers);
        assert!(matches!(
            invalid,
            Err(ConfigError::InvalidEnvVar { ref name, .. }) if name == "CF_REGIST_SIGNAL_HANDLERS"
        ));
    }
}
