//! Libraries known by name.
//!
//! A driver fills a [`PluginCatalog`] with constructors before starting
//! the core. `CF_PLUGINS` and the `plugins` config key then select which
//! of them are registered and initiated.
//!
//! ```text
//! CF_PLUGINS=cf3.mesh:cf3.solver
//!        │
//!        ▼
//! PluginCatalog ── "cf3.mesh"   → fn() -> Box<dyn Library>
//!               └─ "cf3.solver" → fn() -> Box<dyn Library>
//!        │
//!        ▼
//! Context::regist_library(..) → initiate_all_libraries()
//! ```

use cf_component::Library;
use cf_types::{CfError, CfResult};
use indexmap::IndexMap;

/// Builds a fresh library instance.
pub type LibraryConstructor = Box<dyn Fn() -> Box<dyn Library>>;

/// Name → constructor map of loadable libraries.
#[derive(Default)]
pub struct PluginCatalog {
    entries: IndexMap<String, LibraryConstructor>,
}

impl PluginCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a constructor under `name`.
    ///
    /// # Errors
    ///
    /// [`CfError::ValueExists`] if `name` is taken.
    pub fn register<F>(&mut self, name: &str, constructor: F) -> CfResult<()>
    where
        F: Fn() -> Box<dyn Library> + 'static,
    {
        if self.entries.contains_key(name) {
            return Err(CfError::ValueExists(format!("plugin '{name}'")));
        }
        self.entries.insert(name.to_string(), Box::new(constructor));
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    ///
    /// # Errors
    ///
    /// Same as [`register`](Self::register).
    pub fn with<F>(mut self, name: &str, constructor: F) -> CfResult<Self>
    where
        F: Fn() -> Box<dyn Library> + 'static,
    {
        self.register(name, constructor)?;
        Ok(self)
    }

    /// Returns `true` if `name` is known.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Known names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Builds the library registered as `name`.
    ///
    /// # Errors
    ///
    /// [`CfError::ValueNotFound`] for unknown names.
    pub fn instantiate(&self, name: &str) -> CfResult<Box<dyn Library>> {
        let constructor = self
            .entries
            .get(name)
            .ok_or_else(|| CfError::not_found(format!("plugin library '{name}'")))?;
        Ok(constructor())
    }
}

impl std::fmt::Debug for PluginCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.entries.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Mesh;

    impl Library for Mesh {
        fn name(&self) -> &'static str {
            "cf3.mesh"
        }
    }

    #[test]
    fn instantiate_known_plugin() {
        let catalog = PluginCatalog::new()
            .with("cf3.mesh", || Box::new(Mesh))
            .expect("first registration");
        assert!(catalog.contains("cf3.mesh"));
        let library = catalog.instantiate("cf3.mesh").expect("known plugin");
        assert_eq!(library.name(), "cf3.mesh");
    }

    #[test]
    fn unknown_plugin_is_not_found() {
        let catalog = PluginCatalog::new();
        assert!(matches!(
            catalog.instantiate("cf3.nothing"),
            Err(CfError::ValueNotFound(_))
        ));
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let mut catalog = PluginCatalog::new();
        catalog
            .register("cf3.mesh", || Box::new(Mesh))
            .expect("first registration");
        assert!(matches!(
            catalog.register("cf3.mesh", || Box::new(Mesh)),
            Err(CfError::ValueExists(_))
        ));
        assert_eq!(catalog.names().collect::<Vec<_>>(), ["cf3.mesh"]);
    }
}
