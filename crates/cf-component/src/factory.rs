//! Construction of components from their type name.
//!
//! Registration happens in an explicit step at startup (a [`Library`]'s
//! `register`), not through load-time static objects.
//!
//! # Registration States
//!
//! ```text
//! Unregistered ──create_component::<T>──► TypeRegistered
//!      │                                        │
//!      └──────────── regist_builder::<T, B> ────┴──► BuilderRegistered
//! ```
//!
//! A builder stays available for the lifetime of its [`Factories`]. The
//! only way back is a registration whose tree mirror could not be created,
//! which [`Context::regist_builder`](crate::Context::regist_builder) undoes.
//!
//! # Bases
//!
//! Each builder is filed under the kind `B` it produces, so plugins can
//! ask for "a `dyn Solver` named `cf3.solver.Ksp`" and get a typed result:
//!
//! ```text
//! Factories
//! ├── cf3.common.Component
//! │   ├── cf3.common.Group
//! │   └── cf3.common.Link
//! └── cf3.solver.Solver
//!     └── cf3.solver.Ksp
//! ```
//!
//! [`Library`]: crate::Library

use crate::{Component, ComponentType, Kind};
use cf_types::{CfError, CfResult};
use indexmap::IndexMap;
use std::any::{type_name, TypeId};

/// A type known to [`TypeInfo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeEntry {
    /// Registered name (`T::TYPE_NAME`).
    pub type_name: &'static str,
    /// Rust type path, for diagnostics.
    pub rust_name: &'static str,
    type_id: TypeId,
}

/// Registry of component types that have been used.
#[derive(Debug, Default)]
pub struct TypeInfo {
    types: IndexMap<&'static str, TypeEntry>,
}

impl TypeEntry {
    pub(crate) fn of<T: ComponentType>() -> Self {
        Self {
            type_name: T::TYPE_NAME,
            rust_name: type_name::<T>(),
            type_id: TypeId::of::<T>(),
        }
    }
}

impl TypeInfo {
    /// Records `T`. Returns `false` if it was already known.
    pub fn regist<T: ComponentType>(&mut self) -> bool {
        self.record(TypeEntry::of::<T>())
    }

    pub(crate) fn record(&mut self, entry: TypeEntry) -> bool {
        if self.types.contains_key(entry.type_name) {
            return false;
        }
        self.types.insert(entry.type_name, entry);
        true
    }

    /// Returns `true` if `T` has been recorded.
    #[must_use]
    pub fn contains<T: ComponentType>(&self) -> bool {
        self.types
            .get(T::TYPE_NAME)
            .is_some_and(|e| e.type_id == TypeId::of::<T>())
    }

    /// Looks up a type by name.
    #[must_use]
    pub fn get(&self, type_name: &str) -> Option<&TypeEntry> {
        self.types.get(type_name)
    }

    /// Known types in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeEntry> {
        self.types.values()
    }

    /// Number of known types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if no type is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Builds one concrete component type.
#[derive(Debug, Clone)]
pub struct Builder {
    type_name: &'static str,
    base_name: &'static str,
    library: String,
    build: fn() -> Box<dyn Component>,
}

fn make<T: ComponentType + Default>() -> Box<dyn Component> {
    Box::new(T::default())
}

impl Builder {
    /// Name of the type this builder produces.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Kind name of the base the builder is filed under.
    #[must_use]
    pub fn base_name(&self) -> &'static str {
        self.base_name
    }

    /// Library that registered the builder.
    #[must_use]
    pub fn library(&self) -> &str {
        &self.library
    }

    /// Allocates a new component in its default state.
    #[must_use]
    pub fn build(&self) -> Box<dyn Component> {
        (self.build)()
    }
}

/// Builders for one base kind.
#[derive(Debug, Clone)]
pub struct Factory {
    base_name: &'static str,
    builders: IndexMap<&'static str, Builder>,
}

impl Factory {
    /// Kind name of the base.
    #[must_use]
    pub fn base_name(&self) -> &'static str {
        self.base_name
    }

    /// Looks up a builder.
    #[must_use]
    pub fn builder(&self, type_name: &str) -> Option<&Builder> {
        self.builders.get(type_name)
    }

    /// Builders in registration order.
    pub fn builders(&self) -> impl Iterator<Item = &Builder> {
        self.builders.values()
    }
}

/// Where a type is in its registration life cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationState {
    /// Never seen.
    Unregistered,
    /// Known to [`TypeInfo`], not buildable by name.
    TypeRegistered,
    /// Buildable by name.
    BuilderRegistered,
}

/// All factories plus the type registry.
#[derive(Debug, Default)]
pub struct Factories {
    types: TypeInfo,
    factories: IndexMap<&'static str, Factory>,
}

impl Factories {
    /// Creates empty registries.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The type registry.
    #[must_use]
    pub fn types(&self) -> &TypeInfo {
        &self.types
    }

    /// Records `T` in the type registry.
    pub fn regist_type<T: ComponentType>(&mut self) -> bool {
        self.types.regist::<T>()
    }

    pub(crate) fn record_types(&mut self, entries: impl IntoIterator<Item = TypeEntry>) {
        for entry in entries {
            self.types.record(entry);
        }
    }

    /// Drops a builder whose registration could not be completed.
    pub(crate) fn unregist(&mut self, base: &str, type_name: &str) {
        let now_empty = match self.factories.get_mut(base) {
            Some(factory) => {
                factory.builders.shift_remove(type_name);
                factory.builders.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.factories.shift_remove(base);
        }
    }

    /// Registers a builder for `T` under base `B`.
    ///
    /// # Errors
    ///
    /// - [`CfError::ValueExists`] if `T` already has a builder under `B`
    /// - [`CfError::CastingFailed`] if a `T` is not a `B`
    pub fn regist<T, B>(&mut self, library: &str) -> CfResult<&Builder>
    where
        T: ComponentType + Default,
        B: ?Sized + Kind,
    {
        if !B::matches(&T::default()) {
            return Err(CfError::casting(format!(
                "{} cannot be built as {}",
                T::TYPE_NAME,
                B::kind_name()
            )));
        }

        let factory = self
            .factories
            .entry(B::kind_name())
            .or_insert_with(|| Factory {
                base_name: B::kind_name(),
                builders: IndexMap::new(),
            });
        if factory.builders.contains_key(T::TYPE_NAME) {
            return Err(CfError::ValueExists(format!(
                "builder {} in factory {}",
                T::TYPE_NAME,
                B::kind_name()
            )));
        }

        self.types.regist::<T>();
        tracing::debug!(
            type_name = T::TYPE_NAME,
            base = B::kind_name(),
            library,
            "builder registered"
        );
        let builder = factory
            .builders
            .entry(T::TYPE_NAME)
            .or_insert(Builder {
                type_name: T::TYPE_NAME,
                base_name: B::kind_name(),
                library: library.to_string(),
                build: make::<T>,
            });
        Ok(builder)
    }

    /// Looks up a builder, in the factory of `base` first and then in any
    /// factory.
    #[must_use]
    pub fn builder(&self, base: &str, type_name: &str) -> Option<&Builder> {
        self.factories
            .get(base)
            .and_then(|f| f.builder(type_name))
            .or_else(|| self.factories.values().find_map(|f| f.builder(type_name)))
    }

    /// Builds a component by type name and checks it is a `B`.
    ///
    /// # Errors
    ///
    /// - [`CfError::ValueNotFound`] if no builder is registered for the name
    /// - [`CfError::CastingFailed`] if the built component is not a `B`
    pub fn build<B: ?Sized + Kind>(&self, type_name: &str) -> CfResult<Box<dyn Component>> {
        let builder = self
            .builder(B::kind_name(), type_name)
            .ok_or_else(|| CfError::not_found(format!("no builder for type '{type_name}'")))?;
        let component = builder.build();
        if !B::matches(component.as_ref()) {
            return Err(CfError::casting(format!(
                "{type_name} is not a {}",
                B::kind_name()
            )));
        }
        Ok(component)
    }

    /// The factory of a base kind.
    #[must_use]
    pub fn factory(&self, base: &str) -> Option<&Factory> {
        self.factories.get(base)
    }

    /// Factories in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Factory> {
        self.factories.values()
    }

    /// Registration state of `T`.
    #[must_use]
    pub fn registration_state<T: ComponentType>(&self) -> RegistrationState {
        let has_builder = self
            .factories
            .values()
            .any(|f| f.builders.contains_key(T::TYPE_NAME));
        if has_builder {
            RegistrationState::BuilderRegistered
        } else if self.types.contains::<T>() {
            RegistrationState::TypeRegistered
        } else {
            RegistrationState::Unregistered
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Group, Link};

    #[test]
    fn state_machine_advances() {
        let mut factories = Factories::new();
        assert_eq!(
            factories.registration_state::<Group>(),
            RegistrationState::Unregistered
        );
        assert!(factories.regist_type::<Group>());
        assert!(!factories.regist_type::<Group>());
        assert_eq!(
            factories.registration_state::<Group>(),
            RegistrationState::TypeRegistered
        );
        factories
            .regist::<Group, dyn Component>("cf3.common")
            .expect("first registration should succeed");
        assert_eq!(
            factories.registration_state::<Group>(),
            RegistrationState::BuilderRegistered
        );
    }

    #[test]
    fn duplicate_builder_is_value_exists() {
        let mut factories = Factories::new();
        factories
            .regist::<Link, dyn Component>("cf3.common")
            .expect("first registration should succeed");
        assert!(matches!(
            factories.regist::<Link, dyn Component>("cf3.common"),
            Err(CfError::ValueExists(_))
        ));
    }

    #[test]
    fn base_must_match() {
        let mut factories = Factories::new();
        assert!(matches!(
            factories.regist::<Link, Group>("cf3.common"),
            Err(CfError::CastingFailed(_))
        ));
    }

    #[test]
    fn build_by_name() {
        let mut factories = Factories::new();
        let builder = factories
            .regist::<Group, Group>("cf3.common")
            .expect("registration should succeed");
        assert_eq!(builder.base_name(), "cf3.common.Group");
        assert_eq!(builder.library(), "cf3.common");

        let built = factories
            .build::<dyn Component>("cf3.common.Group")
            .expect("found through any factory");
        assert_eq!(built.type_name(), "cf3.common.Group");
        assert!(matches!(
            factories.build::<Link>("cf3.common.Group"),
            Err(CfError::CastingFailed(_))
        ));
        assert!(matches!(
            factories.build::<dyn Component>("cf3.nope"),
            Err(CfError::ValueNotFound(_))
        ));
        assert_eq!(factories.types().len(), 1);
    }
}
