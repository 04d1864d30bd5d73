//! The component trait and per-node declaration.
//!
//! A component is the payload of a tree node. The node itself owns the
//! generic parts every component has (name, children, options, properties,
//! signals, tags); the component value holds type-specific state.
//!
//! # Declaration
//!
//! When a component is added to the tree, [`Component::declare`] runs once
//! with a [`Declaration`] for the new node. This is where a component type
//! registers its options, signals and static children:
//!
//! ```
//! use cf_component::{Component, ComponentType, Declaration};
//! use cf_options::{linked, Linked};
//! use cf_types::CfResult;
//!
//! #[derive(Default)]
//! struct Solver {
//!     max_iteration: Linked<i64>,
//! }
//!
//! impl Component for Solver {
//!     fn type_name(&self) -> &'static str {
//!         Self::TYPE_NAME
//!     }
//!
//!     fn declare(&self, decl: &mut Declaration<'_>) -> CfResult<()> {
//!         decl.options()
//!             .add("max_iteration", 100i64)?
//!             .with_description("Iteration cap")
//!             .mark_basic()
//!             .link_to(&self.max_iteration)?;
//!         decl.add_tag("solver");
//!         Ok(())
//!     }
//! }
//!
//! impl ComponentType for Solver {
//!     const TYPE_NAME: &'static str = "cf3.solver.Solver";
//! }
//! ```

use crate::{Properties, SignalRegistry, TypeEntry};
use bitflags::bitflags;
use cf_options::OptionList;
use cf_types::CfResult;
use indexmap::IndexSet;
use std::any::Any;

/// The payload of a tree node.
///
/// `Any` is a supertrait so handles can downcast to concrete types.
pub trait Component: Any {
    /// Fully qualified type name, e.g. `"cf3.common.Group"`.
    fn type_name(&self) -> &'static str;

    /// Registers options, signals, tags and static children of a new node.
    ///
    /// # Errors
    ///
    /// Any error aborts the insertion; the node is not added.
    fn declare(&self, decl: &mut Declaration<'_>) -> CfResult<()> {
        let _ = decl;
        Ok(())
    }
}

/// A concrete component type with a static type name.
///
/// Required for typed handles, factory builders and type registration.
pub trait ComponentType: Component + Sized {
    /// Fully qualified type name. Must equal [`Component::type_name`].
    const TYPE_NAME: &'static str;
}

bitflags! {
    /// Capability tags of a node.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ComponentFlags: u8 {
        /// Shown in simplified views.
        const BASIC = 0b0000_0001;
        /// Structural part of its parent; cannot be removed, moved or renamed.
        const STATIC = 0b0000_0010;
    }
}

/// Node-level state shared by every component.
pub struct NodeData {
    pub(crate) properties: Properties,
    pub(crate) options: OptionList,
    pub(crate) signals: SignalRegistry,
    pub(crate) tags: IndexSet<String>,
    pub(crate) flags: ComponentFlags,
}

impl NodeData {
    pub(crate) fn new() -> Self {
        Self {
            properties: Properties::new(),
            options: OptionList::new(),
            signals: SignalRegistry::new(),
            tags: IndexSet::new(),
            flags: ComponentFlags::empty(),
        }
    }
}

/// A static child requested during declaration.
pub(crate) struct StaticChild {
    pub(crate) name: String,
    pub(crate) component: Box<dyn Component>,
    pub(crate) entry: TypeEntry,
}

/// Access to a node while its component declares itself.
pub struct Declaration<'a> {
    data: &'a mut NodeData,
    statics: Vec<StaticChild>,
}

impl<'a> Declaration<'a> {
    pub(crate) fn new(data: &'a mut NodeData) -> Self {
        Self {
            data,
            statics: Vec::new(),
        }
    }

    /// The node's options.
    pub fn options(&mut self) -> &mut OptionList {
        &mut self.data.options
    }

    /// The node's properties.
    pub fn properties(&mut self) -> &mut Properties {
        &mut self.data.properties
    }

    /// The node's signals.
    pub fn signals(&mut self) -> &mut SignalRegistry {
        &mut self.data.signals
    }

    /// Adds a classification tag.
    pub fn add_tag(&mut self, tag: impl Into<String>) -> &mut Self {
        self.data.tags.insert(tag.into());
        self
    }

    /// Marks the node basic.
    pub fn mark_basic(&mut self) -> &mut Self {
        self.data.flags |= ComponentFlags::BASIC;
        self
    }

    /// Requests a static child, created right after this node. Its type
    /// is recorded in the type registry of the context that inserts it.
    pub fn static_component<T: ComponentType>(
        &mut self,
        name: impl Into<String>,
        component: T,
    ) -> &mut Self {
        self.statics.push(StaticChild {
            name: name.into(),
            component: Box::new(component),
            entry: TypeEntry::of::<T>(),
        });
        self
    }

    pub(crate) fn into_statics(self) -> Vec<StaticChild> {
        self.statics
    }
}
