//! Non-owning, liveness-checked references into the component tree.
//!
//! The tree is an arena. A [`NodeId`] is a slot index plus the slot's
//! generation at the time the node was created. Removing a node bumps the
//! generation, so every outstanding id to it stops resolving:
//!
//! ```text
//! slot 7: gen 3, node "Belgium"      Handle { index: 7, gen: 3 }  → live
//! remove "Belgium"
//! slot 7: gen 4, empty               Handle { index: 7, gen: 3 }  → null
//! reuse for "Congo"
//! slot 7: gen 4, node "Congo"        Handle { index: 7, gen: 3 }  → still null
//! ```
//!
//! # Typed Handles
//!
//! [`Handle<T>`] records the component kind it was cast to. Upcasting to
//! [`AnyHandle`] always succeeds; downcasting goes through
//! [`ComponentTree::cast`](crate::ComponentTree::cast) and yields a null
//! handle on a type mismatch.
//!
//! [`ConstHandle<T>`] grants read access only. It is created from a
//! `Handle<T>`; the reverse conversion does not exist. Navigation keeps the
//! access of the handle it starts from, so a component reached from a
//! `ConstHandle` is again a `ConstHandle`:
//!
//! ```compile_fail
//! use cf_component::{ComponentTree, Group, Handle};
//!
//! let mut tree = ComponentTree::new();
//! let root = tree.root();
//! let world = tree.create_component::<Group>(root, "World").unwrap();
//! let parent = tree.parent(world.as_const());
//! let writable: Handle<Group> = tree.cast(parent);
//! ```

use crate::{Component, ComponentType};
use std::any::Any;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Stable identity of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl NodeId {
    /// Returns the arena slot index.
    #[must_use]
    pub fn index(self) -> u32 {
        self.index
    }

    /// Returns the slot generation this id was issued for.
    #[must_use]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// A component kind a handle can refer to.
///
/// Implemented for `dyn Component` (matches everything) and for every
/// [`ComponentType`]. Plugins may implement it for their own trait objects
/// to use them as factory bases.
pub trait Kind: 'static {
    /// Name of the kind, used as factory base name.
    fn kind_name() -> &'static str;

    /// Views a component as this kind.
    fn downcast_ref(component: &dyn Component) -> Option<&Self>;

    /// Views a component mutably as this kind.
    fn downcast_mut(component: &mut dyn Component) -> Option<&mut Self>;

    /// Returns `true` if the component is of this kind.
    fn matches(component: &dyn Component) -> bool {
        Self::downcast_ref(component).is_some()
    }
}

impl Kind for dyn Component {
    fn kind_name() -> &'static str {
        "cf3.common.Component"
    }

    fn downcast_ref(component: &dyn Component) -> Option<&Self> {
        Some(component)
    }

    fn downcast_mut(component: &mut dyn Component) -> Option<&mut Self> {
        Some(component)
    }

    fn matches(_: &dyn Component) -> bool {
        true
    }
}

impl<T: ComponentType> Kind for T {
    fn kind_name() -> &'static str {
        T::TYPE_NAME
    }

    fn downcast_ref(component: &dyn Component) -> Option<&Self> {
        (component as &dyn Any).downcast_ref::<T>()
    }

    fn downcast_mut(component: &mut dyn Component) -> Option<&mut Self> {
        (component as &mut dyn Any).downcast_mut::<T>()
    }
}

pub(crate) mod sealed {
    use super::NodeId;

    /// Handle construction, out of reach outside this crate.
    pub trait Sealed {
        fn from_node(id: Option<NodeId>) -> Self;
    }
}

/// Read access to the node a handle refers to.
///
/// Implemented by [`Handle`] and [`ConstHandle`] only; tree accessors that
/// only read accept either.
pub trait AsHandle: sealed::Sealed + Copy + 'static {
    /// The kind the handle was cast to.
    type Target: ?Sized + Kind;

    /// A handle of kind `U` with the same access as this one.
    type Of<U: ?Sized + Kind>: AsHandle<Target = U>;

    /// Returns the node id, or `None` for a null handle.
    fn node_id(&self) -> Option<NodeId>;
}

/// The untyped handle navigation yields when it starts from `H`.
pub type ErasedOf<H> = <H as AsHandle>::Of<dyn Component>;

/// Builds a handle of kind `U` with the access of `H`.
pub(crate) fn rebind<H: AsHandle, U: ?Sized + Kind>(id: Option<NodeId>) -> H::Of<U> {
    <H::Of<U> as sealed::Sealed>::from_node(id)
}

/// Handles that grant write access. Implemented by [`Handle`] only.
pub trait HandleMut: AsHandle {}

/// A non-owning reference to a component of kind `T`.
pub struct Handle<T: ?Sized + Kind = dyn Component> {
    id: Option<NodeId>,
    _kind: PhantomData<fn() -> *const T>,
}

/// A handle to a component of any kind.
pub type AnyHandle = Handle<dyn Component>;

impl<T: ?Sized + Kind> Handle<T> {
    /// The null handle.
    #[must_use]
    pub const fn null() -> Self {
        Self {
            id: None,
            _kind: PhantomData,
        }
    }

    pub(crate) fn from_id(id: NodeId) -> Self {
        Self {
            id: Some(id),
            _kind: PhantomData,
        }
    }

    /// Returns the node id, or `None` for a null handle.
    ///
    /// A `Some` id may still be stale; liveness is checked by the tree.
    #[must_use]
    pub fn id(&self) -> Option<NodeId> {
        self.id
    }

    /// Returns `true` if the handle was never bound.
    ///
    /// Use [`ComponentTree::is_null`](crate::ComponentTree::is_null) to
    /// also detect destroyed targets.
    #[must_use]
    pub fn is_unbound(&self) -> bool {
        self.id.is_none()
    }

    /// Forgets the kind. Always succeeds.
    #[must_use]
    pub fn erase(self) -> AnyHandle {
        Handle {
            id: self.id,
            _kind: PhantomData,
        }
    }

    /// Returns a read-only handle to the same component.
    #[must_use]
    pub fn as_const(self) -> ConstHandle<T> {
        ConstHandle::from(self)
    }

    pub(crate) fn retag<U: ?Sized + Kind>(self) -> Handle<U> {
        Handle {
            id: self.id,
            _kind: PhantomData,
        }
    }
}

impl<T: ?Sized + Kind> sealed::Sealed for Handle<T> {
    fn from_node(id: Option<NodeId>) -> Self {
        Self {
            id,
            _kind: PhantomData,
        }
    }
}

impl<T: ?Sized + Kind> AsHandle for Handle<T> {
    type Target = T;
    type Of<U: ?Sized + Kind> = Handle<U>;

    fn node_id(&self) -> Option<NodeId> {
        self.id
    }
}

impl<T: ?Sized + Kind> HandleMut for Handle<T> {}

impl<T: ?Sized + Kind> Default for Handle<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T: ?Sized + Kind> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized + Kind> Copy for Handle<T> {}

impl<T: ?Sized + Kind, U: ?Sized + Kind> PartialEq<Handle<U>> for Handle<T> {
    fn eq(&self, other: &Handle<U>) -> bool {
        self.id == other.id
    }
}

impl<T: ?Sized + Kind> Eq for Handle<T> {}

impl<T: ?Sized + Kind> PartialOrd for Handle<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: ?Sized + Kind> Ord for Handle<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl<T: ?Sized + Kind> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T: ?Sized + Kind> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "Handle<{}>({id})", T::kind_name()),
            None => write!(f, "Handle<{}>(null)", T::kind_name()),
        }
    }
}

/// A read-only handle.
pub struct ConstHandle<T: ?Sized + Kind = dyn Component> {
    id: Option<NodeId>,
    _kind: PhantomData<fn() -> *const T>,
}

impl<T: ?Sized + Kind> ConstHandle<T> {
    /// The null handle.
    #[must_use]
    pub const fn null() -> Self {
        Self {
            id: None,
            _kind: PhantomData,
        }
    }

    /// Returns the node id, or `None` for a null handle.
    #[must_use]
    pub fn id(&self) -> Option<NodeId> {
        self.id
    }

    /// Returns `true` if the handle was never bound.
    #[must_use]
    pub fn is_unbound(&self) -> bool {
        self.id.is_none()
    }

    /// Forgets the kind. Always succeeds and stays read-only.
    #[must_use]
    pub fn erase(self) -> ConstHandle {
        ConstHandle {
            id: self.id,
            _kind: PhantomData,
        }
    }
}

impl<T: ?Sized + Kind> Default for ConstHandle<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T: ?Sized + Kind> From<Handle<T>> for ConstHandle<T> {
    fn from(handle: Handle<T>) -> Self {
        Self {
            id: handle.id,
            _kind: PhantomData,
        }
    }
}

impl<T: ?Sized + Kind> sealed::Sealed for ConstHandle<T> {
    fn from_node(id: Option<NodeId>) -> Self {
        Self {
            id,
            _kind: PhantomData,
        }
    }
}

impl<T: ?Sized + Kind> AsHandle for ConstHandle<T> {
    type Target = T;
    type Of<U: ?Sized + Kind> = ConstHandle<U>;

    fn node_id(&self) -> Option<NodeId> {
        self.id
    }
}

impl<T: ?Sized + Kind> Clone for ConstHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized + Kind> Copy for ConstHandle<T> {}

impl<T: ?Sized + Kind, U: ?Sized + Kind> PartialEq<ConstHandle<U>> for ConstHandle<T> {
    fn eq(&self, other: &ConstHandle<U>) -> bool {
        self.id == other.id
    }
}

impl<T: ?Sized + Kind> Eq for ConstHandle<T> {}

impl<T: ?Sized + Kind> fmt::Debug for ConstHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "ConstHandle<{}>({id})", T::kind_name()),
            None => write!(f, "ConstHandle<{}>(null)", T::kind_name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Group;

    #[test]
    fn null_handles_compare_equal() {
        let a: AnyHandle = Handle::null();
        let b: Handle<Group> = Handle::default();
        assert_eq!(a, b);
        assert!(a.is_unbound());
    }

    #[test]
    fn erase_keeps_identity() {
        let id = NodeId {
            index: 3,
            generation: 1,
        };
        let typed: Handle<Group> = Handle::from_id(id);
        assert_eq!(typed.erase(), typed);
        assert_eq!(typed.erase().id(), Some(id));
        assert_eq!(typed.as_const().id(), Some(id));
    }

    #[test]
    fn debug_names_the_kind() {
        let h: Handle<Group> = Handle::null();
        assert_eq!(format!("{h:?}"), "Handle<cf3.common.Group>(null)");
        let any: AnyHandle = Handle::from_id(NodeId {
            index: 1,
            generation: 0,
        });
        assert_eq!(format!("{any:?}"), "Handle<cf3.common.Component>(#1v0)");
    }

    #[test]
    fn kind_matching() {
        let group = Group;
        let component: &dyn Component = &group;
        assert!(<dyn Component as Kind>::matches(component));
        assert!(<Group as Kind>::matches(component));
        assert!(!<crate::Link as Kind>::matches(component));
    }
}
