//! The arena-backed component tree.
//!
//! Every node lives in one slot of [`ComponentTree`]. A parent owns its
//! children in the sense that a child is reachable only through its
//! parent's child map, and removing the parent frees the whole subtree.
//! Everything else holds [`Handle`]s, which stop resolving once their node
//! is freed.
//!
//! # Structure
//!
//! ```text
//! cpath:/                      root (static, unnamed)
//! ├── Libraries                static group
//! ├── Factories                static group
//! └── World
//!     ├── Europe
//!     │   └── Belgium
//!     └── Africa
//! ```
//!
//! Child order is insertion order and survives renames.
//!
//! # Detaching
//!
//! [`detach_component`](ComponentTree::detach_component) unlinks a subtree
//! without freeing it and returns a [`Detached`] ticket. Handles into the
//! subtree stay valid. The ticket is consumed by
//! [`attach_component`](ComponentTree::attach_component) or
//! [`destroy`](ComponentTree::destroy). `move_to` is detach + attach.

use crate::component::{NodeData, StaticChild};
use crate::{
    AnyHandle, AsHandle, Component, ComponentFlags, ComponentType, ConstHandle, Declaration,
    ErasedOf, Group, Handle, HandleMut, Kind, NodeId, Properties, Root, SignalRegistry, TypeEntry,
};
use crate::handle::rebind;
use cf_options::OptionList;
use cf_types::{CfError, CfResult, Scheme, Uri};
use indexmap::IndexMap;
use std::fmt;
use std::ops::{Index, IndexMut};

pub(crate) struct Node {
    pub(crate) name: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: IndexMap<String, NodeId>,
    pub(crate) component: Box<dyn Component>,
    pub(crate) data: NodeData,
}

struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// A subtree unlinked from the tree but still alive.
///
/// Until attached or destroyed, the subtree stays in the arena.
#[must_use = "a detached subtree must be attached or destroyed"]
#[derive(Debug, PartialEq, Eq)]
pub struct Detached {
    id: NodeId,
}

impl Detached {
    /// Handle to the top of the detached subtree.
    #[must_use]
    pub fn handle(&self) -> AnyHandle {
        Handle::from_id(self.id)
    }
}

/// A failed attach. The ticket is handed back so the subtree is not lost.
#[derive(Debug)]
pub struct AttachError {
    /// Why the attach failed.
    pub error: CfError,
    /// The subtree, still detached.
    pub detached: Detached,
}

impl fmt::Display for AttachError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.error.fmt(f)
    }
}

impl std::error::Error for AttachError {}

impl From<AttachError> for CfError {
    fn from(e: AttachError) -> Self {
        e.error
    }
}

/// Checks that a component name can be used as a path segment.
///
/// # Errors
///
/// [`CfError::BadValue`] for empty names, `.` and `..`, and names with
/// `/`, `:`, whitespace or control characters.
pub fn validate_name(name: &str) -> CfResult<()> {
    let bad_char = |c: char| c == '/' || c == ':' || c.is_whitespace() || c.is_control();
    if name.is_empty() || name == "." || name == ".." || name.chars().any(bad_char) {
        return Err(CfError::bad_value(format!(
            "invalid component name '{}'",
            name.escape_debug()
        )));
    }
    Ok(())
}

/// The component tree.
pub struct ComponentTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
    live: usize,
    declared: Vec<TypeEntry>,
}

impl ComponentTree {
    /// Creates a tree holding only the root (`cpath:/`).
    #[must_use]
    pub fn new() -> Self {
        let mut data = NodeData::new();
        data.flags = ComponentFlags::STATIC;
        let root = Node {
            name: String::new(),
            parent: None,
            children: IndexMap::new(),
            component: Box::new(Root),
            data,
        };
        Self {
            slots: vec![Slot {
                generation: 0,
                node: Some(root),
            }],
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
            live: 1,
            declared: Vec::new(),
        }
    }

    /// Creates a tree whose root has one static [`Group`] per name.
    ///
    /// The groups are placed directly in fresh slots. `Group` declares
    /// nothing, so this cannot fail. Names must be distinct and valid.
    pub(crate) fn with_static_groups<const N: usize>(
        names: [&'static str; N],
    ) -> (Self, [Handle<Group>; N]) {
        let mut tree = Self::new();
        let root = tree.root;
        let handles = names.map(|name| {
            let mut data = NodeData::new();
            data.flags = ComponentFlags::STATIC;
            let id = NodeId {
                index: tree.slots.len() as u32,
                generation: 0,
            };
            tree.slots.push(Slot {
                generation: 0,
                node: Some(Node {
                    name: name.to_string(),
                    parent: Some(root),
                    children: IndexMap::new(),
                    component: Box::new(Group),
                    data,
                }),
            });
            tree.live += 1;
            if let Some(root_node) = tree.node_mut(root) {
                root_node.children.insert(name.to_string(), id);
            }
            Handle::from_id(id)
        });
        (tree, handles)
    }

    /// The root handle.
    #[must_use]
    pub fn root(&self) -> AnyHandle {
        Handle::from_id(self.root)
    }

    /// Number of live nodes, detached subtrees included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live
    }

    /// Always `false`: the root cannot be removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    // ── Node access ──────────────────────────────────────────

    pub(crate) fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    /// Resolves a handle to a live node id.
    pub(crate) fn require(&self, handle: impl AsHandle) -> CfResult<NodeId> {
        let id = handle
            .node_id()
            .ok_or_else(|| CfError::not_found("null component handle"))?;
        if self.node(id).is_some() {
            Ok(id)
        } else {
            Err(CfError::not_found(format!("component {id} no longer exists")))
        }
    }

    fn live_node(&self, handle: impl AsHandle) -> CfResult<&Node> {
        let id = self.require(handle)?;
        self.node(id)
            .ok_or_else(|| CfError::not_found(format!("component {id} no longer exists")))
    }

    fn live_node_mut(&mut self, handle: impl AsHandle) -> CfResult<&mut Node> {
        let id = self.require(handle)?;
        self.node_mut(id)
            .ok_or_else(|| CfError::not_found(format!("component {id} no longer exists")))
    }

    /// Returns `true` if the handle is unbound or its node was destroyed.
    #[must_use]
    pub fn is_null(&self, handle: impl AsHandle) -> bool {
        handle.node_id().and_then(|id| self.node(id)).is_none()
    }

    /// Returns `true` if the handle refers to a live node.
    #[must_use]
    pub fn is_not_null(&self, handle: impl AsHandle) -> bool {
        !self.is_null(handle)
    }

    // ── Construction ─────────────────────────────────────────

    fn alloc(&mut self, node: Node) -> CfResult<NodeId> {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return Ok(NodeId {
                index,
                generation: slot.generation,
            });
        }
        let index = u32::try_from(self.slots.len())
            .map_err(|_| CfError::SetupError("component arena is full".into()))?;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        Ok(NodeId {
            index,
            generation: 0,
        })
    }

    fn unique_child_name(&self, parent: NodeId, base: &str) -> String {
        let Some(node) = self.node(parent) else {
            return base.to_string();
        };
        if !node.children.contains_key(base) {
            return base.to_string();
        }
        let mut suffix = 1usize;
        loop {
            let candidate = format!("{base}_{suffix}");
            if !node.children.contains_key(&candidate) {
                return candidate;
            }
            suffix += 1;
        }
    }

    /// Adds an owned component as a child of `parent`.
    ///
    /// A name already taken by a sibling gets a numeric suffix (`c1` →
    /// `c1_1`). [`Component::declare`] runs before insertion.
    ///
    /// # Errors
    ///
    /// - [`CfError::BadValue`] for an invalid name
    /// - [`CfError::ValueNotFound`] if `parent` is null
    /// - any error raised by `declare`
    pub fn add_component(
        &mut self,
        parent: impl HandleMut,
        component: Box<dyn Component>,
        name: &str,
    ) -> CfResult<AnyHandle> {
        let parent = self.require(parent)?;
        self.insert(parent, component, name, ComponentFlags::empty())
    }

    /// Like [`add_component`](Self::add_component), marking the child static.
    ///
    /// # Errors
    ///
    /// Same as [`add_component`](Self::add_component).
    pub fn add_static_component(
        &mut self,
        parent: impl HandleMut,
        component: Box<dyn Component>,
        name: &str,
    ) -> CfResult<AnyHandle> {
        let parent = self.require(parent)?;
        self.insert(parent, component, name, ComponentFlags::STATIC)
    }

    /// Creates a `T` with its default state under `parent`.
    ///
    /// # Errors
    ///
    /// Same as [`add_component`](Self::add_component).
    pub fn create_component<T: ComponentType + Default>(
        &mut self,
        parent: impl HandleMut,
        name: &str,
    ) -> CfResult<Handle<T>> {
        self.add_component(parent, Box::new(T::default()), name)
            .map(Handle::retag)
    }

    /// Creates a static `T` under `parent`.
    ///
    /// # Errors
    ///
    /// Same as [`add_component`](Self::add_component).
    pub fn create_static_component<T: ComponentType + Default>(
        &mut self,
        parent: impl HandleMut,
        name: &str,
    ) -> CfResult<Handle<T>> {
        self.add_static_component(parent, Box::new(T::default()), name)
            .map(Handle::retag)
    }

    fn insert(
        &mut self,
        parent: NodeId,
        component: Box<dyn Component>,
        name: &str,
        flags: ComponentFlags,
    ) -> CfResult<AnyHandle> {
        validate_name(name)?;

        let mut data = NodeData::new();
        data.flags |= flags;
        let mut decl = Declaration::new(&mut data);
        component.declare(&mut decl)?;
        let statics = decl.into_statics();

        let unique = self.unique_child_name(parent, name);
        let type_name = component.type_name();
        let id = self.alloc(Node {
            name: unique.clone(),
            parent: Some(parent),
            children: IndexMap::new(),
            component,
            data,
        })?;
        if let Some(parent_node) = self.node_mut(parent) {
            parent_node.children.insert(unique.clone(), id);
        }
        tracing::debug!(
            parent = %parent,
            name = %unique,
            type_name,
            "component added"
        );

        for StaticChild {
            name: child_name,
            component: child,
            entry,
        } in statics
        {
            if let Err(e) = self.insert(id, child, &child_name, ComponentFlags::STATIC) {
                self.unlink(id);
                self.free_subtree(id);
                return Err(e);
            }
            self.declared.push(entry);
        }

        Ok(Handle::from_id(id))
    }

    /// Types of static children inserted since the last call.
    pub(crate) fn take_declared_types(&mut self) -> Vec<TypeEntry> {
        std::mem::take(&mut self.declared)
    }

    // ── Removal and re-parenting ─────────────────────────────

    fn check_mutable(&self, id: NodeId, action: &str) -> CfResult<()> {
        if id == self.root {
            return Err(CfError::NotSupported(format!("cannot {action} the root")));
        }
        let is_static = self
            .node(id)
            .is_some_and(|n| n.data.flags.contains(ComponentFlags::STATIC));
        if is_static {
            return Err(CfError::NotSupported(format!(
                "cannot {action} static component '{}'",
                self.uri_of(id)
            )));
        }
        Ok(())
    }

    fn unlink(&mut self, id: NodeId) {
        let Some((parent, name)) = self
            .node(id)
            .and_then(|n| n.parent.map(|p| (p, n.name.clone())))
        else {
            return;
        };
        if let Some(parent_node) = self.node_mut(parent) {
            parent_node.children.shift_remove(&name);
        }
        if let Some(node) = self.node_mut(id) {
            node.parent = None;
        }
    }

    fn free_subtree(&mut self, id: NodeId) -> usize {
        let mut stack = vec![id];
        let mut freed = 0;
        while let Some(current) = stack.pop() {
            let Some(slot) = self.slots.get_mut(current.index as usize) else {
                continue;
            };
            if slot.generation != current.generation {
                continue;
            }
            if let Some(node) = slot.node.take() {
                stack.extend(node.children.values().copied());
                // A slot whose generation is exhausted is retired, never reused.
                if let Some(next) = slot.generation.checked_add(1) {
                    slot.generation = next;
                    self.free.push(current.index);
                }
                self.live -= 1;
                freed += 1;
            }
        }
        freed
    }

    /// Removes a component and destroys its subtree.
    ///
    /// Every handle into the subtree becomes null.
    ///
    /// # Errors
    ///
    /// - [`CfError::ValueNotFound`] if the handle is null
    /// - [`CfError::NotSupported`] for the root and static components
    pub fn remove_component(&mut self, handle: impl HandleMut) -> CfResult<()> {
        let id = self.require(handle)?;
        self.check_mutable(id, "remove")?;
        let uri = self.uri_of(id);
        self.unlink(id);
        let freed = self.free_subtree(id);
        tracing::debug!(uri = %uri, freed, "component removed");
        Ok(())
    }

    /// Removes the child `name` of `parent`.
    ///
    /// # Errors
    ///
    /// [`CfError::ValueNotFound`] if there is no such child, otherwise as
    /// [`remove_component`](Self::remove_component).
    pub fn remove_child(&mut self, parent: impl HandleMut, name: &str) -> CfResult<()> {
        let parent = self.require(parent)?;
        let child = self.node(parent).and_then(|n| n.children.get(name).copied());
        match child {
            Some(id) => self.remove_component(AnyHandle::from_id(id)),
            None => Err(CfError::not_found(format!(
                "no component '{name}' under '{}'",
                self.uri_of(parent)
            ))),
        }
    }

    /// Destroys everything below the root, static components included.
    ///
    /// Every handle except the root's becomes null. Detached subtrees are
    /// not reachable from the root and stay alive. Returns the number of
    /// destroyed nodes.
    pub fn clear(&mut self) -> usize {
        let root = self.root;
        let children: Vec<NodeId> = self
            .node(root)
            .map(|n| n.children.values().copied().collect())
            .unwrap_or_default();
        let freed = children.into_iter().map(|id| self.free_subtree(id)).sum();
        if let Some(root_node) = self.node_mut(root) {
            root_node.children.clear();
        }
        tracing::debug!(freed, "tree cleared");
        freed
    }

    /// Destroys a subtree whatever its flags. Undoes partial registrations.
    pub(crate) fn release(&mut self, handle: impl AsHandle) -> usize {
        match self.require(handle) {
            Ok(id) if id != self.root => {
                self.unlink(id);
                self.free_subtree(id)
            }
            _ => 0,
        }
    }

    /// Unlinks a subtree without destroying it.
    ///
    /// # Errors
    ///
    /// Same as [`remove_component`](Self::remove_component).
    pub fn detach_component(&mut self, handle: impl HandleMut) -> CfResult<Detached> {
        let id = self.require(handle)?;
        self.check_mutable(id, "detach")?;
        tracing::debug!(uri = %self.uri_of(id), "component detached");
        self.unlink(id);
        Ok(Detached { id })
    }

    /// Attaches a detached subtree under `parent`, renaming it to `name`
    /// if given. Collisions get a numeric suffix.
    ///
    /// # Errors
    ///
    /// The ticket is returned inside [`AttachError`] when `parent` is null,
    /// `name` is invalid, or `parent` lies inside the detached subtree.
    pub fn attach_component(
        &mut self,
        parent: impl HandleMut,
        detached: Detached,
        name: Option<&str>,
    ) -> Result<AnyHandle, AttachError> {
        match self.check_attach(parent, &detached, name) {
            Ok(parent) => Ok(self.link(parent, detached.id, name)),
            Err(error) => Err(AttachError { error, detached }),
        }
    }

    fn check_attach(
        &self,
        parent: impl AsHandle,
        detached: &Detached,
        name: Option<&str>,
    ) -> CfResult<NodeId> {
        let parent = self.require(parent)?;
        if let Some(name) = name {
            validate_name(name)?;
        }
        if self.node(detached.id).is_none() {
            return Err(CfError::not_found("detached subtree no longer exists"));
        }
        if self.is_within(parent, detached.id) {
            return Err(CfError::bad_value(
                "cannot attach a subtree below one of its own components",
            ));
        }
        Ok(parent)
    }

    fn link(&mut self, parent: NodeId, id: NodeId, name: Option<&str>) -> AnyHandle {
        let base = match name {
            Some(name) => name.to_string(),
            None => self.node(id).map(|n| n.name.clone()).unwrap_or_default(),
        };
        let unique = self.unique_child_name(parent, &base);
        if let Some(node) = self.node_mut(id) {
            node.name = unique.clone();
            node.parent = Some(parent);
        }
        if let Some(parent_node) = self.node_mut(parent) {
            parent_node.children.insert(unique, id);
        }
        tracing::debug!(uri = %self.uri_of(id), "component attached");
        Handle::from_id(id)
    }

    /// Destroys a detached subtree.
    pub fn destroy(&mut self, detached: Detached) -> usize {
        self.free_subtree(detached.id)
    }

    /// Returns `true` if `id` is `ancestor` or lies below it.
    fn is_within(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self.node(c).and_then(|n| n.parent);
        }
        false
    }

    /// Moves a component under a new parent. Handles into the moved subtree
    /// stay valid; URIs of the whole subtree change.
    ///
    /// # Errors
    ///
    /// - [`CfError::ValueNotFound`] if either handle is null
    /// - [`CfError::NotSupported`] for the root and static components
    /// - [`CfError::BadValue`] when moving a component into its own subtree
    pub fn move_to(&mut self, handle: impl HandleMut, new_parent: impl HandleMut) -> CfResult<()> {
        let id = self.require(handle)?;
        let parent = self.require(new_parent)?;
        self.check_mutable(id, "move")?;
        if self.is_within(parent, id) {
            return Err(CfError::bad_value(format!(
                "cannot move '{}' into its own subtree",
                self.uri_of(id)
            )));
        }
        if self.node(id).and_then(|n| n.parent) == Some(parent) {
            return Ok(());
        }
        self.unlink(id);
        self.link(parent, id, None);
        Ok(())
    }

    /// Renames a component, keeping its position among its siblings.
    ///
    /// Returns the name actually given, which carries a numeric suffix if a
    /// sibling already uses `new_name`.
    ///
    /// # Errors
    ///
    /// - [`CfError::BadValue`] for an invalid name
    /// - [`CfError::NotSupported`] for the root and static components
    pub fn rename_component(&mut self, handle: impl HandleMut, new_name: &str) -> CfResult<String> {
        validate_name(new_name)?;
        let id = self.require(handle)?;
        self.check_mutable(id, "rename")?;

        let (old_name, parent) = match self.node(id) {
            Some(node) => (node.name.clone(), node.parent),
            None => return Err(CfError::not_found(format!("component {id} no longer exists"))),
        };
        if old_name == new_name {
            return Ok(old_name);
        }

        let unique = match parent {
            Some(parent) => {
                let index = self
                    .node_mut(parent)
                    .and_then(|p| p.children.shift_remove_full(&old_name))
                    .map(|(index, _, _)| index);
                let unique = self.unique_child_name(parent, new_name);
                if let (Some(parent_node), Some(index)) = (self.node_mut(parent), index) {
                    parent_node.children.shift_insert(index, unique.clone(), id);
                }
                unique
            }
            None => new_name.to_string(),
        };

        if let Some(node) = self.node_mut(id) {
            node.name = unique.clone();
        }
        tracing::debug!(from = %old_name, to = %unique, "component renamed");
        Ok(unique)
    }

    // ── Navigation ───────────────────────────────────────────

    pub(crate) fn uri_of(&self, id: NodeId) -> Uri {
        let mut names = Vec::new();
        let mut current = id;
        while let Some(node) = self.node(current) {
            match node.parent {
                Some(parent) => {
                    names.push(node.name.as_str());
                    current = parent;
                }
                None => {
                    if current != self.root {
                        names.push(node.name.as_str());
                    }
                    break;
                }
            }
        }
        names.reverse();
        Uri::cpath(&format!("/{}", names.join("/")))
    }

    /// The absolute `cpath:` URI of a component.
    ///
    /// A detached subtree reports paths starting at its detached top.
    ///
    /// # Errors
    ///
    /// [`CfError::ValueNotFound`] if the handle is null.
    pub fn uri(&self, handle: impl AsHandle) -> CfResult<Uri> {
        let id = self.require(handle)?;
        Ok(self.uri_of(id))
    }

    /// The name of a component.
    #[must_use]
    pub fn name(&self, handle: impl AsHandle) -> Option<&str> {
        self.live_node(handle).ok().map(|n| n.name.as_str())
    }

    /// The dynamic type name of a component.
    #[must_use]
    pub fn type_name(&self, handle: impl AsHandle) -> Option<&'static str> {
        self.live_node(handle).ok().map(|n| n.component.type_name())
    }

    /// The parent, or a null handle for the root and detached tops.
    ///
    /// Navigation keeps the access of `handle`: a [`ConstHandle`] yields a
    /// `ConstHandle`.
    #[must_use]
    pub fn parent<H: AsHandle>(&self, handle: H) -> ErasedOf<H> {
        let parent = self.live_node(handle).ok().and_then(|n| n.parent);
        rebind::<H, dyn Component>(parent)
    }

    /// Direct child lookup. Returns a null handle if absent.
    #[must_use]
    pub fn get_child<H: AsHandle>(&self, handle: H, name: &str) -> ErasedOf<H> {
        let child = self
            .live_node(handle)
            .ok()
            .and_then(|n| n.children.get(name).copied());
        rebind::<H, dyn Component>(child)
    }

    /// Direct children in insertion order.
    pub fn children<H: AsHandle>(&self, handle: H) -> impl Iterator<Item = ErasedOf<H>> + '_ {
        self.live_node(handle)
            .ok()
            .into_iter()
            .flat_map(|n| n.children.values().map(|&id| rebind::<H, dyn Component>(Some(id))))
    }

    /// Number of direct children.
    #[must_use]
    pub fn child_count(&self, handle: impl AsHandle) -> usize {
        self.live_node(handle).map_or(0, |n| n.children.len())
    }

    /// Resolves a `cpath` URI. Relative URIs start at `from`; `..` at the
    /// root stays at the root.
    ///
    /// # Errors
    ///
    /// - [`CfError::ProtocolError`] for non-`cpath` URIs
    /// - [`CfError::ValueNotFound`] if a segment does not resolve
    pub fn access_component<H: AsHandle>(&self, from: H, uri: &Uri) -> CfResult<ErasedOf<H>> {
        uri.check_scheme(&[Scheme::Cpath])?;
        let mut current = if uri.is_absolute() {
            self.root
        } else {
            self.require(from)?
        };

        for segment in uri.segments() {
            let node = self
                .node(current)
                .ok_or_else(|| CfError::not_found(format!("while resolving '{uri}'")))?;
            current = match segment {
                "." => current,
                ".." => node.parent.unwrap_or(current),
                name => node.children.get(name).copied().ok_or_else(|| {
                    CfError::not_found(format!(
                        "no component '{name}' under '{}' while resolving '{uri}'",
                        self.uri_of(current)
                    ))
                })?,
            };
        }

        Ok(rebind::<H, dyn Component>(Some(current)))
    }

    /// Parses `path` and resolves it with
    /// [`access_component`](Self::access_component).
    ///
    /// # Errors
    ///
    /// Parse errors, then as `access_component`.
    pub fn resolve<H: AsHandle>(&self, from: H, path: &str) -> CfResult<ErasedOf<H>> {
        self.access_component(from, &Uri::parse(path)?)
    }

    // ── Typed access ─────────────────────────────────────────

    /// Re-types a handle. Returns a null handle on a kind mismatch.
    ///
    /// Only writable handles can be re-typed into writable handles; use
    /// [`cast_const`](Self::cast_const) for a [`ConstHandle`].
    #[must_use]
    pub fn cast<T: ?Sized + Kind>(&self, handle: impl HandleMut) -> Handle<T> {
        match self.live_node(handle) {
            Ok(node) if T::matches(node.component.as_ref()) => {
                handle.node_id().map_or_else(Handle::null, Handle::from_id)
            }
            _ => Handle::null(),
        }
    }

    /// Read-only [`cast`](Self::cast).
    #[must_use]
    pub fn cast_const<T: ?Sized + Kind>(&self, handle: impl AsHandle) -> ConstHandle<T> {
        match self.live_node(handle) {
            Ok(node) if T::matches(node.component.as_ref()) => {
                rebind::<ConstHandle, T>(handle.node_id())
            }
            _ => ConstHandle::null(),
        }
    }

    /// Re-types a handle.
    ///
    /// # Errors
    ///
    /// [`CfError::ValueNotFound`] if null, [`CfError::CastingFailed`] on a
    /// kind mismatch.
    pub fn try_cast<T: ?Sized + Kind>(&self, handle: impl HandleMut) -> CfResult<Handle<T>> {
        let id = self.require(handle)?;
        let typed = self.cast::<T>(handle);
        if typed.is_unbound() {
            return Err(self.mismatch::<T>(id));
        }
        Ok(typed)
    }

    fn mismatch<T: ?Sized + Kind>(&self, id: NodeId) -> CfError {
        let type_name = self.node(id).map_or("?", |n| n.component.type_name());
        CfError::casting(format!(
            "component '{}' of type {type_name} is not a {}",
            self.uri_of(id),
            T::kind_name()
        ))
    }

    /// Borrows the component a handle refers to.
    #[must_use]
    pub fn get<H: AsHandle>(&self, handle: H) -> Option<&H::Target> {
        let node = self.live_node(handle).ok()?;
        <H::Target as Kind>::downcast_ref(node.component.as_ref())
    }

    /// Mutably borrows the component a handle refers to.
    pub fn get_mut<T: ?Sized + Kind>(&mut self, handle: Handle<T>) -> Option<&mut T> {
        let node = self.live_node_mut(handle).ok()?;
        T::downcast_mut(node.component.as_mut())
    }

    /// The component as its dynamic trait object.
    #[must_use]
    pub fn component(&self, handle: impl AsHandle) -> Option<&dyn Component> {
        self.live_node(handle).ok().map(|n| n.component.as_ref())
    }

    /// Borrows a component as `T`.
    ///
    /// # Errors
    ///
    /// [`CfError::ValueNotFound`] if null, [`CfError::CastingFailed`] on a
    /// kind mismatch.
    pub fn as_type<T: ?Sized + Kind>(&self, handle: impl AsHandle) -> CfResult<&T> {
        let id = self.require(handle)?;
        let node = self.live_node(handle)?;
        T::downcast_ref(node.component.as_ref()).ok_or_else(|| self.mismatch::<T>(id))
    }

    /// Mutably borrows a component as `T`.
    ///
    /// # Errors
    ///
    /// Same as [`as_type`](Self::as_type).
    pub fn as_type_mut<T: ?Sized + Kind>(&mut self, handle: impl HandleMut) -> CfResult<&mut T> {
        let id = self.require(handle)?;
        let matches = self
            .node(id)
            .is_some_and(|n| T::matches(n.component.as_ref()));
        if !matches {
            return Err(self.mismatch::<T>(id));
        }
        self.node_mut(id)
            .and_then(|n| T::downcast_mut(n.component.as_mut()))
            .ok_or_else(|| CfError::not_found(format!("component {id} no longer exists")))
    }

    // ── Node data ────────────────────────────────────────────

    /// Options of a component.
    ///
    /// # Errors
    ///
    /// [`CfError::ValueNotFound`] if the handle is null.
    pub fn options(&self, handle: impl AsHandle) -> CfResult<&OptionList> {
        self.live_node(handle).map(|n| &n.data.options)
    }

    /// Mutable options of a component.
    ///
    /// # Errors
    ///
    /// [`CfError::ValueNotFound`] if the handle is null.
    pub fn options_mut(&mut self, handle: impl HandleMut) -> CfResult<&mut OptionList> {
        self.live_node_mut(handle).map(|n| &mut n.data.options)
    }

    /// Properties of a component.
    ///
    /// # Errors
    ///
    /// [`CfError::ValueNotFound`] if the handle is null.
    pub fn properties(&self, handle: impl AsHandle) -> CfResult<&Properties> {
        self.live_node(handle).map(|n| &n.data.properties)
    }

    /// Mutable properties of a component.
    ///
    /// # Errors
    ///
    /// [`CfError::ValueNotFound`] if the handle is null.
    pub fn properties_mut(&mut self, handle: impl HandleMut) -> CfResult<&mut Properties> {
        self.live_node_mut(handle).map(|n| &mut n.data.properties)
    }

    /// Signals registered on a component (defaults excluded).
    ///
    /// # Errors
    ///
    /// [`CfError::ValueNotFound`] if the handle is null.
    pub fn signals(&self, handle: impl AsHandle) -> CfResult<&SignalRegistry> {
        self.live_node(handle).map(|n| &n.data.signals)
    }

    /// Mutable signal registry of a component.
    ///
    /// # Errors
    ///
    /// [`CfError::ValueNotFound`] if the handle is null.
    pub fn signals_mut(&mut self, handle: impl HandleMut) -> CfResult<&mut SignalRegistry> {
        self.live_node_mut(handle).map(|n| &mut n.data.signals)
    }

    /// Tags of a component, in insertion order.
    pub fn tags(&self, handle: impl AsHandle) -> impl Iterator<Item = &str> + '_ {
        self.live_node(handle)
            .ok()
            .into_iter()
            .flat_map(|n| n.data.tags.iter().map(String::as_str))
    }

    /// Returns `true` if the component carries `tag`.
    #[must_use]
    pub fn has_tag(&self, handle: impl AsHandle, tag: &str) -> bool {
        self.live_node(handle).is_ok_and(|n| n.data.tags.contains(tag))
    }

    /// Adds a tag.
    ///
    /// # Errors
    ///
    /// [`CfError::ValueNotFound`] if the handle is null.
    pub fn add_tag(&mut self, handle: impl HandleMut, tag: &str) -> CfResult<()> {
        self.live_node_mut(handle)?.data.tags.insert(tag.to_string());
        Ok(())
    }

    /// Removes a tag. Returns `true` if it was present.
    pub fn remove_tag(&mut self, handle: impl HandleMut, tag: &str) -> bool {
        self.live_node_mut(handle)
            .is_ok_and(|n| n.data.tags.shift_remove(tag))
    }

    /// Capability flags of a component. Empty for null handles.
    #[must_use]
    pub fn flags(&self, handle: impl AsHandle) -> ComponentFlags {
        self.live_node(handle)
            .map_or(ComponentFlags::empty(), |n| n.data.flags)
    }

    /// Returns `true` for static components.
    #[must_use]
    pub fn is_static(&self, handle: impl AsHandle) -> bool {
        self.flags(handle).contains(ComponentFlags::STATIC)
    }

    /// Returns `true` for basic components.
    #[must_use]
    pub fn is_basic(&self, handle: impl AsHandle) -> bool {
        self.flags(handle).contains(ComponentFlags::BASIC)
    }

    /// Marks a component basic (or advanced).
    ///
    /// # Errors
    ///
    /// [`CfError::ValueNotFound`] if the handle is null.
    pub fn set_basic(&mut self, handle: impl HandleMut, basic: bool) -> CfResult<()> {
        self.live_node_mut(handle)?
            .data
            .flags
            .set(ComponentFlags::BASIC, basic);
        Ok(())
    }
}

impl Default for ComponentTree {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ComponentTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentTree")
            .field("live", &self.live)
            .field("slots", &self.slots.len())
            .finish()
    }
}

fn null_deref(kind: &str) -> ! {
    panic!("dereferenced a null or stale Handle<{kind}>")
}

impl<T: ?Sized + Kind> Index<Handle<T>> for ComponentTree {
    type Output = T;

    /// # Panics
    ///
    /// If the handle is null or of the wrong kind.
    fn index(&self, handle: Handle<T>) -> &T {
        match self.get(handle) {
            Some(component) => component,
            None => null_deref(T::kind_name()),
        }
    }
}

impl<T: ?Sized + Kind> Index<ConstHandle<T>> for ComponentTree {
    type Output = T;

    fn index(&self, handle: ConstHandle<T>) -> &T {
        match self.get(handle) {
            Some(component) => component,
            None => null_deref(T::kind_name()),
        }
    }
}

impl<T: ?Sized + Kind> IndexMut<Handle<T>> for ComponentTree {
    fn index_mut(&mut self, handle: Handle<T>) -> &mut T {
        match self.get_mut(handle) {
            Some(component) => component,
            None => null_deref(T::kind_name()),
        }
    }
}
