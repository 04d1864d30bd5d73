//! Depth-first traversal, filters and read-only views.
//!
//! Traversal is pre-order: a node is yielded before its children, and
//! siblings come in insertion order. Callers rely on this order.

use crate::handle::rebind;
use crate::handle::sealed::Sealed as _;
use crate::{
    AnyHandle, AsHandle, Component, ComponentTree, ConstHandle, ErasedOf, Handle, Kind, NodeId,
    Properties, SignalRegistry,
};
use cf_options::OptionList;
use cf_types::{CfResult, Uri};
use std::fmt::Write as _;
use std::marker::PhantomData;

/// Pre-order iterator over the descendants of a node (the node excluded).
///
/// Yields handles with the access of the handle the walk started from.
pub struct Descendants<'t, H: AsHandle = AnyHandle> {
    tree: &'t ComponentTree,
    stack: Vec<NodeId>,
    _access: PhantomData<fn() -> H>,
}

impl<'t, H: AsHandle> Descendants<'t, H> {
    fn new(tree: &'t ComponentTree, from: Option<NodeId>) -> Self {
        let mut iter = Self {
            tree,
            stack: Vec::new(),
            _access: PhantomData,
        };
        if let Some(id) = from {
            iter.push_children(id);
        }
        iter
    }

    fn push_children(&mut self, id: NodeId) {
        if let Some(node) = self.tree.node(id) {
            self.stack.extend(node.children.values().rev().copied());
        }
    }
}

impl<H: AsHandle> Iterator for Descendants<'_, H> {
    type Item = H;

    fn next(&mut self) -> Option<H> {
        let id = self.stack.pop()?;
        self.push_children(id);
        Some(H::from_node(Some(id)))
    }
}

/// A read-only view of one component.
#[derive(Clone, Copy)]
pub struct ComponentRef<'t> {
    tree: &'t ComponentTree,
    handle: ConstHandle,
}

impl<'t> ComponentRef<'t> {
    /// The read-only handle this view wraps.
    #[must_use]
    pub fn handle(&self) -> ConstHandle {
        self.handle
    }

    /// Component name.
    #[must_use]
    pub fn name(&self) -> &'t str {
        self.tree.name(self.handle).unwrap_or_default()
    }

    /// Dynamic type name.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.tree.type_name(self.handle).unwrap_or_default()
    }

    /// Absolute URI.
    ///
    /// # Errors
    ///
    /// `ValueNotFound` if the component was destroyed.
    pub fn uri(&self) -> CfResult<Uri> {
        self.tree.uri(self.handle)
    }

    /// The component value.
    #[must_use]
    pub fn component(&self) -> Option<&'t dyn Component> {
        self.tree.component(self.handle)
    }

    /// Options.
    ///
    /// # Errors
    ///
    /// `ValueNotFound` if the component was destroyed.
    pub fn options(&self) -> CfResult<&'t OptionList> {
        self.tree.options(self.handle)
    }

    /// Properties.
    ///
    /// # Errors
    ///
    /// `ValueNotFound` if the component was destroyed.
    pub fn properties(&self) -> CfResult<&'t Properties> {
        self.tree.properties(self.handle)
    }

    /// Node signals.
    ///
    /// # Errors
    ///
    /// `ValueNotFound` if the component was destroyed.
    pub fn signals(&self) -> CfResult<&'t SignalRegistry> {
        self.tree.signals(self.handle)
    }

    /// Tags.
    pub fn tags(&self) -> impl Iterator<Item = &'t str> {
        self.tree.tags(self.handle)
    }

    /// Direct children as views.
    pub fn children(&self) -> impl Iterator<Item = ComponentRef<'t>> {
        let tree = self.tree;
        tree.children(self.handle)
            .map(move |handle| ComponentRef { tree, handle })
    }
}

impl std::fmt::Debug for ComponentRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRef")
            .field("name", &self.name())
            .field("type_name", &self.type_name())
            .field("handle", &self.handle)
            .finish()
    }
}

impl ComponentTree {
    /// Pre-order iterator over every descendant of `from`.
    pub fn descendants<H: AsHandle>(&self, from: H) -> Descendants<'_, ErasedOf<H>> {
        Descendants::new(self, self.require(from).ok())
    }

    /// Descendants of kind `T`.
    pub fn descendants_of_type<T: ?Sized + Kind, H: AsHandle>(
        &self,
        from: H,
    ) -> impl Iterator<Item = H::Of<T>> + '_ {
        self.descendants(from).filter_map(move |h| {
            self.component(h)
                .filter(|c| T::matches(*c))
                .map(|_| rebind::<H, T>(h.node_id()))
        })
    }

    /// Direct children of kind `T`.
    pub fn children_of_type<T: ?Sized + Kind, H: AsHandle>(
        &self,
        from: H,
    ) -> impl Iterator<Item = H::Of<T>> + '_ {
        self.children(from).filter_map(move |h| {
            self.component(h)
                .filter(|c| T::matches(*c))
                .map(|_| rebind::<H, T>(h.node_id()))
        })
    }

    /// Descendants carrying `tag`.
    pub fn descendants_with_tag<'a, H: AsHandle>(
        &'a self,
        from: H,
        tag: &'a str,
    ) -> impl Iterator<Item = ErasedOf<H>> + 'a {
        self.descendants(from).filter(move |&h| self.has_tag(h, tag))
    }

    /// Descendants whose name satisfies `predicate`.
    pub fn descendants_matching<'a, H, P>(
        &'a self,
        from: H,
        predicate: P,
    ) -> impl Iterator<Item = ErasedOf<H>> + 'a
    where
        H: AsHandle,
        P: Fn(&str) -> bool + 'a,
    {
        self.descendants(from)
            .filter(move |&h| self.name(h).is_some_and(&predicate))
    }

    /// First descendant named `name`, or a null handle.
    #[must_use]
    pub fn find_component<H: AsHandle>(&self, from: H, name: &str) -> ErasedOf<H> {
        self.descendants_matching(from, |n| n == name)
            .next()
            .unwrap_or_else(|| rebind::<H, dyn Component>(None))
    }

    /// First descendant of kind `T`, or a null handle.
    #[must_use]
    pub fn find_component_of_type<T: ?Sized + Kind, H: AsHandle>(&self, from: H) -> H::Of<T> {
        self.descendants_of_type::<T, H>(from)
            .next()
            .unwrap_or_else(|| rebind::<H, T>(None))
    }

    /// Read-only view of a component.
    #[must_use]
    pub fn view(&self, handle: impl AsHandle) -> ComponentRef<'_> {
        ComponentRef {
            tree: self,
            handle: rebind::<ConstHandle, dyn Component>(handle.node_id()),
        }
    }

    /// Indented `name (type)` listing of a subtree, one line per node.
    ///
    /// # Errors
    ///
    /// `ValueNotFound` if `from` is null.
    pub fn tree_listing(&self, from: impl AsHandle) -> CfResult<String> {
        let top = self.require(from)?;
        let mut out = String::new();
        self.write_listing(&mut out, Handle::from_id(top), 0);
        Ok(out)
    }

    fn write_listing(&self, out: &mut String, handle: AnyHandle, depth: usize) {
        let name = match self.name(handle) {
            Some("") | None => "/",
            Some(name) => name,
        };
        let type_name = self.type_name(handle).unwrap_or_default();
        let _ = writeln!(out, "{:indent$}{name} ({type_name})", "", indent = depth * 2);
        for child in self.children(handle) {
            self.write_listing(out, child, depth + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Group, Link};

    fn sample() -> (ComponentTree, AnyHandle) {
        let mut tree = ComponentTree::new();
        let root = tree.root();
        let top = tree
            .create_component::<Group>(root, "top")
            .expect("top should be created");
        let a = tree.create_component::<Group>(top, "a").expect("created");
        tree.create_component::<Link>(a, "a1").expect("created");
        tree.create_component::<Group>(a, "a2").expect("created");
        let b = tree.create_component::<Group>(top, "b").expect("created");
        tree.create_component::<Link>(b, "b1").expect("created");
        tree.add_tag(b, "marked").expect("live");
        (tree, top.erase())
    }

    fn names(tree: &ComponentTree, handles: impl Iterator<Item = AnyHandle>) -> Vec<String> {
        handles
            .filter_map(|h| tree.name(h).map(str::to_string))
            .collect()
    }

    #[test]
    fn descendants_are_pre_order() {
        let (tree, top) = sample();
        assert_eq!(
            names(&tree, tree.descendants(top)),
            vec!["a", "a1", "a2", "b", "b1"]
        );
    }

    #[test]
    fn filters() {
        let (tree, top) = sample();
        let links = tree.descendants_of_type::<Link, _>(top).map(Handle::erase);
        assert_eq!(names(&tree, links), vec!["a1", "b1"]);
        assert_eq!(
            names(&tree, tree.descendants_with_tag(top, "marked")),
            vec!["b"]
        );
        assert_eq!(
            names(&tree, tree.descendants_matching(top, |n| n.ends_with('2'))),
            vec!["a2"]
        );
        let groups = tree.children_of_type::<Group, _>(top).map(Handle::erase);
        assert_eq!(names(&tree, groups), vec!["a", "b"]);
    }

    #[test]
    fn find_returns_first_match_or_null() {
        let (tree, top) = sample();
        assert_eq!(tree.name(tree.find_component(top, "b1")), Some("b1"));
        assert!(tree.find_component(top, "zz").is_unbound());
        let link = tree.find_component_of_type::<Link, _>(top);
        assert_eq!(tree.name(link), Some("a1"));
    }

    #[test]
    fn listing_indents_children() {
        let (tree, top) = sample();
        let listing = tree.tree_listing(top).expect("live");
        let lines: Vec<_> = listing.lines().collect();
        assert_eq!(lines[0], "top (cf3.common.Group)");
        assert_eq!(lines[2], "    a1 (cf3.common.Link)");
        assert!(tree
            .tree_listing(tree.root())
            .expect("root is live")
            .starts_with("/ (cf3.common.Root)"));
    }

    #[test]
    fn walks_from_a_const_handle_stay_read_only() {
        let (tree, top) = sample();
        let read_only = top.as_const();
        let all: Vec<ConstHandle> = tree.descendants(read_only).collect();
        assert_eq!(all.len(), 5);
        let link: ConstHandle<Link> = tree.find_component_of_type::<Link, _>(read_only);
        assert_eq!(tree.name(link), Some("a1"));
        let tagged: Vec<ConstHandle> = tree.descendants_with_tag(read_only, "marked").collect();
        assert_eq!(tree.name(tagged[0]), Some("b"));
        assert!(tree.find_component(read_only, "zz").is_unbound());
        let view = tree.view(top);
        assert_eq!(view.handle(), read_only);
    }

    #[test]
    fn view_exposes_node_data() {
        let (tree, top) = sample();
        let view = tree.view(top);
        assert_eq!(view.name(), "top");
        assert_eq!(view.children().count(), 2);
        assert!(view.properties().expect("live").contains("brief"));
    }
}
