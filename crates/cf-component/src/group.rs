//! Structural component types with no state of their own.

use crate::{Component, ComponentType};

/// The tree root. Created by [`ComponentTree::new`](crate::ComponentTree::new)
/// and never built by name.
#[derive(Debug, Default, Clone, Copy)]
pub struct Root;

impl Component for Root {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }
}

impl ComponentType for Root {
    const TYPE_NAME: &'static str = "cf3.common.Root";
}

/// A plain container for other components.
#[derive(Debug, Default, Clone, Copy)]
pub struct Group;

impl Component for Group {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }
}

impl ComponentType for Group {
    const TYPE_NAME: &'static str = "cf3.common.Group";
}
