//! Tree-spanning references.
//!
//! A [`Link`] is a node that points at another node elsewhere in the tree
//! without owning it. The target is stored as a handle, so a link whose
//! target was removed simply follows to null.

use crate::handle::rebind;
use crate::{
    AnyHandle, AsHandle, Component, ComponentTree, ComponentType, ConstHandle, Declaration,
    ErasedOf, Handle, HandleMut,
};
use cf_types::{CfError, CfResult, Uri, ValueType};

/// A weak reference node.
#[derive(Debug, Default, Clone, Copy)]
pub struct Link {
    target: AnyHandle,
}

impl Link {
    /// The stored target, read-only. May be stale; use
    /// [`ComponentTree::follow`] on a writable link handle for write access.
    #[must_use]
    pub fn target(&self) -> ConstHandle {
        self.target.as_const()
    }
}

impl Component for Link {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn declare(&self, decl: &mut Declaration<'_>) -> CfResult<()> {
        decl.properties()
            .set("brief", "Link to another component");
        decl.signals()
            .regist_signal("change_link")
            .with_description("Retarget the link")
            .with_pretty_name("Change link")
            .with_signature(|args| {
                args.set("target_path", ValueType::Uri.default_value());
            })
            .connect(|ctx, this, args| {
                let path: Uri = args.get("target_path")?;
                let target = ctx.tree.access_component(this, &path)?;
                let link = ctx.tree.try_cast::<Link>(this)?;
                ctx.tree.link_to(link, target)
            });
        Ok(())
    }
}

impl ComponentType for Link {
    const TYPE_NAME: &'static str = "cf3.common.Link";
}

impl ComponentTree {
    /// Points `link` at `target`.
    ///
    /// # Errors
    ///
    /// - [`CfError::ValueNotFound`] if `link` is null
    /// - [`CfError::BadValue`] if `target` is null or is the link itself
    pub fn link_to(&mut self, link: Handle<Link>, target: impl HandleMut) -> CfResult<()> {
        self.require(link)?;
        let target_id = self
            .require(target)
            .map_err(|_| CfError::bad_value("cannot link to a null component"))?;
        if link.id() == Some(target_id) {
            return Err(CfError::bad_value("a link cannot point to itself"));
        }
        let target = Handle::from_id(target_id);
        tracing::debug!(to = %self.uri_of(target_id), "link retargeted");
        self.as_type_mut::<Link>(link)?.target = target;
        Ok(())
    }

    /// The live target of a link, or a null handle.
    ///
    /// Following a read-only link gives a read-only target.
    #[must_use]
    pub fn follow<H: AsHandle>(&self, link: H) -> ErasedOf<H> {
        match self.as_type::<Link>(link) {
            Ok(link) if self.is_not_null(link.target) => {
                rebind::<H, dyn Component>(link.target.id())
            }
            _ => rebind::<H, dyn Component>(None),
        }
    }
}
