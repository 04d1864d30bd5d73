//! The `cf3.common` library: builders for the built-in component types.

use crate::Environment;
use cf_component::{Component, Context, Group, Library, Link};
use cf_types::CfResult;

/// Registers builders for [`Group`], [`Link`] and [`Environment`].
///
/// Every [`Core`](crate::Core) registers this library first.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommonLibrary;

impl CommonLibrary {
    /// Library name.
    pub const NAME: &'static str = "cf3.common";
}

impl Library for CommonLibrary {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Built-in component types"
    }

    fn register(&self, ctx: &mut Context) -> CfResult<()> {
        ctx.regist_builder::<Group, dyn Component>(Self::NAME)?;
        ctx.regist_builder::<Link, dyn Component>(Self::NAME)?;
        ctx.regist_builder::<Environment, dyn Component>(Self::NAME)?;
        Ok(())
    }
}
