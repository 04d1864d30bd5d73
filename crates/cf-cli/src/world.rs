//! Sample library that builds a small tree on initiate.
//!
//! Loaded with `--plugins cf3.world` (or `CF_PLUGINS=cf3.world`):
//!
//! ```text
//! cpath:/World
//! ├── Europe
//! │   └── Belgium
//! ├── Africa
//! └── Current_Country  → /World/Europe/Belgium
//! ```

use cf_component::{Context, Group, Library, Link};
use cf_types::CfResult;

/// The `cf3.world` library.
#[derive(Debug, Default)]
pub struct WorldLibrary;

impl WorldLibrary {
    /// Library name.
    pub const NAME: &'static str = "cf3.world";
}

impl Library for WorldLibrary {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Sample World/Europe/Africa tree"
    }

    fn initiate(&mut self, ctx: &mut Context) -> CfResult<()> {
        let root = ctx.root();
        let world = ctx.create_component::<Group>(root, "World")?;
        let europe = ctx.create_component::<Group>(world, "Europe")?;
        ctx.create_component::<Group>(world, "Africa")?;
        let belgium = ctx.create_component::<Group>(europe, "Belgium")?;
        ctx.tree.add_tag(belgium, "country")?;

        let current = ctx.create_component::<Link>(world, "Current_Country")?;
        ctx.tree.link_to(current, belgium)?;
        tracing::debug!("sample world created");
        Ok(())
    }
}
