//! The core life cycle.
//!
//! # State Machine
//!
//! ```text
//!                 initiate(args)                 terminate()
//! Uninitialized ─────────────────► Running ─────────────────► Terminated
//!      ▲   │                         │  ▲                          │
//!      │   │ failure                 └──┘ initiate: no-op          │ initiate /
//!      └───┘ (retry after                                          │ terminate:
//!             configuring)                                         ▼ SetupError
//! ```
//!
//! # Tree Layout
//!
//! ```text
//! cpath:/
//! ├── Libraries     (static)  one node per registered library
//! ├── Factories     (static)  one node per builder
//! ├── Environment   (static)  runtime switches
//! └── Tools         (static)  shared utility components
//! ```

use crate::config::CoreConfig;
use crate::{logging, CommonLibrary, Environment, PluginCatalog, RuntimeError};
use cf_component::{AnyHandle, Context, Group, Handle};
use tracing::{debug, info};

/// Life cycle state of a [`Core`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreState {
    /// Built, not yet initiated.
    Uninitialized,
    /// Libraries initiated.
    Running,
    /// Torn down. Terminal.
    Terminated,
}

impl std::fmt::Display for CoreState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Running => "running",
            Self::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Owner of the [`Context`] and its life cycle.
///
/// # Example
///
/// ```
/// use cf_runtime::{config::CoreConfig, Core, CoreState};
///
/// let mut core = Core::new(CoreConfig::default()).expect("core should build");
/// core.initiate(&["log_level:string=error"]).expect("core should start");
/// assert_eq!(core.state(), CoreState::Running);
///
/// let root = core.context().root();
/// assert!(core.context().tree.resolve(root, "/Environment").is_ok());
///
/// core.terminate().expect("core should stop");
/// assert_eq!(core.state(), CoreState::Terminated);
/// ```
#[derive(Debug)]
pub struct Core {
    ctx: Context,
    config: CoreConfig,
    catalog: PluginCatalog,
    state: CoreState,
    environment: Handle<Environment>,
    tools: Handle<Group>,
}

impl Core {
    /// Builds a core with an empty plugin catalog.
    ///
    /// # Errors
    ///
    /// A config value the Environment rejects, or a failure while
    /// registering `cf3.common`.
    pub fn new(config: CoreConfig) -> Result<Self, RuntimeError> {
        Self::with_catalog(config, PluginCatalog::new())
    }

    /// Builds a core that loads plugins from `catalog`.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn with_catalog(config: CoreConfig, catalog: PluginCatalog) -> Result<Self, RuntimeError> {
        let mut ctx = Context::new();
        ctx.regist_library(Box::new(CommonLibrary))?;

        let root = ctx.root();
        let environment = ctx.create_static_component::<Environment>(root, "Environment")?;
        let tools = ctx.create_static_component::<Group>(root, "Tools")?;
        ctx.tree
            .properties_mut(tools)?
            .set("brief", "Shared utility components");

        {
            let options = ctx.tree.options_mut(environment)?;
            options.set("log_level", config.log_level.as_str())?;
            options.set("regist_signal_handlers", config.regist_signal_handlers)?;
            for (name, value) in &config.environment {
                options.set_from_str(name, value)?;
            }
        }

        debug!(plugins = ?config.plugins, "core built");
        Ok(Self {
            ctx,
            config,
            catalog,
            state: CoreState::Uninitialized,
            environment,
            tools,
        })
    }

    /// The shared context.
    #[must_use]
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// The shared context, mutably.
    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.ctx
    }

    /// The startup configuration.
    #[must_use]
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// The plugin catalog, for registering constructors before `initiate`.
    pub fn catalog_mut(&mut self) -> &mut PluginCatalog {
        &mut self.catalog
    }

    /// Current life cycle state.
    #[must_use]
    pub fn state(&self) -> CoreState {
        self.state
    }

    /// `cpath:/Environment`.
    #[must_use]
    pub fn environment(&self) -> Handle<Environment> {
        self.environment
    }

    /// `cpath:/Tools`.
    #[must_use]
    pub fn tools(&self) -> Handle<Group> {
        self.tools
    }

    /// The root handle.
    #[must_use]
    pub fn root(&self) -> AnyHandle {
        self.ctx.root()
    }

    /// Starts the core.
    ///
    /// 1. applies `name:type=value` arguments to the Environment
    /// 2. installs the panic hook if `regist_signal_handlers` is set
    /// 3. brings up logging
    /// 4. registers configured plugins not yet registered
    /// 5. initiates every library
    ///
    /// On failure the core stays uninitialized and may be retried.
    ///
    /// # Errors
    ///
    /// - [`CfError::SetupError`](cf_types::CfError::SetupError) after
    ///   termination
    /// - assignment errors from the arguments
    /// - [`RuntimeError::Plugin`] for unknown or failing plugins
    /// - the first failing library `initiate`
    pub fn initiate<S: AsRef<str>>(&mut self, args: &[S]) -> Result<(), RuntimeError> {
        match self.state {
            CoreState::Running => {
                debug!("core already running, initiate ignored");
                return Ok(());
            }
            CoreState::Terminated => {
                return Err(RuntimeError::setup("cannot initiate a terminated core"));
            }
            CoreState::Uninitialized => {}
        }

        self.ctx.configure(self.environment, args)?;

        let (log_level, handlers) = {
            let env = &self.ctx.tree[self.environment];
            (env.log_level(), env.regist_signal_handlers())
        };
        if handlers {
            logging::install_panic_hook();
        }
        logging::init(&log_level);

        self.load_plugins()?;
        self.ctx.initiate_all_libraries()?;

        self.state = CoreState::Running;
        info!(
            libraries = self.ctx.library_names().count(),
            log_level = %log_level,
            "core initiated"
        );
        Ok(())
    }

    /// Stops the core.
    ///
    /// Libraries terminate in reverse order, then the whole tree below the
    /// root is released, static groups included. Handles such as
    /// [`environment`](Self::environment) are null afterwards. Cleanup
    /// always runs to completion; the first library error is returned
    /// afterwards.
    ///
    /// # Errors
    ///
    /// - [`CfError::SetupError`](cf_types::CfError::SetupError) if the core
    ///   was never initiated
    /// - the first failing library `terminate`
    pub fn terminate(&mut self) -> Result<(), RuntimeError> {
        match self.state {
            CoreState::Uninitialized => {
                return Err(RuntimeError::setup("cannot terminate an uninitialized core"));
            }
            CoreState::Terminated => {
                debug!("core already terminated");
                return Ok(());
            }
            CoreState::Running => {}
        }

        let libraries = self.ctx.terminate_all_libraries();
        let released = self.ctx.tree.clear();

        self.state = CoreState::Terminated;
        info!(released, "core terminated");
        libraries.map_err(RuntimeError::from)
    }

    fn load_plugins(&mut self) -> Result<(), RuntimeError> {
        for name in &self.config.plugins {
            if self.ctx.has_library(name) {
                debug!(plugin = %name, "plugin already registered");
                continue;
            }
            let library = self
                .catalog
                .instantiate(name)
                .map_err(|e| RuntimeError::plugin(name, e))?;
            self.ctx
                .regist_library(library)
                .map_err(|e| RuntimeError::plugin(name, e))?;
            info!(plugin = %name, "plugin loaded");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_types::CfError;

    #[test]
    fn new_core_has_static_layout() {
        let core = Core::new(CoreConfig::default()).expect("core should build");
        let tree = &core.context().tree;
        let names: Vec<&str> = tree
            .children(core.root())
            .filter_map(|c| tree.name(c))
            .collect();
        assert_eq!(names, ["Libraries", "Factories", "Environment", "Tools"]);
        assert!(tree.is_static(core.environment()));
        assert!(tree.is_static(core.tools()));
        assert!(core.context().has_library(CommonLibrary::NAME));
        assert_eq!(core.state(), CoreState::Uninitialized);
    }

    #[test]
    fn config_values_reach_the_environment() {
        let mut config = CoreConfig {
            log_level: "info".into(),
            ..CoreConfig::default()
        };
        config
            .environment
            .insert("regist_signal_handlers".into(), "true".into());

        let core = Core::new(config).expect("core should build");
        let env = &core.context().tree[core.environment()];
        assert_eq!(env.log_level(), "info");
        assert!(env.regist_signal_handlers());
    }

    #[test]
    fn invalid_config_level_is_rejected() {
        let config = CoreConfig {
            log_level: "chatty".into(),
            ..CoreConfig::default()
        };
        let err = Core::new(config).expect_err("level outside the list");
        assert!(matches!(err.core_error(), Some(CfError::BadValue(_))));
    }

    #[test]
    fn initiate_twice_is_a_no_op() {
        let mut core = Core::new(CoreConfig::default()).expect("core should build");
        core.initiate::<&str>(&[]).expect("first initiate");
        core.initiate(&["log_level:string=trace"])
            .expect("second initiate is ignored");
        assert_eq!(core.context().tree[core.environment()].log_level(), "warn");
    }

    #[test]
    fn terminate_before_initiate_is_setup_error() {
        let mut core = Core::new(CoreConfig::default()).expect("core should build");
        let err = core.terminate().expect_err("nothing to terminate");
        assert!(matches!(err.core_error(), Some(CfError::SetupError(_))));
        assert_eq!(core.state(), CoreState::Uninitialized);
    }

    #[test]
    fn bad_argument_keeps_core_uninitialized() {
        let mut core = Core::new(CoreConfig::default()).expect("core should build");
        assert!(core.initiate(&["log_level:string=loud"]).is_err());
        assert_eq!(core.state(), CoreState::Uninitialized);
        core.initiate(&["log_level:string=debug"])
            .expect("retry with a valid level");
        assert_eq!(core.state(), CoreState::Running);
    }
}
