//! Process-wide settings as a component.
//!
//! The Environment lives at `cpath:/Environment`. Its options are the
//! runtime switches a driver may set before `Core::initiate`, either from
//! [`CoreConfig`](crate::config::CoreConfig) or as `name:type=value`
//! arguments.

use crate::config::LOG_LEVELS;
use cf_component::{Component, ComponentType, Declaration};
use cf_options::{linked, Linked};
use cf_types::CfResult;

/// Runtime switches.
///
/// | Option | Type | Default |
/// |--------|------|---------|
/// | `log_level` | string, one of error/warn/info/debug/trace | `warn` |
/// | `regist_signal_handlers` | bool | `false` |
#[derive(Debug)]
pub struct Environment {
    log_level: Linked<String>,
    regist_signal_handlers: Linked<bool>,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            log_level: linked("warn".to_string()),
            regist_signal_handlers: linked(false),
        }
    }
}

impl Environment {
    /// Current log level.
    #[must_use]
    pub fn log_level(&self) -> String {
        self.log_level.borrow().clone()
    }

    /// Whether the panic hook should be installed on initiate.
    #[must_use]
    pub fn regist_signal_handlers(&self) -> bool {
        *self.regist_signal_handlers.borrow()
    }
}

impl Component for Environment {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn declare(&self, decl: &mut Declaration<'_>) -> CfResult<()> {
        decl.properties().set("brief", "Runtime environment settings");
        decl.options()
            .add("log_level", "warn")?
            .with_description("Default log filter when CF_LOG is not set")
            .with_pretty_name("Log Level")
            .restrict_to(LOG_LEVELS)
            .mark_basic()
            .link_to(&self.log_level)?;
        decl.options()
            .add("regist_signal_handlers", false)?
            .with_description("Log panics through the runtime logger")
            .with_pretty_name("Register Signal Handlers")
            .mark_basic()
            .link_to(&self.regist_signal_handlers)?;
        Ok(())
    }
}

impl ComponentType for Environment {
    const TYPE_NAME: &'static str = "cf3.common.Environment";
}
