//! Plugin units with their own setup and teardown.
//!
//! A [`Library`] registers its builders when it is added to a [`Context`]
//! and gets `initiate`/`terminate` calls from the core life cycle. Each
//! library is initiated at most once until terminated again.

use crate::{AnyHandle, Component, ComponentType, Context};
use cf_types::{CfError, CfResult};
use indexmap::IndexMap;

/// A logical plugin unit.
pub trait Library {
    /// Unique library name, e.g. `"cf3.common"`.
    fn name(&self) -> &'static str;

    /// One-line description.
    fn description(&self) -> &'static str {
        ""
    }

    /// Registers builders and events. Runs once, when the library is added.
    ///
    /// # Errors
    ///
    /// A failed registration keeps the library out of the context.
    fn register(&self, ctx: &mut Context) -> CfResult<()> {
        let _ = ctx;
        Ok(())
    }

    /// One-time setup.
    ///
    /// # Errors
    ///
    /// Aborts `initiate_all_libraries`.
    fn initiate(&mut self, ctx: &mut Context) -> CfResult<()> {
        let _ = ctx;
        Ok(())
    }

    /// Teardown, in reverse order of initiation.
    ///
    /// # Errors
    ///
    /// Logged by the caller; remaining libraries still terminate.
    fn terminate(&mut self, ctx: &mut Context) -> CfResult<()> {
        let _ = ctx;
        Ok(())
    }
}

/// Tree node mirroring a registered library under `cpath:/Libraries`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LibraryNode;

impl Component for LibraryNode {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }
}

impl ComponentType for LibraryNode {
    const TYPE_NAME: &'static str = "cf3.common.Library";
}

struct Entry {
    library: Option<Box<dyn Library>>,
    initiated: bool,
    mirror: AnyHandle,
}

/// Registered libraries, in registration order.
#[derive(Default)]
pub(crate) struct Libraries {
    entries: IndexMap<String, Entry>,
}

impl Libraries {
    pub(crate) fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }
}

impl Context {
    /// Adds a library: mirrors it under `cpath:/Libraries/<name>` and runs
    /// its `register` step. A failed `register` removes the mirror again.
    ///
    /// # Errors
    ///
    /// [`CfError::ValueExists`] if a library of that name was added,
    /// [`CfError::BadValue`] if the name is not a path segment, or the
    /// error of `register`.
    pub fn regist_library(&mut self, library: Box<dyn Library>) -> CfResult<AnyHandle> {
        let name = library.name();
        if self.libraries.contains(name) {
            return Err(CfError::ValueExists(format!("library '{name}'")));
        }

        let group = self.libraries_group;
        let mirror = self
            .create_static_component::<LibraryNode>(group, name)?
            .erase();
        if let Err(e) = library.register(self) {
            self.tree.release(mirror);
            return Err(e);
        }
        self.tree
            .properties_mut(mirror)?
            .set("brief", library.description())
            .set("initiated", false);

        tracing::debug!(library = name, "library registered");
        self.libraries.entries.insert(
            name.to_string(),
            Entry {
                library: Some(library),
                initiated: false,
                mirror,
            },
        );
        Ok(mirror)
    }

    /// Names of the registered libraries.
    pub fn library_names(&self) -> impl Iterator<Item = &str> {
        self.libraries.entries.keys().map(String::as_str)
    }

    /// Returns `true` if the library is registered.
    #[must_use]
    pub fn has_library(&self, name: &str) -> bool {
        self.libraries.contains(name)
    }

    /// Returns `true` if the library has been initiated and not terminated.
    #[must_use]
    pub fn is_library_initiated(&self, name: &str) -> bool {
        self.libraries
            .entries
            .get(name)
            .is_some_and(|e| e.initiated)
    }

    /// Initiates every library not yet initiated, in registration order.
    ///
    /// # Errors
    ///
    /// Stops at the first failing library. The libraries this call already
    /// initiated are terminated again, in reverse order, before the error is
    /// returned.
    pub fn initiate_all_libraries(&mut self) -> CfResult<()> {
        let names: Vec<String> = self.libraries.entries.keys().cloned().collect();
        let mut started = Vec::new();
        for name in names {
            if self.is_library_initiated(&name) {
                continue;
            }
            if let Err(e) = self.with_library(&name, |library, ctx| library.initiate(ctx)) {
                tracing::error!(library = %name, error = %e, "library initiation failed");
                self.roll_back(started);
                return Err(e);
            }
            self.set_initiated(&name, true);
            tracing::info!(library = %name, "library initiated");
            started.push(name);
        }
        Ok(())
    }

    fn roll_back(&mut self, started: Vec<String>) {
        for name in started.into_iter().rev() {
            if let Err(e) = self.with_library(&name, |library, ctx| library.terminate(ctx)) {
                tracing::warn!(library = %name, error = %e, "rollback terminate failed");
            }
            self.set_initiated(&name, false);
            tracing::debug!(library = %name, "library rolled back");
        }
    }

    /// Terminates initiated libraries in reverse registration order.
    ///
    /// Every library is attempted. Returns the first error.
    ///
    /// # Errors
    ///
    /// The first `terminate` failure.
    pub fn terminate_all_libraries(&mut self) -> CfResult<()> {
        let names: Vec<String> = self.libraries.entries.keys().rev().cloned().collect();
        let mut first_error = None;
        for name in names {
            if !self.is_library_initiated(&name) {
                continue;
            }
            match self.with_library(&name, |library, ctx| library.terminate(ctx)) {
                Ok(()) => tracing::info!(library = %name, "library terminated"),
                Err(e) => {
                    tracing::error!(library = %name, error = %e, "library termination failed");
                    first_error.get_or_insert(e);
                }
            }
            self.set_initiated(&name, false);
        }
        first_error.map_or(Ok(()), Err)
    }

    fn with_library<F>(&mut self, name: &str, f: F) -> CfResult<()>
    where
        F: FnOnce(&mut dyn Library, &mut Context) -> CfResult<()>,
    {
        let mut library = self
            .libraries
            .entries
            .get_mut(name)
            .and_then(|e| e.library.take())
            .ok_or_else(|| CfError::not_found(format!("library '{name}' is not available")))?;
        let result = f(library.as_mut(), self);
        if let Some(entry) = self.libraries.entries.get_mut(name) {
            entry.library = Some(library);
        }
        result
    }

    fn set_initiated(&mut self, name: &str, initiated: bool) {
        let Some(entry) = self.libraries.entries.get_mut(name) else {
            return;
        };
        entry.initiated = initiated;
        let mirror = entry.mirror;
        if let Ok(properties) = self.tree.properties_mut(mirror) {
            properties.set("initiated", initiated);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Recorder;
    use crate::Group;

    struct Tracked {
        name: &'static str,
        log: Recorder,
        fail_initiate: bool,
    }

    impl Library for Tracked {
        fn name(&self) -> &'static str {
            self.name
        }

        fn register(&self, ctx: &mut Context) -> CfResult<()> {
            self.log.push(&format!("register {}", self.name));
            ctx.regist_builder::<Group, Group>(self.name).map(|_| ())
        }

        fn initiate(&mut self, _: &mut Context) -> CfResult<()> {
            self.log.push(&format!("initiate {}", self.name));
            if self.fail_initiate {
                return Err(CfError::SetupError("not ready".into()));
            }
            Ok(())
        }

        fn terminate(&mut self, _: &mut Context) -> CfResult<()> {
            self.log.push(&format!("terminate {}", self.name));
            Ok(())
        }
    }

    fn tracked(name: &'static str, log: &Recorder) -> Box<dyn Library> {
        Box::new(Tracked {
            name,
            log: log.clone(),
            fail_initiate: false,
        })
    }

    #[test]
    fn lifecycle_runs_in_order_and_reverse() {
        let mut ctx = Context::new();
        let log = Recorder::new();
        ctx.regist_library(tracked("a", &log)).expect("a registers");
        let second = Box::new(Tracked {
            name: "b",
            log: log.clone(),
            fail_initiate: false,
        });
        assert!(matches!(
            ctx.regist_library(second),
            Err(CfError::ValueExists(_))
        ), "second library registers the same Group builder");

        ctx.initiate_all_libraries().expect("initiate");
        ctx.initiate_all_libraries().expect("idempotent");
        ctx.terminate_all_libraries().expect("terminate");

        assert_eq!(
            log.entries(),
            vec!["register a", "register b", "initiate a", "terminate a"]
        );
        assert!(!ctx.has_library("b"));
        let root = ctx.root();
        assert!(ctx.tree.resolve(root, "/Libraries/b").is_err(), "no mirror for b");
        assert!(ctx.tree.resolve(root, "/Libraries/a").is_ok());
    }

    #[test]
    fn invalid_library_name_is_rejected_before_register() {
        let mut ctx = Context::new();
        let log = Recorder::new();
        let err = ctx
            .regist_library(tracked("bad/name", &log))
            .expect_err("not a path segment");
        assert!(matches!(err, CfError::BadValue(_)));
        assert!(log.entries().is_empty(), "register never ran");
        assert!(!ctx.has_library("bad/name"));
    }

    #[test]
    fn terminate_reverses_registration_order() {
        let mut ctx = Context::new();
        let log = Recorder::new();
        for name in ["x", "y"] {
            let library = Box::new(Quiet {
                name,
                log: log.clone(),
            });
            ctx.regist_library(library).expect("registers");
        }
        ctx.initiate_all_libraries().expect("initiate");
        assert!(ctx.is_library_initiated("y"));
        let mirror = ctx.tree.resolve(ctx.tree.root(), "/Libraries/y").expect("mirrored");
        assert!(ctx
            .tree
            .properties(mirror)
            .expect("live")
            .value::<bool>("initiated")
            .expect("tracked"));

        ctx.terminate_all_libraries().expect("terminate");
        assert_eq!(
            log.entries(),
            vec!["initiate x", "initiate y", "terminate y", "terminate x"]
        );
        assert_eq!(ctx.library_names().collect::<Vec<_>>(), vec!["x", "y"]);
    }

    #[test]
    fn failed_initiate_leaves_library_uninitiated() {
        let mut ctx = Context::new();
        let log = Recorder::new();
        ctx.regist_library(Box::new(Tracked {
            name: "flaky",
            log: log.clone(),
            fail_initiate: true,
        }))
        .expect("registers");
        let err = ctx.initiate_all_libraries().expect_err("initiate fails");
        assert!(matches!(err, CfError::SetupError(_)));
        assert!(!ctx.is_library_initiated("flaky"));
        assert!(ctx.has_library("flaky"));
    }

    #[test]
    fn failed_initiate_rolls_back_earlier_libraries() {
        let mut ctx = Context::new();
        let log = Recorder::new();
        for name in ["first", "second"] {
            ctx.regist_library(Box::new(Quiet {
                name,
                log: log.clone(),
            }))
            .expect("registers");
        }
        ctx.regist_library(Box::new(Tracked {
            name: "flaky",
            log: log.clone(),
            fail_initiate: true,
        }))
        .expect("registers");

        ctx.initiate_all_libraries().expect_err("flaky fails");
        assert_eq!(
            log.entries(),
            vec![
                "register flaky",
                "initiate first",
                "initiate second",
                "initiate flaky",
                "terminate second",
                "terminate first",
            ]
        );
        assert!(!ctx.is_library_initiated("first"));
        assert!(!ctx.is_library_initiated("second"));
    }

    struct Quiet {
        name: &'static str,
        log: Recorder,
    }

    impl Library for Quiet {
        fn name(&self) -> &'static str {
            self.name
        }

        fn initiate(&mut self, _: &mut Context) -> CfResult<()> {
            self.log.push(&format!("initiate {}", self.name));
            Ok(())
        }

        fn terminate(&mut self, _: &mut Context) -> CfResult<()> {
            self.log.push(&format!("terminate {}", self.name));
            Ok(())
        }
    }

    #[test]
    fn mirror_is_a_library_node() {
        let mut ctx = Context::new();
        let handle = ctx
            .regist_library(Box::new(Quiet {
                name: "solo",
                log: Recorder::new(),
            }))
            .expect("registers");
        assert_eq!(ctx.tree.type_name(handle), Some(LibraryNode::TYPE_NAME));
        assert_eq!(
            ctx.tree.uri(handle).expect("live").to_string(),
            "cpath:/Libraries/solo"
        );
        assert!(ctx.tree.is_static(handle));
        assert!(!ctx.tree.cast::<LibraryNode>(handle).is_unbound());
    }
}
