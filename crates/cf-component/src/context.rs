//! The application context.
//!
//! One [`Context`] holds everything a running process shares: the tree,
//! the event bus, the factories and the libraries. It is created once and
//! passed explicitly; there are no process-wide singletons, so tests can
//! run many independent contexts side by side.
//!
//! ```text
//! Context
//! ├── tree        ComponentTree     cpath:/
//! │                                 ├── Libraries   (static, one node per library)
//! │                                 └── Factories   (static, one node per builder)
//! ├── events      EventHandler
//! ├── factories   Factories + TypeInfo
//! └── libraries   registration order, initiated flags
//! ```

use crate::library::Libraries;
use crate::{
    defaults, AnyHandle, AsHandle, Component, ComponentRef, ComponentTree, ComponentType,
    EventHandler, Factories, Group, Handle, HandleMut, Kind, Signal, SignalRegistry,
};
use cf_options::{Assignment, SignalArgs, SignalFrame};
use cf_types::{CfError, CfResult};

/// Tree node mirroring a factory under `cpath:/Factories`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FactoryNode;

impl Component for FactoryNode {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }
}

impl ComponentType for FactoryNode {
    const TYPE_NAME: &'static str = "cf3.common.Factory";
}

/// Tree node mirroring a builder under `cpath:/Factories/<base>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuilderNode;

impl Component for BuilderNode {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }
}

impl ComponentType for BuilderNode {
    const TYPE_NAME: &'static str = "cf3.common.Builder";
}

/// Shared state of a running process.
pub struct Context {
    /// The component tree.
    pub tree: ComponentTree,
    /// The event bus.
    pub events: EventHandler,
    /// Builders by type name.
    pub factories: Factories,
    pub(crate) libraries: Libraries,
    pub(crate) libraries_group: Handle<Group>,
    factories_group: Handle<Group>,
    default_signals: SignalRegistry,
}

impl Context {
    /// Creates a context with an empty tree plus the static `Libraries`
    /// and `Factories` groups.
    #[must_use]
    pub fn new() -> Self {
        let (tree, [libraries_group, factories_group]) =
            ComponentTree::with_static_groups(["Libraries", "Factories"]);

        let mut factories = Factories::new();
        factories.regist_type::<Group>();

        Self {
            tree,
            events: EventHandler::new(),
            factories,
            libraries: Libraries::default(),
            libraries_group,
            factories_group,
            default_signals: defaults::default_signals(),
        }
    }

    /// The root handle.
    #[must_use]
    pub fn root(&self) -> AnyHandle {
        self.tree.root()
    }

    /// Read-only view of a component.
    #[must_use]
    pub fn view(&self, handle: impl AsHandle) -> ComponentRef<'_> {
        self.tree.view(handle)
    }

    // ── Creation ─────────────────────────────────────────────

    /// Creates a `T` under `parent`, recording `T` in the type registry.
    ///
    /// # Errors
    ///
    /// See [`ComponentTree::add_component`].
    pub fn create_component<T: ComponentType + Default>(
        &mut self,
        parent: impl HandleMut,
        name: &str,
    ) -> CfResult<Handle<T>> {
        self.add_component(parent, T::default(), name)
    }

    /// Creates a static `T` under `parent`, recording `T` in the type
    /// registry.
    ///
    /// # Errors
    ///
    /// See [`ComponentTree::add_component`].
    pub fn create_static_component<T: ComponentType + Default>(
        &mut self,
        parent: impl HandleMut,
        name: &str,
    ) -> CfResult<Handle<T>> {
        let handle = self.tree.create_static_component::<T>(parent, name)?;
        self.record_types::<T>();
        Ok(handle)
    }

    /// Adds an already built component under `parent`, recording `T` and
    /// the types of its static children in the type registry.
    ///
    /// # Errors
    ///
    /// See [`ComponentTree::add_component`].
    pub fn add_component<T: ComponentType>(
        &mut self,
        parent: impl HandleMut,
        component: T,
        name: &str,
    ) -> CfResult<Handle<T>> {
        let handle = self.tree.add_component(parent, Box::new(component), name)?;
        self.record_types::<T>();
        Ok(handle.retag())
    }

    fn record_types<T: ComponentType>(&mut self) {
        self.factories.regist_type::<T>();
        self.record_declared_types();
    }

    fn record_declared_types(&mut self) {
        let declared = self.tree.take_declared_types();
        self.factories.record_types(declared);
    }

    /// Builds a component by type name and adds it under `parent`.
    ///
    /// # Errors
    ///
    /// - [`CfError::ValueNotFound`] if no builder is registered
    /// - [`CfError::CastingFailed`] if the type is not a `B`
    /// - insertion errors of [`ComponentTree::add_component`]
    pub fn create_by_name<B: ?Sized + Kind>(
        &mut self,
        parent: impl HandleMut,
        name: &str,
        type_name: &str,
    ) -> CfResult<Handle<B>> {
        let component = self.factories.build::<B>(type_name)?;
        let handle = self.tree.add_component(parent, component, name)?;
        self.record_declared_types();
        Ok(handle.retag())
    }

    /// Registers a builder for `T` under base `B` and mirrors it as
    /// `cpath:/Factories/<base>/<type>`.
    ///
    /// The builder and its mirror are registered together: if the mirror
    /// cannot be created, the builder is dropped again.
    ///
    /// # Errors
    ///
    /// See [`Factories::regist`]. Also [`CfError::BadValue`] if a name is
    /// not a valid path segment.
    pub fn regist_builder<T, B>(&mut self, library: &str) -> CfResult<AnyHandle>
    where
        T: ComponentType + Default,
        B: ?Sized + Kind,
    {
        let (type_name, base_name) = {
            let builder = self.factories.regist::<T, B>(library)?;
            (builder.type_name(), builder.base_name())
        };

        self.mirror_builder(type_name, base_name, library)
            .inspect_err(|_| self.factories.unregist(base_name, type_name))
    }

    fn mirror_builder(
        &mut self,
        type_name: &'static str,
        base_name: &'static str,
        library: &str,
    ) -> CfResult<AnyHandle> {
        let group = self.factories_group;
        let mut factory = self.tree.get_child(group, base_name);
        let mut created_factory = None;
        if factory.is_unbound() {
            factory = self
                .create_static_component::<FactoryNode>(group, base_name)?
                .erase();
            created_factory = Some(factory);
        }

        let node = match self.create_static_component::<BuilderNode>(factory, type_name) {
            Ok(node) => node.erase(),
            Err(e) => {
                if let Some(factory) = created_factory {
                    self.tree.release(factory);
                }
                return Err(e);
            }
        };
        self.tree
            .properties_mut(node)?
            .set("brief", format!("Builds {type_name}"))
            .set("type_name", type_name)
            .set("base_name", base_name)
            .set("library", library);
        Ok(node)
    }

    // ── Signals ──────────────────────────────────────────────

    /// The default signals every component answers.
    #[must_use]
    pub fn default_signals(&self) -> &SignalRegistry {
        &self.default_signals
    }

    /// Looks up a signal on a component, falling back to the defaults.
    ///
    /// # Errors
    ///
    /// [`CfError::ValueNotFound`] if the handle is null or the signal does
    /// not exist.
    pub fn signal(&self, handle: impl AsHandle, name: &str) -> CfResult<&Signal> {
        let own = self.tree.signals(handle)?;
        own.get(name)
            .or_else(|| self.default_signals.get(name))
            .ok_or_else(|| {
                let uri = self
                    .tree
                    .uri(handle)
                    .map_or_else(|_| "?".to_string(), |u| u.to_string());
                CfError::not_found(format!("signal '{name}' on '{uri}'"))
            })
    }

    /// Every signal a component answers: its own first, then the defaults
    /// it does not override.
    ///
    /// # Errors
    ///
    /// [`CfError::ValueNotFound`] if the handle is null.
    pub fn list_signals(&self, handle: impl AsHandle) -> CfResult<Vec<&Signal>> {
        let own = self.tree.signals(handle)?;
        Ok(own
            .iter()
            .chain(self.default_signals.iter().filter(|s| !own.contains(s.name())))
            .collect())
    }

    /// Calls a signal synchronously.
    ///
    /// `args.target` and `args.receiver` are set before the handler runs.
    /// The reply, if any, is left in `args.reply`.
    ///
    /// # Errors
    ///
    /// - [`CfError::ValueNotFound`] if the signal does not exist
    /// - [`CfError::NotImplemented`] if it has no handler
    /// - any error returned by the handler
    pub fn call_signal(
        &mut self,
        handle: impl HandleMut,
        name: &str,
        args: &mut SignalArgs,
    ) -> CfResult<()> {
        let id = self.tree.require(handle)?;
        let handler = self
            .signal(handle, name)?
            .handler()
            .cloned()
            .ok_or_else(|| CfError::NotImplemented(format!("signal '{name}' has no handler")))?;

        let receiver = self.tree.uri_of(id);
        tracing::debug!(signal = name, receiver = %receiver, "calling signal");
        args.target = name.to_string();
        args.receiver = Some(receiver);
        handler(self, Handle::from_id(id), args)
    }

    /// Builds the argument frame a signal expects, filled with defaults.
    ///
    /// # Errors
    ///
    /// [`CfError::ValueNotFound`] if the signal does not exist.
    pub fn signature(&self, handle: impl AsHandle, name: &str) -> CfResult<SignalFrame> {
        let signal = self.signal(handle, name)?;
        let mut frame = SignalFrame::new(name);
        if let Some(signature) = signal.signature() {
            signature(&mut frame);
        }
        Ok(frame)
    }

    // ── Configuration ────────────────────────────────────────

    /// Applies `name[:type]=value` strings to a component's options.
    ///
    /// # Errors
    ///
    /// Parse errors, unknown options, and option validation errors.
    pub fn configure<S: AsRef<str>>(&mut self, handle: impl HandleMut, args: &[S]) -> CfResult<()> {
        let assignments = Assignment::parse_all(args)?;
        let options = self.tree.options_mut(handle)?;
        for assignment in &assignments {
            assignment.apply_to(options)?;
        }
        Ok(())
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("tree", &self.tree)
            .field("events", &self.events)
            .field("libraries", &self.library_names().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
