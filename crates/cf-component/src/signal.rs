//! Named, invocable operations on components.
//!
//! A [`Signal`] binds a handler to a name on one node. Handlers receive the
//! whole [`Context`] so they can restructure the tree, build components by
//! name or raise events. The handler is cloned out of the node before it
//! runs, so a handler may even delete its own component.
//!
//! # Dispatch
//!
//! ```text
//! Context::call_signal(handle, "rename_component", args)
//!     │
//!     ├─ node signal registry ──► found? ─┐
//!     ├─ default signals ───────► found? ─┤
//!     │                                   ▼
//!     │                          handler present? ── no ──► NotImplemented
//!     ▼                                   │ yes
//! ValueNotFound                handler(ctx, handle, args)
//! ```

use crate::{AnyHandle, ComponentType, Context};
use cf_options::SignalArgs;
use cf_types::CfResult;
use indexmap::IndexMap;
use std::fmt;
use std::rc::Rc;

/// Signal handler.
pub type SignalHandler = Rc<dyn Fn(&mut Context, AnyHandle, &mut SignalArgs) -> CfResult<()>>;

/// Fills a frame with the arguments a signal expects.
pub type Signature = Rc<dyn Fn(&mut SignalArgs)>;

/// A registered signal.
#[derive(Clone)]
pub struct Signal {
    name: String,
    description: String,
    pretty_name: String,
    hidden: bool,
    read_only: bool,
    handler: Option<SignalHandler>,
    signature: Option<Signature>,
}

impl Signal {
    /// Creates a signal without a handler.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            pretty_name: String::new(),
            hidden: false,
            read_only: false,
            handler: None,
            signature: None,
        }
    }

    /// Signal name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Pretty name, falling back to the name.
    #[must_use]
    pub fn pretty_name(&self) -> &str {
        if self.pretty_name.is_empty() {
            &self.name
        } else {
            &self.pretty_name
        }
    }

    /// Hidden signals are callable but not listed.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Read-only signals do not modify the tree.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Returns the handler, if any.
    #[must_use]
    pub fn handler(&self) -> Option<&SignalHandler> {
        self.handler.as_ref()
    }

    /// Returns the signature, if any.
    #[must_use]
    pub fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    /// Sets the description.
    pub fn with_description(&mut self, text: impl Into<String>) -> &mut Self {
        self.description = text.into();
        self
    }

    /// Sets the pretty name.
    pub fn with_pretty_name(&mut self, text: impl Into<String>) -> &mut Self {
        self.pretty_name = text.into();
        self
    }

    /// Hides the signal from listings.
    pub fn hidden(&mut self) -> &mut Self {
        self.hidden = true;
        self
    }

    /// Marks the signal read-only.
    pub fn read_only(&mut self) -> &mut Self {
        self.read_only = true;
        self
    }

    /// Binds the handler.
    pub fn connect<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&mut Context, AnyHandle, &mut SignalArgs) -> CfResult<()> + 'static,
    {
        self.handler = Some(Rc::new(handler));
        self
    }

    /// Binds a handler that works on the receiving component's own state.
    ///
    /// Fails with `CastingFailed` at call time if the receiver is not a `T`.
    pub fn connect_for<T, F>(&mut self, handler: F) -> &mut Self
    where
        T: ComponentType,
        F: Fn(&mut T, &mut SignalArgs) -> CfResult<()> + 'static,
    {
        self.connect(move |ctx, this, args| {
            let component = ctx.tree.as_type_mut::<T>(this)?;
            handler(component, args)
        })
    }

    /// Binds the signature.
    pub fn with_signature<F>(&mut self, signature: F) -> &mut Self
    where
        F: Fn(&mut SignalArgs) + 'static,
    {
        self.signature = Some(Rc::new(signature));
        self
    }
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("name", &self.name)
            .field("hidden", &self.hidden)
            .field("read_only", &self.read_only)
            .field("has_handler", &self.handler.is_some())
            .field("has_signature", &self.signature.is_some())
            .finish()
    }
}

/// Signals of one node, in registration order.
#[derive(Debug, Clone, Default)]
pub struct SignalRegistry {
    signals: IndexMap<String, Signal>,
}

impl SignalRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a signal, or returns the existing one of that name.
    pub fn regist_signal(&mut self, name: &str) -> &mut Signal {
        self.signals
            .entry(name.to_string())
            .or_insert_with(|| Signal::new(name))
    }

    /// Removes a signal.
    pub fn unregist_signal(&mut self, name: &str) -> Option<Signal> {
        self.signals.shift_remove(name)
    }

    /// Looks up a signal.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Signal> {
        self.signals.get(name)
    }

    /// Returns `true` if the signal is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.signals.contains_key(name)
    }

    /// Iterates in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Signal> {
        self.signals.values()
    }

    /// Number of signals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    /// Returns `true` if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}
