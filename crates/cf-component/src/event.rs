//! Synchronous publish/subscribe between components.
//!
//! Listeners subscribe to an event name and are called in subscription
//! order, all with the same mutable frame, so a listener sees what earlier
//! listeners wrote.
//!
//! # Listener Lifetime
//!
//! A listener registered with an owner handle is tied to that component.
//! When the owner has been removed from the tree, the listener is pruned
//! on the next raise instead of being called:
//!
//! ```text
//! connect_to_event("mesh_changed", model, f)
//! remove_component(model)
//! raise_event("mesh_changed")  → f pruned (warn), not called
//! ```
//!
//! Listeners without owner live until [`EventHandler::disconnect`].

use crate::{AnyHandle, Context};
use cf_options::SignalArgs;
use cf_types::CfResult;
use indexmap::IndexMap;
use std::fmt;
use std::rc::Rc;

/// Event callback. The handle is the listener's owner, or null.
pub type EventListener = Rc<dyn Fn(&mut Context, AnyHandle, &mut SignalArgs) -> CfResult<()>>;

/// Identifies one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

#[derive(Clone)]
struct Subscription {
    id: ListenerId,
    owner: Option<AnyHandle>,
    listener: EventListener,
}

/// The event bus of a [`Context`].
#[derive(Default)]
pub struct EventHandler {
    events: IndexMap<String, Vec<Subscription>>,
    next_id: u64,
}

impl EventHandler {
    /// Creates an empty event bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an event. Returns `false` if it already existed.
    pub fn regist_event(&mut self, name: &str) -> bool {
        if self.events.contains_key(name) {
            return false;
        }
        self.events.insert(name.to_string(), Vec::new());
        true
    }

    /// Subscribes a listener without owner.
    pub fn connect<F>(&mut self, event: &str, listener: F) -> ListenerId
    where
        F: Fn(&mut Context, &mut SignalArgs) -> CfResult<()> + 'static,
    {
        self.subscribe(event, None, Rc::new(move |ctx, _, args| listener(ctx, args)))
    }

    /// Subscribes a listener owned by a component.
    ///
    /// The listener receives the owner handle and is dropped once the owner
    /// no longer exists.
    pub fn connect_to_event<F>(&mut self, event: &str, owner: AnyHandle, listener: F) -> ListenerId
    where
        F: Fn(&mut Context, AnyHandle, &mut SignalArgs) -> CfResult<()> + 'static,
    {
        self.subscribe(event, Some(owner), Rc::new(listener))
    }

    fn subscribe(
        &mut self,
        event: &str,
        owner: Option<AnyHandle>,
        listener: EventListener,
    ) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.events
            .entry(event.to_string())
            .or_default()
            .push(Subscription {
                id,
                owner,
                listener,
            });
        tracing::debug!(event, listener = %id, "listener connected");
        id
    }

    /// Removes a subscription. Returns `true` if it existed.
    pub fn disconnect(&mut self, id: ListenerId) -> bool {
        for subscriptions in self.events.values_mut() {
            let before = subscriptions.len();
            subscriptions.retain(|s| s.id != id);
            if subscriptions.len() < before {
                return true;
            }
        }
        false
    }

    /// Removes every subscription owned by `owner`.
    ///
    /// Returns the number removed.
    pub fn disconnect_owner(&mut self, owner: AnyHandle) -> usize {
        let mut count = 0;
        for subscriptions in self.events.values_mut() {
            let before = subscriptions.len();
            subscriptions.retain(|s| s.owner != Some(owner));
            count += before - subscriptions.len();
        }
        count
    }

    /// Returns `true` if the subscription is still active.
    #[must_use]
    pub fn is_connected(&self, id: ListenerId) -> bool {
        self.events
            .values()
            .any(|subscriptions| subscriptions.iter().any(|s| s.id == id))
    }

    /// Number of listeners of an event.
    #[must_use]
    pub fn listener_count(&self, event: &str) -> usize {
        self.events.get(event).map_or(0, Vec::len)
    }

    /// Known event names, in declaration order.
    pub fn event_names(&self) -> impl Iterator<Item = &str> {
        self.events.keys().map(String::as_str)
    }

    fn snapshot(&self, event: &str) -> Vec<Subscription> {
        self.events.get(event).cloned().unwrap_or_default()
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: Vec<(&str, usize)> = self
            .events
            .iter()
            .map(|(name, subs)| (name.as_str(), subs.len()))
            .collect();
        f.debug_struct("EventHandler")
            .field("events", &counts)
            .finish()
    }
}

impl Context {
    /// Raises an event, calling every current listener in subscription
    /// order with the same frame.
    ///
    /// The listener list is taken when the raise starts: listeners
    /// connected during the raise are not called, listeners disconnected
    /// during it are skipped. Returns the number of listeners called.
    ///
    /// # Errors
    ///
    /// The first listener error stops the fan-out and is returned.
    pub fn raise_event(&mut self, event: &str, args: &mut SignalArgs) -> CfResult<usize> {
        args.target = event.to_string();
        let mut called = 0;
        for subscription in self.events.snapshot(event) {
            if !self.events.is_connected(subscription.id) {
                continue;
            }
            let owner = match subscription.owner {
                Some(owner) if self.tree.is_null(owner) => {
                    tracing::warn!(
                        event,
                        listener = %subscription.id,
                        "listener owner no longer exists, disconnecting"
                    );
                    self.events.disconnect(subscription.id);
                    continue;
                }
                Some(owner) => owner,
                None => AnyHandle::null(),
            };
            (subscription.listener)(self, owner, args)?;
            called += 1;
        }
        tracing::debug!(event, called, "event raised");
        Ok(called)
    }
}
