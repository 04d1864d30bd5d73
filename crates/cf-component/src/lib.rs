//! Component tree, signals, events and registries for the cf3 runtime.
//!
//! # Crate Architecture
//!
//! This crate is the **Core** layer:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        SDK Layer                            │
//! │  cf-types     : CfError, ErrorCode, Uri, Value              │
//! │  cf-options   : ConfigOption, OptionList, SignalFrame       │
//! ├─────────────────────────────────────────────────────────────┤
//! │                        Core Layer                           │
//! │  cf-component : ComponentTree, Handle, Context     ◄── HERE │
//! ├─────────────────────────────────────────────────────────────┤
//! │                       Runtime Layer                         │
//! │  cf-runtime   : Core lifecycle, Environment, config         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Ownership Model
//!
//! The tree is an arena. A parent owns its children; everything else
//! refers to components through [`Handle`]s, which go null when their
//! component is destroyed. A [`Link`] is a node holding such a handle.
//!
//! ```text
//! Context
//!   │
//!   ├── tree: ComponentTree ── slots[ Node { component, options, signals, .. } ]
//!   │                                  ▲
//!   │                                  │ NodeId { index, generation }
//!   │                                  │
//!   │             Handle<T> ───────────┘  (non-owning, liveness-checked)
//!   │
//!   ├── events: EventHandler    name → [listener, ...]
//!   └── factories: Factories    base → type name → builder
//! ```
//!
//! # Core Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Component`] | Payload of a tree node, declares options and signals |
//! | [`ComponentTree`] | Arena, structure, navigation, typed access |
//! | [`Handle`] / [`ConstHandle`] | Non-owning typed references |
//! | [`Signal`] | Named operation invoked with a [`SignalArgs`](cf_options::SignalArgs) |
//! | [`EventHandler`] | Synchronous publish/subscribe |
//! | [`Factories`] | Build components from a type name |
//! | [`Library`] | Plugin unit with initiate/terminate |
//! | [`Context`] | Everything above, passed explicitly |
//!
//! # Example
//!
//! ```
//! use cf_component::{Context, Group};
//!
//! let mut ctx = Context::new();
//! let root = ctx.root();
//! let world = ctx.create_component::<Group>(root, "World").expect("valid name");
//! let europe = ctx.create_component::<Group>(world, "Europe").expect("valid name");
//!
//! assert_eq!(ctx.tree.uri(europe).expect("live").to_string(), "cpath:/World/Europe");
//! assert_eq!(ctx.tree.resolve(root, "World/Europe").expect("resolves"), europe);
//!
//! ctx.tree.remove_component(world).expect("not static");
//! assert!(ctx.tree.is_null(europe));
//! ```

mod component;
mod context;
mod defaults;
mod event;
mod factory;
mod group;
mod handle;
mod iter;
mod library;
mod link;
mod properties;
mod signal;
mod tree;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use component::{Component, ComponentFlags, ComponentType, Declaration};
pub use context::{BuilderNode, Context, FactoryNode};
pub use event::{EventHandler, EventListener, ListenerId};
pub use factory::{Builder, Factories, Factory, RegistrationState, TypeEntry, TypeInfo};
pub use group::{Group, Root};
pub use handle::{AnyHandle, AsHandle, ConstHandle, ErasedOf, Handle, HandleMut, Kind, NodeId};
pub use iter::{ComponentRef, Descendants};
pub use library::{Library, LibraryNode};
pub use link::Link;
pub use properties::Properties;
pub use signal::{Signal, SignalHandler, SignalRegistry, Signature};
pub use tree::{validate_name, AttachError, ComponentTree, Detached};
