//! Options and signal frames for the cf3 component runtime.
//!
//! # Crate Architecture
//!
//! This crate is part of the **SDK** layer:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        SDK Layer                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  cf-types     : CfError, ErrorCode, Uri, Value              │
//! │  cf-options   : ConfigOption, OptionList, SignalFrame ◄ HERE│
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Types
//!
//! | Type | Role |
//! |------|------|
//! | [`ConfigOption`] | One typed value with validation, links and triggers |
//! | [`OptionList`] | Ordered options of one component, runs trigger cascades |
//! | [`TriggerScope`] | What a trigger sees while it fires |
//! | [`SignalFrame`] | Arguments and reply of a signal or event |
//! | [`Assignment`] | Parsed `name:type=value` text |
//!
//! # Trigger Policy
//!
//! Triggers fire on every successful assignment, never on registration.
//! Code that needs first-time setup calls [`OptionList::trigger`]
//! explicitly once all options are registered.

mod assign;
mod frame;
mod list;
mod option;

pub use assign::Assignment;
pub use frame::{SignalArgs, SignalFrame};
pub use list::{OptionList, TriggerScope, DEFAULT_MAX_CASCADE_DEPTH};
pub use option::{linked, ConfigOption, Linked, OptionDescriptor, Trigger};
