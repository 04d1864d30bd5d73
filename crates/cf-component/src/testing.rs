//! Test helpers for code built on the component runtime.
//!
//! Enabled in this crate's tests and, for dependents, through the
//! `test-utils` feature.
//!
//! # Recording call order
//!
//! ```ignore
//! use cf_component::testing::Recorder;
//! use cf_component::Context;
//! use cf_options::SignalArgs;
//!
//! let mut ctx = Context::new();
//! let recorder = Recorder::new();
//! ctx.events.connect("X", recorder.listener("a"));
//! ctx.events.connect("X", recorder.listener("b"));
//!
//! ctx.raise_event("X", &mut SignalArgs::default()).expect("raise should succeed");
//! assert_eq!(recorder.entries(), vec!["a", "b"]);
//! ```

use crate::{Component, ComponentType, Context, Declaration};
use cf_options::{Linked, SignalArgs, TriggerScope};
use cf_types::CfResult;
use std::cell::RefCell;
use std::rc::Rc;

/// Shared, ordered log of labels.
///
/// Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    entries: Rc<RefCell<Vec<String>>>,
}

impl Recorder {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a label.
    pub fn push(&self, label: &str) {
        self.entries.borrow_mut().push(label.to_string());
    }

    /// A copy of the log.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }

    /// Number of entries.
    #[must_use]
    pub fn count(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Empties the log.
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    /// An option trigger that logs `label=<value>`.
    pub fn trigger(&self, label: &str) -> impl Fn(&mut TriggerScope<'_>) + 'static {
        let recorder = self.clone();
        let label = label.to_string();
        move |scope: &mut TriggerScope<'_>| {
            recorder.push(&format!("{label}={}", scope.value()));
        }
    }

    /// An event listener that logs `label`.
    pub fn listener(
        &self,
        label: &str,
    ) -> impl Fn(&mut Context, &mut SignalArgs) -> CfResult<()> + 'static {
        let recorder = self.clone();
        let label = label.to_string();
        move |_: &mut Context, _: &mut SignalArgs| {
            recorder.push(&label);
            Ok(())
        }
    }
}

/// A component with one linked option and one signal.
///
/// - option `level: integer`, linked to [`Gauge::level`]
/// - signal `poke`, replying with the number of pokes so far
#[derive(Debug, Default)]
pub struct Gauge {
    level: Linked<i64>,
    pokes: i64,
}

impl Gauge {
    /// Current value of the `level` option, read through the link.
    #[must_use]
    pub fn level(&self) -> i64 {
        *self.level.borrow()
    }

    /// Number of times `poke` was called.
    #[must_use]
    pub fn pokes(&self) -> i64 {
        self.pokes
    }
}

impl Component for Gauge {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn declare(&self, decl: &mut Declaration<'_>) -> CfResult<()> {
        decl.options()
            .add("level", 0i64)?
            .with_description("Gauge level")
            .mark_basic()
            .link_to(&self.level)?;
        decl.signals()
            .regist_signal("poke")
            .with_description("Count a poke")
            .connect_for::<Gauge, _>(|gauge, args| {
                gauge.pokes += 1;
                args.create_reply().set("pokes", gauge.pokes);
                Ok(())
            });
        decl.add_tag("gauge");
        Ok(())
    }
}

impl ComponentType for Gauge {
    const TYPE_NAME: &'static str = "cf3.testing.Gauge";
}
