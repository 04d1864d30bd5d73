//! Ordered option collections and trigger cascades.
//!
//! # Trigger Cascade
//!
//! A trigger cannot touch the list directly while it fires. Instead it
//! receives a [`TriggerScope`] that can read any option and *queue*
//! further assignments. Queued assignments run after every trigger of the
//! current pass has fired, breadth-first:
//!
//! ```text
//! set("a")  ─► pass 0: assign a, fire a's triggers ──► queue [b, c]
//!              pass 1: assign b, fire b's triggers ──► queue [d]
//!                      assign c, fire c's triggers
//!              pass 2: assign d ...
//! ```
//!
//! A chain deeper than [`OptionList::max_cascade_depth`] is rejected with
//! `BadValue`. Assignments already applied are kept.

use crate::{ConfigOption, OptionDescriptor};
use cf_types::{CfError, CfResult, FromValue, Value, ValueType};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default maximum number of nested cascade passes.
pub const DEFAULT_MAX_CASCADE_DEPTH: usize = 16;

/// View handed to a trigger while it fires.
pub struct TriggerScope<'a> {
    name: &'a str,
    value: &'a Value,
    options: &'a OptionList,
    pending: &'a mut Vec<(String, Value)>,
}

impl TriggerScope<'_> {
    /// Name of the option whose triggers are firing.
    #[must_use]
    pub fn option_name(&self) -> &str {
        self.name
    }

    /// The value just assigned.
    #[must_use]
    pub fn value(&self) -> &Value {
        self.value
    }

    /// Reads the just-assigned value as `T`.
    ///
    /// # Errors
    ///
    /// [`CfError::CastingFailed`] on a type mismatch.
    pub fn get<T: FromValue>(&self) -> CfResult<T> {
        T::from_value(self.value)
    }

    /// Read access to the whole list.
    #[must_use]
    pub fn options(&self) -> &OptionList {
        self.options
    }

    /// Queues an assignment to run after the current pass.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.pending.push((name.into(), value.into()));
    }
}

struct Pending {
    name: String,
    value: Value,
    depth: usize,
}

/// An insertion-ordered collection of [`ConfigOption`]s.
///
/// # Example
///
/// ```
/// use cf_options::OptionList;
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let mut options = OptionList::new();
/// let fired = Rc::new(Cell::new(0));
/// let counter = Rc::clone(&fired);
/// options
///     .add("max_iteration", 0i64)
///     .expect("fresh name")
///     .attach_trigger(move |_| counter.set(counter.get() + 1));
///
/// options.set("max_iteration", 5i64).expect("valid value");
/// assert_eq!(fired.get(), 1);
/// assert_eq!(options.value::<i64>("max_iteration").expect("integer"), 5);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "Vec<OptionDescriptor>", try_from = "Vec<OptionDescriptor>")]
pub struct OptionList {
    options: IndexMap<String, ConfigOption>,
    max_cascade_depth: usize,
}

impl OptionList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self {
            options: IndexMap::new(),
            max_cascade_depth: DEFAULT_MAX_CASCADE_DEPTH,
        }
    }

    /// Returns the cascade depth limit.
    #[must_use]
    pub fn max_cascade_depth(&self) -> usize {
        self.max_cascade_depth
    }

    /// Changes the cascade depth limit.
    pub fn set_max_cascade_depth(&mut self, depth: usize) {
        self.max_cascade_depth = depth;
    }

    /// Registers a new option. Its declared type is the type of `default`.
    ///
    /// Triggers attached afterwards do not fire for the default value; use
    /// [`trigger`](Self::trigger) for first-time setup.
    ///
    /// # Errors
    ///
    /// - [`CfError::BadValue`] for an empty name
    /// - [`CfError::ValueExists`] if the name is registered
    pub fn add(
        &mut self,
        name: impl Into<String>,
        default: impl Into<Value>,
    ) -> CfResult<&mut ConfigOption> {
        self.insert(ConfigOption::new(name, default))
    }

    /// Registers an option of type `ty` holding that type's zero value.
    ///
    /// # Errors
    ///
    /// Same as [`add`](Self::add).
    pub fn add_typed(
        &mut self,
        name: impl Into<String>,
        ty: ValueType,
    ) -> CfResult<&mut ConfigOption> {
        self.add(name, ty.default_value())
    }

    /// Registers an already built option.
    ///
    /// # Errors
    ///
    /// Same as [`add`](Self::add).
    pub fn insert(&mut self, option: ConfigOption) -> CfResult<&mut ConfigOption> {
        let name = option.name().to_string();
        if name.is_empty() {
            return Err(CfError::bad_value("option name must not be empty"));
        }
        if self.options.contains_key(&name) {
            return Err(CfError::ValueExists(format!("option '{name}'")));
        }
        let entry = self.options.entry(name).or_insert(option);
        Ok(entry)
    }

    /// Removes an option, returning it.
    pub fn remove(&mut self, name: &str) -> Option<ConfigOption> {
        self.options.shift_remove(name)
    }

    /// Returns `true` if the option exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.options.contains_key(name)
    }

    /// Checks that the option exists.
    ///
    /// # Errors
    ///
    /// [`CfError::ValueNotFound`] if absent.
    pub fn check(&self, name: &str) -> CfResult<()> {
        if self.contains(name) {
            Ok(())
        } else {
            Err(CfError::not_found(format!("option '{name}'")))
        }
    }

    /// Returns an option.
    #[must_use]
    pub fn option(&self, name: &str) -> Option<&ConfigOption> {
        self.options.get(name)
    }

    /// Returns an option for further configuration.
    ///
    /// # Errors
    ///
    /// [`CfError::ValueNotFound`] if absent.
    pub fn option_mut(&mut self, name: &str) -> CfResult<&mut ConfigOption> {
        self.options
            .get_mut(name)
            .ok_or_else(|| CfError::not_found(format!("option '{name}'")))
    }

    /// Returns the current value of an option.
    ///
    /// # Errors
    ///
    /// [`CfError::ValueNotFound`] if absent.
    pub fn get(&self, name: &str) -> CfResult<&Value> {
        self.options
            .get(name)
            .map(ConfigOption::value)
            .ok_or_else(|| CfError::not_found(format!("option '{name}'")))
    }

    /// Reads an option as `T`.
    ///
    /// # Errors
    ///
    /// - [`CfError::ValueNotFound`] if absent
    /// - [`CfError::CastingFailed`] if `T` does not match the declared type
    pub fn value<T: FromValue>(&self, name: &str) -> CfResult<T> {
        let option = self
            .options
            .get(name)
            .ok_or_else(|| CfError::not_found(format!("option '{name}'")))?;
        if T::TYPE != option.value_type() {
            return Err(CfError::casting(format!(
                "option '{name}' is {}, requested {}",
                option.value_type(),
                T::TYPE
            )));
        }
        T::from_value(option.value())
    }

    /// Assigns a value and runs the resulting trigger cascade.
    ///
    /// Triggers fire on every successful assignment, including one that
    /// leaves the value unchanged.
    ///
    /// # Errors
    ///
    /// - [`CfError::ValueNotFound`] if absent
    /// - [`CfError::BadValue`] for a value outside the restricted list, or a
    ///   cascade deeper than the limit
    /// - [`CfError::CastingFailed`] for a value of the wrong type
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> CfResult<()> {
        let mut queue = VecDeque::new();
        queue.push_back(Pending {
            name: name.to_string(),
            value: value.into(),
            depth: 0,
        });
        self.cascade(queue)
    }

    /// Parses `text` according to the declared type, then assigns it.
    ///
    /// # Errors
    ///
    /// Same as [`set`](Self::set); unparsable text is `BadValue`.
    pub fn set_from_str(&mut self, name: &str, text: &str) -> CfResult<()> {
        let ty = self
            .option(name)
            .map(ConfigOption::value_type)
            .ok_or_else(|| CfError::not_found(format!("option '{name}'")))?;
        let value = Value::parse_as(ty, text)?;
        self.set(name, value)
    }

    /// Assigns every option of `other` to the option of the same name.
    ///
    /// Stops at the first failure; earlier assignments are kept.
    ///
    /// # Errors
    ///
    /// Same as [`set`](Self::set).
    pub fn configure(&mut self, other: &OptionList) -> CfResult<()> {
        for option in other.iter() {
            self.set(option.name(), option.value().clone())?;
        }
        Ok(())
    }

    /// Fires the triggers of an option without changing its value.
    ///
    /// # Errors
    ///
    /// [`CfError::ValueNotFound`] if absent; cascade errors as in
    /// [`set`](Self::set).
    pub fn trigger(&mut self, name: &str) -> CfResult<()> {
        self.check(name)?;
        let mut pending = Vec::new();
        self.fire(name, &mut pending);
        self.cascade(
            pending
                .into_iter()
                .map(|(name, value)| Pending {
                    name,
                    value,
                    depth: 1,
                })
                .collect(),
        )
    }

    fn cascade(&mut self, mut queue: VecDeque<Pending>) -> CfResult<()> {
        while let Some(Pending { name, value, depth }) = queue.pop_front() {
            if depth > self.max_cascade_depth {
                tracing::warn!(
                    option = %name,
                    depth,
                    max_depth = self.max_cascade_depth,
                    "trigger cascade depth exceeded, stopping"
                );
                return Err(CfError::bad_value(format!(
                    "trigger cascade exceeded {} passes at option '{name}'",
                    self.max_cascade_depth
                )));
            }

            self.option_mut(&name)?.assign(value)?;
            tracing::trace!(option = %name, depth, "option assigned");

            let mut pending = Vec::new();
            self.fire(&name, &mut pending);
            queue.extend(pending.into_iter().map(|(name, value)| Pending {
                name,
                value,
                depth: depth + 1,
            }));
        }
        Ok(())
    }

    fn fire(&self, name: &str, pending: &mut Vec<(String, Value)>) {
        let Some(option) = self.options.get(name) else {
            return;
        };
        let triggers = option.triggers();
        let value = option.value().clone();
        let mut scope = TriggerScope {
            name,
            value: &value,
            options: self,
            pending,
        };
        for trigger in &triggers {
            trigger(&mut scope);
        }
    }

    /// Iterates over options in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ConfigOption> {
        self.options.values()
    }

    /// Iterates over option names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.options.keys().map(String::as_str)
    }

    /// Returns the number of options.
    #[must_use]
    pub fn len(&self) -> usize {
        self.options.len()
    }

    /// Returns `true` if there are no options.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Returns the serializable descriptions of all options.
    #[must_use]
    pub fn descriptors(&self) -> Vec<OptionDescriptor> {
        self.iter().map(ConfigOption::descriptor).collect()
    }
}

impl Default for OptionList {
    fn default() -> Self {
        Self::new()
    }
}

impl From<OptionList> for Vec<OptionDescriptor> {
    fn from(list: OptionList) -> Self {
        list.descriptors()
    }
}

impl TryFrom<Vec<OptionDescriptor>> for OptionList {
    type Error = CfError;

    fn try_from(descriptors: Vec<OptionDescriptor>) -> Result<Self, Self::Error> {
        let mut list = OptionList::new();
        for d in descriptors {
            list.insert(ConfigOption::try_from(d)?)?;
        }
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn counter_trigger(counter: &Rc<Cell<usize>>) -> impl Fn(&mut TriggerScope<'_>) + 'static {
        let counter = Rc::clone(counter);
        move |_| counter.set(counter.get() + 1)
    }

    #[test]
    fn add_rejects_duplicate_names() {
        let mut list = OptionList::new();
        list.add("cfl", 0.5).expect("fresh name");
        let err = list.add("cfl", 1.0).expect_err("duplicate");
        assert!(matches!(err, CfError::ValueExists(_)));
        assert!(matches!(list.add("", 1.0), Err(CfError::BadValue(_))));
    }

    #[test]
    fn lookup_misses_are_not_found() {
        let list = OptionList::new();
        assert!(matches!(list.get("x"), Err(CfError::ValueNotFound(_))));
        assert!(matches!(list.check("x"), Err(CfError::ValueNotFound(_))));
        assert!(matches!(list.value::<i64>("x"), Err(CfError::ValueNotFound(_))));
    }

    #[test]
    fn value_checks_declared_type() {
        let mut list = OptionList::new();
        list.add("steps", 10u64).expect("fresh name");
        assert_eq!(list.value::<u64>("steps").expect("unsigned"), 10);
        let err = list.value::<i64>("steps").expect_err("declared unsigned");
        assert!(matches!(err, CfError::CastingFailed(_)));
    }

    #[test]
    fn triggers_fire_per_set_in_registration_order() {
        let mut list = OptionList::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        let (first, second) = (Rc::clone(&order), Rc::clone(&order));
        list.add("max_iteration", 0i64)
            .expect("fresh name")
            .attach_trigger(move |scope| {
                first
                    .borrow_mut()
                    .push(("first", scope.get::<i64>().expect("integer option")));
            })
            .attach_trigger(move |scope| {
                second
                    .borrow_mut()
                    .push(("second", scope.get::<i64>().expect("integer option")));
            });

        list.set("max_iteration", 5i64).expect("set 5");
        list.set("max_iteration", 5i64).expect("set 5 again");
        list.set("max_iteration", 6i64).expect("set 6");

        assert_eq!(
            *order.borrow(),
            vec![
                ("first", 5),
                ("second", 5),
                ("first", 5),
                ("second", 5),
                ("first", 6),
                ("second", 6)
            ]
        );
    }

    #[test]
    fn triggers_do_not_fire_on_add_or_failed_set() {
        let mut list = OptionList::new();
        let count = Rc::new(Cell::new(0));
        list.add("mode", "a")
            .expect("fresh name")
            .restrict_to(["b"])
            .attach_trigger(counter_trigger(&count));
        assert_eq!(count.get(), 0);

        assert!(list.set("mode", "z").is_err());
        assert_eq!(count.get(), 0);

        list.trigger("mode").expect("explicit trigger");
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn cascade_runs_breadth_first() {
        let mut list = OptionList::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        for name in ["b", "c", "d"] {
            let log = Rc::clone(&log);
            list.add(name, 0i64)
                .expect("fresh name")
                .attach_trigger(move |scope| log.borrow_mut().push(scope.option_name().to_string()));
        }
        list.option_mut("b")
            .expect("registered")
            .attach_trigger(|scope| scope.set("d", 1i64));
        let log_a = Rc::clone(&log);
        list.add("a", 0i64)
            .expect("fresh name")
            .attach_trigger(move |scope| {
                log_a.borrow_mut().push("a".to_string());
                scope.set("b", 1i64);
                scope.set("c", 1i64);
            });

        list.set("a", 1i64).expect("cascade completes");
        assert_eq!(*log.borrow(), vec!["a", "b", "c", "d"]);
        assert_eq!(list.value::<i64>("d").expect("integer"), 1);
    }

    #[test]
    fn trigger_scope_reads_siblings() {
        let mut list = OptionList::new();
        list.add("dim", 2i64).expect("fresh name");
        list.add("nodes", 0i64)
            .expect("fresh name")
            .attach_trigger(|scope| {
                let dim: i64 = scope.options().value("dim").expect("dim is registered");
                let nodes = scope.get::<i64>().expect("integer option");
                scope.set("total", nodes * dim);
            });
        list.add("total", 0i64).expect("fresh name");

        list.set("nodes", 4i64).expect("cascade completes");
        assert_eq!(list.value::<i64>("total").expect("integer"), 8);
    }

    #[test]
    fn cyclic_cascade_is_rejected() {
        let mut list = OptionList::new();
        list.set_max_cascade_depth(4);
        list.add("ping", 0i64)
            .expect("fresh name")
            .attach_trigger(|scope| {
                let v = scope.get::<i64>().expect("integer option");
                scope.set("pong", v + 1);
            });
        list.add("pong", 0i64)
            .expect("fresh name")
            .attach_trigger(|scope| {
                let v = scope.get::<i64>().expect("integer option");
                scope.set("ping", v + 1);
            });

        let err = list.set("ping", 1i64).expect_err("cycle must be cut off");
        assert!(matches!(err, CfError::BadValue(_)));
        // applied passes are kept: ping=1, pong=2, ping=3, pong=4, ping=5
        assert_eq!(list.value::<i64>("ping").expect("integer"), 5);
    }

    #[test]
    fn cascade_to_unknown_option_is_not_found() {
        let mut list = OptionList::new();
        list.add("a", 0i64)
            .expect("fresh name")
            .attach_trigger(|scope| scope.set("missing", 1i64));
        let err = list.set("a", 1i64).expect_err("cascade targets a missing option");
        assert!(matches!(err, CfError::ValueNotFound(_)));
        assert_eq!(list.value::<i64>("a").expect("integer"), 1);
    }

    #[test]
    fn set_from_str_uses_declared_type() {
        let mut list = OptionList::new();
        list.add("weights", vec![1.0, 2.0]).expect("fresh name");
        list.set_from_str("weights", "0.5, 0.25").expect("parses as array[real]");
        assert_eq!(
            list.value::<Vec<f64>>("weights").expect("real array"),
            vec![0.5, 0.25]
        );
        assert!(matches!(
            list.set_from_str("weights", "a,b"),
            Err(CfError::BadValue(_))
        ));
    }

    #[test]
    fn configure_applies_matching_options() {
        let mut target = OptionList::new();
        target.add("cfl", 0.5).expect("fresh name");
        target.add("steps", 10i64).expect("fresh name");

        let mut args = OptionList::new();
        args.add("cfl", 0.9).expect("fresh name");
        target.configure(&args).expect("configure succeeds");
        assert_eq!(target.value::<f64>("cfl").expect("real"), 0.9);
        assert_eq!(target.value::<i64>("steps").expect("integer"), 10);

        args.add("unknown", true).expect("fresh name");
        assert!(matches!(
            target.configure(&args),
            Err(CfError::ValueNotFound(_))
        ));
    }

    #[test]
    fn iteration_preserves_registration_order() {
        let mut list = OptionList::new();
        for name in ["zeta", "alpha", "mid"] {
            list.add(name, true).expect("fresh name");
        }
        assert_eq!(list.names().collect::<Vec<_>>(), vec!["zeta", "alpha", "mid"]);
        list.remove("alpha");
        assert_eq!(list.names().collect::<Vec<_>>(), vec!["zeta", "mid"]);
    }

    #[test]
    fn serde_roundtrip_drops_triggers() {
        let mut list = OptionList::new();
        let count = Rc::new(Cell::new(0));
        list.add("level", "info")
            .expect("fresh name")
            .attach_trigger(counter_trigger(&count));

        let json = serde_json::to_string(&list).expect("list should serialize");
        let mut back: OptionList = serde_json::from_str(&json).expect("list should deserialize");
        assert_eq!(back.descriptors(), list.descriptors());
        back.set("level", "debug").expect("valid value");
        assert_eq!(count.get(), 0);
    }
}
