//! A single typed configuration option.
//!
//! An option has a declared [`ValueType`] that never changes after
//! registration. Assignments are validated against the restricted list
//! first, then coerced to the declared type (see [`Value::coerce_to`]).
//!
//! # Assignment Order
//!
//! ```text
//! set(value)
//!   1. restricted list   → BadValue if not a member
//!   2. declared type     → CastingFailed if not coercible
//!   3. store
//!   4. write links       (external Linked<T> cells)
//!   5. fire triggers     (registration order, see OptionList)
//! ```

use cf_types::{CfError, CfResult, FromValue, Value, ValueType};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::TriggerScope;

/// External storage kept in sync with an option via [`ConfigOption::link_to`].
pub type Linked<T> = Rc<RefCell<T>>;

/// Creates a [`Linked`] cell holding `value`.
pub fn linked<T>(value: T) -> Linked<T> {
    Rc::new(RefCell::new(value))
}

/// Callback fired after an option changes.
pub type Trigger = Rc<dyn Fn(&mut TriggerScope<'_>)>;

type LinkWriter = Rc<dyn Fn(&Value)>;

/// A named, typed, validated configuration value.
#[derive(Clone)]
pub struct ConfigOption {
    name: String,
    value_type: ValueType,
    value: Value,
    default: Value,
    description: String,
    pretty_name: String,
    basic: bool,
    restricted: Vec<Value>,
    triggers: Vec<Trigger>,
    links: Vec<LinkWriter>,
}

impl ConfigOption {
    /// Creates an option whose declared type is the type of `default`.
    pub fn new(name: impl Into<String>, default: impl Into<Value>) -> Self {
        let default = default.into();
        Self {
            name: name.into(),
            value_type: default.value_type(),
            value: default.clone(),
            default,
            description: String::new(),
            pretty_name: String::new(),
            basic: false,
            restricted: Vec::new(),
            triggers: Vec::new(),
            links: Vec::new(),
        }
    }

    /// Returns the option name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared type.
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Returns the current value.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Returns the registration-time default.
    #[must_use]
    pub fn default_value(&self) -> &Value {
        &self.default
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the pretty name, falling back to the option name.
    #[must_use]
    pub fn pretty_name(&self) -> &str {
        if self.pretty_name.is_empty() {
            &self.name
        } else {
            &self.pretty_name
        }
    }

    /// Returns `true` if the option is marked basic.
    #[must_use]
    pub fn is_basic(&self) -> bool {
        self.basic
    }

    /// Returns the restricted list. Empty means unrestricted.
    #[must_use]
    pub fn restricted_list(&self) -> &[Value] {
        &self.restricted
    }

    /// Returns the number of attached triggers.
    #[must_use]
    pub fn trigger_count(&self) -> usize {
        self.triggers.len()
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

    /// Marks the option as basic (shown in simplified views).
    pub fn mark_basic(&mut self) -> &mut Self {
        self.basic = true;
        self
    }

    /// Restricts the option to a list of permitted values.
    ///
    /// The default value is always a member of the list. A current value
    /// outside the list is reset to the default (written through links,
    /// triggers do not fire). Values are coerced to the declared type;
    /// uncoercible entries are skipped with a warning.
    pub fn restrict_to<I, V>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut restricted = vec![self.default.clone()];
        for candidate in values {
            match candidate.into().coerce_to(self.value_type) {
                Ok(v) if !restricted.contains(&v) => restricted.push(v),
                Ok(_) => {}
                Err(e) => tracing::warn!(
                    option = %self.name,
                    error = %e,
                    "skipping restricted value of wrong type"
                ),
            }
        }
        self.restricted = restricted;
        if !self.restricted.contains(&self.value) {
            tracing::warn!(
                option = %self.name,
                value = %self.value,
                "current value not permitted, reset to default"
            );
            self.value = self.default.clone();
            for link in &self.links {
                link(&self.value);
            }
        }
        self
    }

    /// Appends a trigger. Triggers fire in registration order on every
    /// successful assignment.
    pub fn attach_trigger<F>(&mut self, trigger: F) -> &mut Self
    where
        F: Fn(&mut TriggerScope<'_>) + 'static,
    {
        self.triggers.push(Rc::new(trigger));
        self
    }

    /// Keeps `target` synchronized with the option value.
    ///
    /// The current value is written immediately.
    ///
    /// # Errors
    ///
    /// [`CfError::CastingFailed`] if `T` does not match the declared type.
    pub fn link_to<T>(&mut self, target: &Linked<T>) -> CfResult<&mut Self>
    where
        T: FromValue + 'static,
    {
        if T::TYPE != self.value_type {
            return Err(CfError::casting(format!(
                "cannot link {} option '{}' to storage of type {}",
                self.value_type,
                self.name,
                T::TYPE
            )));
        }

        let target = Rc::clone(target);
        let name = self.name.clone();
        let writer: LinkWriter = Rc::new(move |value: &Value| {
            let Ok(v) = T::from_value(value) else {
                return;
            };
            match target.try_borrow_mut() {
                Ok(mut slot) => *slot = v,
                Err(_) => tracing::warn!(
                    option = %name,
                    "linked storage is borrowed, value not written"
                ),
            }
        });
        writer(&self.value);
        self.links.push(writer);
        Ok(self)
    }

    /// Validates, stores and writes through links. Triggers are fired by
    /// the owning list.
    pub(crate) fn assign(&mut self, value: Value) -> CfResult<()> {
        let coerced = value.clone().coerce_to(self.value_type);

        if !self.restricted.is_empty() {
            let candidate = coerced.as_ref().unwrap_or(&value);
            if !self.restricted.contains(candidate) {
                let allowed: Vec<String> = self.restricted.iter().map(Value::to_string).collect();
                return Err(CfError::bad_value(format!(
                    "'{value}' is not a permitted value of option '{}' (allowed: {})",
                    self.name,
                    allowed.join(", ")
                )));
            }
        }

        let coerced = coerced.map_err(|e| {
            CfError::casting(format!("option '{}': {}", self.name, e.message()))
        })?;

        self.value = coerced;
        for link in &self.links {
            link(&self.value);
        }
        Ok(())
    }

    pub(crate) fn triggers(&self) -> Vec<Trigger> {
        self.triggers.clone()
    }

    /// Returns the serializable description of the option.
    #[must_use]
    pub fn descriptor(&self) -> OptionDescriptor {
        OptionDescriptor {
            name: self.name.clone(),
            value_type: self.value_type,
            value: self.value.clone(),
            default: self.default.clone(),
            description: self.description.clone(),
            pretty_name: self.pretty_name.clone(),
            basic: self.basic,
            restricted: self.restricted.clone(),
        }
    }
}

impl fmt::Debug for ConfigOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigOption")
            .field("name", &self.name)
            .field("value_type", &self.value_type)
            .field("value", &self.value)
            .field("basic", &self.basic)
            .field("restricted", &self.restricted)
            .field("triggers", &self.triggers.len())
            .field("links", &self.links.len())
            .finish()
    }
}

/// Serializable view of a [`ConfigOption`].
///
/// Triggers and links are process-local and are not part of the descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionDescriptor {
    /// Option name.
    pub name: String,
    /// Declared type.
    #[serde(rename = "type")]
    pub value_type: ValueType,
    /// Current value.
    pub value: Value,
    /// Default value.
    pub default: Value,
    /// Description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Pretty name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pretty_name: String,
    /// Basic flag.
    #[serde(default)]
    pub basic: bool,
    /// Permitted values. Empty means unrestricted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub restricted: Vec<Value>,
}

impl TryFrom<OptionDescriptor> for ConfigOption {
    type Error = CfError;

    fn try_from(d: OptionDescriptor) -> Result<Self, Self::Error> {
        let mut option = ConfigOption::new(d.name, d.default.coerce_to(d.value_type)?);
        option.description = d.description;
        option.pretty_name = d.pretty_name;
        option.basic = d.basic;
        if !d.restricted.is_empty() {
            option.restrict_to(d.restricted);
        }
        option.assign(d.value)?;
        Ok(option)
    }
}
