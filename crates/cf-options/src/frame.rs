//! Signal argument frames.
//!
//! A [`SignalFrame`] is the payload of every signal invocation and event.
//! Its arguments are an [`OptionList`], so they are typed and
//! self-describing. A handler may attach a reply frame.
//!
//! # Example
//!
//! ```
//! use cf_options::SignalFrame;
//! use cf_types::Uri;
//!
//! let mut frame = SignalFrame::new("create_component");
//! frame.set("name", "Mesher");
//! frame.set("atype", "cf3.common.Group");
//!
//! let reply = frame.create_reply();
//! reply.set("created_component", Uri::cpath("/Tools/Mesher"));
//!
//! assert_eq!(frame.get::<String>("name").expect("string arg"), "Mesher");
//! assert!(frame.reply().is_some());
//! ```

use crate::{Assignment, ConfigOption, OptionList};
use cf_types::{CfError, CfResult, FromValue, Uri, Value};
use serde::{Deserialize, Serialize};

/// Arguments passed to a signal handler.
pub type SignalArgs = SignalFrame;

/// A structured, serializable bag of named arguments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignalFrame {
    /// Name of the signal (or event) this frame is addressed to.
    pub target: String,
    /// Component that sent the frame.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<Uri>,
    /// Component that receives the frame.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<Uri>,
    /// Arguments.
    #[serde(default)]
    pub options: OptionList,
    /// Reply populated by the handler.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<Box<SignalFrame>>,
}

impl SignalFrame {
    /// Creates an empty frame addressed to `target`.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Self::default()
        }
    }

    /// Sets the sender and receiver.
    #[must_use]
    pub fn routed(mut self, sender: Option<Uri>, receiver: Option<Uri>) -> Self {
        self.sender = sender;
        self.receiver = receiver;
        self
    }

    /// Sets an argument, replacing any previous argument of the same name
    /// (including its type).
    ///
    /// Chainable and panic-free: an argument the frame cannot hold (an
    /// empty name) is logged and skipped. Use [`try_set`](Self::try_set)
    /// when the name comes from outside.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        if let Err(e) = self.try_set(name, value) {
            tracing::warn!(argument = name, error = %e, "frame argument not stored");
        }
        self
    }

    /// Sets an argument like [`set`](Self::set), reporting failures.
    ///
    /// # Errors
    ///
    /// [`CfError::BadValue`] for an empty name. The frame is unchanged.
    pub fn try_set(&mut self, name: &str, value: impl Into<Value>) -> CfResult<&mut Self> {
        let value = value.into();
        let existing = self.options.option(name).map(ConfigOption::value_type);
        match existing {
            Some(ty) if ty == value.value_type() => self.options.set(name, value)?,
            Some(_) => {
                self.options.remove(name);
                self.options.add(name, value)?;
            }
            None => {
                self.options.add(name, value)?;
            }
        }
        Ok(self)
    }

    /// Returns `true` if the frame carries the argument.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.options.contains(name)
    }

    /// Returns an argument value.
    ///
    /// # Errors
    ///
    /// [`CfError::ValueNotFound`] if absent.
    pub fn value(&self, name: &str) -> CfResult<&Value> {
        self.options.get(name)
    }

    /// Reads an argument as `T`.
    ///
    /// # Errors
    ///
    /// - [`CfError::ValueNotFound`] if absent
    /// - [`CfError::CastingFailed`] if the argument is not a `T`
    pub fn get<T: FromValue>(&self, name: &str) -> CfResult<T> {
        self.options.value(name)
    }

    /// Reads an optional argument, falling back to `default` if absent.
    ///
    /// # Errors
    ///
    /// [`CfError::CastingFailed`] if the argument is present but not a `T`.
    pub fn get_or<T: FromValue>(&self, name: &str, default: T) -> CfResult<T> {
        if self.contains(name) {
            self.get(name)
        } else {
            Ok(default)
        }
    }

    /// Applies `name:type=value` assignments as arguments.
    ///
    /// # Errors
    ///
    /// [`CfError::BadValue`] for untyped or unparsable assignments.
    pub fn apply_assignments(&mut self, assignments: &[Assignment]) -> CfResult<()> {
        for assignment in assignments {
            let value = assignment.value()?;
            self.try_set(&assignment.name, value)?;
        }
        Ok(())
    }

    /// Creates (or replaces) the reply frame and returns it.
    ///
    /// The reply targets the same signal with sender and receiver swapped.
    pub fn create_reply(&mut self) -> &mut SignalFrame {
        let reply = SignalFrame::new(self.target.clone())
            .routed(self.receiver.clone(), self.sender.clone());
        self.reply.insert(Box::new(reply))
    }

    /// Returns the reply frame, if a handler created one.
    #[must_use]
    pub fn reply(&self) -> Option<&SignalFrame> {
        self.reply.as_deref()
    }

    /// Takes the reply frame out.
    pub fn take_reply(&mut self) -> Option<SignalFrame> {
        self.reply.take().map(|r| *r)
    }

    /// Serializes the frame to JSON.
    ///
    /// # Errors
    ///
    /// [`CfError::BadValue`] if serialization fails.
    pub fn to_json(&self) -> CfResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CfError::bad_value(format!("frame serialization failed: {e}")))
    }

    /// Parses a frame from JSON.
    ///
    /// # Errors
    ///
    /// [`CfError::BadValue`] if the text is not a valid frame.
    pub fn from_json(text: &str) -> CfResult<Self> {
        serde_json::from_str(text)
            .map_err(|e| CfError::bad_value(format!("invalid signal frame: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_types::ValueType;

    #[test]
    fn set_adds_then_overwrites() {
        let mut frame = SignalFrame::new("configure");
        frame.set("cfl", 0.5).set("steps", 3i64);
        frame.set("cfl", 0.9);
        assert_eq!(frame.get::<f64>("cfl").expect("real"), 0.9);
        assert_eq!(frame.options.names().collect::<Vec<_>>(), vec!["cfl", "steps"]);
    }

    #[test]
    fn invalid_argument_name_is_reported() {
        let mut frame = SignalFrame::new("configure");
        let err = frame.try_set("", 1i64).expect_err("empty name");
        assert!(matches!(err, CfError::BadValue(_)));
        frame.set("", 1i64).set("steps", 2i64);
        assert_eq!(frame.options.names().collect::<Vec<_>>(), vec!["steps"]);
        assert_eq!(
            frame.try_set("steps", 3i64).expect("valid").get::<i64>("steps").expect("integer"),
            3
        );
    }

    #[test]
    fn set_with_new_type_replaces_option() {
        let mut frame = SignalFrame::new("configure");
        frame.set("x", 1i64);
        frame.set("x", "one");
        assert_eq!(
            frame.options.option("x").expect("present").value_type(),
            ValueType::String
        );
    }

    #[test]
    fn get_or_defaults_when_absent() {
        let frame = SignalFrame::new("list_tree");
        assert!(frame.get_or("recursive", true).expect("absent uses default"));
        assert!(matches!(
            frame.get::<bool>("recursive"),
            Err(CfError::ValueNotFound(_))
        ));
    }

    #[test]
    fn reply_swaps_routing() {
        let mut frame = SignalFrame::new("create_component")
            .routed(Some(Uri::cpath("/UI")), Some(Uri::cpath("/Tools")));
        frame.create_reply().set("created_component", Uri::cpath("/Tools/A"));

        let reply = frame.reply().expect("reply created");
        assert_eq!(reply.target, "create_component");
        assert_eq!(reply.sender, Some(Uri::cpath("/Tools")));
        assert_eq!(reply.receiver, Some(Uri::cpath("/UI")));
        assert_eq!(
            reply.get::<Uri>("created_component").expect("uri arg"),
            Uri::cpath("/Tools/A")
        );
    }

    #[test]
    fn assignments_become_arguments() {
        let mut frame = SignalFrame::new("configure");
        let assignments =
            Assignment::parse_all(["cfl:real=0.3", "regions:array[string]=a,b"]).expect("valid");
        frame.apply_assignments(&assignments).expect("typed assignments");
        assert_eq!(frame.get::<f64>("cfl").expect("real"), 0.3);
        assert_eq!(frame.options.len(), 2);

        let untyped = Assignment::parse_all(["cfl=0.3"]).expect("valid");
        assert!(frame.apply_assignments(&untyped).is_err());
    }

    #[test]
    fn json_roundtrip_keeps_reply() {
        let mut frame = SignalFrame::new("rename_component");
        frame.set("name", "Solver");
        frame.create_reply().set("ok", true);

        let json = frame.to_json().expect("frame should serialize");
        let back = SignalFrame::from_json(&json).expect("frame should deserialize");
        assert_eq!(back.target, "rename_component");
        assert_eq!(back.get::<String>("name").expect("string"), "Solver");
        assert!(back
            .reply()
            .expect("reply kept")
            .get::<bool>("ok")
            .expect("bool"));
    }

    #[test]
    fn from_json_rejects_garbage() {
        assert!(matches!(
            SignalFrame::from_json("{not json"),
            Err(CfError::BadValue(_))
        ));
    }
}
