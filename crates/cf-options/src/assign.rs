//! Textual `name:type=value` assignments.
//!
//! Used by command lines (`cf3 call ... cfl:real=0.9`) and by
//! `Core::initiate` arguments. The type part is optional when the target
//! option already exists:
//!
//! ```text
//! max_iteration:integer=5
//! regions:array[string]=inlet,outlet
//! log_level=debug
//! ```

use crate::OptionList;
use cf_types::{CfError, CfResult, Value, ValueType};
use std::fmt;
use std::str::FromStr;

/// A parsed `name[:type]=value` assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// Option name.
    pub name: String,
    /// Declared type, if given.
    pub value_type: Option<ValueType>,
    /// Unparsed value text.
    pub text: String,
}

impl Assignment {
    /// Parses an assignment.
    ///
    /// # Errors
    ///
    /// [`CfError::BadValue`] if `=` is missing, the name is empty, or the
    /// type is unknown.
    pub fn parse(input: &str) -> CfResult<Self> {
        let (lhs, text) = input.split_once('=').ok_or_else(|| {
            CfError::bad_value(format!("assignment '{input}' must have the form name:type=value"))
        })?;

        let (name, value_type) = match lhs.split_once(':') {
            Some((name, ty)) => (name.trim(), Some(ty.trim().parse::<ValueType>()?)),
            None => (lhs.trim(), None),
        };

        if name.is_empty() {
            return Err(CfError::bad_value(format!("assignment '{input}' has no name")));
        }

        Ok(Self {
            name: name.to_string(),
            value_type,
            text: text.to_string(),
        })
    }

    /// Parses every argument of a list.
    ///
    /// # Errors
    ///
    /// The first parse failure.
    pub fn parse_all<I, S>(inputs: I) -> CfResult<Vec<Self>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        inputs.into_iter().map(|s| Self::parse(s.as_ref())).collect()
    }

    /// Parses the value text as the declared type.
    ///
    /// # Errors
    ///
    /// [`CfError::BadValue`] if no type was given or the text does not parse.
    pub fn value(&self) -> CfResult<Value> {
        let ty = self.value_type.ok_or_else(|| {
            CfError::bad_value(format!("assignment to '{}' needs a type", self.name))
        })?;
        Value::parse_as(ty, &self.text)
    }

    /// Applies the assignment to an existing option of `options`.
    ///
    /// Without a type, the text is parsed as the option's declared type.
    ///
    /// # Errors
    ///
    /// Same as [`OptionList::set`].
    pub fn apply_to(&self, options: &mut OptionList) -> CfResult<()> {
        match self.value_type {
            Some(_) => options.set(&self.name, self.value()?),
            None => options.set_from_str(&self.name, &self.text),
        }
    }
}

impl FromStr for Assignment {
    type Err = CfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value_type {
            Some(ty) => write!(f, "{}:{ty}={}", self.name, self.text),
            None => write!(f, "{}={}", self.name, self.text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_typed_assignment() {
        let a = Assignment::parse("max_iteration:integer=5").expect("valid assignment");
        assert_eq!(a.name, "max_iteration");
        assert_eq!(a.value_type, Some(ValueType::Integer));
        assert_eq!(a.value().expect("parses"), Value::Integer(5));
    }

    #[test]
    fn parse_array_assignment() {
        let a: Assignment = "regions:array[string]=inlet,outlet".parse().expect("valid");
        assert_eq!(
            a.value().expect("parses"),
            Value::StringArray(vec!["inlet".into(), "outlet".into()])
        );
    }

    #[test]
    fn value_may_contain_equals_and_colons() {
        let a = Assignment::parse("target:uri=cpath:/a=b").expect("valid");
        assert_eq!(a.text, "cpath:/a=b");
    }

    #[test]
    fn parse_errors() {
        for bad in ["noequals", "=5", ":integer=5", "x:float=1"] {
            let err = Assignment::parse(bad).expect_err("invalid assignment");
            assert!(matches!(err, CfError::BadValue(_)), "{bad}: {err}");
        }
    }

    #[test]
    fn untyped_assignment_uses_declared_type() {
        let mut options = OptionList::new();
        options.add("cfl", 0.5).expect("fresh name");
        Assignment::parse("cfl=0.75")
            .expect("valid")
            .apply_to(&mut options)
            .expect("applies");
        assert_eq!(options.value::<f64>("cfl").expect("real"), 0.75);

        assert!(Assignment::parse("cfl=0.75").expect("valid").value().is_err());
    }

    #[test]
    fn display_roundtrip() {
        for text in ["a:bool=true", "b=hello"] {
            assert_eq!(Assignment::parse(text).expect("valid").to_string(), text);
        }
    }
}
