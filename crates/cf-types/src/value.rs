//! Dynamically typed option values.
//!
//! [`Value`] is the payload of every option, property and signal argument.
//! Each value has a [`ValueType`]; conversions between types are explicit
//! and lossless (see [`Value::coerce_to`]).

use crate::{CfError, CfResult, Uri};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The declared type of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// `bool`
    Bool,
    /// `integer` (signed 64-bit)
    Integer,
    /// `unsigned` (unsigned 64-bit)
    Unsigned,
    /// `real` (64-bit float)
    Real,
    /// `string`
    String,
    /// `uri`
    Uri,
    /// `array[bool]`
    BoolArray,
    /// `array[integer]`
    IntegerArray,
    /// `array[unsigned]`
    UnsignedArray,
    /// `array[real]`
    RealArray,
    /// `array[string]`
    StringArray,
    /// `array[uri]`
    UriArray,
}

impl ValueType {
    /// All value types, scalars first.
    pub const ALL: [ValueType; 12] = [
        Self::Bool,
        Self::Integer,
        Self::Unsigned,
        Self::Real,
        Self::String,
        Self::Uri,
        Self::BoolArray,
        Self::IntegerArray,
        Self::UnsignedArray,
        Self::RealArray,
        Self::StringArray,
        Self::UriArray,
    ];

    /// Returns the textual name used in assignments and descriptors.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Integer => "integer",
            Self::Unsigned => "unsigned",
            Self::Real => "real",
            Self::String => "string",
            Self::Uri => "uri",
            Self::BoolArray => "array[bool]",
            Self::IntegerArray => "array[integer]",
            Self::UnsignedArray => "array[unsigned]",
            Self::RealArray => "array[real]",
            Self::StringArray => "array[string]",
            Self::UriArray => "array[uri]",
        }
    }

    /// Returns `true` for the `array[...]` types.
    #[must_use]
    pub fn is_array(self) -> bool {
        matches!(
            self,
            Self::BoolArray
                | Self::IntegerArray
                | Self::UnsignedArray
                | Self::RealArray
                | Self::StringArray
                | Self::UriArray
        )
    }

    /// Returns the array type whose elements are of this scalar type.
    ///
    /// Array types map to themselves.
    #[must_use]
    pub fn array_of(self) -> ValueType {
        match self {
            Self::Bool => Self::BoolArray,
            Self::Integer => Self::IntegerArray,
            Self::Unsigned => Self::UnsignedArray,
            Self::Real => Self::RealArray,
            Self::String => Self::StringArray,
            Self::Uri => Self::UriArray,
            array => array,
        }
    }

    /// Returns the element type of an array type. Scalars map to themselves.
    #[must_use]
    pub fn element(self) -> ValueType {
        match self {
            Self::BoolArray => Self::Bool,
            Self::IntegerArray => Self::Integer,
            Self::UnsignedArray => Self::Unsigned,
            Self::RealArray => Self::Real,
            Self::StringArray => Self::String,
            Self::UriArray => Self::Uri,
            scalar => scalar,
        }
    }

    /// The zero value of this type.
    #[must_use]
    pub fn default_value(self) -> Value {
        match self {
            Self::Bool => Value::Bool(false),
            Self::Integer => Value::Integer(0),
            Self::Unsigned => Value::Unsigned(0),
            Self::Real => Value::Real(0.0),
            Self::String => Value::String(String::new()),
            Self::Uri => Value::Uri(Uri::default()),
            Self::BoolArray => Value::BoolArray(Vec::new()),
            Self::IntegerArray => Value::IntegerArray(Vec::new()),
            Self::UnsignedArray => Value::UnsignedArray(Vec::new()),
            Self::RealArray => Value::RealArray(Vec::new()),
            Self::StringArray => Value::StringArray(Vec::new()),
            Self::UriArray => Value::UriArray(Vec::new()),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ValueType {
    type Err = CfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| CfError::bad_value(format!("unknown value type '{s}'")))
    }
}

/// Integers up to this magnitude convert to `f64` exactly.
const EXACT_REAL: u64 = 1 << 53;

fn int_as_real(i: i64) -> Option<f64> {
    (i.unsigned_abs() <= EXACT_REAL).then_some(i as f64)
}

fn unsigned_as_real(u: u64) -> Option<f64> {
    (u <= EXACT_REAL).then_some(u as f64)
}

/// A dynamically typed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Integer(i64),
    /// Unsigned integer.
    Unsigned(u64),
    /// Floating point.
    Real(f64),
    /// Text.
    String(String),
    /// URI.
    Uri(Uri),
    /// Array of booleans.
    BoolArray(Vec<bool>),
    /// Array of signed integers.
    IntegerArray(Vec<i64>),
    /// Array of unsigned integers.
    UnsignedArray(Vec<u64>),
    /// Array of floats.
    RealArray(Vec<f64>),
    /// Array of strings.
    StringArray(Vec<String>),
    /// Array of URIs.
    UriArray(Vec<Uri>),
}

impl Value {
    /// Returns the type of this value.
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Bool(_) => ValueType::Bool,
            Self::Integer(_) => ValueType::Integer,
            Self::Unsigned(_) => ValueType::Unsigned,
            Self::Real(_) => ValueType::Real,
            Self::String(_) => ValueType::String,
            Self::Uri(_) => ValueType::Uri,
            Self::BoolArray(_) => ValueType::BoolArray,
            Self::IntegerArray(_) => ValueType::IntegerArray,
            Self::UnsignedArray(_) => ValueType::UnsignedArray,
            Self::RealArray(_) => ValueType::RealArray,
            Self::StringArray(_) => ValueType::StringArray,
            Self::UriArray(_) => ValueType::UriArray,
        }
    }

    /// Converts the value to `target` without losing information.
    ///
    /// Allowed conversions besides identity:
    ///
    /// - integer / unsigned → real, if the magnitude is at most 2^53
    /// - integer → unsigned, if non-negative
    /// - unsigned → integer, if it fits in `i64`
    ///
    /// The same rules apply element-wise to arrays.
    ///
    /// # Errors
    ///
    /// [`CfError::CastingFailed`] for every other combination.
    pub fn coerce_to(self, target: ValueType) -> CfResult<Value> {
        if self.value_type() == target {
            return Ok(self);
        }

        let source = self.value_type();
        let coerced = match (&self, target) {
            (Self::Integer(i), ValueType::Real) => int_as_real(*i).map(Self::Real),
            (Self::Unsigned(u), ValueType::Real) => unsigned_as_real(*u).map(Self::Real),
            (Self::Integer(i), ValueType::Unsigned) => u64::try_from(*i).ok().map(Self::Unsigned),
            (Self::Unsigned(u), ValueType::Integer) => i64::try_from(*u).ok().map(Self::Integer),
            (Self::IntegerArray(v), ValueType::RealArray) => v
                .iter()
                .map(|i| int_as_real(*i))
                .collect::<Option<Vec<_>>>()
                .map(Self::RealArray),
            (Self::UnsignedArray(v), ValueType::RealArray) => v
                .iter()
                .map(|u| unsigned_as_real(*u))
                .collect::<Option<Vec<_>>>()
                .map(Self::RealArray),
            (Self::IntegerArray(v), ValueType::UnsignedArray) => v
                .iter()
                .map(|i| u64::try_from(*i).ok())
                .collect::<Option<Vec<_>>>()
                .map(Self::UnsignedArray),
            (Self::UnsignedArray(v), ValueType::IntegerArray) => v
                .iter()
                .map(|u| i64::try_from(*u).ok())
                .collect::<Option<Vec<_>>>()
                .map(Self::IntegerArray),
            _ => None,
        };

        coerced.ok_or_else(|| {
            CfError::casting(format!("cannot convert {source} value '{self}' to {target}"))
        })
    }

    /// Parses text as a value of type `ty`.
    ///
    /// Booleans accept `true`/`false`/`1`/`0`; arrays are comma-separated.
    ///
    /// # Errors
    ///
    /// [`CfError::BadValue`] if the text does not parse.
    pub fn parse_as(ty: ValueType, text: &str) -> CfResult<Value> {
        if ty.is_array() {
            let items: Vec<&str> = if text.trim().is_empty() {
                Vec::new()
            } else {
                text.split(',').map(str::trim).collect()
            };
            let element = ty.element();
            let parsed = items
                .into_iter()
                .map(|item| Self::parse_as(element, item))
                .collect::<CfResult<Vec<_>>>()?;
            return Ok(Self::collect_array(ty, parsed));
        }

        let trimmed = text.trim();
        let invalid = || CfError::bad_value(format!("'{text}' is not a valid {ty}"));
        let value = match ty {
            ValueType::Bool => match trimmed {
                "true" | "1" => Self::Bool(true),
                "false" | "0" => Self::Bool(false),
                _ => return Err(invalid()),
            },
            ValueType::Integer => Self::Integer(trimmed.parse().map_err(|_| invalid())?),
            ValueType::Unsigned => Self::Unsigned(trimmed.parse().map_err(|_| invalid())?),
            ValueType::Real => Self::Real(trimmed.parse().map_err(|_| invalid())?),
            ValueType::String => Self::String(text.to_string()),
            ValueType::Uri => Self::Uri(Uri::parse(trimmed)?),
            _ => return Err(invalid()),
        };
        Ok(value)
    }

    /// Reassembles parsed scalars into an array value of type `ty`.
    fn collect_array(ty: ValueType, items: Vec<Value>) -> Value {
        macro_rules! gather {
            ($variant:ident, $out:ident) => {
                Value::$out(
                    items
                        .into_iter()
                        .filter_map(|v| match v {
                            Value::$variant(x) => Some(x),
                            _ => None,
                        })
                        .collect(),
                )
            };
        }
        match ty {
            ValueType::BoolArray => gather!(Bool, BoolArray),
            ValueType::IntegerArray => gather!(Integer, IntegerArray),
            ValueType::UnsignedArray => gather!(Unsigned, UnsignedArray),
            ValueType::RealArray => gather!(Real, RealArray),
            ValueType::StringArray => gather!(String, StringArray),
            _ => gather!(Uri, UriArray),
        }
    }

    /// Extracts a typed value.
    ///
    /// # Errors
    ///
    /// [`CfError::CastingFailed`] if the value is not of type `T`.
    pub fn get<T: FromValue>(&self) -> CfResult<T> {
        T::from_value(self)
    }
}

fn join_display<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Unsigned(u) => write!(f, "{u}"),
            Self::Real(r) => write!(f, "{r}"),
            Self::String(s) => f.write_str(s),
            Self::Uri(u) => write!(f, "{u}"),
            Self::BoolArray(v) => join_display(f, v),
            Self::IntegerArray(v) => join_display(f, v),
            Self::UnsignedArray(v) => join_display(f, v),
            Self::RealArray(v) => join_display(f, v),
            Self::StringArray(v) => join_display(f, v),
            Self::UriArray(v) => join_display(f, v),
        }
    }
}

/// Typed extraction from a [`Value`].
///
/// `TYPE` is the declared [`ValueType`] a Rust type reads from. Extraction
/// is strict: an `i64` reads only from `integer`, never from `unsigned`.
pub trait FromValue: Sized {
    /// The value type this Rust type corresponds to.
    const TYPE: ValueType;

    /// Extracts `Self`.
    ///
    /// # Errors
    ///
    /// [`CfError::CastingFailed`] on a type mismatch or out-of-range value.
    fn from_value(value: &Value) -> CfResult<Self>;
}

fn mismatch(value: &Value, wanted: &str) -> CfError {
    CfError::casting(format!(
        "{} value '{value}' cannot be read as {wanted}",
        value.value_type()
    ))
}

macro_rules! impl_value_conversions {
    ($($rust:ty => $variant:ident / $ty:ident),* $(,)?) => {
        $(
            impl FromValue for $rust {
                const TYPE: ValueType = ValueType::$ty;

                fn from_value(value: &Value) -> CfResult<Self> {
                    match value {
                        Value::$variant(v) => Ok(v.clone()),
                        other => Err(mismatch(other, stringify!($rust))),
                    }
                }
            }

            impl From<$rust> for Value {
                fn from(v: $rust) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_value_conversions! {
    bool => Bool / Bool,
    i64 => Integer / Integer,
    u64 => Unsigned / Unsigned,
    f64 => Real / Real,
    String => String / String,
    Uri => Uri / Uri,
    Vec<bool> => BoolArray / BoolArray,
    Vec<i64> => IntegerArray / IntegerArray,
    Vec<u64> => UnsignedArray / UnsignedArray,
    Vec<f64> => RealArray / RealArray,
    Vec<String> => StringArray / StringArray,
    Vec<Uri> => UriArray / UriArray,
}

macro_rules! impl_narrow_integer {
    ($($rust:ty => $variant:ident / $wide:ty),* $(,)?) => {
        $(
            impl FromValue for $rust {
                const TYPE: ValueType = ValueType::$variant;

                fn from_value(value: &Value) -> CfResult<Self> {
                    match value {
                        Value::$variant(v) => <$rust>::try_from(*v)
                            .map_err(|_| mismatch(value, stringify!($rust))),
                        other => Err(mismatch(other, stringify!($rust))),
                    }
                }
            }

            impl From<$rust> for Value {
                fn from(v: $rust) -> Self {
                    Value::$variant(<$wide>::from(v))
                }
            }
        )*
    };
}

impl_narrow_integer! {
    i32 => Integer / i64,
    u32 => Unsigned / u64,
}

impl FromValue for usize {
    const TYPE: ValueType = ValueType::Unsigned;

    fn from_value(value: &Value) -> CfResult<Self> {
        match value {
            Value::Unsigned(v) => usize::try_from(*v).map_err(|_| mismatch(value, "usize")),
            other => Err(mismatch(other, "usize")),
        }
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        // usize is at most 64 bits on every supported target
        Value::Unsigned(v as u64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Vec<&str>> for Value {
    fn from(v: Vec<&str>) -> Self {
        Value::StringArray(v.into_iter().map(str::to_string).collect())
    }
}
