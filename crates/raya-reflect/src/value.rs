//! Dynamic values carried by tags, properties and function calls

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ReflectError, ReflectResult};

/// A dynamically typed value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum Value {
    /// No value (tags declared without a value, unit returns)
    #[default]
    Nothing,
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Floating point number
    Real(f64),
    /// String
    Str(String),
}

/// Kind of a [`Value`], without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    /// [`Value::Nothing`]
    Nothing,
    /// [`Value::Bool`]
    Bool,
    /// [`Value::Int`]
    Int,
    /// [`Value::Real`]
    Real,
    /// [`Value::Str`]
    Str,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ValueKind::Nothing => "nothing",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Real => "real",
            ValueKind::Str => "string",
        };
        f.write_str(text)
    }
}

impl Value {
    /// Kind of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Nothing => ValueKind::Nothing,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Real(_) => ValueKind::Real,
            Value::Str(_) => ValueKind::Str,
        }
    }

    /// Whether this is [`Value::Nothing`]
    pub fn is_nothing(&self) -> bool {
        matches!(self, Value::Nothing)
    }

    /// Borrow the string payload
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Read as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Read as an integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Read as a real, widening integers
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(r) => Some(*r),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    fn mismatch(&self, expected: ValueKind) -> ReflectError {
        ReflectError::ValueConversion {
            expected,
            actual: self.kind(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nothing => f.write_str("nothing"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::Str(s) => f.write_str(s),
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Nothing
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f32> for Value {
    fn from(r: f32) -> Self {
        Value::Real(r as f64)
    }
}

impl From<f64> for Value {
    fn from(r: f64) -> Self {
        Value::Real(r)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

/// Native types that have a fixed [`ValueKind`]
pub trait ValueType {
    /// Kind this type maps to (`None` for [`Value`] itself, which takes any kind)
    const KIND: Option<ValueKind>;

    /// Whether a value of `kind` can be converted to this type
    fn accepts(kind: ValueKind) -> bool {
        kind_accepts(Self::KIND, kind)
    }
}

/// Whether a parameter declared as `expected` accepts a value of kind `actual`.
/// Integers widen to reals.
pub fn kind_accepts(expected: Option<ValueKind>, actual: ValueKind) -> bool {
    match expected {
        None => true,
        Some(ValueKind::Real) => matches!(actual, ValueKind::Real | ValueKind::Int),
        Some(expected) => expected == actual,
    }
}

/// Conversion from a [`Value`] to a native type
pub trait FromValue: ValueType + Sized {
    /// Convert, failing with [`ReflectError::ValueConversion`] on a kind mismatch
    fn from_value(value: Value) -> ReflectResult<Self>;

    /// Whether [`FromValue::from_value`] would succeed for `value`
    fn accepts_value(value: &Value) -> bool {
        Self::accepts(value.kind())
    }
}

macro_rules! value_type {
    ($($ty:ty => $kind:expr),* $(,)?) => {
        $(impl ValueType for $ty {
            const KIND: Option<ValueKind> = $kind;
        })*
    };
}

value_type! {
    () => Some(ValueKind::Nothing),
    bool => Some(ValueKind::Bool),
    i32 => Some(ValueKind::Int),
    i64 => Some(ValueKind::Int),
    u32 => Some(ValueKind::Int),
    f32 => Some(ValueKind::Real),
    f64 => Some(ValueKind::Real),
    String => Some(ValueKind::Str),
    Value => None,
}

impl FromValue for Value {
    fn from_value(value: Value) -> ReflectResult<Self> {
        Ok(value)
    }
}

impl FromValue for () {
    fn from_value(value: Value) -> ReflectResult<Self> {
        match value {
            Value::Nothing => Ok(()),
            other => Err(other.mismatch(ValueKind::Nothing)),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> ReflectResult<Self> {
        value.as_bool().ok_or_else(|| value.mismatch(ValueKind::Bool))
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> ReflectResult<Self> {
        value.as_int().ok_or_else(|| value.mismatch(ValueKind::Int))
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> ReflectResult<Self> {
        value
            .as_int()
            .and_then(|i| i32::try_from(i).ok())
            .ok_or_else(|| value.mismatch(ValueKind::Int))
    }

    fn accepts_value(value: &Value) -> bool {
        value.as_int().is_some_and(|i| i32::try_from(i).is_ok())
    }
}

impl FromValue for u32 {
    fn from_value(value: Value) -> ReflectResult<Self> {
        value
            .as_int()
            .and_then(|i| u32::try_from(i).ok())
            .ok_or_else(|| value.mismatch(ValueKind::Int))
    }

    fn accepts_value(value: &Value) -> bool {
        value.as_int().is_some_and(|i| u32::try_from(i).is_ok())
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> ReflectResult<Self> {
        value.as_real().ok_or_else(|| value.mismatch(ValueKind::Real))
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> ReflectResult<Self> {
        value
            .as_real()
            .map(|r| r as f32)
            .ok_or_else(|| value.mismatch(ValueKind::Real))
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> ReflectResult<Self> {
        match value {
            Value::Str(s) => Ok(s),
            other => Err(other.mismatch(ValueKind::Str)),
        }
    }
}
