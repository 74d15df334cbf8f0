use serde::{Deserialize, Serialize};

/// A single value held by a [`KeyValueStore`](crate::store::KeyValueStore).
///
/// Stores keep the type tag alongside the value, so reading an `Int` back as a `Long` is detected
/// instead of silently reinterpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    /// A 32-bit integer.
    Int(i32),
    /// A 64-bit integer.
    Long(i64),
    /// A boolean flag.
    Bool(bool),
}

/// Rust types that can be stored as a [`Value`].
///
/// Implemented for `i32`, `i64` and `bool`. Converting from a value of a different variant
/// returns `None`.
pub trait StoreValue: Sized {
    /// Wrap `self` in the matching [`Value`] variant.
    fn into_value(self) -> Value;

    /// Extract `Self` from a [`Value`], or `None` if the variant does not match.
    fn from_value(value: Value) -> Option<Self>;
}

impl StoreValue for i32 {
    fn into_value(self) -> Value {
        Value::Int(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Int(v) => Some(v),
            _ => None,
        }
    }
}

impl StoreValue for i64 {
    fn into_value(self) -> Value {
        Value::Long(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Long(v) => Some(v),
            _ => None,
        }
    }
}

impl StoreValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Bool(v) => Some(v),
            _ => None,
        }
    }
}
