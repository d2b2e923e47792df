//! Leaf values
//!
//! A `Value` is what a data node hands back for a leaf. Which variant is
//! acceptable for a given leaf is decided by the leaf's [`Format`].
//!
//! [`Format`]: crate::meta::Format

use serde_json::Number;
use std::fmt;

/// A typed leaf value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Bool(bool),
    Int(i64),
    UInt(u64),
    Decimal(f64),
}

impl Value {
    /// Plain JSON form of the value
    ///
    /// Non-finite decimals have no JSON number form and become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::Number(Number::from(*i)),
            Value::UInt(u) => serde_json::Value::Number(Number::from(*u)),
            Value::Decimal(d) => Number::from_f64(*d)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::UInt(_) | Value::Decimal(_))
    }

    /// Exact integer view of a numeric value
    pub(crate) fn as_i128(&self) -> Option<i128> {
        match self {
            Value::Int(i) => Some(i128::from(*i)),
            Value::UInt(u) => Some(i128::from(*u)),
            Value::Decimal(d) if d.is_finite() && d.fract() == 0.0 => {
                // f64 integral values beyond i128 are not representable keys anyway
                if d.abs() < 1.7e38 {
                    Some(*d as i128)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    pub(crate) fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::UInt(u) => Some(*u as f64),
            Value::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    /// Equality used when matching list keys
    ///
    /// Numbers compare numerically regardless of variant, so `Int(3)`,
    /// `UInt(3)` and `Decimal(3.0)` address the same entry. Strings and
    /// booleans compare exactly.
    pub fn key_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (a, b) if a.is_numeric() && b.is_numeric() => match (a.as_i128(), b.as_i128()) {
                (Some(x), Some(y)) => x == y,
                _ => match (a.as_f64(), b.as_f64()) {
                    (Some(x), Some(y)) => x == y,
                    _ => false,
                },
            },
            _ => false,
        }
    }
}

/// Compare two key tuples field by field with [`Value::key_eq`]
pub fn keys_match(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.key_eq(y))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::UInt(u) => write!(f, "{}", u),
            Value::Decimal(d) => write!(f, "{}", d),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        Value::UInt(u)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Decimal(d)
    }
}
