//! Leaf type formats and value coercion

use crate::errors::{NodeError, Result};
use crate::value::Value;

/// Primitive value kind a leaf type resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    String,
    Boolean,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Decimal64,
    Number,
}

impl Format {
    /// Type ident as it appears in schema sources and snapshot documents
    pub fn ident(&self) -> &'static str {
        match self {
            Format::String => "string",
            Format::Boolean => "boolean",
            Format::Int8 => "int8",
            Format::Int16 => "int16",
            Format::Int32 => "int32",
            Format::Int64 => "int64",
            Format::UInt8 => "uint8",
            Format::UInt16 => "uint16",
            Format::UInt32 => "uint32",
            Format::UInt64 => "uint64",
            Format::Decimal64 => "decimal64",
            Format::Number => "number",
        }
    }

    pub fn from_ident(ident: &str) -> Option<Self> {
        let format = match ident {
            "string" => Format::String,
            "boolean" => Format::Boolean,
            "int8" => Format::Int8,
            "int16" => Format::Int16,
            "int32" => Format::Int32,
            "int64" => Format::Int64,
            "uint8" => Format::UInt8,
            "uint16" => Format::UInt16,
            "uint32" => Format::UInt32,
            "uint64" => Format::UInt64,
            "decimal64" => Format::Decimal64,
            "number" => Format::Number,
            _ => return None,
        };
        Some(format)
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, Format::String | Format::Boolean)
    }

    fn int_range(&self) -> Option<(i128, i128)> {
        let range = match self {
            Format::Int8 => (i128::from(i8::MIN), i128::from(i8::MAX)),
            Format::Int16 => (i128::from(i16::MIN), i128::from(i16::MAX)),
            Format::Int32 => (i128::from(i32::MIN), i128::from(i32::MAX)),
            Format::Int64 => (i128::from(i64::MIN), i128::from(i64::MAX)),
            Format::UInt8 => (0, i128::from(u8::MAX)),
            Format::UInt16 => (0, i128::from(u16::MAX)),
            Format::UInt32 => (0, i128::from(u32::MAX)),
            Format::UInt64 => (0, i128::from(u64::MAX)),
            _ => return None,
        };
        Some(range)
    }

    fn is_signed(&self) -> bool {
        matches!(
            self,
            Format::Int8 | Format::Int16 | Format::Int32 | Format::Int64
        )
    }

    /// Coerce a value to this format
    ///
    /// Coercion is exact: integers are range checked, decimals are accepted
    /// for integer formats only when integral, and strings never turn into
    /// numbers (or the reverse). `ident` names the leaf in the error.
    ///
    /// # Errors
    ///
    /// Returns `NodeError::TypeMismatch` when the value cannot be
    /// represented without loss.
    pub fn coerce(&self, ident: &str, value: Value) -> Result<Value> {
        let mismatch = |reason: String| NodeError::TypeMismatch {
            ident: ident.to_string(),
            expected: self.ident().to_string(),
            reason,
        };

        match self {
            Format::String => match value {
                Value::String(_) => Ok(value),
                other => Err(mismatch(format!("got non-string value {}", other))),
            },
            Format::Boolean => match value {
                Value::Bool(_) => Ok(value),
                other => Err(mismatch(format!("got non-boolean value {}", other))),
            },
            Format::Decimal64 | Format::Number => match value {
                Value::Decimal(d) if d.is_finite() => Ok(Value::Decimal(d)),
                Value::Decimal(d) => Err(mismatch(format!("{} is not finite", d))),
                Value::Int(_) | Value::UInt(_) if *self == Format::Number => Ok(value),
                Value::Int(i) => exact_decimal(i128::from(i)).ok_or_else(|| {
                    mismatch(format!("{} has no exact decimal64 representation", i))
                }),
                Value::UInt(u) => exact_decimal(i128::from(u)).ok_or_else(|| {
                    mismatch(format!("{} has no exact decimal64 representation", u))
                }),
                other => Err(mismatch(format!("got non-numeric value {}", other))),
            },
            _ => {
                if !value.is_numeric() {
                    return Err(mismatch(format!("got non-numeric value {}", value)));
                }
                let n = value
                    .as_i128()
                    .ok_or_else(|| mismatch(format!("{} is not an integer", value)))?;
                let (min, max) = self
                    .int_range()
                    .ok_or_else(|| mismatch("format has no integer range".to_string()))?;
                if n < min || n > max {
                    return Err(mismatch(format!("{} is out of range {}..={}", n, min, max)));
                }
                if self.is_signed() {
                    i64::try_from(n)
                        .map(Value::Int)
                        .map_err(|_| mismatch(format!("{} does not fit int64", n)))
                } else {
                    u64::try_from(n)
                        .map(Value::UInt)
                        .map_err(|_| mismatch(format!("{} does not fit uint64", n)))
                }
            }
        }
    }

    /// Convert a plain JSON scalar into a value of this format
    ///
    /// # Errors
    ///
    /// Returns `NodeError::TypeMismatch` for non-scalars or values the
    /// format cannot hold.
    pub fn from_json(&self, ident: &str, json: &serde_json::Value) -> Result<Value> {
        let value = match json {
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    Value::UInt(u)
                } else if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Decimal(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            other => {
                return Err(NodeError::TypeMismatch {
                    ident: ident.to_string(),
                    expected: self.ident().to_string(),
                    reason: format!("expected a scalar, got {}", other),
                })
            }
        };
        self.coerce(ident, value)
    }

    /// Parse the textual form used by path key predicates and snapshot keys
    ///
    /// # Errors
    ///
    /// Returns `NodeError::TypeMismatch` when the text is not a valid
    /// literal of this format.
    pub fn parse(&self, ident: &str, text: &str) -> Result<Value> {
        let mismatch = |reason: &str| NodeError::TypeMismatch {
            ident: ident.to_string(),
            expected: self.ident().to_string(),
            reason: format!("'{}' {}", text, reason),
        };

        let value = match self {
            Format::String => Value::String(text.to_string()),
            Format::Boolean => match text {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => return Err(mismatch("is not a boolean literal")),
            },
            Format::Decimal64 | Format::Number => {
                if let Ok(i) = text.parse::<i64>() {
                    Value::Int(i)
                } else if let Ok(u) = text.parse::<u64>() {
                    Value::UInt(u)
                } else {
                    Value::Decimal(
                        text.parse::<f64>()
                            .map_err(|_| mismatch("is not a number"))?,
                    )
                }
            }
            _ => {
                if self.is_signed() {
                    Value::Int(text.parse::<i64>().map_err(|_| mismatch("is not an integer"))?)
                } else {
                    Value::UInt(
                        text.parse::<u64>()
                            .map_err(|_| mismatch("is not an unsigned integer"))?,
                    )
                }
            }
        };
        self.coerce(ident, value)
    }
}

/// The `type` of a leaf: the ident it was declared with plus its resolved format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataType {
    ident: String,
    format: Format,
}

impl DataType {
    /// # Errors
    ///
    /// Returns `NodeError::InvalidSchema` for type idents outside the
    /// primitive set. `leaf` names the declaring leaf in the error.
    pub fn resolve(leaf: &str, type_ident: &str) -> Result<Self> {
        let format = Format::from_ident(type_ident).ok_or_else(|| NodeError::InvalidSchema {
            ident: leaf.to_string(),
            reason: format!("unknown type '{}'", type_ident),
        })?;
        Ok(Self {
            ident: type_ident.to_string(),
            format,
        })
    }

    pub fn ident(&self) -> &str {
        &self.ident
    }

    pub fn format(&self) -> Format {
        self.format
    }
}

/// `n` as a float, when the float holds it exactly
fn exact_decimal(n: i128) -> Option<Value> {
    let f = n as f64;
    ((f as i128) == n).then_some(Value::Decimal(f))
}
