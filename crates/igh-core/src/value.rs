//! Value model shared between the engine and the storage layer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A scalar cell value as it flows through extraction, evaluation and load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Int(i64),
    Real(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Integer view with lenient coercion: integer values pass through,
    /// text values are parsed. Used for optionset codes and CASE comparisons,
    /// where source extracts sometimes carry codes as strings.
    pub fn to_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Parse a literal token from an expression: integer, then real, then text.
    pub fn parse_literal(token: &str) -> Value {
        if let Ok(n) = token.parse::<i64>() {
            return Value::Int(n);
        }
        if let Ok(f) = token.parse::<f64>() {
            return Value::Real(f);
        }
        Value::Text(token.to_string())
    }

    /// The natural-key form of this value. Reals are keyed by their display
    /// form so that key tuples stay hashable.
    pub fn key_part(&self) -> KeyPart {
        match self {
            Value::Null => KeyPart::Null,
            Value::Int(n) => KeyPart::Int(*n),
            Value::Real(f) => KeyPart::Text(f.to_string()),
            Value::Text(s) => KeyPart::Text(s.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(n) => write!(f, "{}", n),
            Value::Real(r) => write!(f, "{}", r),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One component of a natural-key tuple.
///
/// `Null` is representable so distinct-dedup tuples with missing components
/// can still be registered; FK lookups short-circuit on null before building
/// a tuple, so a null part is never *looked up* from the referencing side.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyPart {
    Null,
    Int(i64),
    Text(String),
}

/// An ordered natural-key tuple identifying one dimension row.
pub type KeyTuple = Vec<KeyPart>;

#[cfg(test)]
#[path = "value_test.rs"]
mod tests;
