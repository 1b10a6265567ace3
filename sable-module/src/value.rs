//! Compile-time term values
//!
//! Attribute values, clause patterns, guards and bodies are all opaque
//! `Value` terms at this layer. `Value::Nil` is a real storable value,
//! distinct from "never written".

use serde::{Deserialize, Serialize};
use std::fmt;

/// A compile-time term value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Atom(String),
    Str(String),
    List(Vec<Value>),
}

impl Value {
    /// Convenience constructor for atom values
    pub fn atom(name: &str) -> Self {
        Value::Atom(name.to_string())
    }

    /// Convenience constructor for string values
    pub fn str(s: &str) -> Self {
        Value::Str(s.to_string())
    }

    /// Whether this value is the `ok` atom (load-callback success marker)
    pub fn is_ok_atom(&self) -> bool {
        matches!(self, Value::Atom(a) if a == "ok")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Atom(a) => write!(f, ":{}", a),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}
