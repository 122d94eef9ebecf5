//! Scalar values read from records or written as literals

use serde::{Deserialize, Serialize};
use std::fmt;

/// A decoded scalar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Literal form for constraint strings: strings quoted, everything else bare
    pub fn to_literal(&self) -> String {
        match self {
            Value::Str(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_quoting() {
        assert_eq!(Value::from("a\"b").to_literal(), "\"a\\\"b\"");
        assert_eq!(Value::from(42i64).to_literal(), "42");
        assert_eq!(Value::from(true).to_literal(), "true");
    }

    #[test]
    fn test_untagged_deserialize() {
        #[derive(Deserialize)]
        struct Holder {
            a: Value,
            b: Value,
            c: Value,
            d: Value,
        }
        let h: Holder = toml::from_str("a = 1\nb = 2.5\nc = \"x\"\nd = false").unwrap();
        assert_eq!(h.a, Value::Int(1));
        assert_eq!(h.b, Value::Float(2.5));
        assert_eq!(h.c, Value::Str("x".into()));
        assert_eq!(h.d, Value::Bool(false));
    }
}
