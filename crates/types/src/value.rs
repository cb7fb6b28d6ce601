//! Scalar point values.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single point value as exchanged with the remote simulation.
///
/// Serialized untagged, so `21.5`, `true` and `"auto"` map directly onto
/// the JSON the simulation service speaks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Value {
    /// Returns the numeric value, if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the boolean value, if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Short name of the variant, used in type mismatch reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::Text(_) => "text",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_json_shapes() {
        let v: Value = serde_json::from_str("293.15").unwrap();
        assert_eq!(v, Value::Number(293.15));

        let v: Value = serde_json::from_str("1").unwrap();
        assert_eq!(v.as_f64(), Some(1.0));

        let v: Value = serde_json::from_str("false").unwrap();
        assert_eq!(v, Value::Bool(false));

        let v: Value = serde_json::from_str("\"auto\"").unwrap();
        assert_eq!(v, Value::Text("auto".into()));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::from(3600.0).to_string(), "3600");
        assert_eq!(Value::from(21.5).to_string(), "21.5");
        assert_eq!(Value::from(true).to_string(), "true");
        assert_eq!(Value::from("on").to_string(), "on");
    }

    #[test]
    fn test_accessors_reject_other_kinds() {
        assert_eq!(Value::from("1").as_f64(), None);
        assert_eq!(Value::from(1.0).as_bool(), None);
        assert_eq!(Value::from(true).kind(), "bool");
    }
}
