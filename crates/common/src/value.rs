//! Scalar values for block inputs and thread variables.
//!
//! Block inputs in the program graph and bindings in a thread's symbol
//! table share one representation. Arithmetic is always `f64`; strings and
//! booleans ride along unchanged until something needs a number.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::opcode::CompareOp;

/// A scalar value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// IEEE 754 double. Every arithmetic result is a `Number`.
    Number(f64),
    /// Boolean flag.
    Bool(bool),
    /// Text, e.g. a pitch name such as `"E4"`.
    Text(String),
}

// Numbers compare by bit pattern so `Value` can be `Eq`. NaN only arises
// from arithmetic on NaN inputs, and then NaN == NaN is the useful answer
// for tests and de-duplication.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.to_bits() == b.to_bits() || a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Value {
    /// The value unbound variables resolve to.
    pub const ZERO: Value = Value::Number(0.0);

    /// Numeric view used by arithmetic and ordered comparison.
    ///
    /// Booleans are 0/1. Text is parsed as a number when it looks like
    /// one and is 0 otherwise.
    pub fn as_number(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Text(s) => parse_finite(s).unwrap_or(0.0),
        }
    }

    /// Returns true for `Number`, or text that parses as a number.
    pub fn is_numeric(&self) -> bool {
        match self {
            Value::Number(_) => true,
            Value::Bool(_) => false,
            Value::Text(s) => parse_finite(s).is_some(),
        }
    }

    /// `self + rhs` in `f64`.
    pub fn add(&self, rhs: &Value) -> Value {
        Value::Number(self.as_number() + rhs.as_number())
    }

    /// Evaluate `self <op> rhs`.
    ///
    /// Ordered comparisons are numeric. `==` is numeric when both sides are
    /// numeric and structural otherwise.
    pub fn compare(&self, op: CompareOp, rhs: &Value) -> bool {
        match op {
            CompareOp::Lt => self.as_number() < rhs.as_number(),
            CompareOp::Le => self.as_number() <= rhs.as_number(),
            CompareOp::Ge => self.as_number() >= rhs.as_number(),
            CompareOp::Eq => {
                if self.is_numeric() && rhs.is_numeric() {
                    self.as_number() == rhs.as_number()
                } else {
                    self == rhs
                }
            }
        }
    }
}

/// Text as a finite number. `"nan"` and `"inf"` count as non-numeric.
fn parse_finite(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
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
    fn numeric_views() {
        assert_eq!(Value::Number(2.5).as_number(), 2.5);
        assert_eq!(Value::Bool(true).as_number(), 1.0);
        assert_eq!(Value::Bool(false).as_number(), 0.0);
        assert_eq!(Value::from(" 42 ").as_number(), 42.0);
        assert_eq!(Value::from("E4").as_number(), 0.0);
    }

    #[test]
    fn non_finite_text_is_not_numeric() {
        for text in ["nan", "NaN", "inf", "-inf", "infinity", " Infinity "] {
            let value = Value::from(text);
            assert!(!value.is_numeric(), "{text:?}");
            assert_eq!(value.as_number(), 0.0, "{text:?}");
        }
        assert!(Value::from("1e3").is_numeric());
    }

    #[test]
    fn add_is_f64_addition() {
        assert_eq!(Value::from(0.1).add(&Value::from(0.2)), Value::Number(0.1 + 0.2));
        assert_eq!(Value::from(5).add(&Value::from(-7)), Value::Number(-2.0));
    }

    #[test]
    fn ordered_comparisons() {
        let one = Value::from(1);
        let two = Value::from(2);
        assert!(one.compare(CompareOp::Lt, &two));
        assert!(!two.compare(CompareOp::Lt, &two));
        assert!(two.compare(CompareOp::Le, &two));
        assert!(two.compare(CompareOp::Ge, &one));
    }

    #[test]
    fn equality_comparison_mixes_numeric_and_structural() {
        assert!(Value::from(3).compare(CompareOp::Eq, &Value::from("3")));
        assert!(Value::from("C4").compare(CompareOp::Eq, &Value::from("C4")));
        assert!(!Value::from("C4").compare(CompareOp::Eq, &Value::from("E4")));
        assert!(!Value::from(true).compare(CompareOp::Eq, &Value::from(1)));
    }

    #[test]
    fn display() {
        assert_eq!(Value::from(3).to_string(), "3");
        assert_eq!(Value::from(0.5).to_string(), "0.5");
        assert_eq!(Value::from("E4").to_string(), "E4");
    }

    #[test]
    fn deserializes_untagged_scalars() {
        let values: Vec<Value> = serde_json::from_str(r#"[1, 2.5, true, "E4"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                Value::Number(1.0),
                Value::Number(2.5),
                Value::Bool(true),
                Value::from("E4")
            ]
        );
    }
}
