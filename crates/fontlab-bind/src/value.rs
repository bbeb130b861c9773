#![forbid(unsafe_code)]

//! Dynamic values carried by bindings.
//!
//! A [`Value`] is whatever a control produced or a parser normalized: text
//! from a text field, a number from a slider, a flag from a checkbox. An
//! unset binding holds `Option::<Value>::None`; there is no "undefined"
//! variant.
//!
//! # Strict Equality
//!
//! `PartialEq` for `Value` is the comparison used to suppress redundant
//! notifications:
//!
//! - `Int` and `Float` compare numerically (`Int(42) == Float(42.0)`).
//! - `Float(NaN)` never equals anything, itself included.
//! - Values of different kinds never compare equal (`Text("1") != Int(1)`).

use std::fmt;

/// A value flowing through a binding.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Value {
    /// Checkbox state.
    Bool(bool),
    /// Integral number (output of the integer parser).
    Int(i64),
    /// Floating-point number.
    Float(f64),
    /// Raw or formatted text.
    Text(String),
}

impl Value {
    /// Numeric view of the value, if it is a number.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Text view of the value, if it is text.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean view of the value, if it is a flag.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Whether the value is a number (`Int` or `Float`).
    #[must_use]
    pub fn is_number(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Float(_))
    }

    /// Browser truthiness: `false`, `0`, `NaN` and `""` are falsy.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0 && !f.is_nan(),
            Self::Text(s) => !s.is_empty(),
        }
    }

    /// Short name of the value's kind, used in diagnostics.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (a, b) if a.is_number() && b.is_number() => a.as_f64() == b.as_f64(),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write_number(f, *x),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Render a float the way a browser shows a number in a control.
fn write_number(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    if x.is_nan() {
        f.write_str("NaN")
    } else if x.is_infinite() {
        f.write_str(if x > 0.0 { "Infinity" } else { "-Infinity" })
    } else if x == 0.0 {
        f.write_str("0")
    } else if x.abs() >= 1e21 || x.abs() < 1e-6 {
        let sci = format!("{x:e}");
        match sci.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => write!(f, "{mantissa}e+{exp}"),
            _ => f.write_str(&sci),
        }
    } else if x.fract() == 0.0 {
        write!(f, "{x:.0}")
    } else {
        write!(f, "{x}")
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn numbers_compare_across_int_and_float() {
        assert_eq!(Value::Int(42), Value::Float(42.0));
        assert_ne!(Value::Int(42), Value::Float(42.5));
    }

    #[test]
    fn nan_is_never_equal() {
        let nan = Value::Float(f64::NAN);
        assert_ne!(nan, nan.clone());
    }

    #[test]
    fn kinds_never_cross_compare() {
        assert_ne!(Value::from("42"), Value::Int(42));
        assert_ne!(Value::Bool(true), Value::Int(1));
        assert_ne!(Value::from(""), Value::Bool(false));
    }

    #[test]
    fn display_matches_browser_rendering() {
        assert_eq!(Value::Float(1.0).to_string(), "1");
        assert_eq!(Value::Float(0.125).to_string(), "0.125");
        assert_eq!(Value::Float(-0.0).to_string(), "0");
        assert_eq!(Value::Float(f64::NAN).to_string(), "NaN");
        assert_eq!(Value::Float(f64::NEG_INFINITY).to_string(), "-Infinity");
        assert_eq!(Value::Float(1e-7).to_string(), "1e-7");
        assert_eq!(Value::Float(-2.5e-8).to_string(), "-2.5e-8");
        assert_eq!(Value::Float(1e21).to_string(), "1e+21");
        assert_eq!(Value::Float(0.000_001).to_string(), "0.000001");
        assert_eq!(Value::Float(1e20).to_string(), "100000000000000000000");
        assert_eq!(Value::Int(-7).to_string(), "-7");
        assert_eq!(Value::from("bold").to_string(), "bold");
        assert_eq!(Value::Bool(true).to_string(), "true");
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Float(f64::NAN).is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Float(0.5).is_truthy());
        assert!(Value::from("0").is_truthy());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_untagged_round_trip() {
        let json = r#"[true, 5, 0.125, "bold"]"#;
        let values: Vec<Value> = serde_json::from_str(json).unwrap();
        assert_eq!(
            values,
            vec![
                Value::Bool(true),
                Value::Int(5),
                Value::Float(0.125),
                Value::from("bold")
            ]
        );
        assert!(matches!(values[1], Value::Int(5)));
        assert_eq!(serde_json::to_string(&values).unwrap(), r#"[true,5,0.125,"bold"]"#);
    }

    proptest! {
        #[test]
        fn int_equals_its_float(i in -1_000_000i64..1_000_000) {
            prop_assert_eq!(Value::Int(i), Value::Float(i as f64));
        }

        #[test]
        fn finite_float_equals_itself(x in proptest::num::f64::NORMAL) {
            prop_assert_eq!(Value::Float(x), Value::Float(x));
        }

        #[test]
        fn text_equality_is_string_equality(a in ".{0,8}", b in ".{0,8}") {
            prop_assert_eq!(Value::from(a.as_str()) == Value::from(b.as_str()), a == b);
        }
    }
}
