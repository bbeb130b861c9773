#![forbid(unsafe_code)]

//! Parsers, formatters, and the registry that names them.
//!
//! A parser normalizes a raw control value before a binding accepts it; a
//! formatter turns the stored value into what controls and display targets
//! show. Both are plain shared closures so one instance can be installed on
//! many bindings.
//!
//! # Built-in Tags
//!
//! | Kind | Tag | Behavior |
//! |------|-----|----------|
//! | parser | `"number"`, `"float"` | [`parse_float`]: numeric prefix, NaN -> `0` |
//! | parser | `"int"`, `"integer"` | [`parse_int`]: integer prefix, NaN -> `0` |
//! | formatter | `"identity"` | value unchanged |
//! | formatter | `"fixed:N"` | number rendered with `N` fraction digits |
//! | formatter | `"round"` | number rounded to the nearest integer |
//!
//! # Failure Modes
//!
//! Built-in parsers never fail: malformed text becomes `0`. Resolving an
//! unknown tag is a configuration error ([`BindError`]).

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::error::BindError;
use crate::value::Value;

/// Normalizes `(raw, previous)` into the value a binding stores.
pub type Parser = Rc<dyn Fn(&Value, Option<&Value>) -> Value>;

/// Maps a stored value to its display representation.
pub type Formatter = Rc<dyn Fn(&Value) -> Value>;

/// Upper bound for `fixed:N`.
const MAX_FIXED_DIGITS: usize = 100;

// ---------------------------------------------------------------------------
// Built-in parsers
// ---------------------------------------------------------------------------

/// Float parser: browser `parseFloat` on the value's text, NaN becomes `0`.
///
/// Booleans are not numeric text and therefore parse as `0`.
pub fn parse_float(raw: &Value, _previous: Option<&Value>) -> Value {
    let parsed = match raw {
        Value::Int(i) => *i as f64,
        Value::Float(x) => *x,
        Value::Text(s) => float_prefix(s),
        Value::Bool(_) => f64::NAN,
    };
    Value::Float(if parsed.is_nan() { 0.0 } else { parsed })
}

/// Integer parser: browser `parseInt` on the value's text, NaN becomes `0`.
///
/// Numbers truncate toward zero; non-finite numbers become `0`.
pub fn parse_int(raw: &Value, _previous: Option<&Value>) -> Value {
    let parsed = match raw {
        Value::Int(i) => Some(*i),
        Value::Float(x) if x.is_finite() => Some(x.trunc() as i64),
        Value::Float(_) | Value::Bool(_) => None,
        Value::Text(s) => int_prefix(s),
    };
    Value::Int(parsed.unwrap_or(0))
}

/// Longest leading decimal literal of `s`, or NaN when there is none.
///
/// Leading whitespace is skipped and trailing garbage ignored, so
/// `"12px"` parses as `12` and `" .5em"` as `0.5`.
#[must_use]
pub fn float_prefix(s: &str) -> f64 {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let len = bytes.len();
    let mut i = 0;

    let negative = bytes.first() == Some(&b'-');
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    if s[i..].starts_with("Infinity") {
        return if negative {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    let int_start = i;
    while i < len && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut mantissa_digits = i - int_start;

    if i < len && bytes[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < len && bytes[j].is_ascii_digit() {
            j += 1;
        }
        mantissa_digits += j - frac_start;
        if mantissa_digits > 0 {
            i = j;
        }
    }
    if mantissa_digits == 0 {
        return f64::NAN;
    }

    if i < len && matches!(bytes[i], b'e' | b'E') {
        let mut j = i + 1;
        if j < len && matches!(bytes[j], b'+' | b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < len && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }

    s[..i].parse().unwrap_or(f64::NAN)
}

/// Leading integer of `s` (decimal, or hex with a `0x` prefix), or `None`
/// when there is none. Out-of-range values saturate.
#[must_use]
pub fn int_prefix(s: &str) -> Option<i64> {
    let mut rest = s.trim_start();
    let negative = rest.starts_with('-');
    if let Some(stripped) = rest.strip_prefix(['+', '-']) {
        rest = stripped;
    }
    let mut radix = 10;
    if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        radix = 16;
        rest = hex;
    }

    let mut acc: i64 = 0;
    let mut seen = false;
    for digit in rest.chars().map_while(|c| c.to_digit(radix)) {
        seen = true;
        let digit = i64::from(digit);
        acc = acc.saturating_mul(i64::from(radix));
        acc = if negative {
            acc.saturating_sub(digit)
        } else {
            acc.saturating_add(digit)
        };
    }
    seen.then_some(acc)
}

// ---------------------------------------------------------------------------
// Built-in formatters
// ---------------------------------------------------------------------------

/// Render a number with exactly `digits` fraction digits.
///
/// Rounding works on the exact binary value: a digit string that sits on a
/// half rounds away from zero, so `0.125` at two digits shows `0.13`.
/// Non-numeric values pass through unchanged; non-finite numbers and
/// magnitudes of `1e21` and beyond render as plain numbers.
#[must_use]
pub fn format_fixed(value: &Value, digits: usize) -> Value {
    match value.as_f64() {
        Some(x) if x.is_finite() && x.abs() < 1e21 => Value::Text(fixed_digits(x, digits)),
        Some(x) => Value::Text(Value::Float(x).to_string()),
        None => value.clone(),
    }
}

/// Enough fraction digits to spell out any `f64` exactly.
const EXACT_FRACTION_DIGITS: usize = 1100;

fn fixed_digits(x: f64, digits: usize) -> String {
    let exact = format!("{:.*}", EXACT_FRACTION_DIGITS, x.abs());
    let (whole, fraction) = exact.split_once('.').unwrap_or((exact.as_str(), ""));

    let mut kept: Vec<u8> = whole
        .bytes()
        .chain(fraction.bytes().chain(std::iter::repeat(b'0')).take(digits))
        .collect();
    if fraction.as_bytes().get(digits).is_some_and(|d| *d >= b'5') {
        let mut carry = true;
        for d in kept.iter_mut().rev() {
            if *d == b'9' {
                *d = b'0';
            } else {
                *d += 1;
                carry = false;
                break;
            }
        }
        if carry {
            kept.insert(0, b'1');
        }
    }

    let split = kept.len() - digits;
    let mut out = String::with_capacity(kept.len() + 2);
    if x < 0.0 {
        out.push('-');
    }
    out.extend(kept[..split].iter().map(|&d| char::from(d)));
    if digits > 0 {
        out.push('.');
        out.extend(kept[split..].iter().map(|&d| char::from(d)));
    }
    out
}

/// Round a number to the nearest integer, halves toward positive infinity.
#[must_use]
pub fn format_round(value: &Value) -> Value {
    match value {
        Value::Float(x) if x.is_finite() => Value::Int((x + 0.5).floor() as i64),
        other => other.clone(),
    }
}

// ---------------------------------------------------------------------------
// Specs
// ---------------------------------------------------------------------------

/// How a caller asks for a parser in [`BindingConfig`](crate::BindingConfig).
#[derive(Clone, Default)]
pub enum ParserSpec {
    /// No parser.
    #[default]
    None,
    /// A tag resolved through the [`ParserRegistry`]. An empty tag means no
    /// parser.
    Named(String),
    /// A caller-supplied function.
    Custom(Parser),
    /// A value of some other kind, typically from declarative config.
    /// Falsy values mean no parser; anything else is rejected.
    Other(Value),
}

impl ParserSpec {
    /// Wrap a closure as a custom parser.
    pub fn custom(f: impl Fn(&Value, Option<&Value>) -> Value + 'static) -> Self {
        Self::Custom(Rc::new(f))
    }
}

impl From<&str> for ParserSpec {
    fn from(tag: &str) -> Self {
        Self::Named(tag.to_owned())
    }
}

impl From<String> for ParserSpec {
    fn from(tag: String) -> Self {
        Self::Named(tag)
    }
}

impl From<Value> for ParserSpec {
    fn from(value: Value) -> Self {
        match value {
            Value::Text(tag) => Self::Named(tag),
            other => Self::Other(other),
        }
    }
}

impl fmt::Debug for ParserSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Named(tag) => f.debug_tuple("Named").field(tag).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
            Self::Other(v) => f.debug_tuple("Other").field(v).finish(),
        }
    }
}

/// How a caller asks for a formatter.
#[derive(Clone, Default)]
pub enum FormatterSpec {
    /// Keep the binding's current formatter.
    #[default]
    Keep,
    /// A tag resolved through the [`ParserRegistry`].
    Named(String),
    /// A caller-supplied function.
    Custom(Formatter),
}

impl FormatterSpec {
    /// Wrap a closure as a custom formatter.
    pub fn custom(f: impl Fn(&Value) -> Value + 'static) -> Self {
        Self::Custom(Rc::new(f))
    }
}

impl From<&str> for FormatterSpec {
    fn from(tag: &str) -> Self {
        Self::Named(tag.to_owned())
    }
}

impl From<String> for FormatterSpec {
    fn from(tag: String) -> Self {
        Self::Named(tag)
    }
}

impl fmt::Debug for FormatterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keep => f.write_str("Keep"),
            Self::Named(tag) => f.debug_tuple("Named").field(tag).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Named parsers and formatters available to `configure`.
#[derive(Clone)]
pub struct ParserRegistry {
    parsers: HashMap<String, Parser>,
    formatters: HashMap<String, Formatter>,
}

impl ParserRegistry {
    /// A registry with the built-in tags.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::empty();
        let float: Parser = Rc::new(parse_float);
        let int: Parser = Rc::new(parse_int);
        registry.register_parser("number", Rc::clone(&float));
        registry.register_parser("float", float);
        registry.register_parser("int", Rc::clone(&int));
        registry.register_parser("integer", int);
        registry.register_formatter("identity", Rc::new(Value::clone));
        registry.register_formatter("round", Rc::new(format_round));
        registry
    }

    /// A registry with no tags at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            parsers: HashMap::new(),
            formatters: HashMap::new(),
        }
    }

    /// Register (or replace) a named parser.
    pub fn register_parser(&mut self, tag: impl Into<String>, parser: Parser) {
        self.parsers.insert(tag.into(), parser);
    }

    /// Register (or replace) a named formatter.
    pub fn register_formatter(&mut self, tag: impl Into<String>, formatter: Formatter) {
        self.formatters.insert(tag.into(), formatter);
    }

    /// Look up a parser tag.
    #[must_use]
    pub fn parser(&self, tag: &str) -> Option<Parser> {
        self.parsers.get(tag).cloned()
    }

    /// Look up a formatter tag, including the parametric `fixed:N`.
    #[must_use]
    pub fn formatter(&self, tag: &str) -> Option<Formatter> {
        if let Some(formatter) = self.formatters.get(tag) {
            return Some(Rc::clone(formatter));
        }
        let digits: usize = tag.strip_prefix("fixed:")?.parse().ok()?;
        if digits > MAX_FIXED_DIGITS {
            return None;
        }
        Some(Rc::new(move |v: &Value| format_fixed(v, digits)))
    }

    /// Turn a spec into the parser to install (`None`: no parser).
    ///
    /// # Errors
    ///
    /// - [`BindError::UnknownParser`] for an unregistered tag.
    /// - [`BindError::InvalidParserType`] for a truthy non-text value.
    pub fn resolve_parser(&self, spec: &ParserSpec) -> Result<Option<Parser>, BindError> {
        match spec {
            ParserSpec::None => Ok(None),
            ParserSpec::Named(tag) if tag.is_empty() => Ok(None),
            ParserSpec::Named(tag) => self
                .parser(tag)
                .map(Some)
                .ok_or_else(|| BindError::UnknownParser(tag.clone())),
            ParserSpec::Custom(parser) => Ok(Some(Rc::clone(parser))),
            ParserSpec::Other(value) if !value.is_truthy() => Ok(None),
            ParserSpec::Other(value) => Err(BindError::InvalidParserType(value.kind_name())),
        }
    }

    /// Turn a spec into the formatter to install. `Ok(None)` keeps the
    /// current formatter.
    ///
    /// # Errors
    ///
    /// [`BindError::UnknownFormatter`] for an unregistered tag.
    pub fn resolve_formatter(&self, spec: &FormatterSpec) -> Result<Option<Formatter>, BindError> {
        match spec {
            FormatterSpec::Keep => Ok(None),
            FormatterSpec::Named(tag) => self
                .formatter(tag)
                .map(Some)
                .ok_or_else(|| BindError::UnknownFormatter(tag.clone())),
            FormatterSpec::Custom(formatter) => Ok(Some(Rc::clone(formatter))),
        }
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parsers: Vec<_> = self.parsers.keys().collect();
        let mut formatters: Vec<_> = self.formatters.keys().collect();
        parsers.sort();
        formatters.sort();
        f.debug_struct("ParserRegistry")
            .field("parsers", &parsers)
            .field("formatters", &formatters)
            .finish()
    }
}
