//! Field access and value coercion over fetched records.
//!
//! Collections arrive as JSON from the server, so every component in this
//! crate reads fields through the [`Record`] trait and interprets the
//! resulting [`serde_json::Value`] with the helpers below.

use serde_json::{Map, Number, Value};

/// A record whose fields can be looked up by path.
///
/// Paths are either a plain key (`"salary"`) or a dotted path into nested
/// objects (`"employee.department"`). An exact key match always wins over
/// dotted descent, so keys that themselves contain dots still resolve.
pub trait Record {
    fn field(&self, path: &str) -> Option<&Value>;
}

impl Record for Map<String, Value> {
    fn field(&self, path: &str) -> Option<&Value> {
        if let Some(value) = self.get(path) {
            return Some(value);
        }
        let (head, rest) = path.split_once('.')?;
        self.get(head)?.as_object()?.field(rest)
    }
}

impl Record for Value {
    fn field(&self, path: &str) -> Option<&Value> {
        self.as_object()?.field(path)
    }
}

impl<R: Record + ?Sized> Record for &R {
    fn field(&self, path: &str) -> Option<&Value> {
        (**self).field(path)
    }
}

/// Look up a field, treating JSON `null` the same as a missing key.
pub fn present<'a, R: Record + ?Sized>(record: &'a R, path: &str) -> Option<&'a Value> {
    record.field(path).filter(|v| !v.is_null())
}

/// `true` when the value is missing, `null`, or an empty string.
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// Render a value the way the browser's `String(value)` does.
///
/// Whole floats print without a fraction (`3.0` -> `"3"`), arrays join their
/// elements with commas (nulls become empty), and objects collapse to
/// `"[object Object]"`.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => display_number(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => display_value(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

fn display_number(n: &Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{f:.0}"),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

/// Coerce a value to a number with `Number(value) || 0` semantics.
///
/// Never fails: anything that does not coerce (non-numeric strings, objects,
/// multi-element arrays, missing values) counts as `0.0`.
pub fn coerce_number(value: &Value) -> f64 {
    let n = match value {
        Value::Null | Value::Object(_) => 0.0,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => parse_numeric_str(s).unwrap_or(0.0),
        Value::Array(_) => parse_numeric_str(&display_value(value)).unwrap_or(0.0),
    };
    if n.is_nan() {
        0.0
    } else {
        n
    }
}

/// Coerce an optional field value; missing fields count as `0.0`.
pub fn coerce_field(value: Option<&Value>) -> f64 {
    value.map_or(0.0, coerce_number)
}

/// Strict numeric parse of a string with JavaScript `Number()` rules.
///
/// Returns `None` where `Number()` would produce `NaN`. Surrounding
/// whitespace is ignored and the empty string parses as `0`.
pub fn parse_numeric_str(s: &str) -> Option<f64> {
    let t = s.trim();
    if t.is_empty() {
        return Some(0.0);
    }
    match t {
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = t.strip_prefix(prefix) {
            if digits.starts_with('+') {
                return None;
            }
            return u64::from_str_radix(digits, radix).ok().map(|n| n as f64);
        }
    }
    // Rust's float parser also accepts "inf" and "nan", which Number() rejects.
    if !t
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'))
    {
        return None;
    }
    t.parse::<f64>().ok()
}
