//! Coercion of loosely typed source values into record fields.
//!
//! Rules:
//! - a bare `-`, empty or whitespace-only text means "no reading";
//! - text that does not parse as a number is treated as no reading;
//! - NaN and infinities are never stored;
//! - JSON `null`, booleans, arrays and objects carry no number.
//!
//! None of these functions fail: firmware occasionally emits garbage in a
//! single field, and that must not cost the whole reading.

use serde_json::Value;

/// A raw scalar as delivered by a source, either element text or a JSON value.
pub trait RawScalar {
    fn as_number(&self) -> Option<f64>;

    fn as_integer(&self) -> Option<i64> {
        self.as_number().map(|n| n.trunc() as i64)
    }

    fn as_text(&self) -> Option<String>;
}

impl RawScalar for str {
    fn as_number(&self) -> Option<f64> {
        let trimmed = self.trim();
        if trimmed.is_empty() || trimmed == "-" {
            return None;
        }
        trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
    }

    fn as_text(&self) -> Option<String> {
        let trimmed = self.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

impl RawScalar for Value {
    fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64().filter(|n| n.is_finite()),
            Value::String(s) => s.as_str().as_number(),
            _ => None,
        }
    }

    fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
            Value::String(s) => s.as_str().as_integer(),
            _ => None,
        }
    }

    fn as_text(&self) -> Option<String> {
        match self {
            Value::String(s) => s.as_str().as_text(),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

pub fn coerce_number<R: RawScalar + ?Sized>(raw: Option<&R>) -> Option<f64> {
    raw.and_then(|r| r.as_number())
}

/// Integer field that may legitimately be absent, truncated toward zero.
pub fn coerce_optional_int<R: RawScalar + ?Sized>(raw: Option<&R>) -> Option<i64> {
    raw.and_then(|r| r.as_integer())
}

/// Integer field the schema requires; `default` stands in for no reading.
pub fn coerce_required_int<R: RawScalar + ?Sized>(raw: Option<&R>, default: i64) -> i64 {
    coerce_optional_int(raw).unwrap_or(default)
}

pub fn coerce_text<R: RawScalar + ?Sized>(raw: Option<&R>) -> Option<String> {
    raw.and_then(|r| r.as_text())
}
