//! JSON text helpers
//!
//! Run descriptors written by Python carry bare `NaN`, `Infinity` and
//! `-Infinity` tokens, which strict JSON parsers reject. They are rewritten to
//! the extended-JSON `{"$numberDouble": ...}` form before parsing.

use std::borrow::Cow;

use crate::{Error, Result};

/// Extended-JSON key carrying a double that JSON cannot express natively.
pub const NUMBER_DOUBLE: &str = "$numberDouble";

const SENTINELS: [(&str, &str); 3] = [
    ("-Infinity", "-Infinity"),
    ("Infinity", "Infinity"),
    ("NaN", "NaN"),
];

/// Parse JSON text, accepting bare non-finite float tokens outside strings.
///
/// # Errors
///
/// Returns [`Error::Json`] if the text is not valid JSON after rewriting.
pub fn parse_json(text: &str) -> Result<serde_json::Value> {
    let text = rewrite_sentinels(text);
    Ok(serde_json::from_str(&text)?)
}

/// Parse JSON text that must hold an object.
///
/// # Errors
///
/// Returns [`Error::DecodeError`] when the top-level value is not an object.
pub fn parse_object(
    text: &str,
    source: &str,
) -> Result<serde_json::Map<String, serde_json::Value>> {
    match parse_json(text)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(Error::DecodeError(format!(
            "{source} must hold a JSON object, found {}",
            kind_name(&other)
        ))),
    }
}

/// Wrap a non-finite double in its extended-JSON form.
#[must_use]
pub fn number_double(f: f64) -> serde_json::Value {
    let text = if f.is_nan() {
        "NaN"
    } else if f > 0.0 {
        "Infinity"
    } else {
        "-Infinity"
    };
    let mut map = serde_json::Map::new();
    map.insert(NUMBER_DOUBLE.to_string(), serde_json::Value::from(text));
    serde_json::Value::Object(map)
}

/// Parse the payload of a `$numberDouble` wrapper.
///
/// # Errors
///
/// Returns [`Error::DecodeError`] if the payload is not a float literal.
pub fn parse_number_double(text: &str) -> Result<f64> {
    match text {
        "NaN" => Ok(f64::NAN),
        "Infinity" => Ok(f64::INFINITY),
        "-Infinity" => Ok(f64::NEG_INFINITY),
        other => other
            .parse::<f64>()
            .map_err(|_| Error::DecodeError(format!("invalid {NUMBER_DOUBLE} payload '{other}'"))),
    }
}

pub(crate) const fn kind_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

fn rewrite_sentinels(text: &str) -> Cow<'_, str> {
    if !SENTINELS.iter().any(|(token, _)| text.contains(token)) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + 32);
    let mut in_string = false;
    let mut escaped = false;
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
        } else if let Some((token, payload)) =
            SENTINELS.iter().find(|(token, _)| rest.starts_with(token))
        {
            out.push_str("{\"");
            out.push_str(NUMBER_DOUBLE);
            out.push_str("\":\"");
            out.push_str(payload);
            out.push_str("\"}");
            rest = &rest[token.len()..];
            continue;
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }

    Cow::Owned(out)
}
