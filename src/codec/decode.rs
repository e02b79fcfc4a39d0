//! Recursive-descent recovery of typed values from tagged JSON
//!
//! Tags are checked at each mapping node in a fixed order:
//!
//! 1. `{"values": x}` (sole key) unwraps to `x`
//! 2. `{"py/tuple": [...]}` (sole key) becomes a [`Value::Tuple`]
//! 3. `{"py/object": "numpy.ndarray", "values": ..., "dtype"?: ..., "shape"?: ...}` becomes a
//!    [`Value::Array`]
//! 4. `{"$numberDouble": "NaN"}` (sole key) becomes a [`Value::Float`]
//! 5. anything else is a mapping whose values are decoded in place

use std::collections::BTreeMap;

use serde_json::Value as Json;
use tracing::debug;

use super::json::{kind_name, parse_number_double, NUMBER_DOUBLE};
use super::literal::parse_literal;
use super::value::{DType, NdArray, Scalar, Value};
use crate::{Error, Result};

/// Key of the single-element wrapper.
pub const VALUES_TAG: &str = "values";
/// Key of the tuple wrapper.
pub const TUPLE_TAG: &str = "py/tuple";
/// Key of the object-type tag.
pub const OBJECT_TAG: &str = "py/object";
/// Key of the explicit element type next to an array.
pub const DTYPE_KEY: &str = "dtype";
/// Key of the explicit dimensions next to an empty array.
pub const SHAPE_KEY: &str = "shape";
/// Object-type tag written for numeric arrays.
pub const NDARRAY_OBJECT: &str = "numpy.ndarray";

/// Decode a JSON value into a typed [`Value`].
///
/// # Errors
///
/// Returns [`Error::DecodeError`] for malformed tag payloads.
pub fn decode(json: &Json) -> Result<Value> {
    match json {
        Json::Null => Ok(Value::Null),
        Json::Bool(b) => Ok(Value::Bool(*b)),
        Json::Number(n) => Ok(number(n)),
        Json::String(s) => Ok(string(s)),
        Json::Array(items) => items.iter().map(decode).collect::<Result<_>>().map(Value::List),
        Json::Object(map) => object(map),
    }
}

#[allow(clippy::cast_precision_loss)]
fn number(n: &serde_json::Number) -> Value {
    match number_scalar(n) {
        Scalar::Int(i) => Value::Int(i),
        Scalar::UInt(u) => Value::Float(u as f64),
        Scalar::Float(f) => Value::Float(f),
        Scalar::Bool(b) => Value::Bool(b),
    }
}

fn number_scalar(n: &serde_json::Number) -> Scalar {
    if let Some(i) = n.as_i64() {
        Scalar::Int(i)
    } else if let Some(u) = n.as_u64() {
        Scalar::UInt(u)
    } else {
        Scalar::Float(n.as_f64().unwrap_or(f64::NAN))
    }
}

fn string(s: &str) -> Value {
    if s.starts_with('[') {
        match parse_literal(s) {
            Ok(value) => return value,
            Err(err) => debug!(error = %err, "keeping list-like string verbatim"),
        }
    }
    Value::Str(s.to_string())
}

fn object(map: &serde_json::Map<String, Json>) -> Result<Value> {
    if map.len() == 1 {
        if let Some(inner) = map.get(VALUES_TAG) {
            return decode(inner);
        }
        if let Some(inner) = map.get(TUPLE_TAG) {
            return match decode(inner)? {
                Value::List(items) => Ok(Value::Tuple(items)),
                other => Ok(other),
            };
        }
    }

    if let Some(tag) = map.get(OBJECT_TAG).and_then(Json::as_str) {
        if is_ndarray_tag(tag) {
            return ndarray(map).map(Value::Array);
        }
    }

    if map.len() == 1 {
        if let Some(payload) = map.get(NUMBER_DOUBLE) {
            let text = payload.as_str().ok_or_else(|| {
                Error::DecodeError(format!(
                    "{NUMBER_DOUBLE} payload must be a string, found {}",
                    kind_name(payload)
                ))
            })?;
            return parse_number_double(text).map(Value::Float);
        }
    }

    let mut out = BTreeMap::new();
    for (key, value) in map {
        out.insert(key.clone(), decode(value)?);
    }
    Ok(Value::Map(out))
}

fn is_ndarray_tag(tag: &str) -> bool {
    tag == NDARRAY_OBJECT || tag == "ndarray"
}

fn ndarray(map: &serde_json::Map<String, Json>) -> Result<NdArray> {
    let values = map
        .get(VALUES_TAG)
        .ok_or_else(|| Error::DecodeError("ndarray object without 'values' field".to_string()))?;

    let shape = match map.get(SHAPE_KEY) {
        Some(explicit) => explicit_shape(explicit)?,
        None => {
            let mut shape = Vec::new();
            shape_of(values, &mut shape);
            shape
        }
    };
    let mut elements = Vec::new();
    flatten(values, &shape, &mut elements)?;

    let dtype = match map.get(DTYPE_KEY) {
        Some(Json::String(name)) => DType::parse(name)?,
        Some(other) => {
            return Err(Error::DecodeError(format!(
                "ndarray dtype must be a string, found {}",
                kind_name(other)
            )))
        }
        None => Scalar::infer_dtype(&elements),
    };

    NdArray::from_scalars(dtype, shape, &elements)
}

/// Dimensions written next to the values, e.g. `[0, 3]` for an empty matrix.
fn explicit_shape(json: &Json) -> Result<Vec<usize>> {
    let dims = json
        .as_array()
        .ok_or_else(|| Error::DecodeError("ndarray shape must be a list".to_string()))?;
    dims.iter()
        .map(|dim| {
            dim.as_u64()
                .and_then(|d| usize::try_from(d).ok())
                .ok_or_else(|| Error::DecodeError(format!("invalid ndarray dimension {dim}")))
        })
        .collect()
}

/// Shape implied by the first element at every nesting level.
fn shape_of(values: &Json, shape: &mut Vec<usize>) {
    if let Json::Array(items) = values {
        shape.push(items.len());
        if let Some(first) = items.first() {
            shape_of(first, shape);
        }
    }
}

fn flatten(values: &Json, shape: &[usize], out: &mut Vec<Scalar>) -> Result<()> {
    match (values, shape.split_first()) {
        (Json::Array(items), Some((&len, rest))) => {
            if items.len() != len {
                return Err(Error::DecodeError(format!(
                    "ragged ndarray: expected {len} items, found {}",
                    items.len()
                )));
            }
            items.iter().try_for_each(|item| flatten(item, rest, out))
        }
        (Json::Array(_), None) => Err(Error::DecodeError(
            "ragged ndarray: unexpected nested list".to_string(),
        )),
        (scalar, None) => {
            out.push(element(scalar)?);
            Ok(())
        }
        (_, Some(_)) => Err(Error::DecodeError(
            "ragged ndarray: expected nested list".to_string(),
        )),
    }
}

fn element(json: &Json) -> Result<Scalar> {
    match json {
        Json::Bool(b) => Ok(Scalar::Bool(*b)),
        Json::Number(n) => Ok(number_scalar(n)),
        Json::Object(map) if map.len() == 1 => match map.get(NUMBER_DOUBLE).and_then(Json::as_str) {
            Some(text) => parse_number_double(text).map(Scalar::Float),
            None => Err(Error::DecodeError("non-numeric ndarray element".to_string())),
        },
        other => Err(Error::DecodeError(format!(
            "non-numeric ndarray element of kind {}",
            kind_name(other)
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ArrayData;
    use serde_json::json;

    #[test]
    fn test_values_wrapper_unwraps() {
        assert_eq!(decode(&json!({"values": 3})).unwrap(), Value::Int(3));
    }

    #[test]
    fn test_values_with_other_keys_is_mapping() {
        let value = decode(&json!({"values": 3, "other": 1})).unwrap();
        assert_eq!(value.get("values"), Some(&Value::Int(3)));
    }

    #[test]
    fn test_tuple_tag() {
        let value = decode(&json!({"py/tuple": [1, "a"]})).unwrap();
        assert_eq!(
            value,
            Value::Tuple(vec![Value::Int(1), Value::Str("a".to_string())])
        );
    }

    #[test]
    fn test_ndarray_with_dtype() {
        let value = decode(&json!({
            "py/object": "numpy.ndarray",
            "values": [[1, 2], [3, 4]],
            "dtype": "float32"
        }))
        .unwrap();
        let array = value.as_array().unwrap();
        assert_eq!(array.dtype(), DType::Float32);
        assert_eq!(array.shape(), &[2, 2]);
        assert_eq!(array.data(), &ArrayData::Float(vec![1.0, 2.0, 3.0, 4.0]));
    }

    #[test]
    fn test_ndarray_inferred_int() {
        let value = decode(&json!({"py/object": "numpy.ndarray", "values": [1, 2, 3]})).unwrap();
        assert_eq!(value.as_array().unwrap().dtype(), DType::Int64);
    }

    #[test]
    fn test_ndarray_scalar_zero_dim() {
        let value = decode(&json!({"py/object": "numpy.ndarray", "values": 2.5})).unwrap();
        let array = value.as_array().unwrap();
        assert!(array.shape().is_empty());
        assert_eq!(array.len(), 1);
    }

    #[test]
    fn test_ndarray_explicit_shape_for_empty_matrix() {
        let value = decode(&json!({
            "py/object": "numpy.ndarray",
            "values": [],
            "dtype": "float64",
            "shape": [0, 3]
        }))
        .unwrap();
        let array = value.as_array().unwrap();
        assert_eq!(array.shape(), &[0, 3]);
        assert!(array.is_empty());
    }

    #[test]
    fn test_ndarray_shape_must_match_values() {
        let wrong = json!({"py/object": "numpy.ndarray", "values": [1, 2], "shape": [3]});
        assert!(decode(&wrong).unwrap_err().is_decode());
        let bad = json!({"py/object": "numpy.ndarray", "values": [], "shape": [-1]});
        assert!(decode(&bad).unwrap_err().is_decode());
    }

    #[test]
    fn test_ndarray_uint64_above_i64_max() {
        let value = decode(&json!({
            "py/object": "numpy.ndarray",
            "values": [18_446_744_073_709_551_615_u64, 1],
            "dtype": "uint64"
        }))
        .unwrap();
        assert_eq!(value.as_array().unwrap().data(), &ArrayData::UInt(vec![u64::MAX, 1]));
    }

    #[test]
    fn test_ndarray_without_values_fails() {
        let err = decode(&json!({"py/object": "numpy.ndarray", "dtype": "int64"})).unwrap_err();
        assert!(err.is_decode());
    }

    #[test]
    fn test_ragged_ndarray_fails() {
        let ragged = json!({"py/object": "numpy.ndarray", "values": [[1, 2], [3]]});
        let err = decode(&ragged).unwrap_err();
        assert!(err.is_decode());
    }

    #[test]
    fn test_number_double() {
        let value = decode(&json!({"$numberDouble": "-Infinity"})).unwrap();
        assert_eq!(value, Value::Float(f64::NEG_INFINITY));
    }

    #[test]
    fn test_list_string_parsed() {
        assert_eq!(
            decode(&json!("[1, 2, 3]")).unwrap(),
            Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        );
        assert_eq!(decode(&json!("hello")).unwrap(), Value::Str("hello".to_string()));
        assert_eq!(decode(&json!("[oops")).unwrap(), Value::Str("[oops".to_string()));
    }

    #[test]
    fn test_nested_mapping_recurses() {
        let value = decode(&json!({"a": {"b": {"py/tuple": [1]}}})).unwrap();
        assert_eq!(
            value.get("a").and_then(|a| a.get("b")),
            Some(&Value::Tuple(vec![Value::Int(1)]))
        );
    }
}
