//! Forward encoding of typed values into tagged JSON
//!
//! Output is exactly what [`decode`](super::decode) inverts.

use serde_json::Value as Json;

use super::decode::{DTYPE_KEY, NDARRAY_OBJECT, OBJECT_TAG, SHAPE_KEY, TUPLE_TAG, VALUES_TAG};
use super::json::number_double;
use super::value::{ArrayData, NdArray, Value};

/// Encode a typed [`Value`] into its JSON-safe tagged form.
#[must_use]
pub fn encode(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(i) => Json::from(*i),
        Value::Float(f) => float(*f),
        Value::Str(s) => Json::String(s.clone()),
        Value::List(items) => Json::Array(items.iter().map(encode).collect()),
        Value::Tuple(items) => {
            let mut map = serde_json::Map::new();
            map.insert(
                TUPLE_TAG.to_string(),
                Json::Array(items.iter().map(encode).collect()),
            );
            Json::Object(map)
        }
        Value::Array(array) => ndarray(array),
        Value::Map(map) => Json::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), encode(value)))
                .collect(),
        ),
    }
}

fn float(f: f64) -> Json {
    serde_json::Number::from_f64(f).map_or_else(|| number_double(f), Json::Number)
}

fn ndarray(array: &NdArray) -> Json {
    let flat: Vec<Json> = match array.data() {
        ArrayData::Bool(v) => v.iter().map(|b| Json::Bool(*b)).collect(),
        ArrayData::Int(v) => v.iter().map(|i| Json::from(*i)).collect(),
        ArrayData::UInt(v) => v.iter().map(|u| Json::from(*u)).collect(),
        ArrayData::Float(v) => v.iter().map(|f| float(*f)).collect(),
    };

    let mut map = serde_json::Map::new();
    map.insert(OBJECT_TAG.to_string(), Json::from(NDARRAY_OBJECT));
    map.insert(VALUES_TAG.to_string(), nest(&flat, array.shape()));
    map.insert(DTYPE_KEY.to_string(), Json::from(array.dtype().name()));
    // nested lists cannot carry dimensions past a zero-length one
    if array.is_empty() {
        map.insert(SHAPE_KEY.to_string(), Json::from(array.shape().to_vec()));
    }
    Json::Object(map)
}

/// Rebuild nested lists from row-major elements.
fn nest(flat: &[Json], shape: &[usize]) -> Json {
    match shape.split_first() {
        None => flat.first().cloned().unwrap_or(Json::Null),
        Some((&len, rest)) => {
            let stride: usize = rest.iter().product();
            Json::Array(
                (0..len)
                    .map(|i| nest(&flat[i * stride..(i + 1) * stride], rest))
                    .collect(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode, DType};
    use serde_json::json;

    #[test]
    fn test_tuple_encoding() {
        let value = Value::Tuple(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(encode(&value), json!({"py/tuple": [1, 2]}));
    }

    #[test]
    fn test_nan_encoding() {
        assert_eq!(encode(&Value::Float(f64::NAN)), json!({"$numberDouble": "NaN"}));
    }

    #[test]
    fn test_ndarray_encoding_nests_rows() {
        let array = NdArray::new(
            DType::Int32,
            vec![2, 3],
            ArrayData::Int(vec![1, 2, 3, 4, 5, 6]),
        )
        .unwrap();
        let encoded = encode(&Value::Array(array.clone()));
        assert_eq!(encoded["values"], json!([[1, 2, 3], [4, 5, 6]]));
        assert_eq!(encoded["dtype"], "int32");
        assert_eq!(decode(&encoded).unwrap(), Value::Array(array));
    }

    #[test]
    fn test_empty_rows_keep_shape() {
        let array = NdArray::new(DType::Float64, vec![2, 0], ArrayData::Float(vec![])).unwrap();
        let encoded = encode(&Value::Array(array.clone()));
        assert_eq!(encoded["values"], json!([[], []]));
        assert_eq!(decode(&encoded).unwrap(), Value::Array(array));
    }

    #[test]
    fn test_empty_outer_dimension_keeps_inner_shape() {
        let array = NdArray::new(DType::Float64, vec![0, 3], ArrayData::Float(vec![])).unwrap();
        let encoded = encode(&Value::Array(array.clone()));
        assert_eq!(encoded["values"], json!([]));
        assert_eq!(encoded["shape"], json!([0, 3]));
        assert_eq!(decode(&encoded).unwrap(), Value::Array(array));
    }

    #[test]
    fn test_non_empty_arrays_carry_no_shape() {
        let array = NdArray::new(DType::UInt64, vec![1], ArrayData::UInt(vec![u64::MAX])).unwrap();
        let encoded = encode(&Value::Array(array.clone()));
        assert!(encoded.get("shape").is_none());
        assert_eq!(encoded["values"], json!([u64::MAX]));
        assert_eq!(decode(&encoded).unwrap(), Value::Array(array));
    }
}
