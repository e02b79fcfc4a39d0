//! Integration tests for value type recovery

use labbook::codec::{decode, encode, parse_json, parse_literal, ArrayData, DType, NdArray, Value};
use serde_json::json;

fn list(items: Vec<Value>) -> Value {
    Value::List(items)
}

#[test]
fn test_plain_string_is_unchanged() {
    assert_eq!(decode(&json!("hello")).unwrap(), Value::from("hello"));
    assert_eq!(decode(&json!("")).unwrap(), Value::from(""));
}

#[test]
fn test_list_string_is_parsed() {
    assert_eq!(
        decode(&json!("[1, 2, 3]")).unwrap(),
        list(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
    );
}

#[test]
fn test_printed_array_string_is_parsed() {
    // numpy prints arrays without commas
    assert_eq!(
        decode(&json!("[[1. 2.]\n [3. 4.]]")).unwrap(),
        list(vec![
            list(vec![Value::Float(1.0), Value::Float(2.0)]),
            list(vec![Value::Float(3.0), Value::Float(4.0)]),
        ])
    );
}

#[test]
fn test_unparseable_list_string_kept_verbatim() {
    let text = "[INFO] training started";
    assert_eq!(decode(&json!(text)).unwrap(), Value::from(text));
}

#[test]
fn test_literal_parser_never_evaluates() {
    assert!(parse_literal("[__import__('os').system('true')]").is_err());
    assert!(parse_literal("[1 + 1]").is_err());
}

#[test]
fn test_nested_run_document() {
    let doc = json!({
        "config": {
            "layers": {"py/tuple": [64, 32]},
            "mean": {"py/object": "numpy.ndarray", "values": [0.5, 0.25], "dtype": "float64"},
            "wrapped": {"values": "[1, 2]"},
            "lr": 0.001
        },
        "result": {"$numberDouble": "NaN"},
        "tags": ["a", "b"]
    });

    let value = decode(&doc).unwrap();
    let config = value.get("config").unwrap();
    assert_eq!(
        config.get("layers"),
        Some(&Value::Tuple(vec![Value::Int(64), Value::Int(32)]))
    );
    assert_eq!(
        config.get("mean").and_then(Value::as_array).map(NdArray::to_f64_vec),
        Some(vec![0.5, 0.25])
    );
    assert_eq!(
        config.get("wrapped"),
        Some(&list(vec![Value::Int(1), Value::Int(2)]))
    );
    assert!(value.get("result").and_then(Value::as_f64).unwrap().is_nan());
    assert_eq!(value.get("tags").and_then(Value::as_slice).map(<[Value]>::len), Some(2));
}

#[test]
fn test_values_tag_takes_precedence_over_ndarray() {
    // Sole-key `values` is checked before the object tag
    let value = decode(&json!({"values": {"py/tuple": [1]}})).unwrap();
    assert_eq!(value, Value::Tuple(vec![Value::Int(1)]));
}

#[test]
fn test_ndarray_without_values_is_error() {
    let err = decode(&json!({"py/object": "ndarray", "dtype": "int64"})).unwrap_err();
    assert!(err.is_decode());
}

#[test]
fn test_ndarray_explicit_dtype_casts() {
    let value = decode(&json!({
        "py/object": "numpy.ndarray",
        "values": [1.7, -2.2],
        "dtype": "int32"
    }))
    .unwrap();
    let array = value.as_array().unwrap();
    assert_eq!(array.dtype(), DType::Int32);
    assert_eq!(array.data(), &ArrayData::Int(vec![1, -2]));
}

#[test]
fn test_ndarray_dtype_out_of_range() {
    let err = decode(&json!({
        "py/object": "numpy.ndarray",
        "values": [300],
        "dtype": "uint8"
    }))
    .unwrap_err();
    assert!(err.is_decode());
}

#[test]
fn test_ndarray_uint64_full_range() {
    let value = decode(&json!({
        "py/object": "numpy.ndarray",
        "values": [18_446_744_073_709_551_615_u64],
        "dtype": "uint64"
    }))
    .unwrap();
    let array = value.as_array().unwrap();
    assert_eq!(array.dtype(), DType::UInt64);
    assert_eq!(array.data(), &ArrayData::UInt(vec![u64::MAX]));
    assert_eq!(encode(&value)["values"], json!([u64::MAX]));
}

#[test]
fn test_ndarray_inferred_uint64() {
    let value = decode(&json!({"py/object": "numpy.ndarray", "values": [u64::MAX, 0]})).unwrap();
    assert_eq!(value.as_array().unwrap().dtype(), DType::UInt64);
}

#[test]
fn test_ndarray_float16_rounding() {
    let value = decode(&json!({
        "py/object": "numpy.ndarray",
        "values": [0.1, 70000.0],
        "dtype": "float16"
    }))
    .unwrap();
    let array = value.as_array().unwrap();
    assert_eq!(array.dtype(), DType::Float16);
    assert_eq!(array.to_f64_vec(), vec![0.099_975_585_937_5, f64::INFINITY]);
}

#[test]
fn test_empty_matrix_round_trip() {
    let array = NdArray::new(DType::Int32, vec![0, 3], ArrayData::Int(vec![])).unwrap();
    let encoded = encode(&Value::from(array.clone()));
    assert_eq!(
        encoded,
        json!({"py/object": "numpy.ndarray", "values": [], "dtype": "int32", "shape": [0, 3]})
    );
    assert_eq!(decode(&encoded).unwrap(), Value::Array(array));
}

#[test]
fn test_unknown_dtype_is_error() {
    let err = decode(&json!({
        "py/object": "numpy.ndarray",
        "values": [1],
        "dtype": "complex128"
    }))
    .unwrap_err();
    assert!(err.is_decode());
}

#[test]
fn test_bare_sentinels_in_json_text() {
    let text = r#"{"best": Infinity, "worst": -Infinity, "note": "NaN stays text", "x": NaN}"#;
    let json = parse_json(text).unwrap();
    let value = decode(&json).unwrap();
    assert_eq!(value.get("best"), Some(&Value::Float(f64::INFINITY)));
    assert_eq!(value.get("worst"), Some(&Value::Float(f64::NEG_INFINITY)));
    assert_eq!(value.get("note"), Some(&Value::from("NaN stays text")));
    assert_eq!(value.get("x"), Some(&Value::Float(f64::NAN)));
}

#[test]
fn test_encode_sentinels() {
    assert_eq!(
        encode(&Value::Float(f64::NEG_INFINITY)),
        json!({"$numberDouble": "-Infinity"})
    );
    assert_eq!(encode(&Value::Float(1.5)), json!(1.5));
}

#[test]
fn test_encode_array_with_dtype() {
    let array = NdArray::new(DType::Int16, vec![2, 2], ArrayData::Int(vec![1, 2, 3, 4])).unwrap();
    assert_eq!(
        encode(&Value::from(array.clone())),
        json!({"py/object": "numpy.ndarray", "values": [[1, 2], [3, 4]], "dtype": "int16"})
    );
    assert_eq!(
        decode(&encode(&Value::from(array.clone()))).unwrap(),
        Value::Array(array)
    );
}
