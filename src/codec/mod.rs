//! Value codec
//!
//! Run documents are stored as JSON, which loses type information: tuples,
//! numeric arrays and non-finite floats only survive as tagged mappings or
//! printed strings. This module turns them back into a small typed grammar.
//!
//! ```text
//! Value ::= Null | Bool | Int | Float | Str
//!         | List(Value*) | Tuple(Value*) | Array(NdArray) | Map(String -> Value)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use labbook::codec::{decode, encode, Value};
//! use serde_json::json;
//!
//! let value = decode(&json!({"py/tuple": [1, 2]}))?;
//! assert_eq!(value, Value::Tuple(vec![Value::Int(1), Value::Int(2)]));
//! assert_eq!(encode(&value), json!({"py/tuple": [1, 2]}));
//!
//! // list-shaped strings are parsed by a literal-only parser
//! assert_eq!(decode(&json!("[1, 2]"))?, Value::List(vec![Value::Int(1), Value::Int(2)]));
//! # Ok::<(), labbook::Error>(())
//! ```

mod decode;
mod encode;
mod json;
mod literal;
mod value;

pub use decode::{
    decode, DTYPE_KEY, NDARRAY_OBJECT, OBJECT_TAG, SHAPE_KEY, TUPLE_TAG, VALUES_TAG,
};
pub use encode::encode;
pub use json::{number_double, parse_json, parse_number_double, parse_object, NUMBER_DOUBLE};
pub use literal::{parse_literal, MAX_DEPTH};
pub use value::{ArrayData, DType, NdArray, Scalar, Value};
