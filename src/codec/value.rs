//! Typed values recovered from run documents

use std::collections::BTreeMap;
use std::fmt;

use crate::{Error, Result};

/// A richly-typed value recovered from a JSON-safe run document.
#[derive(Debug, Clone)]
pub enum Value {
    /// JSON `null`.
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer that fits in `i64`.
    Int(i64),
    /// Floating point, including NaN and the infinities.
    Float(f64),
    /// Text.
    Str(String),
    /// Ordered, variable-length sequence.
    List(Vec<Self>),
    /// Fixed sequence restored from a `py/tuple` wrapper.
    Tuple(Vec<Self>),
    /// Numeric array restored from an `ndarray` object.
    Array(NdArray),
    /// String-keyed mapping.
    Map(BTreeMap<String, Self>),
}

impl Value {
    /// Borrow as a string slice.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Integer value, if this is an `Int`.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric value of an `Int` or `Float`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Boolean value, if this is a `Bool`.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Items of a `List` or `Tuple`.
    #[must_use]
    pub fn as_slice(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) | Self::Tuple(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow as a mapping.
    #[must_use]
    pub const fn as_map(&self) -> Option<&BTreeMap<String, Self>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Borrow as a numeric array.
    #[must_use]
    pub const fn as_array(&self) -> Option<&NdArray> {
        match self {
            Self::Array(array) => Some(array),
            _ => None,
        }
    }

    /// Look up a key in a mapping.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Self> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// True for `Null`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

fn float_eq(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

// NaN compares equal to NaN so decoded records can be compared structurally.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => float_eq(*a, *b),
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) | (Self::Tuple(a), Self::Tuple(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            _ => false,
        }
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

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<Vec<Self>> for Value {
    fn from(items: Vec<Self>) -> Self {
        Self::List(items)
    }
}

impl From<NdArray> for Value {
    fn from(array: NdArray) -> Self {
        Self::Array(array)
    }
}

impl From<BTreeMap<String, Self>> for Value {
    fn from(map: BTreeMap<String, Self>) -> Self {
        Self::Map(map)
    }
}

/// Element type of a numeric array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    /// `bool`
    Bool,
    /// `int8`
    Int8,
    /// `int16`
    Int16,
    /// `int32`
    Int32,
    /// `int64`
    Int64,
    /// `uint8`
    UInt8,
    /// `uint16`
    UInt16,
    /// `uint32`
    UInt32,
    /// `uint64`
    UInt64,
    /// `float16`
    Float16,
    /// `float32`
    Float32,
    /// `float64`
    Float64,
}

impl DType {
    /// Parse a dtype name as written next to serialized arrays.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DecodeError`] for unknown or non-numeric dtypes.
    pub fn parse(name: &str) -> Result<Self> {
        let dtype = match name.trim() {
            "bool" | "bool_" | "|b1" => Self::Bool,
            "int8" | "|i1" => Self::Int8,
            "int16" | "<i2" => Self::Int16,
            "int32" | "<i4" => Self::Int32,
            "int64" | "int" | "<i8" => Self::Int64,
            "uint8" | "|u1" => Self::UInt8,
            "uint16" | "<u2" => Self::UInt16,
            "uint32" | "<u4" => Self::UInt32,
            "uint64" | "<u8" => Self::UInt64,
            "float16" | "<f2" => Self::Float16,
            "float32" | "<f4" => Self::Float32,
            "float64" | "float" | "<f8" => Self::Float64,
            other => {
                return Err(Error::DecodeError(format!(
                    "unsupported ndarray dtype '{other}'"
                )))
            }
        };
        Ok(dtype)
    }

    /// Canonical dtype name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::UInt8 => "uint8",
            Self::UInt16 => "uint16",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::Float16 => "float16",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
        }
    }

    /// True for the integer dtypes.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            Self::Int8
                | Self::Int16
                | Self::Int32
                | Self::Int64
                | Self::UInt8
                | Self::UInt16
                | Self::UInt32
                | Self::UInt64
        )
    }

    /// True for the floating point dtypes.
    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float16 | Self::Float32 | Self::Float64)
    }

    /// Inclusive integer range representable by this dtype.
    const fn int_range(self) -> (i128, i128) {
        match self {
            Self::Int8 => (i8::MIN as i128, i8::MAX as i128),
            Self::Int16 => (i16::MIN as i128, i16::MAX as i128),
            Self::Int32 => (i32::MIN as i128, i32::MAX as i128),
            Self::UInt8 => (0, u8::MAX as i128),
            Self::UInt16 => (0, u16::MAX as i128),
            Self::UInt32 => (0, u32::MAX as i128),
            Self::UInt64 => (0, u64::MAX as i128),
            _ => (i64::MIN as i128, i64::MAX as i128),
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single array element before it is cast to the array's dtype.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    /// Boolean element.
    Bool(bool),
    /// Integer element.
    Int(i64),
    /// Unsigned integer element above `i64::MAX`.
    UInt(u64),
    /// Floating point element.
    Float(f64),
}

impl Scalar {
    /// Smallest dtype family that holds every element, numpy style.
    #[must_use]
    pub fn infer_dtype(elements: &[Self]) -> DType {
        if elements.is_empty() {
            return DType::Float64;
        }
        if elements.iter().all(|e| matches!(e, Self::Bool(_))) {
            DType::Bool
        } else if elements.iter().any(|e| matches!(e, Self::Float(_))) {
            DType::Float64
        } else if elements.iter().any(|e| matches!(e, Self::UInt(_))) {
            // no integer dtype holds both a negative value and one above i64::MAX
            if elements.iter().any(|e| matches!(e, Self::Int(i) if *i < 0)) {
                DType::Float64
            } else {
                DType::UInt64
            }
        } else {
            DType::Int64
        }
    }
}

/// Flat element storage of a numeric array.
#[derive(Debug, Clone)]
pub enum ArrayData {
    /// Boolean elements.
    Bool(Vec<bool>),
    /// Integer elements (every integer dtype except `uint64`).
    Int(Vec<i64>),
    /// `uint64` elements.
    UInt(Vec<u64>),
    /// Floating point elements (all float dtypes).
    Float(Vec<f64>),
}

impl ArrayData {
    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Bool(v) => v.len(),
            Self::Int(v) => v.len(),
            Self::UInt(v) => v.len(),
            Self::Float(v) => v.len(),
        }
    }

    /// True when there are no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at flat index `i` as a [`Scalar`].
    #[must_use]
    pub fn scalar(&self, i: usize) -> Option<Scalar> {
        match self {
            Self::Bool(v) => v.get(i).copied().map(Scalar::Bool),
            Self::Int(v) => v.get(i).copied().map(Scalar::Int),
            Self::UInt(v) => v.get(i).copied().map(Scalar::UInt),
            Self::Float(v) => v.get(i).copied().map(Scalar::Float),
        }
    }
}

impl PartialEq for ArrayData {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::UInt(a), Self::UInt(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| float_eq(*x, *y))
            }
            _ => false,
        }
    }
}

/// Row-major numeric array with an explicit element type.
#[derive(Debug, Clone, PartialEq)]
pub struct NdArray {
    dtype: DType,
    shape: Vec<usize>,
    data: ArrayData,
}

impl NdArray {
    /// Build an array from already-typed storage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DecodeError`] if the storage does not match the dtype
    /// family or the element count does not match the shape.
    pub fn new(dtype: DType, shape: Vec<usize>, data: ArrayData) -> Result<Self> {
        let family_ok = match &data {
            ArrayData::Bool(_) => dtype == DType::Bool,
            ArrayData::Int(_) => dtype.is_integer() && dtype != DType::UInt64,
            ArrayData::UInt(_) => dtype == DType::UInt64,
            ArrayData::Float(_) => dtype.is_float(),
        };
        if !family_ok {
            return Err(Error::DecodeError(format!(
                "ndarray storage does not match dtype {dtype}"
            )));
        }
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(Error::DecodeError(format!(
                "ndarray shape {shape:?} needs {expected} elements, got {}",
                data.len()
            )));
        }
        Ok(Self { dtype, shape, data })
    }

    /// Cast raw elements to `dtype`, the way an explicit dtype argument does.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DecodeError`] when an element cannot be represented.
    pub fn from_scalars(dtype: DType, shape: Vec<usize>, elements: &[Scalar]) -> Result<Self> {
        let data = match dtype {
            DType::Bool => ArrayData::Bool(
                elements
                    .iter()
                    .map(|e| match *e {
                        Scalar::Bool(b) => b,
                        Scalar::Int(i) => i != 0,
                        Scalar::UInt(u) => u != 0,
                        Scalar::Float(f) => f != 0.0,
                    })
                    .collect(),
            ),
            DType::Float16 => {
                ArrayData::Float(elements.iter().map(|e| round_f16(widen(*e))).collect())
            }
            DType::Float32 => {
                ArrayData::Float(elements.iter().map(|e| round_f32(widen(*e))).collect())
            }
            DType::Float64 => ArrayData::Float(elements.iter().map(|e| widen(*e)).collect()),
            DType::UInt64 => ArrayData::UInt(
                elements
                    .iter()
                    .map(|e| cast_uint64(*e))
                    .collect::<Result<Vec<_>>>()?,
            ),
            _ => ArrayData::Int(
                elements
                    .iter()
                    .map(|e| cast_int(dtype, *e))
                    .collect::<Result<Vec<_>>>()?,
            ),
        };
        Self::new(dtype, shape, data)
    }

    /// Element type.
    #[must_use]
    pub const fn dtype(&self) -> DType {
        self.dtype
    }

    /// Dimensions, outermost first.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Flat row-major element storage.
    #[must_use]
    pub const fn data(&self) -> &ArrayData {
        &self.data
    }

    /// Total element count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the array holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Elements widened to `f64`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_f64_vec(&self) -> Vec<f64> {
        match &self.data {
            ArrayData::Bool(v) => v.iter().map(|b| f64::from(u8::from(*b))).collect(),
            ArrayData::Int(v) => v.iter().map(|i| *i as f64).collect(),
            ArrayData::UInt(v) => v.iter().map(|u| *u as f64).collect(),
            ArrayData::Float(v) => v.clone(),
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn widen(element: Scalar) -> f64 {
    match element {
        Scalar::Bool(b) => f64::from(u8::from(b)),
        Scalar::Int(i) => i as f64,
        Scalar::UInt(u) => u as f64,
        Scalar::Float(f) => f,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn round_f32(f: f64) -> f64 {
    f64::from(f as f32)
}

fn round_f16(f: f64) -> f64 {
    half::f16::from_f64(f).to_f64()
}

fn cast_int(dtype: DType, element: Scalar) -> Result<i64> {
    let wide = cast_wide(dtype, element)?;
    #[allow(clippy::cast_possible_truncation)]
    let narrowed = wide as i64;
    Ok(narrowed)
}

fn cast_uint64(element: Scalar) -> Result<u64> {
    let wide = cast_wide(DType::UInt64, element)?;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let narrowed = wide as u64;
    Ok(narrowed)
}

/// Element as an integer checked against the range of `dtype`.
fn cast_wide(dtype: DType, element: Scalar) -> Result<i128> {
    let wide: i128 = match element {
        Scalar::Bool(b) => i128::from(b),
        Scalar::Int(i) => i128::from(i),
        Scalar::UInt(u) => i128::from(u),
        Scalar::Float(f) => {
            if !f.is_finite() {
                return Err(Error::DecodeError(format!(
                    "cannot cast non-finite value {f} to {dtype}"
                )));
            }
            #[allow(clippy::cast_possible_truncation)]
            let truncated = f.trunc() as i128;
            truncated
        }
    };
    let (lo, hi) = dtype.int_range();
    if wide < lo || wide > hi {
        return Err(Error::DecodeError(format!(
            "value {wide} out of range for {dtype}"
        )));
    }
    Ok(wide)
}
