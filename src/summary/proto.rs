//! Subset of the TensorFlow `Event` protobuf needed for scalar summaries
//!
//! Field numbers follow `tensorflow/core/util/event.proto` and
//! `tensorflow/core/framework/summary.proto`; unknown fields are skipped.

/// `tensorflow.Event`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EventProto {
    /// Wall clock time in seconds.
    #[prost(double, tag = "1")]
    pub wall_time: f64,
    /// Global step.
    #[prost(int64, tag = "2")]
    pub step: i64,
    /// Summary payload, if this event carries one.
    #[prost(message, optional, tag = "5")]
    pub summary: ::core::option::Option<SummaryProto>,
}

/// `tensorflow.Summary`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SummaryProto {
    /// Tagged values.
    #[prost(message, repeated, tag = "1")]
    pub value: ::prost::alloc::vec::Vec<SummaryValueProto>,
}

/// `tensorflow.Summary.Value`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SummaryValueProto {
    /// Tag name.
    #[prost(string, tag = "1")]
    pub tag: ::prost::alloc::string::String,
    /// Legacy scalar.
    #[prost(float, optional, tag = "2")]
    pub simple_value: ::core::option::Option<f32>,
    /// Tensor-valued summary (scalars written by TF2).
    #[prost(message, optional, tag = "8")]
    pub tensor: ::core::option::Option<TensorProto>,
}

/// `tensorflow.TensorProto`, scalar-relevant fields only.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TensorProto {
    /// `tensorflow.DataType` enum value.
    #[prost(int32, tag = "1")]
    pub dtype: i32,
    /// Raw little-endian element bytes.
    #[prost(bytes = "vec", tag = "4")]
    pub tensor_content: ::prost::alloc::vec::Vec<u8>,
    /// `DT_FLOAT` elements.
    #[prost(float, repeated, tag = "5")]
    pub float_val: ::prost::alloc::vec::Vec<f32>,
    /// `DT_DOUBLE` elements.
    #[prost(double, repeated, tag = "6")]
    pub double_val: ::prost::alloc::vec::Vec<f64>,
}

const DT_FLOAT: i32 = 1;
const DT_DOUBLE: i32 = 2;

impl SummaryValueProto {
    /// Scalar carried by this value, if any.
    #[must_use]
    pub fn scalar(&self) -> Option<f64> {
        if let Some(v) = self.simple_value {
            return Some(f64::from(v));
        }
        self.tensor.as_ref().and_then(TensorProto::scalar)
    }
}

impl TensorProto {
    /// Single element of a scalar float tensor.
    #[must_use]
    pub fn scalar(&self) -> Option<f64> {
        if let Some(v) = self.float_val.first() {
            return Some(f64::from(*v));
        }
        if let Some(v) = self.double_val.first() {
            return Some(*v);
        }
        match self.dtype {
            DT_FLOAT => self
                .tensor_content
                .get(..4)
                .and_then(|b| <[u8; 4]>::try_from(b).ok())
                .map(|b| f64::from(f32::from_le_bytes(b))),
            DT_DOUBLE => self
                .tensor_content
                .get(..8)
                .and_then(|b| <[u8; 8]>::try_from(b).ok())
                .map(f64::from_le_bytes),
            _ => None,
        }
    }
}
