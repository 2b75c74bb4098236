use crate::{DataType, TimeStamp};

/// A single scalar value, tagged with its [`DataType`].
///
/// This is the type nodes exchange one sample at a time: a [`crate::Series`]
/// is a packed column of these, but the WASM host-call surface and channel
/// I/O move one `SampleValue` per call.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum SampleValue {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Timestamp(TimeStamp),
    String(String),
}

impl SampleValue {
    pub fn data_type(&self) -> DataType {
        match self {
            SampleValue::U8(_) => DataType::U8,
            SampleValue::U16(_) => DataType::U16,
            SampleValue::U32(_) => DataType::U32,
            SampleValue::U64(_) => DataType::U64,
            SampleValue::I8(_) => DataType::I8,
            SampleValue::I16(_) => DataType::I16,
            SampleValue::I32(_) => DataType::I32,
            SampleValue::I64(_) => DataType::I64,
            SampleValue::F32(_) => DataType::F32,
            SampleValue::F64(_) => DataType::F64,
            SampleValue::Timestamp(_) => DataType::Timestamp,
            SampleValue::String(_) => DataType::String,
        }
    }

    /// Widens any numeric sample to `f64`. Used by the WASM math host calls,
    /// which operate generically over the numeric types.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SampleValue::U8(v) => Some(*v as f64),
            SampleValue::U16(v) => Some(*v as f64),
            SampleValue::U32(v) => Some(*v as f64),
            SampleValue::U64(v) => Some(*v as f64),
            SampleValue::I8(v) => Some(*v as f64),
            SampleValue::I16(v) => Some(*v as f64),
            SampleValue::I32(v) => Some(*v as f64),
            SampleValue::I64(v) => Some(*v as f64),
            SampleValue::F32(v) => Some(*v as f64),
            SampleValue::F64(v) => Some(*v),
            SampleValue::Timestamp(v) => Some(v.nanos() as f64),
            SampleValue::String(_) => None,
        }
    }

    /// True for non-zero numbers, non-empty strings, and non-zero timestamps.
    /// Used by the scheduler's one-shot edge truthiness check.
    pub fn is_truthy(&self) -> bool {
        match self {
            SampleValue::String(s) => !s.is_empty(),
            other => other.as_f64().map(|v| v != 0.0).unwrap_or(false),
        }
    }

    pub fn zero(dt: DataType) -> Self {
        match dt {
            DataType::U8 => SampleValue::U8(0),
            DataType::U16 => SampleValue::U16(0),
            DataType::U32 => SampleValue::U32(0),
            DataType::U64 => SampleValue::U64(0),
            DataType::I8 => SampleValue::I8(0),
            DataType::I16 => SampleValue::I16(0),
            DataType::I32 => SampleValue::I32(0),
            DataType::I64 => SampleValue::I64(0),
            DataType::F32 => SampleValue::F32(0.0),
            DataType::F64 => SampleValue::F64(0.0),
            DataType::Timestamp => SampleValue::Timestamp(TimeStamp::ZERO),
            DataType::String => SampleValue::String(String::new()),
        }
    }
}
