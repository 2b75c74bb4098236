use std::fmt;

/// The closed set of scalar types a [`crate::Series`] can hold.
///
/// Mirrors the density table of the reference telemetry library: fixed-width
/// numeric types report a byte width via [`DataType::size_hint`], variable
/// width types (`String`) do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum DataType {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Timestamp,
    String,
}

impl DataType {
    /// Byte width of one element, or `None` for variable-width types.
    pub fn size_hint(&self) -> Option<usize> {
        use DataType::*;
        match self {
            U8 | I8 => Some(1),
            U16 | I16 => Some(2),
            U32 | I32 | F32 => Some(4),
            U64 | I64 | F64 | Timestamp => Some(8),
            String => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, DataType::String)
    }

    pub fn is_float(&self) -> bool {
        matches!(self, DataType::F32 | DataType::F64)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DataType::U8 => "u8",
            DataType::U16 => "u16",
            DataType::U32 => "u32",
            DataType::U64 => "u64",
            DataType::I8 => "i8",
            DataType::I16 => "i16",
            DataType::I32 => "i32",
            DataType::I64 => "i64",
            DataType::F32 => "f32",
            DataType::F64 => "f64",
            DataType::Timestamp => "timestamp",
            DataType::String => "string",
        };
        f.write_str(s)
    }
}
