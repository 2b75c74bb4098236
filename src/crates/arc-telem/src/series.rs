use crate::{DataType, Error, Result, SampleValue, TimeStamp};

/// A typed, contiguous, resizable column of samples.
///
/// A `Series` never mixes types: an instance is one [`DataType`] variant for
/// its whole life. Series are produced by nodes as outputs and consumed by
/// downstream nodes as inputs; the runtime treats data and time as a pair of
/// parallel series (see `ValuePair` in `arc-core`) rather than baking a time
/// index into `Series` itself, matching how the scheduler aligns multi-rate
/// inputs index-for-index against a timestamp series of equal length.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Series {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    U64(Vec<u64>),
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
    Timestamp(Vec<i64>),
    String(Vec<String>),
}

macro_rules! for_each_variant {
    ($self:expr, $v:ident => $body:expr) => {
        match $self {
            Series::U8($v) => $body,
            Series::U16($v) => $body,
            Series::U32($v) => $body,
            Series::U64($v) => $body,
            Series::I8($v) => $body,
            Series::I16($v) => $body,
            Series::I32($v) => $body,
            Series::I64($v) => $body,
            Series::F32($v) => $body,
            Series::F64($v) => $body,
            Series::Timestamp($v) => $body,
            Series::String($v) => $body,
        }
    };
}

impl Series {
    pub fn empty(dt: DataType) -> Self {
        match dt {
            DataType::U8 => Series::U8(Vec::new()),
            DataType::U16 => Series::U16(Vec::new()),
            DataType::U32 => Series::U32(Vec::new()),
            DataType::U64 => Series::U64(Vec::new()),
            DataType::I8 => Series::I8(Vec::new()),
            DataType::I16 => Series::I16(Vec::new()),
            DataType::I32 => Series::I32(Vec::new()),
            DataType::I64 => Series::I64(Vec::new()),
            DataType::F32 => Series::F32(Vec::new()),
            DataType::F64 => Series::F64(Vec::new()),
            DataType::Timestamp => Series::Timestamp(Vec::new()),
            DataType::String => Series::String(Vec::new()),
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Series::U8(_) => DataType::U8,
            Series::U16(_) => DataType::U16,
            Series::U32(_) => DataType::U32,
            Series::U64(_) => DataType::U64,
            Series::I8(_) => DataType::I8,
            Series::I16(_) => DataType::I16,
            Series::I32(_) => DataType::I32,
            Series::I64(_) => DataType::I64,
            Series::F32(_) => DataType::F32,
            Series::F64(_) => DataType::F64,
            Series::Timestamp(_) => DataType::Timestamp,
            Series::String(_) => DataType::String,
        }
    }

    pub fn len(&self) -> usize {
        for_each_variant!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn resize(&mut self, new_len: usize) {
        match self {
            Series::U8(v) => v.resize(new_len, 0),
            Series::U16(v) => v.resize(new_len, 0),
            Series::U32(v) => v.resize(new_len, 0),
            Series::U64(v) => v.resize(new_len, 0),
            Series::I8(v) => v.resize(new_len, 0),
            Series::I16(v) => v.resize(new_len, 0),
            Series::I32(v) => v.resize(new_len, 0),
            Series::I64(v) => v.resize(new_len, 0),
            Series::F32(v) => v.resize(new_len, 0.0),
            Series::F64(v) => v.resize(new_len, 0.0),
            Series::Timestamp(v) => v.resize(new_len, 0),
            Series::String(v) => v.resize(new_len, String::new()),
        }
    }

    pub fn truncate(&mut self, new_len: usize) {
        for_each_variant!(self, v => v.truncate(new_len))
    }

    /// Resolves a possibly-negative index the way the reference telemetry
    /// library does: `-1` is the last element, `-len` is the first.
    fn resolve_index(&self, index: i64) -> Option<usize> {
        let len = self.len() as i64;
        let idx = if index < 0 { len + index } else { index };
        if idx < 0 || idx >= len {
            None
        } else {
            Some(idx as usize)
        }
    }

    pub fn at(&self, index: i64) -> Result<SampleValue> {
        let i = self
            .resolve_index(index)
            .ok_or(Error::OutOfBounds { index: index as usize, len: self.len() })?;
        Ok(match self {
            Series::U8(v) => SampleValue::U8(v[i]),
            Series::U16(v) => SampleValue::U16(v[i]),
            Series::U32(v) => SampleValue::U32(v[i]),
            Series::U64(v) => SampleValue::U64(v[i]),
            Series::I8(v) => SampleValue::I8(v[i]),
            Series::I16(v) => SampleValue::I16(v[i]),
            Series::I32(v) => SampleValue::I32(v[i]),
            Series::I64(v) => SampleValue::I64(v[i]),
            Series::F32(v) => SampleValue::F32(v[i]),
            Series::F64(v) => SampleValue::F64(v[i]),
            Series::Timestamp(v) => SampleValue::Timestamp(TimeStamp(v[i])),
            Series::String(v) => SampleValue::String(v[i].clone()),
        })
    }

    pub fn last(&self) -> Option<SampleValue> {
        if self.is_empty() {
            None
        } else {
            self.at(-1).ok()
        }
    }

    pub fn set(&mut self, index: usize, value: SampleValue) -> Result<()> {
        if index >= self.len() {
            return Err(Error::OutOfBounds { index, len: self.len() });
        }
        macro_rules! set_variant {
            ($v:expr, $variant:ident, $ty:ty) => {
                if let SampleValue::$variant(x) = value {
                    $v[index] = x;
                    return Ok(());
                }
            };
        }
        match self {
            Series::U8(v) => set_variant!(v, U8, u8),
            Series::U16(v) => set_variant!(v, U16, u16),
            Series::U32(v) => set_variant!(v, U32, u32),
            Series::U64(v) => set_variant!(v, U64, u64),
            Series::I8(v) => set_variant!(v, I8, i8),
            Series::I16(v) => set_variant!(v, I16, i16),
            Series::I32(v) => set_variant!(v, I32, i32),
            Series::I64(v) => set_variant!(v, I64, i64),
            Series::F32(v) => set_variant!(v, F32, f32),
            Series::F64(v) => set_variant!(v, F64, f64),
            Series::Timestamp(v) => {
                if let SampleValue::Timestamp(ts) = value {
                    v[index] = ts.nanos();
                    return Ok(());
                }
            }
            Series::String(v) => {
                if let SampleValue::String(s) = value {
                    v[index] = s;
                    return Ok(());
                }
            }
        }
        Err(Error::TypeMismatch {
            expected: type_name(self.data_type()),
            found: "mismatched sample",
        })
    }

    pub fn push(&mut self, value: SampleValue) -> Result<()> {
        self.resize(self.len() + 1);
        let last = self.len() - 1;
        self.set(last, value)
    }

    /// Produces an owned, independent copy. Used when a node must hand a
    /// downstream caller a series that will never again be mutated in
    /// place (e.g. an output that must outlive the producing node's own
    /// scratch buffer).
    pub fn deep_copy(&self) -> Series {
        self.clone()
    }

    /// Element-by-element `self op other`, requiring equal length and type.
    pub fn zip_numeric<F: Fn(f64, f64) -> f64>(&self, other: &Series, f: F) -> Result<Series> {
        if self.data_type() != other.data_type() {
            return Err(Error::TypeMismatch {
                expected: type_name(self.data_type()),
                found: type_name(other.data_type()),
            });
        }
        if self.len() != other.len() {
            return Err(Error::OutOfBounds { index: other.len(), len: self.len() });
        }
        let dt = self.data_type();
        let mut out = Series::empty(dt);
        out.resize(self.len());
        for i in 0..self.len() {
            let a = self.at(i as i64)?.as_f64().ok_or(Error::UnsupportedType(dt))?;
            let b = other.at(i as i64)?.as_f64().ok_or(Error::UnsupportedType(dt))?;
            out.set(i, from_f64(dt, f(a, b))?)?;
        }
        Ok(out)
    }

    /// `self op scalar`, broadcasting the scalar across every element.
    pub fn map_scalar<F: Fn(f64, f64) -> f64>(&self, scalar: f64, f: F) -> Result<Series> {
        let dt = self.data_type();
        let mut out = Series::empty(dt);
        out.resize(self.len());
        for i in 0..self.len() {
            let a = self.at(i as i64)?.as_f64().ok_or(Error::UnsupportedType(dt))?;
            out.set(i, from_f64(dt, f(a, scalar))?)?;
        }
        Ok(out)
    }

    pub fn compare_scalar<F: Fn(f64, f64) -> bool>(&self, scalar: f64, f: F) -> Result<Series> {
        let mut out = vec![0u8; self.len()];
        for i in 0..self.len() {
            let a = self
                .at(i as i64)?
                .as_f64()
                .ok_or(Error::UnsupportedType(self.data_type()))?;
            out[i] = f(a, scalar) as u8;
        }
        Ok(Series::U8(out))
    }

    pub fn negate(&self) -> Result<Series> {
        self.map_scalar(-1.0, |a, s| a * s)
    }
}

fn type_name(dt: DataType) -> &'static str {
    match dt {
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
    }
}

fn from_f64(dt: DataType, v: f64) -> Result<SampleValue> {
    Ok(match dt {
        DataType::U8 => SampleValue::U8(v as u8),
        DataType::U16 => SampleValue::U16(v as u16),
        DataType::U32 => SampleValue::U32(v as u32),
        DataType::U64 => SampleValue::U64(v as u64),
        DataType::I8 => SampleValue::I8(v as i8),
        DataType::I16 => SampleValue::I16(v as i16),
        DataType::I32 => SampleValue::I32(v as i32),
        DataType::I64 => SampleValue::I64(v as i64),
        DataType::F32 => SampleValue::F32(v as f32),
        DataType::F64 => SampleValue::F64(v),
        DataType::Timestamp => SampleValue::Timestamp(TimeStamp(v as i64)),
        DataType::String => return Err(Error::UnsupportedType(dt)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_index_resolves_from_end() {
        let s = Series::F64(vec![1.0, 2.0, 3.0]);
        assert_eq!(s.at(-1).unwrap(), SampleValue::F64(3.0));
        assert_eq!(s.at(0).unwrap(), SampleValue::F64(1.0));
    }

    #[test]
    fn out_of_bounds_is_an_error() {
        let s = Series::U8(vec![1]);
        assert!(s.at(5).is_err());
    }

    #[test]
    fn push_grows_and_sets() {
        let mut s = Series::I32(vec![]);
        s.push(SampleValue::I32(7)).unwrap();
        s.push(SampleValue::I32(8)).unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(s.at(-1).unwrap(), SampleValue::I32(8));
    }

    #[test]
    fn elementwise_add() {
        let a = Series::F64(vec![1.0, 2.0]);
        let b = Series::F64(vec![10.0, 20.0]);
        let sum = a.zip_numeric(&b, |x, y| x + y).unwrap();
        assert_eq!(sum, Series::F64(vec![11.0, 22.0]));
    }

    #[test]
    fn scalar_comparison() {
        let a = Series::I32(vec![1, 5, 10]);
        let gt = a.compare_scalar(4.0, |x, s| x > s).unwrap();
        assert_eq!(gt, Series::U8(vec![0, 1, 1]));
    }

    #[test]
    fn deep_copy_is_independent() {
        let mut a = Series::U8(vec![1, 2, 3]);
        let b = a.deep_copy();
        a.set(0, SampleValue::U8(99)).unwrap();
        assert_eq!(b.at(0).unwrap(), SampleValue::U8(1));
    }
}
