//! Telemetry primitives for the Arc runtime.
//!
//! This crate has no knowledge of the runtime, scheduler, or WASM host that
//! sit above it: it is just typed buffers and time arithmetic, the same role
//! the reference telemetry library plays for the C++ runtime it was
//! distilled from.

mod datatype;
mod error;
mod frame;
mod sample;
mod series;
mod time;

pub use datatype::DataType;
pub use error::{Error, Result};
pub use frame::Frame;
pub use sample::SampleValue;
pub use series::Series;
pub use time::{TimeRange, TimeSpan, TimeStamp};
