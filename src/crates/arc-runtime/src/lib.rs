//! The synchronous, single-threaded driver that turns a compiled `Module`
//! into a running dataflow: queueing, a wait loop unifying time- and
//! data-triggered ticks, and the bootstrap sequence that wires a
//! `Scheduler` up from an IR program and its wasm bytecode.

pub mod breaker;
pub mod error;
pub mod load;
pub mod loop_driver;
pub mod queue;
pub mod runtime;
pub mod time_wheel;

pub use breaker::{Breaker, BreakerConfig};
pub use error::{Error, Result};
pub use load::{extract_channel_keys, get_channel_type, load, Config, SOFTWARE_TIMER_THRESHOLD_NS};
pub use loop_driver::{ExecutionMode, Loop, LoopConfig};
pub use queue::Spsc;
pub use runtime::{Handle, Runtime};
pub use time_wheel::TimeWheel;
