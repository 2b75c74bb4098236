//! The declarative intermediate representation compiled Arc programs are
//! expressed in: nodes, edges, strata, stages, sequences, and the function
//! signatures a WASM module exports.

mod edge;
mod error;
mod handle;
mod module;
mod node;
mod stage;
mod wire;

pub use edge::{Edge, EdgeKind, Strata};
pub use error::{Error, Result};
pub use handle::Handle;
pub use module::{FunctionSignature, Module, IR};
pub use node::{Node, NodeMetadata, Param};
pub use stage::{Sequence, Stage};
pub use wire::{ChannelOutput, ChannelUpdate};
