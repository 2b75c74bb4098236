//! Sandboxed execution of compiled WASM guest functions as dataflow nodes,
//! bridged into `arc-core`'s node/state model through a fixed host-call ABI.

pub mod error;
pub mod factory;
pub mod host;
pub mod module;
pub mod node;

pub use error::{Error, Result};
pub use factory::WasmNodeFactory;
pub use host::HostContext;
pub use module::Module;
pub use node::WasmNode;
