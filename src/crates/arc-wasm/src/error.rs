use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("arc.wasm.empty_module: wasm bytes are empty")]
    EmptyModule,

    #[error("arc.wasm.compile_failed: {0}")]
    Compile(String),

    #[error("arc.wasm.instantiate_failed: {0}")]
    Instantiate(String),

    #[error("arc.wasm.missing_memory: module does not export 'memory'")]
    MissingMemory,

    #[error("arc.wasm.not_found: module does not export function '{0}'")]
    FunctionNotFound(String),

    #[error("arc.wasm.trap: function '{name}' trapped: {message}")]
    Trap { name: String, message: String },

    #[error("arc.wasm.out_of_bounds: memory access at offset {offset} exceeds {size} bytes")]
    MemoryOutOfBounds { offset: u32, size: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
