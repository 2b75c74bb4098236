use thiserror::Error;

/// Errors raised while bootstrapping or driving a `Runtime`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("arc.runtime.closed: queue is closed")]
    Closed,

    #[error(transparent)]
    Ir(#[from] arc_ir::Error),

    #[error(transparent)]
    Wasm(#[from] arc_wasm::Error),

    #[error(transparent)]
    Core(#[from] arc_core::Error),

    #[error(transparent)]
    Telem(#[from] arc_telem::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
