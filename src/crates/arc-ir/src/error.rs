use thiserror::Error;

/// Configuration errors, surfaced at module load rather than mid-tick: a
/// malformed IR means the runtime is never constructed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("arc.module.unknown_node: edge references unknown node '{0}'")]
    UnknownNode(String),

    #[error("arc.module.unknown_param: node '{node}' has no param '{param}'")]
    UnknownParam { node: String, param: String },

    #[error("arc.module.unknown_function: IR references undeclared function '{0}'")]
    UnknownFunction(String),

    #[error("arc.module.duplicate_node: node key '{0}' declared more than once")]
    DuplicateNode(String),

    #[error("arc.module.invalid_strata: node '{0}' appears in more than one stratum of the same strata list")]
    InvalidStrata(String),

    #[error("arc.module.invalid_interval: interval node '{node}' has non-positive period")]
    InvalidInterval { node: String },

    #[error("arc.module.malformed: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, Error>;
