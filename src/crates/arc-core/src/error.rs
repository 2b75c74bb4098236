use thiserror::Error;

/// Errors raised by `State`, `NodeState`, and the `Scheduler` during
/// construction or a tick. Configuration-shaped variants mirror the IR
/// crate's namespace so the two can be reported through the same channel.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("arc.module.unknown_channel: channel {0} is not registered")]
    UnknownChannel(u32),

    #[error("arc.module.unknown_node: node '{0}' is not registered")]
    UnknownNode(String),

    #[error("arc.runtime.state_type_mismatch: state var {0:?} stored as a different type than requested")]
    StateTypeMismatch(crate::state::StateKey),

    #[error("arc.runtime.channel_type_mismatch: channel {channel} expected {expected}, got {found}")]
    ChannelTypeMismatch {
        channel: u32,
        expected: &'static str,
        found: &'static str,
    },

    #[error("arc.runtime.node_error: node '{node}' reported: {message}")]
    Node { node: String, message: String },

    #[error(transparent)]
    Telem(#[from] arc_telem::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
