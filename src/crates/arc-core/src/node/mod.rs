mod constant;
mod factory;
mod interval;
mod io;
mod operator;
mod time;

pub use constant::ConstantNode;
pub use factory::{FactoryChain, NodeFactory};
pub use interval::IntervalNode;
pub use io::IoNode;
pub use operator::{OperatorKind, OperatorNode};
pub use time::TimeNode;

use crate::context::Context;
use crate::error::Result;
use crate::state::State;

/// The executable unit the scheduler drives. Implementations must never
/// block and must not allocate on the steady-state hot path — buffers are
/// expected to be pre-sized in `new`/`reset`.
pub trait Node {
    /// Runs one tick. Side effects (which outputs changed, whether the node
    /// asked to activate its stage) are recorded on `ctx`, not applied
    /// directly, so the scheduler can apply them once this call returns.
    fn next(&mut self, state: &mut State, ctx: &mut Context<'_>) -> Result<()>;

    /// Clears internal state when re-entering a stage (or on scheduler
    /// reset). Stateless node variants are free to no-op.
    fn reset(&mut self);

    fn is_output_truthy(&self, state: &State, param: &str) -> bool;
}
