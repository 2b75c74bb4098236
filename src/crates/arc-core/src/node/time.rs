use arc_telem::{SampleValue, TimeStamp};

use super::Node;
use crate::context::Context;
use crate::error::Result;
use crate::node_state::NodeState;
use crate::state::State;

/// Stamps its single output with the runtime's current elapsed time on
/// every tick it is scheduled. Has no inputs and does not gate on
/// `refresh_inputs`'s ready-once semantics, unlike `ConstantNode`.
pub struct TimeNode {
    node_state: NodeState,
}

impl TimeNode {
    pub fn new(node_state: NodeState) -> Self {
        Self { node_state }
    }
}

impl Node for TimeNode {
    fn next(&mut self, state: &mut State, ctx: &mut Context<'_>) -> Result<()> {
        let now = TimeStamp(ctx.elapsed.nanos());
        let out = self.node_state.output(state, 0);
        out.resize(1);
        out.set(0, SampleValue::Timestamp(now))?;
        let out_time = self.node_state.output_time(state, 0);
        out_time.resize(1);
        out_time.set(0, SampleValue::Timestamp(now))?;
        ctx.mark_changed("output");
        Ok(())
    }

    fn reset(&mut self) {}

    fn is_output_truthy(&self, state: &State, param: &str) -> bool {
        self.node_state.is_output_truthy(state, param)
    }
}
