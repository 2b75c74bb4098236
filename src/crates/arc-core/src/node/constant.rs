use arc_telem::{SampleValue, TimeStamp};

use super::Node;
use crate::context::Context;
use crate::error::Result;
use crate::node_state::NodeState;
use crate::state::State;

/// Emits a single fixed value once per activation (reusing `NodeState`'s
/// zero-input ready-once gating), then stays quiet until `reset`.
pub struct ConstantNode {
    node_state: NodeState,
    value: SampleValue,
}

impl ConstantNode {
    pub fn new(node_state: NodeState, value: SampleValue) -> Self {
        Self { node_state, value }
    }
}

impl Node for ConstantNode {
    fn next(&mut self, state: &mut State, ctx: &mut Context<'_>) -> Result<()> {
        if !self.node_state.refresh_inputs(state) {
            return Ok(());
        }
        let out = self.node_state.output(state, 0);
        out.resize(1);
        out.set(0, self.value.clone())?;
        let out_time = self.node_state.output_time(state, 0);
        out_time.resize(1);
        out_time.set(0, SampleValue::Timestamp(TimeStamp(ctx.elapsed.nanos())))?;
        ctx.mark_changed("output");
        Ok(())
    }

    fn reset(&mut self) {
        self.node_state.reset();
    }

    fn is_output_truthy(&self, state: &State, param: &str) -> bool {
        self.node_state.is_output_truthy(state, param)
    }
}
