use super::Node;
use crate::context::Context;
use crate::error::Result;
use crate::node_state::NodeState;
use crate::state::State;

/// Mirrors externally-ingested channel data onto this node's own output, so
/// downstream nodes can consume it through the ordinary edge-based
/// alignment path instead of special-casing channel reads.
pub struct IoNode {
    node_state: NodeState,
}

impl IoNode {
    pub fn new(node_state: NodeState) -> Self {
        Self { node_state }
    }
}

impl Node for IoNode {
    fn next(&mut self, state: &mut State, ctx: &mut Context<'_>) -> Result<()> {
        if !self.node_state.refresh_inputs(state) {
            return Ok(());
        }
        let data = self.node_state.input(0).clone();
        let time = self.node_state.input_time(0).clone();
        *self.node_state.output(state, 0) = data;
        *self.node_state.output_time(state, 0) = time;
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
