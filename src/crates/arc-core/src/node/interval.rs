use arc_telem::{SampleValue, TimeSpan, TimeStamp};

use super::Node;
use crate::context::Context;
use crate::error::Result;
use crate::node_state::NodeState;
use crate::state::State;

/// Periodic tick emitter: writes `1u8` to its single output every `period`
/// of elapsed runtime, independent of any input edge.
pub struct IntervalNode {
    node_state: NodeState,
    period: TimeSpan,
    last_execution: Option<TimeSpan>,
}

impl IntervalNode {
    pub fn new(node_state: NodeState, period: TimeSpan) -> Self {
        Self { node_state, period, last_execution: None }
    }

    pub fn period(&self) -> TimeSpan {
        self.period
    }
}

impl Node for IntervalNode {
    fn next(&mut self, state: &mut State, ctx: &mut Context<'_>) -> Result<()> {
        let due = match self.last_execution {
            None => true,
            Some(last) => ctx.elapsed - last >= self.period,
        };
        if !due {
            return Ok(());
        }

        let out = self.node_state.output(state, 0);
        out.resize(1);
        out.set(0, SampleValue::U8(1))?;
        let out_time = self.node_state.output_time(state, 0);
        out_time.resize(1);
        out_time.set(0, SampleValue::Timestamp(TimeStamp(ctx.elapsed.nanos())))?;

        self.last_execution = Some(ctx.elapsed);
        ctx.mark_changed("output");
        Ok(())
    }

    fn reset(&mut self) {
        self.last_execution = None;
    }

    fn is_output_truthy(&self, state: &State, param: &str) -> bool {
        self.node_state.is_output_truthy(state, param)
    }
}
