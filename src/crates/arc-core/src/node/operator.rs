use arc_telem::{SampleValue, TimeStamp};

use super::Node;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::node_state::NodeState;
use crate::state::State;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    Add,
    Sub,
    Mul,
    Div,
}

impl OperatorKind {
    fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            OperatorKind::Add => a + b,
            OperatorKind::Sub => a - b,
            OperatorKind::Mul => a * b,
            OperatorKind::Div => a / b,
        }
    }
}

/// A trivial binary arithmetic node: combines the latest sample of each of
/// its two aligned inputs and writes a single output sample, timestamped at
/// the tick's elapsed time.
pub struct OperatorNode {
    node_state: NodeState,
    kind: OperatorKind,
}

impl OperatorNode {
    pub fn new(node_state: NodeState, kind: OperatorKind) -> Self {
        Self { node_state, kind }
    }
}

impl Node for OperatorNode {
    fn next(&mut self, state: &mut State, ctx: &mut Context<'_>) -> Result<()> {
        if !self.node_state.refresh_inputs(state) {
            return Ok(());
        }
        let a = self.node_state.input(0).last().ok_or_else(|| Error::Node {
            node: self.node_state.node_id().to_string(),
            message: "input 'a' has no samples after alignment".into(),
        })?;
        let b = self.node_state.input(1).last().ok_or_else(|| Error::Node {
            node: self.node_state.node_id().to_string(),
            message: "input 'b' has no samples after alignment".into(),
        })?;
        let (af, bf) = (
            a.as_f64().ok_or_else(|| Error::Node { node: self.node_state.node_id().to_string(), message: "non-numeric input 'a'".into() })?,
            b.as_f64().ok_or_else(|| Error::Node { node: self.node_state.node_id().to_string(), message: "non-numeric input 'b'".into() })?,
        );
        let result = self.kind.apply(af, bf);

        let dt = self.node_state.input(0).data_type();
        let out = self.node_state.output(state, 0);
        out.resize(1);
        out.set(0, sample_from_f64(dt, result))?;
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

fn sample_from_f64(dt: arc_telem::DataType, v: f64) -> SampleValue {
    use arc_telem::DataType::*;
    match dt {
        U8 => SampleValue::U8(v as u8),
        U16 => SampleValue::U16(v as u16),
        U32 => SampleValue::U32(v as u32),
        U64 => SampleValue::U64(v as u64),
        I8 => SampleValue::I8(v as i8),
        I16 => SampleValue::I16(v as i16),
        I32 => SampleValue::I32(v as i32),
        I64 => SampleValue::I64(v as i64),
        F32 => SampleValue::F32(v as f32),
        F64 | Timestamp | String => SampleValue::F64(v),
    }
}
