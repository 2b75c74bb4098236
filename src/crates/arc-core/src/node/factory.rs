use arc_telem::{DataType, SampleValue, TimeSpan};

use super::{ConstantNode, IntervalNode, IoNode, Node, OperatorKind, OperatorNode, TimeNode};
use crate::node_state::NodeState;
use crate::state::State;

/// Tries to construct a `Node` implementation for one IR node. Returns
/// `None` (rather than an error) when the node's `type` string is not one
/// this factory recognizes, so a `FactoryChain` can fall through to the
/// next factory; an IR node whose type no factory in the chain recognizes
/// is skipped with a warning, not a load failure (forward compatibility).
pub trait NodeFactory {
    fn try_create(&self, node: &arc_ir::Node, state: &mut State) -> Option<Box<dyn Node>>;
}

/// An ordered list of factories tried in turn. Embedders assemble this with
/// the WASM factory first (see `arc-wasm`), followed by the built-in
/// auxiliary-node factories below.
#[derive(Default)]
pub struct FactoryChain {
    factories: Vec<Box<dyn NodeFactory>>,
}

impl FactoryChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, factory: Box<dyn NodeFactory>) -> Self {
        self.factories.push(factory);
        self
    }

    pub fn create(&self, node: &arc_ir::Node, state: &mut State) -> Option<Box<dyn Node>> {
        for factory in &self.factories {
            if let Some(n) = factory.try_create(node, state) {
                return Some(n);
            }
        }
        None
    }

    /// The chain of built-in auxiliary node factories (everything but WASM).
    pub fn builtins() -> Self {
        Self::new().with_builtins()
    }

    /// Appends the built-in auxiliary node factories after whatever is
    /// already in the chain, so an embedder can put a WASM factory first and
    /// fall through to these for everything else.
    pub fn with_builtins(self) -> Self {
        self.push(Box::new(IntervalFactory))
            .push(Box::new(ConstantFactory))
            .push(Box::new(OperatorFactory))
            .push(Box::new(TimeFactory))
            .push(Box::new(IoFactory))
    }
}

fn node_state_for(node: &arc_ir::Node, state: &mut State) -> NodeState {
    let (inputs, outputs) = state.node_ports(&node.key).unwrap_or_default();
    NodeState::new(node.key.clone(), inputs, outputs)
}

fn sample_from_json(dt: DataType, v: &serde_json::Value) -> Option<SampleValue> {
    Some(match dt {
        DataType::U8 => SampleValue::U8(v.as_u64()? as u8),
        DataType::U16 => SampleValue::U16(v.as_u64()? as u16),
        DataType::U32 => SampleValue::U32(v.as_u64()? as u32),
        DataType::U64 => SampleValue::U64(v.as_u64()?),
        DataType::I8 => SampleValue::I8(v.as_i64()? as i8),
        DataType::I16 => SampleValue::I16(v.as_i64()? as i16),
        DataType::I32 => SampleValue::I32(v.as_i64()? as i32),
        DataType::I64 => SampleValue::I64(v.as_i64()?),
        DataType::F32 => SampleValue::F32(v.as_f64()? as f32),
        DataType::F64 => SampleValue::F64(v.as_f64()?),
        DataType::Timestamp => SampleValue::Timestamp(arc_telem::TimeStamp(v.as_i64()?)),
        DataType::String => SampleValue::String(v.as_str()?.to_string()),
    })
}

struct IntervalFactory;
impl NodeFactory for IntervalFactory {
    fn try_create(&self, node: &arc_ir::Node, state: &mut State) -> Option<Box<dyn Node>> {
        if node.node_type != "interval" {
            return None;
        }
        let period_ns = node.config_values.get("period_ns").and_then(|v| v.as_i64()).unwrap_or(0);
        let ns = node_state_for(node, state);
        Some(Box::new(IntervalNode::new(ns, TimeSpan::nanoseconds(period_ns))))
    }
}

struct ConstantFactory;
impl NodeFactory for ConstantFactory {
    fn try_create(&self, node: &arc_ir::Node, state: &mut State) -> Option<Box<dyn Node>> {
        if node.node_type != "constant" {
            return None;
        }
        let dt = node.outputs.first()?.data_type;
        let value = node
            .config_values
            .get("value")
            .and_then(|v| sample_from_json(dt, v))
            .unwrap_or_else(|| SampleValue::zero(dt));
        let ns = node_state_for(node, state);
        Some(Box::new(ConstantNode::new(ns, value)))
    }
}

struct OperatorFactory;
impl NodeFactory for OperatorFactory {
    fn try_create(&self, node: &arc_ir::Node, state: &mut State) -> Option<Box<dyn Node>> {
        if node.node_type != "operator" {
            return None;
        }
        let kind = match node.config_values.get("op").and_then(|v| v.as_str()) {
            Some("add") => OperatorKind::Add,
            Some("sub") => OperatorKind::Sub,
            Some("mul") => OperatorKind::Mul,
            Some("div") => OperatorKind::Div,
            _ => OperatorKind::Add,
        };
        let ns = node_state_for(node, state);
        Some(Box::new(OperatorNode::new(ns, kind)))
    }
}

struct TimeFactory;
impl NodeFactory for TimeFactory {
    fn try_create(&self, node: &arc_ir::Node, state: &mut State) -> Option<Box<dyn Node>> {
        if node.node_type != "time" {
            return None;
        }
        Some(Box::new(TimeNode::new(node_state_for(node, state))))
    }
}

struct IoFactory;
impl NodeFactory for IoFactory {
    fn try_create(&self, node: &arc_ir::Node, state: &mut State) -> Option<Box<dyn Node>> {
        if node.node_type != "io" && node.node_type != "telem" {
            return None;
        }
        Some(Box::new(IoNode::new(node_state_for(node, state))))
    }
}
