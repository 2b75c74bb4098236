use std::cell::RefCell;
use std::rc::Rc;

use arc_core::{Node, NodeFactory, NodeState, State};
use arc_ir::Node as IrNode;
use arc_telem::{DataType, SampleValue};

use crate::module::Module;
use crate::node::WasmNode;

/// Claims any IR node whose `type` names a function the compiled module
/// exports. Tried first in the factory chain, ahead of the built-in
/// auxiliary node types, since a WASM function name never collides with
/// the fixed `interval`/`constant`/`operator`/`time`/`io` type tags.
pub struct WasmNodeFactory {
    module: Rc<RefCell<Module>>,
}

impl WasmNodeFactory {
    pub fn new(module: Rc<RefCell<Module>>) -> Self {
        Self { module }
    }
}

impl NodeFactory for WasmNodeFactory {
    fn try_create(&self, node: &IrNode, state: &mut State) -> Option<Box<dyn Node>> {
        if !self.module.borrow_mut().has_func(&node.node_type) {
            return None;
        }
        let (inputs, outputs) = state.node_ports(&node.key)?;
        let node_state = NodeState::new(node.key.clone(), inputs, outputs);

        let config = node
            .config
            .iter()
            .map(|param| {
                let value = node
                    .config_values
                    .get(&param.name)
                    .and_then(|v| config_value_from_json(param.data_type, v))
                    .unwrap_or_else(|| SampleValue::zero(param.data_type));
                (value, param.data_type)
            })
            .collect();

        Some(Box::new(WasmNode::new(
            self.module.clone(),
            node.node_type.clone(),
            node_state,
            config,
            node.outputs.clone(),
            node.is_expression(),
        )))
    }
}

fn config_value_from_json(dt: DataType, v: &serde_json::Value) -> Option<SampleValue> {
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
