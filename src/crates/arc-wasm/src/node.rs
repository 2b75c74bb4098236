use std::cell::RefCell;
use std::rc::Rc;

use arc_core::{Context, Error as CoreError, Node, NodeState, Result as CoreResult, State};
use arc_ir::Param;
use arc_telem::{DataType, SampleValue, Series, TimeStamp};

use crate::module::Module;

/// A node whose per-tick computation is a call into a compiled WASM guest
/// function. Non-expression nodes (ordinary graph nodes) run their guest
/// function exactly once, on the activation that first satisfies their
/// inputs, then go quiet until `reset`; expression nodes re-evaluate on
/// every activation instead, mirroring the `is_expression` key-prefix
/// convention the reference compiler uses to distinguish the two.
pub struct WasmNode {
    module: Rc<RefCell<Module>>,
    func_name: String,
    node_state: NodeState,
    config: Vec<(SampleValue, DataType)>,
    outputs: Vec<Param>,
    is_expression: bool,
    initialized: bool,
}

impl WasmNode {
    pub fn new(
        module: Rc<RefCell<Module>>,
        func_name: impl Into<String>,
        node_state: NodeState,
        config: Vec<(SampleValue, DataType)>,
        outputs: Vec<Param>,
        is_expression: bool,
    ) -> Self {
        Self { module, func_name: func_name.into(), node_state, config, outputs, is_expression, initialized: false }
    }
}

impl Node for WasmNode {
    fn next(&mut self, state: &mut State, ctx: &mut Context<'_>) -> CoreResult<()> {
        if !self.is_expression {
            if self.initialized {
                return Ok(());
            }
            self.initialized = true;
        }

        if !self.node_state.refresh_inputs(state) {
            return Ok(());
        }

        self.module.borrow_mut().host_ctx_mut().channel_values = state.channel_snapshot();

        let num_inputs = self.node_state.num_inputs();
        let mut max_length: i64 = 0;
        let mut longest_idx = 0usize;
        for i in 0..num_inputs {
            let len = self.node_state.input(i).len() as i64;
            if len > max_length {
                max_length = len;
                longest_idx = i;
            }
        }
        if num_inputs == 0 {
            max_length = 1;
        }
        if max_length <= 0 {
            return Ok(());
        }
        let max_length = max_length as usize;

        for j in 0..self.outputs.len() {
            self.node_state.output(state, j).resize(max_length);
            self.node_state.output_time(state, j).resize(max_length);
        }

        let mut offsets = vec![0usize; self.outputs.len()];
        for i in 0..max_length {
            let mut sample_inputs = Vec::with_capacity(num_inputs);
            for j in 0..num_inputs {
                let series = self.node_state.input(j);
                let len = series.len().max(1);
                let value = series.at((i % len) as i64).unwrap_or_else(|_| SampleValue::zero(series.data_type()));
                sample_inputs.push(value);
            }

            let results = match self.module.borrow_mut().call(&self.func_name, &self.config, &sample_inputs, &self.outputs) {
                Ok(r) => r,
                Err(err) => {
                    ctx.report_error(CoreError::Node {
                        node: self.node_state.node_id().to_string(),
                        message: format!("wasm execution failed at sample {i}/{max_length}: {err}"),
                    });
                    continue;
                }
            };

            let ts = if num_inputs > 0 {
                let time_series = self.node_state.input_time(longest_idx);
                let len = time_series.len().max(1);
                match time_series.at((i % len) as i64) {
                    Ok(SampleValue::Timestamp(ts)) => ts,
                    _ => TimeStamp::now(),
                }
            } else {
                TimeStamp::now()
            };

            for (j, value) in results.into_iter().enumerate() {
                let Some(value) = value else { continue };
                let off = offsets[j];
                self.node_state.output(state, j).set(off, value)?;
                self.node_state.output_time(state, j).set(off, SampleValue::Timestamp(ts))?;
                offsets[j] += 1;
            }
        }

        for (j, param) in self.outputs.iter().enumerate() {
            let off = offsets[j];
            self.node_state.output(state, j).truncate(off);
            self.node_state.output_time(state, j).truncate(off);
            if off > 0 {
                ctx.mark_changed(&param.name);
            }
        }

        let mut module = self.module.borrow_mut();
        let host_ctx = module.host_ctx_mut();
        for (channel_key, value) in host_ctx.channel_writes.drain(..) {
            state.write_channel(channel_key, value, TimeStamp::now());
        }
        host_ctx.clear_arenas();
        Ok(())
    }

    fn reset(&mut self) {
        self.node_state.reset();
        self.initialized = false;
    }

    fn is_output_truthy(&self, state: &State, param: &str) -> bool {
        self.node_state.is_output_truthy(state, param)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use arc_core::Context;
    use arc_ir::Handle;
    use arc_telem::TimeSpan;

    use super::*;
    use crate::module::Module;

    fn compile(wat: &str) -> Rc<RefCell<Module>> {
        let wasm = wat::parse_str(wat).expect("valid wat");
        Rc::new(RefCell::new(Module::compile(&wasm, HashMap::new()).unwrap()))
    }

    fn register(state: &mut State, key: &str, outputs: &[&str]) {
        let node = arc_ir::Node {
            key: key.to_string(),
            node_type: "wasm".into(),
            inputs: vec![],
            outputs: outputs.iter().map(|p| Param::new(*p, DataType::F64)).collect(),
            config: vec![],
            channels_read: Default::default(),
            channels_write: Default::default(),
            config_values: Default::default(),
        };
        state.register_node(&node);
    }

    fn run_once(node: &mut WasmNode, state: &mut State) {
        let mut ctx = Context::new(TimeSpan::ZERO, "w");
        node.next(state, &mut ctx).unwrap();
    }

    #[test]
    fn non_expression_node_runs_exactly_once_until_reset() {
        let module = compile(
            r#"(module (memory (export "memory") 1)
                 (func (export "source") (result f64) f64.const 7))"#,
        );
        let mut state = State::new();
        register(&mut state, "w", &["out"]);
        let outputs = vec![Param::new("out", DataType::F64)];
        let node_state = NodeState::new("w", vec![], vec![Handle::new("w", "out")]);
        let mut node = WasmNode::new(module, "source", node_state, vec![], outputs, false);

        run_once(&mut node, &mut state);
        assert_eq!(state.value_pair(&Handle::new("w", "out")).data, Series::F64(vec![7.0]));

        state.value_pair_mut(&Handle::new("w", "out")).unwrap().data = Series::F64(vec![]);
        run_once(&mut node, &mut state);
        assert!(state.value_pair(&Handle::new("w", "out")).data.is_empty());

        node.reset();
        run_once(&mut node, &mut state);
        assert_eq!(state.value_pair(&Handle::new("w", "out")).data, Series::F64(vec![7.0]));
    }

    #[test]
    fn expression_node_re_evaluates_on_every_activation() {
        let module = compile(
            r#"(module (memory (export "memory") 1)
                 (func (export "source") (result f64) f64.const 3))"#,
        );
        let mut state = State::new();
        register(&mut state, "w", &["out"]);
        let outputs = vec![Param::new("out", DataType::F64)];
        let node_state = NodeState::new("w", vec![], vec![Handle::new("w", "out")]);
        let mut node = WasmNode::new(module, "source", node_state, vec![], outputs, true);

        run_once(&mut node, &mut state);
        run_once(&mut node, &mut state);
        assert_eq!(state.value_pair(&Handle::new("w", "out")).data, Series::F64(vec![3.0]));
    }

    #[test]
    fn channel_reads_see_the_latest_value_stored_in_state() {
        let module = compile(
            r#"(module
                 (import "env" "channel_read_f64" (func $read (param i32) (result f64)))
                 (memory (export "memory") 1)
                 (func (export "source") (result f64) (call $read (i32.const 4))))"#,
        );
        let mut state = State::new();
        state.write_channel(4, SampleValue::F64(11.0), TimeStamp(1));
        register(&mut state, "w", &["out"]);
        let outputs = vec![Param::new("out", DataType::F64)];
        let node_state = NodeState::new("w", vec![], vec![Handle::new("w", "out")]);
        let mut node = WasmNode::new(module, "source", node_state, vec![], outputs, false);

        run_once(&mut node, &mut state);
        assert_eq!(state.value_pair(&Handle::new("w", "out")).data, Series::F64(vec![11.0]));
    }

    #[test]
    fn host_channel_writes_are_drained_into_state() {
        let module = compile(
            r#"(module
                 (import "env" "channel_write_f64" (func $write (param i32 f64)))
                 (memory (export "memory") 1)
                 (func (export "source") (result f64)
                   (call $write (i32.const 9) (f64.const 1.5))
                   (f64.const 0)))"#,
        );
        let mut state = State::new();
        state.register_channel(9, DataType::F64, None);
        register(&mut state, "w", &["out"]);
        let outputs = vec![Param::new("out", DataType::F64)];
        let node_state = NodeState::new("w", vec![], vec![Handle::new("w", "out")]);
        let mut node = WasmNode::new(module, "source", node_state, vec![], outputs, false);

        run_once(&mut node, &mut state);
        assert_eq!(state.flush().into_iter().map(|o| o.channel_key).collect::<Vec<_>>(), vec![9]);
    }
}
