use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use arc_core::{FactoryChain, Scheduler};
use arc_ir::{Module as IrModule, Node as IrNode, IR};
use arc_telem::DataType;
use arc_wasm::{Module as WasmModule, WasmNodeFactory};

use crate::breaker::BreakerConfig;
use crate::error::Result;
use crate::loop_driver::{ExecutionMode, Loop, LoopConfig};
use crate::queue::Spsc;
use crate::runtime::Runtime;
use crate::time_wheel::{TimeWheel, DEFAULT_MIN_PERIOD_NS};

/// Below this period, an interval node's timer is too tight for the queue's
/// idle poll to service on time and the loop needs a dedicated base-period
/// timer instead of just waiting on data. Named after the reference
/// runtime's `loop::timing::SOFTWARE_TIMER_THRESHOLD`, whose header was not
/// part of the retrieved source; this value is a documented stand-in, not a
/// transcription.
pub const SOFTWARE_TIMER_THRESHOLD_NS: u64 = 1_000_000;

/// Bootstrap parameters for [`load`].
pub struct Config {
    pub module: IrModule,
    pub input_queue_capacity: usize,
    pub output_queue_capacity: usize,
    pub breaker: BreakerConfig,
}

impl Config {
    pub fn new(module: IrModule) -> Self {
        Self { module, input_queue_capacity: 256, output_queue_capacity: 1024, breaker: BreakerConfig::default() }
    }
}

/// Compiles and wires up a `Module`'s IR and wasm bytecode into a runnable
/// [`Runtime`], mirroring the reference runtime's bootstrap order:
///
/// 1. validate the IR,
/// 2. compile the wasm module,
/// 3. collect the channel keys every node reads from or writes to,
/// 4. build the node factory chain (WASM first, built-ins after),
/// 5. build the scheduler (registers state, constructs every node),
/// 6. compute the interval periods present and pick an `ExecutionMode`,
/// 7. assemble the queues, the wait loop, and the `Runtime`.
///
/// Channel `DataType`s are read directly off each node's own declared input
/// and output ports rather than round-tripped through an external digest
/// callback, since the IR already carries that information.
pub fn load(cfg: Config) -> Result<Runtime> {
    cfg.module.ir.validate()?;

    let wasm_module = WasmModule::compile(&cfg.module.wasm, cfg.module.output_memory_bases.clone())?;
    let wasm_module = Rc::new(RefCell::new(wasm_module));

    let (read_channels, write_channels) = extract_channel_keys(&cfg.module.ir);

    let factories =
        FactoryChain::new().push(Box::new(WasmNodeFactory::new(wasm_module))).with_builtins();
    let scheduler = Scheduler::build(&cfg.module.ir, &factories);

    let periods = interval_periods_ns(&cfg.module.ir);
    let mode = if periods.iter().any(|&p| p > 0 && p < SOFTWARE_TIMER_THRESHOLD_NS) {
        ExecutionMode::HighRate
    } else {
        ExecutionMode::EventDriven
    };
    tracing::debug!(?mode, periods = ?periods, "selected execution mode");

    let interval = match mode {
        ExecutionMode::HighRate => {
            let base = TimeWheel::calculate_base_period(&periods, DEFAULT_MIN_PERIOD_NS);
            Some(arc_telem::TimeSpan::nanoseconds(base as i64))
        }
        ExecutionMode::EventDriven => None,
    };
    let loop_ = Loop::new(LoopConfig { mode, interval });

    let inputs = Spsc::new(cfg.input_queue_capacity);
    let outputs = Spsc::new(cfg.output_queue_capacity);

    Ok(Runtime::new(
        scheduler,
        loop_,
        inputs,
        outputs,
        read_channels.into_iter().collect(),
        write_channels.into_iter().collect(),
        cfg.breaker,
    ))
}

/// The channel keys every node in `ir` reads from, and the ones every node
/// writes to.
pub fn extract_channel_keys(ir: &IR) -> (HashSet<u32>, HashSet<u32>) {
    let mut reads = HashSet::new();
    let mut writes = HashSet::new();
    for node in &ir.nodes {
        reads.extend(node.channels_read.keys().copied());
        writes.extend(node.channels_write.values().copied());
    }
    (reads, writes)
}

/// Resolves the `DataType` a channel carries by finding the node port bound
/// to it, checking outputs (writes) before inputs (reads).
pub fn get_channel_type(node: &IrNode, channel_key: u32) -> Option<DataType> {
    for (param_name, &key) in &node.channels_write {
        if key == channel_key {
            return node.outputs.iter().find(|p| p.name == *param_name).map(|p| p.data_type);
        }
    }
    for (&key, param_name) in &node.channels_read {
        if key == channel_key {
            return node.inputs.iter().find(|p| p.name == *param_name).map(|p| p.data_type);
        }
    }
    None
}

fn interval_periods_ns(ir: &IR) -> Vec<u64> {
    ir.nodes
        .iter()
        .filter(|n| n.node_type == "interval")
        .filter_map(|n| n.config_values.get("period_ns").and_then(|v| v.as_u64()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use arc_ir::Param;
    use std::collections::HashMap;

    fn interval_node(key: &str, period_ns: i64) -> IrNode {
        let mut config_values = HashMap::new();
        config_values.insert("period_ns".to_string(), serde_json::json!(period_ns));
        IrNode {
            key: key.to_string(),
            node_type: "interval".to_string(),
            inputs: vec![],
            outputs: vec![Param::new("output", DataType::F64)],
            config: vec![],
            channels_read: Default::default(),
            channels_write: Default::default(),
            config_values,
        }
    }

    #[test]
    fn extract_channel_keys_collects_reads_and_writes() {
        let mut sink = interval_node("sink", 100);
        sink.channels_read.insert(7, "in".to_string());
        let mut source = interval_node("source", 100);
        source.channels_write.insert("output".to_string(), 9);

        let ir = IR {
            nodes: vec![sink, source],
            edges: vec![],
            strata: vec![vec!["sink".to_string(), "source".to_string()]],
            sequences: vec![],
            functions: Default::default(),
        };
        let (reads, writes) = extract_channel_keys(&ir);
        assert_eq!(reads, [7].into_iter().collect());
        assert_eq!(writes, [9].into_iter().collect());
    }

    #[test]
    fn interval_periods_ns_reads_config_values() {
        let ir = IR {
            nodes: vec![interval_node("a", 5_000_000), interval_node("b", 20_000_000)],
            edges: vec![],
            strata: vec![vec!["a".to_string(), "b".to_string()]],
            sequences: vec![],
            functions: Default::default(),
        };
        let mut periods = interval_periods_ns(&ir);
        periods.sort();
        assert_eq!(periods, vec![5_000_000, 20_000_000]);
    }

    #[test]
    fn get_channel_type_checks_writes_then_reads() {
        let mut node = interval_node("n", 100);
        node.channels_write.insert("output".to_string(), 3);
        assert_eq!(get_channel_type(&node, 3), Some(DataType::F64));
        assert_eq!(get_channel_type(&node, 999), None);
    }
}
