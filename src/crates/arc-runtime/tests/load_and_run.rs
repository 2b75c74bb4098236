use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use arc_ir::{Module as IrModule, Node as IrNode, Param, IR};
use arc_runtime::{load, Config};
use arc_telem::{DataType, Series};

/// A guest function with no inputs that writes a literal sample straight to
/// a channel through the host ABI, in addition to returning its own
/// ordinary dataflow output. Exercises the same host-call path a compiled
/// node emitting telemetry would use.
const WRITER_WAT: &str = r#"
(module
  (import "env" "channel_write_f64" (func $channel_write_f64 (param i32 f64)))
  (memory (export "memory") 1)
  (func (export "writer") (result f64)
    i32.const 5
    f64.const 3.5
    call $channel_write_f64
    f64.const 3.5))
"#;

fn writer_module() -> IrModule {
    let wasm = wat::parse_str(WRITER_WAT).expect("valid wat");
    let node = IrNode {
        key: "writer".to_string(),
        node_type: "writer".to_string(),
        inputs: vec![],
        outputs: vec![Param::new("output", DataType::F64)],
        config: vec![],
        channels_read: Default::default(),
        channels_write: Default::default(),
        config_values: Default::default(),
    };
    let ir = IR {
        nodes: vec![node],
        edges: vec![],
        strata: vec![vec!["writer".to_string()]],
        sequences: vec![],
        functions: Default::default(),
    };
    IrModule { ir, wasm, output_memory_bases: HashMap::new() }
}

#[test]
fn load_runs_a_wasm_node_and_delivers_its_channel_write() {
    let mut runtime = load(Config::new(writer_module())).expect("bootstrap succeeds");
    let read_handle = runtime.handle();
    let stop_handle = runtime.handle();

    let stopper = thread::spawn(move || {
        while !stop_handle.is_running() {
            thread::sleep(Duration::from_millis(1));
        }
        stop_handle.stop();
    });

    runtime.run().expect("run exits cleanly once stopped");
    stopper.join().unwrap();

    let frame = read_handle.read().expect("writer's channel write produced an output frame");
    assert_eq!(frame.get(5), Some(&Series::F64(vec![3.5])));
}

#[test]
fn extract_channel_keys_and_load_agree_on_an_empty_graph() {
    let module = writer_module();
    let (reads, writes) = arc_runtime::extract_channel_keys(&module.ir);
    assert!(reads.is_empty());
    assert!(writes.is_empty());

    let runtime = load(Config::new(module)).expect("bootstrap succeeds");
    assert!(runtime.read_channels.is_empty());
    assert!(runtime.write_channels.is_empty());
}
