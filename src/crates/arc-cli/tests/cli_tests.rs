//! Integration tests for the `arc` CLI's file-facing logic: manifest
//! resolution and the checks `validate`/`inspect` perform, exercised
//! directly rather than by spawning the binary.

use std::collections::HashMap;
use std::fs;

use arc_ir::{Node, Param, IR};
use arc_telem::DataType;
use tempfile::TempDir;

fn sample_ir() -> IR {
    let node = Node {
        key: "source".to_string(),
        node_type: "constant".to_string(),
        inputs: vec![],
        outputs: vec![Param::new("output", DataType::F64)],
        config: vec![],
        channels_read: Default::default(),
        channels_write: {
            let mut m = HashMap::new();
            m.insert("output".to_string(), 1u32);
            m
        },
        config_values: Default::default(),
    };
    IR {
        nodes: vec![node],
        edges: vec![],
        strata: vec![vec!["source".to_string()]],
        sequences: vec![],
        functions: Default::default(),
    }
}

fn empty_memory_wasm() -> Vec<u8> {
    wat::parse_str(r#"(module (memory (export "memory") 1))"#).expect("valid wat")
}

fn write_module_fixture(dir: &TempDir) -> std::path::PathBuf {
    let ir_path = dir.path().join("module.ir.json");
    fs::write(&ir_path, serde_json::to_string(&sample_ir()).unwrap()).unwrap();

    let wasm_path = dir.path().join("module.wasm");
    fs::write(&wasm_path, empty_memory_wasm()).unwrap();

    let manifest_path = dir.path().join("module.toml");
    fs::write(
        &manifest_path,
        "ir_path = \"module.ir.json\"\nwasm_path = \"module.wasm\"\n",
    )
    .unwrap();
    manifest_path
}

#[test]
fn manifest_load_resolves_relative_paths_and_builds_a_module() {
    let dir = TempDir::new().unwrap();
    let manifest_path = write_module_fixture(&dir);

    let module = arc_cli::manifest::load(&manifest_path).expect("manifest loads");
    assert_eq!(module.ir.nodes.len(), 1);
    assert!(!module.wasm.is_empty());
    assert!(module.output_memory_bases.is_empty());
}

#[test]
fn manifest_load_reports_missing_ir_file() {
    let dir = TempDir::new().unwrap();
    let manifest_path = dir.path().join("module.toml");
    fs::write(
        &manifest_path,
        "ir_path = \"missing.ir.json\"\nwasm_path = \"missing.wasm\"\n",
    )
    .unwrap();

    assert!(arc_cli::manifest::load(&manifest_path).is_err());
}

#[test]
fn sample_ir_validates_and_reports_its_write_channel() {
    let ir = sample_ir();
    ir.validate().expect("well-formed IR validates");

    let (reads, writes) = arc_runtime::extract_channel_keys(&ir);
    assert!(reads.is_empty());
    assert_eq!(writes, [1u32].into_iter().collect());
}
