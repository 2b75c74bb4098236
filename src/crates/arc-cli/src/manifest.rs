use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use arc_ir::Module;

/// On-disk description of a deployable module: where its IR and compiled
/// wasm bytes live, plus the dirty-bitmap memory layout the compiler
/// emitted alongside them. Paths are resolved relative to the manifest
/// file's own directory, so a module and its assets can be moved together.
#[derive(Debug, serde::Deserialize)]
pub struct ModuleManifest {
    pub ir_path: PathBuf,
    pub wasm_path: PathBuf,
    #[serde(default)]
    pub output_memory_bases: HashMap<String, u32>,
}

pub fn load(manifest_path: &Path) -> Result<Module> {
    let text = std::fs::read_to_string(manifest_path)
        .with_context(|| format!("reading manifest {}", manifest_path.display()))?;
    let manifest: ModuleManifest =
        toml::from_str(&text).with_context(|| format!("parsing manifest {}", manifest_path.display()))?;
    let base = manifest_path.parent().unwrap_or_else(|| Path::new("."));

    let ir_path = base.join(&manifest.ir_path);
    let ir_json = std::fs::read_to_string(&ir_path)
        .with_context(|| format!("reading IR file {}", ir_path.display()))?;

    let wasm_path = base.join(&manifest.wasm_path);
    let wasm =
        std::fs::read(&wasm_path).with_context(|| format!("reading wasm file {}", wasm_path.display()))?;

    Module::from_json(&ir_json, wasm, manifest.output_memory_bases)
        .with_context(|| format!("building module from {}", manifest_path.display()))
}
