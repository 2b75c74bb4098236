use std::collections::HashMap;

use arc_ir::Param;
use arc_telem::{DataType, SampleValue, TimeStamp};
use wasmtime::{Engine, Instance, Linker, Memory, Module as WasmModule, Store, Val};

use crate::error::{Error, Result};
use crate::host::{self, HostContext};

/// One compiled, instantiated guest program: the wasmtime engine/instance
/// triple plus the per-function dirty-bitmap memory layout the compiler
/// emitted alongside the wasm bytes. Every node built against functions
/// exported from the same IR module shares one `Module`, so state variables
/// and the host-call arenas are visible to all of them exactly as the
/// reference runtime's single shared state object is.
#[derive(Debug)]
pub struct Module {
    store: Store<HostContext>,
    instance: Instance,
    memory: Memory,
    output_memory_bases: HashMap<String, u32>,
}

impl Module {
    pub fn compile(wasm: &[u8], output_memory_bases: HashMap<String, u32>) -> Result<Self> {
        if wasm.is_empty() {
            return Err(Error::EmptyModule);
        }
        let engine = Engine::default();
        let module = WasmModule::new(&engine, wasm).map_err(|e| Error::Compile(e.to_string()))?;
        let mut linker: Linker<HostContext> = Linker::new(&engine);
        host::link(&mut linker)?;
        let mut store = Store::new(&engine, HostContext::default());
        let instance =
            linker.instantiate(&mut store, &module).map_err(|e| Error::Instantiate(e.to_string()))?;
        let memory = instance.get_memory(&mut store, "memory").ok_or(Error::MissingMemory)?;
        Ok(Self { store, instance, memory, output_memory_bases })
    }

    pub fn has_func(&mut self, name: &str) -> bool {
        self.instance.get_func(&mut self.store, name).is_some()
    }

    pub fn host_ctx_mut(&mut self) -> &mut HostContext {
        self.store.data_mut()
    }

    /// Calls one exported function once, passing `config` then `inputs` as
    /// wasm arguments, and reads its outputs back: directly from the
    /// returned value for a function with no dirty-bitmap region (`base ==
    /// 0`), otherwise from the dirty-bitmap-guarded output region in linear
    /// memory at `base`, per output whose bit is set.
    pub fn call(
        &mut self,
        name: &str,
        config: &[(SampleValue, DataType)],
        inputs: &[SampleValue],
        outputs: &[Param],
    ) -> Result<Vec<Option<SampleValue>>> {
        let func = self
            .instance
            .get_func(&mut self.store, name)
            .ok_or_else(|| Error::FunctionNotFound(name.to_string()))?;

        let mut args: Vec<Val> = Vec::with_capacity(config.len() + inputs.len());
        for (value, dt) in config {
            args.push(sample_to_val(value, *dt));
        }
        for value in inputs {
            args.push(sample_to_val(value, value.data_type()));
        }

        let mut results = vec![Val::I32(0); outputs.len().max(1)];
        func.call(&mut self.store, &args, &mut results)
            .map_err(|e| Error::Trap { name: name.to_string(), message: e.to_string() })?;

        let base = self.output_memory_bases.get(name).copied().unwrap_or(0);
        if base == 0 {
            let mut out = vec![None; outputs.len()];
            if let (Some(first), Some(param)) = (results.first(), outputs.first()) {
                out[0] = Some(val_to_sample(first, param.data_type));
            }
            return Ok(out);
        }

        self.read_dirty_outputs(base, outputs)
    }

    fn read_dirty_outputs(&self, base: u32, outputs: &[Param]) -> Result<Vec<Option<SampleValue>>> {
        let data = self.memory.data(&self.store);
        let base = base as usize;
        if base + 8 > data.len() {
            return Err(Error::MemoryOutOfBounds { offset: base as u32, size: data.len() });
        }
        let mut dirty_bytes = [0u8; 8];
        dirty_bytes.copy_from_slice(&data[base..base + 8]);
        let dirty = u64::from_le_bytes(dirty_bytes);

        let mut out = vec![None; outputs.len()];
        let mut offset = base + 8;
        for (i, param) in outputs.iter().enumerate() {
            let Some(width) = param.data_type.size_hint() else {
                tracing::warn!(param = %param.name, "skipping variable-width output in dirty-bitmap region");
                continue;
            };
            if dirty & (1u64 << i) != 0 && offset + width <= data.len() {
                let mut raw = [0u8; 8];
                raw[..width].copy_from_slice(&data[offset..offset + width]);
                out[i] = Some(sample_from_bits(u64::from_le_bytes(raw), param.data_type));
            }
            offset += width;
        }
        Ok(out)
    }
}

fn sample_to_val(value: &SampleValue, dt: DataType) -> Val {
    match dt {
        DataType::F64 => Val::F64(value.as_f64().unwrap_or(0.0).to_bits()),
        DataType::F32 => Val::F32((value.as_f64().unwrap_or(0.0) as f32).to_bits()),
        DataType::I64 | DataType::U64 | DataType::Timestamp => Val::I64(value.as_f64().unwrap_or(0.0) as i64),
        _ => Val::I32(value.as_f64().unwrap_or(0.0) as i32),
    }
}

fn val_to_sample(val: &Val, dt: DataType) -> SampleValue {
    match dt {
        DataType::U8 => SampleValue::U8(val.i32().unwrap_or(0) as u8),
        DataType::U16 => SampleValue::U16(val.i32().unwrap_or(0) as u16),
        DataType::U32 => SampleValue::U32(val.i32().unwrap_or(0) as u32),
        DataType::U64 => SampleValue::U64(val.i64().unwrap_or(0) as u64),
        DataType::I8 => SampleValue::I8(val.i32().unwrap_or(0) as i8),
        DataType::I16 => SampleValue::I16(val.i32().unwrap_or(0) as i16),
        DataType::I32 => SampleValue::I32(val.i32().unwrap_or(0)),
        DataType::I64 => SampleValue::I64(val.i64().unwrap_or(0)),
        DataType::F32 => SampleValue::F32(val.f32().unwrap_or(0.0)),
        DataType::F64 => SampleValue::F64(val.f64().unwrap_or(0.0)),
        DataType::Timestamp => SampleValue::Timestamp(TimeStamp(val.i64().unwrap_or(0))),
        DataType::String => SampleValue::String(String::new()),
    }
}

fn sample_from_bits(bits: u64, dt: DataType) -> SampleValue {
    match dt {
        DataType::U8 => SampleValue::U8(bits as u8),
        DataType::U16 => SampleValue::U16(bits as u16),
        DataType::U32 => SampleValue::U32(bits as u32),
        DataType::U64 => SampleValue::U64(bits),
        DataType::I8 => SampleValue::I8(bits as i8),
        DataType::I16 => SampleValue::I16(bits as i16),
        DataType::I32 => SampleValue::I32(bits as i32),
        DataType::I64 => SampleValue::I64(bits as i64),
        DataType::F32 => SampleValue::F32(f32::from_bits(bits as u32)),
        DataType::F64 => SampleValue::F64(f64::from_bits(bits)),
        DataType::Timestamp => SampleValue::Timestamp(TimeStamp(bits as i64)),
        DataType::String => SampleValue::String(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(wat: &str) -> Module {
        let wasm = wat::parse_str(wat).expect("valid wat");
        Module::compile(&wasm, HashMap::new()).expect("module compiles")
    }

    #[test]
    fn compile_rejects_empty_wasm() {
        let err = Module::compile(&[], HashMap::new()).unwrap_err();
        assert!(matches!(err, Error::EmptyModule));
    }

    #[test]
    fn compile_requires_an_exported_memory() {
        let wasm = wat::parse_str(r#"(module (func (export "f") (result f64) f64.const 1))"#).unwrap();
        let err = Module::compile(&wasm, HashMap::new()).unwrap_err();
        assert!(matches!(err, Error::MissingMemory));
    }

    #[test]
    fn has_func_reports_exported_names_only() {
        let mut module = compile(
            r#"(module
                 (memory (export "memory") 1)
                 (func (export "double") (param f64) (result f64) (f64.mul (local.get 0) (f64.const 2))))"#,
        );
        assert!(module.has_func("double"));
        assert!(!module.has_func("missing"));
    }

    #[test]
    fn call_uses_the_direct_return_path_when_base_is_zero() {
        let mut module = compile(
            r#"(module
                 (memory (export "memory") 1)
                 (func (export "double") (param f64) (result f64) (f64.mul (local.get 0) (f64.const 2))))"#,
        );
        let outputs = vec![Param::new("out", DataType::F64)];
        let results = module.call("double", &[], &[SampleValue::F64(21.0)], &outputs).unwrap();
        assert_eq!(results, vec![Some(SampleValue::F64(42.0))]);
    }

    #[test]
    fn call_reports_a_missing_function_by_name() {
        let mut module = compile(r#"(module (memory (export "memory") 1))"#);
        let err = module.call("nope", &[], &[], &[]).unwrap_err();
        assert!(matches!(err, Error::FunctionNotFound(name) if name == "nope"));
    }
}
