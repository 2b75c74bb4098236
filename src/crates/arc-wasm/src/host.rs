use std::collections::HashMap;

use arc_core::StateKey;
use arc_telem::{SampleValue, Series, TimeStamp};
use wasmtime::{Caller, Linker};

use crate::error::{Error, Result};

/// Per-module state the host-call surface reads and writes. One instance is
/// shared by every WASM function exported from the same compiled module,
/// matching the reference runtime's single shared `State` object: channel
/// reads are staged in before a node's activation and writes are drained
/// after it, state variables persist across activations keyed by
/// `(func_id, var_id)`, and the series/string arenas are handle tables
/// scoped to the lifetime of one activation's sample loop.
#[derive(Debug, Default)]
pub struct HostContext {
    pub channel_values: HashMap<u32, SampleValue>,
    pub channel_writes: Vec<(u32, SampleValue)>,
    pub state_vars: HashMap<StateKey, SampleValue>,
    pub series_arena: Vec<Series>,
    pub string_arena: Vec<String>,
}

impl HostContext {
    /// Clears the two handle arenas. Called between node activations so
    /// handles don't accumulate for the lifetime of the module.
    pub fn clear_arenas(&mut self) {
        self.series_arena.clear();
        self.string_arena.clear();
    }
}

fn wrap(e: anyhow::Error) -> Error {
    Error::Instantiate(e.to_string())
}

/// Registers the host-call ABI surface under the `env` module namespace.
/// Covers the representative primitive types (`u8`, `i64`, `f64`) rather
/// than the reference implementation's full type matrix (every integer
/// width crossed with every channel/state/series operation) — guest code
/// compiled against a wider surface than this will fail to instantiate;
/// see the crate-level design notes for the tradeoff.
pub fn link(linker: &mut Linker<HostContext>) -> Result<()> {
    macro_rules! channel_ops {
        ($suffix:literal, $ty:ty, $wasm_ty:ty, $variant:ident) => {
            linker
                .func_wrap("env", concat!("channel_read_", $suffix), |caller: Caller<'_, HostContext>, channel_id: u32| -> $wasm_ty {
                    (match caller.data().channel_values.get(&channel_id) {
                        Some(SampleValue::$variant(v)) => *v as $ty,
                        _ => <$ty>::default(),
                    }) as $wasm_ty
                })
                .map_err(wrap)?;
            linker
                .func_wrap(
                    "env",
                    concat!("channel_write_", $suffix),
                    |mut caller: Caller<'_, HostContext>, channel_id: u32, value: $wasm_ty| {
                        caller.data_mut().channel_writes.push((channel_id, SampleValue::$variant(value as _)));
                    },
                )
                .map_err(wrap)?;
        };
    }
    channel_ops!("u8", u8, i32, U8);
    channel_ops!("i64", i64, i64, I64);
    channel_ops!("f64", f64, f64, F64);

    macro_rules! state_ops {
        ($suffix:literal, $ty:ty, $wasm_ty:ty, $variant:ident) => {
            linker
                .func_wrap(
                    "env",
                    concat!("state_load_", $suffix),
                    |caller: Caller<'_, HostContext>, func_id: u32, var_id: u32, init: $wasm_ty| -> $wasm_ty {
                        let key = StateKey::new(func_id, var_id);
                        (match caller.data().state_vars.get(&key) {
                            Some(SampleValue::$variant(v)) => *v as $ty,
                            _ => init as $ty,
                        }) as $wasm_ty
                    },
                )
                .map_err(wrap)?;
            linker
                .func_wrap(
                    "env",
                    concat!("state_store_", $suffix),
                    |mut caller: Caller<'_, HostContext>, func_id: u32, var_id: u32, value: $wasm_ty| {
                        let key = StateKey::new(func_id, var_id);
                        caller.data_mut().state_vars.insert(key, SampleValue::$variant(value as _));
                    },
                )
                .map_err(wrap)?;
        };
    }
    state_ops!("u8", u8, i32, U8);
    state_ops!("i64", i64, i64, I64);
    state_ops!("f64", f64, f64, F64);

    linker
        .func_wrap("env", "series_create_empty_f64", |mut caller: Caller<'_, HostContext>, length: u32| -> u32 {
            let ctx = caller.data_mut();
            ctx.series_arena.push(Series::F64(vec![0.0; length as usize]));
            (ctx.series_arena.len() - 1) as u32
        })
        .map_err(wrap)?;
    linker
        .func_wrap(
            "env",
            "series_set_element_f64",
            |mut caller: Caller<'_, HostContext>, handle: u32, index: u32, value: f64| -> u32 {
                if let Some(Series::F64(v)) = caller.data_mut().series_arena.get_mut(handle as usize) {
                    if let Some(slot) = v.get_mut(index as usize) {
                        *slot = value;
                    }
                }
                handle
            },
        )
        .map_err(wrap)?;
    linker
        .func_wrap("env", "series_index_f64", |caller: Caller<'_, HostContext>, handle: u32, index: u32| -> f64 {
            match caller.data().series_arena.get(handle as usize) {
                Some(Series::F64(v)) => v.get(index as usize).copied().unwrap_or(0.0),
                _ => 0.0,
            }
        })
        .map_err(wrap)?;
    linker
        .func_wrap("env", "series_len", |caller: Caller<'_, HostContext>, handle: u32| -> u64 {
            caller.data().series_arena.get(handle as usize).map(|s| s.len() as u64).unwrap_or(0)
        })
        .map_err(wrap)?;

    linker
        .func_wrap("env", "string_from_literal", |mut caller: Caller<'_, HostContext>, ptr: u32, len: u32| -> u32 {
            let Some(memory) = caller.get_export("memory").and_then(|e| e.into_memory()) else {
                return u32::MAX;
            };
            let data = memory.data(&caller);
            let end = (ptr as usize).saturating_add(len as usize);
            if end > data.len() {
                return u32::MAX;
            }
            let s = String::from_utf8_lossy(&data[ptr as usize..end]).into_owned();
            let ctx = caller.data_mut();
            ctx.string_arena.push(s);
            (ctx.string_arena.len() - 1) as u32
        })
        .map_err(wrap)?;
    linker
        .func_wrap("env", "string_len", |caller: Caller<'_, HostContext>, handle: u32| -> u32 {
            caller.data().string_arena.get(handle as usize).map(|s| s.len() as u32).unwrap_or(0)
        })
        .map_err(wrap)?;

    linker.func_wrap("env", "now", |_: Caller<'_, HostContext>| -> i64 { TimeStamp::now().nanos() }).map_err(wrap)?;

    linker
        .func_wrap("env", "panic", |mut caller: Caller<'_, HostContext>, ptr: u32, len: u32| -> wasmtime::Result<()> {
            let message = caller
                .get_export("memory")
                .and_then(|e| e.into_memory())
                .map(|m| {
                    let data = m.data(&caller);
                    let end = (ptr as usize).saturating_add(len as usize).min(data.len());
                    String::from_utf8_lossy(&data[(ptr as usize).min(end)..end]).into_owned()
                })
                .unwrap_or_else(|| "guest panic".to_string());
            Err(wasmtime::Error::msg(message))
        })
        .map_err(wrap)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_arenas_empties_both_arenas_but_keeps_channel_and_state_data() {
        let mut ctx = HostContext::default();
        ctx.series_arena.push(Series::F64(vec![1.0]));
        ctx.string_arena.push("hi".to_string());
        ctx.channel_values.insert(1, SampleValue::F64(2.0));
        ctx.state_vars.insert(StateKey::new(0, 0), SampleValue::I64(3));

        ctx.clear_arenas();

        assert!(ctx.series_arena.is_empty());
        assert!(ctx.string_arena.is_empty());
        assert_eq!(ctx.channel_values.len(), 1);
        assert_eq!(ctx.state_vars.len(), 1);
    }

    #[test]
    fn channel_read_and_write_roundtrip_through_the_guest_abi() {
        use crate::module::Module;

        let wasm = wat::parse_str(
            r#"(module
                 (import "env" "channel_read_f64" (func $read (param i32) (result f64)))
                 (import "env" "channel_write_f64" (func $write (param i32 f64)))
                 (memory (export "memory") 1)
                 (func (export "relay") (param $unused f64) (result f64)
                   (call $write (i32.const 7) (f64.mul (call $read (i32.const 3)) (f64.const 2)))
                   (f64.const 0)))"#,
        )
        .unwrap();
        let mut module = Module::compile(&wasm, HashMap::new()).unwrap();
        module.host_ctx_mut().channel_values.insert(3, SampleValue::F64(4.0));

        let outputs = vec![arc_ir::Param::new("out", arc_telem::DataType::F64)];
        module.call("relay", &[], &[SampleValue::F64(0.0)], &outputs).unwrap();

        assert_eq!(module.host_ctx_mut().channel_writes, vec![(7, SampleValue::F64(8.0))]);
    }
}
