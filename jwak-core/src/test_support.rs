//! In-process execution of generated wasm for tests.

use std::collections::VecDeque;

use wasmi::{Caller, Engine, Linker, Module, Store};

use crate::builtins::WASM_IMPORT_MODULE;
use crate::cfg::TAPE_SIZE;
use crate::codegen_wasm::TAPE_EXPORT;

#[derive(Default)]
struct HostIo {
    input: VecDeque<u8>,
    output: Vec<u8>,
}

pub(crate) struct Outcome {
    pub status: i32,
    pub output: Vec<u8>,
    pub tape: Vec<u8>,
}

pub(crate) fn run(wasm: &[u8], input: &[u8]) -> Outcome {
    let engine = Engine::default();
    let module = Module::new(&engine, wasm).expect("module");
    let mut linker = Linker::new(&engine);
    linker
        .func_wrap(
            WASM_IMPORT_MODULE,
            "getchar",
            |mut caller: Caller<'_, HostIo>| -> i32 {
                caller.data_mut().input.pop_front().map_or(-1, i32::from)
            },
        )
        .expect("link getchar");
    linker
        .func_wrap(
            WASM_IMPORT_MODULE,
            "putchar",
            |mut caller: Caller<'_, HostIo>, value: i32| -> i32 {
                caller.data_mut().output.push(value as u8);
                value
            },
        )
        .expect("link putchar");
    linker
        .func_wrap(
            WASM_IMPORT_MODULE,
            "print_i32",
            |mut caller: Caller<'_, HostIo>, value: i32| -> i32 {
                let text = value.to_string();
                caller.data_mut().output.extend_from_slice(text.as_bytes());
                text.len() as i32
            },
        )
        .expect("link print_i32");

    let mut store = Store::new(
        &engine,
        HostIo {
            input: input.iter().copied().collect(),
            output: Vec::new(),
        },
    );
    let instance = linker
        .instantiate_and_start(&mut store, &module)
        .expect("instantiate");
    let main = instance
        .get_typed_func::<(), i32>(&store, "main")
        .expect("typed func");
    let status = main.call(&mut store, ()).expect("execute main");
    let tape = instance
        .get_memory(&store, TAPE_EXPORT)
        .expect("tape export")
        .data(&store)[..TAPE_SIZE as usize]
        .to_vec();
    Outcome {
        status,
        output: store.into_data().output,
        tape,
    }
}
