use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use jwak_core::builtins::WASM_IMPORT_MODULE;
use jwak_core::{CodegenOptions, CompilationArtifact, compile_wasm, emit_llvm_ir, strip_decorations};
use log::{LevelFilter, debug, warn};
use simple_logger::SimpleLogger;
use wasmi::{Caller, Engine, Linker, Module, Store};

/// Compile JWAK source into LLVM IR or a runnable wasm module.
#[derive(Parser, Debug)]
#[command(name = "jwak", version, about, long_about = None)]
struct Cli {
    #[arg(short, long, help = "Source file (reads stdin when omitted)")]
    input: Option<String>,

    #[arg(short, long)]
    output: String,

    #[arg(
        long,
        value_name = "FORMAT",
        default_value = "llvm",
        help = "Output format: llvm, wasm"
    )]
    emit: String,

    #[arg(long, value_name = "TRIPLE", help = "Target triple written into LLVM output")]
    target_triple: Option<String>,

    #[arg(long, value_name = "NAME", default_value = "jwak")]
    module_name: String,

    #[arg(long, help = "Do not strip decorative punctuation before lexing")]
    raw: bool,

    #[arg(long, help = "Run the code if the output format is wasm")]
    run: bool,

    #[arg(short, long, help = "Enable debug logging")]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    SimpleLogger::new()
        .with_level(level)
        .init()
        .context("failed to initialize logger")?;
    execute(cli)
}

fn execute(cli: Cli) -> Result<()> {
    let source = match &cli.input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read input file {path}"))?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    let source = if cli.raw {
        source
    } else {
        strip_decorations(&source)
    };

    match cli.emit.as_str() {
        "llvm" => {
            let options = CodegenOptions {
                module_name: cli.module_name.clone(),
                target_triple: cli.target_triple.clone(),
            };
            let ir = emit_llvm_ir(&source, &options)?;
            write_output(&cli.output, ir.as_bytes())?;
            if cli.run {
                warn!("--run is ignored for non-wasm outputs");
            }
        }
        "wasm" => {
            let artifact = compile_wasm(&source)?;
            debug!("{} basic blocks", artifact.block_count);
            write_output(&cli.output, &artifact.wasm)?;
            if cli.run {
                let status = run_wasm(&artifact)?;
                if status != 0 {
                    warn!("program exited with status {status}");
                }
            }
        }
        other => return Err(anyhow::anyhow!("unsupported emit format: {other}")),
    }

    Ok(())
}

fn write_output(path: &str, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = PathBuf::from(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {parent:?}"))?;
        }
    }
    fs::write(path, bytes).with_context(|| format!("failed to write output file {path}"))?;
    Ok(())
}

/// Execute the module with this process's stdin and stdout as its I/O.
fn run_wasm(artifact: &CompilationArtifact) -> Result<i32> {
    let engine = Engine::default();
    let module = Module::new(&engine, &artifact.wasm[..]).context("failed to compile wasm artifact")?;
    let mut linker = Linker::<()>::new(&engine);
    linker
        .func_wrap(WASM_IMPORT_MODULE, "getchar", |_: Caller<'_, ()>| -> i32 {
            let mut byte = [0u8; 1];
            match io::stdin().read(&mut byte) {
                Ok(1) => i32::from(byte[0]),
                _ => -1,
            }
        })
        .context("failed to link getchar")?;
    linker
        .func_wrap(WASM_IMPORT_MODULE, "putchar", |_: Caller<'_, ()>, value: i32| -> i32 {
            match io::stdout().write_all(&[value as u8]) {
                Ok(()) => value,
                Err(_) => -1,
            }
        })
        .context("failed to link putchar")?;
    linker
        .func_wrap(WASM_IMPORT_MODULE, "print_i32", |_: Caller<'_, ()>, value: i32| -> i32 {
            let text = value.to_string();
            match io::stdout().write_all(text.as_bytes()) {
                Ok(()) => text.len() as i32,
                Err(_) => -1,
            }
        })
        .context("failed to link print_i32")?;

    let mut store = Store::new(&engine, ());
    let instance = linker
        .instantiate_and_start(&mut store, &module)
        .context("failed to instantiate module")?;
    let main = instance
        .get_typed_func::<(), i32>(&store, "main")
        .context("exported main function missing or has wrong type")?;
    let result = main
        .call(&mut store, ())
        .context("failed to execute main")?;
    io::stdout().flush()?;
    Ok(result)
}
