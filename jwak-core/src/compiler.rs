use log::debug;

use crate::builtins::{BUILTINS, BuiltinDescriptor, BuiltinKind, output_builtin};
use crate::cfg::{ControlFlowGraph, Inst};
use crate::codegen::generate;
use crate::codegen_llvm::generate_llvm_ir;
use crate::codegen_wasm::generate_wasm;
use crate::error::CoreError;
use crate::parser::parse;

/// Settings for the emitted module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodegenOptions {
    pub module_name: String,
    /// Written as `target triple` in LLVM output when set.
    pub target_triple: Option<String>,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        CodegenOptions {
            module_name: "jwak".to_string(),
            target_triple: None,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct CompilationArtifact {
    pub wasm: Vec<u8>,
    pub block_count: usize,
    /// Builtins the program calls, in `BUILTINS` order.
    pub builtins: Vec<BuiltinDescriptor>,
}

/// Run the front end and code generation: text to control-flow graph.
///
/// `source` must already be stripped of decorations.
pub fn lower(source: &str) -> Result<ControlFlowGraph, CoreError> {
    let program = parse(source)?;
    debug!("parsed {} statements", program.statements.len());
    generate(&program)
}

pub fn emit_llvm_ir(source: &str, options: &CodegenOptions) -> Result<String, CoreError> {
    let graph = lower(source)?;
    Ok(generate_llvm_ir(&graph, options))
}

pub fn compile_wasm(source: &str) -> Result<CompilationArtifact, CoreError> {
    let graph = lower(source)?;
    let wasm = generate_wasm(&graph);
    debug!(
        "encoded {} blocks into {} bytes of wasm",
        graph.blocks.len(),
        wasm.len()
    );
    Ok(CompilationArtifact {
        wasm,
        block_count: graph.blocks.len(),
        builtins: builtins_called(&graph),
    })
}

fn builtins_called(graph: &ControlFlowGraph) -> Vec<BuiltinDescriptor> {
    let mut kinds: Vec<BuiltinKind> = Vec::new();
    for inst in graph.blocks.iter().flat_map(|block| &block.insts) {
        let kind = match *inst {
            Inst::Input { .. } => BuiltinKind::ReadByte,
            Inst::Output { format, .. } => output_builtin(format),
            Inst::SetCursor(_) | Inst::Update { .. } => continue,
        };
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    BUILTINS
        .iter()
        .filter(|builtin| kinds.contains(&builtin.kind))
        .cloned()
        .collect()
}
