//! WASM backend: encodes a control-flow graph as a wasm module using the
//! `wasm-encoder` crate.
//!
//! Wasm has no arbitrary branches, so the graph is lowered to a dispatch
//! loop. The local `next` holds the id of the block to run; a `br_table`
//! at the top of the loop jumps into that block's code, and every
//! terminator stores a new id and branches back to the loop.
//!
//! ```text
//! loop
//!   block            ;; exits into block K-1
//!     ...
//!       block        ;; exits into block 0
//!         br_table 0 1 .. K-1 (local.get next)
//!       end
//!       <block 0>
//!     ...
//!   end
//!   <block K-1>
//! end
//! unreachable
//! ```

use std::borrow::Cow;

use wasm_encoder::{
    BlockType, CodeSection, EntityType, ExportKind, ExportSection, Function, FunctionSection,
    ImportSection, Instruction, MemArg, MemorySection, MemoryType, Module, TypeSection, ValType,
};

use crate::builtins::{BUILTINS, BuiltinKind, WASM_IMPORT_MODULE, builtin_index, output_builtin};
use crate::cfg::{CellOp, ControlFlowGraph, Inst, Operand, TAPE_SIZE, Terminator};

/// Name under which the tape memory is exported.
pub const TAPE_EXPORT: &str = "tape";

const WASM_PAGE_SIZE: u32 = 65_536;

// Locals of `main`.
const CURSOR: u32 = 0;
const NEXT: u32 = 1;
const LHS: u32 = 2;
const RHS: u32 = 3;
const LOCAL_COUNT: u32 = 4;

const BYTE: MemArg = MemArg {
    offset: 0,
    align: 0,
    memory_index: 0,
};

/// Build a wasm module exporting `main : () -> i32` and the tape memory.
pub fn generate_wasm(graph: &ControlFlowGraph) -> Vec<u8> {
    let mut module = Module::new();

    let mut types = TypeSection::new();
    for builtin in BUILTINS {
        types
            .ty()
            .function(vec![ValType::I32; builtin.params], [ValType::I32]);
    }
    let main_type_index = types.len();
    types.ty().function([], [ValType::I32]);
    module.section(&types);

    let mut imports = ImportSection::new();
    for (type_index, builtin) in BUILTINS.iter().enumerate() {
        imports.import(
            WASM_IMPORT_MODULE,
            builtin.wasm_name,
            EntityType::Function(type_index as u32),
        );
    }
    module.section(&imports);

    let mut functions = FunctionSection::new();
    functions.function(main_type_index);
    module.section(&functions);

    let mut memories = MemorySection::new();
    memories.memory(MemoryType {
        minimum: u64::from(TAPE_SIZE.div_ceil(WASM_PAGE_SIZE)),
        maximum: None,
        memory64: false,
        shared: false,
        page_size_log2: None,
    });
    module.section(&memories);

    let mut exports = ExportSection::new();
    let main_index = BUILTINS.len() as u32;
    exports.export("main", ExportKind::Func, main_index);
    exports.export(TAPE_EXPORT, ExportKind::Memory, 0);
    module.section(&exports);

    let mut code = CodeSection::new();
    code.function(&emit_main(graph));
    module.section(&code);

    module.finish()
}

fn emit_main(graph: &ControlFlowGraph) -> Function {
    let mut function = Function::new([(LOCAL_COUNT, ValType::I32)]);
    let count = graph.blocks.len() as u32;

    function.instruction(&Instruction::I32Const(0));
    function.instruction(&Instruction::LocalSet(CURSOR));
    function.instruction(&Instruction::I32Const(graph.entry() as i32));
    function.instruction(&Instruction::LocalSet(NEXT));

    function.instruction(&Instruction::Loop(BlockType::Empty));
    for _ in 0..count {
        function.instruction(&Instruction::Block(BlockType::Empty));
    }
    function.instruction(&Instruction::LocalGet(NEXT));
    let targets: Vec<u32> = (0..count).collect();
    function.instruction(&Instruction::BrTable(Cow::Owned(targets), count - 1));

    for (id, block) in graph.blocks.iter().enumerate() {
        // Closes the block whose exit leads here.
        function.instruction(&Instruction::End);
        let loop_depth = count - 1 - id as u32;
        for inst in &block.insts {
            emit_inst(&mut function, inst);
        }
        emit_terminator(&mut function, &block.terminator, loop_depth);
    }

    function.instruction(&Instruction::End);
    function.instruction(&Instruction::Unreachable);
    function.instruction(&Instruction::End);
    function
}

fn emit_inst(function: &mut Function, inst: &Inst) {
    match *inst {
        Inst::SetCursor(addr) => {
            function.instruction(&Instruction::I32Const(addr as i32));
            function.instruction(&Instruction::LocalSet(CURSOR));
        }
        Inst::Update { op, rhs } => {
            // Store address stays at the bottom of the stack.
            function.instruction(&Instruction::LocalGet(CURSOR));
            if op == CellOp::Copy {
                push_operand(function, rhs);
                function.instruction(&Instruction::I32Store8(BYTE));
                return;
            }
            function.instruction(&Instruction::LocalGet(CURSOR));
            function.instruction(&Instruction::I32Load8U(BYTE));
            push_operand(function, rhs);
            match op {
                CellOp::Add => {
                    function.instruction(&Instruction::I32Add);
                }
                CellOp::Sub => {
                    function.instruction(&Instruction::I32Sub);
                }
                CellOp::Mul => {
                    function.instruction(&Instruction::I32Mul);
                }
                CellOp::Div => emit_checked_div(function),
                CellOp::Copy => {}
            }
            function.instruction(&Instruction::I32Store8(BYTE));
        }
        Inst::Input { addr } => {
            function.instruction(&Instruction::I32Const(addr as i32));
            function.instruction(&Instruction::Call(builtin_index(BuiltinKind::ReadByte)));
            function.instruction(&Instruction::I32Store8(BYTE));
        }
        Inst::Output { addr, format } => {
            function.instruction(&Instruction::I32Const(addr as i32));
            function.instruction(&Instruction::I32Load8U(BYTE));
            function.instruction(&Instruction::Call(builtin_index(output_builtin(format))));
            function.instruction(&Instruction::Drop);
        }
    }
}

fn push_operand(function: &mut Function, operand: Operand) {
    match operand {
        Operand::Const(value) => {
            function.instruction(&Instruction::I32Const(value));
        }
        Operand::Cell(addr) => {
            function.instruction(&Instruction::I32Const(addr as i32));
            function.instruction(&Instruction::I32Load8U(BYTE));
        }
    }
}

/// `[lhs, rhs] -> [rhs == 0 ? 0 : lhs / rhs]`
fn emit_checked_div(function: &mut Function) {
    function.instruction(&Instruction::LocalSet(RHS));
    function.instruction(&Instruction::LocalSet(LHS));
    function.instruction(&Instruction::I32Const(0));
    function.instruction(&Instruction::LocalGet(LHS));
    function.instruction(&Instruction::I32Const(1));
    function.instruction(&Instruction::LocalGet(RHS));
    function.instruction(&Instruction::LocalGet(RHS));
    function.instruction(&Instruction::I32Eqz);
    function.instruction(&Instruction::Select);
    function.instruction(&Instruction::I32DivS);
    function.instruction(&Instruction::LocalGet(RHS));
    function.instruction(&Instruction::I32Eqz);
    function.instruction(&Instruction::Select);
}

fn emit_terminator(function: &mut Function, terminator: &Terminator, loop_depth: u32) {
    match *terminator {
        Terminator::Jump(target) => {
            function.instruction(&Instruction::I32Const(target as i32));
            function.instruction(&Instruction::LocalSet(NEXT));
            function.instruction(&Instruction::Br(loop_depth));
        }
        Terminator::BranchOnZero {
            then_block,
            else_block,
        } => {
            function.instruction(&Instruction::I32Const(then_block as i32));
            function.instruction(&Instruction::I32Const(else_block as i32));
            function.instruction(&Instruction::LocalGet(CURSOR));
            function.instruction(&Instruction::I32Load8U(BYTE));
            function.instruction(&Instruction::I32Eqz);
            function.instruction(&Instruction::Select);
            function.instruction(&Instruction::LocalSet(NEXT));
            function.instruction(&Instruction::Br(loop_depth));
        }
        Terminator::Return(status) => {
            function.instruction(&Instruction::I32Const(status));
            function.instruction(&Instruction::Return);
        }
    }
}
