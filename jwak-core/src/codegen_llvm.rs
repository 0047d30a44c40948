//! LLVM backend: prints a control-flow graph as textual LLVM IR.
//!
//! The output uses opaque pointers and is meant to be fed to `llc` and a
//! C linker. The tape is an internal global; the cursor lives in an
//! `alloca` created by the `entry` block.

use crate::builtins::{BuiltinKind, find_builtin, output_builtin};
use crate::cfg::{CellOp, ControlFlowGraph, Inst, Operand, OutputFormat, TAPE_SIZE, Terminator};
use crate::compiler::CodegenOptions;

/// Generate a complete LLVM IR module for `graph`.
pub fn generate_llvm_ir(graph: &ControlFlowGraph, options: &CodegenOptions) -> String {
    let mut writer = LlvmWriter::default();
    writer.emit_prelude(options);
    writer.emit_main(graph);
    writer.out
}

/// Escape text for use inside an LLVM string literal. Quotes, backslashes
/// and ASCII control characters become `\XX` hex escapes.
fn escape_string(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch == '"' || ch == '\\' || ch.is_ascii_control() {
            escaped.push_str(&format!("\\{:02X}", ch as u32));
        } else {
            escaped.push(ch);
        }
    }
    escaped
}

#[derive(Default)]
struct LlvmWriter {
    out: String,
    next_tmp: usize,
}

impl LlvmWriter {
    fn line(&mut self, text: &str) {
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn tmp(&mut self) -> String {
        let name = format!("%t{}", self.next_tmp);
        self.next_tmp += 1;
        name
    }

    fn emit_prelude(&mut self, options: &CodegenOptions) {
        let name = escape_string(&options.module_name);
        self.line(&format!("; ModuleID = '{name}'"));
        self.line(&format!("source_filename = \"{name}\""));
        if let Some(triple) = &options.target_triple {
            self.line(&format!("target triple = \"{}\"", escape_string(triple)));
        }
        self.line("");
        self.line(&format!(
            "@tape = internal global [{TAPE_SIZE} x i8] zeroinitializer"
        ));
        self.line("@fmt_int = private unnamed_addr constant [3 x i8] c\"%d\\00\"");
        self.line("");
        for kind in [
            BuiltinKind::ReadByte,
            BuiltinKind::WriteChar,
            BuiltinKind::WriteDecimal,
        ] {
            self.line(find_builtin(kind).llvm_declaration);
        }
        self.line("");
    }

    fn emit_main(&mut self, graph: &ControlFlowGraph) {
        self.line("define i32 @main() {");
        self.line("entry:");
        self.line("  %cursor = alloca i32, align 4");
        self.line("  store i32 0, ptr %cursor, align 4");
        let entry = graph.entry();
        self.line(&format!("  br label %{}", graph.block(entry).label));

        for block in &graph.blocks {
            self.line(&format!("{}:", block.label));
            for inst in &block.insts {
                self.emit_inst(inst);
            }
            self.emit_terminator(graph, &block.terminator);
        }
        self.line("}");
    }

    fn emit_inst(&mut self, inst: &Inst) {
        match *inst {
            Inst::SetCursor(addr) => {
                self.line(&format!("  store i32 {addr}, ptr %cursor, align 4"));
            }
            Inst::Update { op, rhs } => {
                let index = self.load_cursor();
                let ptr = self.cell_ptr(&index);
                let rhs = match rhs {
                    Operand::Const(value) => value.to_string(),
                    Operand::Cell(addr) => {
                        let rhs_ptr = self.cell_ptr(&addr.to_string());
                        self.load_cell(&rhs_ptr)
                    }
                };
                let result = match op {
                    CellOp::Copy => rhs,
                    CellOp::Add => self.binary("add", &ptr, &rhs),
                    CellOp::Sub => self.binary("sub", &ptr, &rhs),
                    CellOp::Mul => self.binary("mul", &ptr, &rhs),
                    CellOp::Div => self.checked_div(&ptr, &rhs),
                };
                let byte = self.tmp();
                self.line(&format!("  {byte} = trunc i32 {result} to i8"));
                self.line(&format!("  store i8 {byte}, ptr {ptr}, align 1"));
            }
            Inst::Input { addr } => {
                let builtin = find_builtin(BuiltinKind::ReadByte);
                let ch = self.tmp();
                self.line(&format!("  {ch} = call i32 @{}()", builtin.c_symbol));
                let byte = self.tmp();
                self.line(&format!("  {byte} = trunc i32 {ch} to i8"));
                let ptr = self.cell_ptr(&addr.to_string());
                self.line(&format!("  store i8 {byte}, ptr {ptr}, align 1"));
            }
            Inst::Output { addr, format } => {
                let ptr = self.cell_ptr(&addr.to_string());
                let value = self.load_cell(&ptr);
                let builtin = find_builtin(output_builtin(format));
                let result = self.tmp();
                match format {
                    OutputFormat::Char => self.line(&format!(
                        "  {result} = call i32 @{}(i32 {value})",
                        builtin.c_symbol
                    )),
                    OutputFormat::Decimal => self.line(&format!(
                        "  {result} = call i32 (ptr, ...) @{}(ptr @fmt_int, i32 {value})",
                        builtin.c_symbol
                    )),
                }
            }
        }
    }

    fn emit_terminator(&mut self, graph: &ControlFlowGraph, terminator: &Terminator) {
        match *terminator {
            Terminator::Jump(target) => {
                self.line(&format!("  br label %{}", graph.block(target).label));
            }
            Terminator::BranchOnZero {
                then_block,
                else_block,
            } => {
                let index = self.load_cursor();
                let ptr = self.cell_ptr(&index);
                let value = self.load_cell(&ptr);
                let is_zero = self.tmp();
                self.line(&format!("  {is_zero} = icmp eq i32 {value}, 0"));
                self.line(&format!(
                    "  br i1 {is_zero}, label %{}, label %{}",
                    graph.block(then_block).label,
                    graph.block(else_block).label
                ));
            }
            Terminator::Return(status) => self.line(&format!("  ret i32 {status}")),
        }
    }

    fn load_cursor(&mut self) -> String {
        let index = self.tmp();
        self.line(&format!("  {index} = load i32, ptr %cursor, align 4"));
        index
    }

    fn cell_ptr(&mut self, index: &str) -> String {
        let ptr = self.tmp();
        self.line(&format!(
            "  {ptr} = getelementptr inbounds [{TAPE_SIZE} x i8], ptr @tape, i32 0, i32 {index}"
        ));
        ptr
    }

    /// Load a cell and zero-extend it to `i32`.
    fn load_cell(&mut self, ptr: &str) -> String {
        let byte = self.tmp();
        self.line(&format!("  {byte} = load i8, ptr {ptr}, align 1"));
        let value = self.tmp();
        self.line(&format!("  {value} = zext i8 {byte} to i32"));
        value
    }

    fn binary(&mut self, op: &str, lhs_ptr: &str, rhs: &str) -> String {
        let lhs = self.load_cell(lhs_ptr);
        let result = self.tmp();
        self.line(&format!("  {result} = {op} i32 {lhs}, {rhs}"));
        result
    }

    /// `sdiv` with a zero divisor replaced by 1 and the result forced to 0.
    fn checked_div(&mut self, lhs_ptr: &str, rhs: &str) -> String {
        let lhs = self.load_cell(lhs_ptr);
        let is_zero = self.tmp();
        self.line(&format!("  {is_zero} = icmp eq i32 {rhs}, 0"));
        let divisor = self.tmp();
        self.line(&format!(
            "  {divisor} = select i1 {is_zero}, i32 1, i32 {rhs}"
        ));
        let quotient = self.tmp();
        self.line(&format!("  {quotient} = sdiv i32 {lhs}, {divisor}"));
        let result = self.tmp();
        self.line(&format!(
            "  {result} = select i1 {is_zero}, i32 0, i32 {quotient}"
        ));
        result
    }
}
