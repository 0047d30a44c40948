//! Lowering from the AST to a control-flow graph.
//!
//! Each source line gets its own basic block, followed by a `final` block
//! that returns 0. Lines fall through to the next line unless a goto
//! already ended the block. Conditionals split the current block into a
//! `then` block and a continuation block.
//!
//! The arithmetic mode is compile-time state: it is reset at the start of
//! every line and threaded through the statements in source order.

use log::debug;

use crate::ast::{Conditional, MemorySymbol, NumberLiteral, Opcode, OutputKind, Program, Stmt};
use crate::cfg::{
    BlockId, CellOp, ControlFlowGraph, GraphBuilder, Inst, Operand, OutputFormat, TAPE_SIZE,
    Terminator,
};
use crate::error::CoreError;

/// Status returned by the generated entry function on normal completion.
pub const EXIT_SUCCESS: i32 = 0;

/// Pending arithmetic mode of the current line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Unset,
    Set(CellOp),
}

pub fn generate(program: &Program) -> Result<ControlFlowGraph, CoreError> {
    let lines = program.lines();
    let mut graph = GraphBuilder::default();
    let line_blocks: Vec<BlockId> = (0..lines.len())
        .map(|index| graph.add_block(format!("line_{index}")))
        .collect();
    let final_block = graph.add_block("final");
    graph.terminate(final_block, Terminator::Return(EXIT_SUCCESS));

    let mut generator = Generator {
        graph,
        line_blocks,
        current: final_block,
        line: 0,
        mode: Mode::Unset,
        conditionals: 0,
    };

    for (index, statements) in lines.iter().enumerate() {
        generator.emit_line(index, statements)?;
    }

    debug!(
        "generated {} lines, {} conditionals",
        lines.len(),
        generator.conditionals
    );
    let Generator {
        graph, line_blocks, ..
    } = generator;
    graph.seal(line_blocks, final_block)
}

struct Generator {
    graph: GraphBuilder,
    line_blocks: Vec<BlockId>,
    current: BlockId,
    line: usize,
    mode: Mode,
    conditionals: usize,
}

impl Generator {
    fn emit_line(&mut self, index: usize, statements: &[Stmt]) -> Result<(), CoreError> {
        self.line = index;
        self.current = self.line_blocks[index];
        self.mode = Mode::Unset;

        for (position, stmt) in statements.iter().enumerate() {
            if self.graph.is_terminated(self.current) {
                debug!(
                    "line {index}: skipping {} unreachable statement(s) after a jump",
                    statements.len() - position
                );
                break;
            }
            self.emit_statement(stmt)?;
        }

        let next = self
            .line_blocks
            .get(index + 1)
            .copied()
            .unwrap_or(self.final_block());
        self.graph.terminate(self.current, Terminator::Jump(next));
        Ok(())
    }

    fn final_block(&self) -> BlockId {
        self.line_blocks.len()
    }

    fn emit_statement(&mut self, stmt: &Stmt) -> Result<(), CoreError> {
        match stmt {
            Stmt::Number(number) => self.emit_number(number),
            Stmt::Symbol(symbol) => self.emit_symbol(symbol)?,
            Stmt::Operator(op) => {
                self.mode = Mode::Set(match op.opcode()? {
                    Opcode::Add => CellOp::Add,
                    Opcode::Sub => CellOp::Sub,
                    Opcode::Mul => CellOp::Mul,
                    Opcode::Div => CellOp::Div,
                });
            }
            Stmt::Input(input) => {
                let addr = self.tape_address(input.address())?;
                self.push(Inst::Input { addr });
            }
            Stmt::Output(output) => {
                let addr = self.tape_address(output.address())?;
                let format = match output.kind {
                    OutputKind::Char => OutputFormat::Char,
                    OutputKind::Decimal => OutputFormat::Decimal,
                };
                self.push(Inst::Output { addr, format });
            }
            Stmt::Goto(goto) => {
                let target = goto.target();
                let block = self.line_blocks.get(target).copied().ok_or_else(|| {
                    CoreError::SemanticError(format!(
                        "line {}: goto target line {target} is out of range (program has {} lines)",
                        self.line,
                        self.line_blocks.len()
                    ))
                })?;
                self.graph.terminate(self.current, Terminator::Jump(block));
            }
            Stmt::Conditional(cond) => self.emit_conditional(cond)?,
            Stmt::Keyword(_) | Stmt::LineEnd => {}
        }
        Ok(())
    }

    fn emit_number(&mut self, number: &NumberLiteral) {
        if let Mode::Set(op) = self.mode {
            self.push(Inst::Update {
                op,
                rhs: Operand::Const(number.value()),
            });
        }
    }

    fn emit_symbol(&mut self, symbol: &MemorySymbol) -> Result<(), CoreError> {
        let addr = self.tape_address(symbol.address())?;
        match self.mode {
            Mode::Unset => {
                self.push(Inst::SetCursor(addr));
                self.push(Inst::Update {
                    op: CellOp::Copy,
                    rhs: Operand::Const(0),
                });
                self.mode = Mode::Set(CellOp::Copy);
            }
            Mode::Set(op) => self.push(Inst::Update {
                op,
                rhs: Operand::Cell(addr),
            }),
        }
        Ok(())
    }

    fn emit_conditional(&mut self, cond: &Conditional) -> Result<(), CoreError> {
        self.emit_statement(&cond.test)?;
        if self.graph.is_terminated(self.current) {
            debug!("line {}: conditional test jumps away, branch is dead", self.line);
            return Ok(());
        }

        let id = self.conditionals;
        self.conditionals += 1;
        let then_block = self.graph.add_block(format!("cond_{id}_then"));
        let continuation = self.graph.add_block(format!("cond_{id}_cont"));
        self.graph.terminate(
            self.current,
            Terminator::BranchOnZero {
                then_block,
                else_block: continuation,
            },
        );

        self.current = then_block;
        self.emit_statement(&cond.then)?;
        self.graph
            .terminate(self.current, Terminator::Jump(continuation));
        self.current = continuation;
        Ok(())
    }

    fn push(&mut self, inst: Inst) {
        self.graph.push(self.current, inst);
    }

    fn tape_address(&self, address: i32) -> Result<u32, CoreError> {
        u32::try_from(address)
            .ok()
            .filter(|addr| *addr < TAPE_SIZE)
            .ok_or_else(|| {
                CoreError::SemanticError(format!(
                    "line {}: tape address {address} is outside 0..{TAPE_SIZE}",
                    self.line
                ))
            })
    }
}
