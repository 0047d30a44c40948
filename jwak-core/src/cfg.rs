//! Control-flow graph produced by code generation.
//!
//! The graph is backend neutral: `codegen_llvm` prints it as LLVM IR
//! text and `codegen_wasm` encodes it as a wasm module. Every tape
//! address in the graph has already been checked against `TAPE_SIZE`.

use crate::error::CoreError;

/// Number of byte cells on the tape.
pub const TAPE_SIZE: u32 = 30_000;

pub type BlockId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellOp {
    Copy,
    Add,
    Sub,
    Mul,
    /// Signed division; a zero divisor stores 0.
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Const(i32),
    Cell(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Char,
    Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inst {
    SetCursor(u32),
    /// `tape[cursor] = tape[cursor] <op> rhs`, truncated to 8 bits.
    Update { op: CellOp, rhs: Operand },
    /// Read one byte of input into `tape[addr]`.
    Input { addr: u32 },
    Output { addr: u32, format: OutputFormat },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    Jump(BlockId),
    /// Go to `then_block` when the cell under the cursor is zero.
    BranchOnZero {
        then_block: BlockId,
        else_block: BlockId,
    },
    Return(i32),
}

impl Terminator {
    pub fn successors(&self) -> Vec<BlockId> {
        match *self {
            Terminator::Jump(target) => vec![target],
            Terminator::BranchOnZero {
                then_block,
                else_block,
            } => vec![then_block, else_block],
            Terminator::Return(_) => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicBlock {
    pub label: String,
    pub insts: Vec<Inst>,
    pub terminator: Terminator,
}

/// A sealed graph: every block has a terminator.
///
/// `blocks[line_blocks[i]]` is the first block of source line `i`.
/// Execution starts with the cursor at 0 and enters `entry()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlFlowGraph {
    pub blocks: Vec<BasicBlock>,
    pub line_blocks: Vec<BlockId>,
    pub final_block: BlockId,
}

impl ControlFlowGraph {
    pub fn entry(&self) -> BlockId {
        self.line_blocks
            .first()
            .copied()
            .unwrap_or(self.final_block)
    }

    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id]
    }
}

/// Graph under construction. Blocks are opened without a terminator and
/// sealed once generation is complete.
#[derive(Debug, Default)]
pub(crate) struct GraphBuilder {
    blocks: Vec<(String, Vec<Inst>, Option<Terminator>)>,
}

impl GraphBuilder {
    pub(crate) fn add_block(&mut self, label: impl Into<String>) -> BlockId {
        self.blocks.push((label.into(), Vec::new(), None));
        self.blocks.len() - 1
    }

    pub(crate) fn push(&mut self, block: BlockId, inst: Inst) {
        self.blocks[block].1.push(inst);
    }

    pub(crate) fn is_terminated(&self, block: BlockId) -> bool {
        self.blocks[block].2.is_some()
    }

    pub(crate) fn terminate(&mut self, block: BlockId, terminator: Terminator) {
        let slot = &mut self.blocks[block].2;
        if slot.is_none() {
            *slot = Some(terminator);
        }
    }

    pub(crate) fn seal(
        self,
        line_blocks: Vec<BlockId>,
        final_block: BlockId,
    ) -> Result<ControlFlowGraph, CoreError> {
        let blocks = self
            .blocks
            .into_iter()
            .map(|(label, insts, terminator)| {
                let terminator = terminator.ok_or_else(|| {
                    CoreError::SemanticError(format!("block '{label}' has no terminator"))
                })?;
                Ok(BasicBlock {
                    label,
                    insts,
                    terminator,
                })
            })
            .collect::<Result<Vec<_>, CoreError>>()?;
        Ok(ControlFlowGraph {
            blocks,
            line_blocks,
            final_block,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_terminator_wins() {
        let mut builder = GraphBuilder::default();
        let a = builder.add_block("a");
        let b = builder.add_block("b");
        builder.terminate(a, Terminator::Jump(b));
        builder.terminate(a, Terminator::Return(1));
        builder.terminate(b, Terminator::Return(0));
        let graph = builder.seal(vec![a], b).expect("seal");
        assert_eq!(graph.block(a).terminator, Terminator::Jump(b));
        assert_eq!(graph.entry(), a);
    }

    #[test]
    fn sealing_rejects_open_blocks() {
        let mut builder = GraphBuilder::default();
        let a = builder.add_block("dangling");
        let err = builder.seal(vec![], a).unwrap_err();
        assert!(matches!(err, CoreError::SemanticError(msg) if msg.contains("dangling")));
    }

    #[test]
    fn entry_falls_back_to_final_block() {
        let mut builder = GraphBuilder::default();
        let end = builder.add_block("final");
        builder.terminate(end, Terminator::Return(0));
        let graph = builder.seal(Vec::new(), end).expect("seal");
        assert_eq!(graph.entry(), end);
        assert!(graph.block(end).terminator.successors().is_empty());
    }
}
