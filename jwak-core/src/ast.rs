//! Syntax tree for JWAK programs.
//!
//! Nodes keep the raw token text. Numeric meaning (values, addresses,
//! opcodes, jump targets) is derived on demand by counting glyphs.

use crate::error::CoreError;
use crate::lexer::{ADDRESS_GLYPH, JUMP_MARKER, NUMBER_SHORT, SYMBOL_SHORT};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl Program {
    /// Split the statement list into lines at every `LineEnd`.
    ///
    /// Empty groups are dropped, so leading or trailing line ends never
    /// produce an empty line.
    pub fn lines(&self) -> Vec<&[Stmt]> {
        self.statements
            .split(|stmt| matches!(stmt, Stmt::LineEnd))
            .filter(|line| !line.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Number(NumberLiteral),
    Symbol(MemorySymbol),
    Operator(ArithmeticOp),
    Input(InputOp),
    Output(OutputOp),
    Goto(Goto),
    Conditional(Conditional),
    LineEnd,
    Keyword(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberLiteral {
    pub text: String,
}

impl NumberLiteral {
    pub fn value(&self) -> i32 {
        if self.text == NUMBER_SHORT {
            return 1;
        }
        2 + count(&self.text, "아")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemorySymbol {
    pub text: String,
}

impl MemorySymbol {
    pub fn address(&self) -> i32 {
        if self.text == SYMBOL_SHORT {
            return 0;
        }
        1 + count(&self.text, "우")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArithmeticOp {
    pub text: String,
}

impl ArithmeticOp {
    /// Only the first character of an operator run is significant.
    pub fn opcode(&self) -> Result<Opcode, CoreError> {
        match self.text.chars().next() {
            Some('~') => Ok(Opcode::Add),
            Some(';') => Ok(Opcode::Sub),
            Some(',') => Ok(Opcode::Mul),
            Some('@') => Ok(Opcode::Div),
            Some(other) => Err(CoreError::SemanticError(format!(
                "unknown arithmetic operator '{other}'"
            ))),
            None => Err(CoreError::SemanticError(
                "empty arithmetic operator".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputOp {
    pub text: String,
}

impl InputOp {
    pub fn address(&self) -> i32 {
        count(&self.text, ADDRESS_GLYPH) - 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Char,
    Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputOp {
    pub text: String,
    pub kind: OutputKind,
}

impl OutputOp {
    pub fn address(&self) -> i32 {
        count(&self.text, ADDRESS_GLYPH) - 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Goto {
    pub text: String,
}

impl Goto {
    /// Index of the line this jump targets.
    pub fn target(&self) -> usize {
        self.text.matches(ADDRESS_GLYPH).count()
    }

    /// Number of jump markers (1 or 2). Decoded but not used by code
    /// generation: every goto is an absolute jump to `target()`.
    pub fn direction(&self) -> usize {
        self.text.matches(JUMP_MARKER).count()
    }
}

/// `then` runs only when the cell under the cursor is zero after `test`
/// has been executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conditional {
    pub then: Box<Stmt>,
    pub test: Box<Stmt>,
}

fn count(text: &str, glyph: &str) -> i32 {
    text.matches(glyph).count() as i32
}
