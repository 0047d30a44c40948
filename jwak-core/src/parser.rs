use crate::ast::{
    ArithmeticOp, Conditional, Goto, InputOp, MemorySymbol, NumberLiteral, OutputKind, OutputOp,
    Program, Stmt,
};
use crate::error::CoreError;
use crate::lexer::{Token, TokenKind, tokenize};

pub fn parse(input: &str) -> Result<Program, CoreError> {
    let tokens = tokenize(input)?;
    parse_tokens(&tokens)
}

pub fn parse_tokens(tokens: &[Token<'_>]) -> Result<Program, CoreError> {
    let mut position = 0;
    let mut statements = Vec::new();
    while position < tokens.len() {
        statements.push(parse_statement(tokens, &mut position)?);
    }
    Ok(Program { statements })
}

fn parse_statement(tokens: &[Token<'_>], position: &mut usize) -> Result<Stmt, CoreError> {
    let token = tokens.get(*position).ok_or_else(|| CoreError::SyntaxError {
        position: *position,
        message: "unexpected end of input, expected a statement".to_string(),
    })?;
    let text = token.text.to_string();
    let stmt = match token.kind {
        TokenKind::Number => Stmt::Number(NumberLiteral { text }),
        TokenKind::Symbol => Stmt::Symbol(MemorySymbol { text }),
        TokenKind::Operator => Stmt::Operator(ArithmeticOp { text }),
        TokenKind::Input => Stmt::Input(InputOp { text }),
        TokenKind::OutputChar => Stmt::Output(OutputOp {
            text,
            kind: OutputKind::Char,
        }),
        TokenKind::OutputValue => Stmt::Output(OutputOp {
            text,
            kind: OutputKind::Decimal,
        }),
        TokenKind::Goto => Stmt::Goto(Goto { text }),
        TokenKind::LineEnd => Stmt::LineEnd,
        TokenKind::Keyword => Stmt::Keyword(text),
        TokenKind::Condition => {
            *position += 1;
            let then = parse_conditional_child(tokens, position, "branch")?;
            let test = parse_conditional_child(tokens, position, "test")?;
            return Ok(Stmt::Conditional(Conditional {
                then: Box::new(then),
                test: Box::new(test),
            }));
        }
        TokenKind::Whitespace => {
            return Err(CoreError::SyntaxError {
                position: *position,
                message: format!("unexpected {:?} token {:?}", token.kind, token.text),
            });
        }
    };
    *position += 1;
    Ok(stmt)
}

/// A conditional child is one statement on the conditional's own line.
fn parse_conditional_child(
    tokens: &[Token<'_>],
    position: &mut usize,
    role: &str,
) -> Result<Stmt, CoreError> {
    if let Some(token) = tokens.get(*position) {
        if token.kind == TokenKind::LineEnd {
            return Err(CoreError::SyntaxError {
                position: *position,
                message: format!(
                    "malformed conditional: line ends where its {role} was expected"
                ),
            });
        }
    }
    parse_statement(tokens, position)
}
