use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("lex error at byte {position}: unexpected character {character:?}")]
    LexError { position: usize, character: char },
    #[error("syntax error at token {position}: {message}")]
    SyntaxError { position: usize, message: String },
    #[error("semantic error: {0}")]
    SemanticError(String),
}
