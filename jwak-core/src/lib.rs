//! Core utilities for the JWAK language toolchain.
//!
//! This crate provides the compiler pipeline for JWAK, a tape language
//! whose values, addresses and jump targets are spelled as counts of
//! repeated glyphs. The pipeline is roughly:
//!
//!   source .jwak
//!     -> decorations (punctuation stripping)
//!     -> lexer       (tokens)
//!     -> parser      (AST, decoded on demand)
//!     -> codegen     (control-flow graph, one block per line)
//!     -> codegen_llvm (LLVM IR text) / codegen_wasm (wasm-encoder)
//!
//! Higher-level tools (the CLI) should depend on this crate rather than
//! reimplementing the pipeline.

// ---------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------

pub mod error;

// ---------------------------------------------------------------------
// Front-end: decoration stripping, lexing and parsing
// ---------------------------------------------------------------------

pub mod decorations;
pub mod lexer;
pub mod parser;
pub mod ast;

// ---------------------------------------------------------------------
// Middle: control-flow graph construction
// ---------------------------------------------------------------------

pub mod cfg;
pub mod codegen;

// ---------------------------------------------------------------------
// Runtime symbols
// ---------------------------------------------------------------------

pub mod builtins;

// ---------------------------------------------------------------------
// Back-end: emitters and compiler orchestration
// ---------------------------------------------------------------------

pub mod codegen_llvm;
pub mod codegen_wasm;
pub mod compiler;

#[cfg(test)]
mod test_support;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use compiler::{CodegenOptions, CompilationArtifact, compile_wasm, emit_llvm_ir, lower};
pub use decorations::strip_decorations;
pub use error::CoreError;
