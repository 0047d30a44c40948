//! Runtime symbols the generated program links against.
//!
//! Both backends lower I/O instructions to calls of these symbols. The
//! LLVM backend declares them as C library functions; the wasm backend
//! imports them from the host under `WASM_IMPORT_MODULE`.

use crate::cfg::OutputFormat;

/// Module name used for every wasm import.
pub const WASM_IMPORT_MODULE: &str = "env";

/// Kind of builtin, used by backends to decide how to lower a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinKind {
    /// Reads one byte of input; returns -1 at end of input.
    ReadByte,

    /// Writes the argument as a single character.
    WriteChar,

    /// Writes the argument as a decimal integer.
    WriteDecimal,
}

/// Metadata about a single runtime symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltinDescriptor {
    pub kind: BuiltinKind,

    /// Symbol name of the C library function behind the builtin.
    pub c_symbol: &'static str,

    /// Import name inside `WASM_IMPORT_MODULE`.
    pub wasm_name: &'static str,

    /// Number of `i32` parameters. Every builtin returns an `i32`.
    pub params: usize,

    /// LLVM declaration line.
    pub llvm_declaration: &'static str,
}

/// The complete list of builtins, in wasm import order.
pub const BUILTINS: &[BuiltinDescriptor] = &[
    BuiltinDescriptor {
        kind: BuiltinKind::ReadByte,
        c_symbol: "getchar",
        wasm_name: "getchar",
        params: 0,
        llvm_declaration: "declare i32 @getchar()",
    },
    BuiltinDescriptor {
        kind: BuiltinKind::WriteChar,
        c_symbol: "putchar",
        wasm_name: "putchar",
        params: 1,
        llvm_declaration: "declare i32 @putchar(i32)",
    },
    BuiltinDescriptor {
        kind: BuiltinKind::WriteDecimal,
        c_symbol: "printf",
        wasm_name: "print_i32",
        params: 1,
        llvm_declaration: "declare i32 @printf(ptr, ...)",
    },
];

pub fn find_builtin(kind: BuiltinKind) -> &'static BuiltinDescriptor {
    &BUILTINS[builtin_index(kind) as usize]
}

/// Position of the builtin in `BUILTINS`, which is also its wasm
/// function index.
pub fn builtin_index(kind: BuiltinKind) -> u32 {
    match kind {
        BuiltinKind::ReadByte => 0,
        BuiltinKind::WriteChar => 1,
        BuiltinKind::WriteDecimal => 2,
    }
}

pub fn output_builtin(format: OutputFormat) -> BuiltinKind {
    match format {
        OutputFormat::Char => BuiltinKind::WriteChar,
        OutputFormat::Decimal => BuiltinKind::WriteDecimal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_a_descriptor() {
        for kind in [
            BuiltinKind::ReadByte,
            BuiltinKind::WriteChar,
            BuiltinKind::WriteDecimal,
        ] {
            assert_eq!(find_builtin(kind).kind, kind);
            assert_eq!(BUILTINS[builtin_index(kind) as usize].kind, kind);
        }
    }

    #[test]
    fn decimal_output_goes_through_printf() {
        let builtin = find_builtin(output_builtin(OutputFormat::Decimal));
        assert_eq!(builtin.c_symbol, "printf");
        assert_eq!(builtin.wasm_name, "print_i32");
    }
}
