/// The fixed runtime surface of the Hash language.
///
/// Every built-in has a fixed signature and a fixed purity bit. The table is
/// registered into the analyzer's function table before user functions are
/// collected (so users cannot shadow a built-in), and each entry is
/// materialized as a concrete IR definition at the top of the emitted module
/// (see `ir::runtime`).
use crate::types::Type;

#[derive(Debug, Clone, PartialEq)]
pub struct Builtin {
    pub name: &'static str,
    pub params: &'static [Type],
    pub ret: Type,
    pub is_pure: bool,
}

pub const BUILTINS: &[Builtin] = &[
    // Formatted output
    Builtin { name: "print_i32", params: &[Type::I32], ret: Type::Void, is_pure: false },
    Builtin { name: "print_i64", params: &[Type::I64], ret: Type::Void, is_pure: false },
    Builtin { name: "print_f64", params: &[Type::F64], ret: Type::Void, is_pure: false },
    Builtin { name: "print_bool", params: &[Type::Bool], ret: Type::Void, is_pure: false },
    Builtin { name: "print_str", params: &[Type::Str], ret: Type::Void, is_pure: false },
    Builtin { name: "print", params: &[Type::I32], ret: Type::Void, is_pure: false },
    Builtin { name: "println", params: &[], ret: Type::Void, is_pure: false },
    // Input
    Builtin { name: "read_i32", params: &[], ret: Type::I32, is_pure: false },
    Builtin { name: "read_f64", params: &[], ret: Type::F64, is_pure: false },
    // Type conversions
    Builtin { name: "i32_to_i64", params: &[Type::I32], ret: Type::I64, is_pure: true },
    Builtin { name: "i64_to_i32", params: &[Type::I64], ret: Type::I32, is_pure: true },
    Builtin { name: "i32_to_f64", params: &[Type::I32], ret: Type::F64, is_pure: true },
    Builtin { name: "f64_to_i32", params: &[Type::F64], ret: Type::I32, is_pure: true },
    Builtin { name: "i64_to_f64", params: &[Type::I64], ret: Type::F64, is_pure: true },
    Builtin { name: "f64_to_i64", params: &[Type::F64], ret: Type::I64, is_pure: true },
    Builtin { name: "int", params: &[Type::F64], ret: Type::I32, is_pure: true },
    Builtin { name: "float", params: &[Type::I32], ret: Type::F64, is_pure: true },
    // Integer math
    Builtin { name: "abs_i32", params: &[Type::I32], ret: Type::I32, is_pure: true },
    Builtin { name: "abs", params: &[Type::I32], ret: Type::I32, is_pure: true },
    Builtin { name: "min_i32", params: &[Type::I32, Type::I32], ret: Type::I32, is_pure: true },
    Builtin { name: "max_i32", params: &[Type::I32, Type::I32], ret: Type::I32, is_pure: true },
    Builtin { name: "min", params: &[Type::I32, Type::I32], ret: Type::I32, is_pure: true },
    Builtin { name: "max", params: &[Type::I32, Type::I32], ret: Type::I32, is_pure: true },
    // Floating-point math
    Builtin { name: "sqrt_f64", params: &[Type::F64], ret: Type::F64, is_pure: true },
    Builtin { name: "sqrt", params: &[Type::F64], ret: Type::F64, is_pure: true },
    Builtin { name: "pow", params: &[Type::F64, Type::F64], ret: Type::F64, is_pure: true },
    Builtin { name: "floor", params: &[Type::F64], ret: Type::F64, is_pure: true },
    Builtin { name: "ceil", params: &[Type::F64], ret: Type::F64, is_pure: true },
    Builtin { name: "round", params: &[Type::F64], ret: Type::F64, is_pure: true },
    Builtin { name: "sin", params: &[Type::F64], ret: Type::F64, is_pure: true },
    Builtin { name: "cos", params: &[Type::F64], ret: Type::F64, is_pure: true },
    Builtin { name: "tan", params: &[Type::F64], ret: Type::F64, is_pure: true },
    Builtin { name: "asin", params: &[Type::F64], ret: Type::F64, is_pure: true },
    Builtin { name: "acos", params: &[Type::F64], ret: Type::F64, is_pure: true },
    Builtin { name: "atan", params: &[Type::F64], ret: Type::F64, is_pure: true },
    Builtin { name: "exp", params: &[Type::F64], ret: Type::F64, is_pure: true },
    Builtin { name: "log", params: &[Type::F64], ret: Type::F64, is_pure: true },
    Builtin { name: "log2", params: &[Type::F64], ret: Type::F64, is_pure: true },
    Builtin { name: "log10", params: &[Type::F64], ret: Type::F64, is_pure: true },
    // System
    Builtin { name: "exit", params: &[Type::I32], ret: Type::Void, is_pure: false },
    Builtin { name: "hash_time", params: &[], ret: Type::I64, is_pure: false },
    Builtin { name: "hash_clock", params: &[], ret: Type::F64, is_pure: false },
    Builtin { name: "random", params: &[], ret: Type::F64, is_pure: false },
    Builtin { name: "seed_random", params: &[Type::I32], ret: Type::Void, is_pure: false },
    Builtin { name: "random_range", params: &[Type::I32, Type::I32], ret: Type::I32, is_pure: false },
    // Strings
    Builtin { name: "len", params: &[Type::Str], ret: Type::I32, is_pure: true },
    Builtin { name: "str_concat", params: &[Type::Str, Type::Str], ret: Type::Str, is_pure: true },
    Builtin { name: "str_eq", params: &[Type::Str, Type::Str], ret: Type::Bool, is_pure: true },
    Builtin { name: "upper", params: &[Type::Str], ret: Type::Str, is_pure: true },
    Builtin { name: "lower", params: &[Type::Str], ret: Type::Str, is_pure: true },
    // File I/O
    Builtin { name: "file_read", params: &[Type::Str], ret: Type::Str, is_pure: false },
    Builtin { name: "file_write", params: &[Type::Str, Type::Str], ret: Type::Bool, is_pure: false },
    Builtin { name: "file_exists", params: &[Type::Str], ret: Type::Bool, is_pure: false },
    Builtin { name: "file_delete", params: &[Type::Str], ret: Type::Bool, is_pure: false },
];

pub fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|b| b.name == name)
}

/// Math built-ins lowered through the back-end's intrinsics (or libm
/// references for the inverse trig trio) rather than through the runtime
/// surface definitions.
pub fn is_intrinsic_math(name: &str) -> bool {
    matches!(
        name,
        "pow" | "floor"
            | "ceil"
            | "round"
            | "sqrt"
            | "sin"
            | "cos"
            | "tan"
            | "asin"
            | "acos"
            | "atan"
            | "exp"
            | "log"
            | "log2"
            | "log10"
    )
}
