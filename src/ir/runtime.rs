//! The runtime surface: concrete IR definitions for every built-in.
//!
//! Each built-in in the fixed table is materialized as a function definition
//! at the top of the emitted module, implemented against a small set of
//! C-runtime externals (printf/scanf, time/clock, rand/srand, the str*
//! family, malloc, and stdio file functions). The intrinsic-backed math
//! built-ins (`sqrt`, `pow`, `sin`, ...) have no definitions here; calls to
//! them are lowered directly at the call site (see `lower`).

use super::builder::IrBuilder;
use super::instr::CmpOp;
use super::types::IrType;

/// Intrinsic reference names for the math built-ins the back end implements
/// natively. `tan` is absent: it is lowered as `sin/cos`.
pub fn math_intrinsic(name: &str) -> Option<&'static str> {
    match name {
        "sqrt" => Some("llvm.sqrt.f64"),
        "pow" => Some("llvm.pow.f64"),
        "floor" => Some("llvm.floor.f64"),
        "ceil" => Some("llvm.ceil.f64"),
        "round" => Some("llvm.round.f64"),
        "sin" => Some("llvm.sin.f64"),
        "cos" => Some("llvm.cos.f64"),
        "exp" => Some("llvm.exp.f64"),
        "log" => Some("llvm.log.f64"),
        "log2" => Some("llvm.log2.f64"),
        "log10" => Some("llvm.log10.f64"),
        _ => None,
    }
}

/// Inverse trig has no intrinsic; these resolve to libm at link time.
pub fn is_libm_reference(name: &str) -> bool {
    matches!(name, "asin" | "acos" | "atan")
}

pub fn declare_externals(b: &mut IrBuilder) {
    // stdio
    b.declare_external_vararg("printf", vec![IrType::Ptr], IrType::I32);
    b.declare_external_vararg("scanf", vec![IrType::Ptr], IrType::I32);

    // C runtime
    b.declare_external("exit", vec![IrType::I32], IrType::Void);
    b.declare_external("time", vec![IrType::Ptr], IrType::I64);
    b.declare_external("clock", vec![], IrType::I64);
    b.declare_external("rand", vec![], IrType::I32);
    b.declare_external("srand", vec![IrType::I32], IrType::Void);

    // Strings
    b.declare_external("strlen", vec![IrType::Ptr], IrType::I64);
    b.declare_external("strcmp", vec![IrType::Ptr, IrType::Ptr], IrType::I32);
    b.declare_external("strcpy", vec![IrType::Ptr, IrType::Ptr], IrType::Ptr);
    b.declare_external("strcat", vec![IrType::Ptr, IrType::Ptr], IrType::Ptr);
    b.declare_external("malloc", vec![IrType::I64], IrType::Ptr);
    b.declare_external("toupper", vec![IrType::I32], IrType::I32);
    b.declare_external("tolower", vec![IrType::I32], IrType::I32);

    // Files
    b.declare_external("fopen", vec![IrType::Ptr, IrType::Ptr], IrType::Ptr);
    b.declare_external("fclose", vec![IrType::Ptr], IrType::I32);
    b.declare_external(
        "fseek",
        vec![IrType::Ptr, IrType::I64, IrType::I32],
        IrType::I32,
    );
    b.declare_external("ftell", vec![IrType::Ptr], IrType::I64);
    b.declare_external(
        "fread",
        vec![IrType::Ptr, IrType::I64, IrType::I64, IrType::Ptr],
        IrType::I64,
    );
    b.declare_external(
        "fwrite",
        vec![IrType::Ptr, IrType::I64, IrType::I64, IrType::Ptr],
        IrType::I64,
    );
    b.declare_external("remove", vec![IrType::Ptr], IrType::I32);
    b.declare_external("access", vec![IrType::Ptr, IrType::I32], IrType::I32);

    // Back-end math intrinsics
    b.declare_external("llvm.sqrt.f64", vec![IrType::F64], IrType::F64);
    b.declare_external("llvm.pow.f64", vec![IrType::F64, IrType::F64], IrType::F64);
    b.declare_external("llvm.floor.f64", vec![IrType::F64], IrType::F64);
    b.declare_external("llvm.ceil.f64", vec![IrType::F64], IrType::F64);
    b.declare_external("llvm.round.f64", vec![IrType::F64], IrType::F64);
    b.declare_external("llvm.sin.f64", vec![IrType::F64], IrType::F64);
    b.declare_external("llvm.cos.f64", vec![IrType::F64], IrType::F64);
    b.declare_external("llvm.exp.f64", vec![IrType::F64], IrType::F64);
    b.declare_external("llvm.log.f64", vec![IrType::F64], IrType::F64);
    b.declare_external("llvm.log2.f64", vec![IrType::F64], IrType::F64);
    b.declare_external("llvm.log10.f64", vec![IrType::F64], IrType::F64);

    // libm references without intrinsic equivalents
    b.declare_external("asin", vec![IrType::F64], IrType::F64);
    b.declare_external("acos", vec![IrType::F64], IrType::F64);
    b.declare_external("atan", vec![IrType::F64], IrType::F64);
}

pub fn define_builtins(b: &mut IrBuilder) {
    define_print_family(b);
    define_read_family(b);
    define_conversions(b);
    define_integer_math(b);
    define_sqrt(b);
    define_system(b);
    define_strings(b);
    define_files(b);
    b.finish_function();
}

// ---------------------------------------------------------------------------
// Printing
// ---------------------------------------------------------------------------

fn define_print_family(b: &mut IrBuilder) {
    define_printf_wrapper(b, "print_i32", IrType::I32, "%d\n");
    define_printf_wrapper(b, "print", IrType::I32, "%d\n");
    define_printf_wrapper(b, "print_i64", IrType::I64, "%lld\n");
    define_printf_wrapper(b, "print_f64", IrType::F64, "%f\n");
    define_printf_wrapper(b, "print_str", IrType::Ptr, "%s\n");

    // print_bool selects between two whole-line strings
    let params = b.start_function("print_bool", vec![IrType::Bool], IrType::Void);
    let value = params[0];
    let true_name = b.add_string_constant("true\n");
    let false_name = b.add_string_constant("false\n");
    let true_str = b.global_string_ptr(&true_name);
    let false_str = b.global_string_ptr(&false_name);
    let selected = b.select(value, true_str, false_str);
    b.call_void("printf", vec![selected]);
    b.ret(None);

    let _ = b.start_function("println", vec![], IrType::Void);
    let newline_name = b.add_string_constant("\n");
    let newline = b.global_string_ptr(&newline_name);
    b.call_void("printf", vec![newline]);
    b.ret(None);
}

fn define_printf_wrapper(b: &mut IrBuilder, name: &str, param: IrType, format: &str) {
    let params = b.start_function(name, vec![param], IrType::Void);
    let format_name = b.add_string_constant(format);
    let format_ptr = b.global_string_ptr(&format_name);
    b.call_void("printf", vec![format_ptr, params[0]]);
    b.ret(None);
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

fn define_read_family(b: &mut IrBuilder) {
    define_scanf_wrapper(b, "read_i32", IrType::I32, "%d");
    define_scanf_wrapper(b, "read_f64", IrType::F64, "%lf");
}

fn define_scanf_wrapper(b: &mut IrBuilder, name: &str, ret: IrType, format: &str) {
    let _ = b.start_function(name, vec![], ret);
    let format_name = b.add_string_constant(format);
    let format_ptr = b.global_string_ptr(&format_name);
    let slot = b.alloca(ret);
    b.call_void("scanf", vec![format_ptr, slot]);
    let value = b.load(slot);
    b.ret(Some(value));
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

fn define_conversions(b: &mut IrBuilder) {
    // i32_to_i64: sign extension
    let params = b.start_function("i32_to_i64", vec![IrType::I32], IrType::I64);
    let wide = b.sext(params[0], IrType::I64);
    b.ret(Some(wide));

    // i64_to_i32: truncation
    let params = b.start_function("i64_to_i32", vec![IrType::I64], IrType::I32);
    let narrow = b.trunc(params[0], IrType::I32);
    b.ret(Some(narrow));

    // i32_to_f64
    let params = b.start_function("i32_to_f64", vec![IrType::I32], IrType::F64);
    let fp = b.sitofp(params[0], IrType::F64);
    b.ret(Some(fp));

    // f64_to_i32
    let params = b.start_function("f64_to_i32", vec![IrType::F64], IrType::I32);
    let int = b.fptosi(params[0], IrType::I32);
    b.ret(Some(int));

    // i64_to_f64
    let params = b.start_function("i64_to_f64", vec![IrType::I64], IrType::F64);
    let fp = b.sitofp(params[0], IrType::F64);
    b.ret(Some(fp));

    // f64_to_i64
    let params = b.start_function("f64_to_i64", vec![IrType::F64], IrType::I64);
    let int = b.fptosi(params[0], IrType::I64);
    b.ret(Some(int));

    // int(f64) -> i32 and float(i32) -> f64, the short-name wrappers
    let params = b.start_function("int", vec![IrType::F64], IrType::I32);
    let int = b.fptosi(params[0], IrType::I32);
    b.ret(Some(int));

    let params = b.start_function("float", vec![IrType::I32], IrType::F64);
    let fp = b.sitofp(params[0], IrType::F64);
    b.ret(Some(fp));
}

// ---------------------------------------------------------------------------
// Integer math
// ---------------------------------------------------------------------------

fn define_integer_math(b: &mut IrBuilder) {
    for name in ["abs_i32", "abs"] {
        // Branchless negate-on-negative
        let params = b.start_function(name, vec![IrType::I32], IrType::I32);
        let input = params[0];
        let zero = b.const_i32(0);
        let is_neg = b.icmp(CmpOp::Slt, input, zero);
        let negated = b.neg(input);
        let result = b.select(is_neg, negated, input);
        b.ret(Some(result));
    }

    for name in ["min_i32", "min"] {
        let params = b.start_function(name, vec![IrType::I32, IrType::I32], IrType::I32);
        let is_less = b.icmp(CmpOp::Slt, params[0], params[1]);
        let result = b.select(is_less, params[0], params[1]);
        b.ret(Some(result));
    }

    for name in ["max_i32", "max"] {
        let params = b.start_function(name, vec![IrType::I32, IrType::I32], IrType::I32);
        let is_greater = b.icmp(CmpOp::Sgt, params[0], params[1]);
        let result = b.select(is_greater, params[0], params[1]);
        b.ret(Some(result));
    }
}

fn define_sqrt(b: &mut IrBuilder) {
    for name in ["sqrt_f64", "sqrt"] {
        let params = b.start_function(name, vec![IrType::F64], IrType::F64);
        let result = b.call("llvm.sqrt.f64", vec![params[0]]);
        b.ret(Some(result));
    }
}

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

fn define_system(b: &mut IrBuilder) {
    // hash_time() -> i64: Unix epoch seconds
    let _ = b.start_function("hash_time", vec![], IrType::I64);
    let null = b.const_null();
    let timestamp = b.call("time", vec![null]);
    b.ret(Some(timestamp));

    // hash_clock() -> f64: CPU clock divided by 1e6
    let _ = b.start_function("hash_clock", vec![], IrType::F64);
    let ticks = b.call("clock", vec![]);
    let per_sec = b.const_int(1_000_000);
    let ticks_fp = b.sitofp(ticks, IrType::F64);
    let per_sec_fp = b.sitofp(per_sec, IrType::F64);
    let seconds = b.fdiv(ticks_fp, per_sec_fp);
    b.ret(Some(seconds));

    // random() -> f64: rand() / RAND_MAX with the C runtime's RAND_MAX
    let _ = b.start_function("random", vec![], IrType::F64);
    let raw = b.call("rand", vec![]);
    let rand_max = b.const_i32(32767);
    let raw_fp = b.sitofp(raw, IrType::F64);
    let max_fp = b.sitofp(rand_max, IrType::F64);
    let unit = b.fdiv(raw_fp, max_fp);
    b.ret(Some(unit));

    // seed_random(i32)
    let params = b.start_function("seed_random", vec![IrType::I32], IrType::Void);
    b.call_void("srand", vec![params[0]]);
    b.ret(None);

    // random_range(min, max) -> min + rand() % (max - min + 1)
    let params = b.start_function("random_range", vec![IrType::I32, IrType::I32], IrType::I32);
    let (lo, hi) = (params[0], params[1]);
    let raw = b.call("rand", vec![]);
    let diff = b.sub(hi, lo);
    let one = b.const_i32(1);
    let span = b.add(diff, one);
    let offset = b.srem(raw, span);
    let result = b.add(lo, offset);
    b.ret(Some(result));
}

// ---------------------------------------------------------------------------
// Strings
// ---------------------------------------------------------------------------

fn define_strings(b: &mut IrBuilder) {
    // len(str) -> i32, truncated from strlen's 64-bit result
    let params = b.start_function("len", vec![IrType::Ptr], IrType::I32);
    let len64 = b.call("strlen", vec![params[0]]);
    let len32 = b.trunc(len64, IrType::I32);
    b.ret(Some(len32));

    // str_concat allocates len(a) + len(b) + 1 and copies both halves
    let params = b.start_function("str_concat", vec![IrType::Ptr, IrType::Ptr], IrType::Ptr);
    let (a, bstr) = (params[0], params[1]);
    let len_a = b.call("strlen", vec![a]);
    let len_b = b.call("strlen", vec![bstr]);
    let total = b.add(len_a, len_b);
    let one = b.const_int(1);
    let size = b.add(total, one);
    let buffer = b.call("malloc", vec![size]);
    b.call_void("strcpy", vec![buffer, a]);
    b.call_void("strcat", vec![buffer, bstr]);
    b.ret(Some(buffer));

    // str_eq: byte compare
    let params = b.start_function("str_eq", vec![IrType::Ptr, IrType::Ptr], IrType::Bool);
    let cmp = b.call("strcmp", vec![params[0], params[1]]);
    let zero = b.const_i32(0);
    let equal = b.icmp(CmpOp::Eq, cmp, zero);
    b.ret(Some(equal));

    define_case_conversion(b, "upper", "toupper");
    define_case_conversion(b, "lower", "tolower");
}

/// Allocates a new buffer and converts byte by byte through the given
/// C character function, then null-terminates.
fn define_case_conversion(b: &mut IrBuilder, name: &str, c_func: &str) {
    let params = b.start_function(name, vec![IrType::Ptr], IrType::Ptr);
    let input = params[0];
    let len = b.call("strlen", vec![input]);
    let one = b.const_int(1);
    let size = b.add(len, one);
    let result = b.call("malloc", vec![size]);

    let index = b.alloca(IrType::I64);
    let zero = b.const_int(0);
    b.store(index, zero);

    let cond_block = b.create_block();
    let body_block = b.create_block();
    let end_block = b.create_block();
    b.br(cond_block);

    b.start_block_labeled(cond_block, "loop.cond");
    let i = b.load(index);
    let in_range = b.icmp(CmpOp::Ult, i, len);
    b.cond_br(in_range, body_block, end_block);

    b.start_block_labeled(body_block, "loop.body");
    let i = b.load(index);
    let src = b.get_byte_ptr(input, i);
    let byte = b.load_byte(src);
    let wide = b.sext(byte, IrType::I32);
    let converted = b.call(c_func, vec![wide]);
    let narrow = b.trunc(converted, IrType::I8);
    let dst = b.get_byte_ptr(result, i);
    b.store(dst, narrow);
    let one = b.const_int(1);
    let next = b.add(i, one);
    b.store(index, next);
    b.br(cond_block);

    b.start_block_labeled(end_block, "loop.end");
    let tail = b.get_byte_ptr(result, len);
    let nul = b.const_int(0);
    let nul_byte = b.trunc(nul, IrType::I8);
    b.store(tail, nul_byte);
    b.ret(Some(result));
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

fn define_files(b: &mut IrBuilder) {
    // file_read(path) -> whole file as a string, empty string on failure
    let params = b.start_function("file_read", vec![IrType::Ptr], IrType::Ptr);
    let path = params[0];
    let mode_name = b.add_string_constant("rb");
    let mode = b.global_string_ptr(&mode_name);
    let file = b.call("fopen", vec![path, mode]);

    let null = b.const_null();
    let failed = b.icmp(CmpOp::Eq, file, null);
    let opened_block = b.create_block();
    let fail_block = b.create_block();
    b.cond_br(failed, fail_block, opened_block);

    b.start_block_labeled(fail_block, "file.fail");
    let empty_name = b.add_string_constant("");
    let empty = b.global_string_ptr(&empty_name);
    b.ret(Some(empty));

    b.start_block_labeled(opened_block, "file.opened");
    let zero64 = b.const_int(0);
    let seek_end = b.const_i32(2);
    let seek_set = b.const_i32(0);
    b.call_void("fseek", vec![file, zero64, seek_end]);
    let file_size = b.call("ftell", vec![file]);
    let zero64 = b.const_int(0);
    b.call_void("fseek", vec![file, zero64, seek_set]);

    let one = b.const_int(1);
    let buffer_size = b.add(file_size, one);
    let buffer = b.call("malloc", vec![buffer_size]);
    let one = b.const_int(1);
    b.call_void("fread", vec![buffer, one, file_size, file]);

    let tail = b.get_byte_ptr(buffer, file_size);
    let nul = b.const_int(0);
    let nul_byte = b.trunc(nul, IrType::I8);
    b.store(tail, nul_byte);
    b.call_void("fclose", vec![file]);
    b.ret(Some(buffer));

    // file_write(path, content) -> bool
    let params = b.start_function("file_write", vec![IrType::Ptr, IrType::Ptr], IrType::Bool);
    let (path, content) = (params[0], params[1]);
    let mode_name = b.add_string_constant("wb");
    let mode = b.global_string_ptr(&mode_name);
    let file = b.call("fopen", vec![path, mode]);

    let null = b.const_null();
    let failed = b.icmp(CmpOp::Eq, file, null);
    let opened_block = b.create_block();
    let fail_block = b.create_block();
    b.cond_br(failed, fail_block, opened_block);

    b.start_block_labeled(fail_block, "write.fail");
    let no = b.const_bool(false);
    b.ret(Some(no));

    b.start_block_labeled(opened_block, "write.opened");
    let content_len = b.call("strlen", vec![content]);
    let one = b.const_int(1);
    b.call_void("fwrite", vec![content, one, content_len, file]);
    b.call_void("fclose", vec![file]);
    let yes = b.const_bool(true);
    b.ret(Some(yes));

    // file_exists(path): access(path, F_OK) == 0
    let params = b.start_function("file_exists", vec![IrType::Ptr], IrType::Bool);
    let f_ok = b.const_i32(0);
    let status = b.call("access", vec![params[0], f_ok]);
    let zero = b.const_i32(0);
    let exists = b.icmp(CmpOp::Eq, status, zero);
    b.ret(Some(exists));

    // file_delete(path): remove(path) == 0
    let params = b.start_function("file_delete", vec![IrType::Ptr], IrType::Bool);
    let status = b.call("remove", vec![params[0]]);
    let zero = b.const_i32(0);
    let deleted = b.icmp(CmpOp::Eq, status, zero);
    b.ret(Some(deleted));
}
