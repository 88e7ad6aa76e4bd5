/// Spec tests for the semantic analyzer: scoping, mutability, type
/// compatibility, and the purity discipline.
use hashc::analyzer::SemanticAnalyzer;
use hashc::diagnostics::Diagnostic;
use hashc::lexer::Lexer;
use hashc::parser::Parser;
use hashc::types::Type;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn analyze(src: &str) -> SemanticAnalyzer {
    let tokens = Lexer::new(src).tokenize();
    let (mut program, parse_errors) = Parser::new(tokens).parse();
    assert!(
        parse_errors.is_empty(),
        "parse failed: {:?}",
        parse_errors
    );
    let mut analyzer = SemanticAnalyzer::new();
    analyzer.analyze(&mut program);
    analyzer
}

fn errors(src: &str) -> Vec<String> {
    analyze(src)
        .errors()
        .iter()
        .map(|d| d.message.clone())
        .collect()
}

fn warnings(src: &str) -> Vec<String> {
    analyze(src)
        .warnings()
        .iter()
        .map(|d| d.message.clone())
        .collect()
}

fn assert_clean(src: &str) {
    let errs = errors(src);
    assert!(errs.is_empty(), "unexpected errors: {:?}", errs);
}

fn assert_error(src: &str, fragment: &str) -> Vec<Diagnostic> {
    let analyzer = analyze(src);
    let errs: Vec<String> = analyzer.errors().iter().map(|d| d.message.clone()).collect();
    assert!(
        errs.iter().any(|e| e.contains(fragment)),
        "expected error containing {:?}, got: {:?}",
        fragment,
        errs
    );
    analyzer.errors().to_vec()
}

// ---------------------------------------------------------------------------
// Declarations and scoping
// ---------------------------------------------------------------------------

#[test]
fn clean_program_passes() {
    assert_clean("fn main() -> i32:\n    print_str(\"hi\")\n    return 0\n");
}

#[test]
fn redeclaration_in_same_scope_is_an_error() {
    assert_error(
        "fn f():\n    let x: i32 = 1\n    let x: i32 = 2\n",
        "Variable 'x' already declared in this scope",
    );
}

#[test]
fn duplicate_function_is_an_error() {
    assert_error(
        "fn f() -> i32:\n    return 1\n\nfn f() -> i32:\n    return 2\n",
        "Function 'f' already declared",
    );
}

#[test]
fn builtins_cannot_be_shadowed() {
    assert_error(
        "fn sqrt(x: f64) -> f64:\n    return x\n",
        "Function 'sqrt' already declared",
    );
}

#[test]
fn undefined_variable_gets_default_type_and_analysis_continues() {
    let analyzer = analyze("fn f() -> i32:\n    return ghost\n");
    let errs: Vec<String> = analyzer.errors().iter().map(|d| d.message.clone()).collect();
    assert!(errs.iter().any(|e| e.contains("Undefined variable 'ghost'")));
    // Defaulting to i32 means no cascading return-type error
    assert_eq!(errs.len(), 1, "got: {:?}", errs);
}

#[test]
fn undefined_function_is_an_error() {
    assert_error(
        "fn f():\n    missing()\n",
        "Undefined function 'missing'",
    );
}

#[test]
fn globals_are_visible_in_function_bodies() {
    assert_clean("let base: i32 = 10\nfn f() -> i32:\n    return base\n");
}

// ---------------------------------------------------------------------------
// Mutability
// ---------------------------------------------------------------------------

#[test]
fn assignment_to_immutable_binding_is_an_error() {
    let diags = assert_error(
        "fn main() -> i32:\n    let x: i32 = 1\n    x = 2\n    return x\n",
        "Cannot assign to immutable variable 'x'",
    );
    let diag = diags
        .iter()
        .find(|d| d.message.contains("Cannot assign"))
        .expect("diagnostic present");
    assert_eq!(diag.line, 3);
    assert!(
        diag.suggestion
            .as_deref()
            .map(|s| s.contains("let mut"))
            .unwrap_or(false),
        "suggestion should reference let mut: {:?}",
        diag.suggestion
    );
}

#[test]
fn assignment_to_mut_binding_succeeds() {
    assert_clean("fn main() -> i32:\n    let mut x: i32 = 1\n    x = 2\n    return x\n");
}

#[test]
fn parameters_are_assignable() {
    assert_clean("fn f(n: i32) -> i32:\n    n = n + 1\n    return n\n");
}

#[test]
fn assignment_to_undeclared_variable_is_an_error() {
    assert_error("fn f():\n    y = 1\n", "Undefined variable 'y'");
}

// ---------------------------------------------------------------------------
// Type checking
// ---------------------------------------------------------------------------

#[test]
fn initializer_type_must_match() {
    assert_error(
        "fn f():\n    let x: i32 = 1.5\n",
        "Type mismatch in variable initialization: expected i32, got f64",
    );
}

#[test]
fn assignment_type_must_match() {
    assert_error(
        "fn f():\n    let mut x: i32 = 1\n    x = 2.0\n",
        "Type mismatch in assignment to 'x': expected i32, got f64",
    );
}

#[test]
fn return_type_must_match() {
    assert_error(
        "fn f() -> i32:\n    return 1.5\n",
        "Return type mismatch: expected i32, got f64",
    );
}

#[test]
fn bare_return_requires_void() {
    assert_error(
        "fn f() -> i32:\n    return\n",
        "Function expects return value of type i32",
    );
}

#[test]
fn bare_return_in_void_function_is_fine() {
    assert_clean("fn f():\n    return\n");
}

#[test]
fn mixed_arithmetic_promotes_to_f64() {
    assert_clean("fn f() -> f64:\n    return 1 + 2.0\n");
}

#[test]
fn mixed_integer_arithmetic_widens_to_i64() {
    // Widening happens in the binary expression; there is no implicit
    // conversion of an i32 literal into an i64 binding.
    assert_clean("fn f(a: i32, b: i64) -> i64:\n    return a + b\n");
    assert_error(
        "fn g():\n    let b: i64 = 2\n",
        "Type mismatch in variable initialization: expected i64, got i32",
    );
}

#[test]
fn comparison_yields_bool() {
    assert_clean("fn f(a: i32, b: i32) -> bool:\n    return a < b\n");
}

#[test]
fn logical_operators_require_bool() {
    assert_error(
        "fn f(a: i32, b: i32) -> bool:\n    return a && b\n",
        "Logical operators require boolean operands",
    );
}

#[test]
fn logical_not_requires_bool() {
    assert_error(
        "fn f(a: i32) -> bool:\n    return !a\n",
        "Logical NOT requires boolean operand",
    );
}

#[test]
fn bitwise_not_preserves_operand_type() {
    assert_clean("fn f(a: i32) -> i32:\n    return ~a\n");
}

#[test]
fn call_arity_must_match_exactly() {
    let diags = assert_error(
        "fn f() -> i32:\n    return min(1)\n",
        "Function 'min' expects 2 arguments, got 1",
    );
    assert!(diags
        .iter()
        .any(|d| d.suggestion.as_deref() == Some("Provide exactly 2 arguments when calling 'min'.")));
}

#[test]
fn call_argument_types_must_match_exactly() {
    // No implicit i32 -> f64 conversion at call sites
    let diags = assert_error(
        "fn main() -> i32:\n    let y: f64 = sqrt(2)\n    return 0\n",
        "Argument 1 type mismatch in call to 'sqrt': expected f64, got i32",
    );
    let diag = diags
        .iter()
        .find(|d| d.message.contains("sqrt"))
        .expect("diagnostic present");
    assert!(
        diag.suggestion
            .as_deref()
            .map(|s| s.contains("2.0") && s.contains("float()"))
            .unwrap_or(false),
        "suggestion should propose 2.0 or float(): {:?}",
        diag.suggestion
    );
}

#[test]
fn conversion_builtins_have_tailored_suggestions() {
    let diags = assert_error(
        "fn f() -> i32:\n    return int(2)\n",
        "Argument 1 type mismatch in call to 'int'",
    );
    assert!(diags.iter().any(|d| d
        .suggestion
        .as_deref()
        .map(|s| s.contains("Type conversion function 'int()'"))
        .unwrap_or(false)));
}

#[test]
fn user_function_calls_are_checked() {
    assert_clean(
        "fn double(x: i32) -> i32:\n    return x * 2\n\nfn main() -> i32:\n    return double(21)\n",
    );
    assert_error(
        "fn double(x: i32) -> i32:\n    return x * 2\n\nfn main() -> i32:\n    return double(2.0)\n",
        "Argument 1 type mismatch in call to 'double': expected i32, got f64",
    );
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

#[test]
fn non_bool_if_condition_warns_but_does_not_fail() {
    let analyzer = analyze("fn f(n: i32):\n    if n:\n        print_i32(n)\n");
    assert!(analyzer.errors().is_empty());
    assert!(analyzer
        .warnings()
        .iter()
        .any(|w| w.message == "If condition should be of type bool"));
}

#[test]
fn non_bool_while_condition_warns() {
    let warns = warnings("fn f(n: i32):\n    while n:\n        print_i32(n)\n");
    assert!(warns.iter().any(|w| w == "While condition should be of type bool"));
}

// ---------------------------------------------------------------------------
// Purity discipline
// ---------------------------------------------------------------------------

#[test]
fn pure_function_calling_impure_builtin_is_an_error() {
    let diags = assert_error(
        "pure fn f() -> i32:\n    print_i32(1)\n    return 0\n",
        "Pure function 'f' cannot call function 'print_i32' which has side effects",
    );
    assert!(diags
        .iter()
        .any(|d| d.message.contains("Pure function 'f' has side effects")));
}

#[test]
fn pure_function_calling_pure_builtins_is_fine() {
    assert_clean("pure fn root(x: f64) -> f64:\n    return sqrt(x) + floor(x)\n");
}

#[test]
fn pure_function_with_assignment_has_side_effects() {
    assert_error(
        "pure fn f() -> i32:\n    let mut x: i32 = 0\n    x = 1\n    return x\n",
        "Pure function 'f' has side effects",
    );
}

#[test]
fn purity_violations_are_caught_across_forward_calls() {
    // `f` is declared before `g`; the side effect is only visible
    // transitively through the call graph fixed point.
    assert_error(
        "pure fn f() -> i32:\n    return g()\n\nfn g() -> i32:\n    print_i32(1)\n    return 0\n",
        "Pure function 'f' cannot call function 'g' which has side effects",
    );
}

#[test]
fn purity_violations_are_caught_through_chains() {
    assert_error(
        "pure fn a() -> i32:\n    return b()\n\nfn b() -> i32:\n    return c()\n\nfn c() -> i32:\n    print_i32(1)\n    return 0\n",
        "Pure function 'a' cannot call function 'b' which has side effects",
    );
}

#[test]
fn pure_function_calling_pure_user_function_is_fine() {
    assert_clean(
        "pure fn double(x: i32) -> i32:\n    return x * 2\n\npure fn quad(x: i32) -> i32:\n    return double(double(x))\n",
    );
}

// ---------------------------------------------------------------------------
// pure_local access control
// ---------------------------------------------------------------------------

#[test]
fn pure_local_read_and_write_from_non_pure_function_are_errors() {
    let analyzer = analyze(
        "let pure_local counter: i32 = 0\nfn bump() -> void:\n    counter = counter + 1\n",
    );
    let errs: Vec<String> = analyzer.errors().iter().map(|d| d.message.clone()).collect();
    assert!(
        errs.iter()
            .any(|e| e.contains("Cannot modify pure_local variable 'counter' in non-pure function")),
        "missing write error: {:?}",
        errs
    );
    assert!(
        errs.iter()
            .any(|e| e.contains("Cannot access pure_local variable 'counter' in non-pure function")),
        "missing read error: {:?}",
        errs
    );
}

#[test]
fn pure_local_read_from_pure_function_succeeds() {
    assert_clean(
        "let pure_local seed: i32 = 7\npure fn peek() -> i32:\n    return seed\n",
    );
}

// ---------------------------------------------------------------------------
// Globals
// ---------------------------------------------------------------------------

#[test]
fn global_with_constant_initializer_is_fine() {
    assert_clean("let limit: i32 = 100\nlet offset: i32 = -1\n");
}

#[test]
fn global_with_non_constant_initializer_is_rejected() {
    assert_error(
        "let start: i64 = hash_time()\n",
        "Global initializer for 'start' must be a constant expression",
    );
}

// ---------------------------------------------------------------------------
// Structured diagnostics
// ---------------------------------------------------------------------------

#[test]
fn diagnostics_carry_positions_and_legacy_strings() {
    let analyzer = analyze("fn f():\n    ghost()\n");
    let diag = &analyzer.errors()[0];
    assert_eq!(diag.line, 2);
    assert_eq!(diag.column, 5);
    assert_eq!(
        diag.legacy(),
        "Error at line 2, column 5: Undefined function 'ghost'"
    );
}

#[test]
fn function_info_reflects_inferred_side_effects() {
    let analyzer = analyze(
        "fn noisy():\n    print_i32(1)\n\nfn quiet(x: i32) -> i32:\n    return x\n",
    );
    assert!(analyzer.function_info("noisy").map(|i| i.has_side_effects).unwrap_or(false));
    assert!(!analyzer.function_info("quiet").map(|i| i.has_side_effects).unwrap_or(true));
    assert_eq!(
        analyzer.function_info("quiet").map(|i| i.return_type.clone()),
        Some(Type::I32)
    );
}
