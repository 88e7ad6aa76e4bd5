/// Spec tests for the Hash parser.
use hashc::ast::*;
use hashc::lexer::Lexer;
use hashc::parser::{ParseError, Parser};
use hashc::types::Type;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse(src: &str) -> (Program, Vec<ParseError>) {
    let tokens = Lexer::new(src).tokenize();
    Parser::new(tokens).parse()
}

fn parse_ok(src: &str) -> Program {
    let (program, errors) = parse(src);
    assert!(errors.is_empty(), "unexpected parse errors: {:?}", errors);
    program
}

fn parse_errors(src: &str) -> Vec<String> {
    let (_, errors) = parse(src);
    errors.iter().map(|e| e.to_string()).collect()
}

fn parse_expr(src: &str) -> Expr {
    let program = parse_ok(&format!("fn probe() -> i32:\n    return {}\n", src));
    let func = &program.functions[0];
    match &func.body[0].kind {
        StmtKind::Return(Some(expr)) => expr.clone(),
        other => panic!("expected return statement, got {:?}", other),
    }
}

fn binary_parts(expr: &Expr) -> (BinOp, &Expr, &Expr) {
    match &expr.kind {
        ExprKind::Binary { op, left, right } => (*op, left, right),
        other => panic!("expected binary expression, got {:?}", other),
    }
}

// ---------------------------------------------------------------------------
// Top level
// ---------------------------------------------------------------------------

#[test]
fn well_formed_input_produces_a_nonempty_program() {
    let program = parse_ok("fn main() -> i32:\n    return 0\n");
    assert_eq!(program.functions.len(), 1);
    assert!(program.globals.is_empty());
}

#[test]
fn function_signature() {
    let program = parse_ok("fn add(a: i32, b: i32) -> i32:\n    return a + b\n");
    let func = &program.functions[0];
    assert_eq!(func.name, "add");
    assert_eq!(func.params.len(), 2);
    assert_eq!(func.params[0].name, "a");
    assert_eq!(func.params[0].ty, Type::I32);
    assert_eq!(func.return_type, Type::I32);
    assert!(!func.is_pure);
}

#[test]
fn return_type_defaults_to_void() {
    let program = parse_ok("fn side():\n    print_i32(1)\n");
    assert_eq!(program.functions[0].return_type, Type::Void);
}

#[test]
fn pure_marker() {
    let program = parse_ok("pure fn one() -> i32:\n    return 1\n");
    assert!(program.functions[0].is_pure);
}

#[test]
fn global_declarations() {
    let program = parse_ok("let mut counter: i32 = 0\nlet pure_local seed: i64 = 42\nlet bare: f64\n");
    assert_eq!(program.globals.len(), 3);
    assert!(program.globals[0].is_mutable);
    assert!(program.globals[1].is_pure_local);
    assert!(program.globals[2].init.is_none());
}

#[test]
fn functions_and_globals_interleave() {
    let program = parse_ok("let a: i32 = 1\nfn f() -> i32:\n    return a\nlet b: i32 = 2\n");
    assert_eq!(program.functions.len(), 1);
    assert_eq!(program.globals.len(), 2);
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

#[test]
fn let_with_modifiers() {
    let program = parse_ok(
        "fn f():\n    let x: i32 = 1\n    let mut y: i32 = 2\n    let pure_local z: i32 = 3\n",
    );
    let body = &program.functions[0].body;
    match (&body[0].kind, &body[1].kind, &body[2].kind) {
        (StmtKind::Let(a), StmtKind::Let(b), StmtKind::Let(c)) => {
            assert!(!a.is_mutable && !a.is_pure_local);
            assert!(b.is_mutable);
            assert!(c.is_pure_local);
        }
        other => panic!("expected three lets, got {:?}", other),
    }
}

#[test]
fn assignment_is_recognized_by_lookahead() {
    let program = parse_ok("fn f():\n    x = 1\n    x\n");
    let body = &program.functions[0].body;
    assert!(matches!(&body[0].kind, StmtKind::Assign { name, .. } if name == "x"));
    assert!(matches!(&body[1].kind, StmtKind::Expr(_)));
}

#[test]
fn bare_return() {
    let program = parse_ok("fn f():\n    return\n");
    assert!(matches!(
        &program.functions[0].body[0].kind,
        StmtKind::Return(None)
    ));
}

#[test]
fn if_without_else() {
    let program = parse_ok("fn f(c: bool):\n    if c:\n        print_i32(1)\n");
    match &program.functions[0].body[0].kind {
        StmtKind::If {
            then_body,
            else_body,
            ..
        } => {
            assert_eq!(then_body.len(), 1);
            assert!(else_body.is_empty());
        }
        other => panic!("expected if, got {:?}", other),
    }
}

#[test]
fn if_with_else() {
    let program = parse_ok(
        "fn max(a: i32, b: i32) -> i32:\n    if a > b:\n        return a\n    else:\n        return b\n",
    );
    match &program.functions[0].body[0].kind {
        StmtKind::If {
            then_body,
            else_body,
            ..
        } => {
            assert_eq!(then_body.len(), 1);
            assert_eq!(else_body.len(), 1);
        }
        other => panic!("expected if/else, got {:?}", other),
    }
}

#[test]
fn while_loop() {
    let program = parse_ok(
        "fn count() -> i32:\n    let mut i: i32 = 0\n    while i < 10:\n        i = i + 1\n    return i\n",
    );
    assert!(matches!(
        &program.functions[0].body[1].kind,
        StmtKind::While { .. }
    ));
}

#[test]
fn single_statement_block_on_the_same_line() {
    let program = parse_ok("fn f(c: bool) -> i32:\n    if c: return 1\n    return 0\n");
    match &program.functions[0].body[0].kind {
        StmtKind::If { then_body, .. } => assert_eq!(then_body.len(), 1),
        other => panic!("expected if, got {:?}", other),
    }
}

#[test]
fn nested_blocks() {
    let program = parse_ok(
        "fn f(a: bool, b: bool):\n    if a:\n        if b:\n            print_i32(1)\n        print_i32(2)\n",
    );
    match &program.functions[0].body[0].kind {
        StmtKind::If { then_body, .. } => {
            assert_eq!(then_body.len(), 2);
            assert!(matches!(&then_body[0].kind, StmtKind::If { .. }));
        }
        other => panic!("expected if, got {:?}", other),
    }
}

// ---------------------------------------------------------------------------
// Expressions — literal typing
// ---------------------------------------------------------------------------

#[test]
fn literal_types_assigned_at_parse_time() {
    assert_eq!(parse_expr("42").ty, Some(Type::I32));
    assert_eq!(parse_expr("3.5").ty, Some(Type::F64));
    assert_eq!(parse_expr("\"s\"").ty, Some(Type::Str));
    assert_eq!(parse_expr("true").ty, Some(Type::Bool));
}

#[test]
fn int_literal_value_is_i64() {
    let expr = parse_expr("4000000000000");
    assert!(matches!(expr.kind, ExprKind::IntLiteral(4_000_000_000_000)));
}

// ---------------------------------------------------------------------------
// Expressions — precedence and associativity
// ---------------------------------------------------------------------------

#[test]
fn subtraction_is_left_associative() {
    // a - b - c parses as (a - b) - c
    let expr = parse_expr("a - b - c");
    let (op, left, right) = binary_parts(&expr);
    assert_eq!(op, BinOp::Sub);
    assert!(matches!(right.kind, ExprKind::Ident(ref n) if n == "c"));
    let (inner_op, _, _) = binary_parts(left);
    assert_eq!(inner_op, BinOp::Sub);
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    // 1 + 2 * 3 parses as 1 + (2 * 3)
    let expr = parse_expr("1 + 2 * 3");
    let (op, _, right) = binary_parts(&expr);
    assert_eq!(op, BinOp::Add);
    let (inner_op, _, _) = binary_parts(right);
    assert_eq!(inner_op, BinOp::Mul);
}

#[test]
fn and_binds_tighter_than_or() {
    // a || b && c parses as a || (b && c)
    let expr = parse_expr("a || b && c");
    let (op, _, right) = binary_parts(&expr);
    assert_eq!(op, BinOp::Or);
    let (inner_op, _, _) = binary_parts(right);
    assert_eq!(inner_op, BinOp::And);
}

#[test]
fn comparison_binds_tighter_than_equality() {
    // a == b < c parses as a == (b < c)
    let expr = parse_expr("a == b < c");
    let (op, _, right) = binary_parts(&expr);
    assert_eq!(op, BinOp::Eq);
    let (inner_op, _, _) = binary_parts(right);
    assert_eq!(inner_op, BinOp::Lt);
}

#[test]
fn shift_binds_tighter_than_comparison() {
    // a < b << c parses as a < (b << c)
    let expr = parse_expr("a < b << c");
    let (op, _, right) = binary_parts(&expr);
    assert_eq!(op, BinOp::Lt);
    let (inner_op, _, _) = binary_parts(right);
    assert_eq!(inner_op, BinOp::Shl);
}

#[test]
fn bitwise_levels_are_ordered_or_xor_and() {
    // a | b ^ c & d parses as a | (b ^ (c & d))
    let expr = parse_expr("a | b ^ c & d");
    let (op, _, right) = binary_parts(&expr);
    assert_eq!(op, BinOp::BitOr);
    let (xor_op, _, xor_right) = binary_parts(right);
    assert_eq!(xor_op, BinOp::BitXor);
    let (and_op, _, _) = binary_parts(xor_right);
    assert_eq!(and_op, BinOp::BitAnd);
}

#[test]
fn unary_not_nests() {
    // !!x parses as !(!x)
    let expr = parse_expr("!!x");
    match &expr.kind {
        ExprKind::Unary {
            op: UnOp::Not,
            operand,
        } => {
            assert!(matches!(
                operand.kind,
                ExprKind::Unary { op: UnOp::Not, .. }
            ));
        }
        other => panic!("expected nested not, got {:?}", other),
    }
}

#[test]
fn unary_minus_binds_tighter_than_multiplication() {
    // -a * b parses as (-a) * b
    let expr = parse_expr("-a * b");
    let (op, left, _) = binary_parts(&expr);
    assert_eq!(op, BinOp::Mul);
    assert!(matches!(
        left.kind,
        ExprKind::Unary { op: UnOp::Neg, .. }
    ));
}

#[test]
fn parentheses_override_precedence() {
    // (1 + 2) * 3 keeps the addition on the left
    let expr = parse_expr("(1 + 2) * 3");
    let (op, left, _) = binary_parts(&expr);
    assert_eq!(op, BinOp::Mul);
    let (inner_op, _, _) = binary_parts(left);
    assert_eq!(inner_op, BinOp::Add);
}

#[test]
fn call_with_arguments() {
    let expr = parse_expr("min(1, 2 + 3)");
    match &expr.kind {
        ExprKind::Call { name, args } => {
            assert_eq!(name, "min");
            assert_eq!(args.len(), 2);
        }
        other => panic!("expected call, got {:?}", other),
    }
}

#[test]
fn call_without_arguments() {
    let expr = parse_expr("read_i32()");
    assert!(matches!(&expr.kind, ExprKind::Call { args, .. } if args.is_empty()));
}

// ---------------------------------------------------------------------------
// Errors and recovery
// ---------------------------------------------------------------------------

#[test]
fn stray_top_level_token_is_an_error() {
    let errors = parse_errors("42\n");
    assert!(
        errors
            .iter()
            .any(|e| e.contains("Expected function or global variable declaration")),
        "got: {:?}",
        errors
    );
}

#[test]
fn reserved_keyword_gets_a_dedicated_error() {
    let errors = parse_errors("match\n");
    assert!(
        errors
            .iter()
            .any(|e| e.contains("'match' is reserved but not yet supported")),
        "got: {:?}",
        errors
    );
}

#[test]
fn reserved_keyword_in_statement_position() {
    let errors = parse_errors("fn f():\n    for\n");
    assert!(
        errors
            .iter()
            .any(|e| e.contains("'for' is reserved but not yet supported")),
        "got: {:?}",
        errors
    );
}

#[test]
fn parser_recovers_and_keeps_later_functions() {
    let src = "fn broken(:\n    return 1\n\nfn ok() -> i32:\n    return 2\n";
    let (program, errors) = parse(src);
    assert!(!errors.is_empty());
    assert!(program.functions.iter().any(|f| f.name == "ok"));
}

#[test]
fn missing_colon_is_reported_with_position() {
    let (_, errors) = parse("fn f()\n    return 1\n");
    assert!(!errors.is_empty());
    let (line, _) = errors[0].position();
    assert_eq!(line, 1);
}

#[test]
fn invalid_token_is_a_parse_error() {
    let errors = parse_errors("fn f():\n    let x: i32 = @\n");
    assert!(
        errors.iter().any(|e| e.contains("Invalid token")),
        "got: {:?}",
        errors
    );
}

#[test]
fn error_strings_carry_line_and_column() {
    let errors = parse_errors("fn f():\n    let x: = 1\n");
    assert!(
        errors.iter().any(|e| e.contains("[2:")),
        "got: {:?}",
        errors
    );
}
