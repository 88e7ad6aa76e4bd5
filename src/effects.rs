/// Side-effect inference over the call graph.
///
/// A function has side effects if its body assigns to any variable, if it
/// calls an impure built-in, or if it calls another function that has side
/// effects. The last clause makes the property transitive, so it is computed
/// to a fixed point over the whole program before the analyzer enforces the
/// purity discipline. Declaration order in the source file does not matter.
use std::collections::{HashMap, HashSet};

use crate::ast::{Expr, ExprKind, FunctionDecl, Program, Stmt, StmtKind};
use crate::builtins;

/// Final `has_side_effects` verdict per user-defined function.
pub fn compute_side_effects(program: &Program) -> HashMap<String, bool> {
    let graph = build_call_graph(program);

    let mut effects: HashMap<String, bool> = HashMap::new();
    for func in &program.functions {
        effects.insert(func.name.clone(), has_direct_effects(func));
    }

    // Propagate caller-inherits-callee until nothing changes. Program call
    // graphs are tiny; the simple iteration converges in at most |functions|
    // rounds.
    let mut changed = true;
    while changed {
        changed = false;
        for func in &program.functions {
            if effects.get(&func.name).copied().unwrap_or(false) {
                continue;
            }
            let Some(callees) = graph.get(&func.name) else {
                continue;
            };
            let inherits = callees
                .iter()
                .any(|callee| effects.get(callee).copied().unwrap_or(false));
            if inherits {
                effects.insert(func.name.clone(), true);
                changed = true;
            }
        }
    }

    effects
}

fn has_direct_effects(func: &FunctionDecl) -> bool {
    func.body.iter().any(stmt_has_direct_effects)
}

fn stmt_has_direct_effects(stmt: &Stmt) -> bool {
    match &stmt.kind {
        StmtKind::Assign { .. } => true,
        StmtKind::Let(decl) => decl
            .init
            .as_ref()
            .map(expr_has_direct_effects)
            .unwrap_or(false),
        StmtKind::Return(value) => value
            .as_ref()
            .map(expr_has_direct_effects)
            .unwrap_or(false),
        StmtKind::If {
            condition,
            then_body,
            else_body,
        } => {
            expr_has_direct_effects(condition)
                || then_body.iter().any(stmt_has_direct_effects)
                || else_body.iter().any(stmt_has_direct_effects)
        }
        StmtKind::While { condition, body } => {
            expr_has_direct_effects(condition) || body.iter().any(stmt_has_direct_effects)
        }
        StmtKind::Expr(expr) => expr_has_direct_effects(expr),
    }
}

fn expr_has_direct_effects(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Call { name, args } => {
            let impure_builtin = builtins::lookup(name).map(|b| !b.is_pure).unwrap_or(false);
            impure_builtin || args.iter().any(expr_has_direct_effects)
        }
        ExprKind::Binary { left, right, .. } => {
            expr_has_direct_effects(left) || expr_has_direct_effects(right)
        }
        ExprKind::Unary { operand, .. } => expr_has_direct_effects(operand),
        ExprKind::IntLiteral(_)
        | ExprKind::FloatLiteral(_)
        | ExprKind::StrLiteral(_)
        | ExprKind::BoolLiteral(_)
        | ExprKind::Ident(_) => false,
    }
}

// ---------------------------------------------------------------------------
// Call graph construction
// ---------------------------------------------------------------------------

fn build_call_graph(program: &Program) -> HashMap<String, HashSet<String>> {
    let mut graph = HashMap::new();
    for func in &program.functions {
        let mut callees = HashSet::new();
        for stmt in &func.body {
            collect_callees_stmt(stmt, &mut callees);
        }
        graph.insert(func.name.clone(), callees);
    }
    graph
}

fn collect_callees_stmt(stmt: &Stmt, callees: &mut HashSet<String>) {
    match &stmt.kind {
        StmtKind::Let(decl) => {
            if let Some(init) = &decl.init {
                collect_callees_expr(init, callees);
            }
        }
        StmtKind::Assign { value, .. } => collect_callees_expr(value, callees),
        StmtKind::Return(Some(value)) => collect_callees_expr(value, callees),
        StmtKind::Return(None) => {}
        StmtKind::If {
            condition,
            then_body,
            else_body,
        } => {
            collect_callees_expr(condition, callees);
            for s in then_body {
                collect_callees_stmt(s, callees);
            }
            for s in else_body {
                collect_callees_stmt(s, callees);
            }
        }
        StmtKind::While { condition, body } => {
            collect_callees_expr(condition, callees);
            for s in body {
                collect_callees_stmt(s, callees);
            }
        }
        StmtKind::Expr(expr) => collect_callees_expr(expr, callees),
    }
}

fn collect_callees_expr(expr: &Expr, callees: &mut HashSet<String>) {
    match &expr.kind {
        ExprKind::Call { name, args } => {
            callees.insert(name.clone());
            for arg in args {
                collect_callees_expr(arg, callees);
            }
        }
        ExprKind::Binary { left, right, .. } => {
            collect_callees_expr(left, callees);
            collect_callees_expr(right, callees);
        }
        ExprKind::Unary { operand, .. } => collect_callees_expr(operand, callees),
        ExprKind::IntLiteral(_)
        | ExprKind::FloatLiteral(_)
        | ExprKind::StrLiteral(_)
        | ExprKind::BoolLiteral(_)
        | ExprKind::Ident(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn parse(src: &str) -> Program {
        let tokens = Lexer::new(src).tokenize();
        let (program, errors) = Parser::new(tokens).parse();
        assert!(errors.is_empty(), "parse failed: {:?}", errors);
        program
    }

    #[test]
    fn assignment_is_a_direct_effect() {
        let program = parse(
            "fn bump() -> void:\n    let mut x: i32 = 0\n    x = 1\n",
        );
        let effects = compute_side_effects(&program);
        assert_eq!(effects.get("bump"), Some(&true));
    }

    #[test]
    fn impure_builtin_call_is_a_direct_effect() {
        let program = parse("fn log() -> void:\n    print_i32(1)\n");
        let effects = compute_side_effects(&program);
        assert_eq!(effects.get("log"), Some(&true));
    }

    #[test]
    fn pure_builtin_calls_carry_no_effect() {
        let program = parse("fn root(x: f64) -> f64:\n    return sqrt(x)\n");
        let effects = compute_side_effects(&program);
        assert_eq!(effects.get("root"), Some(&false));
    }

    #[test]
    fn effects_propagate_through_forward_calls() {
        // `outer` calls `inner`, which is declared later and is impure.
        // The fixed point catches it regardless of declaration order.
        let program = parse(
            "fn outer() -> void:\n    inner()\n\nfn inner() -> void:\n    print_i32(1)\n",
        );
        let effects = compute_side_effects(&program);
        assert_eq!(effects.get("outer"), Some(&true));
        assert_eq!(effects.get("inner"), Some(&true));
    }

    #[test]
    fn effects_propagate_across_chains() {
        let program = parse(
            "fn a() -> void:\n    b()\n\nfn b() -> void:\n    c()\n\nfn c() -> void:\n    print_i32(1)\n",
        );
        let effects = compute_side_effects(&program);
        assert_eq!(effects.get("a"), Some(&true));
        assert_eq!(effects.get("b"), Some(&true));
    }

    #[test]
    fn mutually_recursive_pure_functions_stay_pure() {
        let program = parse(
            "fn even(n: i32) -> bool:\n    if n == 0:\n        return true\n    return odd(n - 1)\n\nfn odd(n: i32) -> bool:\n    if n == 0:\n        return false\n    return even(n - 1)\n",
        );
        let effects = compute_side_effects(&program);
        assert_eq!(effects.get("even"), Some(&false));
        assert_eq!(effects.get("odd"), Some(&false));
    }
}
