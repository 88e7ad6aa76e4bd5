/// Two-pass semantic analyzer.
///
/// Pass 1 collects function signatures (built-ins are pre-registered, so a
/// user function may not shadow one) and declares globals into the outermost
/// scope. Between the passes, `has_side_effects` is computed to a fixed
/// point over the call graph (see `effects`), so purity enforcement in pass
/// 2 is independent of declaration order. Pass 2 walks each body checking
/// scoping, mutability, type compatibility, and the purity discipline, and
/// annotates every expression with its type.
use std::collections::HashMap;

use crate::ast::{BinOp, Expr, ExprKind, FunctionDecl, Program, Stmt, StmtKind, UnOp, VarDecl};
use crate::builtins;
use crate::diagnostics::Diagnostic;
use crate::effects;
use crate::types::{common_type, Type};

#[derive(Debug, Clone)]
pub struct FunctionInfo {
    pub name: String,
    pub return_type: Type,
    pub param_types: Vec<Type>,
    pub is_pure: bool,
    pub has_side_effects: bool,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub ty: Type,
    pub is_mutable: bool,
    pub is_pure_local: bool,
    pub is_parameter: bool,
}

#[derive(Debug, Clone)]
struct CurrentFn {
    name: String,
    return_type: Type,
    is_pure: bool,
}

pub struct SemanticAnalyzer {
    functions: HashMap<String, FunctionInfo>,
    scopes: Vec<HashMap<String, Symbol>>,
    errors: Vec<Diagnostic>,
    warnings: Vec<Diagnostic>,
    current_fn: Option<CurrentFn>,
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        let mut analyzer = SemanticAnalyzer {
            functions: HashMap::new(),
            scopes: Vec::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            current_fn: None,
        };
        analyzer.register_builtins();
        analyzer
    }

    fn register_builtins(&mut self) {
        for builtin in builtins::BUILTINS {
            self.functions.insert(
                builtin.name.to_string(),
                FunctionInfo {
                    name: builtin.name.to_string(),
                    return_type: builtin.ret.clone(),
                    param_types: builtin.params.to_vec(),
                    is_pure: builtin.is_pure,
                    has_side_effects: !builtin.is_pure,
                },
            );
        }
    }

    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    pub fn legacy_errors(&self) -> Vec<String> {
        self.errors.iter().map(|d| d.legacy()).collect()
    }

    pub fn function_info(&self, name: &str) -> Option<&FunctionInfo> {
        self.functions.get(name)
    }

    fn error(&mut self, diag: Diagnostic) {
        self.errors.push(diag);
    }

    fn warning(&mut self, diag: Diagnostic) {
        self.warnings.push(diag);
    }

    // -----------------------------------------------------------------------
    // Entry point
    // -----------------------------------------------------------------------

    /// Analyze and annotate the program. Returns true when no errors were
    /// reported; warnings never fail the analysis.
    pub fn analyze(&mut self, program: &mut Program) -> bool {
        self.push_scope(); // global scope

        // Pass 1: collect signatures; built-ins cannot be shadowed
        for func in &program.functions {
            if self.functions.contains_key(&func.name) {
                self.error(Diagnostic::error(
                    format!("Function '{}' already declared", func.name),
                    func.line,
                    func.col,
                ));
                continue;
            }
            self.functions.insert(
                func.name.clone(),
                FunctionInfo {
                    name: func.name.clone(),
                    return_type: func.return_type.clone(),
                    param_types: func.params.iter().map(|p| p.ty.clone()).collect(),
                    is_pure: func.is_pure,
                    has_side_effects: false,
                },
            );
        }

        // Globals live in the outermost scope
        for global in &mut program.globals {
            self.check_global(global);
        }

        // Side effects to a fixed point before purity is enforced
        for (name, has_effects) in effects::compute_side_effects(program) {
            if let Some(info) = self.functions.get_mut(&name) {
                info.has_side_effects = has_effects;
            }
        }

        // Pass 2: check bodies
        for func in &mut program.functions {
            self.check_function(func);
        }

        self.pop_scope();
        self.errors.is_empty()
    }

    // -----------------------------------------------------------------------
    // Declarations
    // -----------------------------------------------------------------------

    fn check_global(&mut self, decl: &mut VarDecl) {
        if self.declared_in_current_scope(&decl.name) {
            self.error(Diagnostic::error(
                format!("Variable '{}' already declared in this scope", decl.name),
                decl.line,
                decl.col,
            ));
            return;
        }

        if let Some(init) = &mut decl.init {
            let init_ty = self.check_expr(init);

            if !is_constant_expr(init) {
                self.error(
                    Diagnostic::error(
                        format!(
                            "Global initializer for '{}' must be a constant expression",
                            decl.name
                        ),
                        decl.line,
                        decl.col,
                    )
                    .with_suggestion(
                        "Initialize the global with a literal value and assign the computed \
                         value inside a function",
                    ),
                );
            }

            if init_ty != decl.ty {
                self.init_type_mismatch(decl, &init_ty);
            }
        }

        self.declare(Symbol {
            name: decl.name.clone(),
            ty: decl.ty.clone(),
            is_mutable: decl.is_mutable,
            is_pure_local: decl.is_pure_local,
            is_parameter: false,
        });
    }

    fn check_local_decl(&mut self, decl: &mut VarDecl) {
        if self.declared_in_current_scope(&decl.name) {
            self.error(Diagnostic::error(
                format!("Variable '{}' already declared in this scope", decl.name),
                decl.line,
                decl.col,
            ));
            return;
        }

        if let Some(init) = &mut decl.init {
            let init_ty = self.check_expr(init);
            if init_ty != decl.ty {
                self.init_type_mismatch(decl, &init_ty);
            }
        }

        self.declare(Symbol {
            name: decl.name.clone(),
            ty: decl.ty.clone(),
            is_mutable: decl.is_mutable,
            is_pure_local: decl.is_pure_local,
            is_parameter: false,
        });
    }

    fn init_type_mismatch(&mut self, decl: &VarDecl, init_ty: &Type) {
        let expected = decl.ty.display();
        let got = init_ty.display();
        let suggestion = match (got.as_str(), expected.as_str()) {
            ("i32", "i64") => "Change the variable type to 'i32', or cast the value to i64".to_string(),
            ("i64", "i32") => {
                "Change the variable type to 'i64', or ensure the value fits in i32 range".to_string()
            }
            _ => format!(
                "Change the variable type to '{}' or provide a value of type '{}'",
                got, expected
            ),
        };
        self.error(
            Diagnostic::error(
                format!(
                    "Type mismatch in variable initialization: expected {}, got {}",
                    expected, got
                ),
                decl.line,
                decl.col,
            )
            .with_suggestion(suggestion),
        );
    }

    // -----------------------------------------------------------------------
    // Functions and statements
    // -----------------------------------------------------------------------

    fn check_function(&mut self, func: &mut FunctionDecl) {
        self.current_fn = Some(CurrentFn {
            name: func.name.clone(),
            return_type: func.return_type.clone(),
            is_pure: func.is_pure,
        });

        self.push_scope();
        for param in &func.params {
            self.declare(Symbol {
                name: param.name.clone(),
                ty: param.ty.clone(),
                is_mutable: false,
                is_pure_local: false,
                is_parameter: true,
            });
        }

        for stmt in &mut func.body {
            self.check_stmt(stmt);
        }

        let has_side_effects = self
            .functions
            .get(&func.name)
            .map(|info| info.has_side_effects)
            .unwrap_or(false);
        if func.is_pure && has_side_effects {
            self.error(Diagnostic::error(
                format!("Pure function '{}' has side effects", func.name),
                func.line,
                func.col,
            ));
        }

        self.pop_scope();
        self.current_fn = None;
    }

    fn check_stmt(&mut self, stmt: &mut Stmt) {
        let (line, col) = (stmt.line, stmt.col);
        match &mut stmt.kind {
            StmtKind::Let(decl) => self.check_local_decl(decl),
            StmtKind::Assign { name, value } => {
                let name = name.clone();
                self.check_assignment(&name, value, line, col);
            }
            StmtKind::Return(value) => {
                let current = self.current_fn.clone();
                let Some(current) = current else {
                    self.error(Diagnostic::error(
                        "Return statement outside of function",
                        line,
                        col,
                    ));
                    return;
                };
                match value {
                    Some(v) => {
                        let value_ty = self.check_expr(v);
                        if value_ty != current.return_type {
                            let expected = current.return_type.display();
                            let got = value_ty.display();
                            self.error(
                                Diagnostic::error(
                                    format!(
                                        "Return type mismatch: expected {}, got {}",
                                        expected, got
                                    ),
                                    line,
                                    col,
                                )
                                .with_suggestion(format!(
                                    "Change the return value to type '{}', or change the \
                                     function's return type to '{}'",
                                    expected, got
                                )),
                            );
                        }
                    }
                    None => {
                        if current.return_type != Type::Void {
                            self.error(
                                Diagnostic::error(
                                    format!(
                                        "Function expects return value of type {}",
                                        current.return_type
                                    ),
                                    line,
                                    col,
                                )
                                .with_suggestion(
                                    "Add a return value: 'return <value>', or change function \
                                     return type to 'void'",
                                ),
                            );
                        }
                    }
                }
            }
            StmtKind::If {
                condition,
                then_body,
                else_body,
            } => {
                let cond_ty = self.check_expr(condition);
                if cond_ty != Type::Bool {
                    let (cline, ccol) = (condition.line, condition.col);
                    self.warning(Diagnostic::warning(
                        "If condition should be of type bool",
                        cline,
                        ccol,
                    ));
                }
                for s in then_body {
                    self.check_stmt(s);
                }
                for s in else_body {
                    self.check_stmt(s);
                }
            }
            StmtKind::While { condition, body } => {
                let cond_ty = self.check_expr(condition);
                if cond_ty != Type::Bool {
                    let (cline, ccol) = (condition.line, condition.col);
                    self.warning(Diagnostic::warning(
                        "While condition should be of type bool",
                        cline,
                        ccol,
                    ));
                }
                for s in body {
                    self.check_stmt(s);
                }
            }
            StmtKind::Expr(expr) => {
                self.check_expr(expr);
            }
        }
    }

    fn check_assignment(&mut self, name: &str, value: &mut Expr, line: usize, col: usize) {
        let Some(symbol) = self.lookup(name).cloned() else {
            self.error(
                Diagnostic::error(format!("Undefined variable '{}'", name), line, col)
                    .with_suggestion(format!(
                        "Make sure '{}' is declared before use, or check for typos",
                        name
                    )),
            );
            return;
        };

        // Parameters stay assignable; the mutability rule covers `let` only
        if !symbol.is_mutable && !symbol.is_parameter {
            self.error(
                Diagnostic::error(
                    format!("Cannot assign to immutable variable '{}'", name),
                    line,
                    col,
                )
                .with_suggestion(format!(
                    "Declare the variable as mutable with 'let mut {}: <type>' instead of \
                     'let {}: <type>'",
                    name, name
                )),
            );
        }

        if symbol.is_pure_local && !self.in_pure_fn() {
            self.error(
                Diagnostic::error(
                    format!(
                        "Cannot modify pure_local variable '{}' in non-pure function",
                        name
                    ),
                    line,
                    col,
                )
                .with_suggestion(
                    "Pure_local variables can only be modified by pure functions. Mark this \
                     function as 'pure fn' or use a regular variable",
                ),
            );
        }

        let value_ty = self.check_expr(value);
        if value_ty != symbol.ty {
            self.error(
                Diagnostic::error(
                    format!(
                        "Type mismatch in assignment to '{}': expected {}, got {}",
                        name,
                        symbol.ty,
                        value_ty
                    ),
                    line,
                    col,
                )
                .with_suggestion(format!(
                    "Ensure the assigned value matches the variable's type '{}'",
                    symbol.ty
                )),
            );
        }
    }

    // -----------------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------------

    fn check_expr(&mut self, expr: &mut Expr) -> Type {
        let (line, col) = (expr.line, expr.col);
        let ty = match &mut expr.kind {
            ExprKind::IntLiteral(_) => Type::I32,
            ExprKind::FloatLiteral(_) => Type::F64,
            ExprKind::StrLiteral(_) => Type::Str,
            ExprKind::BoolLiteral(_) => Type::Bool,
            ExprKind::Ident(name) => {
                let name = name.clone();
                self.check_ident(&name, line, col)
            }
            ExprKind::Binary { op, left, right } => {
                let op = *op;
                let left_ty = self.check_expr(left);
                let right_ty = self.check_expr(right);
                self.binary_result(op, &left_ty, &right_ty, line, col)
            }
            ExprKind::Unary { op, operand } => {
                let op = *op;
                let operand_ty = self.check_expr(operand);
                match op {
                    UnOp::Neg | UnOp::BitNot => operand_ty,
                    UnOp::Not => {
                        if operand_ty != Type::Bool {
                            self.error(
                                Diagnostic::error(
                                    "Logical NOT requires boolean operand",
                                    line,
                                    col,
                                )
                                .with_suggestion(
                                    "Use a comparison operator to create a boolean expression, \
                                     or use bitwise NOT (~) for integer values.",
                                ),
                            );
                        }
                        Type::Bool
                    }
                }
            }
            ExprKind::Call { name, args } => {
                let name = name.clone();
                self.check_call(&name, args, line, col)
            }
        };

        expr.ty = Some(ty.clone());
        ty
    }

    fn check_ident(&mut self, name: &str, line: usize, col: usize) -> Type {
        let Some(symbol) = self.lookup(name).cloned() else {
            self.error(
                Diagnostic::error(format!("Undefined variable '{}'", name), line, col)
                    .with_suggestion(format!(
                        "Make sure '{}' is declared before use, or check for typos in the \
                         variable name.",
                        name
                    )),
            );
            // Default type so analysis can continue
            return Type::I32;
        };

        if symbol.is_pure_local && !self.in_pure_fn() {
            let current_name = self
                .current_fn
                .as_ref()
                .map(|f| f.name.clone())
                .unwrap_or_default();
            self.error(
                Diagnostic::error(
                    format!(
                        "Cannot access pure_local variable '{}' in non-pure function",
                        name
                    ),
                    line,
                    col,
                )
                .with_suggestion(format!(
                    "Pure_local variables can only be accessed by pure functions. Either make \
                     function '{}' pure by adding the 'pure' keyword, or remove 'pure_local' \
                     from variable '{}'.",
                    current_name, name
                )),
            );
        }

        symbol.ty
    }

    fn binary_result(
        &mut self,
        op: BinOp,
        left_ty: &Type,
        right_ty: &Type,
        line: usize,
        col: usize,
    ) -> Type {
        match op {
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => {
                common_type(left_ty, right_ty)
            }
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => Type::Bool,
            BinOp::And | BinOp::Or => {
                if *left_ty != Type::Bool || *right_ty != Type::Bool {
                    self.error(
                        Diagnostic::error("Logical operators require boolean operands", line, col)
                            .with_suggestion(
                                "Use comparison operators (==, !=, <, >, <=, >=) to create \
                                 boolean expressions, or use bitwise operators (&, |, ^) for \
                                 integer operations.",
                            ),
                    );
                }
                Type::Bool
            }
            BinOp::BitAnd | BinOp::BitOr | BinOp::BitXor | BinOp::Shl | BinOp::Shr => {
                common_type(left_ty, right_ty)
            }
        }
    }

    fn check_call(&mut self, name: &str, args: &mut [Expr], line: usize, col: usize) -> Type {
        let Some(info) = self.functions.get(name).cloned() else {
            self.error(
                Diagnostic::error(format!("Undefined function '{}'", name), line, col)
                    .with_suggestion(format!(
                        "Make sure the function '{}' is declared before calling it, or check \
                         for typos in the function name.",
                        name
                    )),
            );
            return Type::Void;
        };

        if args.len() != info.param_types.len() {
            let plural = if info.param_types.len() == 1 { "" } else { "s" };
            self.error(
                Diagnostic::error(
                    format!(
                        "Function '{}' expects {} arguments, got {}",
                        name,
                        info.param_types.len(),
                        args.len()
                    ),
                    line,
                    col,
                )
                .with_suggestion(format!(
                    "Provide exactly {} argument{} when calling '{}'.",
                    info.param_types.len(),
                    plural,
                    name
                )),
            );
            return info.return_type;
        }

        for (i, (arg, param_ty)) in args.iter_mut().zip(info.param_types.iter()).enumerate() {
            let arg_ty = self.check_expr(arg);
            if arg_ty != *param_ty {
                let expected = param_ty.display();
                let got = arg_ty.display();
                let suggestion = if builtins::is_intrinsic_math(name) {
                    if got == "i32" && expected == "f64" {
                        format!(
                            "Use {} literal (e.g., 2.0 instead of 2) or convert with float().",
                            expected
                        )
                    } else {
                        format!("Function '{}' expects {} but got {}.", name, expected, got)
                    }
                } else if name == "int" || name == "float" {
                    format!(
                        "Type conversion function '{}()' expects {} but got {}.",
                        name, expected, got
                    )
                } else {
                    format!(
                        "Ensure argument {} matches the expected parameter type, or add an \
                         explicit type conversion.",
                        i + 1
                    )
                };
                let (arg_line, arg_col) = (arg.line, arg.col);
                self.error(
                    Diagnostic::error(
                        format!(
                            "Argument {} type mismatch in call to '{}': expected {}, got {}",
                            i + 1,
                            name,
                            expected,
                            got
                        ),
                        arg_line,
                        arg_col,
                    )
                    .with_suggestion(suggestion),
                );
            }
        }

        if let Some(current) = self.current_fn.clone() {
            if current.is_pure && info.has_side_effects {
                self.error(
                    Diagnostic::error(
                        format!(
                            "Pure function '{}' cannot call function '{}' which has side effects",
                            current.name, name
                        ),
                        line,
                        col,
                    )
                    .with_suggestion(format!(
                        "Either remove the 'pure' keyword from function '{}', or only call \
                         pure functions from within it.",
                        current.name
                    )),
                );
            }
        }

        info.return_type
    }

    // -----------------------------------------------------------------------
    // Scope stack
    // -----------------------------------------------------------------------

    fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, symbol: Symbol) {
        if self.scopes.is_empty() {
            self.push_scope();
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(symbol.name.clone(), symbol);
        }
    }

    fn declared_in_current_scope(&self, name: &str) -> bool {
        self.scopes
            .last()
            .map(|scope| scope.contains_key(name))
            .unwrap_or(false)
    }

    fn lookup(&self, name: &str) -> Option<&Symbol> {
        for scope in self.scopes.iter().rev() {
            if let Some(symbol) = scope.get(name) {
                return Some(symbol);
            }
        }
        None
    }

    fn in_pure_fn(&self) -> bool {
        self.current_fn.as_ref().map(|f| f.is_pure).unwrap_or(false)
    }
}

/// Constant means a literal, optionally under unary `-` or `~`.
fn is_constant_expr(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::IntLiteral(_)
        | ExprKind::FloatLiteral(_)
        | ExprKind::StrLiteral(_)
        | ExprKind::BoolLiteral(_) => true,
        ExprKind::Unary {
            op: UnOp::Neg | UnOp::BitNot,
            operand,
        } => is_constant_expr(operand),
        _ => false,
    }
}
