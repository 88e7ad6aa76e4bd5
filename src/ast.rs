use crate::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
    BitNot,
}

/// An expression node. `ty` is filled by the parser for literals and by the
/// semantic analyzer for everything else; after analysis every expression
/// has a type.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub line: usize,
    pub col: usize,
    pub ty: Option<Type>,
}

impl Expr {
    pub fn new(kind: ExprKind, line: usize, col: usize) -> Self {
        Expr {
            kind,
            line,
            col,
            ty: None,
        }
    }

    pub fn typed(kind: ExprKind, line: usize, col: usize, ty: Type) -> Self {
        Expr {
            kind,
            line,
            col,
            ty: Some(ty),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    IntLiteral(i64),
    FloatLiteral(f64),
    StrLiteral(String),
    BoolLiteral(bool),
    Ident(String),
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnOp,
        operand: Box<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
}

/// A `let` declaration, used both for locals and top-level globals.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: String,
    pub ty: Type,
    pub is_mutable: bool,
    pub is_pure_local: bool,
    pub init: Option<Expr>,
    pub line: usize,
    pub col: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub line: usize,
    pub col: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Let(VarDecl),
    Assign {
        name: String,
        value: Expr,
    },
    Return(Option<Expr>),
    If {
        condition: Expr,
        then_body: Vec<Stmt>,
        else_body: Vec<Stmt>,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
    },
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Type,
    pub body: Vec<Stmt>,
    pub is_pure: bool,
    pub line: usize,
    pub col: usize,
}

/// Top level of a parsed compilation unit: functions and globals only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub functions: Vec<FunctionDecl>,
    pub globals: Vec<VarDecl>,
}

// ---------------------------------------------------------------------------
// AST dump (used by the driver's --ast mode)
// ---------------------------------------------------------------------------

impl Program {
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for global in &self.globals {
            out.push_str(&dump_var_decl(global, 0));
        }
        for func in &self.functions {
            let purity = if func.is_pure { "pure " } else { "" };
            let params: Vec<String> = func
                .params
                .iter()
                .map(|p| format!("{}: {}", p.name, p.ty))
                .collect();
            out.push_str(&format!(
                "{}fn {}({}) -> {}\n",
                purity,
                func.name,
                params.join(", "),
                func.return_type
            ));
            for stmt in &func.body {
                out.push_str(&dump_stmt(stmt, 1));
            }
        }
        out
    }
}

fn pad(depth: usize) -> String {
    "  ".repeat(depth)
}

fn dump_var_decl(decl: &VarDecl, depth: usize) -> String {
    let modifier = if decl.is_mutable {
        "mut "
    } else if decl.is_pure_local {
        "pure_local "
    } else {
        ""
    };
    match &decl.init {
        Some(init) => format!(
            "{}let {}{}: {} = {}\n",
            pad(depth),
            modifier,
            decl.name,
            decl.ty,
            dump_expr(init)
        ),
        None => format!("{}let {}{}: {}\n", pad(depth), modifier, decl.name, decl.ty),
    }
}

fn dump_stmt(stmt: &Stmt, depth: usize) -> String {
    match &stmt.kind {
        StmtKind::Let(decl) => dump_var_decl(decl, depth),
        StmtKind::Assign { name, value } => {
            format!("{}{} = {}\n", pad(depth), name, dump_expr(value))
        }
        StmtKind::Return(None) => format!("{}return\n", pad(depth)),
        StmtKind::Return(Some(value)) => format!("{}return {}\n", pad(depth), dump_expr(value)),
        StmtKind::If {
            condition,
            then_body,
            else_body,
        } => {
            let mut out = format!("{}if {}\n", pad(depth), dump_expr(condition));
            for s in then_body {
                out.push_str(&dump_stmt(s, depth + 1));
            }
            if !else_body.is_empty() {
                out.push_str(&format!("{}else\n", pad(depth)));
                for s in else_body {
                    out.push_str(&dump_stmt(s, depth + 1));
                }
            }
            out
        }
        StmtKind::While { condition, body } => {
            let mut out = format!("{}while {}\n", pad(depth), dump_expr(condition));
            for s in body {
                out.push_str(&dump_stmt(s, depth + 1));
            }
            out
        }
        StmtKind::Expr(expr) => format!("{}{}\n", pad(depth), dump_expr(expr)),
    }
}

fn dump_expr(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::IntLiteral(v) => v.to_string(),
        ExprKind::FloatLiteral(v) => format!("{:?}", v),
        ExprKind::StrLiteral(s) => format!("{:?}", s),
        ExprKind::BoolLiteral(b) => b.to_string(),
        ExprKind::Ident(name) => name.clone(),
        ExprKind::Binary { op, left, right } => {
            format!("({} {} {})", dump_expr(left), binop_str(*op), dump_expr(right))
        }
        ExprKind::Unary { op, operand } => {
            let op_str = match op {
                UnOp::Neg => "-",
                UnOp::Not => "!",
                UnOp::BitNot => "~",
            };
            format!("({}{})", op_str, dump_expr(operand))
        }
        ExprKind::Call { name, args } => {
            let parts: Vec<String> = args.iter().map(dump_expr).collect();
            format!("{}({})", name, parts.join(", "))
        }
    }
}

pub fn binop_str(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::Mod => "%",
        BinOp::Eq => "==",
        BinOp::Ne => "!=",
        BinOp::Lt => "<",
        BinOp::Le => "<=",
        BinOp::Gt => ">",
        BinOp::Ge => ">=",
        BinOp::And => "&&",
        BinOp::Or => "||",
        BinOp::BitAnd => "&",
        BinOp::BitOr => "|",
        BinOp::BitXor => "^",
        BinOp::Shl => "<<",
        BinOp::Shr => ">>",
    }
}
