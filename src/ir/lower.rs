//! AST to IR lowering.
//!
//! A single forward walk over the analyzed program, performing no
//! optimization. Locals and parameters become stack slots in the entry
//! block; reads load and writes store. Binary arithmetic dispatches to the
//! float or integer variant based on the operand types the analyzer
//! assigned. Division and remainder are signed; right shift is arithmetic.

use std::collections::HashMap;

use crate::ast::{BinOp, Expr, ExprKind, FunctionDecl, Program, Stmt, StmtKind, UnOp, VarDecl};
use crate::types::Type;

use super::builder::IrBuilder;
use super::instr::CmpOp;
use super::runtime;
use super::types::{Constant, IrType, Module, VReg};
use super::verify;

/// Lower an analyzed program to an IR module and verify it. Verification
/// failures are hard errors that abort compilation.
pub fn lower_program(program: &Program, module_name: &str) -> Result<Module, Vec<String>> {
    let mut lowerer = Lowerer::new(module_name);
    lowerer.lower(program);
    let module = lowerer.builder.finish();

    let errors = verify::verify_module(&module);
    if errors.is_empty() {
        Ok(module)
    } else {
        Err(errors)
    }
}

pub fn map_type(ty: &Type) -> IrType {
    match ty {
        Type::I8 | Type::U8 => IrType::I8,
        Type::I16 | Type::U16 => IrType::I16,
        Type::I32 | Type::U32 => IrType::I32,
        Type::I64 | Type::U64 => IrType::I64,
        Type::F32 => IrType::F32,
        Type::F64 => IrType::F64,
        Type::Bool => IrType::Bool,
        Type::Void => IrType::Void,
        Type::Str => IrType::Ptr,
        Type::Pointer(_) | Type::Array(_, _) | Type::Struct(_) | Type::Function(_, _) => {
            IrType::Ptr
        }
    }
}

struct Lowerer {
    builder: IrBuilder,
    /// Stack slot and lowered type per local/parameter name
    locals: HashMap<String, (VReg, IrType)>,
    global_types: HashMap<String, IrType>,
}

impl Lowerer {
    fn new(module_name: &str) -> Self {
        let mut builder = IrBuilder::new(module_name);
        runtime::declare_externals(&mut builder);
        runtime::define_builtins(&mut builder);
        Lowerer {
            builder,
            locals: HashMap::new(),
            global_types: HashMap::new(),
        }
    }

    fn lower(&mut self, program: &Program) {
        for global in &program.globals {
            self.lower_global(global);
        }
        for func in &program.functions {
            self.lower_function(func);
        }
        self.builder.finish_function();
    }

    fn lower_global(&mut self, decl: &VarDecl) {
        let ty = map_type(&decl.ty);
        let init = decl
            .init
            .as_ref()
            .and_then(constant_value)
            .unwrap_or_else(|| zero_value(ty));
        self.builder
            .add_global(decl.name.clone(), ty, Some(init), false);
        self.global_types.insert(decl.name.clone(), ty);
    }

    fn lower_function(&mut self, func: &FunctionDecl) {
        let param_types: Vec<IrType> = func.params.iter().map(|p| map_type(&p.ty)).collect();
        let ret_type = map_type(&func.return_type);
        let param_vregs =
            self.builder
                .start_function(func.name.clone(), param_types.clone(), ret_type);

        self.locals.clear();
        for ((param, vreg), ty) in func.params.iter().zip(param_vregs).zip(param_types) {
            let slot = self.builder.entry_alloca(ty);
            self.builder.store(slot, vreg);
            self.locals.insert(param.name.clone(), (slot, ty));
        }

        for stmt in &func.body {
            self.lower_stmt(stmt);
        }

        // Void functions get an implicit return on fall-through
        if ret_type == IrType::Void && !self.builder.is_terminated() {
            self.builder.ret(None);
        }
    }

    // -----------------------------------------------------------------------
    // Statements
    // -----------------------------------------------------------------------

    fn lower_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Let(decl) => {
                let ty = map_type(&decl.ty);
                let slot = self.builder.entry_alloca(ty);
                self.locals.insert(decl.name.clone(), (slot, ty));
                if let Some(init) = &decl.init {
                    if let Some(value) = self.lower_expr(init) {
                        self.builder.store(slot, value);
                    }
                }
            }
            StmtKind::Assign { name, value } => {
                let Some(value) = self.lower_expr(value) else {
                    return;
                };
                if let Some((slot, _)) = self.locals.get(name).copied() {
                    self.builder.store(slot, value);
                } else if self.global_types.contains_key(name) {
                    let ptr = self.builder.global_ref(name);
                    self.builder.store(ptr, value);
                }
            }
            StmtKind::Return(value) => {
                let lowered = value.as_ref().and_then(|v| self.lower_expr(v));
                self.builder.ret(lowered);
            }
            StmtKind::If {
                condition,
                then_body,
                else_body,
            } => self.lower_if(condition, then_body, else_body),
            StmtKind::While { condition, body } => self.lower_while(condition, body),
            StmtKind::Expr(expr) => {
                self.lower_expr(expr);
            }
        }
    }

    fn lower_if(&mut self, condition: &Expr, then_body: &[Stmt], else_body: &[Stmt]) {
        let Some(cond) = self.lower_expr(condition) else {
            return;
        };

        let then_block = self.builder.create_block();
        let else_block = self.builder.create_block();
        let merge_block = self.builder.create_block();
        let has_else = !else_body.is_empty();

        if has_else {
            self.builder.cond_br(cond, then_block, else_block);
        } else {
            self.builder.cond_br(cond, then_block, merge_block);
        }

        self.builder.start_block_labeled(then_block, "then");
        for stmt in then_body {
            self.lower_stmt(stmt);
        }
        let then_terminated = self.builder.is_terminated();
        if !then_terminated {
            self.builder.br(merge_block);
        }

        let mut else_terminated = false;
        if has_else {
            self.builder.start_block_labeled(else_block, "else");
            for stmt in else_body {
                self.lower_stmt(stmt);
            }
            else_terminated = self.builder.is_terminated();
            if !else_terminated {
                self.builder.br(merge_block);
            }
        }

        self.builder.start_block_labeled(merge_block, "merge");
        // When both arms terminate there is no path into the merge block
        if has_else && then_terminated && else_terminated {
            self.builder.unreachable();
        }
    }

    fn lower_while(&mut self, condition: &Expr, body: &[Stmt]) {
        let cond_block = self.builder.create_block();
        let body_block = self.builder.create_block();
        let after_block = self.builder.create_block();

        self.builder.br(cond_block);

        self.builder.start_block_labeled(cond_block, "while.cond");
        let Some(cond) = self.lower_expr(condition) else {
            return;
        };
        self.builder.cond_br(cond, body_block, after_block);

        self.builder.start_block_labeled(body_block, "while.body");
        for stmt in body {
            self.lower_stmt(stmt);
        }
        if !self.builder.is_terminated() {
            self.builder.br(cond_block);
        }

        self.builder.start_block_labeled(after_block, "while.after");
    }

    // -----------------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------------

    /// Returns the value register, or None for void calls.
    fn lower_expr(&mut self, expr: &Expr) -> Option<VReg> {
        match &expr.kind {
            ExprKind::IntLiteral(value) => {
                let ty = expr
                    .ty
                    .as_ref()
                    .map(map_type)
                    .unwrap_or(IrType::I32);
                let wide = self.builder.const_int(*value);
                if ty == IrType::I64 {
                    Some(wide)
                } else {
                    Some(self.builder.trunc(wide, ty))
                }
            }
            ExprKind::FloatLiteral(value) => Some(self.builder.const_float(*value)),
            ExprKind::StrLiteral(value) => {
                let name = self.builder.add_string_constant(value);
                Some(self.builder.global_string_ptr(&name))
            }
            ExprKind::BoolLiteral(value) => Some(self.builder.const_bool(*value)),
            ExprKind::Ident(name) => {
                if let Some((slot, _)) = self.locals.get(name).copied() {
                    Some(self.builder.load(slot))
                } else if self.global_types.contains_key(name) {
                    let ptr = self.builder.global_ref(name);
                    Some(self.builder.load(ptr))
                } else {
                    None
                }
            }
            ExprKind::Binary { op, left, right } => {
                let lhs = self.lower_expr(left)?;
                let rhs = self.lower_expr(right)?;
                let is_float = expr_is_float(left) || expr_is_float(right);
                Some(self.lower_binary(*op, lhs, rhs, is_float))
            }
            ExprKind::Unary { op, operand } => {
                let value = self.lower_expr(operand)?;
                let result = match op {
                    UnOp::Neg => {
                        if expr_is_float(operand) {
                            self.builder.fneg(value)
                        } else {
                            self.builder.neg(value)
                        }
                    }
                    UnOp::Not | UnOp::BitNot => self.builder.not(value),
                };
                Some(result)
            }
            ExprKind::Call { name, args } => self.lower_call(expr, name, args),
        }
    }

    fn lower_binary(&mut self, op: BinOp, lhs: VReg, rhs: VReg, is_float: bool) -> VReg {
        let b = &mut self.builder;
        match op {
            BinOp::Add => {
                if is_float {
                    b.fadd(lhs, rhs)
                } else {
                    b.add(lhs, rhs)
                }
            }
            BinOp::Sub => {
                if is_float {
                    b.fsub(lhs, rhs)
                } else {
                    b.sub(lhs, rhs)
                }
            }
            BinOp::Mul => {
                if is_float {
                    b.fmul(lhs, rhs)
                } else {
                    b.mul(lhs, rhs)
                }
            }
            BinOp::Div => {
                if is_float {
                    b.fdiv(lhs, rhs)
                } else {
                    b.sdiv(lhs, rhs)
                }
            }
            BinOp::Mod => {
                if is_float {
                    b.frem(lhs, rhs)
                } else {
                    b.srem(lhs, rhs)
                }
            }
            BinOp::Eq => {
                if is_float {
                    b.fcmp(CmpOp::Eq, lhs, rhs)
                } else {
                    b.icmp(CmpOp::Eq, lhs, rhs)
                }
            }
            BinOp::Ne => {
                if is_float {
                    b.fcmp(CmpOp::Ne, lhs, rhs)
                } else {
                    b.icmp(CmpOp::Ne, lhs, rhs)
                }
            }
            BinOp::Lt => {
                if is_float {
                    b.fcmp(CmpOp::Slt, lhs, rhs)
                } else {
                    b.icmp(CmpOp::Slt, lhs, rhs)
                }
            }
            BinOp::Le => {
                if is_float {
                    b.fcmp(CmpOp::Sle, lhs, rhs)
                } else {
                    b.icmp(CmpOp::Sle, lhs, rhs)
                }
            }
            BinOp::Gt => {
                if is_float {
                    b.fcmp(CmpOp::Sgt, lhs, rhs)
                } else {
                    b.icmp(CmpOp::Sgt, lhs, rhs)
                }
            }
            BinOp::Ge => {
                if is_float {
                    b.fcmp(CmpOp::Sge, lhs, rhs)
                } else {
                    b.icmp(CmpOp::Sge, lhs, rhs)
                }
            }
            BinOp::And | BinOp::BitAnd => b.and(lhs, rhs),
            BinOp::Or | BinOp::BitOr => b.or(lhs, rhs),
            BinOp::BitXor => b.xor(lhs, rhs),
            BinOp::Shl => b.shl(lhs, rhs),
            BinOp::Shr => b.ashr(lhs, rhs),
        }
    }

    fn lower_call(&mut self, expr: &Expr, name: &str, args: &[Expr]) -> Option<VReg> {
        let mut lowered = Vec::new();
        for arg in args {
            lowered.push(self.lower_expr(arg)?);
        }

        // tan has no intrinsic: sin(x) / cos(x)
        if name == "tan" {
            let sin = self.builder.call("llvm.sin.f64", lowered.clone());
            let cos = self.builder.call("llvm.cos.f64", lowered);
            return Some(self.builder.fdiv(sin, cos));
        }

        if runtime::is_libm_reference(name) {
            return Some(self.builder.call(name, lowered));
        }

        if let Some(intrinsic) = runtime::math_intrinsic(name) {
            return Some(self.builder.call(intrinsic, lowered));
        }

        let returns_void = matches!(expr.ty, Some(Type::Void) | None);
        if returns_void {
            self.builder.call_void(name, lowered);
            None
        } else {
            Some(self.builder.call(name, lowered))
        }
    }
}

fn expr_is_float(expr: &Expr) -> bool {
    expr.ty.as_ref().map(|t| t.is_float()).unwrap_or(false)
}

/// Compile-time value of a global initializer: a literal, optionally under
/// unary `-` or `~`. The analyzer has already rejected anything else.
fn constant_value(expr: &Expr) -> Option<Constant> {
    match &expr.kind {
        ExprKind::IntLiteral(v) => Some(Constant::Int(*v)),
        ExprKind::FloatLiteral(v) => Some(Constant::Float(*v)),
        ExprKind::BoolLiteral(v) => Some(Constant::Bool(*v)),
        ExprKind::StrLiteral(s) => Some(Constant::String(s.clone())),
        ExprKind::Unary { op, operand } => match (op, constant_value(operand)?) {
            (UnOp::Neg, Constant::Int(v)) => Some(Constant::Int(-v)),
            (UnOp::Neg, Constant::Float(v)) => Some(Constant::Float(-v)),
            (UnOp::BitNot, Constant::Int(v)) => Some(Constant::Int(!v)),
            _ => None,
        },
        _ => None,
    }
}

fn zero_value(ty: IrType) -> Constant {
    match ty {
        IrType::F32 | IrType::F64 => Constant::Float(0.0),
        IrType::Bool => Constant::Bool(false),
        IrType::Ptr => Constant::Null,
        _ => Constant::Int(0),
    }
}
