//! Helper for constructing IR functions and basic blocks.

use super::instr::{CmpOp, Instruction, InstrKind, Terminator};
use super::types::{BasicBlock, BlockId, Constant, Function, Global, IrType, Module, VReg};

pub struct IrBuilder {
    next_vreg: u32,
    next_block: u32,
    next_string: u32,
    module: Module,
    current_fn: Option<Function>,
    current_block: Option<BasicBlock>,
}

impl IrBuilder {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            next_vreg: 0,
            next_block: 0,
            next_string: 0,
            module: Module::new(module_name),
            current_fn: None,
            current_block: None,
        }
    }

    /// Finish building and return the module
    pub fn finish(mut self) -> Module {
        self.finish_function();
        self.module
    }

    pub fn fresh_vreg(&mut self) -> VReg {
        let vreg = VReg(self.next_vreg);
        self.next_vreg += 1;
        vreg
    }

    pub fn fresh_block(&mut self) -> BlockId {
        let id = BlockId(self.next_block);
        self.next_block += 1;
        id
    }

    // ============ Function building ============

    /// Start a new function and its entry block; returns the parameter vregs.
    pub fn start_function(
        &mut self,
        name: impl Into<String>,
        params: Vec<IrType>,
        ret_type: IrType,
    ) -> Vec<VReg> {
        self.finish_function();

        let param_vregs: Vec<(VReg, IrType)> = params
            .into_iter()
            .map(|ty| (self.fresh_vreg(), ty))
            .collect();
        let vregs: Vec<VReg> = param_vregs.iter().map(|(v, _)| *v).collect();

        self.current_fn = Some(Function::new(name, param_vregs, ret_type));

        let entry = self.fresh_block();
        self.current_block = Some(BasicBlock::new(entry).with_label("entry"));

        vregs
    }

    pub fn finish_function(&mut self) {
        if let Some(block) = self.current_block.take() {
            if let Some(func) = self.current_fn.as_mut() {
                func.blocks.push(block);
            }
        }
        if let Some(func) = self.current_fn.take() {
            self.module.functions.push(func);
        }
    }

    pub fn declare_external(
        &mut self,
        name: impl Into<String>,
        params: Vec<IrType>,
        ret_type: IrType,
    ) {
        let mut func = Function::new(name, vec![], ret_type);
        func.is_external = true;
        func.params = params.into_iter().map(|ty| (VReg(0), ty)).collect();
        self.module.functions.push(func);
    }

    pub fn declare_external_vararg(
        &mut self,
        name: impl Into<String>,
        params: Vec<IrType>,
        ret_type: IrType,
    ) {
        let mut func = Function::new(name, vec![], ret_type);
        func.is_external = true;
        func.is_vararg = true;
        func.params = params.into_iter().map(|ty| (VReg(0), ty)).collect();
        self.module.functions.push(func);
    }

    // ============ Globals ============

    /// Intern a string constant and return the global's name
    pub fn add_string_constant(&mut self, value: &str) -> String {
        let name = format!(".str.{}", self.next_string);
        self.next_string += 1;

        self.module.globals.push(Global {
            name: name.clone(),
            ty: IrType::Ptr,
            init: Some(Constant::String(value.to_string())),
            is_const: true,
        });

        name
    }

    pub fn global_string_ptr(&mut self, global_name: &str) -> VReg {
        self.emit_with_result(InstrKind::GlobalRef(global_name.to_string()))
    }

    pub fn add_global(
        &mut self,
        name: impl Into<String>,
        ty: IrType,
        init: Option<Constant>,
        is_const: bool,
    ) {
        self.module.globals.push(Global {
            name: name.into(),
            ty,
            init,
            is_const,
        });
    }

    pub fn global_ref(&mut self, name: &str) -> VReg {
        self.emit_with_result(InstrKind::GlobalRef(name.to_string()))
    }

    // ============ Block building ============

    pub fn create_block(&mut self) -> BlockId {
        self.fresh_block()
    }

    /// Start a block, pushing the previous one onto the current function
    pub fn start_block(&mut self, id: BlockId) {
        self.start_labeled_block(id, None);
    }

    pub fn start_block_labeled(&mut self, id: BlockId, label: &str) {
        self.start_labeled_block(id, Some(label.to_string()));
    }

    fn start_labeled_block(&mut self, id: BlockId, label: Option<String>) {
        if let Some(block) = self.current_block.take() {
            if let Some(func) = self.current_fn.as_mut() {
                func.blocks.push(block);
            }
        }
        let mut block = BasicBlock::new(id);
        block.label = label;
        self.current_block = Some(block);
    }

    pub fn current_block_id(&self) -> Option<BlockId> {
        self.current_block.as_ref().map(|b| b.id)
    }

    /// True when the current block already has a terminator
    pub fn is_terminated(&self) -> bool {
        self.current_block
            .as_ref()
            .map(|b| b.terminator.is_some())
            .unwrap_or(true)
    }

    // ============ Instruction emission ============

    fn emit(&mut self, result: Option<VReg>, kind: InstrKind) -> Option<VReg> {
        if let Some(block) = self.current_block.as_mut() {
            block.instructions.push(Instruction::new(result, kind));
        }
        result
    }

    fn emit_with_result(&mut self, kind: InstrKind) -> VReg {
        let result = self.fresh_vreg();
        self.emit(Some(result), kind);
        result
    }

    // ============ Constants ============

    /// An i64 constant
    pub fn const_int(&mut self, value: i64) -> VReg {
        self.emit_with_result(InstrKind::Const(Constant::Int(value)))
    }

    /// An i32 constant (i64 constant truncated)
    pub fn const_i32(&mut self, value: i32) -> VReg {
        let wide = self.const_int(value as i64);
        self.trunc(wide, IrType::I32)
    }

    pub fn const_float(&mut self, value: f64) -> VReg {
        self.emit_with_result(InstrKind::Const(Constant::Float(value)))
    }

    pub fn const_bool(&mut self, value: bool) -> VReg {
        self.emit_with_result(InstrKind::Const(Constant::Bool(value)))
    }

    pub fn const_null(&mut self) -> VReg {
        self.emit_with_result(InstrKind::Const(Constant::Null))
    }

    // ============ Arithmetic ============

    pub fn add(&mut self, a: VReg, b: VReg) -> VReg {
        self.emit_with_result(InstrKind::Add(a, b))
    }

    pub fn sub(&mut self, a: VReg, b: VReg) -> VReg {
        self.emit_with_result(InstrKind::Sub(a, b))
    }

    pub fn mul(&mut self, a: VReg, b: VReg) -> VReg {
        self.emit_with_result(InstrKind::Mul(a, b))
    }

    pub fn sdiv(&mut self, a: VReg, b: VReg) -> VReg {
        self.emit_with_result(InstrKind::SDiv(a, b))
    }

    pub fn srem(&mut self, a: VReg, b: VReg) -> VReg {
        self.emit_with_result(InstrKind::SRem(a, b))
    }

    pub fn neg(&mut self, v: VReg) -> VReg {
        self.emit_with_result(InstrKind::Neg(v))
    }

    pub fn fadd(&mut self, a: VReg, b: VReg) -> VReg {
        self.emit_with_result(InstrKind::FAdd(a, b))
    }

    pub fn fsub(&mut self, a: VReg, b: VReg) -> VReg {
        self.emit_with_result(InstrKind::FSub(a, b))
    }

    pub fn fmul(&mut self, a: VReg, b: VReg) -> VReg {
        self.emit_with_result(InstrKind::FMul(a, b))
    }

    pub fn fdiv(&mut self, a: VReg, b: VReg) -> VReg {
        self.emit_with_result(InstrKind::FDiv(a, b))
    }

    pub fn frem(&mut self, a: VReg, b: VReg) -> VReg {
        self.emit_with_result(InstrKind::FRem(a, b))
    }

    pub fn fneg(&mut self, v: VReg) -> VReg {
        self.emit_with_result(InstrKind::FNeg(v))
    }

    // ============ Bitwise ============

    pub fn and(&mut self, a: VReg, b: VReg) -> VReg {
        self.emit_with_result(InstrKind::And(a, b))
    }

    pub fn or(&mut self, a: VReg, b: VReg) -> VReg {
        self.emit_with_result(InstrKind::Or(a, b))
    }

    pub fn xor(&mut self, a: VReg, b: VReg) -> VReg {
        self.emit_with_result(InstrKind::Xor(a, b))
    }

    pub fn shl(&mut self, a: VReg, b: VReg) -> VReg {
        self.emit_with_result(InstrKind::Shl(a, b))
    }

    pub fn ashr(&mut self, a: VReg, b: VReg) -> VReg {
        self.emit_with_result(InstrKind::AShr(a, b))
    }

    pub fn not(&mut self, v: VReg) -> VReg {
        self.emit_with_result(InstrKind::Not(v))
    }

    // ============ Comparison ============

    pub fn icmp(&mut self, op: CmpOp, a: VReg, b: VReg) -> VReg {
        self.emit_with_result(InstrKind::ICmp(op, a, b))
    }

    pub fn fcmp(&mut self, op: CmpOp, a: VReg, b: VReg) -> VReg {
        self.emit_with_result(InstrKind::FCmp(op, a, b))
    }

    // ============ Conversions ============

    pub fn sext(&mut self, v: VReg, ty: IrType) -> VReg {
        self.emit_with_result(InstrKind::SExt(v, ty))
    }

    pub fn trunc(&mut self, v: VReg, ty: IrType) -> VReg {
        self.emit_with_result(InstrKind::Trunc(v, ty))
    }

    pub fn sitofp(&mut self, v: VReg, ty: IrType) -> VReg {
        self.emit_with_result(InstrKind::SIToFP(v, ty))
    }

    pub fn fptosi(&mut self, v: VReg, ty: IrType) -> VReg {
        self.emit_with_result(InstrKind::FPToSI(v, ty))
    }

    // ============ Memory ============

    pub fn alloca(&mut self, ty: IrType) -> VReg {
        self.emit_with_result(InstrKind::Alloca(ty))
    }

    /// Allocate a stack slot in the function's entry block regardless of the
    /// block currently being built. Instruction lists and terminators are
    /// separate fields, so appending to an already-branched entry block
    /// keeps the slot ahead of the terminator.
    pub fn entry_alloca(&mut self, ty: IrType) -> VReg {
        let result = self.fresh_vreg();
        let instr = Instruction::new(Some(result), InstrKind::Alloca(ty));

        if let Some(func) = self.current_fn.as_mut() {
            if let Some(entry) = func.blocks.first_mut() {
                entry.instructions.push(instr);
                return result;
            }
        }
        // The current block is the entry block
        if let Some(block) = self.current_block.as_mut() {
            block.instructions.push(instr);
        }
        result
    }

    pub fn load(&mut self, ptr: VReg) -> VReg {
        self.emit_with_result(InstrKind::Load(ptr))
    }

    pub fn store(&mut self, ptr: VReg, value: VReg) {
        self.emit(None, InstrKind::Store(ptr, value));
    }

    pub fn get_byte_ptr(&mut self, ptr: VReg, offset: VReg) -> VReg {
        self.emit_with_result(InstrKind::GetBytePtr(ptr, offset))
    }

    pub fn load_byte(&mut self, ptr: VReg) -> VReg {
        self.emit_with_result(InstrKind::LoadByte(ptr))
    }

    // ============ Calls and selection ============

    pub fn call(&mut self, func: impl Into<String>, args: Vec<VReg>) -> VReg {
        self.emit_with_result(InstrKind::Call {
            func: func.into(),
            args,
        })
    }

    pub fn call_void(&mut self, func: impl Into<String>, args: Vec<VReg>) {
        self.emit(
            None,
            InstrKind::Call {
                func: func.into(),
                args,
            },
        );
    }

    pub fn select(&mut self, cond: VReg, then_val: VReg, else_val: VReg) -> VReg {
        self.emit_with_result(InstrKind::Select(cond, then_val, else_val))
    }

    // ============ Terminators ============

    pub fn ret(&mut self, value: Option<VReg>) {
        if let Some(block) = self.current_block.as_mut() {
            block.terminator = Some(Terminator::Ret(value));
        }
    }

    pub fn br(&mut self, target: BlockId) {
        if let Some(block) = self.current_block.as_mut() {
            block.terminator = Some(Terminator::Br(target));
        }
    }

    pub fn cond_br(&mut self, cond: VReg, then_block: BlockId, else_block: BlockId) {
        if let Some(block) = self.current_block.as_mut() {
            block.terminator = Some(Terminator::CondBr {
                cond,
                then_block,
                else_block,
            });
        }
    }

    pub fn unreachable(&mut self) {
        if let Some(block) = self.current_block.as_mut() {
            block.terminator = Some(Terminator::Unreachable);
        }
    }
}
