//! IR type and container definitions.

use std::fmt;

/// A virtual register (SSA value)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VReg(pub u32);

impl fmt::Display for VReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// A basic block label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(pub u32);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

/// Lowered types. Signedness is not represented here; it is carried by the
/// operations chosen (signed compare, signed remainder, signed-to-float).
/// Strings lower to an opaque pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrType {
    Void,
    Bool,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Ptr,
}

impl IrType {
    pub fn is_float(&self) -> bool {
        matches!(self, IrType::F32 | IrType::F64)
    }

    pub fn is_int(&self) -> bool {
        matches!(self, IrType::I8 | IrType::I16 | IrType::I32 | IrType::I64)
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrType::Void => write!(f, "void"),
            IrType::Bool => write!(f, "i1"),
            IrType::I8 => write!(f, "i8"),
            IrType::I16 => write!(f, "i16"),
            IrType::I32 => write!(f, "i32"),
            IrType::I64 => write!(f, "i64"),
            IrType::F32 => write!(f, "float"),
            IrType::F64 => write!(f, "double"),
            IrType::Ptr => write!(f, "ptr"),
        }
    }
}

/// A constant value
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
    String(String),
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int(v) => write!(f, "{}", v),
            Constant::Float(v) => write!(f, "{:?}", v),
            Constant::Bool(v) => write!(f, "{}", if *v { "true" } else { "false" }),
            Constant::Null => write!(f, "null"),
            Constant::String(s) => write!(f, "{:?}", s),
        }
    }
}

/// A module contains external declarations, globals, and function
/// definitions. The runtime surface sits at the front of `functions`.
#[derive(Debug, Clone)]
pub struct Module {
    pub name: String,
    pub functions: Vec<Function>,
    pub globals: Vec<Global>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: Vec::new(),
            globals: Vec::new(),
        }
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }
}

/// A function definition or external declaration
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub params: Vec<(VReg, IrType)>,
    pub ret_type: IrType,
    pub blocks: Vec<BasicBlock>,
    pub is_external: bool,
    pub is_vararg: bool,
}

impl Function {
    pub fn new(name: impl Into<String>, params: Vec<(VReg, IrType)>, ret_type: IrType) -> Self {
        Self {
            name: name.into(),
            params,
            ret_type,
            blocks: Vec::new(),
            is_external: false,
            is_vararg: false,
        }
    }

    pub fn entry_block(&self) -> Option<&BasicBlock> {
        self.blocks.first()
    }
}

/// A linear sequence of instructions ending in a terminator
#[derive(Debug, Clone)]
pub struct BasicBlock {
    pub id: BlockId,
    pub label: Option<String>,
    pub instructions: Vec<super::Instruction>,
    pub terminator: Option<super::Terminator>,
}

impl BasicBlock {
    pub fn new(id: BlockId) -> Self {
        Self {
            id,
            label: None,
            instructions: Vec::new(),
            terminator: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// A global variable or constant
#[derive(Debug, Clone)]
pub struct Global {
    pub name: String,
    pub ty: IrType,
    pub init: Option<Constant>,
    pub is_const: bool,
}

// ---------------------------------------------------------------------------
// Textual form
// ---------------------------------------------------------------------------

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; module {}", self.name)?;

        for global in &self.globals {
            let kind = if global.is_const { "constant" } else { "global" };
            match &global.init {
                Some(init) => writeln!(f, "@{} = {} {} {}", global.name, kind, global.ty, init)?,
                None => writeln!(f, "@{} = {} {} zeroinitializer", global.name, kind, global.ty)?,
            }
        }
        if !self.globals.is_empty() {
            writeln!(f)?;
        }

        for func in &self.functions {
            write!(f, "{}", func)?;
        }

        Ok(())
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|(vreg, ty)| {
                if self.is_external {
                    ty.to_string()
                } else {
                    format!("{} {}", ty, vreg)
                }
            })
            .collect();
        let mut params = params.join(", ");
        if self.is_vararg {
            if params.is_empty() {
                params = "...".to_string();
            } else {
                params.push_str(", ...");
            }
        }

        if self.is_external {
            return writeln!(f, "declare {} @{}({})", self.ret_type, self.name, params);
        }

        writeln!(f, "define {} @{}({}) {{", self.ret_type, self.name, params)?;
        for block in &self.blocks {
            match &block.label {
                Some(label) => writeln!(f, "{}:  ; {}", block.id, label)?,
                None => writeln!(f, "{}:", block.id)?,
            }
            for instr in &block.instructions {
                writeln!(f, "  {}", instr)?;
            }
            match &block.terminator {
                Some(term) => writeln!(f, "  {}", term)?,
                None => writeln!(f, "  ; missing terminator")?,
            }
        }
        writeln!(f, "}}")?;
        writeln!(f)
    }
}
