//! Structural verification of lowered IR.
//!
//! Runs after each function is lowered and again over the whole module; any
//! finding is a hard error that aborts compilation before emission.

use std::collections::HashSet;

use super::instr::{InstrKind, Terminator};
use super::types::{Function, IrType, Module};

/// Verify a single function definition against its enclosing module.
pub fn verify_function(func: &Function, module: &Module) -> Vec<String> {
    let mut errors = Vec::new();

    if func.is_external {
        return errors;
    }

    if func.blocks.is_empty() {
        errors.push(format!("function '{}': no basic blocks", func.name));
        return errors;
    }

    let block_ids: HashSet<_> = func.blocks.iter().map(|b| b.id).collect();
    let callable: HashSet<&str> = module.functions.iter().map(|f| f.name.as_str()).collect();
    let global_names: HashSet<&str> = module.globals.iter().map(|g| g.name.as_str()).collect();

    for block in &func.blocks {
        for instr in &block.instructions {
            match &instr.kind {
                InstrKind::Call { func: callee, .. } => {
                    if !callable.contains(callee.as_str()) {
                        errors.push(format!(
                            "function '{}': call to undeclared function '{}' in {}",
                            func.name, callee, block.id
                        ));
                    }
                }
                InstrKind::GlobalRef(name) => {
                    if !global_names.contains(name.as_str()) {
                        errors.push(format!(
                            "function '{}': reference to undeclared global '{}' in {}",
                            func.name, name, block.id
                        ));
                    }
                }
                _ => {}
            }
        }

        match &block.terminator {
            None => errors.push(format!(
                "function '{}': block {} has no terminator",
                func.name, block.id
            )),
            Some(Terminator::Br(target)) => {
                if !block_ids.contains(target) {
                    errors.push(format!(
                        "function '{}': branch to unknown block {} from {}",
                        func.name, target, block.id
                    ));
                }
            }
            Some(Terminator::CondBr {
                then_block,
                else_block,
                ..
            }) => {
                for target in [then_block, else_block] {
                    if !block_ids.contains(target) {
                        errors.push(format!(
                            "function '{}': branch to unknown block {} from {}",
                            func.name, target, block.id
                        ));
                    }
                }
            }
            Some(Terminator::Ret(value)) => {
                let returns_value = value.is_some();
                let expects_value = func.ret_type != IrType::Void;
                if returns_value && !expects_value {
                    errors.push(format!(
                        "function '{}': returns a value but is declared void",
                        func.name
                    ));
                } else if !returns_value && expects_value {
                    errors.push(format!(
                        "function '{}': bare return in function returning {}",
                        func.name, func.ret_type
                    ));
                }
            }
            Some(Terminator::Unreachable) => {}
        }
    }

    errors
}

/// Verify every definition plus module-level naming invariants.
pub fn verify_module(module: &Module) -> Vec<String> {
    let mut errors = Vec::new();

    let mut seen = HashSet::new();
    for func in &module.functions {
        if !func.is_external && !seen.insert(func.name.as_str()) {
            errors.push(format!("duplicate function definition '{}'", func.name));
        }
    }

    let mut seen_globals = HashSet::new();
    for global in &module.globals {
        if !seen_globals.insert(global.name.as_str()) {
            errors.push(format!("duplicate global '{}'", global.name));
        }
    }

    for func in &module.functions {
        errors.extend(verify_function(func, module));
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::IrBuilder;
    use crate::ir::types::BasicBlock;

    #[test]
    fn well_formed_function_passes() {
        let mut b = IrBuilder::new("test");
        let params = b.start_function("id", vec![IrType::I32], IrType::I32);
        b.ret(Some(params[0]));
        let module = b.finish();
        assert!(verify_module(&module).is_empty());
    }

    #[test]
    fn missing_terminator_is_flagged() {
        let mut b = IrBuilder::new("test");
        let _ = b.start_function("broken", vec![], IrType::Void);
        let module = b.finish();
        let errors = verify_module(&module);
        assert!(
            errors.iter().any(|e| e.contains("no terminator")),
            "expected terminator error, got: {:?}",
            errors
        );
    }

    #[test]
    fn call_to_undeclared_function_is_flagged() {
        let mut b = IrBuilder::new("test");
        let _ = b.start_function("caller", vec![], IrType::Void);
        b.call_void("nowhere", vec![]);
        b.ret(None);
        let module = b.finish();
        let errors = verify_module(&module);
        assert!(
            errors.iter().any(|e| e.contains("undeclared function 'nowhere'")),
            "expected undeclared-call error, got: {:?}",
            errors
        );
    }

    #[test]
    fn branch_to_unknown_block_is_flagged() {
        let mut b = IrBuilder::new("test");
        let _ = b.start_function("jumper", vec![], IrType::Void);
        let ghost = crate::ir::types::BlockId(999);
        b.br(ghost);
        let module = b.finish();
        let errors = verify_module(&module);
        assert!(
            errors.iter().any(|e| e.contains("unknown block")),
            "expected unknown-block error, got: {:?}",
            errors
        );
    }

    #[test]
    fn return_shape_must_match_signature() {
        let mut module = Module::new("test");
        let mut func = Function::new("f", vec![], IrType::I32);
        let mut block = BasicBlock::new(crate::ir::types::BlockId(0));
        block.terminator = Some(Terminator::Ret(None));
        func.blocks.push(block);
        module.functions.push(func);
        let errors = verify_module(&module);
        assert!(
            errors.iter().any(|e| e.contains("bare return")),
            "expected bare-return error, got: {:?}",
            errors
        );
    }
}
