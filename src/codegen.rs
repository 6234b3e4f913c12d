//! Code generation
//!
//! This module is responsible for lowering the fully typed HIR into the
//! instruction-level [ir] program. The main interface is the [generate]
//! function, which expects that type checking already ran: it reads concrete
//! types off every expression it lowers.

use std::collections::HashMap;

use crate::hir::{self, ExprId, Stmt, Ty};
use crate::ir;
use crate::Type;

/// Lower the typed HIR into an IR program
pub fn generate(root: &hir::Root) -> ir::Program {
    let functions = root
        .functions()
        .iter()
        .map(|function| FunctionCodegen::new(root, function).run(function))
        .collect();
    ir::Program { functions }
}

/// The state while lowering a single function
struct FunctionCodegen<'hir> {
    root: &'hir hir::Root,
    func: ir::Function,
    block: ir::BlockId,
    vars: HashMap<ExprId, ir::SlotId>,
}

impl<'hir> FunctionCodegen<'hir> {
    fn new(root: &'hir hir::Root, function: &hir::Function) -> Self {
        let params = function
            .params
            .iter()
            .map(|&param| root.ty(param).real())
            .collect();
        // A body that was never constrained to any type returns no
        // information.
        let ret = match root.ty(function.body) {
            Ty::Real(ty) => ty,
            Ty::Infer => Type::int(0),
        };

        let mut func = ir::Function::new(function.name.clone(), params, ret);
        let block = func.append_block();
        Self {
            root,
            func,
            block,
            vars: HashMap::new(),
        }
    }

    fn run(mut self, function: &hir::Function) -> ir::Function {
        let hir::ExprKind::Block { stmts } = &self.root.expr(function.body).kind else {
            panic!("function body is not a block");
        };
        self.generate_stmts(stmts);
        self.func
    }

    fn emit(&mut self, inst: ir::Inst) -> ir::InstId {
        self.func.append_inst(self.block, inst)
    }

    fn generate_stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            match *stmt {
                Stmt::Decl { var, value } => {
                    let slot = self.func.append_stack_slot(self.root.ty(var).real());
                    let value = self.generate_expr(value);
                    self.emit(ir::Inst::Store { slot, value });
                    self.vars.insert(var, slot);
                }
                Stmt::Return { value } => {
                    let value = self.generate_expr(value);
                    self.emit(ir::Inst::Ret { value });
                }
            }
        }
    }

    fn generate_expr(&mut self, id: ExprId) -> ir::Value {
        match &self.root.expr(id).kind {
            hir::ExprKind::Argument { index } => ir::Value::Argument(*index),

            hir::ExprKind::Binary { op, lhs, rhs } => {
                let op = match op {
                    hir::BinaryOp::Add => ir::BinaryOp::Add,
                    hir::BinaryOp::Sub => ir::BinaryOp::Sub,
                };
                let lhs = self.generate_expr(*lhs);
                let rhs = self.generate_expr(*rhs);
                ir::Value::Inst(self.emit(ir::Inst::Binary { op, lhs, rhs }))
            }

            hir::ExprKind::Block { .. } => unreachable!("block expressions have no value"),

            hir::ExprKind::Call { callee, args } => {
                let args = args.iter().map(|&arg| self.generate_expr(arg)).collect();
                let callee = ir::FuncId::new(callee.index());
                ir::Value::Inst(self.emit(ir::Inst::Call { callee, args }))
            }

            hir::ExprKind::Constant { value } => ir::Value::Constant {
                ty: self.root.ty(id).real(),
                value: *value,
            },

            hir::ExprKind::Match { matchee, arms } => {
                let ty = self.root.ty(id).real();
                self.generate_match(ty, *matchee, arms)
            }

            hir::ExprKind::Var => {
                let slot = self.vars[&id];
                ir::Value::Inst(self.emit(ir::Inst::Load { slot }))
            }
        }
    }

    /// Lower a match into a chain of equality compares with conditional
    /// branches into per-arm blocks; every arm stores its value into one
    /// result slot before joining in a successor block
    fn generate_match(
        &mut self,
        ty: Type,
        matchee: ExprId,
        arms: &[(ExprId, ExprId)],
    ) -> ir::Value {
        let matchee = self.generate_expr(matchee);
        let result = self.func.append_stack_slot(ty);

        let mut pending = Vec::new();
        for &(lhs, rhs) in arms {
            let lhs = self.generate_expr(lhs);
            let compare = self.emit(ir::Inst::Compare {
                op: ir::CompareOp::Eq,
                lhs: matchee,
                rhs: lhs,
            });
            let then_target = self.func.append_block();
            let else_target = self.func.append_block();
            self.emit(ir::Inst::CondBranch {
                condition: ir::Value::Inst(compare),
                then_target,
                else_target,
            });
            pending.push(then_target);
            pending.push(else_target);

            self.block = then_target;
            let rhs = self.generate_expr(rhs);
            self.emit(ir::Inst::Store {
                slot: result,
                value: rhs,
            });
            // A nested match may have moved us past the arm's entry block.
            if !self.func.has_terminator(self.block) {
                pending.push(self.block);
            }

            self.block = else_target;
        }

        let join = self.func.append_block();
        for block in pending {
            if !self.func.has_terminator(block) {
                self.func.append_inst(block, ir::Inst::Branch { target: join });
            }
        }
        self.block = join;
        ir::Value::Inst(self.emit(ir::Inst::Load { slot: result }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lowering::lower;
    use crate::parsing::parse;
    use crate::type_checking::type_check;

    fn generate_source(src: &str) -> ir::Program {
        let mut root = lower(parse(src).unwrap()).unwrap();
        type_check(&mut root).unwrap();
        generate(&root)
    }

    fn entry_insts(function: &ir::Function) -> Vec<&ir::Inst> {
        function.blocks[0]
            .insts
            .iter()
            .map(|&id| function.inst(id))
            .collect()
    }

    #[test]
    fn constant_return() {
        let program = generate_source("fn main(): u8 { return 42; }");

        let main = program.find_function("main").unwrap();
        assert_eq!(main.ret, Type::int(8));
        assert_eq!(
            entry_insts(main)[..],
            [&ir::Inst::Ret {
                value: ir::Value::Constant {
                    ty: Type::int(8),
                    value: 42,
                },
            }]
        );
    }

    #[test]
    fn arguments_and_addition() {
        let program = generate_source(
            "fn add(let a: u8, let b: u8): u8 { return a + b; } \
             fn main(): u8 { return add(2, 3); }",
        );

        let add = program.find_function("add").unwrap();
        assert_eq!(add.params, vec![Type::int(8), Type::int(8)]);
        let insts = entry_insts(add);
        let [ir::Inst::Binary { op, lhs, rhs }, ir::Inst::Ret { value }] = insts[..] else {
            panic!("unexpected instructions: {insts:?}");
        };
        assert_eq!(*op, ir::BinaryOp::Add);
        assert_eq!(*lhs, ir::Value::Argument(0));
        assert_eq!(*rhs, ir::Value::Argument(1));
        assert!(matches!(value, ir::Value::Inst(_)));

        let main = program.find_function("main").unwrap();
        let insts = entry_insts(main);
        let [ir::Inst::Call { callee, args }, ir::Inst::Ret { .. }] = insts[..] else {
            panic!("unexpected instructions: {insts:?}");
        };
        assert_eq!(program.function(*callee).name, "add");
        assert_eq!(
            args[..],
            [
                ir::Value::Constant {
                    ty: Type::int(8),
                    value: 2,
                },
                ir::Value::Constant {
                    ty: Type::int(8),
                    value: 3,
                },
            ]
        );
    }

    #[test]
    fn variables_use_stack_slots() {
        let program = generate_source("fn main(): u8 { let x = 1 + 2; return x; }");

        let main = program.find_function("main").unwrap();
        assert_eq!(main.slots, vec![Type::int(8)]);
        let insts = entry_insts(main);
        let [ir::Inst::Binary { .. }, ir::Inst::Store { slot, .. }, ir::Inst::Load { slot: loaded }, ir::Inst::Ret { value }] =
            insts[..]
        else {
            panic!("unexpected instructions: {insts:?}");
        };
        assert_eq!(slot, loaded);
        assert!(matches!(value, ir::Value::Inst(_)));
    }

    #[test]
    fn match_lowers_to_a_compare_chain() {
        let program =
            generate_source("fn main(): u8 { return match(1) { 1 => 10, 2 => 20, }; }");

        let main = program.find_function("main").unwrap();
        // Entry, then a hit and a miss block per arm, then the join block.
        assert_eq!(main.blocks.len(), 6);
        // The matchee result lives in one slot every arm stores into.
        assert_eq!(main.slots.len(), 1);

        let insts = entry_insts(main);
        assert!(matches!(insts[0], ir::Inst::Compare { .. }));
        assert!(matches!(insts[1], ir::Inst::CondBranch { .. }));

        // Both arm blocks store into the result slot and branch to the join.
        let arm_blocks = [1, 3];
        for block in arm_blocks {
            let insts: Vec<_> = main.blocks[block]
                .insts
                .iter()
                .map(|&id| main.inst(id))
                .collect();
            assert!(matches!(insts[0], ir::Inst::Store { .. }));
            assert!(matches!(insts[1], ir::Inst::Branch { .. }));
        }

        // The join block loads the result back; the return statement follows
        // in the same block.
        let join = &main.blocks[5];
        assert!(matches!(main.inst(join.insts[0]), ir::Inst::Load { .. }));
        assert!(matches!(main.inst(join.insts[1]), ir::Inst::Ret { .. }));
    }
}
