//! Intermediate representation
//!
//! The typed, instruction-level form of the program produced by
//! [crate::codegen] and consumed by a backend. Every function owns its
//! instructions in one store; basic blocks order them and instructions refer
//! to each other through [Value]s.

use std::fmt;

use crate::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FuncId(u32);

impl FuncId {
    pub fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(u32);

impl BlockId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstId(u32);

impl InstId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A stack slot holding one value of a fixed type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(u32);

impl SlotId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    Constant { ty: Type, value: u64 },
    Inst(InstId),
    Argument(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Inst {
    Binary {
        op: BinaryOp,
        lhs: Value,
        rhs: Value,
    },
    Compare {
        op: CompareOp,
        lhs: Value,
        rhs: Value,
    },
    Load {
        slot: SlotId,
    },
    Store {
        slot: SlotId,
        value: Value,
    },
    Call {
        callee: FuncId,
        args: Vec<Value>,
    },
    Branch {
        target: BlockId,
    },
    CondBranch {
        condition: Value,
        then_target: BlockId,
        else_target: BlockId,
    },
    Ret {
        value: Value,
    },
}

impl Inst {
    /// Whether the instruction produces a value other instructions can use
    pub fn has_result(&self) -> bool {
        matches!(
            self,
            Inst::Binary { .. } | Inst::Compare { .. } | Inst::Load { .. } | Inst::Call { .. }
        )
    }

    /// Whether the instruction ends its basic block
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Inst::Branch { .. } | Inst::CondBranch { .. } | Inst::Ret { .. }
        )
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Block {
    pub insts: Vec<InstId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub params: Vec<Type>,
    pub ret: Type,
    pub slots: Vec<Type>,
    pub insts: Vec<Inst>,
    pub blocks: Vec<Block>,
}

impl Function {
    pub fn new(name: String, params: Vec<Type>, ret: Type) -> Self {
        Self {
            name,
            params,
            ret,
            slots: Vec::new(),
            insts: Vec::new(),
            blocks: Vec::new(),
        }
    }

    pub fn append_block(&mut self) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(Block::default());
        id
    }

    pub fn append_stack_slot(&mut self, ty: Type) -> SlotId {
        let id = SlotId(self.slots.len() as u32);
        self.slots.push(ty);
        id
    }

    pub fn append_inst(&mut self, block: BlockId, inst: Inst) -> InstId {
        let id = InstId(self.insts.len() as u32);
        self.insts.push(inst);
        self.blocks[block.index()].insts.push(id);
        id
    }

    pub fn inst(&self, id: InstId) -> &Inst {
        &self.insts[id.index()]
    }

    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.index()]
    }

    pub fn has_terminator(&self, block: BlockId) -> bool {
        self.block(block)
            .insts
            .last()
            .is_some_and(|&inst| self.inst(inst).is_terminator())
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Program {
    pub functions: Vec<Function>,
}

impl Program {
    pub fn find_function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|function| function.name == name)
    }

    pub fn function(&self, id: FuncId) -> &Function {
        &self.functions[id.index()]
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Constant { ty, value } => write!(f, "{ty} {value}"),
            Value::Inst(inst) => write!(f, "%{}", inst.index()),
            Value::Argument(index) => write!(f, "%arg{index}"),
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryOp::Add => write!(f, "add"),
            BinaryOp::Sub => write!(f, "sub"),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "eq"),
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for function in &self.functions {
            write!(f, "{function}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn {}(", self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i != 0 {
                write!(f, ", ")?;
            }
            write!(f, "{param}")?;
        }
        writeln!(f, "): {} {{", self.ret)?;

        for (i, slot) in self.slots.iter().enumerate() {
            writeln!(f, "  ${i}: {slot}")?;
        }

        for (index, block) in self.blocks.iter().enumerate() {
            writeln!(f, "  b{index}:")?;
            for &id in &block.insts {
                let inst = self.inst(id);
                write!(f, "    ")?;
                if inst.has_result() {
                    write!(f, "%{} = ", id.index())?;
                }
                match inst {
                    Inst::Binary { op, lhs, rhs } => writeln!(f, "{op} {lhs}, {rhs}")?,
                    Inst::Compare { op, lhs, rhs } => writeln!(f, "cmp {op} {lhs}, {rhs}")?,
                    Inst::Load { slot } => writeln!(f, "load ${}", slot.index())?,
                    Inst::Store { slot, value } => {
                        writeln!(f, "store ${}, {value}", slot.index())?
                    }
                    Inst::Call { callee, args } => {
                        write!(f, "call @{}(", callee.index())?;
                        for (i, arg) in args.iter().enumerate() {
                            if i != 0 {
                                write!(f, ", ")?;
                            }
                            write!(f, "{arg}")?;
                        }
                        writeln!(f, ")")?;
                    }
                    Inst::Branch { target } => writeln!(f, "br b{}", target.index())?,
                    Inst::CondBranch {
                        condition,
                        then_target,
                        else_target,
                    } => writeln!(
                        f,
                        "br {condition}, b{}, b{}",
                        then_target.index(),
                        else_target.index()
                    )?,
                    Inst::Ret { value } => writeln!(f, "ret {value}")?,
                }
            }
        }
        writeln!(f, "}}")
    }
}
