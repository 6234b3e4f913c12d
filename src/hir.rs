//! High-level intermediate representation
//!
//! The HIR is a flat, scope-resolved form of the program. All expressions of
//! all functions live in one contiguous store owned by [Root] and refer to
//! each other through [ExprId] indices. An expression only ever references
//! expressions created before it, so the store is append-only and ids stay
//! valid for the lifetime of the [Root].

use std::fmt;

use crate::{Span, Type};

/// A stable index into the expression store of a [Root]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(u32);

impl ExprId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A stable index into the function list of a [Root]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FuncId(u32);

impl FuncId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The type of an expression, possibly not yet inferred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ty {
    Infer,
    Real(Type),
}

impl Ty {
    pub fn is_infer(self) -> bool {
        matches!(self, Ty::Infer)
    }

    pub fn is_real(self) -> bool {
        matches!(self, Ty::Real(_))
    }

    /// The concrete type; panics if the type was never resolved
    pub fn real(self) -> Type {
        match self {
            Ty::Real(typ) => typ,
            Ty::Infer => panic!("type was never resolved"),
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Infer => write!(f, "?"),
            Ty::Real(typ) => write!(f, "{typ}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stmt {
    Decl { var: ExprId, value: ExprId },
    Return { value: ExprId },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// A function parameter; `index` is its position in the parameter list
    Argument {
        index: usize,
    },

    Binary {
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
    },

    /// An ordered statement list, e.g. a function body
    Block {
        stmts: Vec<Stmt>,
    },

    Call {
        callee: FuncId,
        args: Vec<ExprId>,
    },

    Constant {
        value: u64,
    },

    Match {
        matchee: ExprId,
        arms: Vec<(ExprId, ExprId)>,
    },

    /// A `let`-bound variable; its type starts out as [Ty::Infer]
    Var,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    ty: Ty,
}

impl Expr {
    pub fn ty(&self) -> Ty {
        self.ty
    }

    /// Update the expression's type
    ///
    /// [ExprKind::Argument] and [ExprKind::Call] expressions keep the type
    /// they were created with; retype attempts on them are ignored.
    pub fn set_ty(&mut self, ty: Ty) {
        if matches!(
            self.kind,
            ExprKind::Argument { .. } | ExprKind::Call { .. }
        ) {
            return;
        }
        self.ty = ty;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    /// Ids of the parameter [ExprKind::Argument] expressions
    pub params: Vec<ExprId>,
    /// Id of the [ExprKind::Block] expression holding the body; its type is
    /// the function's return type
    pub body: ExprId,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Root {
    functions: Vec<Function>,
    exprs: Vec<Expr>,
}

impl Root {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_expr(&mut self, kind: ExprKind, ty: Ty, span: Span) -> ExprId {
        let id = ExprId(self.exprs.len() as u32);
        self.exprs.push(Expr { kind, span, ty });
        id
    }

    pub fn append_function(&mut self, name: String, params: Vec<ExprId>, body: ExprId) -> FuncId {
        let id = FuncId(self.functions.len() as u32);
        self.functions.push(Function { name, params, body });
        id
    }

    /// Append a statement to a [ExprKind::Block] expression
    pub fn push_stmt(&mut self, block: ExprId, stmt: Stmt) {
        match &mut self.expr_mut(block).kind {
            ExprKind::Block { stmts } => stmts.push(stmt),
            other => panic!("cannot append a statement to {other:?}"),
        }
    }

    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    pub fn expr_mut(&mut self, id: ExprId) -> &mut Expr {
        &mut self.exprs[id.index()]
    }

    pub fn ty(&self, id: ExprId) -> Ty {
        self.expr(id).ty()
    }

    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }

    pub fn exprs(&self) -> impl Iterator<Item = &Expr> + '_ {
        self.exprs.iter()
    }

    pub fn function(&self, id: FuncId) -> &Function {
        &self.functions[id.index()]
    }

    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    pub fn func_ids(&self) -> impl Iterator<Item = FuncId> {
        (0..self.functions.len() as u32).map(FuncId)
    }
}
