//! Lowering
//!
//! This module is responsible for turning the AST into the HIR: names are
//! resolved against a stack of lexical scopes and every expression is
//! interned into the flat expression store of [hir::Root]. The main
//! interface is the [lower] function.

use std::collections::HashMap;

use miette::Diagnostic;
use thiserror::Error;

use crate::hir::{self, ExprId, FuncId, Ty};
use crate::parsing::ast;
use crate::{Span, Type};

#[derive(Debug, Error, Diagnostic)]
pub enum LoweringError {
    #[error("use of undeclared symbol '{name}'")]
    UndeclaredSymbol {
        name: String,

        #[label("unknown symbol")]
        span: Span,
    },

    #[error("redeclaration of symbol '{name}'")]
    Redeclaration {
        name: String,

        #[label("redeclared here")]
        span: Span,

        #[label("symbol originally declared here")]
        original_span: Span,
    },
}

type Result<T> = std::result::Result<T, LoweringError>;

/// Lower a parsed program into the HIR
pub fn lower(program: ast::Program) -> Result<hir::Root> {
    let mut lowerer = Lowerer::new();
    for function in &program.functions {
        lowerer.lower_function(function)?;
    }
    Ok(lowerer.root)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeKind {
    Root,
    Function,
    Block,
}

#[derive(Debug)]
struct Scope {
    kind: ScopeKind,
    symbols: HashMap<String, ExprId>,
}

impl Scope {
    fn new(kind: ScopeKind) -> Self {
        Self {
            kind,
            symbols: HashMap::new(),
        }
    }
}

/// The state during lowering
///
/// Functions are not expressions and are tracked out-of-band in a side map
/// instead of the scope stack.
struct Lowerer {
    root: hir::Root,
    scopes: Vec<Scope>,
    functions: HashMap<String, FuncId>,
}

impl Lowerer {
    fn new() -> Self {
        Self {
            root: hir::Root::new(),
            scopes: vec![Scope::new(ScopeKind::Root)],
            functions: HashMap::new(),
        }
    }

    fn find_symbol(&self, name: &str) -> Option<ExprId> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.symbols.get(name).copied())
    }

    fn lookup_symbol(&self, name: &str, span: Span) -> Result<ExprId> {
        self.find_symbol(name)
            .ok_or_else(|| LoweringError::UndeclaredSymbol {
                name: name.to_string(),
                span,
            })
    }

    /// Bind a name in the innermost scope; a name already reachable from any
    /// enclosing scope is a redeclaration
    fn declare_symbol(&mut self, name: &str, id: ExprId, span: Span) -> Result<()> {
        if let Some(existing) = self.find_symbol(name) {
            return Err(LoweringError::Redeclaration {
                name: name.to_string(),
                span,
                original_span: self.root.expr(existing).span,
            });
        }
        let scope = self.scopes.last_mut().expect("the root scope always exists");
        scope.symbols.insert(name.to_string(), id);
        Ok(())
    }

    fn lower_type(&self, ty: &ast::TypeName) -> Type {
        if ty.name == "bool" {
            return Type::Bool;
        }
        if let Some(bits) = ty.name.strip_prefix('u') {
            if !bits.is_empty() && bits.bytes().all(|byte| byte.is_ascii_digit()) {
                if let Ok(bits) = bits.parse() {
                    return Type::int(bits);
                }
            }
        }
        unreachable!("unknown type '{}'", ty.name)
    }

    fn lower_function(&mut self, function: &ast::Function) -> Result<()> {
        self.scopes.push(Scope::new(ScopeKind::Function));

        let mut params = Vec::with_capacity(function.params.len());
        for (index, param) in function.params.iter().enumerate() {
            let ty = self.lower_type(&param.ty);
            let id = self.root.create_expr(
                hir::ExprKind::Argument { index },
                Ty::Real(ty),
                param.span,
            );
            self.declare_symbol(&param.name, id, param.span)?;
            params.push(id);
        }

        let return_ty = match &function.return_type {
            Some(ty) => Ty::Real(self.lower_type(ty)),
            None => Ty::Infer,
        };
        let body = self.root.create_expr(
            hir::ExprKind::Block { stmts: Vec::new() },
            return_ty,
            function.span,
        );

        let id = self
            .root
            .append_function(function.name.clone(), params, body);
        self.functions.insert(function.name.clone(), id);

        self.lower_block_stmts(&function.body, body)?;
        self.scopes.pop();
        Ok(())
    }

    /// Lower a block's statements into the target HIR block, inside a fresh
    /// block scope
    fn lower_block_stmts(&mut self, block: &ast::Block, target: ExprId) -> Result<()> {
        self.scopes.push(Scope::new(ScopeKind::Block));
        for stmt in &block.stmts {
            self.lower_stmt(stmt, target)?;
        }
        self.scopes.pop();
        Ok(())
    }

    fn lower_stmt(&mut self, stmt: &ast::Statement, block: ExprId) -> Result<()> {
        match &stmt.kind {
            ast::StatementKind::Decl { name, value } => {
                let value = self.lower_expr(value)?;
                let var = self
                    .root
                    .create_expr(hir::ExprKind::Var, Ty::Infer, stmt.span);
                self.root.push_stmt(block, hir::Stmt::Decl { var, value });
                self.declare_symbol(name, var, stmt.span)?;
            }
            ast::StatementKind::Return(value) => {
                let value = self.lower_expr(value)?;
                self.root.push_stmt(block, hir::Stmt::Return { value });
            }
            ast::StatementKind::Yield(value) => {
                let value = self.lower_expr(value)?;
                // Yielding directly from a function body returns; the value
                // of a yield in any other block is dropped.
                let enclosing = self.scopes[self.scopes.len() - 2].kind;
                if enclosing == ScopeKind::Function {
                    self.root.push_stmt(block, hir::Stmt::Return { value });
                }
            }
        }
        Ok(())
    }

    fn lower_expr(&mut self, expr: &ast::Expression) -> Result<ExprId> {
        match &expr.kind {
            ast::ExpressionKind::Int(value) => Ok(self.root.create_expr(
                hir::ExprKind::Constant { value: *value },
                Ty::Infer,
                expr.span,
            )),

            ast::ExpressionKind::Symbol(name) => self.lookup_symbol(name, expr.span),

            ast::ExpressionKind::Binary { op, lhs, rhs } => {
                let op = match op {
                    ast::BinaryOp::Add => hir::BinaryOp::Add,
                    ast::BinaryOp::Sub => hir::BinaryOp::Sub,
                };
                let lhs = self.lower_expr(lhs)?;
                let rhs = self.lower_expr(rhs)?;
                Ok(self.root.create_expr(
                    hir::ExprKind::Binary { op, lhs, rhs },
                    Ty::Infer,
                    expr.span,
                ))
            }

            ast::ExpressionKind::Call { function, args } => {
                let mut arg_ids = Vec::with_capacity(args.len());
                for arg in args {
                    arg_ids.push(self.lower_expr(arg)?);
                }
                let callee = self.functions.get(function).copied().ok_or_else(|| {
                    LoweringError::UndeclaredSymbol {
                        name: function.clone(),
                        span: expr.span,
                    }
                })?;
                let ty = self.root.ty(self.root.function(callee).body);
                Ok(self.root.create_expr(
                    hir::ExprKind::Call {
                        callee,
                        args: arg_ids,
                    },
                    ty,
                    expr.span,
                ))
            }

            ast::ExpressionKind::Match { matchee, arms } => {
                let matchee = self.lower_expr(matchee)?;
                let mut arm_ids = Vec::with_capacity(arms.len());
                for arm in arms {
                    let lhs = self.lower_expr(&arm.lhs)?;
                    let rhs = self.lower_expr(&arm.rhs)?;
                    arm_ids.push((lhs, rhs));
                }
                Ok(self.root.create_expr(
                    hir::ExprKind::Match {
                        matchee,
                        arms: arm_ids,
                    },
                    Ty::Infer,
                    expr.span,
                ))
            }

            ast::ExpressionKind::Block(block) => {
                let id = self.root.create_expr(
                    hir::ExprKind::Block { stmts: Vec::new() },
                    Ty::Infer,
                    expr.span,
                );
                self.lower_block_stmts(block, id)?;
                Ok(id)
            }
        }
    }
}
