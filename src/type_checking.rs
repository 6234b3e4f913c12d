//! Type checking
//!
//! This module assigns a concrete type to every expression in the HIR. It
//! works in two passes sharing a per-expression constraint stack: the
//! [Constrainer] walks every function body and records what it learns about
//! each expression, then the [Unifier] drains the stacks and resolves the
//! constraints into concrete types, rejecting narrowing conversions. The
//! main interface is the [type_check] function.

use miette::Diagnostic;
use thiserror::Error;

use crate::hir::{self, ExprId, ExprKind, Stmt, Ty};
use crate::{Span, Type};

#[derive(Debug, Error, Diagnostic)]
pub enum TypeCheckError {
    #[error("cannot implicitly cast from {from} to {to}")]
    ImplicitCast {
        from: Ty,
        to: Ty,

        #[label("here")]
        span: Span,

        #[label("constrained here")]
        constrained_span: Span,
    },

    #[error("implicit truncation from {source_desc} to {target} is not allowed")]
    ImplicitTruncation {
        source_desc: String,
        target: Type,

        #[label("here")]
        span: Span,

        #[label("parameter declared here")]
        parameter_span: Option<Span>,
    },
}

type Result<T> = std::result::Result<T, TypeCheckError>;

/// What the constrainer has learned about a single expression
#[derive(Debug, Clone, Copy)]
enum Constraint {
    /// The expression's type must be exactly this type
    Equals(Ty),
    /// The expression must be implicitly castable to the type of another
    /// expression, which may itself still be unresolved
    ImplicitlyCastable(ExprId),
    /// The expression is an integer literal needing at least this many bits
    IntegerWidth(u8),
}

/// The minimum number of bits needed to hold `value`
fn integer_width(value: u64) -> u8 {
    if value <= 1 {
        0
    } else {
        (64 - (value - 1).leading_zeros()) as u8
    }
}

/// Check and store the types of all expressions
pub fn type_check(root: &mut hir::Root) -> Result<()> {
    let mut constrainer = Constrainer {
        constraints: vec![Vec::new(); root.expr_count()],
        root,
    };
    constrainer.run();
    let constraints = constrainer.constraints;

    let mut unifier = Unifier { root, constraints };
    unifier.run()
}

struct Constrainer<'hir> {
    root: &'hir hir::Root,
    constraints: Vec<Vec<Constraint>>,
}

impl<'hir> Constrainer<'hir> {
    fn run(&mut self) {
        let root = self.root;
        for function in root.functions() {
            for &param in &function.params {
                self.push(param, Constraint::Equals(root.ty(param)));
            }
            self.constrain_expr(function.body, function.body);
        }
    }

    fn push(&mut self, id: ExprId, constraint: Constraint) {
        self.constraints[id.index()].push(constraint);
    }

    /// Collect constraints for an expression; `body` is the enclosing
    /// function's body block
    fn constrain_expr(&mut self, id: ExprId, body: ExprId) {
        let root = self.root;
        match &root.expr(id).kind {
            ExprKind::Argument { .. } | ExprKind::Var => {}

            ExprKind::Binary { lhs, rhs, .. } => {
                self.constrain_expr(*lhs, body);
                self.constrain_expr(*rhs, body);
                self.push(*lhs, Constraint::ImplicitlyCastable(id));
                self.push(*rhs, Constraint::ImplicitlyCastable(id));
            }

            ExprKind::Block { stmts } => {
                for stmt in stmts {
                    match *stmt {
                        Stmt::Decl { var, value } => {
                            self.constrain_expr(value, body);
                            self.push(value, Constraint::ImplicitlyCastable(var));
                        }
                        Stmt::Return { value } => {
                            self.constrain_expr(value, body);
                            self.push(value, Constraint::ImplicitlyCastable(body));
                        }
                    }
                }
            }

            ExprKind::Call { callee, args } => {
                let callee = root.function(*callee);
                self.push(id, Constraint::Equals(root.ty(callee.body)));
                for (&arg, &param) in args.iter().zip(&callee.params) {
                    self.constrain_expr(arg, body);
                    self.push(arg, Constraint::ImplicitlyCastable(param));
                }
            }

            ExprKind::Constant { value } => {
                self.push(id, Constraint::IntegerWidth(integer_width(*value)));
            }

            ExprKind::Match { matchee, arms } => {
                self.constrain_expr(*matchee, body);
                for &(lhs, rhs) in arms {
                    self.constrain_expr(lhs, body);
                    self.constrain_expr(rhs, body);
                    self.push(*matchee, Constraint::ImplicitlyCastable(lhs));
                    self.push(lhs, Constraint::ImplicitlyCastable(*matchee));
                    self.push(rhs, Constraint::ImplicitlyCastable(id));
                }
            }
        }
    }
}

struct Unifier<'hir> {
    root: &'hir mut hir::Root,
    constraints: Vec<Vec<Constraint>>,
}

impl<'hir> Unifier<'hir> {
    fn run(&mut self) -> Result<()> {
        for function in self.root.func_ids().collect::<Vec<_>>() {
            let body = self.root.function(function).body;
            self.unify_expr(body)?;
        }
        Ok(())
    }

    fn unify_expr(&mut self, id: ExprId) -> Result<()> {
        let kind = self.root.expr(id).kind.clone();

        // Blocks never carry constraints themselves; their statements do.
        if let ExprKind::Block { stmts } = &kind {
            assert!(self.constraints[id.index()].is_empty());
            for stmt in stmts {
                match *stmt {
                    Stmt::Decl { var, value } => {
                        self.unify_expr(var)?;
                        self.unify_expr(value)?;
                        if self.root.ty(var).is_infer() {
                            let value_ty = self.root.ty(value);
                            self.root.expr_mut(var).set_ty(value_ty);
                        }
                    }
                    Stmt::Return { value } => self.unify_expr(value)?,
                }
            }
            return Ok(());
        }

        // A variable whose constraints were already drained at an earlier
        // use keeps the type it has.
        if matches!(kind, ExprKind::Var) && self.constraints[id.index()].is_empty() {
            return Ok(());
        }

        let mut visited: Vec<Constraint> = Vec::new();
        while let Some(constraint) = self.constraints[id.index()].pop() {
            match constraint {
                Constraint::Equals(ty) => {
                    self.root.expr_mut(id).set_ty(ty);
                    for &prior in &visited {
                        match prior {
                            Constraint::ImplicitlyCastable(target) => {
                                let cast_to = self.root.ty(target);
                                if cast_to.is_real() && self.root.ty(id) != cast_to {
                                    return Err(TypeCheckError::ImplicitCast {
                                        from: self.root.ty(id),
                                        to: cast_to,
                                        span: self.root.expr(id).span,
                                        constrained_span: self.root.expr(target).span,
                                    });
                                }
                            }
                            _ => unreachable!("only castability constraints can be pending"),
                        }
                    }
                }

                Constraint::ImplicitlyCastable(target) => {
                    // TODO: Also check this against the constraints that were
                    // already drained, like the two concrete kinds do.
                    if !self.root.ty(id).is_real() {
                        let target_ty = self.root.ty(target);
                        self.root.expr_mut(id).set_ty(target_ty);
                    }
                }

                Constraint::IntegerWidth(width) => {
                    self.root
                        .expr_mut(id)
                        .set_ty(Ty::Real(Type::int(width)));
                    for &prior in &visited {
                        match prior {
                            Constraint::ImplicitlyCastable(target) => {
                                let Ty::Real(cast_to) = self.root.ty(target) else {
                                    continue;
                                };
                                let Type::Int { bits } = cast_to else {
                                    unreachable!(
                                        "an integer cannot be constrained to a non-integer type"
                                    );
                                };
                                if bits < width {
                                    // When the target's width was itself
                                    // inferred from a literal, neither side
                                    // was declared; the wider width wins.
                                    if matches!(
                                        self.root.expr(target).kind,
                                        ExprKind::Constant { .. }
                                    ) {
                                        self.root
                                            .expr_mut(target)
                                            .set_ty(Ty::Real(Type::int(width)));
                                        continue;
                                    }
                                    let expr = self.root.expr(id);
                                    let source_desc = match expr.kind {
                                        ExprKind::Constant { value } => {
                                            format!("the literal '{value}' (u{width})")
                                        }
                                        _ => format!("a u{width}"),
                                    };
                                    let target_expr = self.root.expr(target);
                                    let parameter_span =
                                        matches!(target_expr.kind, ExprKind::Argument { .. })
                                            .then_some(target_expr.span);
                                    return Err(TypeCheckError::ImplicitTruncation {
                                        source_desc,
                                        target: cast_to,
                                        span: expr.span,
                                        parameter_span,
                                    });
                                }
                                // Widening is free: adopt the wider type.
                                self.root.expr_mut(id).set_ty(Ty::Real(cast_to));
                            }
                            _ => unreachable!("only castability constraints can be pending"),
                        }
                    }
                }
            }
            visited.push(constraint);
        }

        match kind {
            ExprKind::Binary { lhs, rhs, .. } => {
                self.unify_expr(lhs)?;
                self.unify_expr(rhs)?;
            }
            ExprKind::Call { args, .. } => {
                for arg in args {
                    self.unify_expr(arg)?;
                }
            }
            ExprKind::Match { matchee, arms } => {
                self.unify_expr(matchee)?;
                for (lhs, rhs) in arms {
                    self.unify_expr(lhs)?;
                    self.unify_expr(rhs)?;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lowering::lower;
    use crate::parsing::parse;

    fn check(src: &str) -> Result<hir::Root> {
        let mut root = lower(parse(src).unwrap()).unwrap();
        type_check(&mut root)?;
        Ok(root)
    }

    fn constant_ty(root: &hir::Root, value: u64) -> Ty {
        root.exprs()
            .find(|expr| expr.kind == ExprKind::Constant { value })
            .expect("no such constant")
            .ty()
    }

    fn var_ty(root: &hir::Root) -> Ty {
        root.exprs()
            .find(|expr| expr.kind == ExprKind::Var)
            .expect("no variable")
            .ty()
    }

    #[test]
    fn widths() {
        assert_eq!(integer_width(0), 0);
        assert_eq!(integer_width(1), 0);
        assert_eq!(integer_width(2), 1);
        assert_eq!(integer_width(3), 2);
        assert_eq!(integer_width(4), 2);
        assert_eq!(integer_width(255), 8);
        assert_eq!(integer_width(300), 9);
        assert_eq!(integer_width(1024), 10);
    }

    #[test]
    fn literals_widen_to_their_target() {
        let root = check("fn main(): u8 { return 42; }").unwrap();
        assert_eq!(constant_ty(&root, 42), Ty::Real(Type::int(8)));
    }

    #[test]
    fn truncation_is_rejected() {
        let err = check("fn main(): u8 { return 300; }").unwrap_err();
        let TypeCheckError::ImplicitTruncation { source_desc, target, .. } = err else {
            panic!("expected a truncation error");
        };
        assert_eq!(source_desc, "the literal '300' (u9)");
        assert_eq!(target, Type::int(8));
    }

    #[test]
    fn truncating_argument_names_the_parameter() {
        let err = check(
            "fn f(let x: u8): u8 { return x; } fn main(): u8 { return f(1024); }",
        )
        .unwrap_err();
        let TypeCheckError::ImplicitTruncation {
            source_desc,
            parameter_span,
            ..
        } = err
        else {
            panic!("expected a truncation error");
        };
        assert_eq!(source_desc, "the literal '1024' (u10)");
        assert!(parameter_span.is_some());
    }

    #[test]
    fn variables_adopt_the_return_type() {
        let root = check("fn main(): u16 { let x = 5; return x; }").unwrap();
        assert_eq!(var_ty(&root), Ty::Real(Type::int(16)));
        assert_eq!(constant_ty(&root, 5), Ty::Real(Type::int(16)));
    }

    #[test]
    fn binary_operands_widen_together() {
        let root = check("fn main(): u8 { let x = 1 + 2; return x; }").unwrap();
        assert_eq!(var_ty(&root), Ty::Real(Type::int(8)));
        assert_eq!(constant_ty(&root, 1), Ty::Real(Type::int(8)));
        assert_eq!(constant_ty(&root, 2), Ty::Real(Type::int(8)));
    }

    #[test]
    fn call_results_keep_their_type() {
        let err = check(
            "fn wide(): u16 { return 1000; } \
             fn narrow(let x: u8): u8 { return x; } \
             fn main(): u8 { return narrow(wide()); }",
        )
        .unwrap_err();
        let TypeCheckError::ImplicitCast { from, to, .. } = err else {
            panic!("expected a cast error");
        };
        assert_eq!(from, Ty::Real(Type::int(16)));
        assert_eq!(to, Ty::Real(Type::int(8)));
    }

    #[test]
    fn match_arms_adopt_the_result_type() {
        let root =
            check("fn main(): u8 { return match(1) { 1 => 10, 2 => 20, }; }").unwrap();
        assert_eq!(constant_ty(&root, 10), Ty::Real(Type::int(8)));
        assert_eq!(constant_ty(&root, 20), Ty::Real(Type::int(8)));
    }

    #[test]
    fn literal_width_conflicts_widen_the_matchee() {
        let root =
            check("fn main(): u8 { return match(1) { 1 => 10, 2 => 20, }; }").unwrap();

        let body = root.functions()[0].body;
        let ExprKind::Block { stmts } = &root.expr(body).kind else {
            panic!("function body is not a block");
        };
        let Stmt::Return { value } = stmts[0] else {
            panic!("expected a return");
        };
        let ExprKind::Match { matchee, arms } = &root.expr(value).kind else {
            panic!("expected a match");
        };

        // The wider arm pattern retroactively widens the matchee instead of
        // being rejected as a truncation.
        assert_eq!(root.ty(*matchee), Ty::Real(Type::int(1)));
        assert_eq!(root.ty(arms[1].0), Ty::Real(Type::int(1)));
        // An arm pattern that unified before the widening keeps the width it
        // resolved against.
        assert_eq!(root.ty(arms[0].0), Ty::Real(Type::int(0)));
    }

    #[test]
    fn arguments_keep_their_declared_type() {
        let root = check("fn add(let a: u8, let b: u8): u8 { return a + b; }").unwrap();
        let function = &root.functions()[0];
        assert_eq!(root.ty(function.params[0]), Ty::Real(Type::int(8)));
        assert_eq!(root.ty(function.params[1]), Ty::Real(Type::int(8)));
    }
}
