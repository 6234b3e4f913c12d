use crate::Span;

pub type Ident = String;

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub functions: Vec<Function>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: Ident,
    pub name_span: Span,
    pub params: Vec<Parameter>,
    pub return_type: Option<TypeName>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: Ident,
    pub ty: TypeName,
    pub span: Span,
}

/// A type written in the source, e.g. `u8`, `u32` or `bool`
///
/// Type names are resolved during lowering, not during parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeName {
    pub name: Ident,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stmts: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    Decl { name: Ident, value: Expression },
    Return(Expression),
    Yield(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind {
    Int(u64),
    Symbol(Ident),

    Binary {
        op: BinaryOp,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },

    Call {
        function: Ident,
        args: Vec<Expression>,
    },

    Match {
        matchee: Box<Expression>,
        arms: Vec<MatchArm>,
    },

    Block(Box<Block>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchArm {
    pub lhs: Expression,
    pub rhs: Expression,
}

use ptree::{print_tree, Style, TreeItem};
use std::borrow::Cow;
use std::{fmt, io};

impl Program {
    pub fn pretty_print(&self) -> io::Result<()> {
        for func in &self.functions {
            print_tree(func)?;
        }
        Ok(())
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryOp::Add => write!(f, "+"),
            BinaryOp::Sub => write!(f, "-"),
        }
    }
}

/// A uniform view over statements and expressions for tree rendering
#[derive(Debug, Clone)]
pub enum Node {
    Stmt(Statement),
    Expr(Expression),
}

impl TreeItem for Function {
    type Child = Node;

    fn write_self<W: io::Write>(&self, f: &mut W, style: &Style) -> io::Result<()> {
        let mut fn_string = self.name.clone();
        fn_string.push('(');
        for (i, param) in self.params.iter().enumerate() {
            fn_string.push_str(&param.name);
            fn_string.push_str(": ");
            fn_string.push_str(&param.ty.name);

            if i != self.params.len() - 1 {
                fn_string.push_str(", ");
            }
        }
        fn_string.push(')');
        if let Some(return_type) = &self.return_type {
            fn_string.push_str(": ");
            fn_string.push_str(&return_type.name);
        }

        write!(f, "{}", style.paint(fn_string))
    }

    fn children(&self) -> Cow<[Self::Child]> {
        let stmts: Vec<Node> = self.body.stmts.iter().cloned().map(Node::Stmt).collect();
        Cow::from(stmts)
    }
}

impl TreeItem for Node {
    type Child = Self;

    fn write_self<W: io::Write>(&self, f: &mut W, style: &Style) -> io::Result<()> {
        match self {
            Node::Stmt(stmt) => match &stmt.kind {
                StatementKind::Decl { name, .. } => {
                    write!(f, "{}", style.paint(format!("LET {name}")))
                }
                StatementKind::Return(_) => write!(f, "{}", style.paint("RETURN")),
                StatementKind::Yield(_) => write!(f, "{}", style.paint("YIELD")),
            },
            Node::Expr(expr) => match &expr.kind {
                ExpressionKind::Int(value) => write!(f, "{}", style.paint(value)),
                ExpressionKind::Symbol(name) => write!(f, "{}", style.paint(name)),
                ExpressionKind::Binary { op, .. } => write!(f, "{}", style.paint(op)),
                ExpressionKind::Call { function, .. } => {
                    write!(f, "{}", style.paint(format!("CALL {function}")))
                }
                ExpressionKind::Match { .. } => write!(f, "{}", style.paint("MATCH")),
                ExpressionKind::Block(_) => write!(f, "{}", style.paint("BLOCK")),
            },
        }
    }

    fn children(&self) -> Cow<[Self::Child]> {
        match self {
            Node::Stmt(stmt) => match &stmt.kind {
                StatementKind::Decl { value, .. } => Cow::from(vec![Node::Expr(value.clone())]),
                StatementKind::Return(value) | StatementKind::Yield(value) => {
                    Cow::from(vec![Node::Expr(value.clone())])
                }
            },
            Node::Expr(expr) => match &expr.kind {
                ExpressionKind::Int(_) | ExpressionKind::Symbol(_) => Cow::from(vec![]),
                ExpressionKind::Binary { lhs, rhs, .. } => Cow::from(vec![
                    Node::Expr(lhs.as_ref().clone()),
                    Node::Expr(rhs.as_ref().clone()),
                ]),
                ExpressionKind::Call { args, .. } => {
                    let args: Vec<Node> = args.iter().cloned().map(Node::Expr).collect();
                    Cow::from(args)
                }
                ExpressionKind::Match { matchee, arms } => {
                    let mut children = vec![Node::Expr(matchee.as_ref().clone())];
                    for arm in arms {
                        children.push(Node::Expr(arm.lhs.clone()));
                        children.push(Node::Expr(arm.rhs.clone()));
                    }
                    Cow::from(children)
                }
                ExpressionKind::Block(block) => {
                    let stmts: Vec<Node> = block.stmts.iter().cloned().map(Node::Stmt).collect();
                    Cow::from(stmts)
                }
            },
        }
    }
}
