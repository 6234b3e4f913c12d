//! Parsing
//!
//! This module is responsible for turning the source code from its string form
//! into an AST. The main interface is [parse] which takes a string and
//! produces an [ast::Program].
//!
//! Internally, parsing works in two phases:
//! - the [lexer] scans the source text on demand and keeps one token of
//!   lookahead
//! - the [parser] builds the AST from the token stream

use miette::Diagnostic;
use thiserror::Error;

use crate::Span;

pub mod ast;
mod lexer;
mod parser;

pub use lexer::{Lexer, Token, TokenKind};

#[derive(Debug, Error, Diagnostic)]
pub enum ParsingError {
    #[error("unexpected '{character}'")]
    UnexpectedCharacter {
        character: char,

        #[label("here")]
        span: Span,
    },

    #[error("integer literal is too large")]
    IntegerOverflow {
        #[label("this literal")]
        span: Span,
    },

    #[error("expected {expected} but got {found}")]
    UnexpectedToken {
        expected: String,
        found: String,

        #[label("here")]
        span: Span,
    },

    #[error("expected expression before {found} token")]
    ExpectedExpression {
        found: String,

        #[label("here")]
        span: Span,
    },

    #[error("expected a statement but got {found}")]
    ExpectedStatement {
        found: String,

        #[label("here")]
        span: Span,
    },
}

/// Parse silt source code into an AST
pub fn parse(source: &str) -> Result<ast::Program, ParsingError> {
    parser::Parser::new(Lexer::new(source)).parse()
}

#[cfg(test)]
mod tests {
    use super::ast::*;
    use super::*;

    #[test]
    fn program() {
        let src = "fn main(): u8 { return 42; }";

        assert_eq!(
            parse(src).unwrap(),
            Program {
                functions: vec![Function {
                    name: String::from("main"),
                    name_span: Span::new(3, 7),
                    params: vec![],
                    return_type: Some(TypeName {
                        name: String::from("u8"),
                        span: Span::new(11, 13),
                    }),
                    body: Block {
                        stmts: vec![Statement {
                            kind: StatementKind::Return(Expression {
                                kind: ExpressionKind::Int(42),
                                span: Span::new(23, 25),
                            }),
                            span: Span::new(16, 26),
                        }],
                        span: Span::new(14, 28),
                    },
                    span: Span::new(0, 28),
                }],
            }
        );
    }

    fn body_expr(program: &Program) -> &Expression {
        let stmt = &program.functions[0].body.stmts[0];
        match &stmt.kind {
            StatementKind::Return(expr) => expr,
            StatementKind::Decl { value, .. } => value,
            StatementKind::Yield(expr) => expr,
        }
    }

    #[test]
    fn subtraction_is_left_associative() {
        let program = parse("fn main(): u8 { return 1 - 2 - 3; }").unwrap();

        let ExpressionKind::Binary {
            op: BinaryOp::Sub,
            lhs,
            rhs,
        } = &body_expr(&program).kind
        else {
            panic!("expected an outer subtraction");
        };
        assert_eq!(rhs.kind, ExpressionKind::Int(3));

        let ExpressionKind::Binary {
            op: BinaryOp::Sub,
            lhs: inner_lhs,
            rhs: inner_rhs,
        } = &lhs.kind
        else {
            panic!("expected an inner subtraction");
        };
        assert_eq!(inner_lhs.kind, ExpressionKind::Int(1));
        assert_eq!(inner_rhs.kind, ExpressionKind::Int(2));
    }

    #[test]
    fn equal_precedence_folds_left() {
        let program = parse("fn main(): u8 { return 1 + 2 - 3; }").unwrap();

        let ExpressionKind::Binary {
            op: BinaryOp::Sub,
            lhs,
            ..
        } = &body_expr(&program).kind
        else {
            panic!("expected the subtraction on the outside");
        };
        assert!(matches!(
            lhs.kind,
            ExpressionKind::Binary {
                op: BinaryOp::Add,
                ..
            }
        ));
    }

    #[test]
    fn trailing_comma_in_call() {
        let with = parse("fn main(): u8 { return f(1, 2,); }").unwrap();
        let without = parse("fn main(): u8 { return f(1, 2); }").unwrap();

        let args = |program: &Program| -> Vec<ExpressionKind> {
            match &body_expr(program).kind {
                ExpressionKind::Call { args, .. } => {
                    args.iter().map(|arg| arg.kind.clone()).collect()
                }
                other => panic!("expected a call, got {other:?}"),
            }
        };

        assert_eq!(args(&with), args(&without));
        assert_eq!(
            args(&with),
            vec![ExpressionKind::Int(1), ExpressionKind::Int(2)]
        );
    }

    #[test]
    fn function_without_return_type() {
        let program = parse("fn main() {}").unwrap();
        assert_eq!(program.functions[0].return_type, None);
    }

    #[test]
    fn match_parses_as_primary() {
        let program = parse("fn main(): u8 { return match(x) { 1 => 2, } + 3; }").unwrap();

        let ExpressionKind::Binary {
            op: BinaryOp::Add,
            lhs,
            rhs,
        } = &body_expr(&program).kind
        else {
            panic!("expected an addition");
        };
        assert_eq!(rhs.kind, ExpressionKind::Int(3));

        let ExpressionKind::Match { matchee, arms } = &lhs.kind else {
            panic!("expected a match");
        };
        assert_eq!(matchee.kind, ExpressionKind::Symbol(String::from("x")));
        assert_eq!(arms.len(), 1);
        assert_eq!(arms[0].lhs.kind, ExpressionKind::Int(1));
        assert_eq!(arms[0].rhs.kind, ExpressionKind::Int(2));
    }

    #[test]
    fn missing_operand() {
        let err = parse("fn main(): u8 { return 1 + ; }").unwrap_err();
        assert!(matches!(err, ParsingError::ExpectedExpression { .. }));
    }

    #[test]
    fn missing_semicolon() {
        let err = parse("fn main(): u8 { return 42 }").unwrap_err();
        assert!(matches!(err, ParsingError::UnexpectedToken { .. }));
    }

    #[test]
    fn statement_must_start_with_keyword() {
        let err = parse("fn main(): u8 { 1; }").unwrap_err();
        assert!(matches!(err, ParsingError::ExpectedStatement { .. }));
    }
}
