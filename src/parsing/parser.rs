//! Parser
//!
//! A recursive descent parser for declarations and statements. Infix
//! expressions are parsed by precedence climbing over two explicit stacks,
//! one for operands and one for pending operators.

use super::ast::{
    BinaryOp, Block, Expression, ExpressionKind, Function, MatchArm, Parameter, Program, Statement,
    StatementKind, TypeName,
};
use super::lexer::{Lexer, Token, TokenKind};
use super::ParsingError;

use crate::Span;

type Result<T, E = ParsingError> = std::result::Result<T, E>;

fn precedence(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::Add | BinaryOp::Sub => 1,
    }
}

pub struct Parser<'src> {
    lexer: Lexer<'src>,
}

impl<'src> Parser<'src> {
    pub fn new(lexer: Lexer<'src>) -> Self {
        Self { lexer }
    }

    pub fn parse(mut self) -> Result<Program> {
        let mut functions = Vec::new();
        while self.lexer.has_next()? {
            functions.push(self.parse_function()?);
        }
        Ok(Program { functions })
    }

    /// Advance past the lookahead if it has the wanted kind
    fn eat(&mut self, kind: TokenKind<'src>) -> Result<bool> {
        if self.lexer.peek()?.kind == kind {
            self.lexer.next()?;
            return Ok(true);
        }
        Ok(false)
    }

    fn expect(&mut self, kind: TokenKind<'src>) -> Result<Token<'src>> {
        let token = self.lexer.next()?;
        if token.kind != kind {
            return Err(ParsingError::UnexpectedToken {
                expected: kind.to_string(),
                found: token.kind.to_string(),
                span: token.span,
            });
        }
        Ok(token)
    }

    fn expect_ident(&mut self) -> Result<(String, Span)> {
        let token = self.lexer.next()?;
        match token.kind {
            TokenKind::Ident(name) => Ok((name.to_string(), token.span)),
            kind => Err(ParsingError::UnexpectedToken {
                expected: String::from("identifier"),
                found: kind.to_string(),
                span: token.span,
            }),
        }
    }

    fn parse_function(&mut self) -> Result<Function> {
        let start = self.expect(TokenKind::KwFn)?.span;
        let (name, name_span) = self.expect_ident()?;

        self.expect(TokenKind::LeftParen)?;
        let mut params = Vec::new();
        while self.lexer.peek()?.kind != TokenKind::RightParen {
            self.expect(TokenKind::KwLet)?;
            let (param_name, param_span) = self.expect_ident()?;
            self.expect(TokenKind::Colon)?;
            let ty = self.parse_type()?;
            let span = param_span.to(ty.span);
            params.push(Parameter {
                name: param_name,
                ty,
                span,
            });
            self.eat(TokenKind::Comma)?;
        }
        self.expect(TokenKind::RightParen)?;

        let return_type = if self.eat(TokenKind::Colon)? {
            Some(self.parse_type()?)
        } else {
            None
        };

        let body = self.parse_block()?;
        let span = start.to(body.span);
        Ok(Function {
            name,
            name_span,
            params,
            return_type,
            body,
            span,
        })
    }

    fn parse_type(&mut self) -> Result<TypeName> {
        let (name, span) = self.expect_ident()?;
        Ok(TypeName { name, span })
    }

    fn parse_block(&mut self) -> Result<Block> {
        let start = self.expect(TokenKind::LeftBrace)?.span;
        let mut stmts = Vec::new();
        while self.lexer.has_next()? && self.lexer.peek()?.kind != TokenKind::RightBrace {
            stmts.push(self.parse_stmt()?);
        }
        let end = self.expect(TokenKind::RightBrace)?.span;
        Ok(Block {
            stmts,
            span: start.to(end),
        })
    }

    fn parse_stmt(&mut self) -> Result<Statement> {
        let token = self.lexer.peek()?;
        match token.kind {
            TokenKind::KwLet => {
                self.lexer.next()?;
                let (name, _) = self.expect_ident()?;
                self.expect(TokenKind::Eq)?;
                let value = self.parse_expr()?;
                let end = self.expect(TokenKind::Semi)?.span;
                Ok(Statement {
                    kind: StatementKind::Decl { name, value },
                    span: token.span.to(end),
                })
            }
            TokenKind::KwReturn => {
                self.lexer.next()?;
                let value = self.parse_expr()?;
                let end = self.expect(TokenKind::Semi)?.span;
                Ok(Statement {
                    kind: StatementKind::Return(value),
                    span: token.span.to(end),
                })
            }
            TokenKind::KwYield => {
                self.lexer.next()?;
                let value = self.parse_expr()?;
                let end = self.expect(TokenKind::Semi)?.span;
                Ok(Statement {
                    kind: StatementKind::Yield(value),
                    span: token.span.to(end),
                })
            }
            kind => Err(ParsingError::ExpectedStatement {
                found: kind.to_string(),
                span: token.span,
            }),
        }
    }

    fn parse_expr(&mut self) -> Result<Expression> {
        let mut operands: Vec<Expression> = Vec::new();
        let mut operators: Vec<BinaryOp> = Vec::new();

        loop {
            let token = self.lexer.peek()?;
            let op = match token.kind {
                TokenKind::Plus => Some(BinaryOp::Add),
                TokenKind::Minus => Some(BinaryOp::Sub),
                _ => None,
            };

            let Some(op) = op else {
                match self.parse_primary()? {
                    Some(expr) => {
                        operands.push(expr);
                        continue;
                    }
                    None => break,
                }
            };
            self.lexer.next()?;

            // Fold equal precedence eagerly so ties associate to the left.
            while let Some(&top) = operators.last() {
                if precedence(top) < precedence(op) {
                    break;
                }
                operators.pop();
                self.fold_binary(top, &mut operands)?;
            }
            operators.push(op);
        }

        while let Some(op) = operators.pop() {
            self.fold_binary(op, &mut operands)?;
        }

        if operands.len() != 1 {
            let token = self.lexer.peek()?;
            return Err(ParsingError::ExpectedExpression {
                found: token.kind.to_string(),
                span: token.span,
            });
        }
        Ok(operands.pop().unwrap())
    }

    fn fold_binary(&mut self, op: BinaryOp, operands: &mut Vec<Expression>) -> Result<()> {
        let (Some(rhs), Some(lhs)) = (operands.pop(), operands.pop()) else {
            let token = self.lexer.peek()?;
            return Err(ParsingError::ExpectedExpression {
                found: token.kind.to_string(),
                span: token.span,
            });
        };
        let span = lhs.span.to(rhs.span);
        operands.push(Expression {
            kind: ExpressionKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            span,
        });
        Ok(())
    }

    /// Parse a primary expression, or nothing if the lookahead cannot begin one
    fn parse_primary(&mut self) -> Result<Option<Expression>> {
        let token = self.lexer.peek()?;
        let expr = match token.kind {
            TokenKind::Ident(_) => {
                let (name, span) = self.expect_ident()?;
                if self.lexer.peek()?.kind == TokenKind::LeftParen {
                    self.parse_call_expr(name, span)?
                } else {
                    Expression {
                        kind: ExpressionKind::Symbol(name),
                        span,
                    }
                }
            }
            TokenKind::IntLit(value) => {
                let token = self.lexer.next()?;
                Expression {
                    kind: ExpressionKind::Int(value),
                    span: token.span,
                }
            }
            TokenKind::KwMatch => self.parse_match_expr()?,
            TokenKind::LeftBrace => {
                let block = self.parse_block()?;
                let span = block.span;
                Expression {
                    kind: ExpressionKind::Block(Box::new(block)),
                    span,
                }
            }
            _ => return Ok(None),
        };
        Ok(Some(expr))
    }

    fn parse_call_expr(&mut self, function: String, name_span: Span) -> Result<Expression> {
        self.expect(TokenKind::LeftParen)?;
        let mut args = Vec::new();
        while self.lexer.peek()?.kind != TokenKind::RightParen {
            args.push(self.parse_expr()?);
            self.eat(TokenKind::Comma)?;
        }
        let end = self.expect(TokenKind::RightParen)?.span;
        Ok(Expression {
            kind: ExpressionKind::Call { function, args },
            span: name_span.to(end),
        })
    }

    fn parse_match_expr(&mut self) -> Result<Expression> {
        let start = self.expect(TokenKind::KwMatch)?.span;
        self.expect(TokenKind::LeftParen)?;
        let matchee = self.parse_expr()?;
        self.expect(TokenKind::RightParen)?;

        self.expect(TokenKind::LeftBrace)?;
        let mut arms = Vec::new();
        while self.lexer.peek()?.kind != TokenKind::RightBrace {
            let lhs = self.parse_expr()?;
            self.expect(TokenKind::Arrow)?;
            let rhs = self.parse_expr()?;
            arms.push(MatchArm { lhs, rhs });
            self.expect(TokenKind::Comma)?;
        }
        let end = self.expect(TokenKind::RightBrace)?.span;

        Ok(Expression {
            kind: ExpressionKind::Match {
                matchee: Box::new(matchee),
                arms,
            },
            span: start.to(end),
        })
    }
}
