//! Lexer
//!
//! This submodule prepares source code for parsing by splitting the text into
//! easy-to-work-with tokens. The [Lexer] scans the source lazily and hands the
//! parser one token of lookahead.

use std::fmt;

use crate::Span;

use super::ParsingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind<'src> {
    Ident(&'src str),
    IntLit(u64),

    KwFn,
    KwLet,
    KwMatch,
    KwReturn,
    KwYield,

    Eq,
    Arrow,
    Colon,
    Comma,
    Semi,
    LeftBrace,
    RightBrace,
    LeftParen,
    RightParen,
    Plus,
    Minus,

    Eof,
}

impl fmt::Display for TokenKind<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident(name) => write!(f, "{name}"),
            TokenKind::IntLit(_) => write!(f, "number"),
            TokenKind::KwFn => write!(f, "fn"),
            TokenKind::KwLet => write!(f, "let"),
            TokenKind::KwMatch => write!(f, "match"),
            TokenKind::KwReturn => write!(f, "return"),
            TokenKind::KwYield => write!(f, "yield"),
            TokenKind::Eq => write!(f, "="),
            TokenKind::Arrow => write!(f, "=>"),
            TokenKind::Colon => write!(f, ":"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Semi => write!(f, ";"),
            TokenKind::LeftBrace => write!(f, "{{"),
            TokenKind::RightBrace => write!(f, "}}"),
            TokenKind::LeftParen => write!(f, "("),
            TokenKind::RightParen => write!(f, ")"),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::Eof => write!(f, "end of file"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    pub kind: TokenKind<'src>,
    pub span: Span,
}

impl<'src> Token<'src> {
    fn new(kind: TokenKind<'src>, span: Span) -> Self {
        Self { kind, span }
    }
}

/// A cursor over the raw bytes of the source
struct Cursor<'src> {
    src: &'src str,
    position: usize,
}

impl<'src> Cursor<'src> {
    fn new(src: &'src str) -> Self {
        Self { src, position: 0 }
    }

    fn has_next(&self) -> bool {
        self.position < self.src.len()
    }

    fn peek(&self) -> u8 {
        self.src.as_bytes()[self.position]
    }

    fn next(&mut self) -> u8 {
        let byte = self.peek();
        self.position += 1;
        byte
    }

    fn slice_from(&self, start: usize) -> &'src str {
        &self.src[start..self.position]
    }
}

/// The silt lexer
///
/// The lookahead token is scanned lazily: [Lexer::peek] scans at most one
/// token ahead and [Lexer::next] hands it out again without rescanning.
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    peeked: Option<Token<'src>>,
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src str) -> Self {
        Self {
            cursor: Cursor::new(src),
            peeked: None,
        }
    }

    pub fn has_next(&mut self) -> Result<bool, ParsingError> {
        Ok(self.peek()?.kind != TokenKind::Eof)
    }

    pub fn peek(&mut self) -> Result<Token<'src>, ParsingError> {
        match self.peeked {
            Some(token) => Ok(token),
            None => {
                let token = self.scan_token()?;
                self.peeked = Some(token);
                Ok(token)
            }
        }
    }

    pub fn next(&mut self) -> Result<Token<'src>, ParsingError> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => self.scan_token(),
        }
    }

    fn scan_token(&mut self) -> Result<Token<'src>, ParsingError> {
        loop {
            while self.cursor.has_next() && self.cursor.peek().is_ascii_whitespace() {
                self.cursor.next();
            }
            if !self.cursor.has_next() {
                let end = Span::marker(self.cursor.position);
                return Ok(Token::new(TokenKind::Eof, end));
            }

            let start = self.cursor.position;
            let byte = self.cursor.next();
            let kind = match byte {
                b',' => TokenKind::Comma,
                b':' => TokenKind::Colon,
                b';' => TokenKind::Semi,
                b'{' => TokenKind::LeftBrace,
                b'}' => TokenKind::RightBrace,
                b'(' => TokenKind::LeftParen,
                b')' => TokenKind::RightParen,
                b'+' => TokenKind::Plus,
                b'-' => TokenKind::Minus,
                b'=' => {
                    if self.cursor.has_next() && self.cursor.peek() == b'>' {
                        self.cursor.next();
                        TokenKind::Arrow
                    } else {
                        TokenKind::Eq
                    }
                }
                b'/' if self.cursor.has_next() && self.cursor.peek() == b'/' => {
                    while self.cursor.has_next() && self.cursor.peek() != b'\n' {
                        self.cursor.next();
                    }
                    continue;
                }
                b'0'..=b'9' => {
                    while self.cursor.has_next() && self.cursor.peek().is_ascii_digit() {
                        self.cursor.next();
                    }
                    let span = Span::new(start, self.cursor.position);
                    let value = self
                        .cursor
                        .slice_from(start)
                        .parse()
                        .map_err(|_| ParsingError::IntegerOverflow { span })?;
                    return Ok(Token::new(TokenKind::IntLit(value), span));
                }
                b'A'..=b'Z' | b'a'..=b'z' | b'_' => {
                    while self.cursor.has_next() && is_ident_continue(self.cursor.peek()) {
                        self.cursor.next();
                    }
                    let text = self.cursor.slice_from(start);
                    let kind = match text {
                        "fn" => TokenKind::KwFn,
                        "let" => TokenKind::KwLet,
                        "match" => TokenKind::KwMatch,
                        "return" => TokenKind::KwReturn,
                        "yield" => TokenKind::KwYield,
                        _ => TokenKind::Ident(text),
                    };
                    return Ok(Token::new(kind, Span::new(start, self.cursor.position)));
                }
                _ => {
                    return Err(ParsingError::UnexpectedCharacter {
                        character: byte as char,
                        span: Span::single(start),
                    })
                }
            };
            return Ok(Token::new(kind, Span::new(start, self.cursor.position)));
        }
    }
}

fn is_ident_continue(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(src: &str) -> Vec<(TokenKind<'_>, Span)> {
        let mut lexer = Lexer::new(src);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next().unwrap();
            let done = token.kind == TokenKind::Eof;
            tokens.push((token.kind, token.span));
            if done {
                break;
            }
        }
        tokens
    }

    fn tokenize_without_spans(src: &str) -> Vec<TokenKind<'_>> {
        tokenize(src).into_iter().map(|(kind, _)| kind).collect()
    }

    #[test]
    fn spans() {
        let src = "fn foo\n  12";

        assert_eq!(
            tokenize(src),
            vec![
                (TokenKind::KwFn, Span::new(0, 2)),
                (TokenKind::Ident("foo"), Span::new(3, 6)),
                (TokenKind::IntLit(12), Span::new(9, 11)),
                (TokenKind::Eof, Span::marker(11)),
            ]
        );
    }

    #[test]
    fn keywords_and_identifiers() {
        let src = "fn let match return yield lettuce _x a1_b";

        assert_eq!(
            tokenize_without_spans(src),
            vec![
                TokenKind::KwFn,
                TokenKind::KwLet,
                TokenKind::KwMatch,
                TokenKind::KwReturn,
                TokenKind::KwYield,
                TokenKind::Ident("lettuce"),
                TokenKind::Ident("_x"),
                TokenKind::Ident("a1_b"),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn arrow_is_one_token() {
        let src = "= => ==>";

        assert_eq!(
            tokenize_without_spans(src),
            vec![
                TokenKind::Eq,
                TokenKind::Arrow,
                TokenKind::Eq,
                TokenKind::Arrow,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn comments_are_skipped() {
        let src = "1 // all of this 2 is skipped\n3 // and a comment at eof";

        assert_eq!(
            tokenize_without_spans(src),
            vec![TokenKind::IntLit(1), TokenKind::IntLit(3), TokenKind::Eof]
        );
    }

    #[test]
    fn function_header() {
        let src = "fn add(let a: u8, let b: u8): u8 {}";

        assert_eq!(
            tokenize_without_spans(src),
            vec![
                TokenKind::KwFn,
                TokenKind::Ident("add"),
                TokenKind::LeftParen,
                TokenKind::KwLet,
                TokenKind::Ident("a"),
                TokenKind::Colon,
                TokenKind::Ident("u8"),
                TokenKind::Comma,
                TokenKind::KwLet,
                TokenKind::Ident("b"),
                TokenKind::Colon,
                TokenKind::Ident("u8"),
                TokenKind::RightParen,
                TokenKind::Colon,
                TokenKind::Ident("u8"),
                TokenKind::LeftBrace,
                TokenKind::RightBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn peek_is_lazy() {
        let mut lexer = Lexer::new("1 2");
        assert_eq!(lexer.peek().unwrap().kind, TokenKind::IntLit(1));
        assert_eq!(lexer.peek().unwrap().kind, TokenKind::IntLit(1));
        assert_eq!(lexer.next().unwrap().kind, TokenKind::IntLit(1));
        assert!(lexer.has_next().unwrap());
        assert_eq!(lexer.next().unwrap().kind, TokenKind::IntLit(2));
        assert!(!lexer.has_next().unwrap());
    }

    #[test]
    fn unexpected_character() {
        let mut lexer = Lexer::new("1 # 2");
        assert_eq!(lexer.next().unwrap().kind, TokenKind::IntLit(1));
        let err = lexer.next().unwrap_err();
        assert!(matches!(
            err,
            ParsingError::UnexpectedCharacter { character: '#', .. }
        ));
    }

    #[test]
    fn single_slash_is_rejected() {
        let mut lexer = Lexer::new("1 / 2");
        assert_eq!(lexer.next().unwrap().kind, TokenKind::IntLit(1));
        assert!(matches!(
            lexer.next().unwrap_err(),
            ParsingError::UnexpectedCharacter { character: '/', .. }
        ));
    }
}
