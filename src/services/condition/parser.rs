//! Lexer and recursive-descent parser for the condition language.
//!
//! ```text
//! condition := term ( ( 'or' | 'and' ) term )*
//! term      := 'not'? ( '(' condition ')' | function )
//! function  := name '(' quoted ( ',' arg )* ')'
//! ```

use std::fmt;

use crate::error::{Error, Result};

/// Comparison operator accepted by `version()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Comparison::Eq => "==",
            Comparison::Ne => "!=",
            Comparison::Lt => "<",
            Comparison::Gt => ">",
            Comparison::Le => "<=",
            Comparison::Ge => ">=",
        };
        write!(f, "{text}")
    }
}

/// A predicate function call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Function {
    FilePresent(String),
    Active(String),
    Many(String),
    ManyActive(String),
    IsMaster(String),
    Checksum(String, u32),
    Version {
        path: String,
        version: String,
        comparison: Comparison,
    },
}

/// Parsed condition AST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Function(Function),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    LParen,
    RParen,
    Comma,
    Quoted(String),
    Ident(String),
    Hex(u32),
    Comparison(Comparison),
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
            Token::Quoted(s) => write!(f, "\"{s}\""),
            Token::Ident(s) => write!(f, "{s}"),
            Token::Hex(v) => write!(f, "{v:X}"),
            Token::Comparison(c) => write!(f, "{c}"),
            Token::Eof => write!(f, "end of input"),
        }
    }
}

struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Lexer {
            input: input.as_bytes(),
            pos: 0,
        }
    }

    fn current(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.current();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.current(), Some(ch) if ch.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn next_token(&mut self) -> std::result::Result<Token, String> {
        self.skip_whitespace();
        let Some(ch) = self.current() else {
            return Ok(Token::Eof);
        };

        match ch {
            b'(' => {
                self.advance();
                Ok(Token::LParen)
            }
            b')' => {
                self.advance();
                Ok(Token::RParen)
            }
            b',' => {
                self.advance();
                Ok(Token::Comma)
            }
            b'"' => {
                self.advance();
                let start = self.pos;
                while let Some(ch) = self.current() {
                    if ch == b'"' {
                        let text = String::from_utf8_lossy(&self.input[start..self.pos]).into_owned();
                        self.advance();
                        return Ok(Token::Quoted(text));
                    }
                    self.advance();
                }
                Err("unterminated quoted string".to_string())
            }
            b'=' | b'!' | b'<' | b'>' => self.comparison(),
            _ if ch.is_ascii_alphabetic() || ch == b'_' => {
                let start = self.pos;
                while matches!(self.current(), Some(c) if c.is_ascii_alphanumeric() || c == b'_') {
                    self.pos += 1;
                }
                let text = String::from_utf8_lossy(&self.input[start..self.pos]).into_owned();
                Ok(Token::Ident(text))
            }
            _ if ch.is_ascii_hexdigit() => {
                let start = self.pos;
                while matches!(self.current(), Some(c) if c.is_ascii_hexdigit()) {
                    self.pos += 1;
                }
                let text = String::from_utf8_lossy(&self.input[start..self.pos]).into_owned();
                u32::from_str_radix(&text, 16)
                    .map(Token::Hex)
                    .map_err(|_| format!("checksum literal \"{text}\" does not fit in 32 bits"))
            }
            _ => Err(format!("unexpected character '{}'", ch as char)),
        }
    }

    fn comparison(&mut self) -> std::result::Result<Token, String> {
        let first = self.advance().unwrap_or(b' ');
        let second = self.current();
        let comparison = match (first, second) {
            (b'=', Some(b'=')) => {
                self.advance();
                Comparison::Eq
            }
            (b'!', Some(b'=')) => {
                self.advance();
                Comparison::Ne
            }
            (b'<', Some(b'=')) => {
                self.advance();
                Comparison::Le
            }
            (b'>', Some(b'=')) => {
                self.advance();
                Comparison::Ge
            }
            (b'<', _) => Comparison::Lt,
            (b'>', _) => Comparison::Gt,
            _ => return Err(format!("unexpected character '{}'", first as char)),
        };
        Ok(Token::Comparison(comparison))
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: &Token) -> std::result::Result<(), String> {
        let token = self.advance();
        if &token == expected {
            Ok(())
        } else {
            Err(format!("expected {expected}, found {token}"))
        }
    }

    fn condition(&mut self) -> std::result::Result<Expr, String> {
        let mut expr = self.term()?;
        loop {
            match self.current() {
                Token::Ident(word) if word == "and" => {
                    self.advance();
                    let rhs = self.term()?;
                    expr = Expr::And(Box::new(expr), Box::new(rhs));
                }
                Token::Ident(word) if word == "or" => {
                    self.advance();
                    let rhs = self.term()?;
                    expr = Expr::Or(Box::new(expr), Box::new(rhs));
                }
                _ => return Ok(expr),
            }
        }
    }

    fn term(&mut self) -> std::result::Result<Expr, String> {
        if matches!(self.current(), Token::Ident(word) if word == "not") {
            self.advance();
            let inner = self.term_body()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.term_body()
    }

    fn term_body(&mut self) -> std::result::Result<Expr, String> {
        if self.current() == &Token::LParen {
            self.advance();
            let inner = self.condition()?;
            self.expect(&Token::RParen)?;
            return Ok(inner);
        }
        self.function().map(Expr::Function)
    }

    fn function(&mut self) -> std::result::Result<Function, String> {
        let name = match self.advance() {
            Token::Ident(name) => name,
            token => return Err(format!("expected a function name, found {token}")),
        };
        self.expect(&Token::LParen)?;
        let first = self.quoted()?;

        let function = match name.as_str() {
            "file" => Function::FilePresent(first),
            "active" => Function::Active(first),
            "many" => Function::Many(first),
            "many_active" => Function::ManyActive(first),
            "is_master" => Function::IsMaster(first),
            "checksum" => {
                self.expect(&Token::Comma)?;
                // A literal of only hex letters (e.g. DEADBEEF) lexes as an
                // identifier, so both token shapes are accepted here.
                let crc = match self.advance() {
                    Token::Hex(value) => value,
                    Token::Ident(text) => u32::from_str_radix(&text, 16).map_err(|_| {
                        format!("expected a checksum literal, found \"{text}\"")
                    })?,
                    token => return Err(format!("expected a checksum literal, found {token}")),
                };
                Function::Checksum(first, crc)
            }
            "version" => {
                self.expect(&Token::Comma)?;
                let version = self.quoted()?;
                self.expect(&Token::Comma)?;
                let comparison = match self.advance() {
                    Token::Comparison(comparison) => comparison,
                    token => {
                        return Err(format!("expected a comparison operator, found {token}"))
                    }
                };
                Function::Version {
                    path: first,
                    version,
                    comparison,
                }
            }
            other => return Err(format!("unknown function \"{other}\"")),
        };
        self.expect(&Token::RParen)?;
        Ok(function)
    }

    fn quoted(&mut self) -> std::result::Result<String, String> {
        match self.advance() {
            Token::Quoted(text) => Ok(text),
            token => Err(format!("expected a quoted string, found {token}")),
        }
    }
}

/// Parse a condition string into an AST.
pub fn parse(condition: &str) -> Result<Expr> {
    let fail = |reason: String| Error::ConditionSyntax {
        condition: condition.to_string(),
        reason,
    };

    let mut lexer = Lexer::new(condition);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token().map_err(fail)?;
        let done = token == Token::Eof;
        tokens.push(token);
        if done {
            break;
        }
    }

    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.condition().map_err(fail)?;
    if parser.current() != &Token::Eof {
        return Err(fail(format!(
            "unexpected trailing input at \"{}\"",
            parser.current()
        )));
    }
    Ok(expr)
}

/// Check that a condition string parses, without keeping the AST.
pub fn validate(condition: &str) -> Result<()> {
    parse(condition).map(|_| ())
}
