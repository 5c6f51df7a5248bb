//! Formula parser
//!
//! Builds the AST from coerced tokens. The grammar:
//!
//! ```text
//! expression := operand ( "+" operand )*
//! operand    := INTEGER | FLOAT | TEXT | COLUMN | COERCED | "(" expression ")"
//! ```
//!
//! `+` is left-associative.

use std::fmt;

use super::coercion::CoercedAdd;
use super::resolver::reference;
use super::tokenizer::Token;

/// Abstract Syntax Tree node for formula expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Integer(i64),
    Float(f64),
    Text(String),
    Column(String),
    Add { left: Box<Expr>, right: Box<Expr> },
    Coerced(CoercedAdd),
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Integer(n) => write!(f, "{}", n),
            Expr::Float(n) => write!(f, "{:?}", n),
            Expr::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Expr::Column(name) => f.write_str(&reference(name)),
            Expr::Add { left, right } => match right.as_ref() {
                Expr::Add { .. } => write!(f, "{} + ({})", left, right),
                _ => write!(f, "{} + {}", left, right),
            },
            Expr::Coerced(coerced) => write!(f, "{}", coerced),
        }
    }
}

/// Error during parsing
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Parse error at token {}: {}",
            self.position, self.message
        )
    }
}

impl std::error::Error for ParseError {}

/// Parser for formula tokens
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    pub fn parse(mut self) -> Result<Expr, ParseError> {
        if self.tokens.is_empty() {
            return Err(ParseError::new("Empty expression", 0));
        }
        let expr = self.expression()?;

        if let Some(token) = self.peek() {
            return Err(ParseError::new(
                format!("Unexpected token after expression: {:?}", token),
                self.position,
            ));
        }

        Ok(expr)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn match_token(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    /// Expression: operand ( "+" operand )*
    fn expression(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.operand()?;

        while self.match_token(&Token::Plus) {
            let right = self.operand()?;
            left = Expr::Add {
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn operand(&mut self) -> Result<Expr, ParseError> {
        let position = self.position;
        match self.advance() {
            Some(Token::Integer(n)) => Ok(Expr::Integer(n)),
            Some(Token::Float(n)) => Ok(Expr::Float(n)),
            Some(Token::Text(s)) => Ok(Expr::Text(s)),
            Some(Token::Column(name)) => Ok(Expr::Column(name)),
            Some(Token::Coerced(coerced)) => Ok(Expr::Coerced(coerced)),
            Some(Token::OpenParen) => {
                let expr = self.expression()?;
                if !self.match_token(&Token::CloseParen) {
                    return Err(ParseError::new(
                        "Expected ')' after expression",
                        self.position,
                    ));
                }
                Ok(expr)
            }
            Some(Token::Identifier(name)) => Err(ParseError::new(
                format!("Unknown name '{}'", name),
                position,
            )),
            Some(token) => Err(ParseError::new(
                format!("Unexpected token: {:?}", token),
                position,
            )),
            None => Err(ParseError::new("Unexpected end of expression", position)),
        }
    }
}

/// Convenience function to parse tokens into an AST
pub fn parse(tokens: Vec<Token>) -> Result<Expr, ParseError> {
    Parser::new(tokens).parse()
}
