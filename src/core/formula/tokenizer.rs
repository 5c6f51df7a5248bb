//! Formula tokenizer
//!
//! Converts a resolved formula such as `[price] + 500` into tokens. Column
//! references arrive bracketed (see `resolver`); any bare identifier left in
//! the text is a name the resolver did not recognise.

use std::iter::Peekable;
use std::str::Chars;

use super::coercion::CoercedAdd;

/// A token in a formula expression
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Integer literal (e.g., 30)
    Integer(i64),
    /// Float literal (e.g., 1.5, 2e3)
    Float(f64),
    /// String literal (e.g., "km" or 'km')
    Text(String),
    /// Resolved column reference: `[name]`, with `]]` standing for `]`
    Column(String),
    /// Bare word that did not resolve to a column
    Identifier(String),
    /// The only binary operator
    Plus,
    OpenParen,
    CloseParen,
    /// `[A] + [B]` rewritten by the coercion engine
    Coerced(CoercedAdd),
}

/// Error during tokenization
#[derive(Debug, Clone, PartialEq)]
pub struct TokenizeError {
    pub message: String,
    pub position: usize,
}

impl TokenizeError {
    fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

impl std::fmt::Display for TokenizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Tokenize error at position {}: {}",
            self.position, self.message
        )
    }
}

impl std::error::Error for TokenizeError {}

/// Tokenizer for formula expressions
pub struct Tokenizer<'a> {
    chars: Peekable<Chars<'a>>,
    position: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(formula: &'a str) -> Self {
        // Spreadsheet habit: a leading '=' is allowed and ignored
        let formula = formula.trim_start();
        let formula = formula.strip_prefix('=').unwrap_or(formula);
        Self {
            chars: formula.chars().peekable(),
            position: 0,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, TokenizeError> {
        let mut tokens = Vec::new();

        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }

        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Option<Token>, TokenizeError> {
        self.skip_whitespace();

        let Some(c) = self.peek() else {
            return Ok(None);
        };

        let token = match c {
            '"' | '\'' => self.read_string()?,
            '[' => self.read_column()?,
            '(' => {
                self.advance();
                Token::OpenParen
            }
            ')' => {
                self.advance();
                Token::CloseParen
            }
            '+' => {
                self.advance();
                Token::Plus
            }
            '-' | '*' | '/' | '^' | '%' | '&' | '=' | '<' | '>' => {
                return Err(TokenizeError::new(
                    format!("Unsupported operator '{}': only '+' is supported", c),
                    self.position,
                ));
            }
            c if c.is_ascii_digit() => self.read_number()?,
            c if c.is_alphabetic() || c == '_' => self.read_identifier(),
            c => {
                return Err(TokenizeError::new(
                    format!("Unexpected character: '{}'", c),
                    self.position,
                ));
            }
        };
        Ok(Some(token))
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next();
        if c.is_some() {
            self.position += 1;
        }
        c
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    /// Read until `close`, treating a doubled `close` as an escaped literal
    fn read_delimited(&mut self, close: char, what: &str) -> Result<String, TokenizeError> {
        let start_pos = self.position;
        self.advance(); // opening delimiter
        let mut value = String::new();

        loop {
            match self.advance() {
                None => {
                    return Err(TokenizeError::new(format!("Unterminated {}", what), start_pos));
                }
                Some(c) if c == close => {
                    if self.peek() == Some(close) {
                        value.push(close);
                        self.advance();
                    } else {
                        break;
                    }
                }
                Some(c) => value.push(c),
            }
        }

        Ok(value)
    }

    fn read_string(&mut self) -> Result<Token, TokenizeError> {
        let quote = self.peek().unwrap_or('"');
        self.read_delimited(quote, "string literal").map(Token::Text)
    }

    fn read_column(&mut self) -> Result<Token, TokenizeError> {
        self.read_delimited(']', "column reference")
            .map(Token::Column)
    }

    /// Read a number (integer, decimal, or scientific notation)
    fn read_number(&mut self) -> Result<Token, TokenizeError> {
        let start_pos = self.position;
        let mut num_str = String::new();
        let mut is_float = false;

        self.read_digits(&mut num_str);

        if self.peek() == Some('.') {
            is_float = true;
            num_str.push('.');
            self.advance();
            self.read_digits(&mut num_str);
        }

        if let Some(e @ ('e' | 'E')) = self.peek() {
            is_float = true;
            num_str.push(e);
            self.advance();
            if let Some(sign @ ('+' | '-')) = self.peek() {
                num_str.push(sign);
                self.advance();
            }
            self.read_digits(&mut num_str);
        }

        let invalid = || TokenizeError::new(format!("Invalid number: {}", num_str), start_pos);
        if is_float {
            num_str.parse::<f64>().map(Token::Float).map_err(|_| invalid())
        } else {
            num_str.parse::<i64>().map(Token::Integer).map_err(|_| invalid())
        }
    }

    fn read_digits(&mut self, out: &mut String) {
        while let Some(c) = self.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            out.push(c);
            self.advance();
        }
    }

    fn read_identifier(&mut self) -> Token {
        let mut ident = String::new();

        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '.' {
                ident.push(c);
                self.advance();
            } else {
                break;
            }
        }

        Token::Identifier(ident)
    }
}

/// Convenience function to tokenize a formula string
pub fn tokenize(formula: &str) -> Result<Vec<Token>, TokenizeError> {
    Tokenizer::new(formula).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str) -> Token {
        Token::Column(name.to_string())
    }

    #[test]
    fn test_tokenize_numbers() {
        assert_eq!(tokenize("42").unwrap(), vec![Token::Integer(42)]);
        assert_eq!(tokenize("3.5").unwrap(), vec![Token::Float(3.5)]);
        assert_eq!(tokenize("2E-5").unwrap(), vec![Token::Float(2e-5)]);
    }

    #[test]
    fn test_tokenize_string_literals() {
        assert_eq!(
            tokenize("'km' + \"say \"\"hi\"\"\"").unwrap(),
            vec![
                Token::Text("km".to_string()),
                Token::Plus,
                Token::Text("say \"hi\"".to_string()),
            ]
        );
    }

    #[test]
    fn test_tokenize_column_references() {
        assert_eq!(
            tokenize("[date_posted] + [days on market]").unwrap(),
            vec![col("date_posted"), Token::Plus, col("days on market")]
        );
    }

    #[test]
    fn test_tokenize_escaped_bracket_in_name() {
        assert_eq!(tokenize("[a]]b]").unwrap(), vec![col("a]b")]);
    }

    #[test]
    fn test_tokenize_bare_identifier() {
        assert_eq!(
            tokenize("nonexistent_col + 1").unwrap(),
            vec![
                Token::Identifier("nonexistent_col".to_string()),
                Token::Plus,
                Token::Integer(1),
            ]
        );
    }

    #[test]
    fn test_tokenize_equals_prefix_and_parens() {
        assert_eq!(
            tokenize("=([a] + 1)").unwrap(),
            vec![
                Token::OpenParen,
                col("a"),
                Token::Plus,
                Token::Integer(1),
                Token::CloseParen,
            ]
        );
    }

    #[test]
    fn test_tokenize_rejects_other_operators() {
        let err = tokenize("[a] - [b]").unwrap_err();
        assert!(err.message.contains("only '+'"));
        assert_eq!(err.position, 4);
    }

    #[test]
    fn test_tokenize_unterminated() {
        assert!(tokenize("[price").unwrap_err().message.contains("Unterminated"));
        assert!(tokenize("'abc").unwrap_err().message.contains("Unterminated"));
    }

    #[test]
    fn test_tokenize_empty() {
        assert_eq!(tokenize("   ").unwrap(), vec![]);
    }
}
