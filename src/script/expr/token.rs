//! Tokenizer for the expression language.

use std::iter::Peekable;
use std::str::Chars;

use crate::error::EngineError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Number(f64),
    Integer(i64),
    Str(String),
    True,
    False,
    Null,

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    NotEq,
    AndAnd,
    OrOr,
    Bang,
    Assign,

    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
}

pub struct Tokenizer<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
        }
    }

    /// Tokenize the whole input.
    pub fn tokenize(input: &'a str) -> Result<Vec<Token>, EngineError> {
        let mut tokenizer = Self::new(input);
        let mut tokens = Vec::new();
        while let Some(token) = tokenizer.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Option<Token>, EngineError> {
        while matches!(self.chars.peek(), Some(c) if c.is_whitespace()) {
            self.chars.next();
        }

        let Some(&c) = self.chars.peek() else {
            return Ok(None);
        };

        let token = match c {
            '(' => self.single(Token::LParen),
            ')' => self.single(Token::RParen),
            '[' => self.single(Token::LBracket),
            ']' => self.single(Token::RBracket),
            ',' => self.single(Token::Comma),
            '+' => self.single(Token::Plus),
            '-' => self.single(Token::Minus),
            '*' => self.single(Token::Star),
            '/' => self.single(Token::Slash),
            '%' => self.single(Token::Percent),
            '<' => self.maybe_eq(Token::Lt, Token::Le),
            '>' => self.maybe_eq(Token::Gt, Token::Ge),
            '=' => self.maybe_eq(Token::Assign, Token::EqEq),
            '!' => self.maybe_eq(Token::Bang, Token::NotEq),
            '&' => self.pair('&', Token::AndAnd)?,
            '|' => self.pair('|', Token::OrOr)?,
            '"' | '\'' => self.string(c)?,
            c if c.is_ascii_digit() => self.number()?,
            c if c.is_alphabetic() || c == '_' => self.ident(),
            other => {
                return Err(EngineError::script(format!(
                    "Unexpected character '{}' in expression",
                    other
                )));
            }
        };
        Ok(Some(token))
    }

    fn single(&mut self, token: Token) -> Token {
        self.chars.next();
        token
    }

    fn maybe_eq(&mut self, bare: Token, with_eq: Token) -> Token {
        self.chars.next();
        if self.chars.peek() == Some(&'=') {
            self.chars.next();
            with_eq
        } else {
            bare
        }
    }

    fn pair(&mut self, expected: char, token: Token) -> Result<Token, EngineError> {
        self.chars.next();
        if self.chars.next() == Some(expected) {
            Ok(token)
        } else {
            Err(EngineError::script(format!(
                "Expected '{}{}' in expression",
                expected, expected
            )))
        }
    }

    fn string(&mut self, quote: char) -> Result<Token, EngineError> {
        self.chars.next();
        let mut text = String::new();
        loop {
            match self.chars.next() {
                Some(c) if c == quote => break,
                Some('\\') => match self.chars.next() {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some(c) => text.push(c),
                    None => return Err(EngineError::script("Unterminated string literal")),
                },
                Some(c) => text.push(c),
                None => return Err(EngineError::script("Unterminated string literal")),
            }
        }
        Ok(Token::Str(text))
    }

    fn number(&mut self) -> Result<Token, EngineError> {
        let mut text = String::new();
        let mut is_float = false;
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.chars.next();
            } else if c == '.' && !is_float {
                is_float = true;
                text.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        if is_float {
            text.parse::<f64>()
                .map(Token::Number)
                .map_err(|_| EngineError::script(format!("Invalid number literal '{}'", text)))
        } else {
            text.parse::<i64>()
                .map(Token::Integer)
                .map_err(|_| EngineError::script(format!("Invalid number literal '{}'", text)))
        }
    }

    fn ident(&mut self) -> Token {
        let mut text = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' {
                text.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        match text.as_str() {
            "true" => Token::True,
            "false" => Token::False,
            "null" => Token::Null,
            _ => Token::Ident(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_arithmetic() {
        let tokens = Tokenizer::tokenize("x * 2 + 1.5").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("x".to_string()),
                Token::Star,
                Token::Integer(2),
                Token::Plus,
                Token::Number(1.5),
            ]
        );
    }

    #[test]
    fn test_tokenize_comparison_and_strings() {
        let tokens = Tokenizer::tokenize("a >= 'hi' != \"b\"").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("a".to_string()),
                Token::Ge,
                Token::Str("hi".to_string()),
                Token::NotEq,
                Token::Str("b".to_string()),
            ]
        );
    }

    #[test]
    fn test_tokenize_rejects_stray_characters() {
        assert!(Tokenizer::tokenize("a ? b").is_err());
        assert!(Tokenizer::tokenize("a & b").is_err());
        assert!(Tokenizer::tokenize("'unterminated").is_err());
    }
}
