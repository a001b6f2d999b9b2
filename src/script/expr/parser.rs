//! Parser for the expression language.
//!
//! Grammar (one definition per non-empty, non-comment line):
//!
//! ```text
//! definition := IDENT "(" params? ")" "=" expr ("," expr)*
//! expr       := or-chain with the usual precedence:
//!               ! unary-   then  * / %   then  + -
//!               then  < <= > >= == !=    then  &&   then  ||
//! primary    := literal | IDENT | IDENT "(" args ")" | "[" args "]" | "(" expr ")"
//! ```
//!
//! The comma-separated body of a definition is its positional output list.

use ordered_float::OrderedFloat;

use super::token::{Token, Tokenizer};
use crate::error::EngineError;
use crate::model::value::IoValue;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(IoValue),
    Var(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
    Array(Vec<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

/// One parsed function definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    pub name: String,
    pub params: Vec<String>,
    /// One expression per positional output.
    pub body: Vec<Expr>,
}

/// Parse a whole source blob: one definition per line, `#` comments and blank
/// lines skipped.
pub fn parse_source(source: &str) -> Result<Vec<Definition>, EngineError> {
    let mut definitions = Vec::new();
    for (line_number, line) in source.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let definition = parse_definition(line).map_err(|e| {
            EngineError::script(format!("Line {}: {}", line_number + 1, e))
        })?;
        definitions.push(definition);
    }
    Ok(definitions)
}

fn parse_definition(line: &str) -> Result<Definition, EngineError> {
    let tokens = Tokenizer::tokenize(line)?;
    let mut parser = Parser::new(tokens);

    let name = parser.expect_ident()?;
    parser.expect(Token::LParen)?;
    let mut params = Vec::new();
    if parser.peek() != Some(&Token::RParen) {
        loop {
            params.push(parser.expect_ident()?);
            if !parser.eat(Token::Comma) {
                break;
            }
        }
    }
    parser.expect(Token::RParen)?;
    parser.expect(Token::Assign)?;

    let mut body = vec![parser.expression(0)?];
    while parser.eat(Token::Comma) {
        body.push(parser.expression(0)?);
    }
    parser.expect_end()?;

    Ok(Definition { name, params, body })
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, token: Token) -> bool {
        if self.peek() == Some(&token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token) -> Result<(), EngineError> {
        match self.advance() {
            Some(t) if t == token => Ok(()),
            other => Err(EngineError::script(format!(
                "Expected {:?}, found {:?}",
                token, other
            ))),
        }
    }

    fn expect_ident(&mut self) -> Result<String, EngineError> {
        match self.advance() {
            Some(Token::Ident(name)) => Ok(name),
            other => Err(EngineError::script(format!(
                "Expected identifier, found {:?}",
                other
            ))),
        }
    }

    fn expect_end(&mut self) -> Result<(), EngineError> {
        match self.peek() {
            None => Ok(()),
            Some(t) => Err(EngineError::script(format!(
                "Unexpected trailing token {:?}",
                t
            ))),
        }
    }

    /// Pratt expression parser.
    fn expression(&mut self, min_power: u8) -> Result<Expr, EngineError> {
        let mut lhs = self.prefix()?;

        while let Some(op) = self.peek().and_then(binary_op) {
            let power = binding_power(op);
            if power < min_power {
                break;
            }
            self.pos += 1;
            let rhs = self.expression(power + 1)?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn prefix(&mut self) -> Result<Expr, EngineError> {
        match self.advance() {
            Some(Token::Integer(i)) => Ok(Expr::Literal(IoValue::Integer(i))),
            Some(Token::Number(n)) => Ok(Expr::Literal(IoValue::Number(OrderedFloat(n)))),
            Some(Token::Str(s)) => Ok(Expr::Literal(IoValue::String(s))),
            Some(Token::True) => Ok(Expr::Literal(IoValue::Boolean(true))),
            Some(Token::False) => Ok(Expr::Literal(IoValue::Boolean(false))),
            Some(Token::Null) => Ok(Expr::Literal(IoValue::Null)),
            Some(Token::Minus) => Ok(Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(self.prefix()?),
            }),
            Some(Token::Bang) => Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(self.prefix()?),
            }),
            Some(Token::LParen) => {
                let expr = self.expression(0)?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            Some(Token::LBracket) => {
                let mut items = Vec::new();
                if self.peek() != Some(&Token::RBracket) {
                    loop {
                        items.push(self.expression(0)?);
                        if !self.eat(Token::Comma) {
                            break;
                        }
                    }
                }
                self.expect(Token::RBracket)?;
                Ok(Expr::Array(items))
            }
            Some(Token::Ident(name)) => {
                if self.eat(Token::LParen) {
                    let mut args = Vec::new();
                    if self.peek() != Some(&Token::RParen) {
                        loop {
                            args.push(self.expression(0)?);
                            if !self.eat(Token::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(Token::RParen)?;
                    Ok(Expr::Call { name, args })
                } else {
                    Ok(Expr::Var(name))
                }
            }
            other => Err(EngineError::script(format!(
                "Unexpected token {:?} in expression",
                other
            ))),
        }
    }
}

fn binary_op(token: &Token) -> Option<BinaryOp> {
    match token {
        Token::Plus => Some(BinaryOp::Add),
        Token::Minus => Some(BinaryOp::Sub),
        Token::Star => Some(BinaryOp::Mul),
        Token::Slash => Some(BinaryOp::Div),
        Token::Percent => Some(BinaryOp::Rem),
        Token::Lt => Some(BinaryOp::Lt),
        Token::Le => Some(BinaryOp::Le),
        Token::Gt => Some(BinaryOp::Gt),
        Token::Ge => Some(BinaryOp::Ge),
        Token::EqEq => Some(BinaryOp::Eq),
        Token::NotEq => Some(BinaryOp::Ne),
        Token::AndAnd => Some(BinaryOp::And),
        Token::OrOr => Some(BinaryOp::Or),
        _ => None,
    }
}

fn binding_power(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::Or => 1,
        BinaryOp::And => 2,
        BinaryOp::Lt
        | BinaryOp::Le
        | BinaryOp::Gt
        | BinaryOp::Ge
        | BinaryOp::Eq
        | BinaryOp::Ne => 3,
        BinaryOp::Add | BinaryOp::Sub => 4,
        BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_definition() {
        let defs = parse_source("double(x) = x * 2").unwrap();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "double");
        assert_eq!(defs[0].params, vec!["x".to_string()]);
        assert_eq!(defs[0].body.len(), 1);
    }

    #[test]
    fn test_parse_multi_output_body() {
        let defs = parse_source("stats(a, b) = a + b, a - b").unwrap();
        assert_eq!(defs[0].body.len(), 2);
    }

    #[test]
    fn test_parse_skips_comments_and_blank_lines() {
        let source = "# doubles the input\n\ndouble(x) = x * 2\n";
        let defs = parse_source(source).unwrap();
        assert_eq!(defs.len(), 1);
    }

    #[test]
    fn test_precedence() {
        let defs = parse_source("f(x) = 1 + x * 2").unwrap();
        match &defs[0].body[0] {
            Expr::Binary { op: BinaryOp::Add, rhs, .. } => match rhs.as_ref() {
                Expr::Binary { op: BinaryOp::Mul, .. } => {}
                other => panic!("Expected multiplication on the right, got {:?}", other),
            },
            other => panic!("Expected addition at the top, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_error_reports_line() {
        let err = parse_source("ok(x) = x\nbroken(x) = *").unwrap_err();
        assert!(err.to_string().contains("Line 2"));
    }
}
