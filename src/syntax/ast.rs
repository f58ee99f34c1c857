//! Expression AST
//!
//! Recursive-descent parser turning expression tokens into a call tree.
//! Validator names are not resolved here; that is the registry's job.

use std::fmt;

use serde_json::Value;

use super::lexer::{Token, TokenKind};

/// A literal argument value
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl Literal {
    /// Whether a data value equals this literal
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Literal::Str(s) => value.as_str() == Some(s.as_str()),
            Literal::Int(i) => value.as_i64() == Some(*i),
            Literal::Float(f) => value.is_number() && value.as_f64() == Some(*f),
            Literal::Bool(b) => value.as_bool() == Some(*b),
            Literal::Null => value.is_null(),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Str(s) => write!(f, "'{}'", s),
            Literal::Int(i) => write!(f, "{}", i),
            Literal::Float(x) => write!(f, "{}", x),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Null => f.write_str("null"),
        }
    }
}

/// Argument expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Call(Call),
}

/// A validator call like `str(max=5)`
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub name: String,
    pub args: Vec<Expr>,
    pub kwargs: Vec<(String, Expr)>,
}

/// Parse a token stream that must contain exactly one call
pub fn tokens_to_call(tokens: Vec<Token>) -> Result<Call, String> {
    let mut parser = Parser { tokens, pos: 0 };
    let call = parser.call()?;

    if let Some(extra) = parser.peek() {
        return Err(format!(
            "unexpected '{}' after expression at offset {}",
            extra.text, extra.offset
        ));
    }

    Ok(call)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind_at(&self, ahead: usize) -> Option<&TokenKind> {
        self.tokens.get(self.pos + ahead).map(|t| &t.kind)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, String> {
        match self.advance() {
            Some(token) if token.kind == kind => Ok(token),
            Some(token) => Err(format!(
                "expected {} but found '{}' at offset {}",
                what, token.text, token.offset
            )),
            None => Err(format!("expected {} but reached end of expression", what)),
        }
    }

    fn call(&mut self) -> Result<Call, String> {
        let name = self.expect(TokenKind::Ident, "a validator name")?.text;
        self.expect(TokenKind::LParen, "'('")?;

        let mut call = Call {
            name,
            args: Vec::new(),
            kwargs: Vec::new(),
        };

        loop {
            if self.peek_kind_at(0) == Some(&TokenKind::RParen) {
                self.advance();
                break;
            }

            let is_keyword = self.peek_kind_at(0) == Some(&TokenKind::Ident)
                && self.peek_kind_at(1) == Some(&TokenKind::Equals);

            if is_keyword {
                let key = self.expect(TokenKind::Ident, "a keyword")?;
                self.advance();
                if call.kwargs.iter().any(|(existing, _)| *existing == key.text) {
                    return Err(format!("keyword argument '{}' repeated", key.text));
                }
                let value = self.value()?;
                call.kwargs.push((key.text, value));
            } else {
                if !call.kwargs.is_empty() {
                    let offset = self.peek().map(|t| t.offset).unwrap_or_default();
                    return Err(format!(
                        "positional argument follows keyword argument at offset {}",
                        offset
                    ));
                }
                let value = self.value()?;
                call.args.push(value);
            }

            match self.advance() {
                Some(token) if token.kind == TokenKind::Comma => continue,
                Some(token) if token.kind == TokenKind::RParen => break,
                Some(token) => {
                    return Err(format!(
                        "expected ',' or ')' but found '{}' at offset {}",
                        token.text, token.offset
                    ));
                }
                None => return Err(format!("unclosed call to '{}'", call.name)),
            }
        }

        Ok(call)
    }

    fn value(&mut self) -> Result<Expr, String> {
        let token = match self.peek() {
            Some(token) => token.clone(),
            None => return Err("expected a value but reached end of expression".to_string()),
        };

        match token.kind {
            TokenKind::Ident if self.peek_kind_at(1) == Some(&TokenKind::LParen) => {
                Ok(Expr::Call(self.call()?))
            }
            TokenKind::Ident => {
                self.advance();
                let literal = match token.text.as_str() {
                    "true" | "True" => Literal::Bool(true),
                    "false" | "False" => Literal::Bool(false),
                    "null" | "None" => Literal::Null,
                    other => {
                        return Err(format!(
                            "unknown name '{}' at offset {}",
                            other, token.offset
                        ));
                    }
                };
                Ok(Expr::Literal(literal))
            }
            TokenKind::Str => {
                self.advance();
                Ok(Expr::Literal(Literal::Str(token.text)))
            }
            TokenKind::Number => {
                self.advance();
                parse_number(&token).map(Expr::Literal)
            }
            _ => Err(format!(
                "expected a value but found '{}' at offset {}",
                token.text, token.offset
            )),
        }
    }
}

fn parse_number(token: &Token) -> Result<Literal, String> {
    let text = token.text.strip_prefix('+').unwrap_or(&token.text);

    if let Ok(int) = text.parse::<i64>() {
        return Ok(Literal::Int(int));
    }

    text.parse::<f64>()
        .map(Literal::Float)
        .map_err(|_| format!("invalid number '{}' at offset {}", token.text, token.offset))
}
