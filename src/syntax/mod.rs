//! Field Expression Syntax
//!
//! Parses schema leaf expressions like `str(max=5)` or
//! `list(include('item'), min=1)` into compiled validators.

pub mod ast;
pub mod lexer;

pub use ast::{Call, Expr, Literal};
pub use lexer::{tokenize, Token, TokenKind};

use crate::error::SchemaError;
use crate::validators::{Validator, ValidatorRegistry};

/// Parse a field expression into a validator
///
/// Tokenizes the expression, builds the call tree and resolves every
/// call through `registry`. Any failure is reported as
/// [`SchemaError::Syntax`].
pub fn parse(expression: &str, registry: &ValidatorRegistry) -> Result<Validator, SchemaError> {
    tokenize(expression)
        .and_then(ast::tokens_to_call)
        .and_then(|call| registry.build(&call))
        .map_err(|detail| {
            SchemaError::Syntax(format!(
                "Invalid schema expression: '{}'. {}",
                expression, detail
            ))
        })
}
