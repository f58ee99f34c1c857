//! Expression Lexer
//!
//! Tokenizes a single field expression such as `str(max=5, exclude='x')`.

/// Token types in a field expression
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Validator name, keyword name, or bare literal (`true`, `None`)
    Ident,
    /// Quoted string; `text` holds the unescaped contents
    Str,
    /// Numeric literal as written
    Number,
    LParen,
    RParen,
    Comma,
    Equals,
}

/// A token with its text content and byte offset
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub offset: usize,
}

/// Tokenize an expression
pub fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some((start_idx, ch)) = chars.next() {
        let digit_follows = chars.peek().is_some_and(|&(_, next)| next.is_ascii_digit());
        let punct = |kind: TokenKind| Token {
            kind,
            text: ch.to_string(),
            offset: start_idx,
        };

        match ch {
            // Skip whitespace
            ' ' | '\t' | '\r' | '\n' => continue,

            '(' => tokens.push(punct(TokenKind::LParen)),
            ')' => tokens.push(punct(TokenKind::RParen)),
            ',' => tokens.push(punct(TokenKind::Comma)),
            '=' => tokens.push(punct(TokenKind::Equals)),

            // Quoted string with backslash escapes
            '\'' | '"' => {
                let quote = ch;
                let mut text = String::new();
                let mut closed = false;

                while let Some((_, next_ch)) = chars.next() {
                    match next_ch {
                        c if c == quote => {
                            closed = true;
                            break;
                        }
                        '\\' => match chars.next() {
                            Some((_, 'n')) => text.push('\n'),
                            Some((_, 't')) => text.push('\t'),
                            Some((_, escaped @ ('\\' | '\'' | '"'))) => text.push(escaped),
                            // Unknown escapes are kept verbatim so regex patterns survive
                            Some((_, other)) => {
                                text.push('\\');
                                text.push(other);
                            }
                            None => break,
                        },
                        c => text.push(c),
                    }
                }

                if !closed {
                    return Err(format!("unterminated string starting at offset {}", start_idx));
                }

                tokens.push(Token {
                    kind: TokenKind::Str,
                    text,
                    offset: start_idx,
                });
            }

            // Number, optionally signed
            c if c.is_ascii_digit() || ((c == '-' || c == '+') && digit_follows) => {
                let mut end_idx = start_idx + c.len_utf8();
                let mut prev = c;

                while let Some(&(idx, next_ch)) = chars.peek() {
                    let exponent_sign =
                        (next_ch == '-' || next_ch == '+') && matches!(prev, 'e' | 'E');
                    if next_ch.is_ascii_digit()
                        || next_ch == '.'
                        || next_ch == 'e'
                        || next_ch == 'E'
                        || exponent_sign
                    {
                        end_idx = idx + next_ch.len_utf8();
                        prev = next_ch;
                        chars.next();
                    } else {
                        break;
                    }
                }

                tokens.push(Token {
                    kind: TokenKind::Number,
                    text: input[start_idx..end_idx].to_string(),
                    offset: start_idx,
                });
            }

            // Identifier
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut end_idx = start_idx + 1;

                while let Some(&(idx, next_ch)) = chars.peek() {
                    if next_ch.is_ascii_alphanumeric() || next_ch == '_' {
                        end_idx = idx + 1;
                        chars.next();
                    } else {
                        break;
                    }
                }

                tokens.push(Token {
                    kind: TokenKind::Ident,
                    text: input[start_idx..end_idx].to_string(),
                    offset: start_idx,
                });
            }

            other => {
                return Err(format!(
                    "unexpected character '{}' at offset {}",
                    other, start_idx
                ));
            }
        }
    }

    Ok(tokens)
}
