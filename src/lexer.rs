use crate::error::{ExprError, ExprResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span {
    pub(crate) start: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Ident(String),
    /// Unsigned; the parser applies a leading minus so that `-9223372036854775808` fits.
    Int(u64),
    Float(f64),
    Str(String),
    True,
    False,
    None,
    And,
    Or,
    Not,

    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Colon,

    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    EqEq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    Eof,
}

impl TokenKind {
    /// Spelling of keyword tokens, which may still appear as attribute names after a `.`.
    pub(crate) fn keyword_text(&self) -> Option<&'static str> {
        match self {
            Self::True => Some("True"),
            Self::False => Some("False"),
            Self::None => Some("None"),
            Self::And => Some("and"),
            Self::Or => Some("or"),
            Self::Not => Some("not"),
            _ => None,
        }
    }
}

/// Whether `s` lexes as a single identifier or keyword token.
pub(crate) fn is_name(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub(crate) fn lex(input: &str) -> ExprResult<Vec<Token>> {
    let mut out = Vec::new();
    let bytes = input.as_bytes();
    let mut i = 0usize;

    while i < bytes.len() {
        let c = bytes[i] as char;
        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        let start = i;

        // Number: [0-9]+(.[0-9]+)?([eE][+-]?[0-9]+)? or .[0-9]+([eE][+-]?[0-9]+)?
        if c.is_ascii_digit()
            || (c == '.' && i + 1 < bytes.len() && (bytes[i + 1] as char).is_ascii_digit())
        {
            let mut is_float = false;
            if c == '.' {
                is_float = true;
                i += 1;
            } else {
                while i < bytes.len() && (bytes[i] as char).is_ascii_digit() {
                    i += 1;
                }
                if i < bytes.len()
                    && (bytes[i] as char) == '.'
                    && i + 1 < bytes.len()
                    && (bytes[i + 1] as char).is_ascii_digit()
                {
                    is_float = true;
                    i += 1;
                }
            }

            while i < bytes.len() && (bytes[i] as char).is_ascii_digit() {
                i += 1;
            }

            if i < bytes.len() && matches!(bytes[i] as char, 'e' | 'E') {
                let e_pos = i;
                is_float = true;
                i += 1;
                if i < bytes.len() && matches!(bytes[i] as char, '+' | '-') {
                    i += 1;
                }
                let exp_start = i;
                while i < bytes.len() && (bytes[i] as char).is_ascii_digit() {
                    i += 1;
                }
                if exp_start == i {
                    return Err(ExprError::parse(
                        e_pos,
                        "invalid number exponent (expected digits)",
                    ));
                }
            }

            let s = &input[start..i];
            let kind = if is_float {
                TokenKind::Float(
                    s.parse()
                        .map_err(|_| ExprError::parse(start, "invalid number"))?,
                )
            } else {
                TokenKind::Int(
                    s.parse()
                        .map_err(|_| ExprError::parse(start, "integer literal out of range"))?,
                )
            };
            out.push(Token {
                kind,
                span: Span { start },
            });
            continue;
        }

        if c == '\'' || c == '"' {
            let (value, end) = lex_string(input, start)?;
            i = end;
            out.push(Token {
                kind: TokenKind::Str(value),
                span: Span { start },
            });
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            i += 1;
            while i < bytes.len() {
                let ch = bytes[i] as char;
                if ch.is_ascii_alphanumeric() || ch == '_' {
                    i += 1;
                } else {
                    break;
                }
            }
            let s = &input[start..i];
            let kind = match s {
                "True" => TokenKind::True,
                "False" => TokenKind::False,
                "None" => TokenKind::None,
                "and" => TokenKind::And,
                "or" => TokenKind::Or,
                "not" => TokenKind::Not,
                _ => TokenKind::Ident(s.to_owned()),
            };
            out.push(Token {
                kind,
                span: Span { start },
            });
            continue;
        }

        if i + 1 < bytes.len() {
            let kind = match &bytes[i..i + 2] {
                b"==" => Some(TokenKind::EqEq),
                b"!=" => Some(TokenKind::Ne),
                b"<=" => Some(TokenKind::Le),
                b">=" => Some(TokenKind::Ge),
                _ => None,
            };
            if let Some(kind) = kind {
                i += 2;
                out.push(Token {
                    kind,
                    span: Span { start },
                });
                continue;
            }
        }

        let kind = match c {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            ':' => TokenKind::Colon,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '<' => TokenKind::Lt,
            '>' => TokenKind::Gt,
            _ => {
                let ch = input[start..].chars().next().unwrap_or(c);
                return Err(ExprError::parse(start, format!("unexpected character '{ch}'")));
            }
        };
        i += 1;
        out.push(Token {
            kind,
            span: Span { start },
        });
    }

    out.push(Token {
        kind: TokenKind::Eof,
        span: Span { start: input.len() },
    });

    Ok(out)
}

/// Lexes a quoted string starting at `start`; returns the unescaped value and the end offset.
fn lex_string(input: &str, start: usize) -> ExprResult<(String, usize)> {
    let mut chars = input[start..].char_indices();
    let quote = match chars.next() {
        Some((_, q)) => q,
        None => return Err(ExprError::parse(start, "expected string literal")),
    };

    let mut value = String::new();
    while let Some((off, c)) = chars.next() {
        match c {
            c if c == quote => return Ok((value, start + off + c.len_utf8())),
            '\\' => {
                let Some((esc_off, esc)) = chars.next() else {
                    break;
                };
                match esc {
                    '\\' | '\'' | '"' => value.push(esc),
                    'n' => value.push('\n'),
                    'r' => value.push('\r'),
                    't' => value.push('\t'),
                    '0' => value.push('\0'),
                    'x' | 'u' | 'U' => {
                        let width = match esc {
                            'x' => 2,
                            'u' => 4,
                            _ => 8,
                        };
                        let mut code = 0u32;
                        for _ in 0..width {
                            let digit = chars
                                .next()
                                .and_then(|(_, d)| d.to_digit(16))
                                .ok_or_else(|| {
                                    ExprError::parse(
                                        start + esc_off,
                                        format!("invalid \\{esc} escape (expected {width} hex digits)"),
                                    )
                                })?;
                            code = code * 16 + digit;
                        }
                        let ch = char::from_u32(code).ok_or_else(|| {
                            ExprError::parse(start + esc_off, "escape is not a valid code point")
                        })?;
                        value.push(ch);
                    }
                    other => {
                        return Err(ExprError::parse(
                            start + esc_off,
                            format!("unknown escape '\\{other}'"),
                        ));
                    }
                }
            }
            '\n' => return Err(ExprError::parse(start + off, "newline in string literal")),
            c => value.push(c),
        }
    }

    Err(ExprError::parse(start, "unterminated string literal"))
}
