// SPDX-License-Identifier: MIT

//! Tokenizer for when-expressions
//!
//! Lexing never fails: the first character that does not start a valid
//! token (including an unterminated string) ends the stream.

/// A lexical token with its starting byte offset
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Number(f64),
    Str(String),
    EqEq,
    NotEq,
    Gte,
    Lte,
    AndAnd,
    OrOr,
    Gt,
    Lt,
    Bang,
    Dot,
    LParen,
    RParen,
    End,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Ident(s) => write!(f, "identifier '{}'", s),
            TokenKind::Number(n) => write!(f, "number {}", n),
            TokenKind::Str(s) => write!(f, "string '{}'", s),
            TokenKind::EqEq => write!(f, "'=='"),
            TokenKind::NotEq => write!(f, "'!='"),
            TokenKind::Gte => write!(f, "'>='"),
            TokenKind::Lte => write!(f, "'<='"),
            TokenKind::AndAnd => write!(f, "'&&'"),
            TokenKind::OrOr => write!(f, "'||'"),
            TokenKind::Gt => write!(f, "'>'"),
            TokenKind::Lt => write!(f, "'<'"),
            TokenKind::Bang => write!(f, "'!'"),
            TokenKind::Dot => write!(f, "'.'"),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::End => write!(f, "end of input"),
        }
    }
}

const TWO_CHAR_OPS: [(&str, TokenKind); 6] = [
    ("==", TokenKind::EqEq),
    ("!=", TokenKind::NotEq),
    (">=", TokenKind::Gte),
    ("<=", TokenKind::Lte),
    ("&&", TokenKind::AndAnd),
    ("||", TokenKind::OrOr),
];

/// Split `input` into tokens. The returned vector always ends with
/// exactly one `TokenKind::End`.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < input.len() {
        let rest = &input[pos..];
        let Some(c) = rest.chars().next() else {
            break;
        };

        if c.is_whitespace() {
            pos += c.len_utf8();
            continue;
        }

        if let Some((op, kind)) = TWO_CHAR_OPS.iter().find(|(op, _)| rest.starts_with(op)) {
            tokens.push(Token {
                kind: kind.clone(),
                position: pos,
            });
            pos += op.len();
            continue;
        }

        let single = match c {
            '>' => Some(TokenKind::Gt),
            '<' => Some(TokenKind::Lt),
            '!' => Some(TokenKind::Bang),
            '.' => Some(TokenKind::Dot),
            '(' => Some(TokenKind::LParen),
            ')' => Some(TokenKind::RParen),
            _ => None,
        };
        if let Some(kind) = single {
            tokens.push(Token {
                kind,
                position: pos,
            });
            pos += 1;
            continue;
        }

        if c == '\'' || c == '"' {
            match lex_string(rest, c) {
                Some((value, consumed)) => {
                    tokens.push(Token {
                        kind: TokenKind::Str(value),
                        position: pos,
                    });
                    pos += consumed;
                    continue;
                }
                None => break,
            }
        }

        if c.is_ascii_digit() {
            let (number, consumed) = lex_number(rest);
            tokens.push(Token {
                kind: TokenKind::Number(number),
                position: pos,
            });
            pos += consumed;
            continue;
        }

        if is_ident_start(c) {
            let len = rest
                .char_indices()
                .find(|(_, ch)| !is_ident_continue(*ch))
                .map(|(i, _)| i)
                .unwrap_or(rest.len());
            tokens.push(Token {
                kind: TokenKind::Ident(rest[..len].to_string()),
                position: pos,
            });
            pos += len;
            continue;
        }

        // Unrecognized character
        break;
    }

    tokens.push(Token {
        kind: TokenKind::End,
        position: pos,
    });
    tokens
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// Returns the unescaped contents and the number of bytes consumed
/// (quotes included), or `None` when the string is never closed.
fn lex_string(input: &str, quote: char) -> Option<(String, usize)> {
    let mut value = String::new();
    let mut chars = input.char_indices().skip(1);

    while let Some((i, c)) = chars.next() {
        if c == quote {
            return Some((value, i + c.len_utf8()));
        }
        if c == '\\' {
            let (_, escaped) = chars.next()?;
            value.push(match escaped {
                'n' => '\n',
                't' => '\t',
                other => other,
            });
        } else {
            value.push(c);
        }
    }

    None
}

fn lex_number(input: &str) -> (f64, usize) {
    let bytes = input.as_bytes();
    let mut len = 0;
    while len < bytes.len() && bytes[len].is_ascii_digit() {
        len += 1;
    }
    if len + 1 < bytes.len() && bytes[len] == b'.' && bytes[len + 1].is_ascii_digit() {
        len += 1;
        while len < bytes.len() && bytes[len].is_ascii_digit() {
            len += 1;
        }
    }
    // Digits with at most one interior dot always parse.
    let number = input[..len].parse().unwrap_or(0.0);
    (number, len)
}
