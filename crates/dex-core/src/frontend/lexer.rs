//! Hand-written lexer for block source text.
//!
//! Spans are absolute byte offsets into the enclosing file: the lexer is
//! constructed with the block's base offset and adds it to every position.
//! A newline followed by a non-indented line lexes as a `Newline` token
//! (declaration separator); indented lines are continuations.

use crate::span::Span;

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Eof,
    Newline,

    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),

    // Keywords.
    KwIf,
    KwThen,
    KwElse,
    KwLet,
    KwIn,
    KwType,
    KwInclude,
    KwLoad,
    KwTrue,
    KwFalse,

    // Delimiters.
    LParen,
    RParen,
    Colon,
    Dot,
    Backslash,

    // Operators.
    Assign,
    Arrow,
    Plus,
    Minus,
    Star,
    Slash,
    Lt,
    Gt,
    EqEq,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Eof => write!(f, "end of input"),
            TokenKind::Newline => write!(f, "end of line"),
            TokenKind::Ident(name) => write!(f, "identifier {name}"),
            TokenKind::Int(v) => write!(f, "{v}"),
            TokenKind::Float(v) => write!(f, "{v}"),
            TokenKind::Str(s) => write!(f, "{s:?}"),
            TokenKind::KwIf => write!(f, "if"),
            TokenKind::KwThen => write!(f, "then"),
            TokenKind::KwElse => write!(f, "else"),
            TokenKind::KwLet => write!(f, "let"),
            TokenKind::KwIn => write!(f, "in"),
            TokenKind::KwType => write!(f, "type"),
            TokenKind::KwInclude => write!(f, "include"),
            TokenKind::KwLoad => write!(f, "load"),
            TokenKind::KwTrue => write!(f, "true"),
            TokenKind::KwFalse => write!(f, "false"),
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::Colon => write!(f, ":"),
            TokenKind::Dot => write!(f, "."),
            TokenKind::Backslash => write!(f, "\\"),
            TokenKind::Assign => write!(f, "="),
            TokenKind::Arrow => write!(f, "->"),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::Star => write!(f, "*"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::Lt => write!(f, "<"),
            TokenKind::Gt => write!(f, ">"),
            TokenKind::EqEq => write!(f, "=="),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LexError {
    pub message: String,
    pub span: Span,
}

pub struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str, base_offset: usize) -> Self {
        Lexer {
            src: src.as_bytes(),
            pos: 0,
            base: base_offset,
        }
    }

    fn abs(&self, pos: usize) -> u32 {
        (self.base + pos) as u32
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.src.get(self.pos + ahead).copied()
    }

    fn token(&self, kind: TokenKind, lo: usize) -> Token {
        Token {
            kind,
            span: Span::new(self.abs(lo), self.abs(self.pos)),
        }
    }

    fn error(&self, message: impl Into<String>, lo: usize) -> LexError {
        LexError {
            message: message.into(),
            span: Span::new(self.abs(lo), self.abs(self.pos.max(lo + 1))),
        }
    }

    /// Skip spaces, tabs, and `--` line comments. Returns the position of a
    /// newline that acts as a declaration separator, if one was crossed.
    fn skip_trivia(&mut self) -> Option<usize> {
        let mut separator = None;
        loop {
            match self.peek() {
                Some(b' ') | Some(b'\t') | Some(b'\r') => self.pos += 1,
                Some(b'-') if self.peek_at(1) == Some(b'-') => {
                    while !matches!(self.peek(), None | Some(b'\n')) {
                        self.pos += 1;
                    }
                }
                Some(b'\n') => {
                    let at = self.pos;
                    self.pos += 1;
                    // A following line that starts flush left begins a new
                    // declaration; indentation continues the current one.
                    match self.peek() {
                        Some(b' ') | Some(b'\t') | Some(b'\n') | Some(b'\r') | None => {}
                        _ => {
                            if separator.is_none() {
                                separator = Some(at);
                            }
                        }
                    }
                }
                _ => return separator,
            }
        }
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        if let Some(at) = self.skip_trivia() {
            return Ok(Token {
                kind: TokenKind::Newline,
                span: Span::new(self.abs(at), self.abs(at + 1)),
            });
        }
        let lo = self.pos;
        let Some(ch) = self.peek() else {
            return Ok(self.token(TokenKind::Eof, lo));
        };
        match ch {
            b'(' => {
                self.pos += 1;
                Ok(self.token(TokenKind::LParen, lo))
            }
            b')' => {
                self.pos += 1;
                Ok(self.token(TokenKind::RParen, lo))
            }
            b':' => {
                self.pos += 1;
                Ok(self.token(TokenKind::Colon, lo))
            }
            b'.' => {
                self.pos += 1;
                Ok(self.token(TokenKind::Dot, lo))
            }
            b'\\' => {
                self.pos += 1;
                Ok(self.token(TokenKind::Backslash, lo))
            }
            b'+' => {
                self.pos += 1;
                Ok(self.token(TokenKind::Plus, lo))
            }
            b'*' => {
                self.pos += 1;
                Ok(self.token(TokenKind::Star, lo))
            }
            b'/' => {
                self.pos += 1;
                Ok(self.token(TokenKind::Slash, lo))
            }
            b'<' => {
                self.pos += 1;
                Ok(self.token(TokenKind::Lt, lo))
            }
            b'>' => {
                self.pos += 1;
                Ok(self.token(TokenKind::Gt, lo))
            }
            b'-' => {
                if self.peek_at(1) == Some(b'>') {
                    self.pos += 2;
                    Ok(self.token(TokenKind::Arrow, lo))
                } else {
                    self.pos += 1;
                    Ok(self.token(TokenKind::Minus, lo))
                }
            }
            b'=' => {
                if self.peek_at(1) == Some(b'=') {
                    self.pos += 2;
                    Ok(self.token(TokenKind::EqEq, lo))
                } else {
                    self.pos += 1;
                    Ok(self.token(TokenKind::Assign, lo))
                }
            }
            b'"' => self.lex_string(lo),
            b'0'..=b'9' => self.lex_number(lo),
            b'_' | b'a'..=b'z' | b'A'..=b'Z' => Ok(self.lex_ident(lo)),
            other => {
                self.pos += 1;
                Err(self.error(format!("unexpected character {:?}", other as char), lo))
            }
        }
    }

    fn lex_string(&mut self, lo: usize) -> Result<Token, LexError> {
        self.pos += 1;
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch == b'"' {
                let text = std::str::from_utf8(&self.src[start..self.pos])
                    .map_err(|_| self.error("invalid UTF-8 in string", lo))?
                    .to_string();
                self.pos += 1;
                return Ok(self.token(TokenKind::Str(text), lo));
            }
            if ch == b'\n' {
                break;
            }
            self.pos += 1;
        }
        Err(self.error("unterminated string", lo))
    }

    fn lex_number(&mut self, lo: usize) -> Result<Token, LexError> {
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        let is_float =
            self.peek() == Some(b'.') && matches!(self.peek_at(1), Some(b'0'..=b'9'));
        if is_float {
            self.pos += 1;
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.pos += 1;
            }
        }
        let text = std::str::from_utf8(&self.src[lo..self.pos]).expect("ascii digits");
        if is_float {
            let value: f64 = text
                .parse()
                .map_err(|_| self.error(format!("bad float literal {text}"), lo))?;
            Ok(self.token(TokenKind::Float(value), lo))
        } else {
            let value: i64 = text
                .parse()
                .map_err(|_| self.error(format!("integer literal {text} out of range"), lo))?;
            Ok(self.token(TokenKind::Int(value), lo))
        }
    }

    fn lex_ident(&mut self, lo: usize) -> Token {
        while matches!(
            self.peek(),
            Some(b'_') | Some(b'a'..=b'z') | Some(b'A'..=b'Z') | Some(b'0'..=b'9')
        ) {
            self.pos += 1;
        }
        let text = std::str::from_utf8(&self.src[lo..self.pos]).expect("ascii ident");
        let kind = match text {
            "if" => TokenKind::KwIf,
            "then" => TokenKind::KwThen,
            "else" => TokenKind::KwElse,
            "let" => TokenKind::KwLet,
            "in" => TokenKind::KwIn,
            "type" => TokenKind::KwType,
            "include" => TokenKind::KwInclude,
            "load" => TokenKind::KwLoad,
            "true" => TokenKind::KwTrue,
            "false" => TokenKind::KwFalse,
            _ => TokenKind::Ident(text.to_string()),
        };
        self.token(kind, lo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(src, 0);
        let mut out = Vec::new();
        loop {
            let token = lexer.next_token().expect("lex");
            let done = token.kind == TokenKind::Eof;
            out.push(token.kind);
            if done {
                return out;
            }
        }
    }

    #[test]
    fn lexes_operators_and_literals() {
        assert_eq!(
            kinds("x = 1 + 2.5"),
            vec![
                TokenKind::Ident("x".into()),
                TokenKind::Assign,
                TokenKind::Int(1),
                TokenKind::Plus,
                TokenKind::Float(2.5),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn newline_separates_flush_left_lines_only() {
        assert_eq!(
            kinds("x = 1\n  + 2\ny = 3"),
            vec![
                TokenKind::Ident("x".into()),
                TokenKind::Assign,
                TokenKind::Int(1),
                TokenKind::Plus,
                TokenKind::Int(2),
                TokenKind::Newline,
                TokenKind::Ident("y".into()),
                TokenKind::Assign,
                TokenKind::Int(3),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn comments_run_to_end_of_line() {
        assert_eq!(
            kinds("1 -- ignored\n"),
            vec![TokenKind::Int(1), TokenKind::Eof]
        );
    }

    #[test]
    fn spans_carry_the_base_offset() {
        let mut lexer = Lexer::new("abc", 100);
        let token = lexer.next_token().expect("lex");
        assert_eq!(token.span, Span::new(100, 103));
    }
}
