//! Structured compiler errors.

use crate::span::Span;
use eyre::Error as EyreError;
use std::result;
use thiserror::Error as ThisError;

/// Classification of a pipeline failure.
///
/// `Compiler` marks an internal invariant violation; it is the only kind
/// that gets enriched with pipeline debug context. The rest are user-facing
/// and kept clean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Parse,
    Type,
    Lin,
    UnboundVar,
    Compiler,
    NotImplemented,
    Runtime,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Parse => "Parse error",
            ErrorKind::Type => "Type error",
            ErrorKind::Lin => "Linearity error",
            ErrorKind::UnboundVar => "Variable not in scope",
            ErrorKind::Compiler => "Internal compiler error",
            ErrorKind::NotImplemented => "Not implemented",
            ErrorKind::Runtime => "Runtime error",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq, ThisError)]
#[error("{kind}: {msg}")]
pub struct Error {
    pub kind: ErrorKind,
    pub span: Option<Span>,
    pub msg: String,
}

pub type Result<T> = result::Result<T, Error>;

impl Error {
    pub fn new(kind: ErrorKind, msg: impl Into<String>) -> Error {
        Error {
            kind,
            span: None,
            msg: msg.into(),
        }
    }

    pub fn parse(msg: impl Into<String>) -> Error {
        Error::new(ErrorKind::Parse, msg)
    }

    pub fn ty(msg: impl Into<String>) -> Error {
        Error::new(ErrorKind::Type, msg)
    }

    pub fn unbound(name: impl std::fmt::Display) -> Error {
        Error::new(ErrorKind::UnboundVar, name.to_string())
    }

    pub fn compiler(msg: impl Into<String>) -> Error {
        Error::new(ErrorKind::Compiler, msg)
    }

    pub fn not_implemented(msg: impl Into<String>) -> Error {
        Error::new(ErrorKind::NotImplemented, msg)
    }

    pub fn runtime(msg: impl Into<String>) -> Error {
        Error::new(ErrorKind::Runtime, msg)
    }

    pub fn with_span(mut self, span: Span) -> Error {
        if self.span.is_none() && !span.is_null() {
            self.span = Some(span);
        }
        self
    }

    /// Append a block of text to the message, separated by a newline.
    pub fn with_trailer(mut self, trailer: impl AsRef<str>) -> Error {
        self.msg.push('\n');
        self.msg.push_str(trailer.as_ref());
        self
    }
}

impl From<EyreError> for Error {
    fn from(err: EyreError) -> Self {
        Error::runtime(format!("{err:#}"))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::runtime(err.to_string())
    }
}

impl From<std::fmt::Error> for Error {
    fn from(err: std::fmt::Error) -> Self {
        Error::compiler(err.to_string())
    }
}
