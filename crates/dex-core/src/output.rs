//! Tagged outputs accumulated during block evaluation.

use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutFormat {
    /// Plain rendering of the value.
    Default,
    /// Rendering with the constructor shown, for disambiguation.
    Show,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    ValOut(OutFormat, Value),
    TextOut(String),
    /// One pass's name and its pretty-printed result.
    PassInfo { name: &'static str, pretty: String },
}

impl Output {
    pub fn text(s: impl Into<String>) -> Output {
        Output::TextOut(s.into())
    }

    pub fn is_pass_info(&self) -> bool {
        matches!(self, Output::PassInfo { .. })
    }

    pub fn pass_name(&self) -> Option<&str> {
        match self {
            Output::PassInfo { name, .. } => Some(name),
            _ => None,
        }
    }
}

impl std::fmt::Display for Output {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Output::ValOut(OutFormat::Default, value) => write!(f, "{value}"),
            Output::ValOut(OutFormat::Show, value) => write!(f, "{value:?}"),
            Output::TextOut(text) => write!(f, "{text}"),
            Output::PassInfo { name, pretty } => {
                writeln!(f, "=== {name} ===")?;
                write!(f, "{pretty}")
            }
        }
    }
}
