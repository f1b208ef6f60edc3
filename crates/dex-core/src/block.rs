//! Source blocks: the unit of input the pipeline driver consumes.

use crate::error::Error;
use crate::name::Name;
use crate::output::{OutFormat, Output};
use crate::surface::FModule;

/// One block of source text, with its byte offset into the enclosing file
/// and the parse of its contents.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceBlock {
    pub text: String,
    pub offset: usize,
    pub kind: BlockKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    RunModule(FModule),
    /// A command applied to a single synthesized binding: the module binds
    /// the command's expression to the carried name.
    Command(CmdKind, (Name, FModule)),
    IncludeSourceFile(String),
    LoadData(String),
    UnParseable(String),
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CmdKind {
    EvalExpr(OutFormat),
    GetType,
    ShowPasses,
    ShowPass(String),
    TimeIt,
}

/// The per-block result handed back to the caller, alongside the delta
/// environment. A failed block still carries the outputs collected before
/// the failure.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockResult {
    pub outputs: Vec<Output>,
    pub err: Option<Error>,
}

impl BlockResult {
    pub fn ok(outputs: Vec<Output>) -> BlockResult {
        BlockResult { outputs, err: None }
    }

    pub fn failed(outputs: Vec<Output>, err: Error) -> BlockResult {
        BlockResult {
            outputs,
            err: Some(err),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.err.is_none()
    }
}
