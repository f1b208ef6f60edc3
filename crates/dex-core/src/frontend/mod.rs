//! Front end: splitting a source file into blocks and parsing each one.
//!
//! Splitting never fails; a block whose contents do not parse becomes an
//! `UnParseable` block carrying the reason, and the driver turns that into
//! a parse error when the block is evaluated.

pub mod lexer;
pub mod parser;

use crate::block::{BlockKind, CmdKind, SourceBlock};
use crate::error::Result;
use crate::frontend::lexer::TokenKind;
use crate::frontend::parser::Parser;
use crate::name::Name;
use crate::output::OutFormat;
use crate::surface::{FModule, UDecl};

/// The binder commands attach their expression to.
pub fn command_binder() -> Name {
    Name::source("_ans")
}

/// Split a file into source blocks at blank lines, tracking byte offsets,
/// and parse each block's contents.
pub fn parse_blocks(file: &str) -> Vec<SourceBlock> {
    let mut blocks = Vec::new();
    let mut block_start: Option<usize> = None;
    let mut pos = 0;
    for line in file.split_inclusive('\n') {
        if line.trim().is_empty() {
            if let Some(start) = block_start.take() {
                blocks.push(make_block(file, start, pos));
            }
        } else if block_start.is_none() {
            block_start = Some(pos);
        }
        pos += line.len();
    }
    if let Some(start) = block_start {
        blocks.push(make_block(file, start, pos));
    }
    tracing::debug!(blocks = blocks.len(), "split source file");
    blocks
}

fn make_block(file: &str, start: usize, end: usize) -> SourceBlock {
    let text = file[start..end].to_string();
    let kind = parse_block(&text, start);
    SourceBlock {
        text,
        offset: start,
        kind,
    }
}

/// Parse one block's text, `offset` bytes into the enclosing file.
pub fn parse_block(text: &str, offset: usize) -> BlockKind {
    let trimmed = text.trim_start();
    let lead = text.len() - trimmed.len();
    let result = if let Some(cmd_text) = trimmed.strip_prefix(':') {
        parse_command(cmd_text, offset + lead + 1)
    } else {
        parse_top(text, offset)
    };
    result.unwrap_or_else(|err| BlockKind::UnParseable(err.msg))
}

fn parse_top(text: &str, offset: usize) -> Result<BlockKind> {
    let mut parser = Parser::new(text, offset)?;
    match parser.lookahead_kind() {
        TokenKind::KwInclude => {
            let path = parser.parse_file_directive(TokenKind::KwInclude)?;
            Ok(BlockKind::IncludeSourceFile(path))
        }
        TokenKind::KwLoad => {
            let path = parser.parse_file_directive(TokenKind::KwLoad)?;
            Ok(BlockKind::LoadData(path))
        }
        _ => {
            let module = parser.parse_module()?;
            if module.decls.is_empty() && module.ty_aliases.is_empty() {
                Ok(BlockKind::Other)
            } else {
                Ok(BlockKind::RunModule(module))
            }
        }
    }
}

fn parse_command(cmd_text: &str, offset: usize) -> Result<BlockKind> {
    let word: String = cmd_text
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    let rest = &cmd_text[word.len()..];
    let rest_offset = offset + word.len();
    let mut parser = Parser::new(rest, rest_offset)?;
    let cmd = match word.as_str() {
        "p" => CmdKind::EvalExpr(OutFormat::Default),
        "show" => CmdKind::EvalExpr(OutFormat::Show),
        "t" => CmdKind::GetType,
        "passes" => CmdKind::ShowPasses,
        "pass" => CmdKind::ShowPass(parser.parse_stage_name()?),
        "time" => CmdKind::TimeIt,
        _ => {
            return Ok(BlockKind::UnParseable(format!("unknown command :{word}")));
        }
    };
    let expr = parser.parse_expr()?;
    parser.expect_end()?;
    let span = expr.span;
    let module = FModule::single(UDecl {
        name: command_binder(),
        ann: None,
        expr,
        span,
    });
    Ok(BlockKind::Command(cmd, (command_binder(), module)))
}
