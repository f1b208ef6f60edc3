//! Error contextualization: source-region highlights at block boundaries
//! and debug context for internal failures.

use dex_core::block::SourceBlock;
use dex_core::error::{Error, ErrorKind};
use dex_core::span::Span;

/// Attach the block's source context to an error: rebase the error's
/// file-absolute region onto the block's own text and append a highlight.
/// Errors without a region pass through unchanged.
pub fn add_ctx(block: &SourceBlock, err: Error) -> Error {
    let Some(span) = err.span else {
        return err;
    };
    let rebased = span.rebase(block.offset as u32);
    let highlight = highlight_region(&block.text, rebased);
    err.with_trailer(highlight)
}

/// Attach pipeline debug context, but only to internal compiler errors;
/// user-facing kinds are kept clean.
pub fn add_debug_ctx(ctx: &str, err: Error) -> Error {
    if err.kind == ErrorKind::Compiler {
        err.with_trailer(format!("=== context ===\n{ctx}"))
    } else {
        err
    }
}

/// Render the line containing `span` with the region underlined. Offsets
/// are bytes; both ends are snapped back to UTF-8 boundaries before any
/// slicing, and the underline is clipped to the first line of the region.
pub fn highlight_region(text: &str, span: Span) -> String {
    let mut lo = (span.lo as usize).min(text.len());
    while !text.is_char_boundary(lo) {
        lo -= 1;
    }
    let mut hi = (span.hi as usize).min(text.len()).max(lo);
    while !text.is_char_boundary(hi) {
        hi -= 1;
    }
    let line_start = text[..lo].rfind('\n').map_or(0, |at| at + 1);
    let line_end = text[lo..].find('\n').map_or(text.len(), |at| lo + at);
    let line = &text[line_start..line_end];
    let pad = text[line_start..lo].chars().count();
    let width = text[lo..hi.min(line_end)].chars().count().max(1);
    format!("{line}\n{}{}", " ".repeat(pad), "^".repeat(width))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dex_core::block::BlockKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn highlight_underlines_the_region() {
        let text = "y = missing + 1\n";
        let rendered = highlight_region(text, Span::new(4, 11));
        assert_eq!(rendered, "y = missing + 1\n    ^^^^^^^");
    }

    #[test]
    fn highlight_clips_to_one_line() {
        let text = "a = 1\nb = 2\n";
        let rendered = highlight_region(text, Span::new(4, 11));
        assert_eq!(rendered, "a = 1\n    ^");
    }

    #[test]
    fn add_ctx_rebases_by_block_offset() {
        let block = SourceBlock {
            text: "y = oops\n".to_string(),
            offset: 100,
            kind: BlockKind::Other,
        };
        let err = Error::unbound("oops").with_span(Span::new(104, 108));
        let enriched = add_ctx(&block, err);
        assert!(enriched.msg.contains("y = oops"), "{}", enriched.msg);
        assert!(enriched.msg.contains("    ^^^^"), "{}", enriched.msg);
    }

    #[test]
    fn add_ctx_passes_spanless_errors_through() {
        let block = SourceBlock {
            text: "x = 1\n".to_string(),
            offset: 0,
            kind: BlockKind::Other,
        };
        let err = Error::runtime("boom");
        assert_eq!(add_ctx(&block, err.clone()), err);
    }

    #[test]
    fn debug_ctx_only_touches_compiler_errors() {
        let compiler = add_debug_ctx("jit pass with input:\nx\n", Error::compiler("bad"));
        assert!(compiler.msg.contains("=== context ==="));
        let user = add_debug_ctx("ctx", Error::ty("mismatch"));
        assert_eq!(user.msg, "mismatch");
    }
}
