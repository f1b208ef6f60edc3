// Front-end integration: whole-file splitting and the expression grammar,
// observed through the surface pretty-printer.

use dex_core::block::BlockKind;
use dex_core::frontend::parse_blocks;
use dex_core::pretty::pretty_string;
use pretty_assertions::assert_eq;

fn printed_module(src: &str) -> String {
    let blocks = parse_blocks(src);
    assert_eq!(blocks.len(), 1, "expected one block in {src:?}");
    match &blocks[0].kind {
        BlockKind::RunModule(module) => pretty_string(module),
        other => panic!("expected module, got {other:?}"),
    }
}

#[test]
fn precedence_binds_multiplication_tighter() {
    assert_eq!(printed_module("x = 1 + 2 * 3\n"), "x = 1 + (2 * 3)\n");
}

#[test]
fn application_binds_tighter_than_operators() {
    assert_eq!(printed_module("y = f 1 + 2\nf : Int -> Int = \\a. a\n").lines().next(),
        Some("y = (f 1) + 2"));
}

#[test]
fn comparison_is_looser_than_arithmetic() {
    assert_eq!(printed_module("b = 1 + 2 < 3 * 4\n"), "b = (1 + 2) < (3 * 4)\n");
}

#[test]
fn lambda_bodies_extend_right() {
    assert_eq!(
        printed_module("f : Int -> Int = \\x. x + 1\n"),
        "f : Int -> Int = \\x. x + 1\n"
    );
}

#[test]
fn let_and_if_round_trip() {
    assert_eq!(
        printed_module("x = let a = 1 in if a < 2 then a else 0\n"),
        "x = let a = 1 in if (a < 2) then a else 0\n"
    );
}

#[test]
fn indented_lines_continue_a_declaration() {
    assert_eq!(
        printed_module("x = 1 +\n  2 +\n  3\n"),
        "x = (1 + 2) + 3\n"
    );
}

#[test]
fn negative_literals_parse_in_primary_position() {
    assert_eq!(printed_module("x = 0 - -3\n"), "x = 0 - -3\n");
}

#[test]
fn a_script_splits_into_independent_blocks() {
    let src = "-- header comment\n\nx = 1\n\n:p x + 1\n\ninclude \"lib.dx\"\n";
    let blocks = parse_blocks(src);
    assert_eq!(blocks.len(), 4);
    assert!(matches!(blocks[0].kind, BlockKind::Other));
    assert!(matches!(blocks[1].kind, BlockKind::RunModule(_)));
    assert!(matches!(blocks[2].kind, BlockKind::Command(..)));
    assert!(matches!(blocks[3].kind, BlockKind::IncludeSourceFile(_)));
    assert_eq!(blocks[2].offset, src.find(":p").unwrap());
}

#[test]
fn unterminated_string_is_unparseable_not_fatal() {
    let blocks = parse_blocks("load \"half\n");
    let BlockKind::UnParseable(reason) = &blocks[0].kind else {
        panic!("expected unparseable, got {:?}", blocks[0].kind);
    };
    assert!(reason.contains("unterminated string"), "{reason}");
}
