// End-to-end block evaluation: real parsing, the full staged pipeline,
// and the jit backend, driven through `eval_block`.

use dex_core::block::{BlockKind, SourceBlock};
use dex_core::env::{Binding, EnvMonoid, TopEnv};
use dex_core::frontend::parse_blocks;
use dex_core::ir::Ty;
use dex_core::name::Name;
use dex_core::output::{OutFormat, Output};
use dex_core::value::Value;
use dex_core::ErrorKind;
use dex_pipeline::{eval_block, eval_source, Backend};
use pretty_assertions::assert_eq;

fn block(src: &str) -> SourceBlock {
    let mut blocks = parse_blocks(src);
    assert_eq!(blocks.len(), 1, "expected one block in {src:?}");
    blocks.remove(0)
}

fn pass_names(outputs: &[Output]) -> Vec<&str> {
    outputs.iter().filter_map(Output::pass_name).collect()
}

#[test]
fn trivial_empty_module_runs_clean() {
    let empty = SourceBlock {
        text: String::new(),
        offset: 0,
        kind: BlockKind::RunModule(dex_core::surface::FModule::empty()),
    };
    let env = TopEnv::new();
    let (delta, result) = eval_block(Backend::Jit, &env, &empty);
    assert!(result.is_ok());
    assert_eq!(result.outputs, vec![]);
    assert!(delta.is_empty());
}

#[test]
fn run_module_contributes_bindings_and_suppresses_outputs() {
    let env = TopEnv::new();
    let (delta, result) = eval_block(Backend::Jit, &env, &block("x = 2\ny = x + 1\n"));
    assert!(result.is_ok(), "{:?}", result.err);
    assert_eq!(result.outputs, vec![]);
    let names: Vec<String> = delta.names().map(|n| n.to_string()).collect();
    assert_eq!(names, ["x", "y"]);
}

#[test]
fn show_passes_lists_all_six_stages_in_order() {
    let env = TopEnv::new();
    let (delta, result) = eval_block(Backend::Jit, &env, &block(":passes 1 + 1\n"));
    assert!(result.is_ok(), "{:?}", result.err);
    assert_eq!(
        pass_names(&result.outputs),
        ["deshadow", "type inference", "normalize", "simplify", "imp", "jit"]
    );
    assert_eq!(result.outputs.len(), 6);
    assert!(delta.is_empty());
}

#[test]
fn show_passes_renders_the_jit_result() {
    let env = TopEnv::new();
    let (_, result) = eval_block(Backend::Jit, &env, &block(":passes 1 + 1\n"));
    let jit = result
        .outputs
        .iter()
        .find(|o| o.pass_name() == Some("jit"))
        .expect("jit pass info");
    let Output::PassInfo { pretty, .. } = jit else {
        unreachable!()
    };
    assert_eq!(pretty, "_ans : Int = 2\n");
}

#[test]
fn show_pass_keeps_only_the_named_stage() {
    let env = TopEnv::new();
    let (_, result) = eval_block(Backend::Jit, &env, &block(":pass simplify 2 * 3\n"));
    assert!(result.is_ok(), "{:?}", result.err);
    assert_eq!(pass_names(&result.outputs), ["simplify"]);
}

#[test]
fn eval_expr_prints_the_value() {
    let env = TopEnv::new();
    let (delta, result) = eval_block(Backend::Jit, &env, &block(":p 2\n"));
    assert!(result.is_ok(), "{:?}", result.err);
    assert_eq!(
        result.outputs,
        vec![Output::ValOut(OutFormat::Default, Value::Int(2))]
    );
    assert!(delta.is_empty());
}

#[test]
fn eval_expr_sees_session_bindings() {
    let mut env = TopEnv::new();
    let (delta, result) = eval_block(Backend::Jit, &env, &block("x = 20 + 1\n"));
    assert!(result.is_ok(), "{:?}", result.err);
    env.combine(delta);
    let (_, result) = eval_block(Backend::Jit, &env, &block(":p x * 2\n"));
    assert_eq!(
        result.outputs,
        vec![Output::ValOut(OutFormat::Default, Value::Int(42))]
    );
}

#[test]
fn user_binders_cannot_alias_introduced_temps() {
    // The renamed user `tmp` and the first ANF temporary share a stem;
    // if the passes reissued the same name the body would read one cell
    // twice and print 12.
    let env = TopEnv::new();
    let (_, result) = eval_block(
        Backend::Jit,
        &env,
        &block(":p let tmp = 1 in tmp + 2 * 3\n"),
    );
    assert!(result.is_ok(), "{:?}", result.err);
    assert_eq!(
        result.outputs,
        vec![Output::ValOut(OutFormat::Default, Value::Int(7))]
    );
}

#[test]
fn get_type_prints_the_type() {
    let env = TopEnv::new();
    let (_, result) = eval_block(Backend::Jit, &env, &block(":t 1 < 2\n"));
    assert_eq!(result.outputs, vec![Output::text("Bool")]);
}

#[test]
fn functions_evaluate_through_the_session() {
    let mut env = TopEnv::new();
    let source = "f : Int -> Int = \\y. y * y\n\n:p f 6\n\n:t f\n";
    let results = eval_source(Backend::Jit, &mut env, source);
    assert_eq!(results.len(), 3);
    for (_, result) in &results {
        assert!(result.is_ok(), "{:?}", result.err);
    }
    assert_eq!(
        results[1].1.outputs,
        vec![Output::ValOut(OutFormat::Default, Value::Int(36))]
    );
    assert_eq!(results[2].1.outputs, vec![Output::text("Int -> Int")]);
    match env.lookup(&Name::source("f")) {
        Some(Binding::Value { ty, .. }) => {
            assert_eq!(*ty, Ty::Arrow(Box::new(Ty::Int), Box::new(Ty::Int)));
        }
        other => panic!("expected function binding, got {other:?}"),
    }
}

#[test]
fn type_aliases_enter_the_session() {
    let mut env = TopEnv::new();
    let results = eval_source(Backend::Jit, &mut env, "type N = Int\nn : N = 7\n\n:t n\n");
    for (_, result) in &results {
        assert!(result.is_ok(), "{:?}", result.err);
    }
    assert_eq!(results[1].1.outputs, vec![Output::text("Int")]);
    assert_eq!(
        env.lookup(&Name::source("N")),
        Some(&Binding::TyAlias(Ty::Int))
    );
}

#[test]
fn unbound_variable_fails_with_highlight() {
    let env = TopEnv::new();
    let src = "x = 1\n\nz = missing + 1\n";
    let blocks = parse_blocks(src);
    let (delta, result) = eval_block(Backend::Jit, &env, &blocks[1]);
    let err = result.err.expect("unbound variable");
    assert_eq!(err.kind, ErrorKind::UnboundVar);
    assert!(err.msg.contains("z = missing + 1"), "{}", err.msg);
    assert!(err.msg.contains("    ^^^^^^^"), "{}", err.msg);
    assert!(delta.is_empty());
    assert_eq!(result.outputs, vec![]);
}

#[test]
fn type_error_stops_the_pipeline_after_deshadow() {
    let env = TopEnv::new();
    let (delta, result) = eval_block(Backend::Jit, &env, &block(":passes 1 + true\n"));
    let err = result.err.expect("type error");
    assert_eq!(err.kind, ErrorKind::Type);
    // deshadow succeeded and its output is retained; nothing later ran.
    assert_eq!(pass_names(&result.outputs), ["deshadow"]);
    assert!(delta.is_empty());
    // The user-facing message carries the highlight but no pipeline context.
    assert!(err.msg.contains("^^^^"), "{}", err.msg);
    assert!(!err.msg.contains("=== context ==="), "{}", err.msg);
}

#[test]
fn runtime_failure_discards_the_whole_block_delta() {
    let env = TopEnv::new();
    let (delta, result) = eval_block(Backend::Jit, &env, &block("a = 2\nb = 1 / 0\n"));
    let err = result.err.expect("division by zero");
    assert_eq!(err.kind, ErrorKind::Runtime);
    assert!(delta.is_empty(), "partial deltas must not leak");
}

#[test]
fn unparseable_block_is_a_parse_error() {
    let env = TopEnv::new();
    let unparseable = SourceBlock {
        text: "x = $$$\n".to_string(),
        offset: 0,
        kind: BlockKind::UnParseable("unexpected token".to_string()),
    };
    let (delta, result) = eval_block(Backend::Jit, &env, &unparseable);
    let err = result.err.expect("parse error");
    assert_eq!(err.kind, ErrorKind::Parse);
    assert_eq!(err.msg, "unexpected token");
    assert_eq!(result.outputs, vec![]);
    assert!(delta.is_empty());
}

#[test]
fn include_and_load_are_not_implemented() {
    let env = TopEnv::new();
    for src in ["include \"prelude.dx\"\n", "load \"data.dxo\"\n"] {
        let (_, result) = eval_block(Backend::Jit, &env, &block(src));
        let err = result.err.expect("unsupported");
        assert_eq!(err.kind, ErrorKind::NotImplemented);
    }
}

#[test]
fn unknown_commands_fail_to_parse() {
    let env = TopEnv::new();
    let (_, result) = eval_block(Backend::Jit, &env, &block(":frobnicate 1\n"));
    let err = result.err.expect("unknown command");
    assert_eq!(err.kind, ErrorKind::Parse);
    assert!(err.msg.contains(":frobnicate"), "{}", err.msg);
}

#[test]
fn time_command_is_a_no_op() {
    let env = TopEnv::new();
    let (delta, result) = eval_block(Backend::Jit, &env, &block(":time 1 + 1\n"));
    assert!(result.is_ok());
    assert_eq!(result.outputs, vec![]);
    assert!(delta.is_empty());
}

#[test]
fn comment_blocks_are_no_ops() {
    let env = TopEnv::new();
    let (delta, result) = eval_block(Backend::Jit, &env, &block("-- commentary\n"));
    assert!(result.is_ok());
    assert_eq!(result.outputs, vec![]);
    assert!(delta.is_empty());
}

#[test]
fn interp_backend_is_reserved_and_inert() {
    let env = TopEnv::new();
    let (delta, result) = eval_block(Backend::Interp, &env, &block("x = 2\n"));
    assert!(result.is_ok());
    assert_eq!(result.outputs, vec![]);
    assert!(delta.is_empty());
}

#[test]
fn blocks_are_independent_against_a_fixed_env() {
    let env = TopEnv::new();
    let b1 = block("a = 1\n");
    let b2 = block(":p 2 + 3\n");
    let before = eval_block(Backend::Jit, &env, &b2);
    let _ = eval_block(Backend::Jit, &env, &b1);
    let after = eval_block(Backend::Jit, &env, &b2);
    assert_eq!(before, after);
}

#[test]
fn session_shadowing_is_right_biased() {
    let mut env = TopEnv::new();
    let results = eval_source(Backend::Jit, &mut env, "x = 1\n\nx = 2\n\n:p x\n");
    for (_, result) in &results {
        assert!(result.is_ok(), "{:?}", result.err);
    }
    assert_eq!(
        results[2].1.outputs,
        vec![Output::ValOut(OutFormat::Default, Value::Int(2))]
    );
    assert_eq!(env.len(), 1);
}

#[test]
fn printing_a_function_is_a_runtime_error() {
    let mut env = TopEnv::new();
    let results = eval_source(Backend::Jit, &mut env, "f : Int -> Int = \\y. y\n\n:p f\n");
    let err = results[1].1.err.clone().expect("cannot print function");
    assert_eq!(err.kind, ErrorKind::Runtime);
}
