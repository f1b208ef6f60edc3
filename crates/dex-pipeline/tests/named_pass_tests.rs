// The named-pass decorator: pass info emission, post-condition checks,
// debug context, and conversion of host panics into compiler errors.

use dex_core::env::TopEnv;
use dex_core::error::{Error, Result};
use dex_core::imp::{ImpModule, ImpOperand, ImpStmt};
use dex_core::ir::{Lit, Ty};
use dex_core::name::Name;
use dex_core::output::Output;
use dex_core::pretty::pretty_string;
use dex_core::ErrorKind;
use dex_pipeline::{named_pass, run_top_pass, TopPass};
use pretty_assertions::assert_eq;

fn sample_imp() -> ImpModule {
    ImpModule {
        stmts: vec![
            ImpStmt::Alloc {
                dest: 0,
                ty: Ty::Int,
            },
            ImpStmt::Store {
                dest: 0,
                src: ImpOperand::Imm(Lit::Int(7)),
            },
        ],
        exports: vec![(Name::source("x"), Ty::Int, 0)],
    }
}

fn identity() -> TopPass<TopEnv, ImpModule, ImpModule> {
    TopPass::new(|_ctx, module: ImpModule| Ok(module))
}

#[test]
fn emits_pass_info_with_the_pretty_result() {
    let pass = named_pass("imp", identity(), None);
    let mut seen = Vec::new();
    let mut sink = |o: Output| seen.push(o);
    let env = TopEnv::new();
    let (result, _) = run_top_pass(&mut sink, &env, |ctx| ctx_run(&pass, ctx));
    assert!(result.is_ok());
    assert_eq!(
        seen,
        vec![Output::PassInfo {
            name: "imp",
            pretty: pretty_string(&sample_imp()),
        }]
    );
}

// Helper so every test runs the pass against the same input.
fn ctx_run(
    pass: &TopPass<TopEnv, ImpModule, ImpModule>,
    ctx: &mut dex_pipeline::TopCtx<'_, TopEnv>,
) -> Result<ImpModule> {
    pass.run(ctx, sample_imp())
}

#[test]
fn a_host_panic_becomes_a_compiler_error_with_context() {
    let exploding: TopPass<TopEnv, ImpModule, ImpModule> =
        TopPass::new(|_ctx, _module| panic!("segmentation fault in generated code"));
    let pass = named_pass("jit", exploding, None);
    let mut sink = |_| {};
    let env = TopEnv::new();
    let (result, _) = run_top_pass(&mut sink, &env, |ctx| ctx_run(&pass, ctx));
    let err = result.expect_err("panic must surface");
    assert_eq!(err.kind, ErrorKind::Compiler);
    assert!(
        err.msg.contains("segmentation fault in generated code"),
        "{}",
        err.msg
    );
    let expected_ctx = format!(
        "=== context ===\njit pass with input:\n{}",
        pretty_string(&sample_imp())
    );
    assert!(err.msg.contains(&expected_ctx), "{}", err.msg);
}

#[test]
fn prior_pass_info_survives_a_later_hard_failure() {
    let exploding: TopPass<TopEnv, ImpModule, ImpModule> =
        TopPass::new(|_ctx, _module| panic!("boom"));
    let pipeline = named_pass("imp", identity(), None).then(named_pass("jit", exploding, None));
    let mut seen = Vec::new();
    let mut sink = |o: Output| seen.push(o);
    let env = (TopEnv::new(), TopEnv::new());
    let (result, _) = run_top_pass(&mut sink, &env, |ctx| pipeline.run(ctx, sample_imp()));
    assert!(result.is_err());
    let names: Vec<&str> = seen.iter().filter_map(Output::pass_name).collect();
    assert_eq!(names, ["imp"]);
}

#[test]
fn failed_checks_report_under_the_output_context() {
    fn reject(_module: &ImpModule) -> Result<()> {
        Err(Error::compiler("cell %9 read before write"))
    }
    let pass = named_pass("imp", identity(), Some(reject));
    let mut seen = Vec::new();
    let mut sink = |o: Output| seen.push(o);
    let env = TopEnv::new();
    let (result, _) = run_top_pass(&mut sink, &env, |ctx| ctx_run(&pass, ctx));
    let err = result.expect_err("check must fail");
    assert_eq!(err.kind, ErrorKind::Compiler);
    assert!(err.msg.contains("imp pass output:"), "{}", err.msg);
    // The pass info was already emitted before the check ran.
    assert_eq!(seen.len(), 1);
}

#[test]
fn user_errors_pass_through_without_debug_context() {
    let failing: TopPass<TopEnv, ImpModule, ImpModule> =
        TopPass::new(|_ctx, _module| Err(Error::ty("mismatch")));
    let pass = named_pass("type inference", failing, None);
    let mut sink = |_| {};
    let env = TopEnv::new();
    let (result, _) = run_top_pass(&mut sink, &env, |ctx| ctx_run(&pass, ctx));
    let err = result.expect_err("type error");
    assert_eq!(err.msg, "mismatch");
}
