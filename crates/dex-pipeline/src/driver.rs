//! The block driver: dispatches on a source block's kind, threads module
//! evaluation through the staged pipeline, filters outputs per command,
//! and attaches source context to whatever goes wrong.

use crate::carrier::run_top_pass;
use crate::context::add_ctx;
use crate::pass::lift_top_pass;
use crate::stage::{named_pass, TopPass};
use dex_backend::{Backend, JitBackend};
use dex_core::block::{BlockKind, BlockResult, CmdKind, SourceBlock};
use dex_core::env::{Binding, EnvView, TopEnv};
use dex_core::error::{Error, Result};
use dex_core::imp::ImpModule;
use dex_core::ir::Module;
use dex_core::name::{FreshScope, Name};
use dex_core::output::Output;
use dex_core::surface::FModule;
use dex_core::value::load_atom_val;
use dex_passes::{check_imp_module, check_module, Deshadow, ImpLower, Normalize, Simplify, TypeInfer};
use tracing::debug_span;

// Product environments of the staged module pipeline, one component per
// stage in order. Pure stages carry the unit environment.
type InferEnv = ((TopEnv, TopEnv), ());
type TypedEnv = ((TopEnv, ()), TopEnv);
type ModuleEnv = (InferEnv, TypedEnv);

fn deshadow_stage() -> TopPass<TopEnv, FModule, FModule> {
    TopPass::new(|ctx, module: FModule| {
        lift_top_pass(ctx, (), FreshScope::new(), |pctx| {
            Deshadow::new(pctx.env, &mut pctx.scope).transform(&module)
        })
    })
}

fn infer_stage() -> TopPass<TopEnv, FModule, Module> {
    TopPass::new(|ctx, module: FModule| {
        let mut pass = TypeInfer::new(ctx.env());
        let typed = pass.transform(&module)?;
        ctx.put_env(pass.alias_delta(&module));
        Ok(typed)
    })
}

fn normalize_stage() -> TopPass<(), Module, Module> {
    TopPass::new(|ctx, module: Module| {
        lift_top_pass(ctx, (), FreshScope::new(), |pctx| {
            Normalize::new(&mut pctx.scope).transform(&module)
        })
    })
}

fn simplify_stage() -> TopPass<TopEnv, Module, Module> {
    TopPass::new(|ctx, module: Module| {
        let mut scope = FreshScope::new();
        let mut pass = Simplify::new(ctx.env(), &mut scope);
        let simplified = pass.transform(&module)?;
        let delta = pass.fn_delta();
        ctx.put_env(delta);
        Ok(simplified)
    })
}

fn imp_stage() -> TopPass<(), Module, ImpModule> {
    TopPass::new(|ctx, module: Module| {
        lift_top_pass(ctx, ImpLower::new(), FreshScope::new(), |pctx| {
            pctx.state.transform(&module)
        })
    })
}

fn jit_stage() -> TopPass<TopEnv, ImpModule, TopEnv> {
    TopPass::new(|ctx, module: ImpModule| {
        // The one I/O-performing stage: codegen and execution go through
        // the carrier's host-action boundary.
        let delta = ctx.lift_io(|| JitBackend::new().eval(&module))?;
        ctx.put_env(delta.clone());
        Ok(delta)
    })
}

fn infer_types() -> TopPass<InferEnv, FModule, Module> {
    named_pass("deshadow", deshadow_stage(), None)
        .then(named_pass("type inference", infer_stage(), Some(check_module)))
        .then(named_pass("normalize", normalize_stage(), Some(check_module)))
}

fn eval_typed() -> TopPass<TypedEnv, Module, TopEnv> {
    named_pass("simplify", simplify_stage(), Some(check_module))
        .then(named_pass("imp", imp_stage(), Some(check_imp_module)))
        .then(named_pass("jit", jit_stage(), None))
}

/// The staged module pipeline. The ordering is total: each pass assumes
/// the invariants established by its predecessor.
fn eval_module_jit() -> TopPass<ModuleEnv, FModule, TopEnv> {
    infer_types().then(eval_typed())
}

/// Evaluate a module against the session environment, sending outputs to
/// `sink`. Returns the result together with the flattened delta; on
/// failure the delta is discarded.
fn run_module(
    backend: Backend,
    env: &TopEnv,
    module: &FModule,
    sink: &mut dyn FnMut(Output),
) -> (Result<()>, TopEnv) {
    match backend {
        Backend::Interp => (Ok(()), TopEnv::new()),
        Backend::Jit => {
            let pipeline = eval_module_jit();
            let view = ModuleEnv::view(env);
            let (result, delta) =
                run_top_pass(sink, &view, |ctx| pipeline.run(ctx, module.clone()));
            match result {
                Ok(_) => {
                    let mut flat = TopEnv::new();
                    delta.collapse(&mut flat);
                    (Ok(()), flat)
                }
                Err(err) => (Err(err), TopEnv::new()),
            }
        }
    }
}

/// Retain the outputs matching `keep`, preserving order.
pub fn filter_outputs(keep: impl Fn(&Output) -> bool, outputs: Vec<Output>) -> Vec<Output> {
    outputs.into_iter().filter(|output| keep(output)).collect()
}

/// Run a module against a buffering sink, then replay the outputs that
/// match `keep` into `outer`. Filtering happens on the buffered list, not
/// by gating emissions at the source.
fn run_module_filtered(
    backend: Backend,
    env: &TopEnv,
    module: &FModule,
    keep: impl Fn(&Output) -> bool,
    outer: &mut Vec<Output>,
) -> (Result<()>, TopEnv) {
    let mut buffer = Vec::new();
    let mut sink = |output: Output| buffer.push(output);
    let (result, delta) = run_module(backend, env, module, &mut sink);
    outer.extend(filter_outputs(keep, buffer));
    (result, delta)
}

/// Top-level entry point: evaluate one source block against the session
/// environment. Never fails at the function level; failures are folded
/// into the returned [`BlockResult`] with the block's source context
/// attached, and a failed block contributes an empty delta.
pub fn eval_block(backend: Backend, env: &TopEnv, block: &SourceBlock) -> (TopEnv, BlockResult) {
    let _span = debug_span!("eval_block", offset = block.offset).entered();
    let mut outputs = Vec::new();
    match eval_block_kind(backend, env, block, &mut outputs) {
        Ok(delta) => (delta, BlockResult::ok(outputs)),
        Err(err) => (
            TopEnv::new(),
            BlockResult::failed(outputs, add_ctx(block, err)),
        ),
    }
}

fn eval_block_kind(
    backend: Backend,
    env: &TopEnv,
    block: &SourceBlock,
    outputs: &mut Vec<Output>,
) -> Result<TopEnv> {
    match &block.kind {
        BlockKind::RunModule(module) => {
            let (result, delta) = run_module_filtered(backend, env, module, |_| false, outputs);
            result?;
            Ok(delta)
        }
        BlockKind::Command(cmd, (name, module)) => {
            eval_command(backend, env, cmd, name, module, outputs)?;
            Ok(TopEnv::new())
        }
        BlockKind::UnParseable(reason) => Err(Error::parse(reason.clone())),
        BlockKind::IncludeSourceFile(path) => Err(Error::not_implemented(format!(
            "source includes are not supported here: {path}"
        ))),
        BlockKind::LoadData(path) => Err(Error::not_implemented(format!(
            "data loading is not supported here: {path}"
        ))),
        BlockKind::Other => Ok(TopEnv::new()),
    }
}

fn eval_command(
    backend: Backend,
    env: &TopEnv,
    cmd: &CmdKind,
    name: &Name,
    module: &FModule,
    outputs: &mut Vec<Output>,
) -> Result<()> {
    match cmd {
        CmdKind::EvalExpr(format) => {
            let binding = eval_command_binding(backend, env, name, module, outputs)?;
            let Binding::Value { atom, .. } = binding else {
                return Err(Error::ty(format!("{name} is not a value binding")));
            };
            let value = load_atom_val(env, &atom)?;
            outputs.push(Output::ValOut(*format, value));
            Ok(())
        }
        CmdKind::GetType => {
            let binding = eval_command_binding(backend, env, name, module, outputs)?;
            outputs.push(Output::text(binding.ty().to_string()));
            Ok(())
        }
        CmdKind::ShowPasses => {
            let (result, _delta) =
                run_module_filtered(backend, env, module, Output::is_pass_info, outputs);
            result
        }
        CmdKind::ShowPass(stage) => {
            let (result, _delta) = run_module_filtered(
                backend,
                env,
                module,
                |output| output.pass_name() == Some(stage),
                outputs,
            );
            result
        }
        // Remaining commands are deliberate no-ops.
        CmdKind::TimeIt => Ok(()),
    }
}

/// Evaluate a command's module with outputs suppressed and look up the
/// binding it produced for the command's binder.
fn eval_command_binding(
    backend: Backend,
    env: &TopEnv,
    name: &Name,
    module: &FModule,
    outputs: &mut Vec<Output>,
) -> Result<Binding> {
    let (result, delta) = run_module_filtered(backend, env, module, |_| false, outputs);
    result?;
    delta
        .lookup(name)
        .cloned()
        .ok_or_else(|| Error::compiler(format!("command binding {name} missing from delta")))
}

/// Evaluate every block of `source` in order against an evolving session
/// environment, folding each successful block's delta into the session.
pub fn eval_source(
    backend: Backend,
    env: &mut TopEnv,
    source: &str,
) -> Vec<(SourceBlock, BlockResult)> {
    use dex_core::env::EnvMonoid;
    let blocks = dex_core::frontend::parse_blocks(source);
    let mut results = Vec::with_capacity(blocks.len());
    for block in blocks {
        let (delta, result) = eval_block(backend, env, &block);
        env.combine(delta);
        results.push((block, result));
    }
    results
}
