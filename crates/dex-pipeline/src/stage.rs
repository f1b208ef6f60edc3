//! Pipeline stages and their composition.
//!
//! A [`TopPass`] wraps one stage as a boxed closure over the effect
//! carrier; [`TopPass::then`] composes two stages over the product of
//! their environments with all-or-nothing delta semantics. [`named_pass`]
//! decorates a stage with pretty-printed pass info, a post-condition
//! check, and conversion of host panics into compiler errors.

use crate::carrier::{run_sub_pass, TopCtx};
use crate::context::add_debug_ctx;
use dex_core::env::EnvMonoid;
use dex_core::error::{Error, Result};
use dex_core::output::Output;
use dex_core::pretty::{pretty_string, PrettyPrintable};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// One stage of a staged pipeline: a computation from `A` to `B` over the
/// effect carrier with environment `E`.
pub struct TopPass<E: EnvMonoid, A, B> {
    run: Box<dyn for<'c, 'e> Fn(&'c mut TopCtx<'e, E>, A) -> Result<B>>,
}

impl<E, A, B> TopPass<E, A, B>
where
    E: EnvMonoid + 'static,
    A: 'static,
    B: 'static,
{
    pub fn new(
        run: impl for<'c, 'e> Fn(&'c mut TopCtx<'e, E>, A) -> Result<B> + 'static,
    ) -> Self {
        TopPass { run: Box::new(run) }
    }

    pub fn run(&self, ctx: &mut TopCtx<'_, E>, input: A) -> Result<B> {
        (self.run)(ctx, input)
    }

    /// Sequential composition over the product environment.
    ///
    /// `self` runs against the first component, `next` against the second;
    /// outputs from both are forwarded to the ambient sink in order. The
    /// combined delta is contributed only if both stages succeed, so a
    /// failure anywhere contributes nothing: a partial environment update
    /// must not leak a half-typed binding.
    pub fn then<E2, C>(self, next: TopPass<E2, B, C>) -> TopPass<(E, E2), A, C>
    where
        E2: EnvMonoid + 'static,
        C: 'static,
    {
        TopPass::new(move |ctx, input: A| {
            let (env1, env2) = ctx.env();
            let (first, delta1) = run_sub_pass(ctx, env1, |sub| self.run(sub, input));
            let mid = first?;
            let (second, delta2) = run_sub_pass(ctx, env2, |sub| next.run(sub, mid));
            let out = second?;
            ctx.put_env((delta1, delta2));
            Ok(out)
        })
    }
}

/// Post-condition check run against a stage's output.
pub type Check<B> = Option<fn(&B) -> Result<()>>;

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "host exception with unprintable payload".to_string()
    }
}

/// Wrap a stage so that it renders its result as a `PassInfo` output,
/// runs `check` on the result, reports failures under a debug context
/// naming the pass, and converts host panics into compiler errors.
///
/// Rendering the result eagerly is intentional: it forces the whole IR
/// value, so latent structural errors surface here as compiler errors
/// instead of crashing some later stage.
pub fn named_pass<E, A, B>(
    name: &'static str,
    pass: TopPass<E, A, B>,
    check: Check<B>,
) -> TopPass<E, A, B>
where
    E: EnvMonoid + 'static,
    A: PrettyPrintable + 'static,
    B: PrettyPrintable + 'static,
{
    TopPass::new(move |ctx, input: A| {
        let input_pretty = pretty_string(&input);
        let outcome = catch_unwind(AssertUnwindSafe(|| pass.run(ctx, input)));
        let debug_ctx = || format!("{name} pass with input:\n{input_pretty}");
        let output = match outcome {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => return Err(add_debug_ctx(&debug_ctx(), err)),
            Err(payload) => {
                let err = Error::compiler(panic_message(payload));
                return Err(add_debug_ctx(&debug_ctx(), err));
            }
        };
        let output_pretty = pretty_string(&output);
        ctx.write_out(Output::PassInfo {
            name,
            pretty: output_pretty.clone(),
        });
        if let Some(check) = check {
            check(&output).map_err(|err| {
                add_debug_ctx(&format!("{name} pass output:\n{output_pretty}"), err)
            })?;
        }
        tracing::debug!(pass = name, "pass complete");
        Ok(output)
    })
}
