//! Pure pass runner: environment + private state + fresh names + failure,
//! with no I/O, no outputs, and no environment delta.
//!
//! Passes whose bookkeeping must not leak as top-level state run here and
//! are lifted into the effect carrier with [`lift_top_pass`].

use crate::carrier::TopCtx;
use dex_core::env::EnvMonoid;
use dex_core::error::Result;
use dex_core::name::FreshScope;

pub struct PassCtx<'a, E, S> {
    pub env: &'a E,
    pub state: S,
    pub scope: FreshScope,
}

/// Evaluate a pure pass, returning its value and terminal state.
pub fn run_pass<E, S, A>(
    env: &E,
    state: S,
    scope: FreshScope,
    pass: impl FnOnce(&mut PassCtx<'_, E, S>) -> Result<A>,
) -> Result<(A, S)> {
    let mut ctx = PassCtx { env, state, scope };
    let value = pass(&mut ctx)?;
    Ok((value, ctx.state))
}

/// Evaluate a pure pass, discarding its terminal state.
pub fn eval_pass<E, S, A>(
    env: &E,
    state: S,
    scope: FreshScope,
    pass: impl FnOnce(&mut PassCtx<'_, E, S>) -> Result<A>,
) -> Result<A> {
    run_pass(env, state, scope, pass).map(|(value, _)| value)
}

/// Run a pure pass inside a top pass: read the ambient environment, run,
/// and fold the result or error back into the carrier.
pub fn lift_top_pass<E, S, A>(
    ctx: &mut TopCtx<'_, E>,
    state: S,
    scope: FreshScope,
    pass: impl FnOnce(&mut PassCtx<'_, E, S>) -> Result<A>,
) -> Result<A>
where
    E: EnvMonoid,
{
    eval_pass(ctx.env(), state, scope, pass)
}
