//! The effect carrier: one abstraction combining environment reads, delta
//! accumulation, output emission, and failure.
//!
//! A pass body receives a [`TopCtx`] by exclusive reference and returns
//! `Result<A>`; the carrier state is the context itself. Outputs go to the
//! sink at the moment they are written and are never rolled back; the
//! delta is handed back by [`run_top_pass`] whether the pass succeeded or
//! not, and it is the caller's decision to discard it on failure.

use dex_core::env::EnvMonoid;
use dex_core::error::{Error, Result};
use dex_core::output::Output;

/// Synchronous output sink. Each write completes before the pass resumes.
pub type Sink<'s> = &'s mut dyn FnMut(Output);

pub struct TopCtx<'a, E: EnvMonoid> {
    env: &'a E,
    delta: E,
    sink: &'a mut dyn FnMut(Output),
}

impl<'a, E: EnvMonoid> TopCtx<'a, E> {
    /// The ambient read environment.
    pub fn env(&self) -> &'a E {
        self.env
    }

    /// Contribute a delta into the accumulator.
    pub fn put_env(&mut self, delta: E) {
        self.delta.combine(delta);
    }

    /// Append one output to the sink.
    pub fn write_out(&mut self, output: Output) {
        (self.sink)(output);
    }

    /// Embed a side-effecting host action, converting its error into a
    /// pipeline error.
    pub fn lift_io<A, Er>(
        &mut self,
        action: impl FnOnce() -> std::result::Result<A, Er>,
    ) -> Result<A>
    where
        Er: Into<Error>,
    {
        action().map_err(Into::into)
    }

    /// Run `body`, recovering from failure with `handler`. Outputs written
    /// and deltas contributed before the failure are retained.
    pub fn catch<A>(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<A>,
        handler: impl FnOnce(&mut Self, Error) -> Result<A>,
    ) -> Result<A> {
        match body(self) {
            Ok(value) => Ok(value),
            Err(err) => handler(self, err),
        }
    }
}

/// The sole primitive execution boundary: run `pass` against `env`,
/// funneling outputs into `sink`, and return its result together with the
/// delta accumulated up to success or failure.
pub fn run_top_pass<E, A>(
    sink: Sink<'_>,
    env: &E,
    pass: impl FnOnce(&mut TopCtx<'_, E>) -> Result<A>,
) -> (Result<A>, E)
where
    E: EnvMonoid,
{
    let mut ctx = TopCtx {
        env,
        delta: E::empty(),
        sink,
    };
    let result = pass(&mut ctx);
    (result, ctx.delta)
}

/// Run a pass against a component environment, forwarding its outputs to
/// the outer context's sink and keeping its delta separate.
pub fn run_sub_pass<'c, EO, E, A>(
    ctx: &'c mut TopCtx<'_, EO>,
    env: &'c E,
    pass: impl FnOnce(&mut TopCtx<'_, E>) -> Result<A>,
) -> (Result<A>, E)
where
    EO: EnvMonoid,
    E: EnvMonoid,
{
    run_top_pass(&mut *ctx.sink, env, pass)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dex_core::env::{Binding, TopEnv};
    use dex_core::ir::{Atom, Lit, Ty};
    use dex_core::name::Name;
    use pretty_assertions::assert_eq;

    fn binding(v: i64) -> Binding {
        Binding::Value {
            ty: Ty::Int,
            atom: Atom::Lit(Lit::Int(v)),
        }
    }

    #[test]
    fn outputs_before_failure_are_retained() {
        let mut seen = Vec::new();
        let mut sink = |output: Output| seen.push(output);
        let env = TopEnv::new();
        let (result, _delta): (Result<()>, TopEnv) = run_top_pass(&mut sink, &env, |ctx| {
            ctx.write_out(Output::text("first"));
            Err(Error::runtime("boom"))
        });
        assert!(result.is_err());
        assert_eq!(seen, vec![Output::text("first")]);
    }

    #[test]
    fn delta_reflects_every_put_env_once() {
        let mut sink = |_| {};
        let env = TopEnv::new();
        let (result, delta) = run_top_pass(&mut sink, &env, |ctx| {
            let mut d1 = TopEnv::new();
            d1.insert(Name::source("a"), binding(1));
            ctx.put_env(d1);
            let mut d2 = TopEnv::new();
            d2.insert(Name::source("b"), binding(2));
            ctx.put_env(d2);
            Ok(())
        });
        assert!(result.is_ok());
        assert_eq!(delta.len(), 2);
    }

    #[test]
    fn catch_recovers_and_keeps_prior_effects() {
        let mut seen = Vec::new();
        let mut sink = |output: Output| seen.push(output);
        let env = TopEnv::new();
        let (result, delta) = run_top_pass(&mut sink, &env, |ctx| {
            ctx.catch(
                |ctx| {
                    let mut d = TopEnv::new();
                    d.insert(Name::source("a"), binding(1));
                    ctx.put_env(d);
                    ctx.write_out(Output::text("kept"));
                    Err(Error::runtime("boom"))
                },
                |ctx, err| {
                    ctx.write_out(Output::text(err.msg));
                    Ok(42)
                },
            )
        });
        assert_eq!(result.expect("recovered"), 42);
        assert_eq!(delta.len(), 1);
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn lift_io_maps_host_errors() {
        let mut sink = |_| {};
        let env = TopEnv::new();
        let (result, _): (Result<String>, TopEnv) = run_top_pass(&mut sink, &env, |ctx| {
            ctx.lift_io(|| -> std::io::Result<String> {
                Err(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "missing",
                ))
            })
        });
        assert_eq!(result.expect_err("io error").kind, dex_core::ErrorKind::Runtime);
    }
}
