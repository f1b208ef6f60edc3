//! Execution backend: turns an imperative module into session bindings.

pub mod jit;

pub use jit::JitBackend;

/// Which backend a block is evaluated against. Only `Jit` is wired
/// through; `Interp` is reserved and currently evaluates nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Jit,
    Interp,
}
