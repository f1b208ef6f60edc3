//! Staged evaluation pipeline for Dex source blocks.
//!
//! The pieces, bottom up:
//! - [`carrier`] — the effect carrier threading environment reads, delta
//!   accumulation, output emission, and failure through every pass;
//! - [`pass`] — the pure-pass runner (environment + state + fresh names);
//! - [`stage`] — pipeline stages, their composition over product
//!   environments, and the named-pass decorator;
//! - [`context`] — source-region highlights and debug context for errors;
//! - [`driver`] — block dispatch and the staged module pipeline
//!   `deshadow -> type inference -> normalize -> simplify -> imp -> jit`.

pub mod carrier;
pub mod context;
pub mod driver;
pub mod pass;
pub mod stage;

pub use carrier::{run_top_pass, Sink, TopCtx};
pub use context::{add_ctx, add_debug_ctx, highlight_region};
pub use driver::{eval_block, eval_source, filter_outputs};
pub use pass::{eval_pass, lift_top_pass, run_pass, PassCtx};
pub use stage::{named_pass, Check, TopPass};

pub use dex_backend::Backend;
