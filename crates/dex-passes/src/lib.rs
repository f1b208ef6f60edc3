//! Lowering passes for the Dex staged pipeline.
//!
//! Each pass is a total transformation between two IRs, possibly consulting
//! the session environment; the checkers in [`check`] verify pass
//! post-conditions. Sequencing, output capture, and error context live in
//! `dex-pipeline`.

pub mod check;
pub mod deshadow;
pub mod imp_lower;
pub mod infer;
pub mod normalize;
pub mod simplify;

pub use check::{check_imp_module, check_module};
pub use deshadow::Deshadow;
pub use imp_lower::ImpLower;
pub use infer::TypeInfer;
pub use normalize::Normalize;
pub use simplify::Simplify;
