//! Core data model for the Dex compiler.
//!
//! This crate holds everything the staged pipeline passes share: source
//! spans, the structured error type, unique names, the top-level binding
//! environment, the three intermediate representations (surface, typed
//! core, imperative), pipeline outputs, pretty-printing, and the front end
//! that turns raw text into source blocks.

pub mod block;
pub mod env;
pub mod error;
pub mod frontend;
pub mod imp;
pub mod ir;
pub mod name;
pub mod output;
pub mod pretty;
pub mod span;
pub mod surface;
pub mod value;

// Re-export so downstream crates log through one tracing instance.
pub use tracing;

pub use error::{Error, ErrorKind, Result};
pub use span::Span;
