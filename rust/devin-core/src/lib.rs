//! Devin Core
//!
//! Shared syntax model (spans, AST, static types) used by the compiler and
//! runtime crates.

pub mod ast;
pub mod span;
pub mod types;

pub use span::Span;
pub use types::Type;
