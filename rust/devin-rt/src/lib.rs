//! Devin Runtime
//!
//! The tree-walking evaluator: runtime values, the shared heap, the
//! variable/function environment, and runtime failures. Consumes a
//! [`devin_core::ast::Devin`] that has already been through
//! `devin_compiler::check` — it does not re-validate types and will panic
//! via `unreachable!` if handed an ill-typed tree.

pub mod env;
pub mod error;
pub mod evaluator;
pub mod value;

pub use env::{Environment, FunctionEntry, FunctionTable, ParamSpec};
pub use error::EvalError;
pub use evaluator::{evaluate, make_predefined_state, State};
pub use value::{ArrayId, CellId, FunctionId, Heap, Location, Value};
