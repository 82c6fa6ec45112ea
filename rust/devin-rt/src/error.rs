//! Runtime failures (spec §7 "Runtime errors"). Each one aborts the whole
//! evaluation; there is no partial continuation.

use devin_core::Span;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    #[error("index {index} out of bounds for array of length {len}")]
    IndexOutOfBounds { index: i64, len: usize, span: Span },
    #[error("division by zero")]
    DivisionByZero { span: Span },
    #[error("assertion failed")]
    AssertionFailure { span: Span },
    #[error("'ref' argument must be an l-value")]
    RefExpectsLValue { span: Span },
    #[error("no zero-argument function named 'main'")]
    NoMain,
    #[error("function fell through without returning a value")]
    MissingReturnValue { span: Span },
    #[error("maximum call depth exceeded")]
    StackOverflow { span: Span },
}

impl EvalError {
    pub fn span(&self) -> Option<Span> {
        match self {
            EvalError::IndexOutOfBounds { span, .. }
            | EvalError::DivisionByZero { span }
            | EvalError::AssertionFailure { span }
            | EvalError::RefExpectsLValue { span }
            | EvalError::MissingReturnValue { span }
            | EvalError::StackOverflow { span } => Some(*span),
            EvalError::NoMain => None,
        }
    }
}
