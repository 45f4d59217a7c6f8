//! Error types for the Forth Salon optimizer pipeline (inliner, peephole,
//! stack-effect verifier).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, OptimizerError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptimizerError {
    #[error("inlining '{word}' exceeded the 100-frame recursion limit")]
    RecursionLimitExceeded { word: String },

    #[error("inlining referenced undefined word: {word}")]
    UndefinedWord { word: String },

    #[error("{stack} stack underflow at '{op}'")]
    StackUnderflow { op: String, stack: &'static str },

    #[error("{stack} stack overflow at '{op}' (depth reached {depth}, max 32)")]
    StackOverflow { op: String, stack: &'static str, depth: i64 },

    #[error("internal optimizer error: {message}")]
    Internal { message: String },
}
