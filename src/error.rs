//! Top-level error type: wraps every stage of the pipeline plus the
//! runtime faults the executor can hit despite a successful verify pass
//! (the verifier is deliberately lenient across branches — see
//! `forthsalon_optimizer::verify` — so an unbalanced branch can still
//! blow a stack bound at actual execution time).

use thiserror::Error;

use forthsalon_frontend::ForthError;
use forthsalon_optimizer::OptimizerError;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error(transparent)]
    Compile(#[from] ForthError),

    #[error(transparent)]
    Optimize(#[from] OptimizerError),

    #[error("data stack overflow")]
    DataStackOverflow,

    #[error("data stack underflow")]
    DataStackUnderflow,

    #[error("return stack overflow")]
    ReturnStackOverflow,

    #[error("return stack underflow")]
    ReturnStackUnderflow,

    #[error("run() called before a successful parse()")]
    NotParsed,

    #[error("internal engine error: {message}")]
    Internal { message: String },
}
