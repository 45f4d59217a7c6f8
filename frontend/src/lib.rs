//! Tokenizer and compiler for the Forth Salon dialect: turns source text
//! into a `Dictionary` of user words plus a `main` instruction arena.
//!
//! This crate stops at compile time. Inlining, peephole optimization and
//! stack-effect verification live in `forthsalon-optimizer`; execution
//! lives in the root `forthsalon` crate.

pub mod arena;
pub mod builtins;
pub mod compiler;
pub mod dictionary;
pub mod error;

pub use arena::{Arena, Op, Slot};
pub use builtins::{arity_of_op, find_builtin, is_compiler_word, private_arity, BuiltinDef, BUILTINS};
pub use compiler::parse;
pub use dictionary::{Dictionary, WordEntry};
pub use error::{ForthError, Result};
