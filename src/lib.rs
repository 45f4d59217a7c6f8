//! Forth Salon: an embeddable compiler and execution engine for a
//! stack-oriented, Forth-like expression language specialized for
//! per-pixel shader evaluation.
//!
//! A [`Context`] compiles source text once via [`Context::parse`], then
//! runs it as many times as needed via [`Context::run`] against a fresh
//! set of per-invocation [`Vars`] (pixel coordinates, time, audio,
//! memory). The pipeline underneath is three crates deep:
//! `forthsalon-frontend` tokenizes and compiles to a flat instruction
//! arena; `forthsalon-optimizer` inlines word calls, fuses adjacent
//! instructions, and statically verifies stack effects; this crate
//! carries the threaded-dispatch executor and the public surface.

pub mod context;
pub mod error;
pub mod executor;
pub mod pipeline;
pub mod vars;

pub use context::Context;
pub use error::{EngineError, Result};
pub use executor::Stack;
pub use vars::{Vars, MEMORY_SLOTS};

pub use forthsalon_frontend::{Arena, Op, Slot};
