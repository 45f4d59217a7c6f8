//! `Context`: the host-facing handle. Realizes the spec's C-style
//! `new`/`free`/`parse`/`run`/`d_stack_len`/`d_stack_pop` surface as an
//! owned Rust value — `new()` is infallible (no `| null` case to thread
//! through every call site), and `free` is simply `Drop`.

use forthsalon_frontend::Arena;

use crate::error::{EngineError, Result};
use crate::executor::{execute, Stack};
use crate::pipeline;
use crate::vars::Vars;

#[derive(Debug, Default)]
pub struct Context {
    program: Option<Arena>,
    d_stack: Stack,
    r_stack: Stack,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `source`. May be called only once per context — a second
    /// call on an already-parsed context is a logic error the caller
    /// should avoid by building a fresh `Context` per program.
    pub fn parse(&mut self, source: &[u8]) -> Result<()> {
        self.program = Some(pipeline::build(source)?);
        Ok(())
    }

    /// Execute the parsed program against `vars`. May be called many
    /// times after one successful `parse`; each call starts from empty
    /// stacks, since `vars` is the only state meant to carry meaning
    /// across per-pixel invocations.
    pub fn run(&mut self, vars: &mut Vars) -> Result<()> {
        let arena = self.program.as_ref().ok_or(EngineError::NotParsed)?;
        self.d_stack = Stack::new();
        self.r_stack = Stack::new();
        execute(arena, &mut self.d_stack, &mut self.r_stack, vars)
    }

    pub fn d_stack_len(&self) -> usize {
        self.d_stack.len()
    }

    pub fn d_stack_pop(&mut self) -> Result<f64> {
        self.d_stack.pop(EngineError::DataStackUnderflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_before_parse_is_an_error() {
        let mut ctx = Context::new();
        let mut vars = Vars::default();
        assert!(matches!(ctx.run(&mut vars), Err(EngineError::NotParsed)));
    }

    #[test]
    fn parse_then_run_then_inspect_residue() {
        let mut ctx = Context::new();
        ctx.parse(b"1 2 +").unwrap();
        let mut vars = Vars::default();
        ctx.run(&mut vars).unwrap();
        assert_eq!(ctx.d_stack_len(), 1);
        assert_eq!(ctx.d_stack_pop().unwrap(), 3.0);
    }

    #[test]
    fn run_may_be_called_many_times() {
        let mut ctx = Context::new();
        ctx.parse(b"1 1 +").unwrap();
        let mut vars = Vars::default();
        ctx.run(&mut vars).unwrap();
        assert_eq!(ctx.d_stack_pop().unwrap(), 2.0);
        ctx.run(&mut vars).unwrap();
        assert_eq!(ctx.d_stack_pop().unwrap(), 2.0);
    }
}
