//! Stack-effect verifier: a single symbolic pass over the final arena
//! tracking only stack *depth*, never values.
//!
//! Control-flow opcodes (`jump_if`, `jump`, `nop`, `halt`) are treated as
//! zero-effect and the simulation never forks at a branch — it walks the
//! flat instruction stream exactly once, in source order, the same way
//! regardless of which way a `jump_if` would actually go at runtime. This
//! is deliberately lenient: a word that balances the stack on one arm of
//! an `if` but not the other is accepted here and only surfaces as an
//! underflow if the executor actually takes the unbalanced arm.

use forthsalon_frontend::{arity_of_op, private_arity, Arena, Op, Slot};
use tracing::debug;

use crate::error::{OptimizerError, Result};

/// Matches the executor's fixed 32-double stacks: depth may never reach it.
const STACK_CAPACITY: i64 = 32;

pub fn verify(arena: &Arena) -> Result<()> {
    let mut d_depth: i64 = 0;
    let mut r_depth: i64 = 0;
    let slots = arena.as_slice();
    let mut i = 0;

    while i < slots.len() {
        match &slots[i] {
            Slot::Op(op) => {
                let (d_pop, d_push, r_pop, r_push) = arity_of(*op)?;
                if d_depth < d_pop as i64 {
                    return Err(OptimizerError::StackUnderflow {
                        op: op_name(*op),
                        stack: "data",
                    });
                }
                if r_depth < r_pop as i64 {
                    return Err(OptimizerError::StackUnderflow {
                        op: op_name(*op),
                        stack: "return",
                    });
                }
                d_depth += d_push as i64 - d_pop as i64;
                r_depth += r_push as i64 - r_pop as i64;
                if d_depth >= STACK_CAPACITY {
                    return Err(OptimizerError::StackOverflow {
                        op: op_name(*op),
                        stack: "data",
                        depth: d_depth,
                    });
                }
                if r_depth >= STACK_CAPACITY {
                    return Err(OptimizerError::StackOverflow {
                        op: op_name(*op),
                        stack: "return",
                        depth: r_depth,
                    });
                }
                i += 1 + op.immediate_width();
            }
            _ => i += 1,
        }
    }

    if d_depth < 0 || r_depth < 0 {
        return Err(OptimizerError::StackUnderflow { op: "<end>".to_string(), stack: "data" });
    }

    debug!(instructions = arena.len(), "verify: stack effects balanced");
    Ok(())
}

fn arity_of(op: Op) -> Result<(u8, u8, u8, u8)> {
    match op {
        Op::Number => Ok((0, 1, 0, 0)),
        Op::JumpIf | Op::Jump | Op::Nop | Op::Halt => Ok((0, 0, 0, 0)),
        Op::EvalCode => Err(OptimizerError::Internal {
            message: "eval_code must be inlined before verification".to_string(),
        }),
        other => arity_of_op(other).or_else(|| private_arity(other)).ok_or_else(|| {
            OptimizerError::Internal { message: format!("no declared arity for {other:?}") }
        }),
    }
}

fn op_name(op: Op) -> String {
    format!("{op:?}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use forthsalon_frontend::parse;

    fn pipeline(source: &str) -> Arena {
        let (dict, main) = parse(source.as_bytes()).unwrap();
        let inlined = crate::inline::inline(&dict, &main).unwrap();
        crate::peephole::optimize(&inlined)
    }

    #[test]
    fn balanced_program_verifies() {
        let arena = pipeline("1 2 + dup *");
        assert!(verify(&arena).is_ok());
    }

    #[test]
    fn underflow_is_rejected() {
        let arena = pipeline("+");
        assert!(matches!(verify(&arena), Err(OptimizerError::StackUnderflow { .. })));
    }

    #[test]
    fn fused_ops_carry_correct_arity() {
        let arena = pipeline("3 dup *");
        assert!(verify(&arena).is_ok());
    }

    #[test]
    fn unbalanced_branch_is_accepted_leniently() {
        // `then` arm leaves one extra value; the linear pass doesn't
        // notice because it never diverges at the branch.
        let arena = pipeline("1 if 2 3 else 4 then");
        assert!(verify(&arena).is_ok());
    }
}
