//! Peephole optimizer: fuses short, common instruction sequences into
//! single private opcodes the executor can run in one dispatch step.
//!
//! Fusion operates on "logical instructions" — an opcode plus whatever
//! immediate slots it owns — never on raw `Slot` indices, so a `Number`
//! or jump's immediate can never be mistaken for a separate instruction.
//! Each append tries to fuse with the tail of the output built so far in
//! a loop, so cascades (`pi *` -> `multpi`, then `multpi 2 /` ->
//! `multhalfpi`) collapse within a single outer pass. The outer pass runs
//! at most twice, stopping immediately if a pass changes nothing.

use smallvec::SmallVec;
use tracing::debug;

use forthsalon_frontend::{Arena, Op, Slot};

use crate::reloc::RelocatingBuilder;

const MAX_PASSES: usize = 2;

#[derive(Debug, Clone, PartialEq)]
enum Instr {
    Op(Op),
    Number(f64),
    Jump { op: Op, old_target: usize },
}

struct Fused {
    /// Every old absolute slot index this logical instruction subsumes,
    /// so a jump that targeted any of them still lands here. The
    /// triple constant-fold rule is the deepest fusion in this pass, so
    /// four inline slots cover every case without spilling to the heap.
    old_indices: SmallVec<[usize; 4]>,
    instr: Instr,
}

pub fn optimize(arena: &Arena) -> Arena {
    let before = arena.len();
    let mut current = arena.clone();
    for pass in 0..MAX_PASSES {
        let instrs = normalize(&current);
        let (fused, changed) = fuse(instrs);
        if !changed {
            break;
        }
        let pass_before = current.len();
        current = emit(fused);
        debug!(pass, before = pass_before, after = current.len(), "peephole: pass instruction count");
    }
    debug!(before, after = current.len(), "peephole: instruction count");
    current
}

fn normalize(arena: &Arena) -> Vec<(usize, Instr)> {
    let slots = arena.as_slice();
    let mut out = Vec::new();
    let mut i = 0;
    while i < slots.len() {
        match &slots[i] {
            Slot::Op(Op::Number) => {
                let value = match slots.get(i + 1) {
                    Some(Slot::Number(v)) => *v,
                    _ => 0.0,
                };
                out.push((i, Instr::Number(value)));
                i += 2;
            }
            Slot::Op(op) if op.is_jump() => {
                let offset = match slots.get(i + 1) {
                    Some(Slot::Pc(o)) => *o,
                    _ => 0,
                };
                let target = (i as i64 + offset) as usize;
                out.push((i, Instr::Jump { op: *op, old_target: target }));
                i += 2;
            }
            Slot::Op(op) => {
                out.push((i, Instr::Op(*op)));
                i += 1;
            }
            _ => {
                i += 1;
            }
        }
    }
    out
}

/// `peephole_1`: pairs of adjacent instructions that always collapse to
/// one private opcode, regardless of what came before them.
fn fuse_pair(a: &Instr, b: &Instr) -> Option<Instr> {
    match (a, b) {
        (Instr::Op(Op::Mul), Instr::Op(Op::Add)) => Some(Instr::Op(Op::Fma)),
        (Instr::Op(Op::Pi), Instr::Op(Op::Mul)) => Some(Instr::Op(Op::MultPi)),
        (Instr::Op(Op::Dup), Instr::Op(Op::Dup)) => Some(Instr::Op(Op::DupDup)),
        (Instr::Op(Op::NegRot), Instr::Op(Op::Swap)) => Some(Instr::Op(Op::NegRotSwap)),
        (Instr::Op(Op::Ge), Instr::Op(Op::Swap)) => Some(Instr::Op(Op::GeSwap)),
        (Instr::Op(Op::MultPi), Instr::Op(Op::Div2)) => Some(Instr::Op(Op::MultHalfPi)),
        // `peephole_n` strength reductions that only need two slots.
        (Instr::Number(v), Instr::Op(Op::Mul)) if *v == 2.0 => Some(Instr::Op(Op::Mult2)),
        (Instr::Number(v), Instr::Op(Op::Div)) if *v == 2.0 => Some(Instr::Op(Op::Div2)),
        (Instr::Number(v), Instr::Op(Op::Exponent)) if *v == 2.0 => Some(Instr::Op(Op::Pow2)),
        // A `mult2` whose input is now known to be a literal folds away.
        (Instr::Number(k), Instr::Op(Op::Mult2)) => Some(Instr::Number(k * 2.0)),
        _ => None,
    }
}

/// `peephole_n`: constant folding over two number literals and the
/// arithmetic op that consumes them. Division by zero folds to `+inf`,
/// matching the executor's own runtime convention.
fn fuse_triple(a: &Instr, b: &Instr, c: &Instr) -> Option<Instr> {
    let (Instr::Number(x), Instr::Number(y), Instr::Op(op)) = (a, b, c) else {
        return None;
    };
    let folded = match op {
        Op::Add => x + y,
        Op::Sub => x - y,
        Op::Mul => x * y,
        Op::Div => {
            if *y == 0.0 {
                f64::INFINITY
            } else {
                x / y
            }
        }
        _ => return None,
    };
    Some(Instr::Number(folded))
}

fn fuse(instrs: Vec<(usize, Instr)>) -> (Vec<Fused>, bool) {
    let mut out: Vec<Fused> = Vec::with_capacity(instrs.len());
    let mut changed = false;

    for (old_index, instr) in instrs {
        out.push(Fused { old_indices: SmallVec::from_elem(old_index, 1), instr });

        loop {
            let n = out.len();
            let fused_instr = if n >= 3 {
                fuse_triple(&out[n - 3].instr, &out[n - 2].instr, &out[n - 1].instr)
            } else {
                None
            };
            let (arity, fused_instr) = match fused_instr {
                Some(instr) => (3, Some(instr)),
                None if n >= 2 => (2, fuse_pair(&out[n - 2].instr, &out[n - 1].instr)),
                None => (0, None),
            };
            match fused_instr {
                Some(instr) => {
                    // `arity` came from `n >= arity` just above, so `out`
                    // always has enough entries left to pop.
                    let mut merged_indices: SmallVec<[usize; 4]> = SmallVec::new();
                    for _ in 0..arity {
                        let mut popped = out.pop().unwrap().old_indices;
                        popped.extend(merged_indices.drain(..));
                        merged_indices = popped;
                    }
                    out.push(Fused { old_indices: merged_indices, instr });
                    changed = true;
                }
                None => break,
            }
        }
    }

    (out, changed)
}

fn emit(fused: Vec<Fused>) -> Arena {
    let mut builder = RelocatingBuilder::new();
    for f in fused {
        for old_index in &f.old_indices {
            builder.mark_source_index(*old_index);
        }
        match f.instr {
            Instr::Op(op) => {
                builder.push(Slot::Op(op));
            }
            Instr::Number(v) => {
                builder.push(Slot::Op(Op::Number));
                builder.push(Slot::Number(v));
            }
            Instr::Jump { op, old_target } => {
                builder.push_jump(op, old_target);
            }
        }
    }
    Arena::from_slots(builder.finish())
}
