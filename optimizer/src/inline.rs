//! Inlining: replace every `eval_code` with a copy of the referenced
//! word's body, transitively, until only `main` remains.
//!
//! Each word's fully-expanded body is computed once and memoized, since
//! the same word can be called from many call sites. A word under active
//! expansion is tracked on a call stack capped at 100 frames; exceeding it
//! means the dictionary contains runaway (direct or mutual) recursion.
//!
//! Splicing a word's body into a call site never needs to touch a jump
//! offset *inside* that body: `Slot::Pc` stores an offset relative to its
//! own opcode, and a word's own branches can never target an instruction
//! outside the word (the compiler only ever balances `if`/`else`/`then`
//! within a single definition), so copying the body as one contiguous
//! block leaves its internal jumps correct as-is.
//!
//! A jump in the *enclosing* arena is a different matter: splicing a body
//! in place of the `eval_code` it replaces can grow or shrink that call
//! site by an arbitrary number of slots, shifting every enclosing jump
//! target that lies beyond it. Those jumps are routed through the same
//! `RelocatingBuilder` the peephole pass uses, keyed on the absolute
//! target index in the arena currently being expanded, so each is patched
//! once the instruction it targets is actually reached in the rewrite.

use std::collections::HashMap;

use forthsalon_frontend::{Arena, Dictionary, Op, Slot};
use tracing::debug;

use crate::error::{OptimizerError, Result};
use crate::reloc::RelocatingBuilder;

const MAX_RECURSION_DEPTH: usize = 100;

pub fn inline(dict: &Dictionary, main: &Arena) -> Result<Arena> {
    let mut cache: HashMap<String, Arena> = HashMap::new();
    let mut stack: Vec<String> = Vec::new();
    let before = main.len();
    let expanded = expand(main, dict, &mut cache, &mut stack)?;
    debug!(before, after = expanded.len(), "inline: instruction count");
    Ok(expanded)
}

fn expand_word(
    name: &str,
    dict: &Dictionary,
    cache: &mut HashMap<String, Arena>,
    stack: &mut Vec<String>,
) -> Result<Arena> {
    if let Some(cached) = cache.get(name) {
        return Ok(cached.clone());
    }
    if stack.len() >= MAX_RECURSION_DEPTH {
        return Err(OptimizerError::RecursionLimitExceeded { word: name.to_string() });
    }
    let body = dict
        .user_arena(name)
        .ok_or_else(|| OptimizerError::UndefinedWord { word: name.to_string() })?
        .clone();

    stack.push(name.to_string());
    let expanded = expand(&body, dict, cache, stack)?;
    stack.pop();

    cache.insert(name.to_string(), expanded.clone());
    Ok(expanded)
}

/// Expand every `eval_code` in `arena`, relocating jumps that belong to
/// `arena` itself (never ones inside a spliced-in body, which stay
/// self-consistent) against their new positions.
fn expand(
    arena: &Arena,
    dict: &Dictionary,
    cache: &mut HashMap<String, Arena>,
    stack: &mut Vec<String>,
) -> Result<Arena> {
    let slots = arena.as_slice();
    let mut builder = RelocatingBuilder::new();
    let mut i = 0;

    while i < slots.len() {
        builder.mark_source_index(i);
        match &slots[i] {
            Slot::Op(Op::EvalCode) => {
                let name = match slots.get(i + 1) {
                    Some(Slot::CodeRef(name)) => name.clone(),
                    _ => {
                        return Err(OptimizerError::Internal {
                            message: "eval_code immediate is not a CodeRef".to_string(),
                        })
                    }
                };
                let body = expand_word(&name, dict, cache, stack)?;
                for slot in body.into_slots() {
                    builder.push(slot);
                }
                i += 2;
            }
            Slot::Op(op) if op.is_jump() => {
                let offset = match slots.get(i + 1) {
                    Some(Slot::Pc(o)) => *o,
                    _ => {
                        return Err(OptimizerError::Internal {
                            message: "jump immediate is not a Pc offset".to_string(),
                        })
                    }
                };
                let old_target = (i as i64 + offset) as usize;
                builder.push_jump(*op, old_target);
                i += 2;
            }
            Slot::Op(op) => {
                let width = op.immediate_width();
                builder.push(Slot::Op(*op));
                for k in 0..width {
                    builder.push(slots[i + 1 + k].clone());
                }
                i += 1 + width;
            }
            other => {
                builder.push(other.clone());
                i += 1;
            }
        }
    }

    Ok(Arena::from_slots(builder.finish()))
}
