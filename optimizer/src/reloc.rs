//! Jump-relocating arena builder, shared by the peephole optimizer.
//!
//! Rewriting a flat instruction arena (fusing instructions, deleting
//! dead ones) shifts every logical instruction after the rewrite point.
//! Relative jump offsets computed against the *old* layout are wrong
//! against the *new* one, so every jump emitted into a `RelocatingBuilder`
//! is recorded against the old absolute index it used to target, and
//! patched in once that old index is actually reached during the copy.
//!
//! This relies on the compiler's own invariant that a jump's target is
//! always an instruction boundary, and that `if`/`else`/`then` nesting is
//! always properly balanced. The inliner uses this builder too: a jump
//! *inside* a spliced word body never needs it (splicing a contiguous,
//! already-self-consistent body leaves every *relative* offset within it
//! unchanged), but a jump in the *enclosing* arena that spans an
//! `eval_code` site does, since splicing shifts everything after it.

use std::collections::HashMap;

use forthsalon_frontend::{Op, Slot};

pub struct RelocatingBuilder {
    out: Vec<Slot>,
    pending: HashMap<usize, Vec<usize>>,
}

impl RelocatingBuilder {
    pub fn new() -> Self {
        Self { out: Vec::new(), pending: HashMap::new() }
    }

    pub fn len(&self) -> usize {
        self.out.len()
    }

    /// Call immediately before copying whatever used to live at `old_index`
    /// in the source arena, so any already-emitted jump that targeted it
    /// gets patched to the position we're about to write to.
    pub fn mark_source_index(&mut self, old_index: usize) {
        if let Some(positions) = self.pending.remove(&old_index) {
            let new_index = self.out.len() as i64;
            for opcode_pos in positions {
                let offset = new_index - opcode_pos as i64;
                self.out[opcode_pos + 1] = Slot::Pc(offset);
            }
        }
    }

    pub fn push(&mut self, slot: Slot) -> usize {
        let idx = self.out.len();
        self.out.push(slot);
        idx
    }

    /// Emit a jump (`JumpIf`/`Jump`) whose target in the *source* arena was
    /// the absolute index `old_target`. The immediate is a `Pc(0)`
    /// placeholder until `mark_source_index(old_target)` is called.
    pub fn push_jump(&mut self, op: Op, old_target: usize) -> usize {
        let idx = self.out.len();
        self.out.push(Slot::Op(op));
        self.out.push(Slot::Pc(0));
        self.pending.entry(old_target).or_default().push(idx);
        idx
    }

    pub fn finish(self) -> Vec<Slot> {
        debug_assert!(
            self.pending.is_empty(),
            "relocation left {} jump target(s) unresolved",
            self.pending.len()
        );
        self.out
    }
}

impl Default for RelocatingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_jump_patches_to_new_position() {
        let mut b = RelocatingBuilder::new();
        // Old layout: [jump_if -> old index 4][drop][nop@4]
        b.push_jump(Op::JumpIf, 4);
        b.mark_source_index(1); // "drop" used to live at old index 1
        b.push(Slot::Op(Op::Drop));
        b.mark_source_index(4); // the nop that was jumped to
        b.push(Slot::Op(Op::Nop));
        let out = b.finish();
        assert_eq!(out[1], Slot::Pc(2)); // jump_if at 0, target (nop) now at 2
    }
}
