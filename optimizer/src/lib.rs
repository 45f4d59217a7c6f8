//! Inlining, peephole fusion and stack-effect verification for a
//! compiled Forth Salon program, run in that order.

pub mod error;
pub mod inline;
pub mod peephole;
pub mod reloc;
pub mod verify;

use forthsalon_frontend::{Arena, Dictionary};

pub use error::{OptimizerError, Result};

/// Runs the full optimizer pipeline over a freshly compiled `main` arena:
/// inline every word call, fuse what the peephole recognizes, then verify
/// the result never underflows either stack.
pub fn optimize(dict: &Dictionary, main: &Arena) -> Result<Arena> {
    let inlined = inline::inline(dict, main)?;
    let fused = peephole::optimize(&inlined);
    verify::verify(&fused)?;
    Ok(fused)
}

#[cfg(test)]
mod tests {
    use super::*;
    use forthsalon_frontend::parse;

    #[test]
    fn full_pipeline_runs_end_to_end() {
        let (dict, main) = parse(b": sq dup * ; 3 sq 1 pi * 2 /").unwrap();
        let arena = optimize(&dict, &main).unwrap();
        assert!(!arena.is_empty());
    }
}
