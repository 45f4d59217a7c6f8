//! Orchestrates the full source-to-executable pipeline: compile, then
//! inline, fuse, and verify. `Context::parse` is a thin wrapper over
//! this; it exists on its own so the stages can be exercised without a
//! `Context` in tests and benchmarks.

use forthsalon_frontend::{parse as compile, Arena};
use forthsalon_optimizer::optimize;

use crate::error::Result;

pub fn build(source: &[u8]) -> Result<Arena> {
    let (dict, main) = compile(source)?;
    let arena = optimize(&dict, &main)?;
    Ok(arena)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{execute, Stack};
    use crate::vars::Vars;

    fn run_scenario(source: &str, vars: &mut Vars) -> Vec<f64> {
        let arena = build(source.as_bytes()).unwrap();
        let mut d = Stack::new();
        let mut r = Stack::new();
        execute(&arena, &mut d, &mut r, vars).unwrap();
        d.as_slice().to_vec()
    }

    #[test]
    fn scenario_addition() {
        assert_eq!(run_scenario("1 2 +", &mut Vars::default()), vec![3.0]);
    }

    #[test]
    fn scenario_constant_folding() {
        assert_eq!(run_scenario("3 4 * 2 +", &mut Vars::default()), vec![14.0]);
    }

    #[test]
    fn scenario_user_word() {
        assert_eq!(run_scenario(": sq dup * ; 5 sq", &mut Vars::default()), vec![25.0]);
    }

    #[test]
    fn scenario_branch_x_zero() {
        let mut vars = Vars { x: 0.0, ..Vars::default() };
        assert_eq!(run_scenario("x if 10 else 20 then", &mut vars), vec![20.0]);
    }

    #[test]
    fn scenario_branch_x_one() {
        let mut vars = Vars { x: 1.0, ..Vars::default() };
        assert_eq!(run_scenario("x if 10 else 20 then", &mut vars), vec![10.0]);
    }

    const NICE_JUANITA: &str = ": nice 60 5 4 + + ; : juanita 400 10 5 5 + + + ; x if nice else juanita then 2 * 4 / 2 *";

    #[test]
    fn scenario_nice_juanita_x_zero_takes_juanita() {
        let mut vars = Vars { x: 0.0, y: 0.0, ..Vars::default() };
        assert_eq!(run_scenario(NICE_JUANITA, &mut vars), vec![420.0]);
    }

    #[test]
    fn scenario_nice_juanita_x_one_takes_nice() {
        let mut vars = Vars { x: 1.0, y: 0.0, ..Vars::default() };
        assert_eq!(run_scenario(NICE_JUANITA, &mut vars), vec![69.0]);
    }

    #[test]
    fn scenario_division_by_zero() {
        assert_eq!(run_scenario("1 0 /", &mut Vars::default()), vec![f64::INFINITY]);
    }

    #[test]
    fn scenario_pi_fusion() {
        let result = run_scenario("pi 2 *", &mut Vars::default());
        assert_eq!(result.len(), 1);
        assert!((result[0] - 2.0 * std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn negative_open_definition_never_closed() {
        assert!(build(b": foo").is_err());
    }

    #[test]
    fn negative_then_without_if() {
        assert!(build(b"if then").is_err());
    }

    #[test]
    fn negative_self_recursion_hits_inline_limit() {
        assert!(build(b": foo foo ; foo").is_err());
    }

    #[test]
    fn negative_stack_underflow() {
        assert!(build(b"+").is_err());
    }

    #[test]
    fn negative_overlong_token() {
        let source = "a".repeat(65);
        assert!(build(source.as_bytes()).is_err());
    }

    #[test]
    fn negative_non_printable_byte() {
        assert!(build(&[0xffu8]).is_err());
    }
}
