//! Black-box scenario tests against the public `Context` API, covering
//! the literal worked examples this dialect is expected to reproduce.

use forthsalon::{Context, Vars};

fn run(source: &str, vars: &mut Vars) -> f64 {
    let mut ctx = Context::new();
    ctx.parse(source.as_bytes()).expect("parse should succeed");
    ctx.run(vars).expect("run should succeed");
    assert_eq!(ctx.d_stack_len(), 1, "scenario `{source}` left more than one residue value");
    ctx.d_stack_pop().unwrap()
}

#[test]
fn addition() {
    assert_eq!(run("1 2 +", &mut Vars::default()), 3.0);
}

#[test]
fn constant_folded_expression() {
    assert_eq!(run("3 4 * 2 +", &mut Vars::default()), 14.0);
}

#[test]
fn user_word_call() {
    assert_eq!(run(": sq dup * ; 5 sq", &mut Vars::default()), 25.0);
}

#[test]
fn branch_false_takes_else() {
    let mut vars = Vars { x: 0.0, ..Vars::default() };
    assert_eq!(run("x if 10 else 20 then", &mut vars), 20.0);
}

#[test]
fn branch_true_takes_if() {
    let mut vars = Vars { x: 1.0, ..Vars::default() };
    assert_eq!(run("x if 10 else 20 then", &mut vars), 10.0);
}

const NICE_JUANITA: &str =
    ": nice 60 5 4 + + ; : juanita 400 10 5 5 + + + ; x if nice else juanita then 2 * 4 / 2 *";

#[test]
fn nested_words_inside_branches_x_zero() {
    let mut vars = Vars { x: 0.0, y: 0.0, ..Vars::default() };
    assert_eq!(run(NICE_JUANITA, &mut vars), 420.0);
}

#[test]
fn nested_words_inside_branches_x_one() {
    let mut vars = Vars { x: 1.0, y: 0.0, ..Vars::default() };
    assert_eq!(run(NICE_JUANITA, &mut vars), 69.0);
}

#[test]
fn division_by_zero_is_positive_infinity() {
    assert_eq!(run("1 0 /", &mut Vars::default()), f64::INFINITY);
}

#[test]
fn pi_multiply_fuses_and_still_computes_two_pi() {
    let result = run("pi 2 *", &mut Vars::default());
    assert!((result - 2.0 * std::f64::consts::PI).abs() < 1e-12);
}

#[test]
fn run_can_be_repeated_across_pixels() {
    let mut ctx = Context::new();
    ctx.parse(b"x x *").unwrap();

    let mut vars = Vars { x: 3.0, ..Vars::default() };
    ctx.run(&mut vars).unwrap();
    assert_eq!(ctx.d_stack_pop().unwrap(), 9.0);

    let mut vars = Vars { x: 5.0, ..Vars::default() };
    ctx.run(&mut vars).unwrap();
    assert_eq!(ctx.d_stack_pop().unwrap(), 25.0);
}

#[test]
fn memory_slots_persist_across_runs_via_vars() {
    let mut ctx = Context::new();
    ctx.parse(b"1 0 !").unwrap();
    let mut vars = Vars::default();
    ctx.run(&mut vars).unwrap();
    assert_eq!(vars.memory_get(0.0), 1.0);
}
