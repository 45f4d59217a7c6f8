//! The built-in registry: a static, append-only table of ordinary words,
//! plus a disjoint table of compiler built-ins that run at compile time.
//!
//! Private built-ins synthesized by the peephole optimizer are *not*
//! listed here — they never have a source-level name, so they cannot
//! appear in the dictionary at all (see `forthsalon_frontend::arena`).

use crate::arena::Op;

/// One row of the built-in registry: name, dispatch opcode, and its
/// declared data-stack/return-stack push/pop arities.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinDef {
    pub name: &'static str,
    pub op: Op,
    pub d_pop: u8,
    pub d_push: u8,
    pub r_pop: u8,
    pub r_push: u8,
}

const fn b(name: &'static str, op: Op, d_pop: u8, d_push: u8, r_pop: u8, r_push: u8) -> BuiltinDef {
    BuiltinDef { name, op, d_pop, d_push, r_pop, r_push }
}

/// Ordinary built-ins, reachable by name from source.
pub const BUILTINS: &[BuiltinDef] = &[
    b("dup", Op::Dup, 1, 2, 0, 0),
    b("over", Op::Over, 2, 3, 0, 0),
    b("2dup", Op::TwoDup, 2, 4, 0, 0),
    b("drop", Op::Drop, 1, 0, 0, 0),
    b("swap", Op::Swap, 2, 2, 0, 0),
    b("rot", Op::Rot, 3, 3, 0, 0),
    b("-rot", Op::NegRot, 3, 3, 0, 0),
    b("push", Op::ToR, 1, 0, 0, 1),
    b("pop", Op::FromR, 0, 1, 1, 0),
    b(">r", Op::ToR, 1, 0, 0, 1),
    b("r>", Op::FromR, 0, 1, 1, 0),
    b("r@", Op::RFetch, 0, 1, 1, 1),
    b("@", Op::At, 1, 1, 0, 0),
    b("!", Op::Bang, 2, 0, 0, 0),
    b("=", Op::Eq, 2, 1, 0, 0),
    b("<>", Op::Ne, 2, 1, 0, 0),
    b(">", Op::Gt, 2, 1, 0, 0),
    b("<", Op::Lt, 2, 1, 0, 0),
    b(">=", Op::Ge, 2, 1, 0, 0),
    b("<=", Op::Le, 2, 1, 0, 0),
    b("+", Op::Add, 2, 1, 0, 0),
    b("-", Op::Sub, 2, 1, 0, 0),
    b("*", Op::Mul, 2, 1, 0, 0),
    b("/", Op::Div, 2, 1, 0, 0),
    b("mod", Op::Mod, 2, 1, 0, 0),
    b("pow", Op::Pow, 2, 1, 0, 0),
    b("**", Op::Exponent, 2, 1, 0, 0),
    b("negate", Op::Negate, 1, 1, 0, 0),
    b("sin", Op::Sin, 1, 1, 0, 0),
    b("cos", Op::Cos, 1, 1, 0, 0),
    b("tan", Op::Tan, 1, 1, 0, 0),
    b("log", Op::Log, 1, 1, 0, 0),
    b("exp", Op::Exp, 1, 1, 0, 0),
    b("sqrt", Op::Sqrt, 1, 1, 0, 0),
    b("floor", Op::Floor, 1, 1, 0, 0),
    b("ceil", Op::Ceil, 1, 1, 0, 0),
    b("abs", Op::Abs, 1, 1, 0, 0),
    b("atan2", Op::Atan2, 2, 1, 0, 0),
    b("min", Op::Min, 2, 1, 0, 0),
    b("max", Op::Max, 2, 1, 0, 0),
    b("pi", Op::Pi, 0, 1, 0, 0),
    b("random", Op::Random, 0, 1, 0, 0),
    b("and", Op::And, 2, 1, 0, 0),
    b("or", Op::Or, 2, 1, 0, 0),
    b("not", Op::Not, 1, 1, 0, 0),
    b("z+", Op::ZPlus, 4, 2, 0, 0),
    b("z*", Op::ZMul, 4, 2, 0, 0),
    b("x", Op::X, 0, 1, 0, 0),
    b("y", Op::Y, 0, 1, 0, 0),
    b("t", Op::T, 0, 1, 0, 0),
    b("dt", Op::Dt, 0, 1, 0, 0),
    b("mx", Op::Mx, 0, 1, 0, 0),
    b("my", Op::My, 0, 1, 0, 0),
    b("button", Op::Button, 1, 1, 0, 0),
    b("buttons", Op::Buttons, 0, 1, 0, 0),
    b("audio", Op::Audio, 0, 1, 0, 0),
    b("sample", Op::Sample, 1, 1, 0, 0),
    b("bwsample", Op::BwSample, 2, 1, 0, 0),
];

/// Arity of a private, optimizer-only opcode, for the verifier. Not name
/// addressable: callers look these up by `Op`, never by string.
pub fn private_arity(op: Op) -> Option<(u8, u8, u8, u8)> {
    match op {
        Op::Fma => Some((3, 1, 0, 0)),
        Op::MultPi => Some((1, 1, 0, 0)),
        Op::DupDup => Some((1, 3, 0, 0)),
        Op::NegRotSwap => Some((3, 3, 0, 0)),
        Op::GeSwap => Some((3, 2, 0, 0)),
        Op::MultHalfPi => Some((1, 1, 0, 0)),
        Op::Mult2 => Some((1, 1, 0, 0)),
        Op::Div2 => Some((1, 1, 0, 0)),
        Op::Pow2 => Some((1, 1, 0, 0)),
        _ => None,
    }
}

pub fn find_builtin(name: &str) -> Option<&'static BuiltinDef> {
    BUILTINS.iter().find(|b| b.name == name)
}

/// Reverse lookup used by the verifier, which only ever has an `Op` in
/// hand (several names can share one opcode, e.g. `push`/`>r`, so this
/// returns the arity of whichever entry matches first — they agree).
pub fn arity_of_op(op: Op) -> Option<(u8, u8, u8, u8)> {
    BUILTINS
        .iter()
        .find(|b| b.op == op)
        .map(|b| (b.d_pop, b.d_push, b.r_pop, b.r_push))
}

/// Names that dispatch to compile-time behavior instead of being pushed
/// as an ordinary call. Kept disjoint from `BUILTINS`: a name is never in
/// both tables, and neither table is consulted for a name in the other.
pub const COMPILER_WORDS: &[&str] = &[":", ";", "if", "else", "then", "\\", "("];

pub fn is_compiler_word(name: &str) -> bool {
    COMPILER_WORDS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_lookup_is_exact() {
        assert!(find_builtin("dup").is_some());
        assert!(find_builtin("DUP").is_none());
        assert!(find_builtin(" multpi").is_none());
    }

    #[test]
    fn compiler_words_disjoint_from_builtins() {
        for name in COMPILER_WORDS {
            assert!(find_builtin(name).is_none());
        }
    }

    #[test]
    fn push_and_tor_share_opcode() {
        let push = find_builtin("push").unwrap();
        let to_r = find_builtin(">r").unwrap();
        assert_eq!(push.op, to_r.op);
    }
}
