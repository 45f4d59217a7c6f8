//! Threaded-dispatch executor. Rust gives no guaranteed tail-call
//! elimination in safe code, so dispatch is the `while`-loop-over-an-
//! opcode-`match` fallback: one loop iteration per instruction, explicit
//! instruction-pointer advance instead of a chain of tail-transferring
//! handler calls.

use std::sync::{Mutex, OnceLock};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use forthsalon_frontend::{Arena, Op, Slot};

use crate::error::{EngineError, Result};
use crate::vars::Vars;

const STACK_CAPACITY: usize = 32;

/// One of the two fixed-capacity 32-`f64` stacks (data, return).
#[derive(Debug, Clone)]
pub struct Stack {
    slots: [f64; STACK_CAPACITY],
    len: usize,
}

impl Stack {
    pub fn new() -> Self {
        Self { slots: [0.0; STACK_CAPACITY], len: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push(&mut self, value: f64, overflow: EngineError) -> Result<()> {
        if self.len >= STACK_CAPACITY {
            return Err(overflow);
        }
        self.slots[self.len] = value;
        self.len += 1;
        Ok(())
    }

    pub fn pop(&mut self, underflow: EngineError) -> Result<f64> {
        if self.len == 0 {
            return Err(underflow);
        }
        self.len -= 1;
        Ok(self.slots[self.len])
    }

    pub fn peek(&self, underflow: EngineError) -> Result<f64> {
        if self.len == 0 {
            return Err(underflow);
        }
        Ok(self.slots[self.len - 1])
    }

    /// Values from bottom to top, oldest first.
    pub fn as_slice(&self) -> &[f64] {
        &self.slots[..self.len]
    }
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}

static PRNG: OnceLock<Mutex<StdRng>> = OnceLock::new();

/// The engine has no exposed seeding API (spec §9 leaves this to the
/// host); this seeds a process-global generator from OS entropy the
/// first time `random` is ever evaluated, in any context.
fn next_random() -> f64 {
    let prng = PRNG.get_or_init(|| Mutex::new(StdRng::from_entropy()));
    let mut rng = prng.lock().expect("prng mutex poisoned");
    rng.gen::<f64>()
}

/// Runs `arena` to its terminating `halt`, mutating `d`/`r` and writing
/// the final stack lengths into `vars`. The arena must already be
/// inlined, peephole-optimized, and verified — `eval_code` surviving to
/// here is a fatal internal error, not a recoverable one.
pub fn execute(arena: &Arena, d: &mut Stack, r: &mut Stack, vars: &mut Vars) -> Result<()> {
    let slots = arena.as_slice();
    let mut ip: usize = 0;

    loop {
        let op = match slots.get(ip) {
            Some(Slot::Op(op)) => *op,
            _ => {
                return Err(EngineError::Internal {
                    message: format!("instruction pointer {ip} does not address an opcode"),
                })
            }
        };

        match op {
            Op::Number => {
                let value = read_number(slots, ip)?;
                d.push(value, EngineError::DataStackOverflow)?;
                ip += 2;
            }
            Op::JumpIf => {
                let cond = d.pop(EngineError::DataStackUnderflow)?;
                let offset = read_pc(slots, ip)?;
                ip = if cond == 0.0 { jump_target(ip, offset)? } else { ip + 2 };
            }
            Op::Jump => {
                let offset = read_pc(slots, ip)?;
                ip = jump_target(ip, offset)?;
            }
            Op::Nop => ip += 1,
            Op::Halt => {
                vars.final_d_stack_len = d.len();
                vars.final_r_stack_len = r.len();
                return Ok(());
            }
            Op::EvalCode => {
                return Err(EngineError::Internal {
                    message: "eval_code reached at runtime; inlining did not remove it".to_string(),
                })
            }
            other => {
                dispatch_builtin(other, d, r, vars)?;
                ip += 1;
            }
        }
    }
}

fn read_number(slots: &[Slot], ip: usize) -> Result<f64> {
    match slots.get(ip + 1) {
        Some(Slot::Number(v)) => Ok(*v),
        _ => Err(EngineError::Internal { message: "number opcode missing its immediate".to_string() }),
    }
}

fn read_pc(slots: &[Slot], ip: usize) -> Result<i64> {
    match slots.get(ip + 1) {
        Some(Slot::Pc(offset)) => Ok(*offset),
        _ => Err(EngineError::Internal { message: "jump opcode missing its immediate".to_string() }),
    }
}

fn jump_target(ip: usize, offset: i64) -> Result<usize> {
    let target = ip as i64 + offset;
    if target < 0 {
        return Err(EngineError::Internal { message: "jump target underflowed the arena".to_string() });
    }
    Ok(target as usize)
}

fn dispatch_builtin(op: Op, d: &mut Stack, r: &mut Stack, vars: &mut Vars) -> Result<()> {
    use EngineError::{DataStackOverflow as DOv, DataStackUnderflow as DUn};
    use EngineError::{ReturnStackOverflow as ROv, ReturnStackUnderflow as RUn};

    match op {
        Op::Dup => {
            let a = d.peek(DUn)?;
            d.push(a, DOv)?;
        }
        Op::Over => {
            let b = d.pop(DUn)?;
            let a = d.pop(DUn)?;
            d.push(a, DOv)?;
            d.push(b, DOv)?;
            d.push(a, DOv)?;
        }
        Op::TwoDup => {
            let b = d.pop(DUn)?;
            let a = d.pop(DUn)?;
            d.push(a, DOv)?;
            d.push(b, DOv)?;
            d.push(a, DOv)?;
            d.push(b, DOv)?;
        }
        Op::Drop => {
            d.pop(DUn)?;
        }
        Op::Swap => {
            let b = d.pop(DUn)?;
            let a = d.pop(DUn)?;
            d.push(b, DOv)?;
            d.push(a, DOv)?;
        }
        Op::Rot => {
            let c = d.pop(DUn)?;
            let b = d.pop(DUn)?;
            let a = d.pop(DUn)?;
            d.push(b, DOv)?;
            d.push(c, DOv)?;
            d.push(a, DOv)?;
        }
        Op::NegRot => {
            let c = d.pop(DUn)?;
            let b = d.pop(DUn)?;
            let a = d.pop(DUn)?;
            d.push(c, DOv)?;
            d.push(a, DOv)?;
            d.push(b, DOv)?;
        }
        Op::ToR => {
            let a = d.pop(DUn)?;
            r.push(a, ROv)?;
        }
        Op::FromR => {
            let a = r.pop(RUn)?;
            d.push(a, DOv)?;
        }
        Op::RFetch => {
            let a = r.pop(RUn)?;
            r.push(a, ROv)?;
            d.push(a, DOv)?;
        }
        Op::At => {
            let index = d.pop(DUn)?;
            d.push(vars.memory_get(index), DOv)?;
        }
        Op::Bang => {
            let index = d.pop(DUn)?;
            let value = d.pop(DUn)?;
            vars.memory_set(index, value);
        }
        Op::Eq => binary(d, |a, b| bool_to_f64(a == b))?,
        Op::Ne => binary(d, |a, b| bool_to_f64(a != b))?,
        Op::Gt => binary(d, |a, b| bool_to_f64(a > b))?,
        Op::Lt => binary(d, |a, b| bool_to_f64(a < b))?,
        Op::Ge => binary(d, |a, b| bool_to_f64(a >= b))?,
        Op::Le => binary(d, |a, b| bool_to_f64(a <= b))?,
        Op::Add => binary(d, |a, b| a + b)?,
        Op::Sub => binary(d, |a, b| a - b)?,
        Op::Mul => binary(d, |a, b| a * b)?,
        Op::Div => binary(d, |a, b| if b == 0.0 { f64::INFINITY } else { a / b })?,
        Op::Mod => binary(d, |a, b| a % b)?,
        Op::Pow => binary(d, |a, b| a.abs().powf(b))?,
        Op::Exponent => binary(d, |a, b| a.powf(b))?,
        Op::Negate => unary(d, |a| -a)?,
        Op::Sin => unary(d, f64::sin)?,
        Op::Cos => unary(d, f64::cos)?,
        Op::Tan => unary(d, f64::tan)?,
        Op::Log => unary(d, |a| a.abs().ln())?,
        Op::Exp => unary(d, f64::exp)?,
        Op::Sqrt => unary(d, |a| a.abs().sqrt())?,
        Op::Floor => unary(d, f64::floor)?,
        Op::Ceil => unary(d, f64::ceil)?,
        Op::Abs => unary(d, f64::abs)?,
        Op::Atan2 => binary(d, |y, x| y.atan2(x))?,
        Op::Min => binary(d, f64::min)?,
        Op::Max => binary(d, f64::max)?,
        Op::Pi => d.push(std::f64::consts::PI, DOv)?,
        Op::Random => d.push(next_random(), DOv)?,
        Op::And => binary(d, |a, b| bool_to_f64(a != 0.0 && b != 0.0))?,
        Op::Or => binary(d, |a, b| bool_to_f64(a != 0.0 || b != 0.0))?,
        Op::Not => unary(d, |a| bool_to_f64(a == 0.0))?,
        Op::ZPlus => {
            let b_im = d.pop(DUn)?;
            let b_re = d.pop(DUn)?;
            let a_im = d.pop(DUn)?;
            let a_re = d.pop(DUn)?;
            d.push(a_re + b_re, DOv)?;
            d.push(a_im + b_im, DOv)?;
        }
        Op::ZMul => {
            let b_im = d.pop(DUn)?;
            let b_re = d.pop(DUn)?;
            let a_im = d.pop(DUn)?;
            let a_re = d.pop(DUn)?;
            d.push(a_re * b_re - a_im * b_im, DOv)?;
            d.push(a_re * b_im + a_im * b_re, DOv)?;
        }
        Op::X => d.push(vars.x, DOv)?,
        Op::Y => d.push(vars.y, DOv)?,
        Op::T => d.push(vars.t, DOv)?,
        Op::Dt => d.push(vars.dt, DOv)?,
        Op::Mx => d.push(vars.mouse_x, DOv)?,
        Op::My => d.push(vars.mouse_y, DOv)?,
        Op::Button => {
            d.pop(DUn)?;
            d.push(vars.mouse_button, DOv)?;
        }
        Op::Buttons => d.push(vars.mouse_buttons, DOv)?,
        Op::Audio => d.push(vars.audio_level, DOv)?,
        Op::Sample => {
            d.pop(DUn)?;
            d.push(vars.audio_level, DOv)?;
        }
        Op::BwSample => {
            d.pop(DUn)?;
            d.pop(DUn)?;
            d.push(vars.audio_level, DOv)?;
        }
        Op::Fma => {
            let z = d.pop(DUn)?;
            let y = d.pop(DUn)?;
            let x = d.pop(DUn)?;
            d.push(x + y * z, DOv)?;
        }
        Op::MultPi => unary(d, |a| a * std::f64::consts::PI)?,
        Op::DupDup => {
            let a = d.pop(DUn)?;
            d.push(a, DOv)?;
            d.push(a, DOv)?;
            d.push(a, DOv)?;
        }
        Op::NegRotSwap => {
            let c = d.pop(DUn)?;
            let b = d.pop(DUn)?;
            let a = d.pop(DUn)?;
            d.push(c, DOv)?;
            d.push(b, DOv)?;
            d.push(a, DOv)?;
        }
        Op::GeSwap => {
            let b = d.pop(DUn)?;
            let a = d.pop(DUn)?;
            let c = d.pop(DUn)?;
            let cmp = bool_to_f64(a >= b);
            d.push(cmp, DOv)?;
            d.push(c, DOv)?;
        }
        Op::MultHalfPi => unary(d, |a| a * std::f64::consts::FRAC_PI_2)?,
        Op::Mult2 => unary(d, |a| a * 2.0)?,
        Op::Div2 => unary(d, |a| a / 2.0)?,
        Op::Pow2 => unary(d, |a| a.powf(2.0))?,
        Op::Number | Op::JumpIf | Op::Jump | Op::Nop | Op::Halt | Op::EvalCode => {
            unreachable!("layout-special opcodes are handled in execute()")
        }
    }
    Ok(())
}

fn unary(d: &mut Stack, f: impl Fn(f64) -> f64) -> Result<()> {
    let a = d.pop(EngineError::DataStackUnderflow)?;
    d.push(f(a), EngineError::DataStackOverflow)
}

fn binary(d: &mut Stack, f: impl Fn(f64, f64) -> f64) -> Result<()> {
    let b = d.pop(EngineError::DataStackUnderflow)?;
    let a = d.pop(EngineError::DataStackUnderflow)?;
    d.push(f(a, b), EngineError::DataStackOverflow)
}

fn bool_to_f64(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}
