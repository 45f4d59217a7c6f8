//! The single-pass tokenizer/compiler: source bytes in, a `main` arena
//! and a populated `Dictionary` out.
//!
//! There is no separate lexer-then-parser split and no AST: each token
//! is dispatched directly into arena emission as it is read, and forward
//! jumps for `if`/`else`/`then` are back-patched through a compile-time
//! jump stack as described in the module-level spec this crate realizes.

use crate::arena::{Arena, Op, Slot};
use crate::dictionary::{Dictionary, WordEntry};
use crate::error::{ForthError, Result};

const MAX_TOKEN_LEN: usize = 64;
const MAX_JUMP_STACK_DEPTH: usize = 63;

fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r')
}

fn is_printable(byte: u8) -> bool {
    (0x21..=0x7e).contains(&byte)
}

/// A cursor over the raw source bytes. Owns tokenization *and* the
/// comment skip behavior of `\` and `(`, since both need to consume
/// source text beyond a single token.
struct Cursor<'a> {
    src: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a [u8]) -> Self {
        Self { src, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if is_whitespace(b) {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    /// Reads the next maximal run of non-whitespace bytes. Every byte in
    /// it must be printable ASCII; the caller has already skipped leading
    /// whitespace and confirmed we are not at end of input.
    fn next_token(&mut self) -> Result<&'a [u8]> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if is_whitespace(b) {
                break;
            }
            if !is_printable(b) {
                return Err(ForthError::NonPrintableByte { byte: b });
            }
            self.pos += 1;
            if self.pos - start > MAX_TOKEN_LEN {
                return Err(ForthError::TokenTooLong);
            }
        }
        Ok(&self.src[start..self.pos])
    }

    /// `\` comment: skip to end of line (inclusive of the newline).
    fn skip_line_comment(&mut self) {
        while let Some(b) = self.peek() {
            self.pos += 1;
            if b == b'\n' {
                break;
            }
        }
    }

    /// `(` comment: skip to the next `)`, no nesting.
    fn skip_paren_comment(&mut self) -> Result<()> {
        while let Some(b) = self.peek() {
            self.pos += 1;
            if b == b')' {
                return Ok(());
            }
        }
        Err(ForthError::UnterminatedComment)
    }
}

/// Which arena the compiler is currently emitting into.
#[derive(Debug, Clone, PartialEq)]
enum Defining {
    Main,
    Word(String),
}

struct Compiler {
    dict: Dictionary,
    main: Arena,
    defining: Defining,
    jump_stack: Vec<usize>,
}

impl Compiler {
    fn new() -> Self {
        Self {
            dict: Dictionary::with_builtins(),
            main: Arena::new(),
            defining: Defining::Main,
            jump_stack: Vec::new(),
        }
    }

    fn current_arena_mut(&mut self) -> &mut Arena {
        match &self.defining {
            Defining::Main => &mut self.main,
            Defining::Word(name) => {
                let name = name.clone();
                self.dict
                    .user_arena_mut(&name)
                    .expect("defining word always exists in the dictionary")
            }
        }
    }

    fn begin_definition(&mut self, cur: &mut Cursor) -> Result<()> {
        if self.defining != Defining::Main {
            return Err(ForthError::NestedDefinition);
        }
        cur.skip_whitespace();
        let name_bytes = cur.next_token()?;
        if name_bytes.is_empty() {
            return Err(ForthError::UnterminatedDefinition);
        }
        let name = std::str::from_utf8(name_bytes)
            .expect("token bytes are validated printable ASCII")
            .to_string();
        if name.parse::<f64>().is_ok() {
            return Err(ForthError::NumberAtTopLevel);
        }
        self.dict.define_user_word(&name)?;
        self.defining = Defining::Word(name);
        Ok(())
    }

    fn end_definition(&mut self) -> Result<()> {
        if self.defining == Defining::Main {
            return Err(ForthError::SemicolonOutsideDefinition);
        }
        if !self.jump_stack.is_empty() {
            return Err(ForthError::UnclosedControlFlow);
        }
        self.defining = Defining::Main;
        Ok(())
    }

    fn compile_if(&mut self) -> Result<()> {
        if self.jump_stack.len() >= MAX_JUMP_STACK_DEPTH {
            return Err(ForthError::JumpStackOverflow);
        }
        let arena = self.current_arena_mut();
        let opcode_idx = arena.push(Slot::Op(Op::JumpIf));
        arena.push(Slot::Pc(0));
        self.jump_stack.push(opcode_idx);
        Ok(())
    }

    fn compile_else(&mut self) -> Result<()> {
        let if_opcode_idx = self
            .jump_stack
            .pop()
            .ok_or_else(|| ForthError::DanglingControlWord { word: "else".to_string() })?;
        if self.jump_stack.len() >= MAX_JUMP_STACK_DEPTH {
            return Err(ForthError::JumpStackOverflow);
        }
        let arena = self.current_arena_mut();
        let else_opcode_idx = arena.push(Slot::Op(Op::Jump));
        arena.push(Slot::Pc(0));
        // Patch the `if`'s jump to land just past this new placeholder.
        let target = arena.len() as i64;
        arena.patch(if_opcode_idx + 1, Slot::Pc(target - if_opcode_idx as i64));
        self.jump_stack.push(else_opcode_idx);
        Ok(())
    }

    fn compile_then(&mut self) -> Result<()> {
        let pending = self
            .jump_stack
            .pop()
            .ok_or_else(|| ForthError::DanglingControlWord { word: "then".to_string() })?;
        let arena = self.current_arena_mut();
        let nop_idx = arena.push(Slot::Op(Op::Nop));
        arena.patch(pending + 1, Slot::Pc(nop_idx as i64 - pending as i64));
        Ok(())
    }

    fn emit_number(&mut self, value: f64) {
        let arena = self.current_arena_mut();
        arena.push(Slot::Op(Op::Number));
        arena.push(Slot::Number(value));
    }

    fn emit_call(&mut self, word: &str) -> Result<()> {
        match self.dict.get(word) {
            Some(WordEntry::Builtin(op)) => {
                let op = *op;
                self.current_arena_mut().push(Slot::Op(op));
                Ok(())
            }
            Some(WordEntry::User(_)) => {
                let arena = self.current_arena_mut();
                arena.push(Slot::Op(Op::EvalCode));
                arena.push(Slot::CodeRef(word.to_string()));
                Ok(())
            }
            None => Err(ForthError::UndefinedWord { word: word.to_string() }),
        }
    }

    fn step(&mut self, cur: &mut Cursor) -> Result<()> {
        let token = cur.next_token()?;
        let word = std::str::from_utf8(token).expect("token bytes are validated printable ASCII");

        match word {
            ":" => return self.begin_definition(cur),
            ";" => return self.end_definition(),
            "\\" => {
                cur.skip_line_comment();
                return Ok(());
            }
            "(" => return cur.skip_paren_comment(),
            "if" => return self.compile_if(),
            "else" => return self.compile_else(),
            "then" => return self.compile_then(),
            _ => {}
        }

        if let Ok(value) = word.parse::<f64>() {
            self.emit_number(value);
            return Ok(());
        }

        self.emit_call(word)
    }

    fn finish(mut self) -> Result<(Dictionary, Arena)> {
        if self.defining != Defining::Main {
            return Err(ForthError::UnterminatedDefinition);
        }
        if !self.jump_stack.is_empty() {
            return Err(ForthError::UnclosedControlFlow);
        }
        self.main.push(Slot::Op(Op::Halt));
        Ok((self.dict, self.main))
    }
}

/// Compile `source` into a dictionary of user words plus the `main`
/// arena, ending in exactly one `halt`. Every compile-time error aborts
/// immediately; the tables produced on `Err` should be discarded.
pub fn parse(source: &[u8]) -> Result<(Dictionary, Arena)> {
    let mut compiler = Compiler::new();
    let mut cur = Cursor::new(source);

    loop {
        cur.skip_whitespace();
        if cur.peek().is_none() {
            break;
        }
        if let Err(err) = compiler.step(&mut cur) {
            tracing::error!(%err, "forth salon parse failed");
            return Err(err);
        }
    }

    compiler.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile_main(source: &str) -> Arena {
        let (_, main) = parse(source.as_bytes()).expect("parse should succeed");
        main
    }

    #[test]
    fn simple_addition_compiles() {
        let main = compile_main("1 2 +");
        assert_eq!(main.as_slice().last(), Some(&Slot::Op(Op::Halt)));
        assert!(matches!(main.get(0), Some(Slot::Op(Op::Number))));
        assert_eq!(main.get(1), Some(&Slot::Number(1.0)));
        assert!(matches!(main.get(4), Some(Slot::Op(Op::Add))));
    }

    #[test]
    fn word_definition_and_call() {
        let (dict, main) = parse(b": sq dup * ; 5 sq").unwrap();
        assert!(dict.user_arena("sq").is_some());
        assert!(main
            .as_slice()
            .iter()
            .any(|s| matches!(s, Slot::Op(Op::EvalCode))));
    }

    #[test]
    fn if_else_then_patches_jumps_in_bounds() {
        let main = compile_main("x if 10 else 20 then");
        for (i, slot) in main.as_slice().iter().enumerate() {
            if let Slot::Op(op) = slot {
                if op.is_jump() {
                    if let Some(Slot::Pc(offset)) = main.get(i + 1) {
                        let target = i as i64 + offset;
                        assert!(target >= 0 && (target as usize) < main.len());
                    }
                }
            }
        }
    }

    #[test]
    fn redefinition_is_rejected() {
        let err = parse(b": dup 1 ; ").unwrap_err();
        assert!(matches!(err, ForthError::Redefinition { .. }));
    }

    #[test]
    fn unclosed_definition_is_rejected() {
        let err = parse(b": foo 1 2 +").unwrap_err();
        assert!(matches!(err, ForthError::UnterminatedDefinition));
    }

    #[test]
    fn stray_then_is_rejected() {
        let err = parse(b"if then").unwrap_err();
        assert!(matches!(err, ForthError::DanglingControlWord { .. }));
    }

    #[test]
    fn self_recursive_definition_compiles_but_is_unresolved_eval_code() {
        // Recursion is only caught at inlining time (spec §9); the
        // compiler itself accepts `foo` calling itself.
        let (dict, _) = parse(b": foo foo ; 1 foo").unwrap();
        assert!(dict.user_arena("foo").is_some());
    }

    #[test]
    fn overlong_token_rejected() {
        let tok = "a".repeat(65);
        let err = parse(tok.as_bytes()).unwrap_err();
        assert!(matches!(err, ForthError::TokenTooLong));
    }

    #[test]
    fn non_printable_byte_rejected() {
        let err = parse(&[0xffu8]).unwrap_err();
        assert!(matches!(err, ForthError::NonPrintableByte { .. }));
    }
}
