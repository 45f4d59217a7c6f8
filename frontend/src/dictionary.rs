//! The dictionary: a name -> word-entry map. Insertion fails if the name
//! already exists, whether it names a built-in or a user word.

use rustc_hash::FxHashMap;

use crate::arena::{Arena, Op};
use crate::builtins::BUILTINS;
use crate::error::{ForthError, Result};

#[derive(Debug, Clone)]
pub enum WordEntry {
    Builtin(Op),
    User(Arena),
}

impl WordEntry {
    pub fn is_builtin(&self) -> bool {
        matches!(self, WordEntry::Builtin(_))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    words: FxHashMap<String, WordEntry>,
}

impl Dictionary {
    /// A fresh dictionary seeded with every built-in word.
    pub fn with_builtins() -> Self {
        let mut words = FxHashMap::with_capacity_and_hasher(BUILTINS.len(), Default::default());
        for def in BUILTINS {
            words.insert(def.name.to_string(), WordEntry::Builtin(def.op));
        }
        Self { words }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.words.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&WordEntry> {
        self.words.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut WordEntry> {
        self.words.get_mut(name)
    }

    /// Register a brand-new user word with an empty arena. Fails if the
    /// name is already taken by a built-in or another user word.
    pub fn define_user_word(&mut self, name: &str) -> Result<()> {
        if self.words.contains_key(name) {
            return Err(ForthError::Redefinition { word: name.to_string() });
        }
        self.words.insert(name.to_string(), WordEntry::User(Arena::new()));
        Ok(())
    }

    pub fn user_arena(&self, name: &str) -> Option<&Arena> {
        match self.words.get(name) {
            Some(WordEntry::User(arena)) => Some(arena),
            _ => None,
        }
    }

    pub fn user_arena_mut(&mut self, name: &str) -> Option<&mut Arena> {
        match self.words.get_mut(name) {
            Some(WordEntry::User(arena)) => Some(arena),
            _ => None,
        }
    }
}
