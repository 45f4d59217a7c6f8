//! Error types for the Forth Salon frontend.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ForthError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForthError {
    #[error("non-printable byte 0x{byte:02x} in source")]
    NonPrintableByte { byte: u8 },

    #[error("token exceeds 64 bytes")]
    TokenTooLong,

    #[error("numbers may only appear inside a word body")]
    NumberAtTopLevel,

    #[error("undefined word: {word}")]
    UndefinedWord { word: String },

    #[error("redefinition of word: {word}")]
    Redefinition { word: String },

    #[error("':' may only appear at top level")]
    NestedDefinition,

    #[error("';' outside of a word definition")]
    SemicolonOutsideDefinition,

    #[error("';' with unresolved if/else/then")]
    UnclosedControlFlow,

    #[error("word definition not finished")]
    UnterminatedDefinition,

    #[error("'{word}' before any matching 'if'")]
    DanglingControlWord { word: String },

    #[error("jump stack depth exceeded (max 63)")]
    JumpStackOverflow,

    #[error("unterminated '(' comment")]
    UnterminatedComment,

    #[error("word name must not be empty")]
    EmptyWordName,

    #[error("internal compiler error: {message}")]
    Internal { message: String },
}
