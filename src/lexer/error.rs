use thiserror::Error;

use crate::token::Span;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("Unexpected character '{character}' at {span}")]
    UnexpectedCharacter { character: char, span: Span },
    #[error("Unterminated string literal at {span}")]
    UnterminatedString { span: Span },
    #[error("Invalid escape sequence '\\{escape}' in string literal at {span}")]
    InvalidEscape { escape: char, span: Span },
    #[error("Malformed number literal '{literal}' at {span}")]
    MalformedNumber { literal: String, span: Span },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnexpectedCharacter { span, .. }
            | LexError::UnterminatedString { span }
            | LexError::InvalidEscape { span, .. }
            | LexError::MalformedNumber { span, .. } => *span,
        }
    }
}

pub type LexResult<T> = Result<T, LexError>;
