use thiserror::Error;

/// Typed errors raised while evaluating a program, shared by both backends.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("Operation '{operation}' is not supported between {left} and {right}")]
    TypeMismatch {
        operation: &'static str,
        left: &'static str,
        right: &'static str,
    },
    #[error("Operation '{operation}' is not supported for type {type_name}")]
    UnsupportedOperand {
        operation: &'static str,
        type_name: &'static str,
    },
    #[error("Only table, list and string can be indexed, got {type_name}")]
    NotIndexable { type_name: &'static str },
    #[error("Cannot index a table with null")]
    NullIndex,
    #[error("{container} index must be a number, got {got}")]
    IndexType {
        container: &'static str,
        got: &'static str,
    },
    #[error("List index out of bounds: index {index}, len {len}")]
    IndexOutOfBounds { index: f64, len: usize },
    #[error("Value of type {type_name} cannot be used as a table key")]
    UnhashableKey { type_name: &'static str },
    #[error("Cannot assign into value of type {type_name}")]
    NotAssignable { type_name: &'static str },
    #[error("Cannot read member '{member}' of type {type_name}")]
    NoMembers {
        member: String,
        type_name: &'static str,
    },
    #[error("Cannot iterate over value of type {type_name}")]
    NotIterable { type_name: &'static str },
    #[error("For loop {bound} must be a number, got {got}")]
    LoopBound {
        bound: &'static str,
        got: &'static str,
    },
    #[error("For loop step must not be zero")]
    ZeroStep,
    #[error("Object of type {type_name} is not callable")]
    ObjectNotCallable { type_name: &'static str },
    #[error("Function '{name}' expected {expected} arguments, got {found}")]
    FunctionArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("'{signal}' outside of a loop")]
    EscapedSignal { signal: &'static str },
    #[error("{message}")]
    Host { message: String },
}

impl RuntimeError {
    /// Error raised by host-provided native functions.
    pub fn host(message: impl Into<String>) -> Self {
        RuntimeError::Host {
            message: message.into(),
        }
    }
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;
