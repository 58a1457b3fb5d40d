//! Value model, name resolution and operator semantics used by both
//! evaluation backends.

mod context;
pub mod error;
mod function;
pub mod ops;
mod table;
mod value;

pub use context::{Context, Scope};
pub use error::{RuntimeError, RuntimeResult};
pub use function::{Function, FunctionBody, NativeFunction, call};
pub use table::{Table, TableKey};
pub use value::Value;

/// Control-flow signal produced by process nodes. A block stops at the
/// first signal other than `None` and hands it to the enclosing construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvalState {
    #[default]
    None,
    Continue,
    Break,
    Return,
}

/// How a loop proceeds after one evaluation of its body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopStep {
    Next,
    Exit,
    Return,
}

impl EvalState {
    /// `Continue` and normal completion move to the next iteration, `Break`
    /// leaves the loop and `Return` leaves it while keeping the signal.
    pub fn loop_step(self) -> LoopStep {
        match self {
            EvalState::None | EvalState::Continue => LoopStep::Next,
            EvalState::Break => LoopStep::Exit,
            EvalState::Return => LoopStep::Return,
        }
    }

    /// Result of a function body or a whole program: `Return` and normal
    /// completion yield the value, loop signals have nowhere left to go.
    pub fn complete(self, value: Value) -> RuntimeResult<Value> {
        match self {
            EvalState::None | EvalState::Return => Ok(value),
            EvalState::Continue => Err(RuntimeError::EscapedSignal { signal: "continue" }),
            EvalState::Break => Err(RuntimeError::EscapedSignal { signal: "break" }),
        }
    }
}
