//! Executable closure trees produced by [`Compiler`](super::Compiler).

use crate::runtime::{Context, EvalState, RuntimeResult, Value};

type ValueFn = dyn Fn(&mut Context) -> RuntimeResult<Value>;
type SignalFn = dyn Fn(&mut Context) -> RuntimeResult<(Value, EvalState)>;

/// Pre-bound closure producing a value.
pub struct CompiledExpr(Box<ValueFn>);

impl CompiledExpr {
    pub(super) fn new(run: impl Fn(&mut Context) -> RuntimeResult<Value> + 'static) -> Self {
        Self(Box::new(run))
    }

    pub fn evaluate(&self, context: &mut Context) -> RuntimeResult<Value> {
        (self.0)(context)
    }
}

/// Pre-bound closure producing a value and a control-flow signal.
pub struct CompiledProcess(Box<SignalFn>);

impl CompiledProcess {
    pub(super) fn new(
        run: impl Fn(&mut Context) -> RuntimeResult<(Value, EvalState)> + 'static,
    ) -> Self {
        Self(Box::new(run))
    }

    pub fn evaluate(&self, context: &mut Context) -> RuntimeResult<(Value, EvalState)> {
        (self.0)(context)
    }
}

pub(super) enum CompiledStatement {
    Value(CompiledExpr),
    Process(CompiledProcess),
}

/// Statement sequence that stops at the first signal.
pub struct CompiledBlock {
    statements: Vec<CompiledStatement>,
}

impl CompiledBlock {
    pub(super) fn new(statements: Vec<CompiledStatement>) -> Self {
        Self { statements }
    }

    pub fn evaluate(&self, context: &mut Context) -> RuntimeResult<(Value, EvalState)> {
        let mut last = Value::Null;
        for statement in &self.statements {
            match statement {
                CompiledStatement::Value(expr) => last = expr.evaluate(context)?,
                CompiledStatement::Process(process) => {
                    let (value, state) = process.evaluate(context)?;
                    if state != EvalState::None {
                        return Ok((value, state));
                    }
                    last = value;
                }
            }
        }
        Ok((last, EvalState::None))
    }
}

/// Whole program compiled once and runnable any number of times.
pub struct CompiledProgram {
    body: CompiledBlock,
}

impl CompiledProgram {
    pub(super) fn new(body: CompiledBlock) -> Self {
        Self { body }
    }

    pub fn run(&self, context: &mut Context) -> RuntimeResult<Value> {
        let (value, state) = self.body.evaluate(context)?;
        state.complete(value)
    }
}
