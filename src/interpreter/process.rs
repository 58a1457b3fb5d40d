use tracing::trace;

use crate::ast::{Block, Expr, Process};
use crate::runtime::{Context, EvalState, LoopStep, RuntimeResult, Value, ops};

use super::Interpreter;

impl Interpreter {
    /// Runs statements in order until one produces a signal.
    pub fn eval_block(
        &self,
        block: &Block,
        context: &mut Context,
    ) -> RuntimeResult<(Value, EvalState)> {
        let mut last = Value::Null;
        for statement in &block.statements {
            if let Expr::Process(process) = statement {
                let (value, state) = self.eval_process(process, context)?;
                if state != EvalState::None {
                    return Ok((value, state));
                }
                last = value;
            } else {
                last = self.eval_expr(statement, context)?;
            }
        }
        Ok((last, EvalState::None))
    }

    pub fn eval_process(
        &self,
        process: &Process,
        context: &mut Context,
    ) -> RuntimeResult<(Value, EvalState)> {
        match process {
            Process::If {
                branches,
                otherwise,
            } => {
                for (condition, body) in branches {
                    if self.eval_expr(condition, context)?.is_truthy() {
                        return self.eval_block(body, context);
                    }
                }
                match otherwise {
                    Some(body) => self.eval_block(body, context),
                    None => Ok((Value::Null, EvalState::None)),
                }
            }
            Process::While { condition, body } => {
                let mut last = Value::Null;
                while self.eval_expr(condition, context)?.is_truthy() {
                    let (value, state) = self.eval_block(body, context)?;
                    last = value;
                    match state.loop_step() {
                        LoopStep::Next => {}
                        LoopStep::Exit => break,
                        LoopStep::Return => return Ok((last, EvalState::Return)),
                    }
                }
                Ok((last, EvalState::None))
            }
            Process::Loop { body } => loop {
                let (value, state) = self.eval_block(body, context)?;
                match state.loop_step() {
                    LoopStep::Next => {}
                    LoopStep::Exit => return Ok((value, EvalState::None)),
                    LoopStep::Return => return Ok((value, EvalState::Return)),
                }
            },
            Process::ForIn {
                value: value_name,
                key: key_name,
                iterable,
                body,
            } => {
                let container = self.eval_expr(iterable, context)?;
                let items = ops::iteration_items(&container)?;
                trace!(items = items.len(), "for-in loop");
                let mut last = Value::Null;
                for (item, key) in items {
                    context.set(value_name, item);
                    if let Some(key_name) = key_name {
                        context.set(key_name, key);
                    }
                    let (value, state) = self.eval_block(body, context)?;
                    last = value;
                    match state.loop_step() {
                        LoopStep::Next => {}
                        LoopStep::Exit => break,
                        LoopStep::Return => return Ok((last, EvalState::Return)),
                    }
                }
                Ok((last, EvalState::None))
            }
            Process::ForOf {
                name,
                start,
                end,
                step,
                body,
            } => {
                let start = self.eval_expr(start, context)?;
                let end = self.eval_expr(end, context)?;
                let step = match step {
                    Some(step) => Some(self.eval_expr(step, context)?),
                    None => None,
                };
                let range = ops::NumericRange::new(&start, &end, step.as_ref())?;
                let mut last = Value::Null;
                let mut iterations = 0usize;
                for counter in range {
                    iterations += 1;
                    context.set(name, Value::Number(counter));
                    let (value, state) = self.eval_block(body, context)?;
                    last = value;
                    match state.loop_step() {
                        LoopStep::Next => {}
                        LoopStep::Exit => break,
                        LoopStep::Return => return Ok((last, EvalState::Return)),
                    }
                }
                trace!(iterations, "for-of loop finished");
                Ok((last, EvalState::None))
            }
            Process::Return(value) => {
                let value = match value {
                    Some(value) => self.eval_expr(value, context)?,
                    None => Value::Null,
                };
                Ok((value, EvalState::Return))
            }
            Process::Continue => Ok((Value::Null, EvalState::Continue)),
            Process::Break => Ok((Value::Null, EvalState::Break)),
        }
    }
}
