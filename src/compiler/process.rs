use tracing::trace;

use crate::ast::{Block, Expr, Process};
use crate::runtime::{EvalState, LoopStep, Value, ops};

use super::Compiler;
use super::compiled::{CompiledBlock, CompiledExpr, CompiledProcess, CompiledStatement};

impl Compiler {
    pub fn compile_block(&self, block: &Block) -> CompiledBlock {
        let statements = block
            .statements
            .iter()
            .map(|statement| match statement {
                Expr::Process(process) => CompiledStatement::Process(self.compile_process(process)),
                other => CompiledStatement::Value(self.compile_expr(other)),
            })
            .collect();
        CompiledBlock::new(statements)
    }

    pub fn compile_process(&self, process: &Process) -> CompiledProcess {
        match process {
            Process::If {
                branches,
                otherwise,
            } => {
                let branches: Vec<(CompiledExpr, CompiledBlock)> = branches
                    .iter()
                    .map(|(condition, body)| {
                        (self.compile_expr(condition), self.compile_block(body))
                    })
                    .collect();
                let otherwise = otherwise.as_ref().map(|body| self.compile_block(body));
                CompiledProcess::new(move |context| {
                    for (condition, body) in &branches {
                        if condition.evaluate(context)?.is_truthy() {
                            return body.evaluate(context);
                        }
                    }
                    match &otherwise {
                        Some(body) => body.evaluate(context),
                        None => Ok((Value::Null, EvalState::None)),
                    }
                })
            }
            Process::While { condition, body } => {
                let condition = self.compile_expr(condition);
                let body = self.compile_block(body);
                CompiledProcess::new(move |context| {
                    let mut last = Value::Null;
                    while condition.evaluate(context)?.is_truthy() {
                        let (value, state) = body.evaluate(context)?;
                        last = value;
                        match state.loop_step() {
                            LoopStep::Next => {}
                            LoopStep::Exit => break,
                            LoopStep::Return => return Ok((last, EvalState::Return)),
                        }
                    }
                    Ok((last, EvalState::None))
                })
            }
            Process::Loop { body } => {
                let body = self.compile_block(body);
                CompiledProcess::new(move |context| loop {
                    let (value, state) = body.evaluate(context)?;
                    match state.loop_step() {
                        LoopStep::Next => {}
                        LoopStep::Exit => return Ok((value, EvalState::None)),
                        LoopStep::Return => return Ok((value, EvalState::Return)),
                    }
                })
            }
            Process::ForIn {
                value,
                key,
                iterable,
                body,
            } => {
                let value_name = value.clone();
                let key_name = key.clone();
                let iterable = self.compile_expr(iterable);
                let body = self.compile_block(body);
                CompiledProcess::new(move |context| {
                    let container = iterable.evaluate(context)?;
                    let items = ops::iteration_items(&container)?;
                    trace!(items = items.len(), "for-in loop");
                    let mut last = Value::Null;
                    for (item, key) in items {
                        context.set(&value_name, item);
                        if let Some(key_name) = &key_name {
                            context.set(key_name, key);
                        }
                        let (value, state) = body.evaluate(context)?;
                        last = value;
                        match state.loop_step() {
                            LoopStep::Next => {}
                            LoopStep::Exit => break,
                            LoopStep::Return => return Ok((last, EvalState::Return)),
                        }
                    }
                    Ok((last, EvalState::None))
                })
            }
            Process::ForOf {
                name,
                start,
                end,
                step,
                body,
            } => {
                let name = name.clone();
                let start = self.compile_expr(start);
                let end = self.compile_expr(end);
                let step = step.as_ref().map(|step| self.compile_expr(step));
                let body = self.compile_block(body);
                CompiledProcess::new(move |context| {
                    let start = start.evaluate(context)?;
                    let end = end.evaluate(context)?;
                    let step = match &step {
                        Some(step) => Some(step.evaluate(context)?),
                        None => None,
                    };
                    let range = ops::NumericRange::new(&start, &end, step.as_ref())?;
                    let mut last = Value::Null;
                    let mut iterations = 0usize;
                    for counter in range {
                        iterations += 1;
                        context.set(&name, Value::Number(counter));
                        let (value, state) = body.evaluate(context)?;
                        last = value;
                        match state.loop_step() {
                            LoopStep::Next => {}
                            LoopStep::Exit => break,
                            LoopStep::Return => return Ok((last, EvalState::Return)),
                        }
                    }
                    trace!(iterations, "for-of loop finished");
                    Ok((last, EvalState::None))
                })
            }
            Process::Return(value) => match value {
                Some(value) => {
                    let value = self.compile_expr(value);
                    CompiledProcess::new(move |context| {
                        Ok((value.evaluate(context)?, EvalState::Return))
                    })
                }
                None => CompiledProcess::new(|_| Ok((Value::Null, EvalState::Return))),
            },
            Process::Continue => CompiledProcess::new(|_| Ok((Value::Null, EvalState::Continue))),
            Process::Break => CompiledProcess::new(|_| Ok((Value::Null, EvalState::Break))),
        }
    }
}
