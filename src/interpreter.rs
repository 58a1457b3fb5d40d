use anyhow::Result;

use crate::ast::Program;
use crate::backend::{Backend, PreparedBackend};
use crate::runtime::{Context, Value};

mod expression;
mod process;

/// AST-walking backend that evaluates programs directly without compilation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Interpreter;

impl Interpreter {
    pub fn new() -> Self {
        Self
    }
}

/// Prepared executable program for the tree-walking interpreter.
pub struct PreparedInterpreter {
    program: Program,
}

impl PreparedBackend for PreparedInterpreter {
    fn run(&self, context: &mut Context) -> Result<Value> {
        let (value, state) = Interpreter::new().eval_block(&self.program.body, context)?;
        Ok(state.complete(value)?)
    }
}

impl Backend for Interpreter {
    fn name(&self) -> &'static str {
        "interpreter"
    }

    fn prepare(&self, program: &Program) -> Result<Box<dyn PreparedBackend>> {
        Ok(Box::new(PreparedInterpreter {
            program: program.clone(),
        }))
    }
}
