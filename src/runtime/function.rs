use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::ast::Block;
use crate::compiler::CompiledBlock;
use crate::interpreter::Interpreter;

use super::context::{Context, Scope};
use super::error::{RuntimeError, RuntimeResult};
use super::value::Value;

/// Executable body of a script function; which backend created the
/// function decides the representation.
pub enum FunctionBody {
    Tree(Rc<Block>),
    Compiled(Rc<CompiledBlock>),
}

/// Script function value closed over the scope it was created in.
pub struct Function {
    name: Option<String>,
    params: Vec<String>,
    body: FunctionBody,
    captured: Rc<Scope>,
}

impl Function {
    pub fn new(
        name: Option<String>,
        params: Vec<String>,
        body: FunctionBody,
        context: &Context,
    ) -> Self {
        Self {
            name,
            params,
            body,
            captured: context.scope().clone(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn call(&self, args: Vec<Value>) -> RuntimeResult<Value> {
        if args.len() != self.arity() {
            return Err(RuntimeError::FunctionArityMismatch {
                name: self.name.clone().unwrap_or_else(|| "<anonymous>".to_string()),
                expected: self.arity(),
                found: args.len(),
            });
        }
        trace!(function = self.name.as_deref().unwrap_or("<anonymous>"), "call");

        let mut frame = Context::call_frame(&self.captured);
        for (param, arg) in self.params.iter().zip(args) {
            frame.define(param, arg);
        }
        let (value, state) = match &self.body {
            FunctionBody::Tree(block) => Interpreter::new().eval_block(block, &mut frame)?,
            FunctionBody::Compiled(block) => block.evaluate(&mut frame)?,
        };
        state.complete(value)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

type NativeCallback = dyn Fn(&[Value]) -> RuntimeResult<Value>;

/// Host-provided function callable from scripts.
pub struct NativeFunction {
    name: String,
    arity: Option<usize>,
    callback: Box<NativeCallback>,
}

impl NativeFunction {
    pub fn new(
        name: &str,
        arity: Option<usize>,
        callback: impl Fn(&[Value]) -> RuntimeResult<Value> + 'static,
    ) -> Self {
        Self {
            name: name.to_string(),
            arity,
            callback: Box::new(callback),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: &[Value]) -> RuntimeResult<Value> {
        if let Some(expected) = self.arity
            && expected != args.len()
        {
            return Err(RuntimeError::FunctionArityMismatch {
                name: self.name.clone(),
                expected,
                found: args.len(),
            });
        }
        (self.callback)(args)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// Invokes any callable value with already evaluated arguments.
pub fn call(callee: &Value, args: Vec<Value>) -> RuntimeResult<Value> {
    match callee {
        Value::Function(function) => function.call(args),
        Value::Native(native) => native.call(&args),
        other => Err(RuntimeError::ObjectNotCallable {
            type_name: other.type_name(),
        }),
    }
}
