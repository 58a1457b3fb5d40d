use std::fmt;
use std::str::FromStr;

use anyhow::{Result, bail};

use crate::ast::Program;
use crate::compiler::{CompileOptions, Compiler};
use crate::interpreter::Interpreter;
use crate::runtime::{Context, Value};

/// Executable artifact produced by a backend `prepare` step.
///
/// This keeps preparation and execution separated so benchmarks and tests can
/// measure and validate prepare-vs-run phases independently. A prepared
/// program can be run any number of times against different contexts.
pub trait PreparedBackend {
    fn run(&self, context: &mut Context) -> Result<Value>;
}

/// Common interface implemented by each execution backend.
///
/// `prepare` translates the AST into backend-owned executable state, while
/// `run` offers the convenience path for one-shot execution.
pub trait Backend {
    fn name(&self) -> &'static str;
    fn prepare(&self, program: &Program) -> Result<Box<dyn PreparedBackend>>;

    fn run(&self, program: &Program, context: &mut Context) -> Result<Value> {
        self.prepare(program)?.run(context)
    }
}

pub fn backends() -> Vec<Box<dyn Backend>> {
    vec![Box::new(Interpreter::new()), Box::new(Compiler::new())]
}

/// Backend selector used by the runner binary and [`crate::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    #[default]
    Interpreter,
    Compiler,
}

impl BackendKind {
    pub fn name(self) -> &'static str {
        match self {
            BackendKind::Interpreter => "interpreter",
            BackendKind::Compiler => "compiler",
        }
    }

    /// Instantiates the backend; `options` only affect the compiler.
    pub fn backend(self, options: CompileOptions) -> Box<dyn Backend> {
        match self {
            BackendKind::Interpreter => Box::new(Interpreter::new()),
            BackendKind::Compiler => Box::new(Compiler::with_options(options)),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "interpreter" => Ok(BackendKind::Interpreter),
            "compiler" => Ok(BackendKind::Compiler),
            other => bail!("Unknown backend '{other}'"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_names_round_trip_through_kind() {
        for backend in backends() {
            let kind: BackendKind = backend.name().parse().expect("known backend");
            assert_eq!(kind.name(), backend.name());
        }
        let err = "vm".parse::<BackendKind>().expect_err("expected unknown backend");
        assert!(err.to_string().contains("Unknown backend 'vm'"));
    }

    #[test]
    fn prepared_program_runs_against_each_context() {
        let program = crate::parser::parse("count = count + 1").expect("parse failed");
        for backend in backends() {
            let prepared = backend.prepare(&program).expect("prepare failed");
            let mut first = Context::new();
            first.set("count", Value::Number(10.0));
            let mut second = Context::new();
            second.set("count", Value::Number(0.0));
            assert_eq!(prepared.run(&mut first).expect("run"), Value::Number(11.0));
            assert_eq!(prepared.run(&mut first).expect("run"), Value::Number(12.0));
            assert_eq!(prepared.run(&mut second).expect("run"), Value::Number(1.0));
        }
    }
}
