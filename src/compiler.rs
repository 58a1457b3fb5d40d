use anyhow::Result;
use tracing::debug;

use crate::ast::Program;
use crate::backend::{Backend, PreparedBackend};
use crate::runtime::{Context, Value};

mod compiled;
mod expression;
mod process;

pub use compiled::{CompiledBlock, CompiledExpr, CompiledProcess, CompiledProgram};

/// Knobs for the closure compiler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// Evaluate each list literal once and hand out the same list on every
    /// later evaluation. Off by default: a literal builds a fresh list each
    /// time, like the tree-walking interpreter.
    pub cache_list_literals: bool,
}

/// Backend that lowers the AST once into a tree of pre-bound closures.
#[derive(Debug, Clone, Copy, Default)]
pub struct Compiler {
    options: CompileOptions,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CompileOptions) -> Self {
        Self { options }
    }

    pub fn compile(&self, program: &Program) -> CompiledProgram {
        let body = self.compile_block(&program.body);
        debug!(
            statements = program.body.statements.len(),
            cache_list_literals = self.options.cache_list_literals,
            "compiled program"
        );
        CompiledProgram::new(body)
    }
}

impl PreparedBackend for CompiledProgram {
    fn run(&self, context: &mut Context) -> Result<Value> {
        Ok(CompiledProgram::run(self, context)?)
    }
}

impl Backend for Compiler {
    fn name(&self) -> &'static str {
        "compiler"
    }

    fn prepare(&self, program: &Program) -> Result<Box<dyn PreparedBackend>> {
        Ok(Box::new(self.compile(program)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::Interpreter;
    use crate::parser;
    use crate::runtime::RuntimeError;
    use indoc::indoc;

    fn compile_source(source: &str, options: CompileOptions) -> CompiledProgram {
        let program = parser::parse(source).expect("parse failed");
        Compiler::with_options(options).compile(&program)
    }

    fn run_both(source: &str) -> (String, String) {
        let program = parser::parse(source).expect("parse failed");
        let interpreted = Interpreter::new()
            .run(&program, &mut Context::new())
            .expect("interpreter failed");
        let compiled = Compiler::new()
            .compile(&program)
            .run(&mut Context::new())
            .expect("compiled run failed");
        (interpreted.to_string(), compiled.to_string())
    }

    #[test]
    fn agrees_with_interpreter() {
        let sources = [
            "1 + 2 * 3",
            "2 ** 3 ** 2",
            "-10 // 3",
            "7 % 3 - 1 / 4",
            "false or \"x\"",
            "null or false",
            "1 and 2 and 3",
            "not 1 == 2",
            "\"a\" < \"b\"",
            "[1, 2, 3][-1]",
            "[1, 2, 3][1.5]",
            "{ a: [1, { b: 2 }] }.a[1].b",
            "\"n=\" + 4",
            indoc! {"
                t = { }
                for i of 1..9..2 { t[i] = i * i }
                s = 0
                for v, k in t { if k > 5 { break } s += v }
                s
            "},
            indoc! {"
                func fact(n) { if n <= 1 { return: 1 } return: n * fact(n - 1) }
                xs = []
                for i of 5..1 { xs[5 - i] = fact(i) }
                xs
            "},
            indoc! {"
                func make(step) {
                    total = 0
                    return: func() { total += step return: total }
                }
                inc = make(3)
                inc()
                inc()
            "},
        ];
        for source in sources {
            let (interpreted, compiled) = run_both(source);
            assert_eq!(interpreted, compiled, "source: {source}");
        }
    }

    #[test]
    fn compiles_once_and_runs_many_times() {
        let compiled = compile_source("n = n + 1\nn", CompileOptions::default());
        let mut context = Context::new();
        context.set("n", Value::Number(0.0));
        for expected in 1..=3 {
            let value = compiled.run(&mut context).expect("run failed");
            assert_eq!(value, Value::Number(f64::from(expected)));
        }
    }

    #[test]
    fn list_literals_are_fresh_by_default() {
        let source = indoc! {"
            func make() { return: [] }
            a = make()
            b = make()
            a[0] = 1
            [a == b, b]
        "};
        let value = compile_source(source, CompileOptions::default())
            .run(&mut Context::new())
            .expect("run failed");
        assert_eq!(value.to_string(), "[false, []]");
    }

    #[test]
    fn cached_list_literals_alias_one_instance() {
        let source = indoc! {"
            func make() { return: [] }
            a = make()
            b = make()
            a[0] = 1
            [a == b, b]
        "};
        let options = CompileOptions {
            cache_list_literals: true,
        };
        let compiled = compile_source(source, options);
        let value = compiled.run(&mut Context::new()).expect("run failed");
        assert_eq!(value.to_string(), "[true, [1]]");
    }

    #[test]
    fn cached_list_is_built_from_the_first_evaluation() {
        let options = CompileOptions {
            cache_list_literals: true,
        };
        let compiled = compile_source("[n]", options);
        let mut context = Context::new();
        context.set("n", Value::Number(1.0));
        let first = compiled.run(&mut context).expect("run failed");
        context.set("n", Value::Number(2.0));
        let second = compiled.run(&mut context).expect("run failed");
        assert_eq!(second.to_string(), "[1]");
        assert_eq!(first, second);
    }

    #[test]
    fn reentrant_cached_literal_keeps_the_innermost_list() {
        let options = CompileOptions {
            cache_list_literals: true,
        };
        let compiled = compile_source(
            indoc! {"
                func nest(n) {
                    if n == 0 { return: 0 }
                    return: [n, nest(n - 1)]
                }
                [nest(2), nest(5)]
            "},
            options,
        );
        let value = compiled.run(&mut Context::new()).expect("run failed");
        assert_eq!(value.to_string(), "[[1, 0], [1, 0]]");
    }

    #[test]
    fn return_propagates_out_of_compiled_loops() {
        let value = compile_source(
            indoc! {"
                func find(xs, wanted) {
                    for x, i in xs { if x == wanted { return: i } }
                    loop { return: -1 }
                }
                [find([4, 5, 6], 6), find([], 1)]
            "},
            CompileOptions::default(),
        )
        .run(&mut Context::new())
        .expect("run failed");
        assert_eq!(value.to_string(), "[2, -1]");
    }

    #[test]
    fn surfaces_runtime_errors() {
        let err = compile_source("x = [1]\nx * 2", CompileOptions::default())
            .run(&mut Context::new())
            .expect_err("expected runtime failure");
        assert!(matches!(
            err,
            RuntimeError::TypeMismatch {
                operation: "*",
                left: "list",
                ..
            }
        ));
        let err = compile_source("continue", CompileOptions::default())
            .run(&mut Context::new())
            .expect_err("expected runtime failure");
        assert_eq!(err, RuntimeError::EscapedSignal { signal: "continue" });
    }
}
