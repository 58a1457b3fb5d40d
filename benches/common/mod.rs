#![allow(dead_code)]
use std::fs;
use std::path::Path;

use nua::ast::Program;
use nua::runtime::{Context, Value};
use nua::{lexer, parser};

/// `(label, path)` for every program case with benchmarking enabled.
pub fn workloads() -> Vec<(String, String)> {
    test_support::bench_workloads(Path::new("tests/programs"))
        .unwrap_or_else(|err| panic!("load bench workloads: {err:#}"))
        .into_iter()
        .map(|(label, path)| (label, path.display().to_string()))
        .collect()
}

pub fn load_source(path: &str) -> String {
    fs::read_to_string(path).unwrap_or_else(|err| panic!("read {path}: {err}"))
}

pub fn load_program(path: &str) -> Program {
    let source = load_source(path);
    let tokens = lexer::tokenize(&source).unwrap_or_else(|err| panic!("tokenize {path}: {err}"));
    parser::parse_tokens(tokens).unwrap_or_else(|err| panic!("parse {path}: {err}"))
}

/// Context with a `print` that discards its arguments.
pub fn quiet_context() -> Context {
    let mut context = Context::new();
    context.register_native("print", None, |_| Ok(Value::Null));
    context
}
