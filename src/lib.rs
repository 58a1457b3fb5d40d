use anyhow::{Context as _, Result};

pub mod ast;
pub mod backend;
pub mod compiler;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod runtime;
pub mod token;

pub use backend::BackendKind;
use compiler::CompileOptions;
use runtime::{Context, Value};

/// Lexes, parses and runs `source` on the selected backend with default
/// compile options.
pub fn run(source: &str, context: &mut Context, kind: BackendKind) -> Result<Value> {
    run_with_options(source, context, kind, CompileOptions::default())
}

/// Like [`run`], with `options` handed to the compiler backend.
pub fn run_with_options(
    source: &str,
    context: &mut Context,
    kind: BackendKind,
    options: CompileOptions,
) -> Result<Value> {
    let tokens = lexer::tokenize(source).context("Tokenizing")?;
    let program = parser::parse_tokens(tokens).context("Parsing")?;
    kind.backend(options)
        .run(&program, context)
        .with_context(|| format!("Running on {kind}"))
}
