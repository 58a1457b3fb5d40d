use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use anyhow::{Context as _, Result, ensure};

use nua::backend::{self, Backend};
use nua::compiler::{CompileOptions, Compiler};
use nua::interpreter::Interpreter;
use nua::runtime::{Context, Value};
use nua::{lexer, parser};
use test_support::{
    Case, CaseClass, is_backend_unsupported, load_cases, normalize_output,
    validate_unsupported_backends,
};

const KNOWN_BACKENDS: [&str; 2] = ["interpreter", "compiler"];

/// Fresh context whose `print` appends one line per call to the returned
/// buffer.
fn capturing_context() -> (Context, Rc<RefCell<Vec<String>>>) {
    let output = Rc::new(RefCell::new(Vec::new()));
    let sink = output.clone();
    let mut context = Context::new();
    context.register_native("print", None, move |args| {
        let line = args
            .iter()
            .map(Value::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        sink.borrow_mut().push(line);
        Ok(Value::Null)
    });
    (context, output)
}

/// Printed lines followed by the final value when it is not `null`, the
/// same shape the `nua` binary writes to stdout.
fn run_case(backend: &dyn Backend, case: &Case, source: &str) -> Result<String> {
    let tokens = lexer::tokenize(source).with_context(|| format!("Tokenizing {}", case.name))?;
    let program =
        parser::parse_tokens(tokens).with_context(|| format!("Parsing {}", case.name))?;
    let (mut context, output) = capturing_context();
    let value = backend
        .run(&program, &mut context)
        .with_context(|| format!("Backend {} failed for {}", backend.name(), case.name))?;
    let mut lines = output.borrow().clone();
    if !value.is_null() {
        lines.push(value.to_string());
    }
    Ok(lines.join("\n"))
}

fn frontend_error(source: &str) -> Option<String> {
    match lexer::tokenize(source) {
        Err(error) => Some(error.to_string()),
        Ok(tokens) => parser::parse_tokens(tokens).err().map(|error| error.to_string()),
    }
}

fn run_programs_for_backend(backend: &dyn Backend) -> Result<()> {
    let cases = load_cases(Path::new("tests/programs"))?;

    for case in cases {
        validate_unsupported_backends(&case, &KNOWN_BACKENDS)?;
        if is_backend_unsupported(&case, backend.name()) {
            continue;
        }
        if case.spec.bench.enabled {
            ensure!(
                !case.spec.bench.tags.is_empty(),
                "Case {} has bench enabled but no tags",
                case.name
            );
        }
        let source = case.read_source()?;
        match case.spec.class {
            CaseClass::RuntimeSuccess => {
                let expected = case.expected_stdout()?;
                let output = run_case(backend, &case, &source)?;
                assert_eq!(
                    normalize_output(&output),
                    normalize_output(&expected),
                    "Backend {} mismatch for {}",
                    backend.name(),
                    case.name
                );
            }
            CaseClass::FrontendError => {
                let expected_error = case.expected_error()?;
                let actual = frontend_error(&source).with_context(|| {
                    format!("Expected frontend error in {}, but parsing succeeded", case.name)
                })?;
                ensure!(
                    actual.contains(&expected_error),
                    "Expected frontend error containing '{expected_error}' in {}, got '{actual}'",
                    case.name
                );
            }
            CaseClass::RuntimeError => {
                let expected_error = case.expected_error()?;
                let result = run_case(backend, &case, &source);
                ensure!(
                    result.is_err(),
                    "Expected runtime error for backend {} in {}",
                    backend.name(),
                    case.name
                );
                let actual = format!("{:#}", result.expect_err("result checked as err"));
                ensure!(
                    actual.contains(&expected_error),
                    "Expected runtime error containing '{expected_error}' in {}, got '{actual}'",
                    case.name
                );
            }
        }
    }

    Ok(())
}

#[test]
fn runs_programs_interpreter_backend() -> Result<()> {
    run_programs_for_backend(&Interpreter::new())
}

#[test]
fn runs_programs_compiler_backend() -> Result<()> {
    run_programs_for_backend(&Compiler::new())
}

#[test]
fn backends_cover_every_known_name() {
    let names: Vec<_> = backend::backends()
        .iter()
        .map(|backend| backend.name())
        .collect();
    assert_eq!(names, KNOWN_BACKENDS);
}

#[test]
fn cached_list_literals_only_change_aliasing() -> Result<()> {
    let source = "func row() { return: [0, 0] }\na = row()\nb = row()\na[0] = 9\n[a, b]";
    let program = parser::parse(source)?;
    let cached = Compiler::with_options(CompileOptions {
        cache_list_literals: true,
    });
    let shared = cached.run(&program, &mut Context::new())?;
    let interpreted = Interpreter::new().run(&program, &mut Context::new())?;
    assert_eq!(shared.to_string(), "[[9, 0], [9, 0]]");
    assert_eq!(interpreted.to_string(), "[[9, 0], [0, 0]]");
    Ok(())
}
