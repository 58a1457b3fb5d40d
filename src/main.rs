use std::fs;
use std::io::{self, Read};

use anyhow::{Context as _, Result, bail};
use tracing_subscriber::EnvFilter;

use nua::BackendKind;
use nua::compiler::CompileOptions;
use nua::runtime::{Context, Value};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("nua=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn register_print(context: &mut Context) {
    context.register_native("print", None, |args| {
        let line = args
            .iter()
            .map(Value::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        println!("{line}");
        Ok(Value::Null)
    });
}

fn main() -> Result<()> {
    init_tracing();

    let mut args = std::env::args().skip(1);
    let mut kind = BackendKind::default();
    let mut options = CompileOptions::default();
    let mut input_path: Option<String> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--backend" | "-b" => {
                let name = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("Missing backend name after {arg}"))?;
                kind = name.parse()?;
            }
            "--cache-lists" => options.cache_list_literals = true,
            _ => {
                input_path = Some(arg);
                if args.next().is_some() {
                    bail!("Only one input file is supported");
                }
                break;
            }
        }
    }

    let source = if let Some(path) = input_path {
        fs::read_to_string(&path).with_context(|| format!("Reading {path}"))?
    } else {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Reading stdin")?;
        buffer
    };

    let mut context = Context::new();
    register_print(&mut context);
    let value = nua::run_with_options(&source, &mut context, kind, options)?;
    if !value.is_null() {
        println!("{value}");
    }
    Ok(())
}
