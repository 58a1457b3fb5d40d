mod common;

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use nua::backend::{Backend, backends};
use nua::compiler::Compiler;

fn bench_backends(c: &mut Criterion) {
    for (label, path) in common::workloads() {
        let program = common::load_program(&path);

        for backend in backends() {
            c.bench_function(&format!("backend_{}_{label}", backend.name()), |b| {
                b.iter(|| {
                    let mut context = common::quiet_context();
                    let value = backend
                        .run(black_box(&program), &mut context)
                        .expect("run");
                    black_box(value);
                })
            });
        }

        let compiler = Compiler::new();
        c.bench_function(&format!("backend_compile_only_{label}"), |b| {
            b.iter(|| black_box(compiler.compile(black_box(&program))))
        });

        let compiled = compiler.compile(&program);
        c.bench_function(&format!("backend_compiled_run_only_{label}"), |b| {
            b.iter(|| {
                let mut context = common::quiet_context();
                black_box(compiled.run(&mut context).expect("run"));
            })
        });
    }
}

criterion_group!(benches, bench_backends);
criterion_main!(benches);
