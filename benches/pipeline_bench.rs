//! Benchmarks for the Forth Salon pipeline.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use forthsalon::pipeline::build;
use forthsalon::{Context, Vars};

fn bench_compile(c: &mut Criterion) {
    let samples = vec![
        ("straight_line", "1 2 + 3 * dup +"),
        ("word_call", ": sq dup * ; 5 sq 6 sq +"),
        ("branch", "x if 10 else 20 then"),
        (
            "fusable",
            "pi 2 * 1 2 3 * + dup dup -rot swap >= swap",
        ),
    ];

    let mut group = c.benchmark_group("compile");
    for (name, source) in samples {
        group.bench_with_input(BenchmarkId::from_parameter(name), source, |b, s| {
            b.iter(|| build(black_box(s.as_bytes())).unwrap())
        });
    }
    group.finish();
}

fn bench_run(c: &mut Criterion) {
    let source = ": sq dup * ; : dist2 sq swap sq + ; x y dist2 sqrt";
    let arena = build(source.as_bytes()).unwrap();

    c.bench_function("execute_dist2", |b| {
        b.iter(|| {
            let mut d = forthsalon::Stack::new();
            let mut r = forthsalon::Stack::new();
            let mut vars = Vars::new(3.0, 4.0, 0.0, 0.0);
            forthsalon::executor::execute(black_box(&arena), &mut d, &mut r, &mut vars).unwrap();
        })
    });
}

fn bench_context_roundtrip(c: &mut Criterion) {
    c.bench_function("context_parse_then_run", |b| {
        b.iter(|| {
            let mut ctx = Context::new();
            ctx.parse(black_box(b": sq dup * ; 5 sq")).unwrap();
            let mut vars = Vars::default();
            ctx.run(&mut vars).unwrap();
        })
    });
}

criterion_group!(benches, bench_compile, bench_run, bench_context_roundtrip);
criterion_main!(benches);
