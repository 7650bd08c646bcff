//! Benchmarks for markdown rendering.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use markmate::document::{RenderLimits, render_markdown};

fn bench_render_simple(c: &mut Criterion) {
    let md = "# Hello\n\nWorld";
    c.bench_function("render_simple", |b| {
        b.iter(|| render_markdown(black_box(md), 80, RenderLimits::default()).unwrap());
    });
}

fn bench_render_widths(c: &mut Criterion) {
    let md = include_str!("../tests/fixtures/sample.md");
    let mut group = c.benchmark_group("render_sample");
    for width in [40_u16, 80, 160] {
        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, &width| {
            b.iter(|| render_markdown(black_box(md), width, RenderLimits::default()).unwrap());
        });
    }
    group.finish();
}

fn bench_render_large(c: &mut Criterion) {
    let md = include_str!("../tests/fixtures/sample.md").repeat(50);
    c.bench_function("render_large", |b| {
        b.iter(|| render_markdown(black_box(&md), 100, RenderLimits::default()).unwrap());
    });
}

fn bench_visible_lines(c: &mut Criterion) {
    let md = include_str!("../tests/fixtures/sample.md").repeat(20);
    let doc = render_markdown(&md, 80, RenderLimits::default()).unwrap();

    c.bench_function("visible_lines", |b| {
        b.iter(|| doc.visible_lines(black_box(100), black_box(40)));
    });
}

criterion_group!(
    benches,
    bench_render_simple,
    bench_render_widths,
    bench_render_large,
    bench_visible_lines
);
criterion_main!(benches);
