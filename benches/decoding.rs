//! Benchmarks for verdict decoding.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use examen::grading::decode;

fn bench_decode(c: &mut Criterion) {
    let well_formed = "最终评分\n7\n回答覆盖了互斥锁的实现细节、优先级反转以及无锁替代方案。";
    let long_commentary = format!("最终评分\n3\n{}", "点评内容。".repeat(400));
    let malformed = "The answer is good overall, I would rate it highly.";

    let mut group = c.benchmark_group("decode");
    group.bench_function("well_formed", |b| b.iter(|| decode(black_box(well_formed))));
    group.bench_function("long_commentary", |b| {
        b.iter(|| decode(black_box(&long_commentary)))
    });
    group.bench_function("malformed", |b| b.iter(|| decode(black_box(malformed))));
    group.finish();
}

criterion_group!(benches, bench_decode);
criterion_main!(benches);
