use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::{rngs::StdRng, Rng, SeedableRng};

use huddle::identity::classify_path;
use huddle::messages::classify_str;

const SAMPLES: &[&str] = &[
    "AuthApiError: Refresh Token Not Found",
    "duplicate key value violates unique constraint \"events_name_key\"",
    "ERROR: canceling statement due to statement timeout",
    "connection refused",
    "Please choose a different meeting day.",
    "",
];

const PATHS: &[&str] = &[
    "/dashboard",
    "/events/42",
    "/members/abc/notes",
    "/login",
    "/",
    "/eventsfeed",
];

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify_str");
    for &input in SAMPLES {
        let label = if input.is_empty() { "<empty>" } else { input };
        group.bench_with_input(BenchmarkId::from_parameter(label), &input, |b, &input| {
            b.iter(|| criterion::black_box(classify_str(input)));
        });
    }
    group.finish();

    // Rule-table scan over a shuffled stream of inputs
    let mut rng = StdRng::seed_from_u64(0xC1A5_51F7);
    let stream: Vec<&str> = (0..1024).map(|_| SAMPLES[rng.gen_range(0..SAMPLES.len())]).collect();
    let mut group = c.benchmark_group("classify_stream");
    group.throughput(Throughput::Elements(stream.len() as u64));
    group.bench_function("mixed_1024", |b| {
        b.iter(|| {
            for &s in &stream {
                criterion::black_box(classify_str(s));
            }
        });
    });
    group.finish();
}

fn bench_routes(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify_path");
    group.throughput(Throughput::Elements(PATHS.len() as u64));
    group.bench_function("table", |b| {
        b.iter(|| {
            for &p in PATHS {
                criterion::black_box(classify_path(p));
            }
        });
    });
    group.finish();
}

criterion_group!(benches, bench_classify, bench_routes);
criterion_main!(benches);
