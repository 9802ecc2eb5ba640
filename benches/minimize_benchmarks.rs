use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use minkit::math::{pow2, pow3};
use minkit::prelude::*;
use ndarray::prelude::*;
use std::time::Duration;

#[derive(Clone)]
struct TestProblem {
    name: String,
    function: fn(&Array1<f64>) -> f64,
    x0: Array1<f64>,
    dimensions: usize,
}

fn sphere_function(x: &Array1<f64>) -> f64 {
    x.mapv(pow2).sum()
}

fn rosenbrock_function(x: &Array1<f64>) -> f64 {
    x.windows(2)
        .into_iter()
        .map(|w| 100.0 * pow2(w[1] - pow2(w[0])) + pow2(1.0 - w[0]))
        .sum()
}

fn cigar_function(x: &Array1<f64>) -> f64 {
    pow2(x[0]) + 1000.0 * x.slice(s![1..]).mapv(pow2).sum()
}

fn setup_test_problems() -> Vec<TestProblem> {
    let mut problems = Vec::new();
    for &n in &[2, 5, 10] {
        problems.push(TestProblem {
            name: format!("sphere_{}d", n),
            function: sphere_function,
            x0: Array1::from_elem(n, 1.5),
            dimensions: n,
        });
        problems.push(TestProblem {
            name: format!("rosenbrock_{}d", n),
            function: rosenbrock_function,
            x0: Array1::zeros(n),
            dimensions: n,
        });
        problems.push(TestProblem {
            name: format!("cigar_{}d", n),
            function: cigar_function,
            x0: Array1::ones(n),
            dimensions: n,
        });
    }
    problems
}

fn bench_univariate(c: &mut Criterion) {
    let mut group = c.benchmark_group("univariate");
    group.sample_size(50);

    group.bench_function("bracket_refine_cos", |b| {
        let f = |x: f64| x.cos();
        b.iter(|| {
            let mut br = bracket(&f, black_box(3.0), black_box(4.0)).unwrap();
            black_box(refine(&f, &mut br, 1e-8).unwrap())
        });
    });

    group.bench_function("find_root_cubic", |b| {
        let f = |x: f64| pow3(x) - x - 1.0;
        b.iter(|| {
            let mut br = RootBracket::new(black_box(1.0), black_box(2.0));
            black_box(find_root(&f, &mut br, 100).unwrap())
        });
    });
    group.finish();
}

fn bench_powell(c: &mut Criterion) {
    let problems = setup_test_problems();

    let mut group = c.benchmark_group("powell");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(20);

    for problem in &problems {
        group.throughput(Throughput::Elements(problem.dimensions as u64));
        group.bench_with_input(
            BenchmarkId::new("minimize", &problem.name),
            problem,
            |b, prob| {
                let options = PowellOptions {
                    max_iters: 1000,
                    ..PowellOptions::default()
                };
                b.iter(|| {
                    let mut point = prob.x0.clone();
                    let mut directions = unit_directions(prob.dimensions);
                    let result = powell_minimize(
                        &prob.function,
                        black_box(&mut point),
                        &mut directions,
                        &options,
                    );
                    black_box(result)
                });
            },
        );
    }
    group.finish();
}

criterion_group!(minimize_benches, bench_univariate, bench_powell);
criterion_main!(minimize_benches);
