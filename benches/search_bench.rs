use bitprune::{keygen, search_crt, search_pq};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rug::rand::RandState;
use rug::Integer;

fn bench_search_pq(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_pq");
    for &reveal_rate in &[0.5, 0.7, 0.9] {
        let mut rng = RandState::new();
        let (n, known_p, known_q, _, _) = keygen::example_pq(20, reveal_rate, &mut rng);
        group.bench_function(format!("reveal_{reveal_rate}"), |b| {
            b.iter(|| search_pq::branch_and_prune(black_box(&n), black_box(&known_p), black_box(&known_q)))
        });
    }
    group.finish();
}

fn bench_search_crt(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_crt");
    for &reveal_rate in &[0.5, 0.7, 0.9] {
        let mut rng = RandState::new();
        let (n, e, known_dp, known_dq, ..) = keygen::example_crt(16, reveal_rate, &Integer::from(17), &mut rng);
        group.bench_function(format!("reveal_{reveal_rate}"), |b| {
            b.iter(|| search_crt::branch_and_prune_crt(black_box(&n), black_box(&e), black_box(&known_dp), black_box(&known_dq)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_search_pq, bench_search_crt);
criterion_main!(benches);
