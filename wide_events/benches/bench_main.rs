mod benchmarks;

criterion::criterion_main! {
    benchmarks::events_bench::benches,
}
