use criterion::{black_box, criterion_group, Criterion};
use wide_events::{Emitter, EventSink, FilterOutcome, FinishedEvent};

struct NoSink;
impl EventSink for NoSink {
    fn write(&self, _event: &FinishedEvent) {}
}

fn build_and_close(emitter: &Emitter) {
    let mut event = emitter.event();
    event.set("method", "GET").set("status", black_box(200));
    event.with_group("response", |response| {
        response.set("bytes", black_box(1024));
    });
    event.close();
}

fn events(c: &mut Criterion) {
    let mut group = c.benchmark_group("Events");
    let directory = tempfile::tempdir().expect("temp directory for benches");

    let discarding = Emitter::builder("bench-discard", directory.path())
        .filter(|_, _| FilterOutcome::Discard)
        .build()
        .expect("bench emitter builds");

    group.bench_function("construct, freeze, discard", |bencher| {
        bencher.iter(|| build_and_close(&discarding))
    });

    let no_sink = Emitter::builder("bench-shape", directory.path())
        .add_sink(NoSink)
        .build()
        .expect("bench emitter builds");

    group.bench_function("construct, freeze, emit to file and no-op sink", |bencher| {
        bencher.iter(|| build_and_close(&no_sink))
    });
}

criterion_group!(benches, events);
