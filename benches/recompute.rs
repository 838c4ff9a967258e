use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};

use responsive::{BreakpointMap, EventLoop, Listener, MediaEnvironment, ResizeNotifier, Responsive, AGGREGATE_ENTER};

fn bench_recompute(c: &mut Criterion) {
    let env = Arc::new(MediaEnvironment::new());
    let tracker = Responsive::builder()
        .breakpoints(BreakpointMap::default())
        .evaluator(env.clone())
        .notifier(Arc::new(ResizeNotifier::new()))
        .event_loop(Arc::new(EventLoop::new()))
        .build()
        .unwrap();
    tracker.on(AGGREGATE_ENTER, &Listener::new(|_, _| {}));

    c.bench_function("update_unchanged", |b| {
        b.iter(|| tracker.update().unwrap());
    });

    let mut wide = false;
    c.bench_function("update_toggle_desk", |b| {
        b.iter(|| {
            wide = !wide;
            env.set("screen and (min-width: 1024px)", wide);
            tracker.update().unwrap()
        });
    });
}

criterion_group!(benches, bench_recompute);
criterion_main!(benches);
