//! Dispatch throughput benchmarks for clickgate-core

use clickgate_core::{AmbientConfig, ClickEngine, ConfigLayer, Handlers, RawEvent};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::time::{Duration, Instant};

fn engine_for(overrides: ConfigLayer, with_double: bool) -> ClickEngine<u64> {
    let mut handlers = Handlers::new(|id: u64| {
        black_box(id);
    });
    if with_double {
        handlers = handlers.with_double(|id: u64| {
            black_box(id);
        });
    }
    ClickEngine::new(overrides, AmbientConfig::default(), handlers)
}

fn bench_dispatch(c: &mut Criterion) {
    let policies = [
        ("immediate", ConfigLayer::new()),
        ("debounce", ConfigLayer::new().with_model("debounce").with_delay(300).with_max_wait(1000)),
        ("throttle", ConfigLayer::new().with_model("throttle").with_delay(300)),
    ];

    for (name, overrides) in policies {
        c.bench_function(&format!("dispatch_{}", name), |b| {
            let mut engine = engine_for(overrides.clone(), false);
            let t0 = Instant::now();
            let mut tick = 0u64;
            b.iter(|| {
                tick += 1;
                engine.dispatch(t0 + Duration::from_millis(tick * 7), RawEvent::single(tick));
            });
        });
    }
}

fn bench_disambiguation(c: &mut Criterion) {
    c.bench_function("single_then_double", |b| {
        let mut engine = engine_for(ConfigLayer::new(), true);
        let t0 = Instant::now();
        let mut tick = 0u64;
        b.iter(|| {
            tick += 1;
            let now = t0 + Duration::from_millis(tick * 400);
            engine.dispatch(now, RawEvent::single(tick));
            engine.dispatch(now + Duration::from_millis(50), RawEvent::double(tick));
        });
    });

    c.bench_function("advance_settled_singles", |b| {
        let mut engine = engine_for(ConfigLayer::new(), true);
        let t0 = Instant::now();
        let mut tick = 0u64;
        b.iter(|| {
            tick += 1;
            let now = t0 + Duration::from_millis(tick * 400);
            engine.dispatch(now, RawEvent::single(tick));
            engine.advance(now + Duration::from_millis(300));
        });
    });
}

criterion_group!(benches, bench_dispatch, bench_disambiguation);
criterion_main!(benches);
