//! Live tick cost over a grid of sensors and signals.
//!
//! Fixed layout, no I/O. Sensors sit on a ring facing the centre; signals
//! are scattered deterministically so roughly a third fall inside a cone.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use perceive_core::{Awareness, Sensor, SensorManager, Signal, Vec3, ViewCone};

fn populate(sensors: usize, signals: usize) -> SensorManager {
    let mut mgr = SensorManager::default();
    for i in 0..sensors {
        let angle = i as f32 / sensors as f32 * 360.0;
        let position = Vec3::FORWARD.rotate_y(angle) * 20.0;
        mgr.register_sensor(
            Sensor::vision(3.0)
                .with_transform(position, -position.normalize())
                .with_cone(ViewCone::new(120, 8.0, Awareness::Low))
                .with_cone(ViewCone::new(40, 15.0, Awareness::High))
                .on_detected(|link| {
                    black_box(link.awareness);
                }),
        );
    }
    for i in 0..signals {
        let angle = (i * 37 % 360) as f32;
        let radius = (i * 13 % 25) as f32;
        mgr.register_signal(Signal::visual(Vec3::FORWARD.rotate_y(angle) * radius));
    }
    mgr
}

fn bench_live_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("live_tick");
    for &(sensors, signals) in &[(8, 32), (32, 128), (64, 512)] {
        group.throughput(Throughput::Elements((sensors * signals) as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{sensors}x{signals}")),
            &(sensors, signals),
            |b, &(sensors, signals)| {
                let mut mgr = populate(sensors, signals);
                let mut now = 0.0;
                b.iter(|| {
                    now += 0.016;
                    black_box(mgr.tick(1, now))
                });
            },
        );
    }
    group.finish();
}

fn bench_throttled_frames(c: &mut Criterion) {
    let mut mgr = populate(32, 128);
    let mut now = 0.0;
    c.bench_function("throttled_frame_delay_5", |b| {
        b.iter(|| {
            now += 0.016;
            black_box(mgr.tick(5, now))
        })
    });
}

criterion_group!(benches, bench_live_tick, bench_throttled_frames);
criterion_main!(benches);
