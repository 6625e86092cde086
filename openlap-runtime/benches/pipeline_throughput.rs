//! Criterion benchmarks for the hot path: snapshot publish/consume and
//! time-indexed sampling of a full interpolation buffer.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use openlap_core::{CarPose, Snapshot};
use openlap_runtime::{InterpBuffer, SnapshotChannel};

fn snapshot(tick: u64, sim_time: f64, cars: usize) -> Snapshot {
    let mut snap = Snapshot {
        sim_time,
        tick,
        ..Default::default()
    };
    for i in 0..cars {
        snap.cars.push(CarPose {
            id: i as u32,
            x: i as f64 * 3.0,
            y: i as f64 * -2.0,
            heading_rad: 0.3,
            s: i as f64 * 9.0,
            lap: tick / 1000,
            last_lap_time: Some(16.1),
            best_lap_time: Some(15.8),
            gap_to_leader_m: Some(i as f64 * 9.0),
            gap_to_leader_s: Some(i as f64 * 0.13),
            sector_last: [Some(5.3), Some(5.4), Some(5.2)],
            sector_best: [Some(5.2), Some(5.3), Some(5.1)],
        });
    }
    snap.project_primary();
    snap
}

fn bench_publish_consume(c: &mut Criterion) {
    let channel = SnapshotChannel::new();
    let mut cursor = 0;
    let mut tick = 0u64;

    c.bench_function("channel_publish_consume_20_cars", |b| {
        b.iter(|| {
            tick += 1;
            channel.publish(snapshot(tick, tick as f64 / 240.0, 20));
            black_box(channel.try_consume_latest(&mut cursor));
        })
    });
}

fn bench_interp_sample(c: &mut Criterion) {
    let mut buffer = InterpBuffer::new();
    for tick in 0..64u64 {
        buffer.push(snapshot(tick, tick as f64 / 240.0, 20));
    }
    // Off the grid of stored times, so every sample interpolates
    let target = buffer.latest_time() * 0.5 + 0.0007;

    c.bench_function("interp_sample_full_buffer_20_cars", |b| {
        b.iter(|| black_box(buffer.sample(black_box(target))))
    });
}

criterion_group!(benches, bench_publish_consume, bench_interp_sample);
criterion_main!(benches);
