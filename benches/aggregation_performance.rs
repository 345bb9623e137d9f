use criterion::{Criterion, black_box, criterion_group, criterion_main};
use paddock::aggregation::{acceleration_interval, kernel_density, qualifying_deltas};
use paddock::session::{EventInfo, Lap, SessionData, SessionType, TelemetrySample};
use std::time::Duration;

fn create_launch_telemetry(samples: usize) -> Vec<TelemetrySample> {
    (0..samples)
        .map(|i| TelemetrySample {
            time: Duration::from_millis(i as u64 * 40), // ~25Hz car data
            distance_m: i as f64 * 2.5,
            speed_kph: (i as f64 * 1.7).min(310.),
            throttle_pct: 100.,
            brake: false,
        })
        .collect()
}

fn create_qualifying_session(drivers: usize, laps_per_driver: u32) -> SessionData {
    let mut session = SessionData::new(EventInfo {
        name: "Italian Grand Prix".to_string(),
        year: 2023,
        session: SessionType::Qualifying,
    });
    for d in 0..drivers {
        for lap_number in 1..=laps_per_driver {
            let millis = 80_000 + (d as u64 * 97 + lap_number as u64 * 13) % 1_500;
            session.laps.push(Lap {
                driver: format!("D{:02}", d),
                team: format!("Team {}", d / 2),
                lap_number,
                lap_time: Some(Duration::from_millis(millis)),
                sector1_time: None,
                sector2_time: None,
                sector3_time: None,
                compound: None,
                is_quick: true,
            });
        }
    }
    session
}

fn bench_acceleration(c: &mut Criterion) {
    let mut group = c.benchmark_group("acceleration");

    let samples = create_launch_telemetry(2_000);
    group.bench_function("acceleration_interval", |b| {
        b.iter(|| black_box(acceleration_interval("VER", "Red Bull Racing", &samples)));
    });

    group.finish();
}

fn bench_qualifying(c: &mut Criterion) {
    let mut group = c.benchmark_group("qualifying");

    let session = create_qualifying_session(20, 12);
    group.bench_function("qualifying_deltas", |b| {
        b.iter(|| black_box(qualifying_deltas(&session)));
    });

    group.finish();
}

fn bench_distribution(c: &mut Criterion) {
    let mut group = c.benchmark_group("distribution");

    let lap_times: Vec<f64> = (0..60).map(|i| 105. + (i % 11) as f64 * 0.173).collect();
    group.bench_function("kernel_density", |b| {
        b.iter(|| black_box(kernel_density(&lap_times, 64)));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_acceleration,
    bench_qualifying,
    bench_distribution
);
criterion_main!(benches);
