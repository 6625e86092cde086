//! OpenLap headless demo
//!
//! Wires the full pipeline together without a window: starts the simulation
//! driver, drains snapshots into an interpolation buffer, samples slightly
//! behind the live edge, and scores a short race while exercising time warp
//! and hot reconfiguration.

use anyhow::Result;
use openlap_core::Snapshot;
use openlap_runtime::{standings, DriverConfig, InterpBuffer, RaceController, SimDriver};
use std::time::{Duration, Instant};
use tracing::info;

/// Sample this far behind the newest snapshot so there is always a bracket
/// to interpolate inside.
const INTERP_DELAY_SECS: f64 = 0.050;

const RACE_LAPS: u64 = 3;

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting OpenLap demo");

    let mut driver = SimDriver::new(DriverConfig::default());
    driver.start()?;

    let channel = driver.channel();
    let mut cursor = 0u64;
    let mut buffer = InterpBuffer::new();
    let mut race = RaceController::new(RACE_LAPS);

    let started = Instant::now();
    let mut last_report = Instant::now();
    let mut warped = false;
    let mut reconfigured = false;

    while started.elapsed() < Duration::from_secs(10) {
        // Drain everything new, then sample slightly in the past
        while let Some(snap) = channel.try_consume_latest(&mut cursor) {
            if snap.sim_time < buffer.latest_time() {
                // The driver was reseeded; interpolation restarts clean
                buffer.clear();
            }
            buffer.push(snap);
        }

        if let Some(view) = buffer.sample(buffer.latest_time() - INTERP_DELAY_SECS) {
            race.observe(&view);
            if last_report.elapsed() >= Duration::from_secs(1) {
                last_report = Instant::now();
                report(&driver, &view);
            }
        }

        if !warped && started.elapsed() > Duration::from_secs(3) {
            warped = true;
            info!("fast-forwarding at 4x");
            driver.set_time_scale(4.0);
        }
        if !reconfigured && started.elapsed() > Duration::from_secs(6) {
            reconfigured = true;
            info!("switching preset and reseeding to 4 cars");
            driver.request_preset(driver.preset().next());
            driver.request_reseed(4);
            race.reset(RACE_LAPS);
        }

        std::thread::sleep(Duration::from_millis(10));
    }

    for result in race.results() {
        info!(
            position = result.position,
            car = result.car_id,
            best_lap = ?result.best_lap,
            "final classification"
        );
    }

    driver.stop();
    Ok(())
}

fn report(driver: &SimDriver, view: &Snapshot) {
    let order = standings(view);
    let Some(leader) = order.first() else {
        return;
    };
    info!(
        preset = driver.preset_name(),
        sim_time = view.sim_time,
        tick = view.tick,
        leader = leader.id,
        lap = leader.lap,
        best_lap = ?leader.best_lap_time,
        "standings"
    );
}
