//! Simulation driver thread
//!
//! `SimDriver` owns the producer side of the pipeline: one thread stepping
//! the engine at a fixed wall cadence, deriving telemetry, assembling a
//! full snapshot every tick, and publishing it through the channel.
//!
//! All runtime controls (time warp, reseed, preset change) are
//! fire-and-forget `ControlCommand` messages, drained only at the top of a
//! tick so a reconfiguration can never be observed half-applied.

use crate::channel::SnapshotChannel;
use crossbeam_channel::{unbounded, Receiver, Sender};
use openlap_core::{CarPose, Snapshot, TrackPath};
use openlap_sim::{default_grid, SimEngine, TelemetryTracker, TrackPreset};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default wall cadence of the simulation loop.
pub const DEFAULT_TICK_HZ: f64 = 240.0;

/// Default car count of a freshly configured world.
pub const DEFAULT_CAR_COUNT: usize = 8;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("driver is already running")]
    AlreadyRunning,
    #[error("failed to spawn simulation thread")]
    Spawn(#[from] std::io::Error),
}

/// A control request, consumed atomically at the next tick boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ControlCommand {
    /// Multiplier on per-tick time advancement; 0 pauses, values above 1
    /// fast-forward. Negative values are clamped to 0 at the point of use.
    SetTimeScale(f64),
    /// Rebuild the car list with this many cars; resets sim time, tick
    /// counter, and telemetry.
    Reseed(usize),
    /// Swap the track geometry; resets the world like a reseed.
    ChangePreset(TrackPreset),
}

/// Read-only view of the world the driver currently simulates. Consumers
/// use it to draw the track and label the preset.
#[derive(Debug, Clone)]
pub struct WorldView {
    pub preset: TrackPreset,
    pub path: Arc<TrackPath>,
    pub car_count: usize,
}

#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Wall-clock tick rate, Hz. Values below 1 are treated as 1.
    pub tick_hz: f64,
    pub preset: TrackPreset,
    pub car_count: usize,
    /// Initial time-warp multiplier.
    pub time_scale: f64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            tick_hz: DEFAULT_TICK_HZ,
            preset: TrackPreset::Stadium,
            car_count: DEFAULT_CAR_COUNT,
            time_scale: 1.0,
        }
    }
}

/// Owns the simulation thread and the channel it publishes into.
///
/// Dropping the driver stops the thread; after `stop()` returns no further
/// snapshot is published.
pub struct SimDriver {
    config: DriverConfig,
    channel: Arc<SnapshotChannel>,
    world: Arc<RwLock<WorldView>>,
    running: Arc<AtomicBool>,
    control_tx: Sender<ControlCommand>,
    control_rx: Receiver<ControlCommand>,
    handle: Option<JoinHandle<()>>,
}

impl SimDriver {
    pub fn new(config: DriverConfig) -> Self {
        let (control_tx, control_rx) = unbounded();
        let world = Arc::new(RwLock::new(WorldView {
            preset: config.preset,
            path: Arc::new(config.preset.build()),
            car_count: config.car_count.max(1),
        }));
        Self {
            config,
            channel: Arc::new(SnapshotChannel::new()),
            world,
            running: Arc::new(AtomicBool::new(false)),
            control_tx,
            control_rx,
            handle: None,
        }
    }

    /// The channel this driver publishes into.
    pub fn channel(&self) -> Arc<SnapshotChannel> {
        Arc::clone(&self.channel)
    }

    /// Snapshot of the current world configuration.
    pub fn world(&self) -> WorldView {
        self.world.read().clone()
    }

    /// Current track geometry, shared read-only.
    pub fn track_path(&self) -> Arc<TrackPath> {
        Arc::clone(&self.world.read().path)
    }

    pub fn preset(&self) -> TrackPreset {
        self.world.read().preset
    }

    pub fn preset_name(&self) -> &'static str {
        self.preset().name()
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Request a new time-warp multiplier. Applied at the next tick.
    pub fn set_time_scale(&self, scale: f64) {
        self.send(ControlCommand::SetTimeScale(scale));
    }

    /// Request a hot reseed to `car_count` cars. Applied at the next tick.
    pub fn request_reseed(&self, car_count: usize) {
        self.send(ControlCommand::Reseed(car_count));
    }

    /// Request a track preset change. Applied at the next tick.
    pub fn request_preset(&self, preset: TrackPreset) {
        self.send(ControlCommand::ChangePreset(preset));
    }

    fn send(&self, cmd: ControlCommand) {
        // Cannot fail: the driver keeps a receiver clone alive.
        let _ = self.control_tx.send(cmd);
    }

    /// Spawn the simulation thread.
    pub fn start(&mut self) -> Result<(), DriverError> {
        if self.handle.is_some() {
            return Err(DriverError::AlreadyRunning);
        }

        self.running.store(true, Ordering::Release);
        let ctx = TickLoop {
            base_dt: 1.0 / self.config.tick_hz.max(1.0),
            time_scale: self.config.time_scale,
            channel: Arc::clone(&self.channel),
            world: Arc::clone(&self.world),
            running: Arc::clone(&self.running),
            control_rx: self.control_rx.clone(),
        };
        let handle = thread::Builder::new()
            .name("openlap-sim".into())
            .spawn(move || ctx.run())?;
        self.handle = Some(handle);

        info!(
            tick_hz = self.config.tick_hz,
            preset = self.preset_name(),
            cars = self.world.read().car_count,
            "simulation driver started"
        );
        Ok(())
    }

    /// Stop the simulation thread and join it. Once this returns, no
    /// further snapshot is published.
    pub fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        self.running.store(false, Ordering::Release);
        if handle.join().is_err() {
            warn!("simulation thread panicked during shutdown");
        }
        info!("simulation driver stopped");
    }
}

impl Drop for SimDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

/// State owned by the simulation thread.
struct TickLoop {
    base_dt: f64,
    time_scale: f64,
    channel: Arc<SnapshotChannel>,
    world: Arc<RwLock<WorldView>>,
    running: Arc<AtomicBool>,
    control_rx: Receiver<ControlCommand>,
}

impl TickLoop {
    fn run(mut self) {
        let mut sim = SimEngine::new();
        let mut telem = TelemetryTracker::new();
        reseed_world(&mut sim, &mut telem, &self.world.read());

        let tick_interval = Duration::from_secs_f64(self.base_dt);
        let mut sim_time = 0.0;
        let mut tick: u64 = 0;
        let mut next = Instant::now() + tick_interval;

        while self.running.load(Ordering::Relaxed) {
            // Apply pending reconfiguration before touching the world
            while let Ok(cmd) = self.control_rx.try_recv() {
                self.apply(cmd, &mut sim, &mut telem, &mut sim_time, &mut tick);
            }

            let dt_eff = self.base_dt * self.time_scale.max(0.0);
            if dt_eff > 0.0 {
                sim.step(dt_eff);
                sim_time += dt_eff;
            }
            // The tick counter advances even when paused, so consumers can
            // tell "frozen but alive" from "stalled"
            tick += 1;

            telem.update(&sim, sim_time);
            self.channel
                .publish(assemble_snapshot(&sim, &telem, sim_time, tick));

            next += tick_interval;
            let now = Instant::now();
            if next > now {
                thread::sleep(next - now);
            } else {
                // Overran the cadence; restart the schedule instead of
                // accumulating catch-up ticks
                next = now;
            }
        }
    }

    fn apply(
        &mut self,
        cmd: ControlCommand,
        sim: &mut SimEngine,
        telem: &mut TelemetryTracker,
        sim_time: &mut f64,
        tick: &mut u64,
    ) {
        match cmd {
            ControlCommand::SetTimeScale(scale) => {
                debug!(scale, "time scale set");
                self.time_scale = scale;
            }
            ControlCommand::Reseed(car_count) => {
                let view = {
                    let mut world = self.world.write();
                    world.car_count = car_count.max(1);
                    world.clone()
                };
                reseed_world(sim, telem, &view);
                *sim_time = 0.0;
                *tick = 0;
                info!(cars = view.car_count, "world reseeded");
            }
            ControlCommand::ChangePreset(preset) => {
                let view = {
                    let mut world = self.world.write();
                    world.preset = preset;
                    world.path = Arc::new(preset.build());
                    world.clone()
                };
                reseed_world(sim, telem, &view);
                *sim_time = 0.0;
                *tick = 0;
                info!(preset = preset.name(), "track preset changed");
            }
        }
    }
}

/// Rebuild the engine's world from the shared view: fresh track, fresh
/// grid, fresh telemetry.
fn reseed_world(sim: &mut SimEngine, telem: &mut TelemetryTracker, view: &WorldView) {
    sim.set_track_path((*view.path).clone());
    sim.clear_cars();
    for seed in default_grid(view.car_count, sim.track_length()) {
        sim.add_car(seed.id, seed.speed_mps, seed.s0, seed.laps0);
    }
    telem.reset();
}

/// Assemble the full per-tick snapshot: poses, timing telemetry, and
/// gap-to-leader for every car.
fn assemble_snapshot(
    sim: &SimEngine,
    telem: &TelemetryTracker,
    sim_time: f64,
    tick: u64,
) -> Snapshot {
    let mut snap = Snapshot {
        sim_time,
        tick,
        ..Default::default()
    };

    let len = sim.track_length();
    let mut progress = Vec::with_capacity(sim.car_count());
    let mut leader_progress = f64::NEG_INFINITY;
    let mut leader_speed = 1.0;

    for car in sim.cars() {
        let pose = sim.sample_pose(car.s);
        let mut cp = CarPose {
            id: car.id,
            x: pose.x,
            y: pose.y,
            heading_rad: pose.heading_rad,
            s: car.s,
            lap: car.laps,
            ..Default::default()
        };
        if let Some(times) = telem.times(car.id) {
            cp.last_lap_time = times.last_lap;
            cp.best_lap_time = times.best_lap;
            cp.sector_last = times.sector_last;
            cp.sector_best = times.sector_best;
        }

        let p = car.laps as f64 * len + car.s;
        if p > leader_progress {
            leader_progress = p;
            // Gap seconds assume closing at the leader's pace; the floor
            // keeps a stationary leader from producing infinite gaps
            leader_speed = car.speed_mps.max(1.0);
        }
        progress.push(p);
        snap.cars.push(cp);
    }

    for (cp, p) in snap.cars.iter_mut().zip(&progress) {
        let gap_m = (leader_progress - p).max(0.0);
        cp.gap_to_leader_m = Some(gap_m);
        cp.gap_to_leader_s = Some(gap_m / leader_speed);
    }

    snap.project_primary();
    snap
}

#[cfg(test)]
mod tests {
    use super::*;
    use openlap_core::Vec2;
    use openlap_sim::CircleTrack;

    #[test]
    fn test_assemble_snapshot_computes_gaps_from_leader() {
        let mut sim = SimEngine::with_circle(CircleTrack {
            center: Vec2::default(),
            radius_m: 100.0,
        });
        let len = sim.track_length();
        sim.add_car(0, 50.0, 100.0, 2); // leader: furthest total distance
        sim.add_car(1, 40.0, 50.0, 2);
        sim.add_car(2, 45.0, 100.0, 1);
        let telem = TelemetryTracker::new();

        let snap = assemble_snapshot(&sim, &telem, 12.5, 99);
        assert_eq!(snap.sim_time, 12.5);
        assert_eq!(snap.tick, 99);
        assert_eq!(snap.cars.len(), 3);

        let c0 = snap.car(0).unwrap();
        let c1 = snap.car(1).unwrap();
        let c2 = snap.car(2).unwrap();
        assert_eq!(c0.gap_to_leader_m, Some(0.0));
        assert!((c1.gap_to_leader_m.unwrap() - 50.0).abs() < 1e-9);
        assert!((c2.gap_to_leader_m.unwrap() - len).abs() < 1e-9);
        // Seconds gap uses the leader's speed
        assert!((c1.gap_to_leader_s.unwrap() - 1.0).abs() < 1e-9);
        assert!((c2.gap_to_leader_s.unwrap() - len / 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_assemble_snapshot_mirrors_primary_car() {
        let mut sim = SimEngine::new();
        sim.add_car(5, 10.0, 1.0, 0);
        sim.add_car(0, 10.0, 2.0, 3);
        let telem = TelemetryTracker::new();

        let snap = assemble_snapshot(&sim, &telem, 0.0, 1);
        assert_eq!(snap.s, 2.0);
        assert_eq!(snap.lap, 3);
    }

    #[test]
    fn test_reseed_world_populates_requested_grid() {
        let mut sim = SimEngine::new();
        let mut telem = TelemetryTracker::new();
        let preset = TrackPreset::Stadium;
        let view = WorldView {
            preset,
            path: Arc::new(preset.build()),
            car_count: 5,
        };
        reseed_world(&mut sim, &mut telem, &view);
        assert_eq!(sim.car_count(), 5);
        assert!(sim.track_path().is_some());
        assert!(telem.times(0).is_none());
    }
}
