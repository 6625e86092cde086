//! Consumer-side race session control
//!
//! `RaceController` is owned by the consumer loop and fed every consumed
//! snapshot. It tracks one race to a target lap count and records the
//! finishing order; a fresh controller (or an explicit `reset`) starts a
//! new session. It holds no reference to the driver: the producer side
//! neither knows nor cares that a race is being scored.

use chrono::{DateTime, Utc};
use openlap_core::{CarId, CarPose, Snapshot};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::info;

/// Final classification entry for one car.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaceResult {
    pub position: u32,
    pub car_id: CarId,
    pub laps: u64,
    pub best_lap: Option<f64>,
    /// Simulation time of the snapshot in which the car was first seen past
    /// the target lap count.
    pub finish_sim_time: f64,
}

/// Scores one race session from the consumed snapshot stream.
#[derive(Debug)]
pub struct RaceController {
    target_laps: u64,
    started_at: Option<DateTime<Utc>>,
    last_sim_time: f64,
    finishers: Vec<RaceResult>,
    finished_ids: HashSet<CarId>,
    complete: bool,
}

impl RaceController {
    /// A session racing to `target_laps` (at least 1).
    pub fn new(target_laps: u64) -> Self {
        Self {
            target_laps: target_laps.max(1),
            started_at: None,
            last_sim_time: 0.0,
            finishers: Vec::new(),
            finished_ids: HashSet::new(),
            complete: false,
        }
    }

    pub fn target_laps(&self) -> u64 {
        self.target_laps
    }

    /// Wall-clock time of the first observed snapshot of this session.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// True once every car in the latest observed snapshot has finished.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Finishing order so far, best position first.
    pub fn results(&self) -> &[RaceResult] {
        &self.finishers
    }

    /// Start a fresh session with a new target.
    pub fn reset(&mut self, target_laps: u64) {
        *self = RaceController::new(target_laps);
        info!(target_laps = self.target_laps, "race session reset");
    }

    /// Feed one consumed snapshot.
    ///
    /// A backwards jump in `sim_time` means the producer was reseeded; the
    /// session restarts automatically with the same target.
    pub fn observe(&mut self, snap: &Snapshot) {
        if snap.sim_time < self.last_sim_time {
            info!("simulation time went backwards; starting a fresh race session");
            let target = self.target_laps;
            *self = RaceController::new(target);
        }
        self.last_sim_time = snap.sim_time;
        if self.started_at.is_none() {
            self.started_at = Some(Utc::now());
        }

        // New finishers this snapshot, ordered by current progress so that
        // two cars crossing within one snapshot classify correctly
        let mut crossed: Vec<&CarPose> = snap
            .cars
            .iter()
            .filter(|c| c.lap >= self.target_laps && !self.finished_ids.contains(&c.id))
            .collect();
        crossed.sort_by(|a, b| compare_progress(b, a));

        for car in crossed {
            let position = (self.finishers.len() + 1) as u32;
            self.finished_ids.insert(car.id);
            self.finishers.push(RaceResult {
                position,
                car_id: car.id,
                laps: car.lap,
                best_lap: car.best_lap_time,
                finish_sim_time: snap.sim_time,
            });
            info!(car = car.id, position, "car finished");
        }

        self.complete = !snap.cars.is_empty()
            && snap.cars.iter().all(|c| self.finished_ids.contains(&c.id));
    }
}

/// Current running order of a snapshot: leader first, by total progress
/// (lap count, then arc position; all cars share one track).
pub fn standings(snap: &Snapshot) -> Vec<&CarPose> {
    let mut order: Vec<&CarPose> = snap.cars.iter().collect();
    order.sort_by(|a, b| compare_progress(b, a));
    order
}

fn compare_progress(a: &CarPose, b: &CarPose) -> Ordering {
    a.lap
        .cmp(&b.lap)
        .then(a.s.partial_cmp(&b.s).unwrap_or(Ordering::Equal))
}
