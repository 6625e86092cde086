//! World-state data model
//!
//! Defines the immutable value types that cross the producer/consumer
//! boundary. Uses Option<f64> for telemetry values that have not been
//! measured yet (a car that has not completed a lap has no lap time);
//! consumers must never treat an absent value as zero.
//!
//! Coordinate system: world-space meters, X right, Y up, headings in
//! radians counter-clockwise from +X.

use serde::{Deserialize, Serialize};

/// Identifier of a car within one running simulation.
///
/// Uniqueness is the responsibility of whoever seeds the world: two cars
/// with the same id advance independently, but id-keyed telemetry and gap
/// output for them is ambiguous.
pub type CarId = u32;

/// A 2D point or vector in world meters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Vec2) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// A sampled world pose: position plus tangent heading.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub heading_rad: f64,
}

/// Per-car entry of a snapshot: pose plus derived timing/gap telemetry.
///
/// Produced fresh every simulation tick and never mutated after publication.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CarPose {
    pub id: CarId,
    pub x: f64,
    pub y: f64,
    pub heading_rad: f64,
    /// Arc position along the track, meters in [0, track length).
    pub s: f64,
    /// Completed lap count.
    pub lap: u64,

    /// Most recently completed lap time, seconds.
    pub last_lap_time: Option<f64>,
    /// Fastest completed lap time, seconds.
    pub best_lap_time: Option<f64>,

    /// Distance behind the race leader, meters. The leader carries 0.0.
    pub gap_to_leader_m: Option<f64>,
    /// Time equivalent of the distance gap, seconds (at the leader's pace).
    pub gap_to_leader_s: Option<f64>,

    /// Last completed time for sectors 1..3, seconds.
    pub sector_last: [Option<f64>; 3],
    /// Best completed time for sectors 1..3, seconds.
    pub sector_best: [Option<f64>; 3],
}

/// One immutable sample of world state, keyed by simulation time.
///
/// The top-level pose fields mirror the primary car (id 0 if present, else
/// the first car) for single-car consumers; `project_primary` keeps them in
/// sync with the `cars` list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Accumulated simulated seconds. Non-decreasing between world resets.
    pub sim_time: f64,
    /// Simulation tick index; increases every cycle, even when paused.
    pub tick: u64,

    /// All cars in the world, in seeding order.
    pub cars: Vec<CarPose>,

    // Primary-car projection
    pub x: f64,
    pub y: f64,
    pub heading_rad: f64,
    pub s: f64,
    pub lap: u64,
}

impl Snapshot {
    /// Find a car's pose by id.
    pub fn car(&self, id: CarId) -> Option<&CarPose> {
        self.cars.iter().find(|c| c.id == id)
    }

    /// The primary car: id 0 if present, otherwise the first car.
    pub fn primary(&self) -> Option<&CarPose> {
        self.car(0).or_else(|| self.cars.first())
    }

    /// Mirror the primary car's pose onto the top-level fields.
    ///
    /// No-op when the snapshot holds no cars.
    pub fn project_primary(&mut self) {
        if let Some(p) = self.primary() {
            let (x, y, heading_rad, s, lap) = (p.x, p.y, p.heading_rad, p.s, p.lap);
            self.x = x;
            self.y = y;
            self.heading_rad = heading_rad;
            self.s = s;
            self.lap = lap;
        }
    }
}
