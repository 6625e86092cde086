//! Fixed-step simulation engine
//!
//! `SimEngine` owns the car list and the active track representation and
//! advances every car by its own constant speed each step. Cars do not
//! interact: the update is exact and order-independent. All lookup misses
//! are reported as `None`, never as a fault.

use openlap_core::{CarId, Pose, TrackPath, Vec2};
use std::f64::consts::{PI, TAU};

/// Parametric circular track (meters).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleTrack {
    pub center: Vec2,
    pub radius_m: f64,
}

impl CircleTrack {
    pub fn circumference(&self) -> f64 {
        TAU * self.radius_m
    }

    fn sample_pose(&self, s: f64) -> Pose {
        let c = self.circumference();
        if c <= 0.0 {
            return Pose::default();
        }
        let t = (s / c) * TAU;
        Pose {
            x: self.center.x + self.radius_m * t.cos(),
            y: self.center.y + self.radius_m * t.sin(),
            heading_rad: t + PI / 2.0,
        }
    }
}

impl Default for CircleTrack {
    fn default() -> Self {
        Self {
            center: Vec2::default(),
            radius_m: 50.0,
        }
    }
}

/// Authoritative per-car state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarState {
    pub id: CarId,
    /// Arc position along the track, meters in [0, track length).
    pub s: f64,
    pub speed_mps: f64,
    /// Completed lap counter, monotonically non-decreasing.
    pub laps: u64,
}

/// Authoritative simulation world: one track, N cars.
///
/// The track is either an explicit closed `TrackPath` or the fallback
/// circle; a set but empty path also falls back to the circle, so
/// `track_length()` only reports zero for a degenerate circle.
#[derive(Debug, Clone, Default)]
pub struct SimEngine {
    circle: CircleTrack,
    path: Option<TrackPath>,
    cars: Vec<CarState>,
}

impl SimEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_circle(circle: CircleTrack) -> Self {
        Self {
            circle,
            ..Self::default()
        }
    }

    pub fn with_path(path: TrackPath) -> Self {
        Self {
            path: Some(path),
            ..Self::default()
        }
    }

    pub fn set_track_path(&mut self, path: TrackPath) {
        self.path = Some(path);
    }

    pub fn clear_track_path(&mut self) {
        self.path = None;
    }

    pub fn track_path(&self) -> Option<&TrackPath> {
        self.path.as_ref()
    }

    pub fn circle(&self) -> &CircleTrack {
        &self.circle
    }

    /// Length of the active track: the path if set and non-empty, otherwise
    /// the circle's circumference.
    pub fn track_length(&self) -> f64 {
        match &self.path {
            Some(p) if !p.is_empty() => p.length(),
            _ => self.circle.circumference(),
        }
    }

    /// Append a car. Id uniqueness is the caller's responsibility.
    pub fn add_car(&mut self, id: CarId, speed_mps: f64, s0: f64, laps0: u64) {
        self.cars.push(CarState {
            id,
            s: s0,
            speed_mps,
            laps: laps0,
        });
    }

    pub fn clear_cars(&mut self) {
        self.cars.clear();
    }

    pub fn car_count(&self) -> usize {
        self.cars.len()
    }

    pub fn cars(&self) -> &[CarState] {
        &self.cars
    }

    pub fn car_by_index(&self, idx: usize) -> Option<&CarState> {
        self.cars.get(idx)
    }

    pub fn car_by_index_mut(&mut self, idx: usize) -> Option<&mut CarState> {
        self.cars.get_mut(idx)
    }

    /// Linear search by id; fine for grid-sized fields.
    pub fn car_by_id(&self, id: CarId) -> Option<&CarState> {
        self.cars.iter().find(|c| c.id == id)
    }

    pub fn car_by_id_mut(&mut self, id: CarId) -> Option<&mut CarState> {
        self.cars.iter_mut().find(|c| c.id == id)
    }

    /// Advance every car by `dt_sec` of simulated time.
    ///
    /// A non-positive `dt_sec` or a zero-length track is a no-op, as is a
    /// car with non-positive speed. Lap wrap keeps `s` in [0, length).
    pub fn step(&mut self, dt_sec: f64) {
        let len = self.track_length();
        if len <= 0.0 || dt_sec <= 0.0 {
            return;
        }
        for car in &mut self.cars {
            if car.speed_mps <= 0.0 {
                continue;
            }
            car.s += car.speed_mps * dt_sec;
            while car.s >= len {
                car.s -= len;
                car.laps += 1;
            }
        }
    }

    /// Sample the active track at arc position `s`.
    pub fn sample_pose(&self, s: f64) -> Pose {
        match &self.path {
            Some(p) if !p.is_empty() => p.sample_pose(s),
            _ => self.circle.sample_pose(s),
        }
    }

    /// World pose of the car at list index `idx`, or `None` if out of range.
    pub fn pose_by_index(&self, idx: usize) -> Option<Pose> {
        self.cars.get(idx).map(|c| self.sample_pose(c.s))
    }

    /// World pose of the car with `id`, or `None` if unknown.
    pub fn pose_by_id(&self, id: CarId) -> Option<Pose> {
        self.car_by_id(id).map(|c| self.sample_pose(c.s))
    }
}
