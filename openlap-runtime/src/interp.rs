//! Time-indexed snapshot interpolation
//!
//! `InterpBuffer` keeps a bounded ring of the most recent snapshots, in
//! push (and therefore time) order, and reconstructs a full snapshot at any
//! simulation time by interpolating between the bracketing pair. Sampling
//! never extrapolates: targets outside the retained window clamp to the
//! oldest or newest entry.
//!
//! Interpolation policy per field kind:
//! - continuous scalars (positions, arc position): linear
//! - headings: shortest arc around the circle
//! - discrete counters (lap, tick): floor to the earlier side until t = 1
//! - per-car telemetry: "last"/gap values from the nearer-in-time side,
//!   "best" values as the minimum of the known sides
//! - cars present on only one side are passed through unchanged

use openlap_core::{CarId, CarPose, Snapshot};
use std::collections::HashMap;
use std::f64::consts::{PI, TAU};

/// Default number of retained snapshots (~a quarter second at 240 Hz).
pub const DEFAULT_CAPACITY: usize = 64;

/// Bounded ring of recent snapshots with time-based sampling.
#[derive(Debug)]
pub struct InterpBuffer {
    cap: usize,
    slots: Vec<Snapshot>,
    /// Total snapshots ever pushed; never wraps in practice.
    pushed: u64,
}

impl InterpBuffer {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            cap,
            slots: Vec::with_capacity(cap),
            pushed: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// Number of snapshots currently retained.
    pub fn len(&self) -> usize {
        retained(self.pushed, self.cap)
    }

    pub fn is_empty(&self) -> bool {
        self.pushed == 0
    }

    /// Drop all retained snapshots. Used by consumers when the producer's
    /// sim time jumps backwards (world reset), which would otherwise break
    /// the buffer's time ordering.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.pushed = 0;
    }

    /// Append a snapshot, overwriting the oldest once at capacity.
    pub fn push(&mut self, snapshot: Snapshot) {
        let w = write_index(self.pushed, self.cap);
        if w == self.slots.len() {
            self.slots.push(snapshot);
        } else {
            self.slots[w] = snapshot;
        }
        self.pushed += 1;
    }

    /// `sim_time` of the newest retained snapshot, or 0 when empty.
    pub fn latest_time(&self) -> f64 {
        let n = self.len();
        if n == 0 {
            0.0
        } else {
            self.at(n - 1).sim_time
        }
    }

    /// Reconstruct the world at `target_time`.
    ///
    /// `None` only when the buffer is empty. A single retained snapshot is
    /// returned as-is regardless of the target; otherwise the target clamps
    /// to the retained window and interpolates inside it.
    pub fn sample(&self, target_time: f64) -> Option<Snapshot> {
        let n = self.len();
        if n == 0 {
            return None;
        }
        if n == 1 {
            return Some(self.at(0).clone());
        }

        let first = self.at(0);
        let last = self.at(n - 1);
        if target_time <= first.sim_time {
            return Some(first.clone());
        }
        if target_time >= last.sim_time {
            return Some(last.clone());
        }

        let mut hi = 1;
        while hi < n - 1 {
            if target_time <= self.at(hi).sim_time {
                break;
            }
            hi += 1;
        }
        let a = self.at(hi - 1);
        let b = self.at(hi);

        let span = b.sim_time - a.sim_time;
        let t = if span > 0.0 {
            (target_time - a.sim_time) / span
        } else {
            0.0
        };
        Some(blend_snapshots(a, b, t))
    }

    fn at(&self, logical: usize) -> &Snapshot {
        &self.slots[physical_index(self.pushed, self.cap, logical)]
    }
}

impl Default for InterpBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// --- Ring index math -------------------------------------------------------
//
// Kept as standalone pure functions: the oldest-element derivation is the
// classic off-by-one trap, and this keeps it testable in isolation.

/// How many of `pushed` snapshots are still retained.
fn retained(pushed: u64, cap: usize) -> usize {
    pushed.min(cap as u64) as usize
}

/// Physical slot the next push lands in.
fn write_index(pushed: u64, cap: usize) -> usize {
    (pushed % cap as u64) as usize
}

/// Physical slot of the oldest retained snapshot.
fn oldest_index(pushed: u64, cap: usize) -> usize {
    if pushed <= cap as u64 {
        0
    } else {
        write_index(pushed, cap)
    }
}

/// Map a logical offset (0 = oldest) to a physical slot.
fn physical_index(pushed: u64, cap: usize, logical: usize) -> usize {
    (oldest_index(pushed, cap) + logical) % cap
}

// --- Field blending --------------------------------------------------------

fn blend_snapshots(a: &Snapshot, b: &Snapshot, t: f64) -> Snapshot {
    let mut out = Snapshot {
        sim_time: lerp(a.sim_time, b.sim_time, t),
        tick: if t < 1.0 { a.tick } else { b.tick },
        cars: blend_cars(&a.cars, &b.cars, t),
        // Primary fields interpolate even when no car poses are present
        x: lerp(a.x, b.x, t),
        y: lerp(a.y, b.y, t),
        heading_rad: lerp_angle_shortest(a.heading_rad, b.heading_rad, t),
        s: lerp(a.s, b.s, t),
        lap: if t < 1.0 { a.lap } else { b.lap },
    };
    out.project_primary();
    out
}

/// Reconcile the car sets of both sides: the union of ids, interpolated
/// where a car exists on both sides, passed through otherwise.
fn blend_cars(a: &[CarPose], b: &[CarPose], t: f64) -> Vec<CarPose> {
    let a_by_id: HashMap<CarId, &CarPose> = a.iter().map(|c| (c.id, c)).collect();
    let b_by_id: HashMap<CarId, &CarPose> = b.iter().map(|c| (c.id, c)).collect();

    let mut ids: Vec<CarId> = a_by_id.keys().copied().collect();
    ids.extend(b_by_id.keys().copied().filter(|id| !a_by_id.contains_key(id)));
    ids.sort_unstable();

    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        match (a_by_id.get(&id).copied(), b_by_id.get(&id).copied()) {
            (Some(ca), Some(cb)) => out.push(blend_car(ca, cb, t)),
            (Some(ca), None) => out.push(ca.clone()),
            (None, Some(cb)) => out.push(cb.clone()),
            (None, None) => {}
        }
    }
    out
}

fn blend_car(ca: &CarPose, cb: &CarPose, t: f64) -> CarPose {
    // "Last" and gap telemetry snap to the side nearer in time; "best"
    // telemetry takes the minimum of whatever both sides know.
    let newer = if t >= 0.5 { cb } else { ca };

    CarPose {
        id: ca.id,
        x: lerp(ca.x, cb.x, t),
        y: lerp(ca.y, cb.y, t),
        heading_rad: lerp_angle_shortest(ca.heading_rad, cb.heading_rad, t),
        s: lerp(ca.s, cb.s, t),
        lap: if t < 1.0 { ca.lap } else { cb.lap },

        last_lap_time: newer.last_lap_time,
        best_lap_time: min_known(ca.best_lap_time, cb.best_lap_time),

        gap_to_leader_m: newer.gap_to_leader_m,
        gap_to_leader_s: newer.gap_to_leader_s,

        sector_last: newer.sector_last,
        sector_best: [
            min_known(ca.sector_best[0], cb.sector_best[0]),
            min_known(ca.sector_best[1], cb.sector_best[1]),
            min_known(ca.sector_best[2], cb.sector_best[2]),
        ],
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Minimum over the sides that actually have a value; an unknown side never
/// masquerades as zero.
fn min_known(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (Some(x), None) => Some(x),
        (None, y) => y,
    }
}

fn norm_angle(a: f64) -> f64 {
    let a = a % TAU;
    if a < 0.0 {
        a + TAU
    } else {
        a
    }
}

/// Interpolate two angles along the shorter arc, so crossing the 0/2pi
/// boundary never swings the long way around.
fn lerp_angle_shortest(a: f64, b: f64, t: f64) -> f64 {
    let a = norm_angle(a);
    let b = norm_angle(b);
    let mut d = b - a;
    if d > PI {
        d -= TAU;
    }
    if d < -PI {
        d += TAU;
    }
    norm_angle(a + d * t)
}
