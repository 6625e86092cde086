//! Starting-grid seeding
//!
//! Cars line up two abreast behind the start/finish line: 9 m between rows,
//! with the off-side car of each row a further 3 m back. Positions are
//! expressed as arc positions just before the line, wrapped into [0, C).

use openlap_core::CarId;

pub const DEFAULT_ROW_GAP_M: f64 = 9.0;
pub const DEFAULT_LANE_GAP_M: f64 = 3.0;

/// Base speed of the default grid; every fourth car adds 3 m/s.
pub const BASE_SPEED_MPS: f64 = 62.0;

/// Initial placement of one car.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarSeed {
    pub id: CarId,
    pub speed_mps: f64,
    pub s0: f64,
    pub laps0: u64,
}

/// Arc positions for an `n`-car two-abreast grid on a loop of length
/// `circumference`. Degenerate inputs yield all-zero positions.
pub fn grid_positions(n: usize, circumference: f64, row_gap_m: f64, lane_gap_m: f64) -> Vec<f64> {
    if n == 0 || circumference <= 0.0 {
        return vec![0.0; n];
    }
    (0..n)
        .map(|i| {
            let row = (i / 2) as f64;
            let lane = i % 2; // 0 = pole side, 1 = off side
            let back = row * row_gap_m + if lane == 1 { lane_gap_m } else { 0.0 };
            (circumference - back).rem_euclid(circumference)
        })
        .collect()
}

/// The default race grid: ids 0..n, two-abreast spacing, and a repeating
/// 0/3/6/9 m/s speed spread so the field strings out over a few laps.
pub fn default_grid(n: usize, circumference: f64) -> Vec<CarSeed> {
    let n = n.max(1);
    let positions = grid_positions(n, circumference, DEFAULT_ROW_GAP_M, DEFAULT_LANE_GAP_M);
    (0..n)
        .map(|i| CarSeed {
            id: i as CarId,
            speed_mps: BASE_SPEED_MPS + 3.0 * (i % 4) as f64,
            s0: positions[i],
            laps0: 0,
        })
        .collect()
}
