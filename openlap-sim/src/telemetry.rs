//! Lap and sector timing
//!
//! `TelemetryTracker` turns each car's monotonic progress signal
//! (`laps * track_length + s`) into discrete lap and three-sector times.
//! Sector boundaries sit at fixed thirds of the track. A car's clock only
//! starts at its first crossing of the start/finish line, so the partial
//! run from the seeding position is never reported as a lap.
//!
//! Times that have not been measured yet are `None`; they must not be
//! folded into minimums as if they were zero.

use crate::engine::SimEngine;
use openlap_core::CarId;
use std::collections::HashMap;

/// Query result: one car's timing record.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LapTimes {
    pub last_lap: Option<f64>,
    pub best_lap: Option<f64>,
    pub laps: u64,
    pub sector_last: [Option<f64>; 3],
    pub sector_best: [Option<f64>; 3],
}

/// Internal per-car clock state.
#[derive(Debug, Clone, Default)]
struct CarClock {
    lap_start_time: f64,
    sector_start_time: f64,
    last_lap_time: Option<f64>,
    best_lap_time: Option<f64>,
    /// Lap count at the last processed lap-line crossing.
    laps: u64,
    /// False until the first start/finish crossing synchronizes the clock.
    started: bool,
    /// 0 -> sector 1 boundary, 1 -> sector 2 boundary; sector 3 closes with
    /// the lap itself.
    next_sector: usize,
    sector_last: [Option<f64>; 3],
    sector_best: [Option<f64>; 3],
}

/// Derives lap/sector timing from engine state; owned by the producer side.
#[derive(Debug, Default)]
pub struct TelemetryTracker {
    cars: HashMap<CarId, CarClock>,
}

impl TelemetryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe all cars at simulation time `now`.
    ///
    /// A car id seen for the first time is adopted lazily with its clock
    /// origin at `now`. A single update may close several sector boundaries
    /// when the elapsed step was large.
    pub fn update(&mut self, sim: &SimEngine, now: f64) {
        let len = sim.track_length();
        let s1 = len / 3.0;
        let s2 = 2.0 * len / 3.0;

        for car in sim.cars() {
            let clock = self.cars.entry(car.id).or_insert_with(|| CarClock {
                lap_start_time: now,
                sector_start_time: now,
                laps: car.laps,
                ..Default::default()
            });

            let progress = car.laps as f64 * len + car.s;

            if clock.started {
                while clock.next_sector < 2 {
                    let boundary = clock.laps as f64 * len
                        + if clock.next_sector == 0 { s1 } else { s2 };
                    if progress < boundary - 1e-9 {
                        break;
                    }
                    let split = now - clock.sector_start_time;
                    clock.sector_last[clock.next_sector] = Some(split);
                    clock.sector_best[clock.next_sector] =
                        min_known(clock.sector_best[clock.next_sector], split);
                    clock.sector_start_time = now;
                    clock.next_sector += 1;
                }
            }

            if car.laps > clock.laps {
                if !clock.started {
                    // First crossing of the line: synchronize, emit nothing.
                    clock.started = true;
                    clock.lap_start_time = now;
                    clock.sector_start_time = now;
                    clock.next_sector = 0;
                } else {
                    let s3 = now - clock.sector_start_time;
                    clock.sector_last[2] = Some(s3);
                    clock.sector_best[2] = min_known(clock.sector_best[2], s3);

                    let lap_time = now - clock.lap_start_time;
                    clock.last_lap_time = Some(lap_time);
                    clock.best_lap_time = min_known(clock.best_lap_time, lap_time);

                    clock.lap_start_time = now;
                    clock.sector_start_time = now;
                    clock.next_sector = 0;
                }
                clock.laps = car.laps;
            }
        }
    }

    /// Timing record for one car, or `None` if the car was never observed.
    pub fn times(&self, id: CarId) -> Option<LapTimes> {
        self.cars.get(&id).map(|c| LapTimes {
            last_lap: c.last_lap_time,
            best_lap: c.best_lap_time,
            laps: c.laps,
            sector_last: c.sector_last,
            sector_best: c.sector_best,
        })
    }

    /// Forget every car. Called when the engine's population changes
    /// (reseed or track change), which invalidates all clocks.
    pub fn reset(&mut self) {
        self.cars.clear();
    }
}

fn min_known(best: Option<f64>, candidate: f64) -> Option<f64> {
    match best {
        Some(b) if b <= candidate => Some(b),
        _ => Some(candidate),
    }
}
