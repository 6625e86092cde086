//! OpenLap Simulation Library
//!
//! The authoritative side of the pipeline: a fixed-step engine advancing
//! cars along a closed track, lap/sector timing derived from the position
//! stream, and the built-in track presets and grid seeding used to populate
//! a world.

pub mod engine;
pub mod grid;
pub mod presets;
pub mod telemetry;

pub use engine::{CarState, CircleTrack, SimEngine};
pub use grid::{default_grid, CarSeed};
pub use presets::TrackPreset;
pub use telemetry::{LapTimes, TelemetryTracker};
