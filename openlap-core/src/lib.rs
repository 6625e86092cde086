//! OpenLap Core Library
//!
//! This crate provides the shared world-state model (car poses and full-field
//! snapshots) and the arc-length-parameterized track geometry used by both
//! the simulation producer and any consumer of published snapshots.

pub mod model;
pub mod track;

pub use model::{CarId, CarPose, Pose, Snapshot, Vec2};
pub use track::TrackPath;
