//! OpenLap Runtime
//!
//! Everything that moves snapshots between the simulation thread and a
//! consumer: the latest-value `SnapshotChannel`, the time-indexed
//! `InterpBuffer`, the `SimDriver` that owns the fixed-cadence simulation
//! thread, and the consumer-side `RaceController` session state.

pub mod channel;
pub mod driver;
pub mod interp;
pub mod race;

pub use channel::SnapshotChannel;
pub use driver::{ControlCommand, DriverConfig, DriverError, SimDriver};
pub use interp::InterpBuffer;
pub use race::{standings, RaceController, RaceResult};
