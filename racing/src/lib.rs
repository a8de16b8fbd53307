//! Headless race host for `bot` drivers: track files, a kinematic car model
//! and the race loop.

pub mod race;
pub mod sim;
pub mod track_format;

pub use race::{CarEntry, DEFAULT_TICK_HZ, RaceError, RaceLimits, RaceManager, RaceSummary};
pub use sim::{LineCrossing, SimCar, VehicleParams};
pub use track_format::{TrackFile, TrackFileError};
