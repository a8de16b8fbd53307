//! Track-following driver for a segment-based racing simulator.
//!
//! The host hands each [`Driver`] a [`Car`] snapshot every tick and gets a
//! [`CarControl`] back. See [`Robot`] for the lifecycle.

pub mod config;
pub mod driver;
pub mod driving;
pub mod error;
pub mod geometry;
pub mod lateral;
pub mod longitudinal;
pub mod robot;
pub mod speed;
pub mod stuck;
pub mod track;

pub use bevy_math::Vec2;

pub use config::DriverConfig;
pub use driver::Driver;
pub use driving::{Car, CarControl, CarSpec, CarState, PitResponse, Situation};
pub use error::{DriverError, TrackError};
pub use robot::Robot;
pub use track::{Segment, SegmentKind, Track, TrackBuilder, TrackPosition};
