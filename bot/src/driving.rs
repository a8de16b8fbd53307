use bevy_math::Vec2;
use serde::{Deserialize, Serialize};

use crate::track::TrackPosition;

pub const GEAR_REVERSE: i32 = -1;
pub const GEAR_NEUTRAL: i32 = 0;

/// Static description of a car, fixed for the duration of a race.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CarSpec {
    /// Maximum steering angle in radians; a steer command of 1.0 maps to this.
    pub steer_lock: f32,
    /// Gear ratios indexed by `gear + gear_offset`.
    pub gear_ratios: Vec<f32>,
    pub gear_offset: i32,
    pub redline_rpm: f32,
    pub wheel_radius: f32,
    pub mass: f32,
    /// Aerodynamic downforce coefficient.
    pub downforce_coefficient: f32,
}

impl CarSpec {
    pub fn gear_ratio(&self, gear: i32) -> Option<f32> {
        let index = usize::try_from(gear + self.gear_offset).ok()?;
        self.gear_ratios.get(index).copied()
    }
}

impl Default for CarSpec {
    fn default() -> Self {
        Self {
            steer_lock: 0.366,
            gear_ratios: vec![-2.0, 0.0, 3.3, 2.4, 1.8, 1.4, 1.1, 0.9],
            gear_offset: 1,
            redline_rpm: 6200.0,
            wheel_radius: 0.3,
            mass: 1150.0,
            downforce_coefficient: 0.8,
        }
    }
}

/// Kinematic state sampled by the host every tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct CarState {
    pub position: Vec2,
    /// Heading in radians, counter-clockwise from +x.
    pub yaw: f32,
    /// Speed along the car's forward axis in m/s; negative when reversing.
    pub speed: f32,
    pub gear: i32,
    pub track_pos: TrackPosition,
}

/// The telemetry snapshot handed to a driver. Owned by the host.
#[derive(Clone, Debug, Default)]
pub struct Car {
    pub index: usize,
    pub spec: CarSpec,
    pub state: CarState,
}

/// Control outputs for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CarControl {
    /// Fraction of the steering lock, positive turns left.
    pub steer: f32,
    pub gear: i32,
    pub accelerator: f32,
    pub brake: f32,
}

/// Session information for the current tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct Situation {
    pub tick: u64,
    pub current_time: f64,
    pub delta_time: f32,
}

/// Answer to a pit request. [`crate::Driver`] always answers `Immediate`;
/// other robots may hand control to the host instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PitResponse {
    /// Leave the pit straight away.
    Immediate,
    /// Let the host open its pit menu before the car rejoins.
    Menu,
}
