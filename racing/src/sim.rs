use bevy_math::Vec2;
use bot::config::G;
use bot::geometry::{heading_vector, normalize_angle};
use bot::{CarControl, CarSpec, CarState, Track};

/// Longitudinal and chassis parameters for the host's simple car model.
#[derive(Clone, Copy, Debug)]
pub struct VehicleParams {
    pub wheel_base: f32,
    /// Acceleration at full throttle in a forward gear, m/s².
    pub max_accel: f32,
    /// Share of `max_accel` available in reverse.
    pub reverse_fraction: f32,
    /// Deceleration at full brake on a friction-1.0 surface, m/s².
    pub brake_decel: f32,
    /// Quadratic drag coefficient, 1/m.
    pub drag: f32,
}

impl Default for VehicleParams {
    fn default() -> Self {
        Self {
            wheel_base: 2.6,
            max_accel: 7.0,
            reverse_fraction: 0.5,
            brake_decel: 9.0,
            drag: 0.0004,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineCrossing {
    None,
    Forward,
    Backward,
}

/// Kinematic car integrated by the host.
#[derive(Clone, Debug, Default)]
pub struct SimCar {
    pub state: CarState,
    /// Total distance driven in either direction.
    pub odometer: f32,
}

impl SimCar {
    pub fn new(track: &Track, position: Vec2, yaw: f32) -> Self {
        Self {
            state: CarState {
                position,
                yaw,
                speed: 0.0,
                gear: 0,
                track_pos: track.locate(position, 0),
            },
            odometer: 0.0,
        }
    }

    /// Apply `control` for one tick and re-locate the car on the track.
    pub fn step(
        &mut self,
        control: &CarControl,
        spec: &CarSpec,
        params: &VehicleParams,
        track: &Track,
        dt: f32,
    ) -> LineCrossing {
        let friction = track.segment(self.state.track_pos.segment).friction;
        let throttle = control.accelerator.clamp(0.0, 1.0);
        let brake = control.brake.clamp(0.0, 1.0);

        let drive = if control.gear > 0 {
            throttle * params.max_accel
        } else if control.gear < 0 {
            -throttle * params.max_accel * params.reverse_fraction
        } else {
            0.0
        };
        let speed = self.state.speed;
        let drag = -params.drag * speed * speed.abs();
        let mut speed = speed + (drive + drag) * dt;
        let brake_dv = brake * params.brake_decel * friction * dt;
        speed = if speed > 0.0 {
            (speed - brake_dv).max(0.0)
        } else {
            (speed + brake_dv).min(0.0)
        };

        let wheel_angle = control.steer.clamp(-1.0, 1.0) * spec.steer_lock;
        let mut yaw_rate = speed * wheel_angle.tan() / params.wheel_base;
        let grip = if spec.mass > 0.0 {
            friction * (G + spec.downforce_coefficient * speed * speed / spec.mass)
        } else {
            friction * G
        };
        if speed.abs() > f32::EPSILON && (speed * yaw_rate).abs() > grip {
            yaw_rate = yaw_rate.signum() * grip / speed.abs();
        }

        self.state.yaw = normalize_angle(self.state.yaw + yaw_rate * dt);
        self.state.position += heading_vector(self.state.yaw) * speed * dt;
        self.state.speed = speed;
        self.state.gear = control.gear;
        self.odometer += speed.abs() * dt;

        let previous = self.state.track_pos.segment;
        self.state.track_pos = track.locate(self.state.position, previous);
        let current = self.state.track_pos.segment;
        let last = track.len() - 1;
        if previous == last && current == 0 && last > 0 {
            LineCrossing::Forward
        } else if previous == 0 && current == last && last > 0 {
            LineCrossing::Backward
        } else {
            LineCrossing::None
        }
    }
}
