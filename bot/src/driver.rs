use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use crate::config::DriverConfig;
use crate::driving::{Car, CarControl, GEAR_REVERSE, PitResponse, Situation};
use crate::error::DriverError;
use crate::geometry::normalize_angle;
use crate::lateral;
use crate::longitudinal;
use crate::robot::Robot;
use crate::stuck::StuckDetector;
use crate::track::Track;

/// Track-following driver: brakes for curves ahead, steers at a lookahead
/// point on the centre line, and backs out when stuck beside the track.
pub struct Driver {
    index: usize,
    name: String,
    config: DriverConfig,
    track: Option<Arc<Track>>,
    stuck: StuckDetector,
    /// Track tangent at the car position.
    track_angle: f32,
    /// Heading error: track tangent minus car yaw, in (-PI, PI].
    angle: f32,
    recovering: bool,
    recoveries: u32,
    warned_no_track: bool,
}

impl Driver {
    pub fn new(index: usize, name: impl Into<String>, config: DriverConfig) -> Self {
        let max_count = config.max_unstuck_count();
        Self {
            index,
            name: name.into(),
            config,
            track: None,
            stuck: StuckDetector::new(max_count),
            track_angle: 0.0,
            angle: 0.0,
            recovering: false,
            recoveries: 0,
            warned_no_track: false,
        }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn track_angle(&self) -> f32 {
        self.track_angle
    }

    pub fn stuck_count(&self) -> u32 {
        self.stuck.count()
    }

    pub fn is_recovering(&self) -> bool {
        self.recovering
    }

    /// Number of times recovery started during the current race.
    pub fn recoveries(&self) -> u32 {
        self.recoveries
    }

    /// Recompute the track tangent and heading error for this tick.
    fn update(&mut self, track: &Track, car: &Car) {
        let pos = car.state.track_pos;
        self.track_angle = track.segment(pos.segment).tangent_angle(pos.to_start);
        self.angle = normalize_angle(self.track_angle - car.state.yaw);
    }

    fn is_stuck(&mut self, car: &Car) -> bool {
        let stuck = self.stuck.update(
            self.angle,
            car.state.speed,
            car.state.track_pos.to_middle,
            &self.config,
        );
        if stuck != self.recovering {
            if stuck {
                self.recoveries += 1;
                debug!(
                    driver = %self.name,
                    angle = self.angle,
                    to_middle = car.state.track_pos.to_middle,
                    "stuck, backing out"
                );
            } else {
                debug!(driver = %self.name, "recovered");
            }
            self.recovering = stuck;
        }
        stuck
    }

    fn recovery_control(&self, car: &Car) -> CarControl {
        let steer_lock = car.spec.steer_lock;
        let steer = if steer_lock > 0.0 {
            -self.angle / steer_lock
        } else {
            0.0
        };
        CarControl {
            steer,
            gear: GEAR_REVERSE,
            accelerator: self.config.recovery_throttle,
            brake: 0.0,
        }
    }

    fn race_control(&self, track: &Track, car: &Car) -> CarControl {
        let steer = lateral::steer(track, car, &self.config);
        let brake = longitudinal::brake(track, car);
        let accelerator = if brake == 0.0 {
            let accel = longitudinal::accel(track, car, &self.config);
            longitudinal::filter_track(accel, track, car, &self.config)
        } else {
            0.0
        };
        CarControl {
            steer,
            gear: self.config.drive_gear,
            accelerator,
            brake,
        }
    }
}

impl Robot for Driver {
    fn index(&self) -> usize {
        self.index
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn on_track_changed(&mut self, track: Arc<Track>) {
        info!(driver = %self.name, track = track.name(), segments = track.len(), "track changed");
        self.track = Some(track);
        self.warned_no_track = false;
    }

    fn on_race_start(&mut self, car: &Car) -> Result<(), DriverError> {
        self.config.validate()?;
        let spec = &car.spec;
        if !(spec.steer_lock > 0.0 && spec.steer_lock.is_finite()) {
            return Err(DriverError::InvalidSteerLock(spec.steer_lock));
        }
        if !(spec.wheel_radius > 0.0) {
            return Err(DriverError::InvalidCar(format!(
                "wheel radius must be positive, got {}",
                spec.wheel_radius
            )));
        }
        if !(spec.redline_rpm > 0.0) {
            return Err(DriverError::InvalidCar(format!(
                "redline must be positive, got {}",
                spec.redline_rpm
            )));
        }
        if !(spec.mass > 0.0) {
            return Err(DriverError::InvalidCar(format!(
                "mass must be positive, got {}",
                spec.mass
            )));
        }
        if spec.gear_ratio(self.config.drive_gear).is_none() {
            return Err(DriverError::InvalidCar(format!(
                "no gear ratio for drive gear {}",
                self.config.drive_gear
            )));
        }
        if self.track.is_none() {
            return Err(DriverError::MissingTrack);
        }

        self.stuck.reset(self.config.max_unstuck_count());
        self.recovering = false;
        self.recoveries = 0;
        info!(
            driver = %self.name,
            index = self.index,
            max_unstuck_count = self.stuck.max_count(),
            "race started"
        );
        Ok(())
    }

    fn drive(&mut self, car: &Car, situation: &Situation) -> CarControl {
        let Some(track) = self.track.clone() else {
            if !self.warned_no_track {
                warn!(driver = %self.name, "no track assigned, holding still");
                self.warned_no_track = true;
            }
            return CarControl::default();
        };

        self.update(&track, car);
        let control = if self.is_stuck(car) {
            self.recovery_control(car)
        } else {
            self.race_control(&track, car)
        };
        trace!(
            driver = %self.name,
            tick = situation.tick,
            steer = control.steer,
            gear = control.gear,
            accelerator = control.accelerator,
            brake = control.brake,
            "control"
        );
        control
    }

    fn on_pit_request(&mut self, _car: &Car, _situation: &Situation) -> PitResponse {
        PitResponse::Immediate
    }

    fn on_race_end(&mut self, car: &Car) {
        info!(
            driver = %self.name,
            recoveries = self.recoveries,
            speed = car.state.speed,
            "race ended"
        );
    }
}

#[cfg(test)]
mod tests {
    use bevy_math::Vec2;
    use core::f32::consts::PI;

    use super::*;
    use crate::driving::{CarSpec, CarState};
    use crate::track::TrackBuilder;
    use crate::track::tests::oval;

    fn long_track() -> Arc<Track> {
        Arc::new(
            TrackBuilder::new("long", 12.0, 1.0)
                .straight(300.0)
                .left(50.0, PI)
                .straight(300.0)
                .left(50.0, PI)
                .build()
                .unwrap(),
        )
    }

    fn started(track: Arc<Track>, car: &Car) -> Driver {
        let mut driver = Driver::new(0, "test", DriverConfig::default());
        driver.on_track_changed(track);
        driver.on_race_start(car).unwrap();
        driver
    }

    fn car(track: &Track, position: Vec2, yaw: f32, speed: f32) -> Car {
        Car {
            index: 0,
            spec: CarSpec::default(),
            state: CarState {
                position,
                yaw,
                speed,
                gear: 4,
                track_pos: track.locate(position, 0),
            },
        }
    }

    #[test]
    fn heading_error_is_track_minus_yaw() {
        let track = long_track();
        let car = car(&track, Vec2::new(10.0, 0.0), 0.25, 10.0);
        let mut driver = started(track.clone(), &car);
        driver.drive(&car, &Situation::default());
        assert!((driver.angle() + 0.25).abs() < 1e-6);
        assert_eq!(driver.track_angle(), 0.0);
    }

    #[test]
    fn centred_car_on_clear_straight_goes_flat_out() {
        let track = long_track();
        let car = car(&track, Vec2::new(10.0, 0.0), 0.0, 20.0);
        let mut driver = started(track.clone(), &car);
        let control = driver.drive(&car, &Situation::default());
        assert_eq!(control.brake, 0.0);
        assert_eq!(control.accelerator, 1.0);
        assert_eq!(control.gear, 4);
        assert!(control.steer.abs() < 1e-4);
    }

    #[test]
    fn brakes_and_drops_throttle_before_curve() {
        let track = Arc::new(oval());
        let car = car(&track, Vec2::new(95.0, 0.0), 0.0, 40.0);
        let mut driver = started(track.clone(), &car);
        let control = driver.drive(&car, &Situation::default());
        assert_eq!(control.brake, 1.0);
        assert_eq!(control.accelerator, 0.0);
    }

    #[test]
    fn backs_out_after_lingering() {
        let track = long_track();
        // Right of the centre line, nose angled further right.
        let car = car(&track, Vec2::new(50.0, -4.0), -0.4, 0.5);
        let mut driver = started(track.clone(), &car);
        let situation = Situation::default();

        for _ in 0..=driver.stuck.max_count() {
            let control = driver.drive(&car, &situation);
            assert_eq!(control.gear, 4);
        }
        let control = driver.drive(&car, &situation);
        assert_eq!(control.gear, GEAR_REVERSE);
        assert!((control.steer - (-0.4 / car.spec.steer_lock)).abs() < 1e-5);
        assert_eq!(control.accelerator, 0.5);
        assert_eq!(control.brake, 0.0);
        assert!(driver.is_recovering());
        assert_eq!(driver.recoveries(), 1);
    }

    #[test]
    fn large_heading_error_is_never_stuck() {
        let track = long_track();
        let car = car(&track, Vec2::new(50.0, 4.0), 0.6, 0.5);
        let mut driver = started(track.clone(), &car);
        for _ in 0..500 {
            let control = driver.drive(&car, &Situation::default());
            assert_ne!(control.gear, GEAR_REVERSE);
            assert_eq!(driver.stuck_count(), 0);
        }
    }

    #[test]
    fn race_start_resets_stuck_counter() {
        let track = long_track();
        let car = car(&track, Vec2::new(50.0, -4.0), -0.4, 0.5);
        let mut driver = started(track.clone(), &car);
        for _ in 0..10 {
            driver.drive(&car, &Situation::default());
        }
        assert_eq!(driver.stuck_count(), 10);
        driver.on_race_start(&car).unwrap();
        assert_eq!(driver.stuck_count(), 0);
    }

    #[test]
    fn zero_steer_lock_is_rejected_at_start() {
        let track = long_track();
        let mut car = car(&track, Vec2::new(10.0, 0.0), 0.0, 0.0);
        car.spec.steer_lock = 0.0;
        let mut driver = Driver::new(0, "test", DriverConfig::default());
        driver.on_track_changed(track);
        assert!(matches!(
            driver.on_race_start(&car),
            Err(DriverError::InvalidSteerLock(_))
        ));
    }

    #[test]
    fn race_start_without_track_fails() {
        let mut driver = Driver::new(0, "test", DriverConfig::default());
        assert!(matches!(
            driver.on_race_start(&Car::default()),
            Err(DriverError::MissingTrack)
        ));
    }

    #[test]
    fn drive_without_track_holds_still() {
        let mut driver = Driver::new(0, "test", DriverConfig::default());
        let control = driver.drive(&Car::default(), &Situation::default());
        assert_eq!(control, CarControl::default());
    }

    #[test]
    fn pit_request_returns_immediately() {
        let mut driver = Driver::new(0, "test", DriverConfig::default());
        let response = driver.on_pit_request(&Car::default(), &Situation::default());
        assert_eq!(response, PitResponse::Immediate);
    }
}
