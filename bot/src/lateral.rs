use bevy_math::Vec2;

use crate::config::DriverConfig;
use crate::driving::Car;
use crate::geometry::{bearing, normalize_angle, rotate_about};
use crate::speed::dist_to_segment_end;
use crate::track::Track;

/// Point on the centre line the car steers towards.
///
/// Walks forward until the accumulated distance covers the speed-dependent
/// lookahead, then places the target on the terminal segment, measured from its
/// start edge. The offset used is the accumulated distance plus one more length
/// of the terminal segment.
pub fn target_point(track: &Track, car: &Car, config: &DriverConfig) -> Vec2 {
    let pos = car.state.track_pos;
    let lookahead = config.lookahead_const + car.state.speed * config.lookahead_factor;

    let mut index = pos.segment;
    let mut length = dist_to_segment_end(track.segment(index), pos.to_start);
    for _ in 0..track.len() {
        if length >= lookahead {
            break;
        }
        index = track.next(index);
        length += track.segment(index).length;
    }

    let segment = track.segment(index);
    let length = length + segment.length;
    let base = segment.start_mid();
    if segment.kind.is_curve() {
        let arc = length / segment.radius * segment.kind.turn_sign();
        rotate_about(base, segment.center, arc)
    } else {
        let direction = (segment.end_left - segment.start_left) / segment.length;
        base + direction * length
    }
}

/// Steering command towards `target`, as a fraction of the steering lock.
/// Not clamped; the actuator saturates.
pub fn steer_towards(target: Vec2, car: &Car) -> f32 {
    let steer_lock = car.spec.steer_lock;
    if !(steer_lock > 0.0) {
        return 0.0;
    }
    let angle = normalize_angle(bearing(car.state.position, target) - car.state.yaw);
    angle / steer_lock
}

pub fn steer(track: &Track, car: &Car, config: &DriverConfig) -> f32 {
    steer_towards(target_point(track, car, config), car)
}

#[cfg(test)]
mod tests {
    use core::f32::consts::PI;

    use super::*;
    use crate::driving::{CarSpec, CarState};
    use crate::track::tests::oval;
    use crate::track::{TrackBuilder, TrackPosition};

    fn car_on(track: &Track, position: Vec2, yaw: f32, speed: f32) -> Car {
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
    fn target_on_long_straight_lies_ahead() {
        let track = TrackBuilder::new("long", 12.0, 1.0)
            .straight(300.0)
            .left(50.0, PI)
            .straight(300.0)
            .left(50.0, PI)
            .build()
            .unwrap();
        let car = car_on(&track, Vec2::new(10.0, 0.0), 0.0, 20.0);
        let target = target_point(&track, &car, &DriverConfig::default());
        // Remaining 290 m plus one more segment length, measured from the start edge.
        assert!((target - Vec2::new(590.0, 0.0)).length() < 1e-2);
    }

    #[test]
    fn target_moves_into_next_curve() {
        let track = oval();
        let car = car_on(&track, Vec2::new(95.0, 0.0), 0.0, 20.0);
        let config = DriverConfig::default();
        let target = target_point(&track, &car, &config);
        let curve = track.segment(1);
        // 5 m left on the straight + 31.4 m of the curve, plus the curve once more.
        let arc = (5.0 + 2.0 * curve.length) / curve.radius;
        let expected = rotate_about(curve.start_mid(), curve.center, arc);
        assert!((target - expected).length() < 1e-2);
    }

    #[test]
    fn target_in_right_curve_rotates_clockwise() {
        let track = TrackBuilder::new("right", 12.0, 1.0)
            .straight(100.0)
            .right(40.0, PI / 4.0)
            .straight(100.0)
            .build()
            .unwrap();
        let car = car_on(&track, Vec2::new(95.0, 0.0), 0.0, 20.0);
        let target = target_point(&track, &car, &DriverConfig::default());
        let curve = track.segment(1);
        let arc = (5.0 + 2.0 * curve.length) / curve.radius;
        let expected = rotate_about(curve.start_mid(), curve.center, -arc);
        assert!((target - expected).length() < 1e-2);
        // The centre of a right-hand curve lies to the right.
        assert!(target.y < 0.0);
    }

    #[test]
    fn centred_aligned_car_steers_straight() {
        let track = TrackBuilder::new("long", 12.0, 1.0)
            .straight(300.0)
            .left(50.0, PI)
            .straight(300.0)
            .left(50.0, PI)
            .build()
            .unwrap();
        let car = car_on(&track, Vec2::new(10.0, 0.0), 0.0, 20.0);
        assert!(steer(&track, &car, &DriverConfig::default()).abs() < 1e-4);
    }

    #[test]
    fn steers_left_towards_target_on_left() {
        let car = Car {
            spec: CarSpec::default(),
            ..Car::default()
        };
        let steer = steer_towards(Vec2::new(10.0, 10.0), &car);
        assert!((steer - (PI / 4.0) / car.spec.steer_lock).abs() < 1e-4);
    }

    #[test]
    fn steering_is_not_clamped() {
        let car = Car {
            spec: CarSpec::default(),
            ..Car::default()
        };
        assert!(steer_towards(Vec2::new(-10.0, 1.0), &car) > 1.0);
    }

    #[test]
    fn zero_steer_lock_gives_zero_steer() {
        let car = Car {
            spec: CarSpec {
                steer_lock: 0.0,
                ..CarSpec::default()
            },
            ..Car::default()
        };
        assert_eq!(steer_towards(Vec2::new(0.0, 10.0), &car), 0.0);
    }

    #[test]
    fn lookahead_scan_terminates_on_short_loop() {
        let track = TrackBuilder::new("tiny", 10.0, 1.0)
            .left(2.0, PI)
            .left(2.0, PI)
            .build()
            .unwrap();
        let car = Car {
            state: CarState {
                speed: 100.0,
                track_pos: TrackPosition::default(),
                ..CarState::default()
            },
            ..Car::default()
        };
        let target = target_point(&track, &car, &DriverConfig::default());
        assert!(target.is_finite());
    }
}
