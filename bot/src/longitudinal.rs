//! Throttle and brake selection, plus the track-keeping throttle filter.

use core::f32::consts::TAU;

use crate::config::{DriverConfig, G};
use crate::driving::Car;
use crate::speed::{allowed_speed, dist_to_segment_end};
use crate::track::{SegmentKind, Track};

/// Throttle for the current segment.
///
/// Full throttle while there is room below the allowed speed. Otherwise an
/// open-loop estimate of the pedal position that holds the allowed speed in the
/// current gear.
pub fn accel(track: &Track, car: &Car, config: &DriverConfig) -> f32 {
    let spec = &car.spec;
    let allowed = allowed_speed(track, car.state.track_pos.segment, spec);
    if allowed > car.state.speed + config.full_accel_margin {
        return 1.0;
    }

    let ratio = spec.gear_ratio(car.state.gear).unwrap_or(0.0);
    let redline = spec.redline_rpm * TAU / 60.0;
    if !(spec.wheel_radius > 0.0 && redline > 0.0) {
        return 0.0;
    }
    (allowed / spec.wheel_radius * ratio / redline).clamp(0.0, 1.0)
}

/// Brake for the current segment and anything within stopping distance ahead.
pub fn brake(track: &Track, car: &Car) -> f32 {
    let pos = car.state.track_pos;
    let segment = track.segment(pos.segment);
    let speed = car.state.speed;
    let speed_sqr = speed * speed;
    let mu = segment.friction;

    if allowed_speed(track, pos.segment, &car.spec) < speed {
        return 1.0;
    }

    let max_lookahead = speed_sqr / (2.0 * mu * G);
    let mut lookahead = dist_to_segment_end(segment, pos.to_start);
    let mut index = track.next(pos.segment);
    for _ in 0..track.len() {
        if lookahead >= max_lookahead {
            break;
        }
        let allowed = allowed_speed(track, index, &car.spec);
        if allowed < speed {
            let brake_dist = (speed_sqr - allowed * allowed) / (2.0 * mu * G);
            if brake_dist > lookahead {
                return 1.0;
            }
        }
        lookahead += track.segment(index).length;
        index = track.next(index);
    }
    0.0
}

/// Cut the throttle when the car drifts wide of the allowed side of the track.
///
/// On curves the inside half is always allowed; elsewhere the car must stay
/// within `width / width_div` of the centre line. Slow cars are left alone.
pub fn filter_track(accel: f32, track: &Track, car: &Car, config: &DriverConfig) -> f32 {
    if car.state.speed < config.max_unstuck_speed {
        return accel;
    }

    let pos = car.state.track_pos;
    let segment = track.segment(pos.segment);
    if segment.kind != SegmentKind::Straight && pos.to_middle * segment.kind.turn_sign() > 0.0 {
        return accel;
    }

    let limit = segment.width / config.width_div;
    if pos.to_middle.abs() > limit { 0.0 } else { accel }
}
