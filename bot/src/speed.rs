//! Grip-limited speed planning along the track.

use core::f32::consts::FRAC_PI_2;

use crate::config::G;
use crate::driving::CarSpec;
use crate::track::{Segment, Track};

/// Maximum speed in m/s the car should carry through segment `index`.
///
/// Straights are unconstrained and return `f32::MAX`. On curves the arc of the
/// following same-direction segments, up to a quarter turn, shrinks the
/// effective radius, and downforce raises the grip limit.
pub fn allowed_speed(track: &Track, index: usize, spec: &CarSpec) -> f32 {
    let segment = track.segment(index);
    if !segment.kind.is_curve() {
        return f32::MAX;
    }

    let mut arc = 0.0;
    let mut scan = index;
    for _ in 0..track.len() {
        let next = track.segment(scan);
        if next.kind != segment.kind || arc >= FRAC_PI_2 {
            break;
        }
        arc += next.arc;
        scan = track.next(scan);
    }

    let normalized_arc = arc / FRAC_PI_2;
    if !(normalized_arc > 0.0) {
        return f32::MAX;
    }

    let mu = segment.friction;
    let radius = (segment.radius + segment.width / 2.0) / normalized_arc.sqrt();
    let downforce = if spec.mass > 0.0 {
        (radius * spec.downforce_coefficient * mu / spec.mass).min(1.0)
    } else {
        0.0
    };
    let denominator = 1.0 - downforce;
    if denominator <= f32::EPSILON {
        return f32::MAX;
    }
    ((mu * G * radius) / denominator).sqrt()
}

/// Remaining centre-line distance in metres from `to_start` to the segment end.
pub fn dist_to_segment_end(segment: &Segment, to_start: f32) -> f32 {
    if segment.kind.is_curve() {
        (segment.arc - to_start) * segment.radius
    } else {
        segment.length - to_start
    }
}
