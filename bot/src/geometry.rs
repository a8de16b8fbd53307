use core::f32::consts::{PI, TAU};

use bevy_math::{Rot2, Vec2};

/// Wrap an angle into (-PI, PI]. Values already in range are returned untouched,
/// so normalizing twice gives the same result.
pub fn normalize_angle(angle: f32) -> f32 {
    if angle > -PI && angle <= PI {
        return angle;
    }
    if !angle.is_finite() {
        return 0.0;
    }
    let wrapped = angle.rem_euclid(TAU);
    if wrapped > PI { wrapped - TAU } else { wrapped }
}

/// Rotate `point` counter-clockwise about `center` by `angle` radians.
pub fn rotate_about(point: Vec2, center: Vec2, angle: f32) -> Vec2 {
    center + Rot2::radians(angle) * (point - center)
}

/// Unit vector pointing along `heading` (radians, counter-clockwise from +x).
pub fn heading_vector(heading: f32) -> Vec2 {
    Vec2::new(heading.cos(), heading.sin())
}

/// Unit vector pointing to the left of `heading`.
pub fn left_normal(heading: f32) -> Vec2 {
    Vec2::new(-heading.sin(), heading.cos())
}

/// Bearing from `from` to `to`.
pub fn bearing(from: Vec2, to: Vec2) -> f32 {
    let delta = to - from;
    delta.y.atan2(delta.x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_keeps_values_in_range() {
        assert_eq!(normalize_angle(0.5), 0.5);
        assert_eq!(normalize_angle(PI), PI);
        assert!((normalize_angle(-PI) - PI).abs() < 1e-5);
        assert!((normalize_angle(3.0 * PI / 2.0) + PI / 2.0).abs() < 1e-5);
        assert!((normalize_angle(-5.0 * PI / 2.0) + PI / 2.0).abs() < 1e-5);
    }

    #[test]
    fn normalize_maps_non_finite_to_zero() {
        assert_eq!(normalize_angle(f32::NAN), 0.0);
        assert_eq!(normalize_angle(f32::INFINITY), 0.0);
    }

    #[test]
    fn rotate_quarter_turn_about_center() {
        let rotated = rotate_about(Vec2::new(2.0, 1.0), Vec2::new(1.0, 1.0), PI / 2.0);
        assert!((rotated - Vec2::new(1.0, 2.0)).length() < 1e-5);
    }

    #[test]
    fn left_normal_is_perpendicular() {
        let heading = 0.7;
        assert!(heading_vector(heading).dot(left_normal(heading)).abs() < 1e-6);
        assert!((left_normal(0.0) - Vec2::Y).length() < 1e-6);
    }
}
